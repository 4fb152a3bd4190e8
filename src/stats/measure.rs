//! Geodesic measurements on lon/lat geometry.

use geo::{
    ChamberlainDuquetteArea, Closest, Distance, Haversine, HaversineClosestPoint, MultiPolygon,
    Point,
};
use hashbrown::HashMap;

use crate::classify::usable_geometry;
use crate::models::{Batch, Feature, FeatureId};

/// Spherical area in square metres, or `None` without usable geometry
pub fn area_m2(feature: &Feature) -> Option<f64> {
    usable_geometry(feature).map(|g| g.chamberlain_duquette_unsigned_area())
}

/// Shortest distance in metres from any exterior vertex of `main` to the
/// exterior boundary of `fragment`.
///
/// Closest points are found along great-circle arcs, so slanted edges at high
/// latitudes are measured on the sphere rather than in lon/lat space.
pub fn nearest_distance_m(main: &MultiPolygon<f64>, fragment: &MultiPolygon<f64>) -> Option<f64> {
    let mut best: Option<f64> = None;

    for boundary in fragment.0.iter().map(|p| p.exterior()) {
        for vertex in main.0.iter().flat_map(|p| p.exterior().points()) {
            let closest: Point<f64> = match boundary.haversine_closest_point(&vertex) {
                Closest::Intersection(p) | Closest::SinglePoint(p) => p,
                Closest::Indeterminate => continue,
            };
            let d = Haversine.distance(vertex, closest);
            if d.is_finite() {
                best = Some(best.map_or(d, |b: f64| b.min(d)));
            }
        }
    }

    best
}

/// Area of every exclave, cached for reports and output properties
#[derive(Debug, Clone, Default)]
pub struct AreaAnnotations {
    order: Vec<FeatureId>,
    areas: HashMap<FeatureId, f64>,
}

impl AreaAnnotations {
    /// Measure `exclaves`; features without usable geometry get no entry
    pub fn measure(batch: &Batch, exclaves: &[FeatureId]) -> Self {
        let mut annotations = Self::default();
        for &id in exclaves {
            if let Some(area) = area_m2(&batch[id]) {
                annotations.order.push(id);
                annotations.areas.insert(id, area);
            }
        }
        annotations
    }

    pub fn get(&self, id: FeatureId) -> Option<f64> {
        self.areas.get(&id).copied()
    }

    /// `(id, area)` in exclave discovery order
    pub fn iter(&self) -> impl Iterator<Item = (FeatureId, f64)> + '_ {
        self.order.iter().map(|id| (*id, self.areas[id]))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
