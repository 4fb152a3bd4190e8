//! Spatial index for fast adjacency tests between features.

use geo::{CoordsIter, Intersects, MultiPolygon};
use rstar::{RTree, RTreeObject, AABB};
use tracing::debug;

use crate::models::{Batch, Feature, FeatureId};

/// Geometry of a feature, if it can take part in adjacency tests.
///
/// Missing, empty or non-finite geometry is never adjacent to anything.
pub fn usable_geometry(feature: &Feature) -> Option<&MultiPolygon<f64>> {
    let geometry = feature.geometry()?;
    let finite = geometry
        .coords_iter()
        .all(|c| c.x.is_finite() && c.y.is_finite());
    if geometry.0.is_empty() || !finite {
        return None;
    }
    Some(geometry)
}

/// Wrapper for R-tree indexing of features
#[derive(Clone)]
struct IndexedFeature {
    id: FeatureId,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedFeature {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

impl IndexedFeature {
    fn new(feature: &Feature) -> Option<Self> {
        usable_geometry(feature)?;
        let (min_x, min_y, max_x, max_y) = feature.bbox()?;
        Some(Self {
            id: feature.id(),
            envelope: AABB::from_corners([min_x, min_y], [max_x, max_y]),
        })
    }
}

/// Answers "does this feature touch any other member?" for a fixed member set
pub struct AdjacencyIndex<'a> {
    batch: &'a Batch,
    tree: RTree<IndexedFeature>,
}

impl<'a> AdjacencyIndex<'a> {
    /// Build the index over `members`; members without usable geometry are left out
    pub fn build(batch: &'a Batch, members: &[FeatureId]) -> Self {
        let indexed: Vec<IndexedFeature> = members
            .iter()
            .filter_map(|id| IndexedFeature::new(&batch[*id]))
            .collect();

        let skipped = members.len() - indexed.len();
        if skipped > 0 {
            debug!("{} members have no usable geometry", skipped);
        }

        let tree = RTree::bulk_load(indexed);
        debug!("Adjacency index built with {} entries", tree.size());

        Self { batch, tree }
    }

    /// Members whose geometry intersects or touches `id`, in id order
    #[cfg(test)]
    pub fn neighbors(&self, id: FeatureId) -> Vec<FeatureId> {
        let mut found: Vec<FeatureId> = self.candidates(id).collect();
        found.sort();
        found
    }

    /// True if at least one other member intersects or touches `id`
    pub fn has_neighbor(&self, id: FeatureId) -> bool {
        self.candidates(id).next().is_some()
    }

    fn candidates(&self, id: FeatureId) -> impl Iterator<Item = FeatureId> + '_ {
        let feature = &self.batch[id];
        let geometry = usable_geometry(feature);
        let envelope = geometry
            .and_then(|_| feature.bbox())
            .map(|(min_x, min_y, max_x, max_y)| {
                AABB::from_corners([min_x, min_y], [max_x, max_y])
            });

        // Envelope prefilter, then the exact (boundary-inclusive) test
        envelope
            .into_iter()
            .flat_map(move |env| self.tree.locate_in_envelope_intersecting(&env))
            .filter(move |other| other.id != id)
            .filter(move |other| {
                match (geometry, usable_geometry(&self.batch[other.id])) {
                    (Some(a), Some(b)) => a.intersects(b),
                    _ => false,
                }
            })
            .map(|other| other.id)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.tree.size()
    }
}
