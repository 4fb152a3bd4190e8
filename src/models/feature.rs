//! Boundary records as loaded from the feature store.

use geo::{BoundingRect, MultiPolygon};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::ops::Index;

/// Stable position of a feature within its load batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FeatureId(pub usize);

impl std::fmt::Display for FeatureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Everything needed to add one record to a [`Batch`]
#[derive(Debug, Clone)]
pub struct FeatureRecord {
    pub admin_code: String,
    /// `None` when the population property is missing or not a number
    pub population: Option<f64>,
    /// `None` when the geometry is missing or not a (multi)polygon
    pub geometry: Option<MultiPolygon<f64>>,
    /// Geometry exactly as it appeared in the source document
    pub raw_geometry: Value,
    pub properties: Map<String, Value>,
}

/// A single administrative boundary polygon with its source properties.
///
/// Features are immutable once loaded. Derived values (area, styling) live in
/// stage-owned maps keyed by [`FeatureId`].
#[derive(Debug, Clone)]
pub struct Feature {
    id: FeatureId,
    admin_code: String,
    population: Option<f64>,
    geometry: Option<MultiPolygon<f64>>,
    raw_geometry: Value,
    properties: Map<String, Value>,
}

impl Feature {
    pub fn id(&self) -> FeatureId {
        self.id
    }

    pub fn admin_code(&self) -> &str {
        &self.admin_code
    }

    pub fn population(&self) -> Option<f64> {
        self.population
    }

    pub fn geometry(&self) -> Option<&MultiPolygon<f64>> {
        self.geometry.as_ref()
    }

    pub fn raw_geometry(&self) -> &Value {
        &self.raw_geometry
    }

    pub fn properties(&self) -> &Map<String, Value> {
        &self.properties
    }

    /// Get the bounding box of this feature's geometry
    pub fn bbox(&self) -> Option<(f64, f64, f64, f64)> {
        self.geometry
            .as_ref()?
            .bounding_rect()
            .map(|rect| (rect.min().x, rect.min().y, rect.max().x, rect.max().y))
    }

    /// Join the named properties into a `a/b/c` label; missing ones are skipped
    pub fn label(&self, fields: &[String]) -> String {
        fields
            .iter()
            .filter_map(|field| match self.properties.get(field)? {
                Value::String(s) => Some(s.clone()),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect::<Vec<_>>()
            .join("/")
    }

    // Leading `len` characters of the admin code, if the code is long enough
}

/// Leading `len` characters of an admin code, if the code is long enough
pub fn region_prefix(code: &str, len: usize) -> Option<&str> {
    if len == 0 {
        return None;
    }
    match code.char_indices().nth(len) {
        Some((end, _)) => Some(&code[..end]),
        None if code.chars().count() == len => Some(code),
        None => None,
    }
}

/// All features of one run, indexed by [`FeatureId`]
#[derive(Debug, Clone, Default)]
pub struct Batch {
    features: Vec<Feature>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record, assigning it the next identity
    pub fn push(&mut self, record: FeatureRecord) -> FeatureId {
        let id = FeatureId(self.features.len());
        self.features.push(Feature {
            id,
            admin_code: record.admin_code,
            population: record.population,
            geometry: record.geometry,
            raw_geometry: record.raw_geometry,
            properties: record.properties,
        });
        id
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl Index<FeatureId> for Batch {
    type Output = Feature;

    fn index(&self, id: FeatureId) -> &Feature {
        &self.features[id.0]
    }
}
