//! Dataset assembly.
//!
//! Flattens groups into one feature sequence (group order, then main
//! followed by fragments) and partitions it by region prefix.

mod style;

pub use style::Style;

use anyhow::Result;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::config::{OutputConfig, StyleConfig};
use crate::group::GroupMap;
use crate::models::{region_prefix, Batch, FeatureId};
use crate::stats::AreaAnnotations;

/// A feature ready for output: source properties plus derived ones
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputFeature {
    #[serde(rename = "type")]
    kind: &'static str,
    pub properties: Map<String, Value>,
    pub geometry: Value,
    #[serde(skip)]
    pub id: FeatureId,
    #[serde(skip)]
    pub admin_code: String,
}

#[derive(Serialize)]
struct FeatureCollection<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    features: &'a [OutputFeature],
}

/// One output document
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    /// `00_all` for the combined dataset, otherwise the region prefix
    pub key: String,
    pub features: Vec<OutputFeature>,
}

impl Dataset {
    pub fn file_name(&self, file_prefix: &str) -> String {
        format!("{}_{}.geojson", file_prefix, self.key)
    }

    /// Serialize as a pretty-printed GeoJSON FeatureCollection
    pub fn to_geojson(&self) -> Result<Vec<u8>> {
        let collection = FeatureCollection {
            kind: "FeatureCollection",
            features: &self.features,
        };
        Ok(serde_json::to_vec_pretty(&collection)?)
    }
}

/// The combined dataset plus every non-empty region subset
#[derive(Debug, Clone, PartialEq)]
pub struct Datasets {
    pub all: Dataset,
    pub regions: Vec<Dataset>,
}

impl Datasets {
    pub fn iter(&self) -> impl Iterator<Item = &Dataset> {
        std::iter::once(&self.all).chain(self.regions.iter())
    }
}

/// Flatten groups into output features, attaching styling and cached areas
pub fn flatten(
    batch: &Batch,
    groups: &GroupMap,
    areas: &AreaAnnotations,
    style: &StyleConfig,
) -> Vec<OutputFeature> {
    let mut features = Vec::new();

    for (index, group) in groups.iter().enumerate() {
        let style = Style::for_group(index, style);

        for id in group.members() {
            let feature = &batch[id];
            let mut properties = feature.properties().clone();
            style.apply(&mut properties);
            if let Some(area) = areas.get(id) {
                properties.insert("area".to_string(), json!(area));
            }

            features.push(OutputFeature {
                kind: "Feature",
                properties,
                geometry: feature.raw_geometry().clone(),
                id,
                admin_code: feature.admin_code().to_string(),
            });
        }
    }

    features
}

/// Split the flattened features into the combined dataset and region subsets.
///
/// Regions `01..=region_count` are emitted in order; empty ones are skipped.
pub fn partition(features: Vec<OutputFeature>, output: &OutputConfig) -> Datasets {
    let mut regions = Vec::new();

    for n in 1..=output.region_count {
        let prefix = format!("{:0width$}", n, width = output.prefix_len);
        let subset: Vec<OutputFeature> = features
            .iter()
            .filter(|f| region_prefix(&f.admin_code, output.prefix_len) == Some(prefix.as_str()))
            .cloned()
            .collect();

        if subset.is_empty() {
            continue;
        }
        debug!("Region {}: {} features", prefix, subset.len());
        regions.push(Dataset {
            key: prefix,
            features: subset,
        });
    }

    Datasets {
        all: Dataset {
            key: "00_all".to_string(),
            features,
        },
        regions,
    }
}

/// Flatten and partition in one step
pub fn assemble(
    batch: &Batch,
    groups: &GroupMap,
    areas: &AreaAnnotations,
    style: &StyleConfig,
    output: &OutputConfig,
) -> Datasets {
    partition(flatten(batch, groups, areas, style), output)
}
