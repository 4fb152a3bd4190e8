//! Feature store adapter.
//!
//! Reads a GeoJSON FeatureCollection (optionally gzipped) into a [`Batch`].
//! Per-record problems never fail the load: they are carried as missing
//! population or missing geometry and handled downstream.

mod geojson;

pub use geojson::decode_geometry;

use flate2::read::GzDecoder;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::config::InputConfig;
use crate::error::LoadError;
use crate::models::{Batch, FeatureRecord};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

#[derive(Deserialize)]
struct RawCollection {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    features: Vec<RawFeature>,
}

#[derive(Deserialize)]
struct RawFeature {
    #[serde(default)]
    properties: Option<Map<String, Value>>,
    #[serde(default)]
    geometry: Value,
}

/// Read and parse a feature collection from disk
pub async fn load(path: &Path, input: &InputConfig) -> Result<Batch, LoadError> {
    info!("Loading features from {}", path.display());

    let bytes = tokio::fs::read(path).await.map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    parse_feature_collection(&bytes, input, path)
}

/// Parse raw (possibly gzipped) bytes; `origin` is only used in error messages
pub fn parse_feature_collection(
    bytes: &[u8],
    input: &InputConfig,
    origin: &Path,
) -> Result<Batch, LoadError> {
    let decompressed;
    let json = if bytes.starts_with(&GZIP_MAGIC) {
        let mut buf = Vec::new();
        GzDecoder::new(bytes)
            .read_to_end(&mut buf)
            .map_err(|source| LoadError::Decompress {
                path: origin.to_path_buf(),
                source,
            })?;
        decompressed = buf;
        &decompressed[..]
    } else {
        bytes
    };

    let raw: RawCollection = serde_json::from_slice(json).map_err(|source| LoadError::Json {
        path: origin.to_path_buf(),
        source,
    })?;

    if raw.kind != "FeatureCollection" {
        return Err(LoadError::NotFeatureCollection {
            path: origin.to_path_buf(),
            found: raw.kind,
        });
    }

    let mut batch = Batch::new();
    let mut without_geometry = 0usize;
    let mut without_code = 0usize;

    for feature in raw.features {
        let properties = feature.properties.unwrap_or_default();

        let admin_code = match properties.get(&input.admin_code_field) {
            Some(Value::String(code)) => code.clone(),
            // A number has already lost any leading zeros, and with them the region
            Some(Value::Number(code)) => {
                warn!(
                    "Feature #{} has numeric '{}' {}; treating it as missing",
                    batch.len(),
                    input.admin_code_field,
                    code
                );
                without_code += 1;
                String::new()
            }
            _ => {
                without_code += 1;
                String::new()
            }
        };

        let population = properties.get(&input.population_field).and_then(parse_number);

        let geometry = decode_geometry(&feature.geometry);
        if geometry.is_none() {
            without_geometry += 1;
            debug!(
                "Feature #{} ({}) has no usable polygon geometry",
                batch.len(),
                admin_code
            );
        }

        batch.push(FeatureRecord {
            admin_code,
            population,
            geometry,
            raw_geometry: feature.geometry,
            properties,
        });
    }

    if without_code > 0 {
        warn!(
            "{} features have no usable '{}' property and will not be grouped",
            without_code, input.admin_code_field
        );
    }
    if without_geometry > 0 {
        warn!(
            "{} features have no usable geometry and will never be adjacent",
            without_geometry
        );
    }
    info!("Loaded {} features", batch.len());

    Ok(batch)
}

fn parse_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
