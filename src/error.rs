//! Error types for loading the feature store.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a run before any classification happens.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Source file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Source looked gzipped but the stream is corrupt.
    #[error("failed to decompress {path}: {source}")]
    Decompress {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Source is not valid JSON.
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Top-level document is some other GeoJSON type.
    #[error("{path} is not a FeatureCollection (found type '{found}')")]
    NotFeatureCollection { path: PathBuf, found: String },
}
