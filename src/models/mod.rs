//! Core data models for exclave extraction.

pub mod feature;

pub use feature::{region_prefix, Batch, Feature, FeatureId, FeatureRecord};
