//! Tobichi - exclave extraction for administrative boundary polygons
//!
//! This library provides the classification, grouping, statistics and dataset
//! assembly stages used by the `extract` binary.

pub mod assemble;
pub mod classify;
pub mod config;
pub mod error;
pub mod group;
pub mod models;
pub mod output;
pub mod pipeline;
pub mod stats;
pub mod store;

#[cfg(test)]
mod testing;

pub use models::{Batch, Feature, FeatureId};
