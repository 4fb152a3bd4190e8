//! Main/exclave classification.
//!
//! Splits the batch by population sign and keeps only the negative-population
//! fragments that touch at least one other retained feature. Fragments that
//! touch nothing are islands.

mod adjacency;

pub use adjacency::{usable_geometry, AdjacencyIndex};

use indicatif::ProgressBar;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::{ClassifyConfig, InputConfig};
use crate::models::{Batch, FeatureId};

/// Result of classifying one batch. Every list is in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    /// Population >= 0
    pub main: Vec<FeatureId>,
    /// Population < 0 and adjacent to another retained feature
    pub exclaves: Vec<FeatureId>,
    /// Population < 0 and adjacent to nothing
    pub islands: Vec<FeatureId>,
    /// Missing, non-numeric or sentinel population; excluded from everything
    pub unknown: Vec<FeatureId>,
}

fn is_unknown(population: f64, sentinel: Option<f64>) -> bool {
    population.is_nan() || sentinel.is_some_and(|s| population == s)
}

/// Classify every feature of the batch.
///
/// `progress` is advanced once per tested fragment; its length is set here.
pub fn classify(
    batch: &Batch,
    input: &InputConfig,
    config: &ClassifyConfig,
    progress: &ProgressBar,
) -> Classification {
    let sentinel = input.unknown_sentinel();
    let mut result = Classification::default();
    let mut retained = Vec::with_capacity(batch.len());
    let mut candidates = Vec::new();

    // Unknown population is dropped here, before anything else sees it
    for feature in batch.iter() {
        match feature.population() {
            Some(pop) if !is_unknown(pop, sentinel) => {
                retained.push(feature.id());
                if pop >= 0.0 {
                    result.main.push(feature.id());
                } else {
                    candidates.push(feature.id());
                }
            }
            _ => result.unknown.push(feature.id()),
        }
    }

    info!(
        "Classifying {} features: {} main, {} fragment candidates, {} unknown",
        batch.len(),
        result.main.len(),
        candidates.len(),
        result.unknown.len()
    );

    // Fragments are tested against the whole retained set, not only main bodies
    let index = AdjacencyIndex::build(batch, &retained);

    progress.set_length(candidates.len() as u64);
    let test = |id: &FeatureId| {
        let adjacent = index.has_neighbor(*id);
        progress.inc(1);
        adjacent
    };
    let adjacent: Vec<bool> = if config.parallel {
        candidates.par_iter().map(test).collect()
    } else {
        candidates.iter().map(test).collect()
    };
    progress.finish_with_message("Adjacency scan complete");

    for (id, adjacent) in candidates.into_iter().zip(adjacent) {
        if adjacent {
            result.exclaves.push(id);
        } else {
            debug!("Fragment {} ({}) is an island", id, batch[id].admin_code());
            result.islands.push(id);
        }
    }

    info!(
        "Found {} exclaves and {} islands",
        result.exclaves.len(),
        result.islands.len()
    );

    result
}
