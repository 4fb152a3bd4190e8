//! Classifier → Grouper → Statistics → Assembler, run strictly in sequence.

use indicatif::ProgressBar;
use tracing::info;

use crate::assemble::{assemble, Datasets};
use crate::classify::{classify, Classification};
use crate::config::Config;
use crate::group::{group, Grouping};
use crate::models::Batch;
use crate::stats::{self, AreaAnnotations, Statistics};

/// Everything one run computes; nothing here has been written to disk
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub classification: Classification,
    pub grouping: Grouping,
    pub areas: AreaAnnotations,
    pub statistics: Statistics,
    pub datasets: Datasets,
}

pub fn run(batch: &Batch, config: &Config, progress: &ProgressBar) -> PipelineOutput {
    let classification = classify(batch, &config.input, &config.classify, progress);
    let grouping = group(batch, &classification.main, &classification.exclaves);

    let areas = AreaAnnotations::measure(batch, &classification.exclaves);
    let statistics = stats::compute(batch, &grouping.groups, &areas, config.output.prefix_len);
    let datasets = assemble(
        batch,
        &grouping.groups,
        &areas,
        &config.style,
        &config.output,
    );

    info!(
        "Assembled {} features into {} regional datasets",
        datasets.all.features.len(),
        datasets.regions.len()
    );

    PipelineOutput {
        classification,
        grouping,
        areas,
        statistics,
        datasets,
    }
}
