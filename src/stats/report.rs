//! Console and CSV rendering of [`Statistics`].

use anyhow::Result;
use serde::Serialize;
use std::io::Write;
use tracing::info;

use super::{AreaEntry, DistanceEntry, Statistics};
use crate::models::{Batch, FeatureId};

/// One flattened ranking line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub section: &'static str,
    pub rank: usize,
    pub admin_code: String,
    pub label: String,
    pub value: f64,
    pub unit: &'static str,
}

/// Log every exclave as `n. adm_code:<code>, label:<label>, pop:<pop>`
pub fn log_exclaves(batch: &Batch, exclaves: &[FeatureId], label_fields: &[String]) {
    info!("Result exclaves -----");
    for (i, &id) in exclaves.iter().enumerate() {
        let feature = &batch[id];
        info!(
            "{}. adm_code:{}, label:{}, pop:{}",
            i + 1,
            feature.admin_code(),
            feature.label(label_fields),
            feature.population().unwrap_or(f64::NAN)
        );
    }
    info!("Found {} exclaves -----", exclaves.len());
}

/// Flatten all rankings into rows, ranks starting at 1 per section
pub fn rows(batch: &Batch, stats: &Statistics, label_fields: &[String]) -> Vec<ReportRow> {
    let label = |id: FeatureId| batch[id].label(label_fields);
    let mut rows = Vec::new();

    let areas = |section: &'static str, entries: &[AreaEntry], rows: &mut Vec<ReportRow>| {
        for (i, e) in entries.iter().enumerate() {
            rows.push(ReportRow {
                section,
                rank: i + 1,
                admin_code: e.admin_code.clone(),
                label: label(e.id),
                value: e.area_m2,
                unit: "m2",
            });
        }
    };
    areas("area_min", &stats.smallest_areas, &mut rows);
    areas("area_max", &stats.largest_areas, &mut rows);

    for (i, r) in stats.top_regions.iter().enumerate() {
        rows.push(ReportRow {
            section: "region_fragments",
            rank: i + 1,
            admin_code: r.prefix.clone(),
            label: String::new(),
            value: r.fragments as f64,
            unit: "fragments",
        });
    }

    for (i, u) in stats.top_units.iter().enumerate() {
        rows.push(ReportRow {
            section: "unit_fragments",
            rank: i + 1,
            admin_code: u.admin_code.clone(),
            label: label(u.main),
            value: u.fragments as f64,
            unit: "fragments",
        });
    }

    let distances = |section: &'static str, entries: &[DistanceEntry], rows: &mut Vec<ReportRow>| {
        for (i, d) in entries.iter().enumerate() {
            rows.push(ReportRow {
                section,
                rank: i + 1,
                admin_code: d.admin_code.clone(),
                label: label(d.main),
                value: d.distance_m / 1000.0,
                unit: "km",
            });
        }
    };
    distances("distance_min", &stats.nearest, &mut rows);
    distances("distance_max", &stats.farthest, &mut rows);

    for (i, a) in stats.anomalies.iter().enumerate() {
        for e in &a.larger {
            rows.push(ReportRow {
                section: "area_anomaly",
                rank: i + 1,
                admin_code: a.admin_code.clone(),
                label: label(e.id),
                value: e.area_m2 / a.main_area_m2,
                unit: "x main",
            });
        }
    }

    rows
}

/// Log the statistics report
pub fn log_statistics(batch: &Batch, stats: &Statistics, label_fields: &[String]) {
    info!("Statistics ---");

    let mut section = "";
    for row in rows(batch, stats, label_fields) {
        if row.section != section {
            section = row.section;
            info!("{} --", section);
        }
        if row.label.is_empty() {
            info!("{}. {} - {} {}", row.rank, row.admin_code, row.value, row.unit);
        } else {
            info!(
                "{}. {}/{} - {} {}",
                row.rank, row.admin_code, row.label, row.value, row.unit
            );
        }
    }
}

/// Write all report rows as CSV with a header line
pub fn write_csv<W: Write>(
    writer: W,
    batch: &Batch,
    stats: &Statistics,
    label_fields: &[String],
) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows(batch, stats, label_fields) {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}
