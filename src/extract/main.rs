//! Exclave extraction batch job.
//!
//! Loads boundary polygons, separates exclaves from islands, reports
//! statistics and writes the combined and per-region GeoJSON datasets.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use tobichi::config::Config;
use tobichi::stats::report;
use tobichi::{output, pipeline, store};

#[derive(Parser, Debug)]
#[command(name = "extract")]
#[command(about = "Extract exclaves from administrative boundary polygons")]
struct Args {
    /// GeoJSON FeatureCollection of boundary polygons (optionally gzipped)
    #[arg(short, long)]
    input: PathBuf,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output directory (overrides the config file)
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Also write the statistics report as CSV
    #[arg(long)]
    report_csv: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    info!("Tobichi Extractor v{}", env!("CARGO_PKG_VERSION"));
    info!("Input: {}", args.input.display());

    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };
    if let Some(dir) = args.out_dir {
        config.output.dir = dir;
    }

    let batch = store::load(&args.input, &config.input)
        .await
        .context("Failed to load boundary polygons")?;

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos} / {len} polygons processing...",
            )?
            .progress_chars("#>-"),
    );

    let out = pipeline::run(&batch, &config, &pb);

    let labels = &config.input.label_fields;
    report::log_exclaves(&batch, &out.classification.exclaves, labels);
    report::log_statistics(&batch, &out.statistics, labels);

    // Render everything before the first file is touched
    let rendered = output::render(&out.datasets, &config.output.file_prefix)?;
    let csv = match &args.report_csv {
        Some(path) => {
            let mut buf = Vec::new();
            report::write_csv(&mut buf, &batch, &out.statistics, labels)?;
            Some((path, buf))
        }
        None => None,
    };

    let written = output::write_all(&config.output.dir, &rendered)?;
    if let Some((path, bytes)) = csv {
        output::persist(path, &bytes)?;
        info!("Wrote report {}", path.display());
    }

    info!(
        "Done: {} datasets written to {}",
        written.len(),
        config.output.dir.display()
    );

    Ok(())
}
