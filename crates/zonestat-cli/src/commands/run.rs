use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use tracing::info;
use zonestat_core::catalog::FileCatalog;
use zonestat_core::export::CsvDirectorySink;
use zonestat_core::pipeline::run_pipeline_reported;
use zonestat_core::zonal::load_zones;

use crate::progress::BarReporter;

#[derive(Args)]
pub struct RunArgs {
    /// Run config file (TOML)
    pub config: PathBuf,

    /// Override the number of concurrent shards
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Override the output directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn run(args: &RunArgs) -> Result<()> {
    let mut config = super::load_config(&args.config)?;
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if let Some(ref output) = args.output {
        config.output_dir = output.clone();
    }

    let catalog = FileCatalog::open(&config.catalog)
        .with_context(|| format!("Failed to open catalog {}", config.catalog.display()))?;
    let zones = load_zones(&config.zones, &config.zone_fields)
        .with_context(|| format!("Failed to load zones {}", config.zones.display()))?;
    let sink = CsvDirectorySink::new(&config.output_dir);
    info!(
        config = %args.config.display(),
        grid = %catalog.manifest().grid.describe(),
        "Inputs loaded"
    );

    crate::summary::print_run_summary(&config, zones.len());

    let reporter = Arc::new(BarReporter::new());
    let report = run_pipeline_reported(&config, &catalog, &zones, &sink, reporter.clone())?;
    reporter.clear();

    crate::summary::print_run_report(&report, sink.dir());

    let failed = report.failed().count();
    if failed > 0 {
        bail!("{failed} of {} shard(s) failed", report.shards.len());
    }
    Ok(())
}
