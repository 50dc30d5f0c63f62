use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use tracing::{info, warn};

use crate::catalog::RasterCatalog;
use crate::error::{Result, ZonestatError};
use crate::export::{ExportSink, Schema, Table, ZoneYearRecord};
use crate::jobs::{ShardContext, ShardJob};
use crate::zonal::{ZonalAggregator, Zone, ZoneMeta};

use super::config::RunConfig;
use super::shard::{plan_shards, Shard};
use super::types::{NoOpReporter, PipelineStage, ProgressReporter, RunReport, ShardOutcome, ShardReport};

/// Run every shard of a job and hand each finished table to `sink`.
pub fn run_pipeline(
    config: &RunConfig,
    catalog: &dyn RasterCatalog,
    zones: &[Zone],
    sink: &dyn ExportSink,
) -> Result<RunReport> {
    run_pipeline_reported(config, catalog, zones, sink, Arc::new(NoOpReporter))
}

/// Run the pipeline with a thread-safe progress reporter.
///
/// Configuration errors abort before any shard is scheduled. Shard failures
/// are retried up to `max_attempts` and then recorded in the report; they
/// never affect other shards.
pub fn run_pipeline_reported(
    config: &RunConfig,
    catalog: &dyn RasterCatalog,
    zones: &[Zone],
    sink: &dyn ExportSink,
    reporter: Arc<dyn ProgressReporter>,
) -> Result<RunReport> {
    let started = Instant::now();
    config.validate()?;
    let job = config.job.job();

    reporter.begin_stage(PipelineStage::Planning, None);
    let ctx = ShardContext {
        catalog,
        mapper: config.mapper(),
        aggregator: ZonalAggregator::new(config.aggregate_params())?,
        fusion: config.fusion_params()?,
    };
    let shards = plan_shards(zones, &config.zone_groups, &config.year_ranges, config.table_prefix())?;
    let metadata: Vec<ZoneMeta> = zones.iter().map(Zone::meta).collect();
    let schema = job.schema();
    reporter.finish_stage();

    info!(
        job = job.name(),
        shards = shards.len(),
        zones = zones.len(),
        workers = config.workers,
        epoch = %config.epoch,
        calendar = %config.calendar,
        "Starting run"
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.workers)
        .build()
        .map_err(|e| ZonestatError::Configuration(format!("cannot build worker pool: {e}")))?;

    reporter.begin_stage(PipelineStage::Materializing, Some(shards.len()));
    let done = AtomicUsize::new(0);
    let reports: Vec<ShardReport> = pool.install(|| {
        shards
            .par_iter()
            .map(|shard| {
                let report = run_shard(job, &ctx, shard, &schema, &metadata, sink, config.max_attempts);
                reporter.advance(done.fetch_add(1, Ordering::Relaxed) + 1);
                report
            })
            .collect()
    });
    reporter.finish_stage();

    let report = RunReport {
        job: job.name().to_string(),
        shards: reports,
        elapsed: started.elapsed(),
    };
    info!(
        succeeded = report.succeeded().count(),
        failed = report.failed().count(),
        rows = report.total_rows(),
        elapsed_ms = report.elapsed.as_millis() as u64,
        "Run finished"
    );
    Ok(report)
}

fn run_shard(
    job: &dyn ShardJob,
    ctx: &ShardContext<'_>,
    shard: &Shard,
    schema: &Schema,
    metadata: &[ZoneMeta],
    sink: &dyn ExportSink,
    max_attempts: usize,
) -> ShardReport {
    let started = Instant::now();
    let mut attempts = 0;
    let outcome = loop {
        attempts += 1;
        match export_shard(job, ctx, shard, schema, metadata, sink) {
            Ok(rows) => {
                info!(shard = %shard.description, rows, attempts, "Shard exported");
                break ShardOutcome::Exported { rows };
            }
            Err(e) => {
                let error = ZonestatError::ShardFailed {
                    shard: shard.description.clone(),
                    message: e.to_string(),
                };
                warn!(attempt = attempts, max_attempts, "{error}");
                if e.is_configuration() || attempts >= max_attempts {
                    break ShardOutcome::Failed { error: e.to_string() };
                }
            }
        }
    };

    ShardReport {
        description: shard.description.clone(),
        group: shard.group.clone(),
        years: shard.years,
        zones: shard.zones.len(),
        attempts,
        elapsed: started.elapsed(),
        outcome,
    }
}

/// Materialize, join and export one shard, returning the row count.
fn export_shard(
    job: &dyn ShardJob,
    ctx: &ShardContext<'_>,
    shard: &Shard,
    schema: &Schema,
    metadata: &[ZoneMeta],
    sink: &dyn ExportSink,
) -> Result<usize> {
    let rows = job.materialize(ctx, &shard.zones, &shard.years.years())?;
    let records = ZoneYearRecord::attach_metadata(rows, metadata);
    let table = Table::from_records(shard.description.clone(), schema, records)?;
    sink.export(&table)?;
    Ok(table.len())
}
