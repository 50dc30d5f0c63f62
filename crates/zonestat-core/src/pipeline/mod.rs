pub mod config;
mod orchestrator;
mod shard;
mod types;

pub use config::RunConfig;
pub use orchestrator::{run_pipeline, run_pipeline_reported};
pub use shard::{plan_shards, Shard, YearRange, ALL_ZONES_GROUP};
pub use types::{PipelineStage, ProgressReporter, RunReport, ShardOutcome, ShardReport};
