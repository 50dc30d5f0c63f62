use std::time::Duration;

use super::shard::YearRange;

/// Pipeline stage, used for progress reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineStage {
    Planning,
    Materializing,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Planning => write!(f, "Planning shards"),
            Self::Materializing => write!(f, "Materializing shards"),
        }
    }
}

/// Thread-safe progress reporting for the pipeline.
///
/// Implementors can use this to drive progress bars, logging, or any other
/// UI feedback. All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    /// A new pipeline stage has started. `total_items` is the number of
    /// work items in this stage (e.g., shard count), if known.
    fn begin_stage(&self, _stage: PipelineStage, _total_items: Option<usize>) {}

    /// One work item within the current stage has completed.
    fn advance(&self, _items_done: usize) {}

    /// The current stage is finished.
    fn finish_stage(&self) {}
}

/// No-op progress reporter, used when `run_pipeline` delegates.
pub(super) struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}

/// How a shard ended after all its attempts.
#[derive(Clone, Debug, PartialEq)]
pub enum ShardOutcome {
    Exported { rows: usize },
    Failed { error: String },
}

#[derive(Clone, Debug)]
pub struct ShardReport {
    pub description: String,
    pub group: String,
    pub years: YearRange,
    pub zones: usize,
    pub attempts: usize,
    pub elapsed: Duration,
    pub outcome: ShardOutcome,
}

impl ShardReport {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ShardOutcome::Exported { .. })
    }

    pub fn rows(&self) -> usize {
        match self.outcome {
            ShardOutcome::Exported { rows } => rows,
            ShardOutcome::Failed { .. } => 0,
        }
    }
}

/// Per-shard outcomes of one run, in plan order.
#[derive(Clone, Debug)]
pub struct RunReport {
    pub job: String,
    pub shards: Vec<ShardReport>,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &ShardReport> {
        self.shards.iter().filter(|s| s.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = &ShardReport> {
        self.shards.iter().filter(|s| !s.is_success())
    }

    pub fn total_rows(&self) -> usize {
        self.shards.iter().map(ShardReport::rows).sum()
    }

    pub fn is_complete(&self) -> bool {
        self.shards.iter().all(ShardReport::is_success)
    }
}
