mod alerts;
mod burned_area;
mod clouds;
mod forest_loss;
mod land_cover;
mod precipitation;

pub use alerts::{AlertBandPair, AlertsJob, GladLandsatYear};
pub use burned_area::BurnedAreaJob;
pub use clouds::CloudsJob;
pub use forest_loss::ForestLossJob;
pub use land_cover::{ClassColumn, ClassTable, LandCoverJob};
pub use precipitation::PrecipitationJob;

use serde::{Deserialize, Serialize};

use crate::alerts::FusionParams;
use crate::catalog::RasterCatalog;
use crate::dates::EpochDateMapper;
use crate::error::Result;
use crate::export::{MeasureRow, Schema, Value};
use crate::zonal::{ZonalAggregator, Zone, ZoneFragment};

/// Read-only inputs shared by every job while materializing one shard.
pub struct ShardContext<'a> {
    pub catalog: &'a dyn RasterCatalog,
    pub mapper: EpochDateMapper,
    pub aggregator: ZonalAggregator,
    pub fusion: FusionParams,
}

/// One kind of zone-year table.
///
/// `materialize` is pure with respect to its inputs: it reads the catalog
/// and returns rows, never touching shared state.
pub trait ShardJob: Send + Sync {
    /// Short name used in table descriptions.
    fn name(&self) -> &'static str;

    /// Measure columns, in output order.
    fn schema(&self) -> Schema;

    /// Checks run once before any shard is scheduled.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Measures for every zone and year of one shard.
    fn materialize(&self, ctx: &ShardContext<'_>, zones: &[Zone], years: &[i32]) -> Result<Vec<MeasureRow>>;
}

/// Job selection as written in the run configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobSpec {
    Alerts(AlertsJob),
    BurnedArea(BurnedAreaJob),
    LandCover(LandCoverJob),
    ForestLoss(ForestLossJob),
    Precipitation(PrecipitationJob),
    Clouds(CloudsJob),
}

impl Default for JobSpec {
    fn default() -> Self {
        Self::Alerts(AlertsJob::default())
    }
}

impl JobSpec {
    pub fn job(&self) -> &dyn ShardJob {
        match self {
            Self::Alerts(job) => job,
            Self::BurnedArea(job) => job,
            Self::LandCover(job) => job,
            Self::ForestLoss(job) => job,
            Self::Precipitation(job) => job,
            Self::Clouds(job) => job,
        }
    }
}

/// Run `f` for every year and concatenate the rows once.
fn per_year<F>(years: &[i32], mut f: F) -> Result<Vec<MeasureRow>>
where
    F: FnMut(i32) -> Result<Vec<MeasureRow>>,
{
    let mut rows = Vec::new();
    for &year in years {
        rows.extend(f(year)?);
    }
    Ok(rows)
}

/// One row per fragment with a single measure.
fn single_measure(fragments: Vec<ZoneFragment>, year: i32) -> Vec<MeasureRow> {
    fragments
        .into_iter()
        .map(|f| MeasureRow {
            code: f.code,
            year,
            measures: vec![Value::from(f.value)],
        })
        .collect()
}
