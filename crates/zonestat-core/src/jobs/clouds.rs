use serde::{Deserialize, Serialize};

use crate::dates::DateRange;
use crate::error::Result;
use crate::export::{MeasureRow, Schema, Value};
use crate::raster::Composite;
use crate::zonal::{Reducer, Zone};

use super::{per_year, ShardContext, ShardJob};

/// Mean yearly cloud fraction per zone.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudsJob {
    /// Cloud probability images in percent (0-100).
    pub product: String,
}

impl Default for CloudsJob {
    fn default() -> Self {
        Self {
            product: "cloud_probability".to_string(),
        }
    }
}

impl ShardJob for CloudsJob {
    fn name(&self) -> &'static str {
        "cloud"
    }

    fn schema(&self) -> Schema {
        Schema::new(["cloud_share", "clear_share"])
    }

    fn materialize(&self, ctx: &ShardContext<'_>, zones: &[Zone], years: &[i32]) -> Result<Vec<MeasureRow>> {
        let aggregator = ctx.aggregator.with_reducer(Reducer::Mean);
        per_year(years, |year| {
            let range = DateRange::calendar_year(year)?;
            let fraction = ctx
                .catalog
                .composite(&self.product, &range, Composite::Mean)?
                .map(|p| p.map(|v| v / 100.0));
            let fragments = aggregator.aggregate(fraction.as_ref(), zones, None)?;
            Ok(fragments
                .into_iter()
                .map(|f| MeasureRow {
                    code: f.code,
                    year,
                    measures: vec![Value::from(f.value), Value::from(f.value.map(|m| 1.0 - m))],
                })
                .collect())
        })
    }
}
