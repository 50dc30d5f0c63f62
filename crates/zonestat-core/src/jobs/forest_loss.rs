use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::consts::{DEFAULT_TREECOVER_THRESHOLD, LOSS_YEAR_BASE};
use crate::dates::DateRange;
use crate::error::{Result, ZonestatError};
use crate::export::{MeasureRow, Schema, Value};
use crate::join::{derived_rate, left_join};
use crate::raster::{area_ha, Composite, Raster};
use crate::zonal::{Reducer, Zone};

use super::{per_year, ShardContext, ShardJob};

/// Yearly tree-cover loss against a year-2000 forest baseline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestLossJob {
    pub treecover: String,
    pub lossyear: String,
    pub datamask: String,
    /// Minimum year-2000 canopy cover (percent) counted as forest.
    pub threshold: f64,
}

impl Default for ForestLossJob {
    fn default() -> Self {
        Self {
            treecover: "treecover2000".to_string(),
            lossyear: "lossyear".to_string(),
            datamask: "datamask".to_string(),
            threshold: DEFAULT_TREECOVER_THRESHOLD,
        }
    }
}

impl ForestLossJob {
    /// Forest in 2000: canopy at or above the threshold over mapped land.
    fn forest_mask(&self, ctx: &ShardContext<'_>) -> Result<Option<Raster<f64>>> {
        let (Some(treecover), Some(datamask)) = (
            ctx.catalog.image(&self.treecover)?,
            ctx.catalog.image(&self.datamask)?,
        ) else {
            return Ok(None);
        };
        let threshold = self.threshold;
        let forest = treecover.zip_with(&datamask, "forest2000", move |tc, dm| {
            if tc >= threshold && dm.round() as i64 == 1 {
                1.0
            } else {
                0.0
            }
        })?;
        Ok(Some(forest))
    }
}

impl ShardJob for ForestLossJob {
    fn name(&self) -> &'static str {
        "forestloss"
    }

    fn schema(&self) -> Schema {
        Schema::new(["loss_ha", "forest2000_ha", "defor_rate"])
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..=100.0).contains(&self.threshold) {
            return Err(ZonestatError::Configuration(format!(
                "tree-cover threshold must be within 0..=100, got {}",
                self.threshold
            )));
        }
        Ok(())
    }

    fn materialize(&self, ctx: &ShardContext<'_>, zones: &[Zone], years: &[i32]) -> Result<Vec<MeasureRow>> {
        let grid = ctx.catalog.grid();
        let aggregator = ctx.aggregator.with_reducer(Reducer::Sum);
        let forest = self.forest_mask(ctx)?;
        let lossyear = ctx.catalog.composite(&self.lossyear, &DateRange::all(), Composite::First)?;

        let baseline_area = forest
            .as_ref()
            .map(|f| area_ha(grid, &f.mask_where(|v| v > 0.0)))
            .transpose()?;
        let baseline = aggregator.aggregate(baseline_area.as_ref(), zones, None)?;
        debug!(zones = zones.len(), "Computed forest baseline");

        let loss = per_year(years, |year| {
            let code = f64::from(year - LOSS_YEAR_BASE);
            let area = match (&forest, &lossyear) {
                (Some(forest), Some(lossyear)) => {
                    let lost = forest.zip_with(lossyear, "loss", move |f, ly| {
                        if f > 0.0 && ly.round() == code {
                            1.0
                        } else {
                            0.0
                        }
                    })?;
                    Some(area_ha(grid, &lost.mask_where(|v| v > 0.0))?)
                }
                _ => None,
            };
            let fragments = aggregator.aggregate(area.as_ref(), zones, None)?;
            Ok(fragments
                .into_iter()
                .map(|f| MeasureRow {
                    code: f.code,
                    year,
                    measures: vec![Value::from(f.value)],
                })
                .collect())
        })?;

        Ok(left_join(loss, &baseline)
            .into_iter()
            .map(|joined| {
                let mut row = joined.primary;
                let loss_ha = row.measures.first().and_then(Value::as_f64);
                let forest_ha = joined.matched.and_then(|b| b.value);
                row.measures.push(Value::from(forest_ha));
                row.measures.push(Value::from(derived_rate(loss_ha, forest_ha)));
                row
            })
            .collect())
    }
}
