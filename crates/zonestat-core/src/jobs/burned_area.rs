use serde::{Deserialize, Serialize};

use crate::dates::DateRange;
use crate::error::Result;
use crate::export::{MeasureRow, Schema};
use crate::raster::{area_ha, Composite};
use crate::zonal::{Reducer, Zone};

use super::{per_year, single_measure, ShardContext, ShardJob};

/// Burned hectares per zone and year from a burn-date product.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BurnedAreaJob {
    /// Monthly burn-date images; any value > 0 marks a burned pixel.
    pub product: String,
}

impl Default for BurnedAreaJob {
    fn default() -> Self {
        Self {
            product: "burn_date".to_string(),
        }
    }
}

impl ShardJob for BurnedAreaJob {
    fn name(&self) -> &'static str {
        "burned_ha"
    }

    fn schema(&self) -> Schema {
        Schema::new(["burned_ha"])
    }

    fn materialize(&self, ctx: &ShardContext<'_>, zones: &[Zone], years: &[i32]) -> Result<Vec<MeasureRow>> {
        let aggregator = ctx.aggregator.with_reducer(Reducer::Sum);
        per_year(years, |year| {
            let range = DateRange::calendar_year(year)?;
            let burned = ctx.catalog.composite(&self.product, &range, Composite::Max)?;
            let area = burned
                .map(|b| area_ha(ctx.catalog.grid(), &b.mask_where(|v| v > 0.0)))
                .transpose()?;
            let fragments = aggregator.aggregate(area.as_ref(), zones, None)?;
            Ok(single_measure(fragments, year))
        })
    }
}
