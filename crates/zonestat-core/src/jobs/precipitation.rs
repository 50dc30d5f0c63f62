use serde::{Deserialize, Serialize};

use crate::dates::DateRange;
use crate::error::Result;
use crate::export::{MeasureRow, Schema, Value};
use crate::join::left_join;
use crate::raster::Composite;
use crate::zonal::{Reducer, Zone, ZoneFragment};

use super::{per_year, ShardContext, ShardJob};

/// Zone-mean precipitation totals for the calendar year and the rainy season
/// ending in that year.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrecipitationJob {
    /// Daily or pentad precipitation images in millimetres.
    pub product: String,
}

impl Default for PrecipitationJob {
    fn default() -> Self {
        Self {
            product: "chirps_precipitation".to_string(),
        }
    }
}

impl PrecipitationJob {
    fn zone_means(&self, ctx: &ShardContext<'_>, zones: &[Zone], range: &DateRange) -> Result<Vec<ZoneFragment>> {
        let total = ctx.catalog.composite(&self.product, range, Composite::Sum)?;
        ctx.aggregator
            .with_reducer(Reducer::Mean)
            .aggregate(total.as_ref(), zones, None)
    }
}

impl ShardJob for PrecipitationJob {
    fn name(&self) -> &'static str {
        "precip"
    }

    fn schema(&self) -> Schema {
        Schema::new(["calendar_year_mm", "rainy_season_mm"])
    }

    fn materialize(&self, ctx: &ShardContext<'_>, zones: &[Zone], years: &[i32]) -> Result<Vec<MeasureRow>> {
        per_year(years, |year| {
            let annual = self.zone_means(ctx, zones, &DateRange::calendar_year(year)?)?;
            let wet = self.zone_means(ctx, zones, &DateRange::rainy_season(year)?)?;
            Ok(left_join(annual, &wet)
                .into_iter()
                .map(|joined| MeasureRow {
                    code: joined.primary.code,
                    year,
                    measures: vec![
                        Value::from(joined.primary.value),
                        Value::from(joined.matched.and_then(|w| w.value)),
                    ],
                })
                .collect())
        })
    }
}
