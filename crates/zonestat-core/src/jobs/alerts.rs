use serde::{Deserialize, Serialize};
use tracing::info;

use crate::alerts::{integrate, AlertNormalizer, RawAlertBands, SourceSchema};
use crate::catalog::RasterCatalog;
use crate::error::{Result, ZonestatError};
use crate::export::{MeasureRow, Schema};
use crate::zonal::{Reducer, Zone};

use super::{per_year, single_measure, ShardContext, ShardJob};

/// Catalog products holding one source's confidence and date bands.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertBandPair {
    pub confidence: String,
    pub date: String,
}

impl AlertBandPair {
    pub fn new(confidence: &str, date: &str) -> Self {
        Self {
            confidence: confidence.to_string(),
            date: date.to_string(),
        }
    }

    fn load(&self, catalog: &dyn RasterCatalog) -> Result<Option<RawAlertBands>> {
        match (catalog.image(&self.confidence)?, catalog.image(&self.date)?) {
            (Some(confidence), Some(date)) => Ok(Some(RawAlertBands { confidence, date })),
            _ => Ok(None),
        }
    }
}

/// Landsat alert bands of one calendar year.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GladLandsatYear {
    pub year: i32,
    pub confidence: String,
    pub date: String,
}

impl GladLandsatYear {
    fn new(year: i32) -> Self {
        let yy = year % 100;
        Self {
            year,
            confidence: format!("glad_l_conf{yy:02}"),
            date: format!("glad_l_alert_date{yy:02}"),
        }
    }
}

/// Hectares of integrated deforestation alerts per zone and year.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertsJob {
    pub radd: Option<AlertBandPair>,
    pub glad_l: Vec<GladLandsatYear>,
    pub glad_s2: Option<AlertBandPair>,
}

impl Default for AlertsJob {
    fn default() -> Self {
        Self {
            radd: Some(AlertBandPair::new("radd_alert", "radd_date")),
            // No 2024 Landsat release; 2025 comes from the update stream.
            glad_l: [2021, 2022, 2023, 2025].into_iter().map(GladLandsatYear::new).collect(),
            glad_s2: Some(AlertBandPair::new("glad_s2_alert", "glad_s2_date")),
        }
    }
}

impl ShardJob for AlertsJob {
    fn name(&self) -> &'static str {
        "integrated_alerts"
    }

    fn schema(&self) -> Schema {
        Schema::new(["ha_alerts"])
    }

    fn validate(&self) -> Result<()> {
        if self.radd.is_none() && self.glad_l.is_empty() && self.glad_s2.is_none() {
            return Err(ZonestatError::Configuration(
                "alerts job needs at least one alert source".to_string(),
            ));
        }
        Ok(())
    }

    fn materialize(&self, ctx: &ShardContext<'_>, zones: &[Zone], years: &[i32]) -> Result<Vec<MeasureRow>> {
        let grid = ctx.catalog.grid();
        let normalizer = AlertNormalizer::new(ctx.mapper);
        let mut sources = Vec::new();

        if let Some(pair) = &self.radd {
            let raw = pair.load(ctx.catalog)?;
            sources.push(normalizer.normalize(&SourceSchema::radd(), raw.as_ref(), grid)?);
        }
        if !self.glad_l.is_empty() {
            let parts = self
                .glad_l
                .iter()
                .map(|y| {
                    let pair = AlertBandPair::new(&y.confidence, &y.date);
                    Ok((SourceSchema::glad_l(y.year), pair.load(ctx.catalog)?))
                })
                .collect::<Result<Vec<_>>>()?;
            sources.push(normalizer.normalize_multi(&parts, grid)?);
        }
        if let Some(pair) = &self.glad_s2 {
            let raw = pair.load(ctx.catalog)?;
            sources.push(normalizer.normalize(&SourceSchema::glad_s2(), raw.as_ref(), grid)?);
        }

        let integrated = integrate(&sources, &ctx.fusion)?;
        let aggregator = ctx.aggregator.with_reducer(Reducer::Sum);

        per_year(years, |year| {
            let window = ctx.mapper.year_window(year)?;
            let area = integrated.area_for_window(&window)?;
            info!(year, start = window.start, end = window.end, "Aggregating alerts");
            let fragments = aggregator.aggregate(Some(&area), zones, None)?;
            Ok(single_measure(fragments, year))
        })
    }
}
