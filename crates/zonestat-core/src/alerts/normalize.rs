use chrono::{NaiveDate, TimeDelta};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::consts::GLAD_S2_EPOCH;
use crate::dates::EpochDateMapper;
use crate::error::Result;
use crate::raster::{GridSpec, Raster};

use super::fusion::RuleSet;
use super::types::{AlertLayer, AlertPixel, Confidence};

/// Native date encoding of an alert product's date band.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DateEncoding {
    /// `YYDOY`: two-digit year since 2000 times 1000 plus day of year.
    YearDayOfYear,
    /// Day of year within a fixed calendar year.
    DayOfYear { year: i32 },
    /// Days elapsed since `epoch` (day 0 means no alert).
    DaysSince { epoch: NaiveDate },
}

impl DateEncoding {
    /// Decode one raw value. Zero, negative and impossible dates decode to `None`.
    pub fn decode(&self, raw: i64) -> Option<NaiveDate> {
        if raw <= 0 {
            return None;
        }
        match self {
            Self::YearDayOfYear => {
                let year = 2000 + i32::try_from(raw / 1000).ok()?;
                let doy = u32::try_from(raw % 1000).ok()?;
                NaiveDate::from_yo_opt(year, doy)
            }
            Self::DayOfYear { year } => NaiveDate::from_yo_opt(*year, u32::try_from(raw).ok()?),
            Self::DaysSince { epoch } => {
                TimeDelta::try_days(raw).and_then(|d| epoch.checked_add_signed(d))
            }
        }
    }
}

/// Mapping from one product's native bands into the canonical alert schema.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SourceSchema {
    pub name: String,
    /// Native confidence code to canonical level. Codes not listed map to NONE.
    pub confidence_map: Vec<(i64, Confidence)>,
    pub date_encoding: DateEncoding,
}

impl SourceSchema {
    /// Sentinel-1 radar alerts: 2 = unconfirmed, 3 = confirmed; dates as `YYDOY`.
    pub fn radd() -> Self {
        Self {
            name: "RADD".to_string(),
            confidence_map: vec![(2, Confidence::Low), (3, Confidence::High)],
            date_encoding: DateEncoding::YearDayOfYear,
        }
    }

    /// Landsat alerts for one year (`confYY` / `alertDateYY` band pair).
    pub fn glad_l(year: i32) -> Self {
        Self {
            name: format!("GLAD-L {year}"),
            confidence_map: vec![(2, Confidence::Low), (3, Confidence::High)],
            date_encoding: DateEncoding::DayOfYear { year },
        }
    }

    /// Sentinel-2 alerts: 1-2 low, 3 high, 4 highest; days since 2019-01-01.
    pub fn glad_s2() -> Self {
        Self {
            name: "GLAD-S2".to_string(),
            confidence_map: vec![
                (1, Confidence::Low),
                (2, Confidence::Low),
                (3, Confidence::High),
                (4, Confidence::Highest),
            ],
            date_encoding: DateEncoding::DaysSince {
                epoch: GLAD_S2_EPOCH,
            },
        }
    }

    pub fn map_confidence(&self, native: i64) -> Confidence {
        self.confidence_map
            .iter()
            .find(|(code, _)| *code == native)
            .map(|(_, c)| *c)
            .unwrap_or(Confidence::None)
    }
}

/// Raw confidence and date bands of one source, as read from the catalog.
#[derive(Clone, Debug)]
pub struct RawAlertBands {
    pub confidence: Raster<f64>,
    pub date: Raster<f64>,
}

/// Maps heterogeneous alert products onto the canonical `(confidence,
/// day_offset)` schema, re-expressing dates against one run-wide epoch.
#[derive(Clone, Copy, Debug)]
pub struct AlertNormalizer {
    mapper: EpochDateMapper,
}

impl AlertNormalizer {
    pub fn new(mapper: EpochDateMapper) -> Self {
        Self { mapper }
    }

    pub fn mapper(&self) -> &EpochDateMapper {
        &self.mapper
    }

    /// Normalize one source. Absent bands yield an all-NONE layer.
    pub fn normalize(
        &self,
        schema: &SourceSchema,
        raw: Option<&RawAlertBands>,
        grid: &GridSpec,
    ) -> Result<AlertLayer> {
        let Some(raw) = raw else {
            debug!(source = %schema.name, "Source bands absent, normalizing to NONE");
            return Ok(AlertLayer::empty(grid));
        };
        grid.ensure_matches(raw.confidence.grid())?;
        grid.ensure_matches(raw.date.grid())?;

        let pixels = Array2::from_shape_fn(grid.dim(), |(row, col)| {
            let conf = raw
                .confidence
                .get(row, col)
                .and_then(as_code)
                .map(|code| schema.map_confidence(code))
                .unwrap_or(Confidence::None);
            if conf == Confidence::None {
                return AlertPixel::NONE;
            }
            let day = raw
                .date
                .get(row, col)
                .and_then(as_code)
                .and_then(|v| schema.date_encoding.decode(v))
                .map(|d| self.mapper.day_offset(d));
            AlertPixel::new(conf, day)
        });

        let layer = AlertLayer::from_pixels(grid, pixels)?;
        debug!(source = %schema.name, counts = ?layer.count_by_confidence(), "Normalized source");
        Ok(layer)
    }

    /// Normalize several band sets of one product (e.g. one per year) and
    /// merge them with the r1 rule into a single source layer.
    pub fn normalize_multi(
        &self,
        parts: &[(SourceSchema, Option<RawAlertBands>)],
        grid: &GridSpec,
    ) -> Result<AlertLayer> {
        let layers = parts
            .iter()
            .map(|(schema, raw)| self.normalize(schema, raw.as_ref(), grid))
            .collect::<Result<Vec<_>>>()?;
        if layers.is_empty() {
            return Ok(AlertLayer::empty(grid));
        }
        let pixels = Array2::from_shape_fn(grid.dim(), |(row, col)| {
            RuleSet::R1.combine(layers.iter().map(|l| l.get(row, col)))
        });
        AlertLayer::from_pixels(grid, pixels)
    }
}

fn as_code(v: f64) -> Option<i64> {
    if v.is_finite() {
        Some(v.round() as i64)
    } else {
        None
    }
}
