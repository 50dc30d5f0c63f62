use std::collections::BTreeMap;

use ndarray::{Array2, Zip};
use serde::{Deserialize, Serialize};

use crate::consts::{
    CONFIDENCE_CODE_HIGH, CONFIDENCE_CODE_HIGHEST, CONFIDENCE_CODE_LOW, CONFIDENCE_CODE_NONE,
};
use crate::dates::YearWindow;
use crate::error::{Result, ZonestatError};
use crate::raster::{area_ha, GridSpec, Raster};

/// Ordinal detection strength, `None < Low < High < Highest`.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Confidence {
    #[default]
    None,
    Low,
    High,
    Highest,
}

impl Confidence {
    /// Integer code used in exported alert bands.
    pub fn code(self) -> u8 {
        match self {
            Self::None => CONFIDENCE_CODE_NONE,
            Self::Low => CONFIDENCE_CODE_LOW,
            Self::High => CONFIDENCE_CODE_HIGH,
            Self::Highest => CONFIDENCE_CODE_HIGHEST,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            CONFIDENCE_CODE_NONE => Some(Self::None),
            CONFIDENCE_CODE_LOW => Some(Self::Low),
            CONFIDENCE_CODE_HIGH => Some(Self::High),
            CONFIDENCE_CODE_HIGHEST => Some(Self::Highest),
            _ => None,
        }
    }

    /// High or highest confidence.
    pub fn is_high(self) -> bool {
        matches!(self, Self::High | Self::Highest)
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "NONE"),
            Self::Low => write!(f, "LOW"),
            Self::High => write!(f, "HIGH"),
            Self::Highest => write!(f, "HIGHEST"),
        }
    }
}

/// Canonical per-pixel alert. `day_offset` is defined iff the confidence
/// is not [`Confidence::None`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct AlertPixel {
    confidence: Confidence,
    day_offset: Option<i32>,
}

impl AlertPixel {
    pub const NONE: Self = Self {
        confidence: Confidence::None,
        day_offset: None,
    };

    /// Build a pixel, collapsing to [`AlertPixel::NONE`] when either part is missing.
    pub fn new(confidence: Confidence, day_offset: Option<i32>) -> Self {
        match (confidence, day_offset) {
            (Confidence::None, _) | (_, None) => Self::NONE,
            (confidence, Some(day)) => Self {
                confidence,
                day_offset: Some(day),
            },
        }
    }

    pub fn alert(confidence: Confidence, day_offset: i32) -> Self {
        Self::new(confidence, Some(day_offset))
    }

    pub fn confidence(&self) -> Confidence {
        self.confidence
    }

    pub fn day_offset(&self) -> Option<i32> {
        self.day_offset
    }

    pub fn is_alert(&self) -> bool {
        self.confidence != Confidence::None
    }
}

/// Integrated or normalized alert layer in the canonical schema.
#[derive(Clone, Debug, PartialEq)]
pub struct AlertLayer {
    grid: GridSpec,
    pixels: Array2<AlertPixel>,
    temporal_radius: u32,
}

impl AlertLayer {
    /// Layer with no alerts anywhere.
    pub fn empty(grid: &GridSpec) -> Self {
        Self {
            pixels: Array2::from_elem(grid.dim(), AlertPixel::NONE),
            grid: grid.clone(),
            temporal_radius: 0,
        }
    }

    pub fn from_pixels(grid: &GridSpec, pixels: Array2<AlertPixel>) -> Result<Self> {
        if pixels.dim() != grid.dim() {
            let (rows, cols) = pixels.dim();
            return Err(ZonestatError::GridMismatch {
                expected: grid.describe(),
                actual: format!("alert layer with {cols}x{rows} pixels"),
            });
        }
        Ok(Self {
            grid: grid.clone(),
            pixels,
            temporal_radius: 0,
        })
    }

    /// Days by which year windows are widened when this layer is masked by year.
    pub fn with_temporal_radius(mut self, days: u32) -> Self {
        self.temporal_radius = days;
        self
    }

    pub fn grid(&self) -> &GridSpec {
        &self.grid
    }

    pub fn pixels(&self) -> &Array2<AlertPixel> {
        &self.pixels
    }

    pub fn temporal_radius(&self) -> u32 {
        self.temporal_radius
    }

    pub fn get(&self, row: usize, col: usize) -> AlertPixel {
        self.pixels.get((row, col)).copied().unwrap_or(AlertPixel::NONE)
    }

    /// Confidence codes as a raster; every pixel is valid.
    pub fn confidence_band(&self) -> Result<Raster<u8>> {
        Raster::new("Alert", self.grid.clone(), self.pixels.mapv(|p| p.confidence().code()))
    }

    /// Day offsets as a raster, valid only where an alert exists.
    pub fn date_band(&self) -> Result<Raster<i32>> {
        let data = self.pixels.mapv(|p| p.day_offset().unwrap_or(0));
        let valid = self.pixels.mapv(|p| p.is_alert());
        Raster::with_mask("Date", self.grid.clone(), data, valid)
    }

    /// True where an alert's date falls in `window`, widened by the layer's
    /// temporal radius.
    pub fn year_mask(&self, window: &YearWindow) -> Array2<bool> {
        let radius = self.temporal_radius;
        Zip::from(&self.pixels).map_collect(|p| match p.day_offset() {
            Some(day) => window.contains_buffered(day, radius),
            None => false,
        })
    }

    /// Hectare layer of alerts dated inside `window`.
    pub fn area_for_window(&self, window: &YearWindow) -> Result<Raster<f64>> {
        area_ha(&self.grid, &self.year_mask(window))
    }

    /// Pixel counts per confidence level, alerts only.
    pub fn count_by_confidence(&self) -> BTreeMap<Confidence, usize> {
        let mut counts = BTreeMap::new();
        for p in self.pixels.iter().filter(|p| p.is_alert()) {
            *counts.entry(p.confidence()).or_insert(0) += 1;
        }
        counts
    }
}
