use std::collections::BTreeSet;
use std::str::FromStr;

use ndarray::Array2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::consts::PARALLEL_PIXEL_THRESHOLD;
use crate::error::{Result, ZonestatError};

use super::buffer::dilate;
use super::types::{AlertLayer, AlertPixel, Confidence};

/// Named, deterministic policy for combining per-source pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleSet {
    /// Highest confidence wins; ties go to the earliest date.
    #[default]
    #[serde(rename = "r1")]
    R1,
}

impl RuleSet {
    pub fn id(&self) -> &'static str {
        match self {
            Self::R1 => "r1",
        }
    }

    /// Combine the pixels of every source at one location.
    ///
    /// Total over all inputs: an empty or all-NONE input yields NONE.
    pub fn combine<I>(&self, pixels: I) -> AlertPixel
    where
        I: IntoIterator<Item = AlertPixel>,
    {
        match self {
            Self::R1 => pixels.into_iter().fold(AlertPixel::NONE, |best, p| {
                if r1_prefers(&p, &best) {
                    p
                } else {
                    best
                }
            }),
        }
    }
}

fn r1_prefers(candidate: &AlertPixel, current: &AlertPixel) -> bool {
    if !candidate.is_alert() {
        return false;
    }
    match candidate.confidence().cmp(&current.confidence()) {
        std::cmp::Ordering::Greater => true,
        std::cmp::Ordering::Less => false,
        std::cmp::Ordering::Equal => candidate.day_offset() < current.day_offset(),
    }
}

impl FromStr for RuleSet {
    type Err = ZonestatError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "r1" => Ok(Self::R1),
            _ => Err(ZonestatError::UnknownRuleset(s.to_string())),
        }
    }
}

impl std::fmt::Display for RuleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Spatial (pixels) and temporal (days) buffering. Zero disables each.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BufferConfig {
    #[serde(default)]
    pub spatial_radius: f64,
    #[serde(default)]
    pub temporal_radius: u32,
}

impl BufferConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.spatial_radius.is_finite() || self.spatial_radius < 0.0 {
            return Err(ZonestatError::Configuration(format!(
                "spatial buffer radius must be >= 0, got {}",
                self.spatial_radius
            )));
        }
        Ok(())
    }
}

/// Everything `integrate` needs besides the source layers.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FusionParams {
    pub ruleset: RuleSet,
    pub buffer: BufferConfig,
    /// Confidence levels kept after selection; empty keeps all.
    pub confidence_filter: BTreeSet<Confidence>,
}

/// Fuse normalized sources into one integrated alert layer.
///
/// Per pixel: select with `params.ruleset`, demote levels outside the
/// confidence filter to NONE, then dilate confirmed pixels by the spatial
/// buffer. The temporal buffer is recorded on the result and applied when
/// the layer is masked by year.
pub fn integrate(sources: &[AlertLayer], params: &FusionParams) -> Result<AlertLayer> {
    params.buffer.validate()?;
    let Some(first) = sources.first() else {
        return Err(ZonestatError::Configuration(
            "alert integration needs at least one source".to_string(),
        ));
    };
    let grid = first.grid().clone();
    for source in &sources[1..] {
        grid.ensure_matches(source.grid())?;
    }

    let (h, w) = grid.dim();
    let ruleset = params.ruleset;
    let filter = &params.confidence_filter;
    let select = |row: usize, col: usize| {
        let fused = ruleset.combine(sources.iter().map(|s| s.get(row, col)));
        if !filter.is_empty() && fused.is_alert() && !filter.contains(&fused.confidence()) {
            AlertPixel::NONE
        } else {
            fused
        }
    };

    let pixels = if h * w >= PARALLEL_PIXEL_THRESHOLD {
        let rows: Vec<Vec<AlertPixel>> = (0..h)
            .into_par_iter()
            .map(|row| (0..w).map(|col| select(row, col)).collect())
            .collect();
        let flat: Vec<AlertPixel> = rows.into_iter().flatten().collect();
        Array2::from_shape_vec((h, w), flat)
            .map_err(|e| ZonestatError::Configuration(e.to_string()))?
    } else {
        Array2::from_shape_fn((h, w), |(row, col)| select(row, col))
    };

    let mut fused = AlertLayer::from_pixels(&grid, pixels)?;
    if params.buffer.spatial_radius > 0.0 {
        fused = dilate(&fused, params.buffer.spatial_radius)?;
    }
    let fused = fused.with_temporal_radius(params.buffer.temporal_radius);

    info!(
        sources = sources.len(),
        ruleset = %ruleset,
        counts = ?fused.count_by_confidence(),
        "Integrated alert layer"
    );
    Ok(fused)
}
