use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::layer::Raster;

/// Per-pixel reduction of a dated image collection into one raster.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Composite {
    Max,
    Sum,
    Mean,
    /// First valid value in collection order (mosaic).
    First,
}

impl std::fmt::Display for Composite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Max => write!(f, "max"),
            Self::Sum => write!(f, "sum"),
            Self::Mean => write!(f, "mean"),
            Self::First => write!(f, "first"),
        }
    }
}

/// Reduce `layers` pixel by pixel over their valid values.
///
/// Returns `Ok(None)` for an empty collection so callers can substitute a
/// zero-valued result instead of failing. A pixel is valid in the output if
/// it is valid in at least one input.
pub fn composite(layers: &[Raster<f64>], method: Composite) -> Result<Option<Raster<f64>>> {
    let Some(first) = layers.first() else {
        return Ok(None);
    };
    let grid = first.grid().clone();
    for layer in &layers[1..] {
        grid.ensure_matches(layer.grid())?;
    }

    let dim = grid.dim();
    let mut acc = Array2::<f64>::zeros(dim);
    let mut count = Array2::<u32>::zeros(dim);

    for layer in layers {
        let data = layer.data();
        let valid = layer.valid();
        for ((idx, &v), &ok) in data.indexed_iter().zip(valid.iter()) {
            if !ok || !v.is_finite() {
                continue;
            }
            let n = count[idx];
            acc[idx] = match method {
                Composite::Max if n > 0 => acc[idx].max(v),
                Composite::First if n > 0 => acc[idx],
                Composite::Sum | Composite::Mean if n > 0 => acc[idx] + v,
                _ => v,
            };
            count[idx] = n + 1;
        }
    }

    if method == Composite::Mean {
        for (a, &n) in acc.iter_mut().zip(count.iter()) {
            if n > 0 {
                *a /= n as f64;
            }
        }
    }

    let valid = count.mapv(|n| n > 0);
    let band = first.band().to_string();
    Raster::with_mask(band, grid, acc, valid).map(Some)
}
