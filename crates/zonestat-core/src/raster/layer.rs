use ndarray::{Array2, Zip};

use crate::consts::PARALLEL_PIXEL_THRESHOLD;
use crate::error::{Result, ZonestatError};

use super::grid::GridSpec;

/// Single-band raster over a [`GridSpec`] with a validity mask.
///
/// Rasters are immutable: every transform returns a new raster. Pixels
/// whose `valid` flag is false are undefined and never contribute to
/// reductions.
#[derive(Clone, Debug, PartialEq)]
pub struct Raster<T> {
    band: String,
    grid: GridSpec,
    data: Array2<T>,
    valid: Array2<bool>,
}

impl<T: Copy + Send + Sync> Raster<T> {
    /// Raster with every pixel valid.
    pub fn new(band: impl Into<String>, grid: GridSpec, data: Array2<T>) -> Result<Self> {
        let valid = Array2::from_elem(data.dim(), true);
        Self::with_mask(band, grid, data, valid)
    }

    pub fn with_mask(
        band: impl Into<String>,
        grid: GridSpec,
        data: Array2<T>,
        valid: Array2<bool>,
    ) -> Result<Self> {
        let band = band.into();
        if data.dim() != grid.dim() || valid.dim() != grid.dim() {
            let (rows, cols) = data.dim();
            return Err(ZonestatError::GridMismatch {
                expected: grid.describe(),
                actual: format!("band '{band}' with {cols}x{rows} pixels"),
            });
        }
        Ok(Self {
            band,
            grid,
            data,
            valid,
        })
    }

    /// Constant raster, all pixels valid.
    pub fn filled(band: impl Into<String>, grid: GridSpec, value: T) -> Self {
        let dim = grid.dim();
        Self {
            band: band.into(),
            data: Array2::from_elem(dim, value),
            valid: Array2::from_elem(dim, true),
            grid,
        }
    }

    pub fn band(&self) -> &str {
        &self.band
    }

    pub fn grid(&self) -> &GridSpec {
        &self.grid
    }

    pub fn data(&self) -> &Array2<T> {
        &self.data
    }

    pub fn valid(&self) -> &Array2<bool> {
        &self.valid
    }

    pub fn dim(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Value at `(row, col)`, or `None` if out of range or masked.
    pub fn get(&self, row: usize, col: usize) -> Option<T> {
        match self.valid.get((row, col)) {
            Some(true) => self.data.get((row, col)).copied(),
            _ => None,
        }
    }

    pub fn valid_count(&self) -> usize {
        self.valid.iter().filter(|&&v| v).count()
    }

    /// Apply `f` to every pixel value, keeping the mask.
    pub fn map<U, F>(&self, f: F) -> Raster<U>
    where
        U: Copy + Send + Sync,
        F: Fn(T) -> U + Send + Sync,
    {
        let data = if self.grid.pixel_count() >= PARALLEL_PIXEL_THRESHOLD {
            Zip::from(&self.data).par_map_collect(|&v| f(v))
        } else {
            self.data.mapv(&f)
        };
        Raster {
            band: self.band.clone(),
            grid: self.grid.clone(),
            data,
            valid: self.valid.clone(),
        }
    }

    /// Boolean mask that is true where the pixel is valid and `pred` holds.
    pub fn mask_where<F>(&self, pred: F) -> Array2<bool>
    where
        F: Fn(T) -> bool + Send + Sync,
    {
        if self.grid.pixel_count() >= PARALLEL_PIXEL_THRESHOLD {
            Zip::from(&self.data)
                .and(&self.valid)
                .par_map_collect(|&v, &ok| ok && pred(v))
        } else {
            Zip::from(&self.data)
                .and(&self.valid)
                .map_collect(|&v, &ok| ok && pred(v))
        }
    }

    /// Invalidate every pixel where `mask` is false.
    pub fn update_mask(&self, mask: &Array2<bool>) -> Result<Self> {
        if mask.dim() != self.dim() {
            let (rows, cols) = mask.dim();
            return Err(ZonestatError::GridMismatch {
                expected: self.grid.describe(),
                actual: format!("mask with {cols}x{rows} pixels"),
            });
        }
        let valid = Zip::from(&self.valid).and(mask).map_collect(|&a, &b| a && b);
        Ok(Self {
            band: self.band.clone(),
            grid: self.grid.clone(),
            data: self.data.clone(),
            valid,
        })
    }

    /// Combine two rasters on the same grid pixel by pixel. The result is
    /// valid only where both inputs are valid.
    pub fn zip_with<U, V, F>(&self, other: &Raster<U>, band: impl Into<String>, f: F) -> Result<Raster<V>>
    where
        U: Copy + Send + Sync,
        V: Copy + Send + Sync,
        F: Fn(T, U) -> V + Send + Sync,
    {
        self.grid.ensure_matches(other.grid())?;
        let data = Zip::from(&self.data).and(other.data()).map_collect(|&a, &b| f(a, b));
        let valid = Zip::from(&self.valid)
            .and(other.valid())
            .map_collect(|&a, &b| a && b);
        Raster::with_mask(band, self.grid.clone(), data, valid)
    }
}

/// Hectare area of each pixel, valid only where `mask` is true.
///
/// Summing this layer over a zone yields the masked area in hectares.
pub fn area_ha(grid: &GridSpec, mask: &Array2<bool>) -> Result<Raster<f64>> {
    let row_areas = grid.row_areas_ha();
    let data = Array2::from_shape_fn(grid.dim(), |(row, _)| row_areas[row]);
    Raster::with_mask("area_ha", grid.clone(), data, mask.clone())
}
