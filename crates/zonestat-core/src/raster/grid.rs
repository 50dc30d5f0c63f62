use serde::{Deserialize, Serialize};

use crate::consts::{EARTH_RADIUS_M, M2_PER_HA, RESOLUTION_EPSILON};
use crate::error::{Result, ZonestatError};

/// Coordinate reference of a grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Crs {
    /// Longitude/latitude in degrees, north-up.
    #[default]
    Geographic,
    /// Planar coordinates in metres, north-up.
    Projected,
}

/// Regular north-up grid shared by every layer of a run.
///
/// `(origin_x, origin_y)` is the top-left corner of pixel `(0, 0)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    pub origin_x: f64,
    pub origin_y: f64,
    pub pixel_size: f64,
    pub rows: usize,
    pub cols: usize,
    #[serde(default)]
    pub crs: Crs,
}

impl GridSpec {
    pub fn new(origin_x: f64, origin_y: f64, pixel_size: f64, rows: usize, cols: usize, crs: Crs) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_size,
            rows,
            cols,
            crs,
        }
    }

    pub fn dim(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn pixel_count(&self) -> usize {
        self.rows * self.cols
    }

    /// Area in hectares of a pixel in `row`.
    ///
    /// Geographic grids use the spherical cell area
    /// `R^2 * dlon * (sin(lat_top) - sin(lat_bottom))`; all pixels in a row
    /// share the same area.
    pub fn pixel_area_ha(&self, row: usize) -> f64 {
        match self.crs {
            Crs::Projected => self.pixel_size * self.pixel_size / M2_PER_HA,
            Crs::Geographic => {
                let top = (self.origin_y - row as f64 * self.pixel_size).clamp(-90.0, 90.0);
                let bottom = (top - self.pixel_size).clamp(-90.0, 90.0);
                let dlon = self.pixel_size.to_radians();
                let band = top.to_radians().sin() - bottom.to_radians().sin();
                EARTH_RADIUS_M * EARTH_RADIUS_M * dlon * band.abs() / M2_PER_HA
            }
        }
    }

    /// Pixel areas for every row, top to bottom.
    pub fn row_areas_ha(&self) -> Vec<f64> {
        (0..self.rows).map(|row| self.pixel_area_ha(row)).collect()
    }

    /// Nominal pixel size in metres (equatorial for geographic grids).
    pub fn nominal_pixel_size_m(&self) -> f64 {
        match self.crs {
            Crs::Projected => self.pixel_size,
            Crs::Geographic => self.pixel_size.to_radians() * EARTH_RADIUS_M,
        }
    }

    /// Number of native pixels per side of a reduction cell at `resolution_m`.
    ///
    /// Resolutions at or below the native pixel size reduce at native
    /// resolution.
    pub fn block_factor(&self, resolution_m: f64) -> usize {
        let ratio = resolution_m / self.nominal_pixel_size_m();
        if ratio <= 1.0 + RESOLUTION_EPSILON {
            1
        } else {
            ratio.round().max(1.0) as usize
        }
    }

    /// Row range whose pixels may intersect the vertical span `[min_y, max_y]`.
    pub fn row_span(&self, min_y: f64, max_y: f64) -> std::ops::Range<usize> {
        let first = ((self.origin_y - max_y) / self.pixel_size).floor().max(0.0) as usize;
        let last = ((self.origin_y - min_y) / self.pixel_size).ceil().max(0.0) as usize;
        first.min(self.rows)..last.min(self.rows)
    }

    /// Column range whose pixels may intersect the horizontal span `[min_x, max_x]`.
    pub fn col_span(&self, min_x: f64, max_x: f64) -> std::ops::Range<usize> {
        let first = ((min_x - self.origin_x) / self.pixel_size).floor().max(0.0) as usize;
        let last = ((max_x - self.origin_x) / self.pixel_size).ceil().max(0.0) as usize;
        first.min(self.cols)..last.min(self.cols)
    }

    /// Fail with [`ZonestatError::GridMismatch`] unless `other` is the same grid.
    pub fn ensure_matches(&self, other: &GridSpec) -> Result<()> {
        if self == other {
            Ok(())
        } else {
            Err(ZonestatError::GridMismatch {
                expected: self.describe(),
                actual: other.describe(),
            })
        }
    }

    pub fn describe(&self) -> String {
        format!(
            "{}x{} @ {} ({:?}, origin {}, {})",
            self.cols, self.rows, self.pixel_size, self.crs, self.origin_x, self.origin_y
        )
    }
}
