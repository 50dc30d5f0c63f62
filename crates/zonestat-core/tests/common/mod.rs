#![allow(dead_code)]

use chrono::NaiveDate;
use ndarray::Array2;
use zonestat_core::alerts::{AlertLayer, AlertPixel};
use zonestat_core::raster::{Crs, GridSpec, Raster};
use zonestat_core::zonal::{AggregateParams, Polygon, Reducer, Zone};

/// Pixel edge of the test grids in metres; one pixel is exactly 1 ha.
pub const PIXEL_M: f64 = 100.0;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Projected grid of 1-ha pixels with its top-left corner at `(0, rows * 100)`.
pub fn projected_grid(rows: usize, cols: usize) -> GridSpec {
    GridSpec::new(0.0, rows as f64 * PIXEL_M, PIXEL_M, rows, cols, Crs::Projected)
}

/// Rectangle covering exactly the pixels `rows x cols` starting at `(row0, col0)`.
pub fn pixel_rect(grid: &GridSpec, row0: usize, col0: usize, rows: usize, cols: usize) -> Polygon {
    let min_x = grid.origin_x + col0 as f64 * grid.pixel_size;
    let max_x = min_x + cols as f64 * grid.pixel_size;
    let max_y = grid.origin_y - row0 as f64 * grid.pixel_size;
    let min_y = max_y - rows as f64 * grid.pixel_size;
    Polygon::rect(min_x, min_y, max_x, max_y)
}

pub fn rect_zone(
    grid: &GridSpec,
    code: i64,
    parent: &str,
    (row0, col0): (usize, usize),
    (rows, cols): (usize, usize),
) -> Zone {
    Zone::new(
        code,
        format!("Zone {code}"),
        parent,
        pixel_rect(grid, row0, col0, rows, cols),
    )
}

/// One zone covering the whole grid.
pub fn whole_grid_zone(grid: &GridSpec, code: i64) -> Zone {
    rect_zone(grid, code, "Region", (0, 0), (grid.rows, grid.cols))
}

pub fn raster_from_fn<F>(grid: &GridSpec, band: &str, f: F) -> Raster<f64>
where
    F: Fn(usize, usize) -> f64,
{
    Raster::new(band, grid.clone(), Array2::from_shape_fn(grid.dim(), |(r, c)| f(r, c))).unwrap()
}

pub fn constant(grid: &GridSpec, band: &str, value: f64) -> Raster<f64> {
    Raster::filled(band, grid.clone(), value)
}

pub fn alert_layer<F>(grid: &GridSpec, f: F) -> AlertLayer
where
    F: Fn(usize, usize) -> AlertPixel,
{
    AlertLayer::from_pixels(grid, Array2::from_shape_fn(grid.dim(), |(r, c)| f(r, c))).unwrap()
}

/// Native-resolution sum over 100 m pixels.
pub fn native_params(tile_factor: usize) -> AggregateParams {
    AggregateParams {
        reducer: Reducer::Sum,
        resolution: PIXEL_M,
        tile_factor,
    }
}
