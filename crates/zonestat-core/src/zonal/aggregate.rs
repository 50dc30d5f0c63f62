use std::collections::BTreeMap;
use std::ops::Range;

use ndarray::Array2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::consts::{DEFAULT_RESOLUTION, DEFAULT_TILE_FACTOR};
use crate::error::{Result, ZonestatError};
use crate::raster::{GridSpec, Raster};

use super::zone::{Zone, ZoneCode};

/// Reduction applied to the pixels of each zone.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reducer {
    /// Sum of pixel values. Use on area layers to get hectares.
    #[default]
    Sum,
    /// Pixel-area-weighted mean of pixel values.
    Mean,
}

impl std::fmt::Display for Reducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sum => write!(f, "Sum"),
            Self::Mean => write!(f, "Mean"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AggregateParams {
    #[serde(default)]
    pub reducer: Reducer,
    /// Reduction cell size in metres.
    pub resolution: f64,
    /// Each zone's window is split into `tile_factor x tile_factor` tiles
    /// reduced independently. Never changes the result.
    pub tile_factor: usize,
}

impl Default for AggregateParams {
    fn default() -> Self {
        Self {
            reducer: Reducer::Sum,
            resolution: DEFAULT_RESOLUTION,
            tile_factor: DEFAULT_TILE_FACTOR,
        }
    }
}

impl AggregateParams {
    pub fn with_reducer(self, reducer: Reducer) -> Self {
        Self { reducer, ..self }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.resolution.is_finite() || self.resolution <= 0.0 {
            return Err(ZonestatError::InvalidResolution(self.resolution));
        }
        if self.tile_factor == 0 {
            return Err(ZonestatError::InvalidTileFactor(self.tile_factor));
        }
        Ok(())
    }
}

/// Reduced value of one zone, optionally broken out by category.
#[derive(Clone, Debug, PartialEq)]
pub struct ZoneFragment {
    pub code: ZoneCode,
    /// Sum is always defined (zero without pixels); mean is `None` without pixels.
    pub value: Option<f64>,
    /// Per-category values; categories without pixels are absent.
    pub groups: BTreeMap<i64, f64>,
}

impl ZoneFragment {
    /// Fragment for a zone that received no pixels.
    pub fn empty(code: ZoneCode, reducer: Reducer) -> Self {
        Self {
            code,
            value: match reducer {
                Reducer::Sum => Some(0.0),
                Reducer::Mean => None,
            },
            groups: BTreeMap::new(),
        }
    }

    pub fn value_or_zero(&self) -> f64 {
        self.value.unwrap_or(0.0)
    }

    pub fn group(&self, category: i64) -> f64 {
        self.groups.get(&category).copied().unwrap_or(0.0)
    }
}

#[derive(Clone, Debug, Default)]
struct Accum {
    sum: f64,
    weight: f64,
    groups: BTreeMap<i64, (f64, f64)>,
}

impl Accum {
    fn add(&mut self, reducer: Reducer, value: f64, area: f64, group: Option<i64>) {
        let contribution = match reducer {
            Reducer::Sum => value,
            Reducer::Mean => value * area,
        };
        self.sum += contribution;
        self.weight += area;
        if let Some(g) = group {
            let entry = self.groups.entry(g).or_insert((0.0, 0.0));
            entry.0 += contribution;
            entry.1 += area;
        }
    }

    fn merge(&mut self, other: Accum) {
        self.sum += other.sum;
        self.weight += other.weight;
        for (g, (s, w)) in other.groups {
            let entry = self.groups.entry(g).or_insert((0.0, 0.0));
            entry.0 += s;
            entry.1 += w;
        }
    }

    fn finish(self, code: ZoneCode, reducer: Reducer) -> ZoneFragment {
        let reduce = |sum: f64, weight: f64| match reducer {
            Reducer::Sum => Some(sum),
            Reducer::Mean if weight > 0.0 => Some(sum / weight),
            Reducer::Mean => None,
        };
        ZoneFragment {
            code,
            value: reduce(self.sum, self.weight),
            groups: self
                .groups
                .into_iter()
                .filter_map(|(g, (s, w))| reduce(s, w).map(|v| (g, v)))
                .collect(),
        }
    }
}

/// Pixel window of one zone, aligned to reduction blocks.
struct ZoneWindow {
    rows: Range<usize>,
    cols: Range<usize>,
    factor: usize,
    /// Block membership: block centre inside the zone polygon.
    members: Array2<bool>,
}

impl ZoneWindow {
    fn build(grid: &GridSpec, zone: &Zone, factor: usize) -> Self {
        let bbox = zone.geometry.bbox();
        let rows = align(grid.row_span(bbox.min_y, bbox.max_y), factor, grid.rows);
        let cols = align(grid.col_span(bbox.min_x, bbox.max_x), factor, grid.cols);
        let block_rows = rows.len().div_ceil(factor);
        let block_cols = cols.len().div_ceil(factor);
        let block_size = factor as f64 * grid.pixel_size;

        let members = Array2::from_shape_fn((block_rows, block_cols), |(br, bc)| {
            let first_row = rows.start + br * factor;
            let first_col = cols.start + bc * factor;
            let x = grid.origin_x + first_col as f64 * grid.pixel_size + block_size / 2.0;
            let y = grid.origin_y - first_row as f64 * grid.pixel_size - block_size / 2.0;
            zone.geometry.contains(x, y)
        });

        Self {
            rows,
            cols,
            factor,
            members,
        }
    }

    fn is_member(&self, row: usize, col: usize) -> bool {
        self.members[[(row - self.rows.start) / self.factor, (col - self.cols.start) / self.factor]]
    }

    fn tiles(&self, tile_factor: usize) -> Vec<(Range<usize>, Range<usize>)> {
        let row_bands = split_range(self.rows.clone(), tile_factor);
        let col_bands = split_range(self.cols.clone(), tile_factor);
        row_bands
            .iter()
            .flat_map(|r| col_bands.iter().map(move |c| (r.clone(), c.clone())))
            .collect()
    }
}

/// Expand `range` outwards to multiples of `factor`, clamped to `limit`.
fn align(range: Range<usize>, factor: usize, limit: usize) -> Range<usize> {
    if range.is_empty() {
        return 0..0;
    }
    let start = (range.start / factor) * factor;
    let end = (range.end.div_ceil(factor) * factor).min(limit);
    start..end
}

/// Split `range` into at most `parts` contiguous, non-empty pieces.
fn split_range(range: Range<usize>, parts: usize) -> Vec<Range<usize>> {
    let len = range.len();
    if len == 0 {
        return Vec::new();
    }
    let chunk = len.div_ceil(parts.max(1));
    (range.start..range.end)
        .step_by(chunk)
        .map(|start| start..(start + chunk).min(range.end))
        .collect()
}

/// Reduces a per-pixel scalar layer over a zone collection.
///
/// A native pixel belongs to a zone when the centre of its reduction block
/// (`resolution` metres on a side) lies inside the zone polygon. Masked
/// pixels contribute nothing.
#[derive(Clone, Copy, Debug)]
pub struct ZonalAggregator {
    params: AggregateParams,
}

impl ZonalAggregator {
    pub fn new(params: AggregateParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &AggregateParams {
        &self.params
    }

    /// Same aggregator with a different reducer.
    pub fn with_reducer(&self, reducer: Reducer) -> Self {
        Self {
            params: self.params.with_reducer(reducer),
        }
    }

    /// One fragment per zone, in zone order.
    ///
    /// `layer = None` (no source coverage) yields an empty fragment for every
    /// zone rather than an error. With `group_band`, values are also broken
    /// out per category; pixels with a masked category still count towards
    /// the zone total.
    pub fn aggregate(
        &self,
        layer: Option<&Raster<f64>>,
        zones: &[Zone],
        group_band: Option<&Raster<i64>>,
    ) -> Result<Vec<ZoneFragment>> {
        let reducer = self.params.reducer;
        let Some(layer) = layer else {
            debug!(zones = zones.len(), "No coverage, emitting empty fragments");
            return Ok(zones
                .iter()
                .map(|z| ZoneFragment::empty(z.code, reducer))
                .collect());
        };
        let grid = layer.grid();
        if let Some(groups) = group_band {
            grid.ensure_matches(groups.grid())?;
        }

        let factor = grid.block_factor(self.params.resolution);
        let row_areas = grid.row_areas_ha();
        debug!(
            zones = zones.len(),
            band = layer.band(),
            factor,
            tile_factor = self.params.tile_factor,
            %reducer,
            "Aggregating"
        );

        let fragments = zones
            .par_iter()
            .map(|zone| {
                let window = ZoneWindow::build(grid, zone, factor);
                let partials: Vec<Accum> = window
                    .tiles(self.params.tile_factor)
                    .into_par_iter()
                    .map(|(rows, cols)| {
                        reduce_tile(layer, group_band, &window, &row_areas, reducer, rows, cols)
                    })
                    .collect();
                let mut total = Accum::default();
                for partial in partials {
                    total.merge(partial);
                }
                total.finish(zone.code, reducer)
            })
            .collect();

        Ok(fragments)
    }
}

fn reduce_tile(
    layer: &Raster<f64>,
    group_band: Option<&Raster<i64>>,
    window: &ZoneWindow,
    row_areas: &[f64],
    reducer: Reducer,
    rows: Range<usize>,
    cols: Range<usize>,
) -> Accum {
    let mut acc = Accum::default();
    for row in rows {
        let area = row_areas[row];
        for col in cols.clone() {
            if !window.is_member(row, col) {
                continue;
            }
            let Some(value) = layer.get(row, col) else {
                continue;
            };
            if !value.is_finite() {
                continue;
            }
            let group = group_band.and_then(|g| g.get(row, col));
            acc.add(reducer, value, area, group);
        }
    }
    acc
}

impl crate::join::Keyed for ZoneFragment {
    type Key = ZoneCode;

    fn key(&self) -> ZoneCode {
        self.code
    }
}
