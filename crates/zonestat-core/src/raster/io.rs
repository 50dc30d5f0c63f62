use std::path::Path;

use image::DynamicImage;
use ndarray::Array2;
use num_traits::ToPrimitive;

use crate::error::{Result, ZonestatError};

use super::grid::GridSpec;
use super::layer::Raster;

/// Linear decoding applied to stored pixel values: `raw * scale + offset`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BandEncoding {
    pub scale: f64,
    pub offset: f64,
    /// Raw value marking missing data.
    pub nodata: Option<f64>,
}

impl Default for BandEncoding {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: 0.0,
            nodata: None,
        }
    }
}

/// Load a single-band image file onto `grid`.
///
/// Integer images keep their raw values (no normalization to [0, 1]);
/// float images use their first channel.
pub fn load_band(path: &Path, band: &str, grid: &GridSpec, encoding: BandEncoding) -> Result<Raster<f64>> {
    let img = image::open(path)?;
    let raw = raw_values(&img).ok_or_else(|| ZonestatError::UnsupportedPixelFormat(path.display().to_string()))?;
    let (w, h) = (img.width() as usize, img.height() as usize);
    if (h, w) != grid.dim() {
        return Err(ZonestatError::GridMismatch {
            expected: grid.describe(),
            actual: format!("{} with {}x{} pixels", path.display(), w, h),
        });
    }

    let mut data = Array2::<f64>::zeros((h, w));
    let mut valid = Array2::from_elem((h, w), true);
    for (i, v) in raw.into_iter().enumerate() {
        let idx = (i / w, i % w);
        let is_nodata = encoding.nodata.is_some_and(|nd| v == nd);
        if is_nodata || !v.is_finite() {
            valid[idx] = false;
        } else {
            data[idx] = v * encoding.scale + encoding.offset;
        }
    }

    Raster::with_mask(band, grid.clone(), data, valid)
}

fn raw_values(img: &DynamicImage) -> Option<Vec<f64>> {
    match img {
        DynamicImage::ImageLuma8(buf) => Some(first_channel(buf.as_raw(), 1)),
        DynamicImage::ImageLuma16(buf) => Some(first_channel(buf.as_raw(), 1)),
        DynamicImage::ImageRgb32F(buf) => Some(first_channel(buf.as_raw(), 3)),
        DynamicImage::ImageRgba32F(buf) => Some(first_channel(buf.as_raw(), 4)),
        _ => None,
    }
}

/// First sample of each interleaved pixel.
fn first_channel<T: ToPrimitive>(samples: &[T], channels: usize) -> Vec<f64> {
    samples
        .iter()
        .step_by(channels)
        .map(|s| s.to_f64().unwrap_or(f64::NAN))
        .collect()
}
