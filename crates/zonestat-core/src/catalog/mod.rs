mod file;
mod memory;

pub use file::{FileCatalog, ImageEntry, Manifest, ProductEntry};
pub use memory::MemoryCatalog;

use chrono::NaiveDate;

use crate::dates::DateRange;
use crate::error::Result;
use crate::raster::{composite, Composite, GridSpec, Raster};

/// One image of a dated product.
#[derive(Clone, Debug)]
pub struct DatedRaster {
    pub date: NaiveDate,
    pub raster: Raster<f64>,
}

/// Read-only source of named, dated raster products on one grid.
///
/// Gaps are not errors: a query with no matching images returns an empty
/// collection.
pub trait RasterCatalog: Send + Sync {
    fn grid(&self) -> &GridSpec;

    /// Images of `product` dated inside `range`, in date order.
    fn query(&self, product: &str, range: &DateRange) -> Result<Vec<DatedRaster>>;

    /// Per-pixel composite of a query; `None` when nothing matched.
    fn composite(&self, product: &str, range: &DateRange, method: Composite) -> Result<Option<Raster<f64>>> {
        let layers: Vec<Raster<f64>> = self
            .query(product, range)?
            .into_iter()
            .map(|d| d.raster)
            .collect();
        composite(&layers, method)
    }

    /// Mosaic of every image of an undated (static) product.
    fn image(&self, product: &str) -> Result<Option<Raster<f64>>> {
        self.composite(product, &DateRange::all(), Composite::First)
    }
}
