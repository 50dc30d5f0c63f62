use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::dates::DateRange;
use crate::error::Result;
use crate::raster::{GridSpec, Raster};

use super::{DatedRaster, RasterCatalog};

/// In-memory catalog, used by tests and embedders.
#[derive(Clone, Debug)]
pub struct MemoryCatalog {
    grid: GridSpec,
    products: BTreeMap<String, Vec<DatedRaster>>,
}

impl MemoryCatalog {
    pub fn new(grid: GridSpec) -> Self {
        Self {
            grid,
            products: BTreeMap::new(),
        }
    }

    /// Add an image; it must lie on the catalog grid.
    pub fn insert(&mut self, product: &str, date: NaiveDate, raster: Raster<f64>) -> Result<()> {
        self.grid.ensure_matches(raster.grid())?;
        let images = self.products.entry(product.to_string()).or_default();
        images.push(DatedRaster { date, raster });
        images.sort_by_key(|d| d.date);
        Ok(())
    }

    /// Builder-style [`MemoryCatalog::insert`].
    pub fn with(mut self, product: &str, date: NaiveDate, raster: Raster<f64>) -> Result<Self> {
        self.insert(product, date, raster)?;
        Ok(self)
    }

    pub fn products(&self) -> impl Iterator<Item = &str> {
        self.products.keys().map(String::as_str)
    }
}

impl RasterCatalog for MemoryCatalog {
    fn grid(&self) -> &GridSpec {
        &self.grid
    }

    fn query(&self, product: &str, range: &DateRange) -> Result<Vec<DatedRaster>> {
        Ok(self
            .products
            .get(product)
            .map(|images| {
                images
                    .iter()
                    .filter(|d| range.contains(d.date))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}
