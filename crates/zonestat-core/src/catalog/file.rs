use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::dates::DateRange;
use crate::error::{Result, ZonestatError};
use crate::raster::io::{load_band, BandEncoding};
use crate::raster::GridSpec;

use super::{DatedRaster, RasterCatalog};

/// One image file of a product.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageEntry {
    pub date: NaiveDate,
    /// Relative to the manifest directory unless absolute.
    pub path: PathBuf,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductEntry {
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(default)]
    pub offset: f64,
    #[serde(default)]
    pub nodata: Option<f64>,
    #[serde(default)]
    pub images: Vec<ImageEntry>,
}

fn default_scale() -> f64 {
    1.0
}

/// TOML manifest describing a directory of single-band images.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub grid: GridSpec,
    #[serde(default)]
    pub products: BTreeMap<String, ProductEntry>,
}

/// Catalog backed by image files listed in a [`Manifest`].
///
/// Images are decoded on demand; nothing is cached between queries.
#[derive(Clone, Debug)]
pub struct FileCatalog {
    root: PathBuf,
    manifest: Manifest,
}

impl FileCatalog {
    pub fn open(manifest_path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(manifest_path)?;
        let manifest: Manifest = toml::from_str(&contents)?;
        let root = manifest_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        info!(
            path = %manifest_path.display(),
            products = manifest.products.len(),
            "Opened raster catalog"
        );
        Ok(Self::from_manifest(root, manifest))
    }

    pub fn from_manifest(root: impl Into<PathBuf>, manifest: Manifest) -> Self {
        Self {
            root: root.into(),
            manifest,
        }
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn product(&self, name: &str) -> Result<&ProductEntry> {
        self.manifest
            .products
            .get(name)
            .ok_or_else(|| ZonestatError::UnknownProduct(name.to_string()))
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

impl RasterCatalog for FileCatalog {
    fn grid(&self) -> &GridSpec {
        &self.manifest.grid
    }

    fn query(&self, product: &str, range: &DateRange) -> Result<Vec<DatedRaster>> {
        let Some(entry) = self.manifest.products.get(product) else {
            debug!(product, "Product not in catalog, treating as a gap");
            return Ok(Vec::new());
        };
        let encoding = BandEncoding {
            scale: entry.scale,
            offset: entry.offset,
            nodata: entry.nodata,
        };
        let mut images: Vec<&ImageEntry> = entry
            .images
            .iter()
            .filter(|img| range.contains(img.date))
            .collect();
        images.sort_by_key(|img| img.date);

        images
            .into_iter()
            .map(|img| {
                let raster = load_band(&self.resolve(&img.path), product, self.grid(), encoding)?;
                Ok(DatedRaster {
                    date: img.date,
                    raster,
                })
            })
            .collect()
    }
}
