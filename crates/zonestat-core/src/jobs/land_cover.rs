use std::collections::BTreeSet;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::dates::DateRange;
use crate::error::{Result, ZonestatError};
use crate::export::{MeasureRow, Schema, Value};
use crate::join::derived_rate;
use crate::raster::{area_ha, Composite};
use crate::zonal::{Reducer, Zone};

use super::{per_year, ShardContext, ShardJob};

const IGBP_CODES: [i64; 17] = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17];

const IGBP_NAMES: [&str; 17] = [
    "evergreen_needleleaf",
    "evergreen_broadleaf",
    "deciduous_needleleaf",
    "deciduous_broadleaf",
    "mixed_forest",
    "closed_shrublands",
    "open_shrublands",
    "woody_savannas",
    "savannas",
    "grasslands",
    "permanent_wetlands",
    "croplands",
    "urban",
    "cropland_mosaic",
    "snow_ice",
    "barren",
    "water",
];

/// IGBP classes numbered from 0 with water first, as in the GEE export tables.
const IGBP_ZERO_BASED_CODES: [i64; 17] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16];

const IGBP_ZERO_BASED_NAMES: [&str; 17] = [
    "water",
    "evergreen_needle",
    "evergreen_broadleaf",
    "deciduous_needle",
    "deciduous_broadleaf",
    "mixed_forest",
    "closed_shrub",
    "open_shrub",
    "woody_savanna",
    "savanna",
    "grassland",
    "wetland",
    "cropland",
    "urban",
    "cropland_natural_mosaic",
    "snow_ice",
    "barren",
];

/// Category code and the suffix of its output columns.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassColumn {
    pub code: i64,
    pub name: String,
}

impl ClassColumn {
    pub fn area_column(&self) -> String {
        format!("ha_{}", self.name)
    }

    pub fn share_column(&self) -> String {
        format!("share_{}", self.name)
    }
}

/// Static mapping from class code to output field name, given as two
/// parallel lists in configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassTable {
    pub codes: Vec<i64>,
    pub names: Vec<String>,
}

impl ClassTable {
    /// The 17 IGBP classes of the MODIS land-cover type 1 product.
    pub fn igbp() -> Self {
        Self::from_static(&IGBP_CODES, &IGBP_NAMES)
    }

    /// Codes 0..=16 with water as class 0 and short column names, matching
    /// tables exported by earlier Earth Engine scripts.
    pub fn igbp_zero_based() -> Self {
        Self::from_static(&IGBP_ZERO_BASED_CODES, &IGBP_ZERO_BASED_NAMES)
    }

    fn from_static(codes: &[i64], names: &[&str]) -> Self {
        Self {
            codes: codes.to_vec(),
            names: names.iter().map(|n| n.to_string()).collect(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.codes.len() != self.names.len() {
            return Err(ZonestatError::ClassTableMismatch {
                codes: self.codes.len(),
                names: self.names.len(),
            });
        }
        if self.codes.is_empty() {
            return Err(ZonestatError::Configuration("class table is empty".to_string()));
        }
        let mut codes = BTreeSet::new();
        let mut names = BTreeSet::new();
        for (code, name) in self.codes.iter().zip(&self.names) {
            if !codes.insert(*code) {
                return Err(ZonestatError::Configuration(format!("duplicate class code {code}")));
            }
            if name.is_empty() || !names.insert(name.as_str()) {
                return Err(ZonestatError::Configuration(format!("invalid or duplicate class name '{name}'")));
            }
        }
        Ok(())
    }

    pub fn columns(&self) -> Vec<ClassColumn> {
        self.codes
            .iter()
            .zip(&self.names)
            .map(|(&code, name)| ClassColumn {
                code,
                name: name.clone(),
            })
            .collect()
    }
}

impl Default for ClassTable {
    fn default() -> Self {
        Self::igbp()
    }
}

/// Hectares per land-cover class and class shares per zone and year.
///
/// `total_ha` is the full zone area, so unclassified (masked) pixels lower
/// every share instead of being left out of the denominator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LandCoverJob {
    /// Yearly class raster.
    pub product: String,
    pub classes: ClassTable,
}

impl Default for LandCoverJob {
    fn default() -> Self {
        Self {
            product: "lc_type1".to_string(),
            classes: ClassTable::igbp(),
        }
    }
}

impl ShardJob for LandCoverJob {
    fn name(&self) -> &'static str {
        "landcover"
    }

    fn schema(&self) -> Schema {
        let columns = self.classes.columns();
        let measures = std::iter::once("total_ha".to_string())
            .chain(columns.iter().map(ClassColumn::area_column))
            .chain(columns.iter().map(ClassColumn::share_column));
        Schema::new(measures)
    }

    fn validate(&self) -> Result<()> {
        self.classes.validate()
    }

    fn materialize(&self, ctx: &ShardContext<'_>, zones: &[Zone], years: &[i32]) -> Result<Vec<MeasureRow>> {
        let columns = self.classes.columns();
        let grid = ctx.catalog.grid();
        let zone_area = area_ha(grid, &Array2::from_elem(grid.dim(), true))?;
        let aggregator = ctx.aggregator.with_reducer(Reducer::Sum);
        per_year(years, |year| {
            let range = DateRange::calendar_year(year)?;
            let classes = ctx.catalog.composite(&self.product, &range, Composite::First)?;
            let (area, groups) = match classes {
                Some(lc) => (Some(&zone_area), Some(lc.map(|v| v.round() as i64))),
                None => (None, None),
            };
            let fragments = aggregator.aggregate(area, zones, groups.as_ref())?;

            Ok(fragments
                .into_iter()
                .map(|f| {
                    let total = f.value_or_zero();
                    let mut measures = Vec::with_capacity(1 + 2 * columns.len());
                    measures.push(Value::Float(total));
                    measures.extend(columns.iter().map(|c| Value::Float(f.group(c.code))));
                    measures.extend(
                        columns
                            .iter()
                            .map(|c| Value::from(derived_rate(Some(f.group(c.code)), Some(total)))),
                    );
                    MeasureRow {
                        code: f.code,
                        year,
                        measures,
                    }
                })
                .collect())
        })
    }
}
