use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::alerts::{BufferConfig, Confidence, FusionParams, RuleSet};
use crate::consts::{DEFAULT_EPOCH, DEFAULT_MAX_ATTEMPTS, DEFAULT_RESOLUTION, DEFAULT_TILE_FACTOR, DEFAULT_WORKERS};
use crate::dates::{CalendarMode, EpochDateMapper};
use crate::error::{Result, ZonestatError};
use crate::jobs::JobSpec;
use crate::zonal::{AggregateParams, Reducer, ZoneFields};

use super::shard::{group_index, validate_year_ranges, YearRange};

/// Every parameter of one run. Loaded from TOML; all fields have defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub job: JobSpec,
    /// Fusion rule set id, resolved at validation time.
    pub ruleset: String,
    pub buffer: BufferConfig,
    /// Confidence levels kept after fusion; empty keeps all.
    pub confidence_filter: BTreeSet<Confidence>,
    /// Day offsets of every integrated layer count from this date.
    pub epoch: NaiveDate,
    pub calendar: CalendarMode,
    /// Reduction cell size in metres.
    pub resolution: f64,
    pub tile_factor: usize,
    pub year_ranges: Vec<YearRange>,
    /// Group name to parent-region names. Empty means one group of all zones.
    pub zone_groups: BTreeMap<String, Vec<String>>,
    /// Shards materialized concurrently.
    pub workers: usize,
    pub max_attempts: usize,
    /// Raster catalog manifest.
    pub catalog: PathBuf,
    /// GeoJSON zone boundaries.
    pub zones: PathBuf,
    pub zone_fields: ZoneFields,
    pub output_dir: PathBuf,
    /// Table name prefix; the job name when empty.
    pub name_prefix: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            job: JobSpec::default(),
            ruleset: RuleSet::R1.id().to_string(),
            buffer: BufferConfig::default(),
            confidence_filter: BTreeSet::new(),
            epoch: DEFAULT_EPOCH,
            calendar: CalendarMode::Exact,
            resolution: DEFAULT_RESOLUTION,
            tile_factor: DEFAULT_TILE_FACTOR,
            year_ranges: vec![YearRange { start: 2021, end: 2025 }],
            zone_groups: BTreeMap::new(),
            workers: DEFAULT_WORKERS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            catalog: PathBuf::from("catalog.toml"),
            zones: PathBuf::from("zones.geojson"),
            zone_fields: ZoneFields::default(),
            output_dir: PathBuf::from("output"),
            name_prefix: String::new(),
        }
    }
}

impl RunConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load a config file. Relative catalog, zone and output paths are
    /// resolved against the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&text)?;
        if let Some(base) = path.parent() {
            for p in [&mut config.catalog, &mut config.zones, &mut config.output_dir] {
                if p.is_relative() {
                    let joined = base.join(&*p);
                    *p = joined;
                }
            }
        }
        Ok(config)
    }

    /// Fail fast on anything that would make every shard wrong.
    pub fn validate(&self) -> Result<()> {
        self.ruleset()?;
        self.buffer.validate()?;
        self.aggregate_params().validate()?;
        validate_year_ranges(&self.year_ranges)?;
        group_index(&self.zone_groups)?;
        if self.workers == 0 {
            return Err(ZonestatError::Configuration("workers must be >= 1".to_string()));
        }
        if self.max_attempts == 0 {
            return Err(ZonestatError::Configuration("max_attempts must be >= 1".to_string()));
        }
        self.job.job().validate()
    }

    pub fn ruleset(&self) -> Result<RuleSet> {
        self.ruleset.parse()
    }

    pub fn mapper(&self) -> EpochDateMapper {
        EpochDateMapper::new(self.epoch, self.calendar)
    }

    pub fn fusion_params(&self) -> Result<FusionParams> {
        Ok(FusionParams {
            ruleset: self.ruleset()?,
            buffer: self.buffer,
            confidence_filter: self.confidence_filter.clone(),
        })
    }

    pub fn aggregate_params(&self) -> AggregateParams {
        AggregateParams {
            reducer: Reducer::Sum,
            resolution: self.resolution,
            tile_factor: self.tile_factor,
        }
    }

    /// Prefix of every table name of this run.
    pub fn table_prefix(&self) -> &str {
        if self.name_prefix.is_empty() {
            self.job.job().name()
        } else {
            &self.name_prefix
        }
    }
}
