pub mod config;
pub mod info;
pub mod plan;
pub mod run;

use std::path::Path;

use anyhow::{Context, Result};
use zonestat_core::pipeline::RunConfig;

/// Load and validate a run config.
pub(crate) fn load_config(path: &Path) -> Result<RunConfig> {
    let config = RunConfig::load(path).with_context(|| format!("Failed to read config {}", path.display()))?;
    config.validate().context("Invalid run config")?;
    Ok(config)
}
