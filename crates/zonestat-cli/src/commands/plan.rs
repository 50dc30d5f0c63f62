use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use zonestat_core::pipeline::plan_shards;
use zonestat_core::zonal::load_zones;

#[derive(Args)]
pub struct PlanArgs {
    /// Run config file (TOML)
    pub config: PathBuf,
}

pub fn run(args: &PlanArgs) -> Result<()> {
    let config = super::load_config(&args.config)?;
    let zones = load_zones(&config.zones, &config.zone_fields)
        .with_context(|| format!("Failed to load zones {}", config.zones.display()))?;
    let shards = plan_shards(&zones, &config.zone_groups, &config.year_ranges, config.table_prefix())?;

    crate::summary::print_run_summary(&config, zones.len());
    println!("  {:<40}{:>8}{:>12}", "Shard", "Zones", "Years");
    for shard in &shards {
        println!(
            "  {:<40}{:>8}{:>12}",
            shard.description,
            shard.zones.len(),
            shard.years.to_string()
        );
    }
    println!();
    println!("  {} shard(s)", shards.len());
    Ok(())
}
