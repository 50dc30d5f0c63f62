use std::path::Path;

use console::Style;
use zonestat_core::pipeline::{RunConfig, RunReport, ShardOutcome};

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    ok: Style,
    failed: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            ok: Style::new().green(),
            failed: Style::new().red().bold(),
            path: Style::new().underlined(),
        }
    }
}

pub fn print_run_summary(config: &RunConfig, zone_count: usize) {
    let s = Styles::new();
    let job = config.job.job();

    println!();
    println!("  {}", s.title.apply_to("Zonestat Run"));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(12)));
    println!();

    println!("  {:<14}{}", s.label.apply_to("Job"), s.value.apply_to(job.name()));
    println!("  {:<14}{}", s.label.apply_to("Catalog"), s.path.apply_to(config.catalog.display()));
    println!("  {:<14}{}", s.label.apply_to("Zones"), s.path.apply_to(config.zones.display()));
    println!("  {:<14}{}", s.label.apply_to("Output"), s.path.apply_to(config.output_dir.display()));
    println!();

    println!("  {}", s.header.apply_to("Parameters"));
    println!("    {:<16}{}", s.label.apply_to("Zone count"), s.value.apply_to(zone_count));
    println!(
        "    {:<16}{}",
        s.label.apply_to("Epoch"),
        s.value.apply_to(format!("{} ({})", config.epoch, config.calendar))
    );
    println!("    {:<16}{}", s.label.apply_to("Ruleset"), s.value.apply_to(&config.ruleset));
    println!(
        "    {:<16}{}",
        s.label.apply_to("Buffer"),
        s.value.apply_to(format!(
            "{} px / {} days",
            config.buffer.spatial_radius, config.buffer.temporal_radius
        ))
    );
    println!(
        "    {:<16}{}",
        s.label.apply_to("Resolution"),
        s.value.apply_to(format!("{} m, tile factor {}", config.resolution, config.tile_factor))
    );
    let ranges: Vec<String> = config.year_ranges.iter().map(|r| r.to_string()).collect();
    println!("    {:<16}{}", s.label.apply_to("Years"), s.value.apply_to(ranges.join(", ")));
    let groups = if config.zone_groups.is_empty() {
        "all".to_string()
    } else {
        config.zone_groups.keys().cloned().collect::<Vec<_>>().join(", ")
    };
    println!("    {:<16}{}", s.label.apply_to("Groups"), s.value.apply_to(groups));
    println!("    {:<16}{}", s.label.apply_to("Workers"), s.value.apply_to(config.workers));
    println!();
}

pub fn print_run_report(report: &RunReport, output_dir: &Path) {
    let s = Styles::new();

    println!("  {}", s.header.apply_to("Shards"));
    for shard in &report.shards {
        match &shard.outcome {
            ShardOutcome::Exported { rows } => println!(
                "    {} {:<40}{:>8} rows  {:.1}s",
                s.ok.apply_to("\u{2713}"),
                shard.description,
                rows,
                shard.elapsed.as_secs_f64()
            ),
            ShardOutcome::Failed { error } => println!(
                "    {} {:<40}{} after {} attempt(s)",
                s.failed.apply_to("\u{2717}"),
                shard.description,
                s.failed.apply_to(error),
                shard.attempts
            ),
        }
    }
    println!();
    println!(
        "  {} of {} shard(s) exported, {} rows in {:.1}s to {}",
        s.value.apply_to(report.succeeded().count()),
        report.shards.len(),
        report.total_rows(),
        report.elapsed.as_secs_f64(),
        s.path.apply_to(output_dir.display())
    );
}
