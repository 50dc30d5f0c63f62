use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use zonestat_core::catalog::FileCatalog;

#[derive(Args)]
pub struct InfoArgs {
    /// Catalog manifest (TOML)
    pub manifest: PathBuf,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    let catalog = FileCatalog::open(&args.manifest)
        .with_context(|| format!("Failed to open catalog {}", args.manifest.display()))?;
    let manifest = catalog.manifest();

    println!("Catalog:     {}", args.manifest.display());
    println!("Grid:        {}", manifest.grid.describe());
    println!("Pixel area:  {:.2} ha (first row)", manifest.grid.pixel_area_ha(0));
    println!("Products:    {}", manifest.products.len());

    for (name, product) in &manifest.products {
        let first = product.images.iter().map(|i| i.date).min();
        let last = product.images.iter().map(|i| i.date).max();
        match (first, last) {
            (Some(first), Some(last)) => println!(
                "  {:<24}{:>5} image(s)  {} .. {}",
                name,
                product.images.len(),
                first,
                last
            ),
            _ => println!("  {:<24}    no images", name),
        }
    }

    Ok(())
}
