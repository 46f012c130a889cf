//! Rebuild `manifest.json` from the exercises directory.
//!
//! Usage: `update-manifest [DATA_DIR]`. Without an argument the data
//! directory comes from `EXERCISES_DATA_DIR`.

use anyhow::Context;
use exercise_catalog::{logging, manifest, CatalogConfig};
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    logging::init();

    let config = CatalogConfig::from_env();
    let data_dir = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or(config.data_dir);

    let report = manifest::rebuild(&data_dir)
        .with_context(|| format!("Failed to rebuild manifest in {}", data_dir.display()))?;

    println!(
        "Wrote {} with {} exercises",
        report.manifest_path.display(),
        report.entries.len()
    );
    for (date, files) in report.by_date() {
        println!("{}:", date);
        for file in files {
            println!("  {}", file);
        }
    }
    Ok(())
}
