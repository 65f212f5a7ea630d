//! CLI implementation for `binforge fetch`
//!
//! Downloads and extracts all configured library sources without
//! launching any builds.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::cli::commands::load_library_manifests;
use crate::cli::output::{self, status};
use crate::config::Layout;
use crate::core::acquire;

/// Execute the fetch command
pub async fn execute(libs: &[PathBuf], work_dir: &Path, overrides_dir: &Path) -> Result<()> {
    let manifest = load_library_manifests(libs)?;
    let layout = Layout::new(work_dir);

    let spinner = output::create_spinner("Acquiring library sources...");
    let catalog = acquire::acquire_catalog(&manifest, &layout, overrides_dir)
        .await
        .with_context(|| "Failed to acquire library sources")?;
    spinner.finish_and_clear();

    if catalog.is_empty() {
        println!("{} Nothing to fetch", status::WARNING);
        return Ok(());
    }

    println!("{} Acquired {} library version(s):", status::SUCCESS, catalog.len());
    for (name, version, record) in catalog.iter() {
        println!("    {name}-{version} -> {}", record.source_path.display());
    }

    Ok(())
}
