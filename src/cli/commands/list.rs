//! CLI implementation for `binforge list`
//!
//! Prints the configured libraries, their versions, and their
//! dependencies.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::cli::commands::load_library_manifests;
use crate::config::{defaults, Layout};
use crate::core::acquire;

/// Execute the list command
pub fn execute(libs: &[PathBuf]) -> Result<()> {
    let manifest = load_library_manifests(libs)?;
    let catalog = acquire::plan_catalog(
        &manifest,
        &Layout::default(),
        Path::new(defaults::DEFAULT_OVERRIDES_DIR),
    )?;

    if catalog.is_empty() {
        println!("No libraries configured");
        return Ok(());
    }

    for (name, version, record) in catalog.iter() {
        if record.dependencies.is_empty() {
            println!("{name}-{version}");
        } else {
            let deps: Vec<String> = record
                .dependencies
                .iter()
                .map(|(n, v)| format!("{n}-{v}"))
                .collect();
            println!("{name}-{version} (depends on: {})", deps.join(", "));
        }
    }

    Ok(())
}
