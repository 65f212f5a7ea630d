//! CLI implementation for `binforge check`
//!
//! Validates the configuration documents end to end - compiler fields,
//! dependency references, and command templates - without downloading
//! anything or launching any toolchain.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::cli::commands::{load_compiler_manifest, load_library_manifests};
use crate::cli::output::status;
use crate::config::{defaults, Layout};
use crate::core::{acquire, resolver};

/// Execute the check command
pub fn execute(compilers: &Path, libs: &[PathBuf]) -> Result<()> {
    let compiler_manifest = load_compiler_manifest(compilers)?;
    let library_manifest = load_library_manifests(libs)?;

    let layout = Layout::default();
    let catalog = acquire::plan_catalog(
        &library_manifest,
        &layout,
        Path::new(defaults::DEFAULT_OVERRIDES_DIR),
    )?;
    let units = resolver::resolve(&catalog)?;

    println!(
        "{} Configuration valid: {} compiler profile(s), {} build unit(s)",
        status::SUCCESS,
        compiler_manifest.compilers.len(),
        units.len()
    );

    Ok(())
}
