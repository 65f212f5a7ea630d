//! Build command implementation
//!
//! Implements `binforge build`: acquire all configured library sources,
//! resolve the build-unit set, run one concurrent build stream per
//! compiler profile, and report a per-profile, per-unit summary.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::cli::commands::{load_compiler_manifest, load_library_manifests};
use crate::cli::output::{self, status};
use crate::config::{defaults, Layout};
use crate::core::acquire;
use crate::core::driver::ToolchainDriver;
use crate::core::resolver;
use crate::core::supervisor::{ProfileReport, Supervisor, UnitStatus};

/// Build options
pub struct BuildOptions {
    /// Compiler matrix document
    pub compilers: PathBuf,
    /// Library documents, merged in order
    pub libs: Vec<PathBuf>,
    /// Working directory
    pub work_dir: PathBuf,
    /// Generator executable override
    pub generator: Option<PathBuf>,
    /// Custom build-configuration override directory
    pub overrides_dir: PathBuf,
    /// Per-invocation timeout in seconds
    pub timeout_secs: u64,
    /// Print the summary as JSON
    pub json: bool,
}

/// Execute the build command
pub async fn execute(options: BuildOptions) -> Result<()> {
    let compiler_manifest = load_compiler_manifest(&options.compilers)?;
    let profiles = compiler_manifest.profiles();
    if profiles.is_empty() {
        bail!("No compiler profiles configured in {}", options.compilers.display());
    }

    let library_manifest = load_library_manifests(&options.libs)?;

    // Building without a generator is not supported.
    let generator_exe = match options.generator {
        Some(path) => path,
        None => which::which(defaults::DEFAULT_GENERATOR_EXE)
            .with_context(|| "No generator executable found on PATH; pass --generator")?,
    };

    let layout = Layout::new(&options.work_dir);

    let spinner = output::create_spinner("Acquiring library sources...");
    let catalog = acquire::acquire_catalog(&library_manifest, &layout, &options.overrides_dir)
        .await
        .with_context(|| "Failed to acquire library sources")?;
    spinner.finish_and_clear();

    if catalog.is_empty() {
        println!("{} Nothing to build", status::WARNING);
        return Ok(());
    }

    // Unresolved references and bad command templates abort here, before
    // any toolchain is launched.
    let units = resolver::resolve(&catalog)?;

    tracing::info!(
        "building {} units with {} compiler profiles",
        units.len(),
        profiles.len()
    );

    let driver = ToolchainDriver::new(generator_exe, Duration::from_secs(options.timeout_secs));
    let reports = Supervisor::new(catalog, units, profiles, driver).run();

    if options.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        print_summary(&reports);
    }

    let failed: usize = reports.iter().map(ProfileReport::failed).sum();
    let aborted = reports.iter().filter(|r| r.fatal.is_some()).count();
    if failed > 0 || aborted > 0 {
        bail!("{failed} unit build(s) failed, {aborted} stream(s) aborted");
    }

    Ok(())
}

/// Print the human-readable per-profile summary
fn print_summary(reports: &[ProfileReport]) {
    for report in reports {
        let marker = if report.is_success() {
            status::SUCCESS
        } else {
            status::ERROR
        };
        println!(
            "{marker} {}: {} built, {} skipped, {} failed",
            report.profile,
            report.built(),
            report.skipped(),
            report.failed()
        );

        for unit in &report.units {
            match unit.status {
                UnitStatus::Built => {
                    println!("    {} {}-{}", status::SUCCESS, unit.library, unit.version);
                }
                UnitStatus::Skipped => {
                    println!(
                        "    - {}-{} ({})",
                        unit.library,
                        unit.version,
                        unit.detail.as_deref().unwrap_or("skipped")
                    );
                }
                UnitStatus::Failed => {
                    println!(
                        "    {} {}-{}: {}",
                        status::ERROR,
                        unit.library,
                        unit.version,
                        unit.detail.as_deref().unwrap_or("failed")
                    );
                }
            }
        }

        if let Some(fatal) = &report.fatal {
            println!("    {} stream aborted: {fatal}", status::ERROR);
        }
    }
}
