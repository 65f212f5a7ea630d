//! CLI command implementations
//!
//! Each command is implemented in its own submodule.

pub mod build;
pub mod check;
pub mod fetch;
pub mod list;

use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;

use crate::config::defaults;

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Acquire sources and build them with every configured compiler
    Build {
        /// Compiler matrix document
        #[arg(short, long, default_value = defaults::DEFAULT_COMPILERS_FILE)]
        compilers: PathBuf,

        /// Library documents (merged in order)
        #[arg(short, long, default_values_os_t = vec![PathBuf::from(defaults::DEFAULT_LIBS_FILE)])]
        libs: Vec<PathBuf>,

        /// Working directory for cache, sources, builds, and binaries
        #[arg(short, long, default_value = defaults::DEFAULT_WORK_DIR)]
        work_dir: PathBuf,

        /// Build-file generator executable (looked up on PATH when omitted)
        #[arg(short, long)]
        generator: Option<PathBuf>,

        /// Directory holding custom build-configuration overrides
        #[arg(long, default_value = defaults::DEFAULT_OVERRIDES_DIR)]
        overrides_dir: PathBuf,

        /// Per-invocation timeout in seconds; a hung toolchain is killed
        #[arg(long, default_value_t = defaults::DEFAULT_BUILD_TIMEOUT_SECS)]
        timeout_secs: u64,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Download and extract library sources without building
    Fetch {
        /// Library documents (merged in order)
        #[arg(short, long, default_values_os_t = vec![PathBuf::from(defaults::DEFAULT_LIBS_FILE)])]
        libs: Vec<PathBuf>,

        /// Working directory for cache and sources
        #[arg(short, long, default_value = defaults::DEFAULT_WORK_DIR)]
        work_dir: PathBuf,

        /// Directory holding custom build-configuration overrides
        #[arg(long, default_value = defaults::DEFAULT_OVERRIDES_DIR)]
        overrides_dir: PathBuf,
    },

    /// Validate configuration without downloading or building
    Check {
        /// Compiler matrix document
        #[arg(short, long, default_value = defaults::DEFAULT_COMPILERS_FILE)]
        compilers: PathBuf,

        /// Library documents (merged in order)
        #[arg(short, long, default_values_os_t = vec![PathBuf::from(defaults::DEFAULT_LIBS_FILE)])]
        libs: Vec<PathBuf>,
    },

    /// List configured libraries, versions, and dependencies
    List {
        /// Library documents (merged in order)
        #[arg(short, long, default_values_os_t = vec![PathBuf::from(defaults::DEFAULT_LIBS_FILE)])]
        libs: Vec<PathBuf>,
    },
}

impl Commands {
    /// Dispatch to the command implementation
    pub async fn run(self) -> Result<()> {
        match self {
            Commands::Build {
                compilers,
                libs,
                work_dir,
                generator,
                overrides_dir,
                timeout_secs,
                json,
            } => {
                build::execute(build::BuildOptions {
                    compilers,
                    libs,
                    work_dir,
                    generator,
                    overrides_dir,
                    timeout_secs,
                    json,
                })
                .await
            }
            Commands::Fetch {
                libs,
                work_dir,
                overrides_dir,
            } => fetch::execute(&libs, &work_dir, &overrides_dir).await,
            Commands::Check { compilers, libs } => check::execute(&compilers, &libs),
            Commands::List { libs } => list::execute(&libs),
        }
    }
}

/// Load and merge the library documents named on the command line
pub(crate) fn load_library_manifests(
    paths: &[PathBuf],
) -> Result<crate::core::manifest::LibraryManifest> {
    use anyhow::Context;

    let mut merged = crate::core::manifest::LibraryManifest::default();
    for path in paths {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read library document {}", path.display()))?;
        let manifest = crate::core::manifest::LibraryManifest::from_toml(&content, path)?;
        merged.merge(manifest);
    }
    Ok(merged)
}

/// Load the compiler matrix document
pub(crate) fn load_compiler_manifest(
    path: &std::path::Path,
) -> Result<crate::core::manifest::CompilerManifest> {
    use anyhow::Context;

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read compiler document {}", path.display()))?;
    Ok(crate::core::manifest::CompilerManifest::from_toml(
        &content, path,
    )?)
}
