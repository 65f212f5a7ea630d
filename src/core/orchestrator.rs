//! Build orchestration
//!
//! Drives one compiler profile's build stream over its own catalog
//! snapshot. Dependencies are built recursively, depth-first, strictly
//! before their dependents; repeated requests for the same unit are
//! short-circuited by the `built` flag, and output left behind by a
//! previous process makes the whole run resumable without re-invoking any
//! toolchain.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::core::catalog::Catalog;
use crate::core::driver::{BuildRequest, ToolchainDriver};
use crate::core::manifest::CompilerProfile;
use crate::core::resolver::BuildUnit;
use crate::error::{BuildError, ConfigError};
use crate::infra::filesystem;

/// Non-error reasons a unit's toolchain invocation was bypassed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The unit was already built earlier in this stream
    AlreadyBuilt,
    /// The compiler targets 64-bit and the unit disallows 64-bit builds
    Disallowed64Bit,
    /// The bin directory already holds output from a prior process
    PriorOutput,
}

/// Outcome of one `build` call for one unit
#[derive(Debug)]
pub enum UnitOutcome {
    /// The toolchain ran and succeeded
    Built,
    /// The toolchain was bypassed
    Skipped(SkipReason),
    /// The build failed; the stream continues with unrelated units
    Failed(BuildError),
}

impl UnitOutcome {
    /// True for outcomes a dependent may build on top of
    pub fn is_usable_dependency(&self) -> bool {
        matches!(
            self,
            UnitOutcome::Built
                | UnitOutcome::Skipped(SkipReason::AlreadyBuilt)
                | UnitOutcome::Skipped(SkipReason::PriorOutput)
        )
    }
}

/// Compiler-suffixed absolute paths of one unit
#[derive(Debug, Clone)]
struct UnitPaths {
    build_dir: PathBuf,
    bin_dir: PathBuf,
}

/// Per-profile build orchestrator
///
/// Owns an isolated catalog snapshot; nothing here is shared with other
/// compiler streams, so no synchronization is needed. Path suffixing by
/// the compiler short identifier keeps concurrent streams writing to
/// disjoint directories.
pub struct Orchestrator {
    catalog: Catalog,
    profile: CompilerProfile,
    driver: ToolchainDriver,
    /// Absolute paths recorded per unit the first time it is visited
    paths: HashMap<(String, String), UnitPaths>,
}

impl Orchestrator {
    /// Create an orchestrator for one compiler profile
    pub fn new(catalog: Catalog, profile: CompilerProfile, driver: ToolchainDriver) -> Self {
        Self {
            catalog,
            profile,
            driver,
            paths: HashMap::new(),
        }
    }

    /// Whether a unit has been built in this stream
    pub fn is_built(&self, name: &str, version: &str) -> bool {
        self.catalog
            .get(name, version)
            .is_some_and(|record| record.built)
    }

    /// Build one unit and, before it, all of its transitive dependencies
    ///
    /// Build failures are reported in the outcome and leave the stream
    /// usable for unrelated units; only configuration-level problems (a
    /// dependency cycle, a reference the resolver never saw) abort the
    /// stream via `Err`.
    pub fn build(&mut self, unit: &BuildUnit) -> Result<UnitOutcome, ConfigError> {
        let mut chain = Vec::new();
        self.build_inner(&unit.name, &unit.version, &mut chain, false)
    }

    fn build_inner(
        &mut self,
        name: &str,
        version: &str,
        chain: &mut Vec<(String, String)>,
        is_dependency: bool,
    ) -> Result<UnitOutcome, ConfigError> {
        let key = (name.to_string(), version.to_string());
        if chain.contains(&key) {
            let mut cycle: Vec<String> = chain.iter().map(|(n, v)| format!("{n}-{v}")).collect();
            cycle.push(format!("{name}-{version}"));
            return Err(ConfigError::DependencyCycle { chain: cycle });
        }

        let record = match self.catalog.get(name, version) {
            Some(record) => record.clone(),
            None => {
                // The resolver guarantees this for units it produced; a miss
                // means the unit set and catalog went out of sync.
                let (parent_name, parent_version) = chain
                    .last()
                    .cloned()
                    .unwrap_or_else(|| (name.to_string(), version.to_string()));
                return Err(ConfigError::UnresolvedDependency {
                    library: parent_name,
                    version: parent_version,
                    dependency: name.to_string(),
                    dependency_version: version.to_string(),
                });
            }
        };

        if record.built {
            return Ok(UnitOutcome::Skipped(SkipReason::AlreadyBuilt));
        }

        if self.profile.is_64bit() && !record.allow_64bit {
            tracing::debug!(
                "skipping {name}-{version} for {}: 64-bit builds disallowed",
                self.profile.short
            );
            return Ok(UnitOutcome::Skipped(SkipReason::Disallowed64Bit));
        }

        // The only place paths become compiler-specific, before any
        // filesystem write for this unit.
        let paths = self.record_paths(&key, &record.build_path, &record.bin_path);

        if filesystem::dir_has_files(&paths.bin_dir) {
            tracing::info!(
                "{name}-{version}_{} already built, reusing prior output",
                self.profile.short
            );
            if let Some(record) = self.catalog.get_mut(name, version) {
                record.built = true;
            }
            return Ok(UnitOutcome::Skipped(SkipReason::PriorOutput));
        }

        chain.push(key.clone());

        // Dependencies complete, successfully or via a definitive skip,
        // before this unit's toolchain is invoked.
        let mut dependency_bins = Vec::new();
        for (dep_name, dep_version) in record.dependencies.clone() {
            let outcome = self.build_inner(&dep_name, &dep_version, chain, true)?;

            if !outcome.is_usable_dependency() {
                chain.pop();
                let error = match outcome {
                    UnitOutcome::Skipped(SkipReason::Disallowed64Bit) => {
                        BuildError::DependencyUnavailable {
                            library: name.to_string(),
                            version: version.to_string(),
                            dependency: dep_name,
                            dependency_version: dep_version,
                        }
                    }
                    _ => BuildError::DependencyFailed {
                        library: name.to_string(),
                        version: version.to_string(),
                        dependency: dep_name,
                        dependency_version: dep_version,
                    },
                };
                return Ok(UnitOutcome::Failed(error));
            }

            match self.paths.get(&(dep_name.clone(), dep_version.clone())) {
                Some(dep_paths) => dependency_bins.push(dep_paths.bin_dir.clone()),
                None => {
                    // Unreachable for usable outcomes; keep the hint list
                    // honest rather than guessing a path.
                    tracing::warn!("no recorded bin path for {dep_name}-{dep_version}");
                }
            }
        }

        chain.pop();

        tracing::info!(
            "building {}{name}-{version}_{}",
            if is_dependency { "dependency " } else { "" },
            self.profile.short
        );

        let result = self.driver.build(&BuildRequest {
            name,
            version,
            profile: &self.profile,
            source_dir: &filesystem::absolutize(&record.source_path),
            build_dir: &paths.build_dir,
            bin_dir: &paths.bin_dir,
            dependency_bins: &dependency_bins,
            strategy: &record.strategy,
        });

        match result {
            Ok(()) => {
                if let Some(record) = self.catalog.get_mut(name, version) {
                    record.built = true;
                }
                Ok(UnitOutcome::Built)
            }
            Err(error) => {
                tracing::warn!("build of {name}-{version} failed: {error}");
                Ok(UnitOutcome::Failed(error))
            }
        }
    }

    /// Compute and remember the compiler-suffixed absolute paths of a unit
    fn record_paths(&mut self, key: &(String, String), build_stem: &Path, bin_stem: &Path) -> UnitPaths {
        if let Some(existing) = self.paths.get(key) {
            return existing.clone();
        }

        let paths = UnitPaths {
            build_dir: filesystem::absolutize(&suffixed(build_stem, &self.profile.short)),
            bin_dir: filesystem::absolutize(&suffixed(bin_stem, &self.profile.short)),
        };
        self.paths.insert(key.clone(), paths.clone());
        paths
    }

    /// Staged-binary directory of a unit, if it was visited in this stream
    pub fn bin_dir(&self, name: &str, version: &str) -> Option<&Path> {
        self.paths
            .get(&(name.to_string(), version.to_string()))
            .map(|p| p.bin_dir.as_path())
    }
}

/// Append `_<short>` to the last component of a path stem
fn suffixed(stem: &Path, short: &str) -> PathBuf {
    match stem.file_name().and_then(|n| n.to_str()) {
        Some(name) => stem.with_file_name(format!("{name}_{short}")),
        None => stem.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffixed_appends_short_id() {
        assert_eq!(
            suffixed(Path::new("work/build/zlib-1.2.11"), "msvc12"),
            PathBuf::from("work/build/zlib-1.2.11_msvc12")
        );
    }

    #[test]
    fn test_usable_dependency_outcomes() {
        assert!(UnitOutcome::Built.is_usable_dependency());
        assert!(UnitOutcome::Skipped(SkipReason::AlreadyBuilt).is_usable_dependency());
        assert!(UnitOutcome::Skipped(SkipReason::PriorOutput).is_usable_dependency());
        assert!(!UnitOutcome::Skipped(SkipReason::Disallowed64Bit).is_usable_dependency());
        assert!(!UnitOutcome::Failed(BuildError::DependencyFailed {
            library: "a".into(),
            version: "1".into(),
            dependency: "b".into(),
            dependency_version: "2".into(),
        })
        .is_usable_dependency());
    }
}
