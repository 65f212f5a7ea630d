//! Dependency resolution
//!
//! Flattens the catalog into the set of build units the orchestrator
//! schedules. Every direct dependency reference is checked against the
//! catalog here, before any toolchain is launched. Ordering itself is not
//! computed; the orchestrator enforces dependency-first order
//! structurally through its recursion.

use crate::core::catalog::{BuildStrategy, Catalog};
use crate::core::template;
use crate::error::ConfigError;

/// One (library, version) pair scheduled for compilation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildUnit {
    /// Library name
    pub name: String,
    /// Library version
    pub version: String,
    /// Direct dependencies as (name, version) references
    pub dependencies: Vec<(String, String)>,
}

/// Produce the full build-unit set from the catalog
///
/// Fails on the first dependency reference that does not name a catalog
/// entry, and validates scripted command templates so that placeholder
/// mistakes surface now rather than mid-build.
pub fn resolve(catalog: &Catalog) -> Result<Vec<BuildUnit>, ConfigError> {
    let mut units = Vec::new();

    for (name, version, record) in catalog.iter() {
        let mut dependencies = Vec::new();

        for (dep_name, dep_version) in &record.dependencies {
            if !catalog.contains(dep_name, dep_version) {
                return Err(ConfigError::UnresolvedDependency {
                    library: name.to_string(),
                    version: version.to_string(),
                    dependency: dep_name.clone(),
                    dependency_version: dep_version.clone(),
                });
            }
            dependencies.push((dep_name.clone(), dep_version.clone()));
        }

        if let BuildStrategy::Scripted { commands } = &record.strategy {
            template::validate_commands(commands, name)?;
        }

        units.push(BuildUnit {
            name: name.to_string(),
            version: version.to_string(),
            dependencies,
        });
    }

    Ok(units)
}
