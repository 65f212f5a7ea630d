//! Shared helpers for unit tests

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::core::catalog::{BuildStrategy, VersionRecord};

/// A generator-strategy record with the given dependencies
pub fn record_with_deps(deps: &[(&str, &str)]) -> VersionRecord {
    VersionRecord {
        source_path: PathBuf::from("work/extracted/lib"),
        build_path: PathBuf::from("work/build/lib"),
        bin_path: PathBuf::from("work/bin/lib"),
        dependencies: deps
            .iter()
            .map(|(n, v)| ((*n).to_string(), (*v).to_string()))
            .collect::<BTreeMap<_, _>>(),
        strategy: BuildStrategy::Generator {
            flags: Vec::new(),
            config_override: None,
        },
        allow_64bit: true,
        built: false,
    }
}

/// A scripted-strategy record with the given command templates
pub fn scripted_record(commands: &[&str]) -> VersionRecord {
    VersionRecord {
        strategy: BuildStrategy::Scripted {
            commands: commands.iter().map(|c| (*c).to_string()).collect(),
        },
        ..record_with_deps(&[])
    }
}
