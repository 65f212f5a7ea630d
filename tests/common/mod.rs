//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests.

// Each test binary compiles this module separately and uses a subset.
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use binforge::config::Layout;
use binforge::core::catalog::{BuildStrategy, Catalog, VersionRecord};
use binforge::core::manifest::CompilerProfile;
use binforge::core::resolver::BuildUnit;

/// Test workspace
///
/// Creates a temporary working directory with the pipeline layout and
/// provides utilities for assembling catalogs and inspecting outputs.
pub struct TestWorkspace {
    /// Temporary directory backing the workspace
    pub dir: TempDir,
}

impl TestWorkspace {
    /// Create a new workspace in a temporary directory
    pub fn new() -> Self {
        let workspace = Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        };
        workspace.layout().ensure().expect("Failed to create layout");
        workspace
    }

    /// Path of the workspace root
    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Layout rooted at this workspace
    pub fn layout(&self) -> Layout {
        Layout::new(self.dir.path().join("work"))
    }

    /// Create an extracted source tree for a library version
    pub fn create_source(&self, name: &str, version: &str) {
        let dir = self.layout().extracted_dir().join(format!("{name}-{version}"));
        std::fs::create_dir_all(&dir).expect("Failed to create source dir");
        std::fs::write(dir.join("lib.c"), format!("/* {name} {version} */"))
            .expect("Failed to write source file");
    }

    /// Create a file in the workspace
    pub fn create_file(&self, name: &str, content: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(path, content).expect("Failed to write file");
    }

    /// Check if a file exists in the workspace
    pub fn file_exists(&self, name: &str) -> bool {
        self.dir.path().join(name).exists()
    }

    /// Staged-binary directory for a unit under one compiler
    pub fn bin_dir(&self, name: &str, version: &str, short: &str) -> PathBuf {
        self.layout().bin_dir().join(format!("{name}-{version}_{short}"))
    }

    /// Build a version record rooted in this workspace
    pub fn record(
        &self,
        name: &str,
        version: &str,
        deps: &[(&str, &str)],
        strategy: BuildStrategy,
    ) -> VersionRecord {
        let layout = self.layout();
        let stem = format!("{name}-{version}");
        VersionRecord {
            source_path: layout.extracted_dir().join(&stem),
            build_path: layout.build_dir().join(&stem),
            bin_path: layout.bin_dir().join(&stem),
            dependencies: deps
                .iter()
                .map(|(n, v)| ((*n).to_string(), (*v).to_string()))
                .collect::<BTreeMap<_, _>>(),
            strategy,
            allow_64bit: true,
            built: false,
        }
    }
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

/// Scripted strategy from string templates
pub fn scripted(commands: &[&str]) -> BuildStrategy {
    BuildStrategy::Scripted {
        commands: commands.iter().map(|c| (*c).to_string()).collect(),
    }
}

/// A compiler profile for tests
pub fn profile(name: &str, short: &str) -> CompilerProfile {
    CompilerProfile {
        name: name.to_string(),
        env_script: PathBuf::from("/dev/null"),
        short: short.to_string(),
        generator: "Unix Makefiles".to_string(),
        version: "1.0".to_string(),
    }
}

/// A build unit referencing catalog entries
pub fn unit(name: &str, version: &str, deps: &[(&str, &str)]) -> BuildUnit {
    BuildUnit {
        name: name.to_string(),
        version: version.to_string(),
        dependencies: deps
            .iter()
            .map(|(n, v)| ((*n).to_string(), (*v).to_string()))
            .collect(),
    }
}

/// Insert a record into a catalog, creating the source tree alongside
pub fn add_to_catalog(
    workspace: &TestWorkspace,
    catalog: &mut Catalog,
    name: &str,
    version: &str,
    deps: &[(&str, &str)],
    strategy: BuildStrategy,
) {
    workspace.create_source(name, version);
    let record = workspace.record(name, version, deps, strategy);
    catalog
        .insert(name, version, record)
        .expect("catalog insert");
}

/// Build a small gzipped tarball with the given (path, contents) entries
pub fn make_tar_gz(dest: &Path, entries: &[(&str, &str)]) {
    let file = std::fs::File::create(dest).expect("create archive");
    let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);

    for (path, contents) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, path, contents.as_bytes())
            .expect("append entry");
    }

    builder
        .into_inner()
        .expect("finish tar")
        .finish()
        .expect("finish gzip");
}

/// Write an executable script that logs its arguments, for use as a fake
/// generator executable
#[cfg(unix)]
pub fn fake_generator(dir: &Path, log_name: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let log = dir.join(log_name);
    let script = dir.join("fake-cmake");
    std::fs::write(
        &script,
        format!("#!/bin/sh\necho \"$@\" >> {}\n", log.display()),
    )
    .expect("write fake generator");
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755))
        .expect("chmod fake generator");
    script
}
