//! Input document parsing and validation
//!
//! Two human-editable TOML documents drive a run: the compiler matrix
//! (`compilers.toml`) and the library list (`libs.toml`). Several library
//! lists can be loaded into one run; they are merged by library name.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::defaults;
use crate::error::ConfigError;

/// The compiler matrix document (`compilers.toml`)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CompilerManifest {
    /// Compiler profiles keyed by display name
    #[serde(default)]
    pub compilers: BTreeMap<String, CompilerProfile>,
}

/// One toolchain configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompilerProfile {
    /// Display name, filled from the document key
    #[serde(skip)]
    pub name: String,

    /// Environment-setup script for this toolchain
    pub env_script: PathBuf,

    /// Short identifier used for path suffixing and filtering
    pub short: String,

    /// Build-file generator identifier (e.g. "Visual Studio 12")
    pub generator: String,

    /// Toolchain version
    pub version: String,
}

impl CompilerProfile {
    /// Whether this profile targets a 64-bit build
    pub fn is_64bit(&self) -> bool {
        self.short.contains(defaults::X64_MARKER)
    }
}

impl CompilerManifest {
    /// Parse from TOML content
    pub fn from_toml(content: &str, origin: &Path) -> Result<Self, ConfigError> {
        let mut manifest: CompilerManifest =
            toml::from_str(content).map_err(|e| ConfigError::ParseError {
                path: origin.to_path_buf(),
                error: e.to_string(),
            })?;

        for (name, profile) in &mut manifest.compilers {
            profile.name.clone_from(name);
        }

        manifest.validate()?;
        Ok(manifest)
    }

    /// Check that every profile carries the fields a build needs
    fn validate(&self) -> Result<(), ConfigError> {
        for (name, profile) in &self.compilers {
            for (field, value) in [
                ("short", &profile.short),
                ("generator", &profile.generator),
                ("version", &profile.version),
            ] {
                if value.is_empty() {
                    return Err(ConfigError::MissingCompilerField {
                        profile: name.clone(),
                        field: field.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Profiles in name order
    pub fn profiles(&self) -> Vec<CompilerProfile> {
        self.compilers.values().cloned().collect()
    }
}

/// Supported source archive kinds
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum ArchiveKind {
    /// Gzipped tarball
    #[default]
    #[serde(rename = "tar.gz")]
    TarGz,
    /// Zip archive
    #[serde(rename = "zip")]
    Zip,
    /// Not an archive; the downloaded file is the source
    #[serde(rename = "plain")]
    Plain,
}

impl ArchiveKind {
    /// File extension used in cache names and URL version detection
    pub fn extension(&self) -> &'static str {
        match self {
            ArchiveKind::TarGz => "tar.gz",
            ArchiveKind::Zip => "zip",
            ArchiveKind::Plain => "plain",
        }
    }
}

/// A table of values applying to all versions with per-version overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Scoped<T> {
    /// Value applying to every version
    #[serde(default)]
    pub all: Option<T>,

    /// Per-version overrides
    #[serde(flatten)]
    pub versions: BTreeMap<String, T>,
}

impl Scoped<BTreeMap<String, String>> {
    /// Merge the `all` table with the overrides for one version
    pub fn for_version(&self, version: &str) -> BTreeMap<String, String> {
        let mut merged = self.all.clone().unwrap_or_default();
        if let Some(overrides) = self.versions.get(version) {
            for (k, v) in overrides {
                merged.insert(k.clone(), v.clone());
            }
        }
        merged
    }
}

impl Scoped<String> {
    /// The override for one version, falling back to `all`
    pub fn for_version(&self, version: &str) -> Option<&str> {
        self.versions
            .get(version)
            .or(self.all.as_ref())
            .map(String::as_str)
    }
}

/// One library entry in the library document
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LibraryConfig {
    /// Display-name override; the document key is used when absent
    #[serde(default)]
    pub name: Option<String>,

    /// URL pattern with a `{version}` placeholder
    #[serde(default)]
    pub url: Option<String>,

    /// Explicit download URLs; the version is detected from each URL
    #[serde(default)]
    pub urls: Vec<String>,

    /// Versions to acquire when `url` is a pattern
    #[serde(default)]
    pub versions: Vec<String>,

    /// Archive kind of the downloaded file
    #[serde(default)]
    pub archive: ArchiveKind,

    /// Whether the archive wraps its contents in a single top-level folder
    #[serde(default)]
    pub strip_root: bool,

    /// Paths removed from the extracted source tree
    #[serde(default)]
    pub remove_from_source: Vec<String>,

    /// Dependency maps: `all` plus per-version overrides
    #[serde(default)]
    pub dependencies: Scoped<BTreeMap<String, String>>,

    /// Extra `-D` definitions for the generator configure step
    #[serde(default)]
    pub generator_flags: Vec<String>,

    /// Custom build-configuration files copied over the source tree's own
    #[serde(default)]
    pub config_override: Scoped<String>,

    /// Scripted build commands; when non-empty they replace the generator
    #[serde(default)]
    pub commands: Vec<String>,

    /// Whether 64-bit compiler targets may build this library
    #[serde(rename = "64bit", default = "default_true")]
    pub allow_64bit: bool,
}

fn default_true() -> bool {
    true
}

/// The library document (`libs.toml`)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LibraryManifest {
    /// Libraries keyed by name
    #[serde(default)]
    pub libs: BTreeMap<String, LibraryConfig>,
}

impl LibraryManifest {
    /// Parse from TOML content
    pub fn from_toml(content: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError {
            path: origin.to_path_buf(),
            error: e.to_string(),
        })
    }

    /// Merge another document into this one; later entries win per library
    pub fn merge(&mut self, other: LibraryManifest) {
        for (name, config) in other.libs {
            self.libs.insert(name, config);
        }
    }
}
