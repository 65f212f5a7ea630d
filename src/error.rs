//! Error types for binforge
//!
//! Domain-specific error types using thiserror.
//!
//! The taxonomy follows the blast radius of each failure: a [`ConfigError`]
//! aborts the whole run before any toolchain is launched, while a
//! [`BuildError`] is local to one (library, version, compiler) combination
//! and never stops sibling builds or other compiler streams.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal configuration errors
///
/// Detected while parsing the input documents or resolving the catalog,
/// always before any external process is launched.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A dependency references a (library, version) pair that is not in the catalog
    #[error("'{library}-{version}' depends on '{dependency}-{dependency_version}', which is not in the catalog")]
    UnresolvedDependency {
        library: String,
        version: String,
        dependency: String,
        dependency_version: String,
    },

    /// The dependency graph contains a cycle
    #[error("Dependency cycle detected: {}", chain.join(" -> "))]
    DependencyCycle { chain: Vec<String> },

    /// A command template uses a placeholder that is not recognized
    #[error("Unknown placeholder '{{{placeholder}}}' in command for '{library}': {command}")]
    UnknownPlaceholder {
        library: String,
        command: String,
        placeholder: String,
    },

    /// A command template has unbalanced braces
    #[error("Unbalanced braces in command for '{library}': {command}")]
    UnbalancedBraces { library: String, command: String },

    /// Missing required field in a configuration document
    #[error("Library '{library}' is missing required field '{field}'")]
    MissingField { library: String, field: String },

    /// Compiler profile is missing a required field
    #[error("Compiler profile '{profile}' has an empty '{field}' field")]
    MissingCompilerField { profile: String, field: String },

    /// Duplicate (library, version) pair
    #[error("Duplicate catalog entry for '{library}-{version}'")]
    DuplicateEntry { library: String, version: String },

    /// Configuration document parse error
    #[error("Failed to parse '{path}': {error}")]
    ParseError { path: PathBuf, error: String },

    /// A derived pattern (URL version detection) failed to compile
    #[error("Invalid version-detection pattern for '{library}': {error}")]
    InvalidPattern { library: String, error: String },
}

/// Build failures, local to one (library, version, compiler) combination
#[derive(Error, Debug)]
pub enum BuildError {
    /// An external build command exited with a non-zero status
    #[error("Command {step} of '{library}-{version}' failed ({command}): {cause}")]
    CommandFailed {
        library: String,
        version: String,
        step: usize,
        command: String,
        cause: ProcessError,
    },

    /// The extracted source directory does not exist
    #[error("Source directory for '{library}-{version}' not found at '{path}'")]
    MissingSource {
        library: String,
        version: String,
        path: PathBuf,
    },

    /// A command template failed to render at build time
    #[error("Invalid build command for '{library}-{version}': {error}")]
    InvalidCommand {
        library: String,
        version: String,
        error: String,
    },

    /// A dependency of this unit failed to build
    #[error("Dependency '{dependency}-{dependency_version}' of '{library}-{version}' failed to build")]
    DependencyFailed {
        library: String,
        version: String,
        dependency: String,
        dependency_version: String,
    },

    /// A dependency of this unit cannot be built for the current compiler
    #[error("Dependency '{dependency}-{dependency_version}' of '{library}-{version}' cannot be built for this compiler")]
    DependencyUnavailable {
        library: String,
        version: String,
        dependency: String,
        dependency_version: String,
    },

    /// A filesystem operation required by the build failed
    #[error(transparent)]
    Filesystem(#[from] FilesystemError),
}

/// External process failures
#[derive(Error, Debug)]
pub enum ProcessError {
    /// Process could not be spawned
    #[error("failed to spawn '{program}': {error}")]
    Spawn { program: String, error: String },

    /// Process exited with a non-zero status
    #[error("'{program}' exited with {status}")]
    Exited { program: String, status: String },

    /// Process exceeded the configured timeout and was killed
    #[error("'{program}' timed out after {seconds}s and was killed")]
    TimedOut { program: String, seconds: u64 },

    /// IO error while waiting on the process
    #[error("IO error while running '{program}': {error}")]
    Io { program: String, error: String },
}

/// Download errors
#[derive(Error, Debug)]
pub enum DownloadError {
    /// Network error
    #[error("Network error downloading '{url}': {error}")]
    NetworkError { url: String, error: String },

    /// Unsupported URL scheme
    #[error("Unsupported URL scheme: {url}")]
    UnsupportedScheme { url: String },

    /// IO error
    #[error("IO error for '{path}': {error}")]
    IoError { path: PathBuf, error: String },

    /// Max retries exceeded
    #[error("Download failed after {retries} retries: {url}")]
    MaxRetriesExceeded { url: String, retries: u32 },
}

/// Archive extraction errors
#[derive(Error, Debug)]
pub enum ExtractError {
    /// Corrupt or unreadable archive
    #[error("Failed to read archive '{path}': {error}")]
    Malformed { path: PathBuf, error: String },

    /// IO error while unpacking
    #[error("IO error unpacking '{path}': {error}")]
    IoError { path: PathBuf, error: String },
}

/// Filesystem errors
#[derive(Error, Debug)]
pub enum FilesystemError {
    /// Failed to create directory
    #[error("Failed to create directory '{path}': {error}")]
    CreateDir { path: PathBuf, error: String },

    /// Failed to copy a file
    #[error("Failed to copy '{from}' to '{to}': {error}")]
    CopyFile {
        from: PathBuf,
        to: PathBuf,
        error: String,
    },
}

/// Acquisition errors
///
/// Download and extraction failures for a single library version are
/// warnings that drop the version from the catalog; only configuration
/// and workspace-level filesystem problems surface here.
#[derive(Error, Debug)]
pub enum AcquireError {
    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Filesystem error
    #[error(transparent)]
    Filesystem(#[from] FilesystemError),
}

/// Top-level binforge error type
#[derive(Error, Debug)]
pub enum BinforgeError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Build error
    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    /// Download error
    #[error("Download error: {0}")]
    Download(#[from] DownloadError),

    /// Extraction error
    #[error("Extraction error: {0}")]
    Extract(#[from] ExtractError),

    /// Filesystem error
    #[error("Filesystem error: {0}")]
    Filesystem(#[from] FilesystemError),

    /// IO error
    #[error("IO error: {source}")]
    Io { source: std::io::Error },

    /// Generic error
    #[error("{0}")]
    Generic(String),
}
