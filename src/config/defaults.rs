//! Default configuration values

/// Maximum number of download retry attempts
pub const MAX_DOWNLOAD_RETRIES: u32 = 3;

/// Default per-invocation build timeout, in seconds
pub const DEFAULT_BUILD_TIMEOUT_SECS: u64 = 1800;

/// Default working directory for all pipeline state
pub const DEFAULT_WORK_DIR: &str = "work";

/// Default compiler profile document
pub const DEFAULT_COMPILERS_FILE: &str = "compilers.toml";

/// Default library document
pub const DEFAULT_LIBS_FILE: &str = "libs.toml";

/// Default directory holding custom build-configuration overrides
pub const DEFAULT_OVERRIDES_DIR: &str = "overrides";

/// Generator executable looked up on PATH when none is given
pub const DEFAULT_GENERATOR_EXE: &str = "cmake";

/// Marker in a compiler short identifier that denotes a 64-bit target
pub const X64_MARKER: &str = "x64";
