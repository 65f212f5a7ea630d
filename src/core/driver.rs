//! Toolchain driver
//!
//! Translates one build unit plus a compiler profile into a concrete
//! sequence of external-process invocations and runs them inside the
//! unit's build directory. Planning is pure; only [`ToolchainDriver::build`]
//! touches the filesystem and spawns processes.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::catalog::BuildStrategy;
use crate::core::manifest::CompilerProfile;
use crate::core::template::{CommandTemplate, RenderContext};
use crate::error::{BuildError, ConfigError};
use crate::infra::filesystem;
use crate::infra::process::{self, Invocation};

/// Separator used when joining dependency search paths for the generator
#[cfg(windows)]
const PATH_LIST_SEPARATOR: &str = ";";
#[cfg(not(windows))]
const PATH_LIST_SEPARATOR: &str = ":";

/// Name of the per-unit build log inside the build directory
const BUILD_LOG_NAME: &str = "build.log";

/// Everything the driver needs to build one unit for one compiler
#[derive(Debug)]
pub struct BuildRequest<'a> {
    /// Library name
    pub name: &'a str,
    /// Library version
    pub version: &'a str,
    /// Compiler profile
    pub profile: &'a CompilerProfile,
    /// Absolute extracted-source directory
    pub source_dir: &'a Path,
    /// Absolute compiler-suffixed build directory
    pub build_dir: &'a Path,
    /// Absolute compiler-suffixed staged-binary directory
    pub bin_dir: &'a Path,
    /// Staged-binary directories of all direct dependencies
    pub dependency_bins: &'a [PathBuf],
    /// Build strategy of this unit
    pub strategy: &'a BuildStrategy,
}

/// The synthesized invocation sequence for one unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPlan {
    /// Invocations, run in order inside the build directory
    pub invocations: Vec<Invocation>,
}

/// Drives external toolchains for single build units
#[derive(Debug, Clone)]
pub struct ToolchainDriver {
    generator_exe: PathBuf,
    timeout: Duration,
}

impl ToolchainDriver {
    /// Create a driver around a generator executable and a per-invocation timeout
    pub fn new(generator_exe: PathBuf, timeout: Duration) -> Self {
        Self {
            generator_exe,
            timeout,
        }
    }

    /// Synthesize the invocation sequence for a request without executing it
    pub fn plan(&self, request: &BuildRequest<'_>) -> Result<BuildPlan, ConfigError> {
        let invocations = match request.strategy {
            BuildStrategy::Scripted { commands } => self.plan_scripted(request, commands)?,
            BuildStrategy::Generator { flags, .. } => self.plan_generator(request, flags),
        };

        Ok(BuildPlan { invocations })
    }

    fn plan_scripted(
        &self,
        request: &BuildRequest<'_>,
        commands: &[String],
    ) -> Result<Vec<Invocation>, ConfigError> {
        let env_script = request.profile.env_script.display().to_string();
        let bin_path = request.bin_dir.display().to_string();
        let source_path = request.source_dir.display().to_string();
        let build_path = request.build_dir.display().to_string();

        let ctx = RenderContext {
            env_script: &env_script,
            compiler: &request.profile.short,
            compiler_version: &request.profile.version,
            name: request.name,
            version: request.version,
            bin_path: &bin_path,
            source_path: &source_path,
            build_path: &build_path,
        };

        let mut invocations = Vec::new();
        for raw in commands {
            let rendered = CommandTemplate::parse(raw, request.name)?.render(&ctx);
            let mut words = split_command(&rendered);
            if words.is_empty() {
                continue;
            }
            let program = words.remove(0);
            invocations.push(Invocation::new(program, words));
        }

        Ok(invocations)
    }

    fn plan_generator(&self, request: &BuildRequest<'_>, flags: &[String]) -> Vec<Invocation> {
        let generator = self.generator_exe.display().to_string();

        let mut configure_args = vec![
            "-G".to_string(),
            request.profile.generator.clone(),
            format!("-DCMAKE_INSTALL_PREFIX={}", request.bin_dir.display()),
            format!(
                "-DCMAKE_PDB_OUTPUT_DIRECTORY_RELWITHDEBINFO={}/bin",
                request.bin_dir.display()
            ),
        ];

        for flag in flags {
            configure_args.push(format!("-D{flag}"));
        }

        // Hint the generator's Find* machinery at dependency install trees.
        if !request.dependency_bins.is_empty() {
            let joined = request
                .dependency_bins
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(PATH_LIST_SEPARATOR);
            configure_args.push(format!("-DCMAKE_PREFIX_PATH={joined}"));
        }

        configure_args.push(request.source_dir.display().to_string());

        let install_args = ["--build", ".", "--target", "install", "--config", "RelWithDebInfo"]
            .into_iter()
            .map(String::from)
            .collect();

        vec![
            Invocation::new(generator.clone(), configure_args),
            Invocation::new(generator, install_args),
        ]
    }

    /// Build one unit: prepare directories, then run the planned sequence
    ///
    /// The whole sequence either succeeds or the unit is failed at the
    /// first non-zero exit, timeout, or filesystem problem.
    pub fn build(&self, request: &BuildRequest<'_>) -> Result<(), BuildError> {
        if !request.source_dir.is_dir() {
            return Err(BuildError::MissingSource {
                library: request.name.to_string(),
                version: request.version.to_string(),
                path: request.source_dir.to_path_buf(),
            });
        }

        filesystem::create_dir_all(request.build_dir)?;
        filesystem::create_dir_all(request.bin_dir)?;

        // A declared override replaces the source tree's own build configuration.
        if let BuildStrategy::Generator {
            config_override: Some(override_file),
            ..
        } = request.strategy
        {
            self.apply_config_override(request, override_file)?;
        }

        // Templates are validated at resolution time; this only fails when
        // the catalog was assembled without resolving.
        let plan = self.plan(request).map_err(|e| BuildError::InvalidCommand {
            library: request.name.to_string(),
            version: request.version.to_string(),
            error: e.to_string(),
        })?;

        let log = request.build_dir.join(BUILD_LOG_NAME);

        for (step, invocation) in plan.invocations.iter().enumerate() {
            process::run(invocation, request.build_dir, self.timeout, Some(&log)).map_err(
                |cause| BuildError::CommandFailed {
                    library: request.name.to_string(),
                    version: request.version.to_string(),
                    step,
                    command: invocation.to_string(),
                    cause,
                },
            )?;
        }

        Ok(())
    }

    fn apply_config_override(
        &self,
        request: &BuildRequest<'_>,
        override_file: &Path,
    ) -> Result<(), BuildError> {
        let dest = request.source_dir.join("CMakeLists.txt");
        tracing::debug!(
            "overriding build configuration of {}-{} with {}",
            request.name,
            request.version,
            override_file.display()
        );
        filesystem::copy_file(override_file, &dest)?;
        Ok(())
    }
}

/// Split a rendered command into program + arguments
///
/// Whitespace separates words; double quotes group words that contain
/// whitespace. No other shell syntax is interpreted; commands run as
/// direct child processes, not through a shell.
pub fn split_command(command: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut had_quotes = false;

    for c in command.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                had_quotes = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() || had_quotes {
                    words.push(std::mem::take(&mut current));
                    had_quotes = false;
                }
            }
            c => current.push(c),
        }
    }

    if !current.is_empty() || had_quotes {
        words.push(current);
    }

    words
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> CompilerProfile {
        CompilerProfile {
            name: "msvc12".to_string(),
            env_script: PathBuf::from("C:/vs12/vcvarsall.bat"),
            short: "msvc12".to_string(),
            generator: "Visual Studio 12".to_string(),
            version: "12.0".to_string(),
        }
    }

    fn driver() -> ToolchainDriver {
        ToolchainDriver::new(PathBuf::from("cmake"), Duration::from_secs(60))
    }

    #[test]
    fn test_split_command_plain() {
        assert_eq!(split_command("nmake -f Makefile"), vec!["nmake", "-f", "Makefile"]);
    }

    #[test]
    fn test_split_command_quoted() {
        assert_eq!(
            split_command("cmake -G \"Visual Studio 12\" ."),
            vec!["cmake", "-G", "Visual Studio 12", "."]
        );
    }

    #[test]
    fn test_split_command_empty_quotes() {
        assert_eq!(split_command("prog \"\" arg"), vec!["prog", "", "arg"]);
    }

    #[test]
    fn test_scripted_plan_substitutes_placeholders() {
        let profile = profile();
        let strategy = BuildStrategy::Scripted {
            commands: vec!["build.sh {name} {version} {binpath}".to_string()],
        };
        let request = BuildRequest {
            name: "zlib",
            version: "1.2.11",
            profile: &profile,
            source_dir: Path::new("/work/extracted/zlib-1.2.11"),
            build_dir: Path::new("/work/build/zlib-1.2.11_msvc12"),
            bin_dir: Path::new("/work/bin/zlib-1.2.11_msvc12"),
            dependency_bins: &[],
            strategy: &strategy,
        };

        let plan = driver().plan(&request).unwrap();
        assert_eq!(plan.invocations.len(), 1);
        assert_eq!(plan.invocations[0].program, "build.sh");
        assert_eq!(
            plan.invocations[0].args,
            vec!["zlib", "1.2.11", "/work/bin/zlib-1.2.11_msvc12"]
        );
    }

    #[test]
    fn test_generator_plan_configure_then_install() {
        let profile = profile();
        let strategy = BuildStrategy::Generator {
            flags: vec!["PNG_SHARED=ON".to_string()],
            config_override: None,
        };
        let deps = vec![
            PathBuf::from("/work/bin/zlib-1.2.11_msvc12"),
            PathBuf::from("/work/bin/bzip2-1.0.6_msvc12"),
        ];
        let request = BuildRequest {
            name: "libpng",
            version: "1.6.37",
            profile: &profile,
            source_dir: Path::new("/work/extracted/libpng-1.6.37"),
            build_dir: Path::new("/work/build/libpng-1.6.37_msvc12"),
            bin_dir: Path::new("/work/bin/libpng-1.6.37_msvc12"),
            dependency_bins: &deps,
            strategy: &strategy,
        };

        let plan = driver().plan(&request).unwrap();
        assert_eq!(plan.invocations.len(), 2);

        let configure = &plan.invocations[0];
        assert_eq!(configure.program, "cmake");
        assert_eq!(configure.args[0], "-G");
        assert_eq!(configure.args[1], "Visual Studio 12");
        assert!(configure
            .args
            .contains(&"-DCMAKE_INSTALL_PREFIX=/work/bin/libpng-1.6.37_msvc12".to_string()));
        assert!(configure.args.contains(&"-DPNG_SHARED=ON".to_string()));
        assert!(configure.args.contains(&format!(
            "-DCMAKE_PREFIX_PATH=/work/bin/zlib-1.2.11_msvc12{PATH_LIST_SEPARATOR}/work/bin/bzip2-1.0.6_msvc12"
        )));
        assert_eq!(
            configure.args.last().unwrap(),
            "/work/extracted/libpng-1.6.37"
        );

        let install = &plan.invocations[1];
        assert_eq!(install.program, "cmake");
        assert_eq!(
            install.args,
            vec!["--build", ".", "--target", "install", "--config", "RelWithDebInfo"]
        );
    }

    #[test]
    fn test_generator_plan_without_deps_has_no_prefix_path() {
        let profile = profile();
        let strategy = BuildStrategy::Generator {
            flags: vec![],
            config_override: None,
        };
        let request = BuildRequest {
            name: "zlib",
            version: "1.2.11",
            profile: &profile,
            source_dir: Path::new("/src"),
            build_dir: Path::new("/build"),
            bin_dir: Path::new("/bin"),
            dependency_bins: &[],
            strategy: &strategy,
        };

        let plan = driver().plan(&request).unwrap();
        assert!(!plan.invocations[0]
            .args
            .iter()
            .any(|a| a.starts_with("-DCMAKE_PREFIX_PATH")));
    }

    #[test]
    fn test_build_fails_on_missing_source() {
        let dir = tempfile::TempDir::new().unwrap();
        let profile = profile();
        let strategy = BuildStrategy::Scripted {
            commands: vec!["true".to_string()],
        };
        let missing = dir.path().join("no-such-source");
        let request = BuildRequest {
            name: "zlib",
            version: "1.2.11",
            profile: &profile,
            source_dir: &missing,
            build_dir: &dir.path().join("build"),
            bin_dir: &dir.path().join("bin"),
            dependency_bins: &[],
            strategy: &strategy,
        };

        assert!(matches!(
            driver().build(&request).unwrap_err(),
            BuildError::MissingSource { .. }
        ));
    }

    #[test]
    fn test_build_runs_scripted_sequence_in_build_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        let source = dir.path().join("src");
        std::fs::create_dir_all(&source).unwrap();

        let profile = profile();
        let strategy = BuildStrategy::Scripted {
            commands: vec![
                "mkdir -p {binpath}/bin".to_string(),
                "cp {sourcepath}/lib.c {binpath}/bin/lib.dll".to_string(),
            ],
        };
        std::fs::write(source.join("lib.c"), "int x;").unwrap();

        let build_dir = dir.path().join("build");
        let bin_dir = dir.path().join("bin");
        let request = BuildRequest {
            name: "zlib",
            version: "1.2.11",
            profile: &profile,
            source_dir: &source,
            build_dir: &build_dir,
            bin_dir: &bin_dir,
            dependency_bins: &[],
            strategy: &strategy,
        };

        driver().build(&request).unwrap();
        assert!(bin_dir.join("bin/lib.dll").is_file());
    }

    #[test]
    fn test_build_reports_failing_step() {
        let dir = tempfile::TempDir::new().unwrap();
        let source = dir.path().join("src");
        std::fs::create_dir_all(&source).unwrap();

        let profile = profile();
        let strategy = BuildStrategy::Scripted {
            commands: vec!["true".to_string(), "false".to_string(), "true".to_string()],
        };
        let request = BuildRequest {
            name: "zlib",
            version: "1.2.11",
            profile: &profile,
            source_dir: &source,
            build_dir: &dir.path().join("build"),
            bin_dir: &dir.path().join("bin"),
            dependency_bins: &[],
            strategy: &strategy,
        };

        match driver().build(&request).unwrap_err() {
            BuildError::CommandFailed { step, command, .. } => {
                assert_eq!(step, 1);
                assert_eq!(command, "false");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_config_override_is_copied_before_configure() {
        let dir = tempfile::TempDir::new().unwrap();
        let source = dir.path().join("src");
        std::fs::create_dir_all(&source).unwrap();
        std::fs::write(source.join("CMakeLists.txt"), "original").unwrap();

        let override_file = dir.path().join("custom.cmake");
        std::fs::write(&override_file, "custom").unwrap();

        let profile = profile();
        let strategy = BuildStrategy::Generator {
            flags: vec![],
            config_override: Some(override_file),
        };
        let request = BuildRequest {
            name: "libpng",
            version: "1.6.37",
            profile: &profile,
            source_dir: &source,
            build_dir: &dir.path().join("build"),
            bin_dir: &dir.path().join("bin"),
            dependency_bins: &[],
            strategy: &strategy,
        };

        // `true` stands in for the generator so only the copy is exercised.
        let driver = ToolchainDriver::new(PathBuf::from("true"), Duration::from_secs(30));
        driver.build(&request).unwrap();

        assert_eq!(
            std::fs::read_to_string(source.join("CMakeLists.txt")).unwrap(),
            "custom"
        );
    }
}
