//! Integration tests for the `binforge` command-line interface
//!
//! Drives the compiled binary end to end: configuration validation,
//! listing, and a full offline build against pre-extracted sources.

mod common;

use std::process::Command;

use predicates::prelude::*;

use common::TestWorkspace;

/// Run the binforge binary with the given arguments inside the workspace
fn run_binforge(workspace: &TestWorkspace, args: &[&str]) -> std::process::Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_binforge"));
    cmd.current_dir(workspace.path());
    for arg in args {
        cmd.arg(arg);
    }
    cmd.output().expect("Failed to execute binforge")
}

const COMPILERS: &str = r#"
[compilers.gcc9]
env_script = "/dev/null"
short = "gcc9"
generator = "Unix Makefiles"
version = "9.0"

[compilers.gcc10]
env_script = "/dev/null"
short = "gcc10"
generator = "Unix Makefiles"
version = "10.0"
"#;

/// Scripted libraries that stage output with plain shell tools, so the
/// build needs no real toolchain
const LIBS: &str = r#"
[libs.zlib]
url = "https://invalid.example/zlib-{version}.tar.gz"
versions = ["1.0"]
commands = [
    "mkdir -p {binpath}/bin",
    "cp {sourcepath}/lib.c {binpath}/bin/{name}.dll",
]

[libs.libpng]
url = "https://invalid.example/libpng-{version}.tar.gz"
versions = ["2.0"]
commands = [
    "mkdir -p {binpath}/bin",
    "cp {sourcepath}/lib.c {binpath}/bin/{name}.dll",
]

[libs.libpng.dependencies.all]
zlib = "1.0"
"#;

#[test]
fn test_check_accepts_valid_configuration() {
    let workspace = TestWorkspace::new();
    workspace.create_file("compilers.toml", COMPILERS);
    workspace.create_file("libs.toml", LIBS);

    let output = run_binforge(&workspace, &["check"]);

    assert!(
        output.status.success(),
        "check failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(predicate::str::contains("2 compiler profile(s)").eval(&stdout));
    assert!(predicate::str::contains("2 build unit(s)").eval(&stdout));
}

#[test]
fn test_check_rejects_unresolved_dependency() {
    let workspace = TestWorkspace::new();
    workspace.create_file("compilers.toml", COMPILERS);
    workspace.create_file(
        "libs.toml",
        r#"
[libs.libpng]
url = "https://invalid.example/libpng-{version}.tar.gz"
versions = ["2.0"]

[libs.libpng.dependencies.all]
zlib = "9.9"
"#,
    );

    let output = run_binforge(&workspace, &["check"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(predicate::str::contains("zlib-9.9").eval(&stderr));
}

#[test]
fn test_check_rejects_unknown_placeholder() {
    let workspace = TestWorkspace::new();
    workspace.create_file("compilers.toml", COMPILERS);
    workspace.create_file(
        "libs.toml",
        r#"
[libs.zlib]
url = "https://invalid.example/zlib-{version}.tar.gz"
versions = ["1.0"]
commands = ["echo {not_a_placeholder}"]
"#,
    );

    let output = run_binforge(&workspace, &["check"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(predicate::str::contains("not_a_placeholder").eval(&stderr));
}

#[test]
fn test_list_shows_versions_and_dependencies() {
    let workspace = TestWorkspace::new();
    workspace.create_file("libs.toml", LIBS);

    let output = run_binforge(&workspace, &["list"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(predicate::str::contains("zlib-1.0").eval(&stdout));
    assert!(predicate::str::contains("libpng-2.0 (depends on: zlib-1.0)").eval(&stdout));
}

#[test]
fn test_build_stages_binaries_for_every_profile() {
    let workspace = TestWorkspace::new();
    workspace.create_file("compilers.toml", COMPILERS);
    workspace.create_file("libs.toml", LIBS);

    // Pre-extracted sources keep acquisition offline.
    workspace.create_source("zlib", "1.0");
    workspace.create_source("libpng", "2.0");

    let output = run_binforge(&workspace, &["build", "--generator", "true"]);

    assert!(
        output.status.success(),
        "build failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    for short in ["gcc9", "gcc10"] {
        assert!(workspace
            .bin_dir("zlib", "1.0", short)
            .join("bin/zlib.dll")
            .is_file());
        assert!(workspace
            .bin_dir("libpng", "2.0", short)
            .join("bin/libpng.dll")
            .is_file());
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(predicate::str::contains("2 built").eval(&stdout));
}

#[test]
fn test_build_reports_failures_with_nonzero_exit() {
    let workspace = TestWorkspace::new();
    workspace.create_file("compilers.toml", COMPILERS);
    workspace.create_file(
        "libs.toml",
        r#"
[libs.broken]
url = "https://invalid.example/broken-{version}.tar.gz"
versions = ["1.0"]
commands = ["false"]
"#,
    );
    workspace.create_source("broken", "1.0");

    let output = run_binforge(&workspace, &["build", "--generator", "true"]);

    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(predicate::str::contains("1 failed").eval(&stdout));
}

#[test]
fn test_build_json_summary() {
    let workspace = TestWorkspace::new();
    workspace.create_file("compilers.toml", COMPILERS);
    workspace.create_file(
        "libs.toml",
        r#"
[libs.zlib]
url = "https://invalid.example/zlib-{version}.tar.gz"
versions = ["1.0"]
commands = [
    "mkdir -p {binpath}/bin",
    "cp {sourcepath}/lib.c {binpath}/bin/{name}.dll",
]
"#,
    );
    workspace.create_source("zlib", "1.0");

    let output = run_binforge(&workspace, &["build", "--generator", "true", "--json"]);

    assert!(
        output.status.success(),
        "build failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    let json_start = stdout.find('[').expect("json array in output");
    let reports: serde_json::Value =
        serde_json::from_str(stdout[json_start..].trim()).expect("valid json summary");

    assert_eq!(reports.as_array().unwrap().len(), 2);
    assert_eq!(reports[0]["units"][0]["status"], "built");
}

#[test]
fn test_build_resumes_from_prior_output() {
    let workspace = TestWorkspace::new();
    workspace.create_file("compilers.toml", COMPILERS);
    workspace.create_file(
        "libs.toml",
        r#"
[libs.zlib]
url = "https://invalid.example/zlib-{version}.tar.gz"
versions = ["1.0"]
commands = [
    "mkdir -p {binpath}/bin",
    "cp {sourcepath}/lib.c {binpath}/bin/{name}.dll",
]
"#,
    );
    workspace.create_source("zlib", "1.0");

    let first = run_binforge(&workspace, &["build", "--generator", "true"]);
    assert!(first.status.success());

    // A fresh process finds the staged output and skips the toolchain.
    let second = run_binforge(&workspace, &["build", "--generator", "true"]);
    assert!(second.status.success());
    let stdout = String::from_utf8_lossy(&second.stdout);
    assert!(predicate::str::contains("prior output present").eval(&stdout));
}
