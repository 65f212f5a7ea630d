//! External process execution
//!
//! Runs one build command at a time as a direct child process, with a hard
//! timeout. Commands are never routed through a shell or a transient script
//! file, so the failing command in a sequence is directly observable and no
//! quoting hazards apply.

use std::fs::File;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use crate::error::ProcessError;

/// Poll interval while waiting for a child process
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// One structured command invocation: a program and its arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program to execute
    pub program: String,
    /// Arguments, already split
    pub args: Vec<String>,
}

impl Invocation {
    /// Create an invocation from a program and its arguments
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl std::fmt::Display for Invocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.contains(' ') {
                write!(f, " \"{arg}\"")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// Run an invocation to completion inside `cwd`
///
/// Stdout and stderr are appended to `log` when given, otherwise discarded.
/// If the process is still running when `timeout` expires it is killed and
/// the run is reported as [`ProcessError::TimedOut`].
pub fn run(
    invocation: &Invocation,
    cwd: &Path,
    timeout: Duration,
    log: Option<&Path>,
) -> Result<(), ProcessError> {
    let program = invocation.program.clone();

    let (stdout, stderr) = match log {
        Some(path) => {
            let file = File::options()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| ProcessError::Io {
                    program: program.clone(),
                    error: e.to_string(),
                })?;
            let clone = file.try_clone().map_err(|e| ProcessError::Io {
                program: program.clone(),
                error: e.to_string(),
            })?;
            (Stdio::from(file), Stdio::from(clone))
        }
        None => (Stdio::null(), Stdio::null()),
    };

    tracing::debug!("running `{invocation}` in {}", cwd.display());

    let mut child = Command::new(&invocation.program)
        .args(&invocation.args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(stdout)
        .stderr(stderr)
        .spawn()
        .map_err(|e| ProcessError::Spawn {
            program: program.clone(),
            error: e.to_string(),
        })?;

    let deadline = Instant::now() + timeout;

    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                if status.success() {
                    return Ok(());
                }
                return Err(ProcessError::Exited {
                    program,
                    status: status.to_string(),
                });
            }
            Ok(None) => {
                if Instant::now() >= deadline {
                    // Hard kill; the unit is reported failed, the stream continues.
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(ProcessError::TimedOut {
                        program,
                        seconds: timeout.as_secs(),
                    });
                }
                std::thread::sleep(WAIT_POLL_INTERVAL);
            }
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ProcessError::Io {
                    program,
                    error: e.to_string(),
                });
            }
        }
    }
}
