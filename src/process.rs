//! Subprocess execution.
//!
//! Every external tool (git, pygount) is reached through [`CommandRunner`] so the
//! checkout state machine and the counters can be driven by a scripted fake in
//! tests. A runner never fails: spawn errors and non-zero exits come back as a
//! [`CommandOutput`] with `success == false`.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    /// Captured stderr when errors were suppressed, or the spawn error.
    pub stderr: String,
}

impl CommandOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Standard output regardless of outcome; empty means "no information".
    pub fn text(&self) -> &str {
        &self.stdout
    }

    pub fn diagnostic(&self) -> &str {
        self.stderr.trim()
    }
}

pub trait CommandRunner {
    /// Runs `program` with `args` to completion.
    ///
    /// With `suppress_errors` the child's stderr is captured instead of reaching
    /// the terminal.
    fn run(&self, program: &str, args: &[&str], suppress_errors: bool) -> CommandOutput;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, program: &str, args: &[&str], suppress_errors: bool) -> CommandOutput {
        (**self).run(program, args, suppress_errors)
    }
}

/// Runs commands for real, inside one working directory.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    cwd: PathBuf,
}

impl SystemRunner {
    pub fn new<P: AsRef<Path>>(cwd: P) -> Self {
        Self {
            cwd: cwd.as_ref().to_path_buf(),
        }
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str], suppress_errors: bool) -> CommandOutput {
        let stderr = if suppress_errors {
            Stdio::piped()
        } else {
            Stdio::inherit()
        };

        let output = Command::new(program)
            .args(args)
            .current_dir(&self.cwd)
            .stdin(Stdio::null())
            .stderr(stderr)
            .output();

        match output {
            Ok(out) => {
                debug!(
                    event = "process.run_completed",
                    program = program,
                    args = ?args,
                    status = ?out.status.code(),
                );
                CommandOutput {
                    success: out.status.success(),
                    stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
                }
            }
            Err(e) => {
                debug!(
                    event = "process.spawn_failed",
                    program = program,
                    args = ?args,
                    error = %e,
                );
                CommandOutput::failed(format!("Failed to execute {program}: {e}"))
            }
        }
    }
}
