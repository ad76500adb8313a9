//! CommandRunner trait and the tokio-backed task executable runner

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use super::Invocation;
use crate::error::ProcessError;
use crate::sanitize::sanitize_single_argument;

/// Tracing target for the opt-in command/output trace
pub const TRACE_TARGET: &str = "taskreport::process";

/// Runs the task executable and captures its standard output
///
/// Each call is independent. Implementations must be safe to call
/// concurrently; ordering between concurrent calls is not guaranteed.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run one invocation to completion, returning stdout on a zero exit status
    async fn run(&self, invocation: &Invocation) -> Result<String, ProcessError>;
}

/// The configured task executable
#[derive(Debug, Clone)]
pub struct TaskBinary {
    program: String,
    trace_commands: bool,
}

impl TaskBinary {
    /// Create a runner for `program`
    ///
    /// With `trace_commands` set, the exact command line and raw output of every
    /// call are logged under [`TRACE_TARGET`]. Command lines may contain task
    /// descriptions, so this is off unless asked for.
    pub fn new(program: impl Into<String>, trace_commands: bool) -> Self {
        let program = program.into();
        debug!(%program, trace_commands, "TaskBinary::new: called");
        Self {
            program,
            trace_commands,
        }
    }

    fn command(&self, invocation: &Invocation) -> Command {
        match invocation {
            Invocation::Args(args) => {
                let mut cmd = Command::new(&self.program);
                cmd.args(args);
                cmd
            }
            Invocation::Line(line) => {
                let full = format!("{} {}", sanitize_single_argument(&self.program), line);
                shell_command(&full)
            }
        }
    }
}

#[cfg(unix)]
fn shell_command(line: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(line);
    cmd
}

#[cfg(windows)]
fn shell_command(line: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(line);
    cmd
}

#[async_trait]
impl CommandRunner for TaskBinary {
    async fn run(&self, invocation: &Invocation) -> Result<String, ProcessError> {
        debug!("TaskBinary::run: called");
        if self.trace_commands {
            info!(target: TRACE_TARGET, "Executing: {} {}", self.program, invocation.command_line());
        }

        let output = self
            .command(invocation)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                debug!(error = %e, "TaskBinary::run: spawn failed");
                ProcessError::Spawn {
                    program: self.program.clone(),
                    message: e.to_string(),
                }
            })?;

        if !output.status.success() {
            debug!(status = ?output.status, "TaskBinary::run: non-zero exit");
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            if self.trace_commands {
                info!(target: TRACE_TARGET, "Failed ({:?}): {}", output.status.code(), stderr);
            }
            return Err(ProcessError::Exit {
                code: output.status.code(),
                stderr,
            });
        }

        let stdout = String::from_utf8(output.stdout).map_err(|e| ProcessError::Output(e.to_string()))?;
        debug!(bytes = stdout.len(), "TaskBinary::run: completed");
        if self.trace_commands {
            info!(target: TRACE_TARGET, "Result:\n{}", stdout);
        }
        Ok(stdout)
    }
}
