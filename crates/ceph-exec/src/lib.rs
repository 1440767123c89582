//! Privileged cluster command execution.
//!
//! Everything that spawns `ceph`, `rados` or `radosgw-admin` goes through the
//! [`Executor`] trait so callers can be driven by a [`FakeExecutor`] in tests.

mod fake;
mod host;

pub use fake::{FakeExecutor, Handler, StaticHandler};
pub use host::HostExecutor;

use std::fmt;
use std::sync::Arc;

pub type BoxedExecutor = Arc<dyn Executor>;

/// Runs argument vectors and reports their exit status and captured output.
///
/// - In production this is a [`HostExecutor`].
/// - Under test a [`FakeExecutor`] returns scripted results and records calls.
pub trait Executor: Send + Sync {
    /// Runs `argv` to completion. A non-zero exit is reported in the output,
    /// not as an error; only a failure to start the program is an error.
    fn run(&self, argv: &[String]) -> Result<CommandOutput, ExecutionError>;

    /// Runs `argv` and converts a non-zero exit into
    /// [`ExecutionError::CommandFailure`].
    fn execute(&self, argv: &[String]) -> Result<CommandOutput, ExecutionError> {
        let output = self.run(argv)?;
        if !output.is_success() {
            return Err(output_to_exec_error(argv, &output));
        }
        Ok(output)
    }
}

/// Exit status plus captured stdout/stderr of one command.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the process was terminated by a signal.
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success() -> Self {
        Self {
            status: Some(0),
            ..Default::default()
        }
    }

    pub fn failure(code: i32) -> Self {
        Self {
            status: Some(code),
            ..Default::default()
        }
    }

    pub fn with_stdout(mut self, stdout: impl Into<String>) -> Self {
        self.stdout = stdout.into();
        self
    }

    pub fn with_stderr(mut self, stderr: impl Into<String>) -> Self {
        self.stderr = stderr.into();
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == Some(0)
    }

    /// Text to surface to a caller when the command failed: stderr when the
    /// tool wrote any, stdout otherwise.
    pub fn diagnostic(&self) -> &str {
        if self.stderr.trim().is_empty() {
            &self.stdout
        } else {
            &self.stderr
        }
    }
}

impl From<std::process::Output> for CommandOutput {
    fn from(output: std::process::Output) -> Self {
        Self {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

#[derive(Debug)]
pub struct CommandFailureInfo {
    pub command: String,
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl fmt::Display for CommandFailureInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = self
            .status
            .map(|c| c.to_string())
            .unwrap_or_else(|| "none".to_string());
        write!(
            f,
            "Command [{}] executed and failed with status: {}",
            self.command, status
        )?;
        write!(f, "  stdout: {}", self.stdout)?;
        write!(f, "  stderr: {}", self.stderr)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ExecutionError {
    #[error("Failed to start execution of [{command}]: {err}")]
    ExecutionStart { command: String, err: std::io::Error },

    #[error("{0}")]
    CommandFailure(Box<CommandFailureInfo>),
}

impl ExecutionError {
    /// Exit status of a command that ran and failed.
    pub fn status(&self) -> Option<i32> {
        match self {
            ExecutionError::CommandFailure(info) => info.status,
            ExecutionError::ExecutionStart { .. } => None,
        }
    }

    /// Captured tool output for a failed command, suitable for a response.
    pub fn diagnostic(&self) -> String {
        match self {
            ExecutionError::CommandFailure(info) if !info.stderr.trim().is_empty() => {
                info.stderr.clone()
            }
            ExecutionError::CommandFailure(info) => info.stdout.clone(),
            other => other.to_string(),
        }
    }
}

pub fn command_to_string(argv: &[String]) -> String {
    argv.join(" ")
}

pub fn output_to_exec_error(argv: &[String], output: &CommandOutput) -> ExecutionError {
    ExecutionError::CommandFailure(Box::new(CommandFailureInfo {
        command: command_to_string(argv),
        status: output.status,
        stdout: output.stdout.clone(),
        stderr: output.stderr.clone(),
    }))
}

/// Builds an owned argument vector from string slices.
pub fn argv<I, S>(parts: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    parts.into_iter().map(Into::into).collect()
}
