use std::process::Command;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, error, info};

use crate::{BoxedExecutor, CommandOutput, ExecutionError, Executor, command_to_string};

pub(crate) fn log_input(id: u64, argv: &[String]) {
    info!(id, command = %command_to_string(argv), "running command via executor");
}

pub(crate) fn log_output(id: u64, output: &CommandOutput) {
    let result = if output.is_success() { "OK" } else { "ERROR" };
    let status = output
        .status
        .map(|c| c.to_string())
        .unwrap_or_else(|| "none".to_string());
    info!(id, result, status = %status, "finished running command via executor");
    if !output.stdout.is_empty() {
        debug!(id, stdout = %output.stdout, "finished command stdout");
    }
    if !output.stderr.is_empty() {
        debug!(id, stderr = %output.stderr, "finished command stderr");
    }
}

/// Spawns real processes on the local host and blocks until they exit.
#[derive(Debug, Default)]
pub struct HostExecutor {
    counter: AtomicU64,
}

impl HostExecutor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn as_executor(self: Arc<Self>) -> BoxedExecutor {
        self
    }
}

impl Executor for HostExecutor {
    fn run(&self, argv: &[String]) -> Result<CommandOutput, ExecutionError> {
        let id = self.counter.fetch_add(1, Ordering::SeqCst);
        let Some((program, args)) = argv.split_first() else {
            return Err(ExecutionError::ExecutionStart {
                command: String::new(),
                err: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty argv"),
            });
        };
        log_input(id, argv);

        let output = Command::new(program).args(args).output().map_err(|err| {
            error!(id, "could not start program");
            ExecutionError::ExecutionStart {
                command: command_to_string(argv),
                err,
            }
        })?;
        let output = CommandOutput::from(output);
        log_output(id, &output);
        Ok(output)
    }
}
