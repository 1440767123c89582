use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::host::{log_input, log_output};
use crate::{BoxedExecutor, CommandOutput, ExecutionError, Executor, command_to_string};

/// Handler called for every command run through a [`FakeExecutor`].
pub type Handler = Box<dyn FnMut(&[String]) -> CommandOutput + Send>;

/// An executor which records every argument vector and answers with
/// caller-provided outputs. Defaults to quietly succeeding.
pub struct FakeExecutor {
    counter: AtomicU64,
    handler: Mutex<Handler>,
    invocations: Mutex<Vec<Vec<String>>>,
}

impl FakeExecutor {
    pub fn new() -> Arc<FakeExecutor> {
        Arc::new(Self {
            counter: AtomicU64::new(0),
            handler: Mutex::new(Box::new(|_argv| CommandOutput::success())),
            invocations: Mutex::new(Vec::new()),
        })
    }

    /// Set the handler to an arbitrary function.
    pub fn set_handler(&self, f: Handler) {
        *self.handler.lock().unwrap() = f;
    }

    /// Every argument vector seen so far, in call order.
    pub fn invocations(&self) -> Vec<Vec<String>> {
        self.invocations.lock().unwrap().clone()
    }

    /// Invocations rendered as space-joined strings, convenient for asserts.
    pub fn commands(&self) -> Vec<String> {
        self.invocations()
            .iter()
            .map(|argv| command_to_string(argv))
            .collect()
    }

    pub fn as_executor(self: Arc<Self>) -> BoxedExecutor {
        self
    }
}

impl Executor for FakeExecutor {
    fn run(&self, argv: &[String]) -> Result<CommandOutput, ExecutionError> {
        let id = self.counter.fetch_add(1, Ordering::SeqCst);
        log_input(id, argv);
        self.invocations.lock().unwrap().push(argv.to_vec());
        let output = (self.handler.lock().unwrap())(argv);
        log_output(id, &output);
        Ok(output)
    }
}

struct Expectation {
    command: String,
    output: CommandOutput,
}

/// A handler for command sequences known ahead of time.
///
/// Each call must match the next expectation exactly; unconsumed
/// expectations fail the test on drop.
#[derive(Default)]
pub struct StaticHandler {
    expected: Vec<Expectation>,
    index: usize,
}

impl StaticHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience function to register the handler with a [`FakeExecutor`].
    pub fn register(mut self, executor: &FakeExecutor) {
        executor.set_handler(Box::new(move |argv| self.execute(argv)));
    }

    /// Expects `command` (space-joined argv) to produce `output`.
    pub fn expect(&mut self, command: impl Into<String>, output: CommandOutput) {
        self.expected.push(Expectation {
            command: command.into(),
            output,
        });
    }

    /// A helper for [`Self::expect`] which quietly succeeds.
    pub fn expect_ok(&mut self, command: impl Into<String>) {
        self.expect(command, CommandOutput::success())
    }

    /// A helper for [`Self::expect`] which quietly fails.
    pub fn expect_fail(&mut self, command: impl Into<String>) {
        self.expect(command, CommandOutput::failure(1))
    }

    fn execute(&mut self, argv: &[String]) -> CommandOutput {
        let observed = command_to_string(argv);
        let expected = self
            .expected
            .get(self.index)
            .unwrap_or_else(|| panic!("Unexpected command: {observed}"));
        self.index += 1;
        assert_eq!(observed, expected.command, "Unexpected input command");
        expected.output.clone()
    }
}

impl Drop for StaticHandler {
    fn drop(&mut self) {
        let expected = self.expected.len();
        let actual = self.index;
        if actual < expected {
            let errmsg = format!(
                "Only saw {actual} calls, expected {expected}\nNext would have been: {}",
                self.expected[actual].command
            );
            if !std::thread::panicking() {
                panic!("{errmsg}");
            } else {
                eprintln!("{errmsg}");
            }
        }
    }
}
