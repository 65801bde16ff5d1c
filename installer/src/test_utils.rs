//! Shared test utilities for the installer crate.
//!
//! Exposed to integration tests through the `test-support` feature.

use crate::error::{InstallerError, Result};
use crate::exec::CommandExecutor;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::process::{ExitStatus, Output};

/// Creates an `ExitStatus` from an exit code (Unix implementation).
#[cfg(unix)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(code << 8)
}

/// Creates an `ExitStatus` from an exit code (Windows implementation).
#[cfg(windows)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;

    ExitStatus::from_raw(code as u32)
}

/// Creates a successful command `Output` with the given stdout.
pub fn output_with(stdout: &str) -> Output {
    Output {
        status: exit_status(0),
        stdout: stdout.as_bytes().to_vec(),
        stderr: Vec::new(),
    }
}

/// Creates a failed command `Output` with the given stderr message.
pub fn failure_output(stderr: &str) -> Output {
    Output {
        status: exit_status(1),
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

/// Represents an expected command invocation for testing.
#[derive(Debug)]
pub struct ExpectedCall {
    /// The command to execute (e.g., "ldd").
    pub cmd: &'static str,
    /// The arguments to pass to the command.
    pub args: Vec<&'static str>,
    /// The result to return when this command is invoked.
    pub result: Result<Output>,
}

/// A stub implementation of `CommandExecutor` for testing.
///
/// Replays expected command invocations in order. A call that does not
/// match the next expectation fails with [`InstallerError::StubMismatch`],
/// which host probes treat like a command that could not be spawned, and is
/// recorded so that [`StubExecutor::assert_finished`] still fails the test.
#[derive(Debug)]
pub struct StubExecutor {
    expected: RefCell<VecDeque<ExpectedCall>>,
    mismatches: RefCell<Vec<String>>,
}

impl StubExecutor {
    /// Creates a new `StubExecutor` with the given expected calls.
    pub fn new(expected: Vec<ExpectedCall>) -> Self {
        Self {
            expected: RefCell::new(expected.into()),
            mismatches: RefCell::new(Vec::new()),
        }
    }

    /// Asserts that every expected invocation was consumed and that no
    /// unexpected invocation was made.
    ///
    /// # Panics
    ///
    /// Panics if expected calls remain or any call did not match.
    pub fn assert_finished(&self) {
        let mismatches = self.mismatches.borrow();
        assert!(
            mismatches.is_empty(),
            "unexpected command invocations: {mismatches:?}"
        );
        assert!(
            self.expected.borrow().is_empty(),
            "expected no further command invocations"
        );
    }

    fn mismatch(&self, message: String) -> InstallerError {
        self.mismatches.borrow_mut().push(message.clone());
        InstallerError::StubMismatch { message }
    }
}

impl CommandExecutor for StubExecutor {
    fn run(&self, cmd: &str, args: &[&str]) -> Result<Output> {
        let mut expected = self.expected.borrow_mut();
        let Some(call) = expected.pop_front() else {
            return Err(self.mismatch(format!(
                "unexpected invocation: {cmd} {}",
                args.join(" ")
            )));
        };

        if call.cmd != cmd || call.args.as_slice() != args {
            return Err(self.mismatch(format!(
                "expected `{} {}`, got `{cmd} {}`",
                call.cmd,
                call.args.join(" "),
                args.join(" ")
            )));
        }

        call.result
    }
}
