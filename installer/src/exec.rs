//! External command execution.
//!
//! Host probes (libc family, installed shared libraries) shell out to system
//! tools. Routing them through [`CommandExecutor`] lets tests substitute
//! canned output.

use crate::error::{InstallerError, Result};
use std::process::{Command, Output};

/// Abstraction for running external commands.
pub trait CommandExecutor {
    /// Runs a command with arguments and returns the captured output.
    ///
    /// A non-zero exit status is not an error; callers inspect
    /// `output.status` themselves.
    ///
    /// # Errors
    ///
    /// Returns any I/O errors encountered while spawning or running the command.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use native_installer::exec::{CommandExecutor, SystemCommandExecutor};
    ///
    /// let executor = SystemCommandExecutor;
    /// let output = executor.run("ldd", &["--version"])?;
    /// assert!(!output.stdout.is_empty() || !output.stderr.is_empty());
    /// # Ok::<(), native_installer::error::InstallerError>(())
    /// ```
    fn run(&self, cmd: &str, args: &[&str]) -> Result<Output>;
}

/// Executes commands on the host system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandExecutor;

impl CommandExecutor for SystemCommandExecutor {
    fn run(&self, cmd: &str, args: &[&str]) -> Result<Output> {
        Command::new(cmd)
            .args(args)
            .output()
            .map_err(InstallerError::from)
    }
}

/// Run a command and return its stdout and stderr as one lossy string.
///
/// Returns `None` when the command cannot be spawned.
pub(crate) fn combined_output(
    executor: &dyn CommandExecutor,
    cmd: &str,
    args: &[&str],
) -> Option<String> {
    let output = executor.run(cmd, args).ok()?;
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    Some(text)
}
