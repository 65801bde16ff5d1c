//! User-facing diagnostics.
//!
//! Progress lines and warnings go through the [`Reporter`] trait so the
//! resolver can be driven without a terminal. Fatal errors are rendered once
//! by [`error_banner`] in the binary's top-level handler.

use std::error::Error;
use std::fmt::Display;
use std::io::Write;

/// Context label prefixed to fatal error output.
pub const ERROR_CONTEXT: &str = "Native Installer";

/// Sink for progress messages and non-fatal warnings.
pub trait Reporter {
    /// Report a progress line. Suppressed in quiet mode.
    fn info(&mut self, message: &str);

    /// Report a non-fatal problem. Never suppressed.
    fn warning(&mut self, message: &str);
}

/// [`Reporter`] writing lines to a stream, normally stderr.
///
/// # Examples
///
/// ```
/// use native_installer::output::{Reporter, StreamReporter};
///
/// let mut reporter = StreamReporter::new(Vec::new(), true);
/// reporter.info("Downloading: native.tar.gz");
/// reporter.warning("Unknown constraint name: libc, pass: false");
///
/// let text = String::from_utf8(reporter.into_inner()).expect("UTF-8 output");
/// assert_eq!(text, "warning: Unknown constraint name: libc, pass: false\n");
/// ```
#[derive(Debug)]
pub struct StreamReporter<W> {
    writer: W,
    quiet: bool,
}

impl<W: Write> StreamReporter<W> {
    /// Create a reporter over `writer`; `quiet` suppresses info lines.
    pub fn new(writer: W, quiet: bool) -> Self {
        Self { writer, quiet }
    }

    /// Consume the reporter and return the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Reporter for StreamReporter<W> {
    fn info(&mut self, message: &str) {
        if !self.quiet {
            write_stderr_line(&mut self.writer, message);
        }
    }

    fn warning(&mut self, message: &str) {
        write_stderr_line(&mut self.writer, format!("warning: {message}"));
    }
}

/// Render a fatal error with its source chain.
///
/// # Examples
///
/// ```
/// use native_installer::error::InstallerError;
/// use native_installer::output::error_banner;
///
/// let banner = error_banner(&InstallerError::MissingResourcesSection);
/// assert!(banner.starts_with("Native Installer: please define a resources section"));
/// ```
#[must_use]
pub fn error_banner(err: &(dyn Error + 'static)) -> String {
    let mut banner = format!("{ERROR_CONTEXT}: {err}");
    let mut source = err.source();
    while let Some(cause) = source {
        banner.push_str(&format!("\n  caused by: {cause}"));
        source = cause.source();
    }
    banner
}

/// Write one line, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort logging; ignore write failures.
    }
}
