//! Download-and-extract primitive for resolved artefact URLs.
//!
//! Provides a trait-based abstraction over fetching an archive and unpacking
//! it into the package's working directory, enabling dependency injection
//! for testing.

use camino::Utf8PathBuf;
use log::debug;
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

use super::extraction::{ExtractionError, extract_archive};
use crate::output::write_stderr_line;

/// Network timeout for artefact downloads.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// Options passed to every [`ArchiveFetcher::fetch_and_extract`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    /// Directory the archive is extracted into.
    pub working_dir: Utf8PathBuf,
    /// Whether download progress is reported on stderr.
    pub show_progress: bool,
}

/// Trait for downloading an archive and extracting it in place.
///
/// # Examples
///
/// ```no_run
/// use camino::Utf8PathBuf;
/// use native_installer::artefact::download::{ArchiveFetcher, FetchOptions, HttpArchiveFetcher};
///
/// let options = FetchOptions {
///     working_dir: Utf8PathBuf::from("."),
///     show_progress: true,
/// };
/// HttpArchiveFetcher.fetch_and_extract("https://example.com/native.tar.gz", &options)?;
/// # Ok::<(), native_installer::artefact::download::FetchError>(())
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait ArchiveFetcher {
    /// Download the archive at `url` and extract it into
    /// `options.working_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the download, the format detection or the
    /// extraction fails.
    fn fetch_and_extract(&self, url: &str, options: &FetchOptions) -> Result<(), FetchError>;
}

/// Errors arising from download-and-extract operations.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// HTTP request failed.
    #[error("download failed for {url}: {reason}")]
    Http {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The server answered 404.
    #[error("download failed for {url}: not found")]
    NotFound {
        /// The URL that returned 404.
        url: String,
    },

    /// I/O error writing the downloaded file.
    #[error("I/O error writing download: {0}")]
    Io(#[from] std::io::Error),

    /// The downloaded archive could not be extracted.
    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractionError),
}

/// HTTP-based fetcher using `ureq`.
///
/// The archive is streamed to a temporary file, its format is sniffed, and
/// it is extracted into the working directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpArchiveFetcher;

impl ArchiveFetcher for HttpArchiveFetcher {
    fn fetch_and_extract(&self, url: &str, options: &FetchOptions) -> Result<(), FetchError> {
        let temp_dir = tempfile::tempdir()?;
        let archive_path = temp_dir.path().join("download");

        let bytes = download_to_file(url, &archive_path)?;
        debug!("downloaded {bytes} bytes from {url}");
        if options.show_progress {
            write_stderr_line(
                &mut std::io::stderr(),
                format!("Downloaded {} from {url}", human_size(bytes)),
            );
        }

        std::fs::create_dir_all(options.working_dir.as_std_path())?;
        let files = extract_archive(&archive_path, options.working_dir.as_std_path())?;
        debug!("extracted {} file(s) into {}", files.len(), options.working_dir);
        Ok(())
    }
}

/// Download a URL and write the body to a file, returning the byte count.
fn download_to_file(url: &str, dest: &Path) -> Result<u64, FetchError> {
    let response = http_agent()
        .get(url)
        .call()
        .map_err(|e| map_ureq_error(url, &e))?;
    let mut file = std::fs::File::create(dest)?;
    let bytes = std::io::copy(&mut response.into_body().as_reader(), &mut file)?;
    Ok(bytes)
}

/// Shared `ureq` agent with request timeout configuration.
fn http_agent() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(DOWNLOAD_TIMEOUT))
            .build();
        ureq::Agent::new_with_config(config)
    })
}

/// Map a ureq error to a [`FetchError`].
fn map_ureq_error(url: &str, err: &ureq::Error) -> FetchError {
    match err {
        ureq::Error::StatusCode(404) => FetchError::NotFound {
            url: url.to_owned(),
        },
        other => FetchError::Http {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}

/// Render a byte count for progress output.
fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 3] = ["KiB", "MiB", "GiB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut whole = bytes;
    let mut unit = "B";
    for next in UNITS {
        if whole < 1024 {
            break;
        }
        whole /= 1024;
        unit = next;
    }
    format!("{whole} {unit}")
}
