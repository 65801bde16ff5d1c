//! Error types for the native installer.
//!
//! Every variant of [`InstallerError`] is fatal to the whole run. Non-fatal
//! conditions (unknown constraint names, unknown value directives) are
//! reported as warnings by the resolver and never reach this type.

use crate::artefact::download::FetchError;
use crate::artefact::github::ApiError;
use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that abort an installation run.
#[derive(Debug, Error)]
pub enum InstallerError {
    /// The manifest file could not be read.
    #[error("failed to read manifest {path}")]
    ManifestRead {
        /// Path of the manifest that was requested.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The manifest file is not valid JSON or has an unexpected shape.
    #[error("invalid manifest {path}: {reason}")]
    ManifestParse {
        /// Path of the rejected manifest.
        path: Utf8PathBuf,
        /// Description of the parse error.
        reason: String,
    },

    /// The manifest has no `resources` section.
    #[error("please define a resources section in the package.json file of the package")]
    MissingResourcesSection,

    /// A variable produced no value and declares no default.
    #[error("unable to resolve variable {name}")]
    UnresolvableVariable {
        /// Name of the variable.
        name: String,
    },

    /// A file host uses neither `http(s)://` nor `github_artifact://`.
    #[error("unsupported protocol in host: {host}")]
    UnsupportedProtocol {
        /// The rejected host string.
        host: String,
    },

    /// A `github_artifact://` host does not match the expected layout.
    #[error("unable to decode url from github_artifact protocol: {host}")]
    MalformedArtefactUrl {
        /// The rejected host string.
        host: String,
    },

    /// A `github_artifact://` file entry has no `name` to look up.
    #[error("a name is required to resolve artefacts from {host}")]
    MissingArtefactName {
        /// The host of the offending file entry.
        host: String,
    },

    /// A CI environment variable required by the artefact locator is unset.
    #[error("environment variable {variable} must be set to resolve CI artefacts")]
    MissingCiEnvironment {
        /// Name of the missing variable.
        variable: &'static str,
    },

    /// The CI run has no artefact with the resolved name.
    #[error("artefact '{name}' doesn't exist")]
    ArtefactNotFound {
        /// The resolved artefact name.
        name: String,
    },

    /// A call to the GitHub API failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Downloading or extracting an archive failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Test stub received an unexpected or mismatched command invocation.
    #[cfg(any(test, feature = "test-support"))]
    #[error("stub mismatch: {message}")]
    StubMismatch {
        /// Description of what was expected versus what was received.
        message: String,
    },
}

/// Result type alias using [`InstallerError`].
pub type Result<T> = std::result::Result<T, InstallerError>;
