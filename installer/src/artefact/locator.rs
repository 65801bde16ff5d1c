//! Turns a manifest file entry into a concrete download location.
//!
//! Hosts come in two flavours. `http://` and `https://` hosts are joined
//! with the entry's path and templated directly. `github_artifact://` hosts
//! name an artefact uploaded by the current CI workflow run, which has to be
//! looked up through the GitHub API before its archive URL is known.

use std::sync::OnceLock;

use log::debug;
use regex::Regex;

use super::github::ArtefactApi;
use crate::error::{InstallerError, Result};
use crate::manifest::FileSpec;
use crate::template::TemplateContext;

/// Scheme prefix of CI artefact hosts.
pub const GITHUB_ARTEFACT_SCHEME: &str = "github_artifact://";

/// Environment variable naming the current workflow run.
pub const RUN_ID_ENV: &str = "GITHUB_RUN_ID";

/// How a file entry's host is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// Plain HTTP(S) host; the URL is `host + path`.
    Http,
    /// Artefact uploaded by a GitHub Actions workflow run.
    GithubArtefact {
        /// Repository owner.
        owner: String,
        /// Repository name.
        repo: String,
        /// Workflow segment of the host. Informational only; the lookup is
        /// scoped by run id.
        workflow: String,
    },
}

impl Locator {
    /// Classify `host`.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::MalformedArtefactUrl`] for a
    /// `github_artifact://` host that does not have the
    /// `owner/repo/actions/workflow` layout, and
    /// [`InstallerError::UnsupportedProtocol`] for any other scheme.
    ///
    /// # Examples
    ///
    /// ```
    /// use native_installer::artefact::locator::Locator;
    ///
    /// assert_eq!(Locator::parse("https://example.com/")?, Locator::Http);
    /// let Locator::GithubArtefact { owner, repo, .. } =
    ///     Locator::parse("github_artifact://cube-js/cube/actions/build")?
    /// else {
    ///     unreachable!();
    /// };
    /// assert_eq!((owner.as_str(), repo.as_str()), ("cube-js", "cube"));
    /// # Ok::<(), native_installer::error::InstallerError>(())
    /// ```
    pub fn parse(host: &str) -> Result<Self> {
        if host.starts_with(GITHUB_ARTEFACT_SCHEME) {
            let captures = artefact_pattern()
                .and_then(|pattern| pattern.captures(host))
                .ok_or_else(|| InstallerError::MalformedArtefactUrl {
                    host: host.to_owned(),
                })?;
            return Ok(Self::GithubArtefact {
                owner: captures["owner"].to_owned(),
                repo: captures["repo"].to_owned(),
                workflow: captures["workflow"].to_owned(),
            });
        }
        if host.starts_with("http://") || host.starts_with("https://") {
            return Ok(Self::Http);
        }
        Err(InstallerError::UnsupportedProtocol {
            host: host.to_owned(),
        })
    }
}

fn artefact_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(
                r"^github_artifact://(?<owner>[a-z-]+)/(?<repo>[a-z-]+)/actions/(?<workflow>[a-zA-Z$\{\}]+)",
            )
            .ok()
        })
        .as_ref()
}

/// Final download location of one file entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArtefact {
    /// Fully substituted download URL.
    pub url: String,
    /// Name used in progress messages. For HTTP hosts this is the URL.
    pub name: String,
}

/// Inputs shared by every [`locate`] call in a run.
#[derive(Clone, Copy)]
pub struct LocateContext<'a> {
    /// Template substitutions.
    pub template: TemplateContext<'a>,
    /// Client for CI artefact lookups.
    pub api: &'a dyn ArtefactApi,
    /// Current workflow run id, from `GITHUB_RUN_ID`.
    pub run_id: Option<&'a str>,
}

/// Resolve `file` to a download URL.
///
/// # Errors
///
/// Propagates [`Locator::parse`] failures. CI artefact hosts additionally
/// fail with [`InstallerError::MissingCiEnvironment`] when no run id is
/// known, [`InstallerError::MissingArtefactName`] when the entry has no
/// `name`, [`InstallerError::ArtefactNotFound`] when the run has no artefact
/// with the resolved name, or [`InstallerError::Api`] when a request fails.
pub fn locate(file: &FileSpec, ctx: &LocateContext<'_>) -> Result<ResolvedArtefact> {
    match Locator::parse(&file.host)? {
        Locator::Http => {
            let url = ctx.template.resolve(&format!("{}{}", file.host, file.path));
            debug!("resolved {} to {url}", file.host);
            Ok(ResolvedArtefact {
                name: url.clone(),
                url,
            })
        }
        Locator::GithubArtefact { owner, repo, .. } => {
            locate_github_artefact(file, &owner, &repo, ctx)
        }
    }
}

fn locate_github_artefact(
    file: &FileSpec,
    owner: &str,
    repo: &str,
    ctx: &LocateContext<'_>,
) -> Result<ResolvedArtefact> {
    let run_id = ctx.run_id.ok_or(InstallerError::MissingCiEnvironment {
        variable: RUN_ID_ENV,
    })?;
    let name_template = file
        .name
        .as_deref()
        .ok_or_else(|| InstallerError::MissingArtefactName {
            host: file.host.clone(),
        })?;

    let artefacts = ctx.api.list_run_artefacts(owner, repo, run_id)?;
    let name = ctx.template.resolve(name_template);
    let artefact = artefacts
        .iter()
        .find(|artefact| artefact.name == name)
        .ok_or_else(|| InstallerError::ArtefactNotFound { name: name.clone() })?;
    debug!("artefact {name} has id {}", artefact.id);

    let url = ctx.api.archive_url(owner, repo, artefact.id)?;
    Ok(ResolvedArtefact { url, name })
}
