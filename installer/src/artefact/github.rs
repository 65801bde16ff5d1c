//! GitHub Actions artefact API client.
//!
//! Lists the artefacts uploaded by a workflow run and resolves the
//! pre-signed archive URL for one of them. The client is reached through the
//! [`ArtefactApi`] trait so the locator can be exercised without network
//! access.

use log::{debug, trace};
use serde::Deserialize;
use std::fmt;
use std::sync::OnceLock;
use std::time::Duration;

/// Public GitHub REST API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Environment variable overriding [`DEFAULT_API_URL`].
pub const API_URL_ENV: &str = "GITHUB_API_URL";

/// Environment variable holding the API token.
pub const TOKEN_ENV: &str = "GH_TOKEN";

const API_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!("native-installer/", env!("CARGO_PKG_VERSION"));

/// Artefacts requested per listing call.
const PAGE_SIZE: u32 = 100;

/// An artefact uploaded by a workflow run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteArtefact {
    /// Numeric artefact identifier.
    pub id: u64,
    /// Name the workflow uploaded the artefact under.
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct ArtefactList {
    artifacts: Vec<RemoteArtefact>,
}

/// Errors arising from GitHub API calls.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request could not be completed or returned an error status.
    #[error("GitHub API request to {url} failed: {reason}")]
    Request {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The response body did not have the expected shape.
    #[error("unexpected GitHub API response from {url}: {reason}")]
    Decode {
        /// The URL that was requested.
        url: String,
        /// Description of the decoding failure.
        reason: String,
    },

    /// The archive endpoint answered without a redirect location.
    #[error("GitHub API returned no archive location for {url}")]
    MissingLocation {
        /// The archive endpoint URL.
        url: String,
    },
}

/// Remote operations needed to resolve a CI artefact.
#[cfg_attr(test, mockall::automock)]
pub trait ArtefactApi {
    /// List the artefacts uploaded by workflow run `run_id` of
    /// `owner/repo`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is malformed.
    fn list_run_artefacts(
        &self,
        owner: &str,
        repo: &str,
        run_id: &str,
    ) -> Result<Vec<RemoteArtefact>, ApiError>;

    /// Resolve the downloadable zip archive URL of artefact `artefact_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or no location is returned.
    fn archive_url(&self, owner: &str, repo: &str, artefact_id: u64) -> Result<String, ApiError>;
}

/// [`ArtefactApi`] implementation backed by the GitHub REST API.
#[derive(Clone)]
pub struct GithubArtefactApi {
    base_url: String,
    token: Option<String>,
}

impl GithubArtefactApi {
    /// Create a client for `base_url`, authenticating with `token` when
    /// given.
    ///
    /// # Examples
    ///
    /// ```
    /// use native_installer::artefact::github::{DEFAULT_API_URL, GithubArtefactApi};
    ///
    /// let api = GithubArtefactApi::new(DEFAULT_API_URL, None);
    /// assert_eq!(api.base_url(), "https://api.github.com");
    /// ```
    #[must_use]
    pub fn new(base_url: &str, token: Option<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            token,
        }
    }

    /// Create a client configured from `GITHUB_API_URL` and `GH_TOKEN`.
    ///
    /// Empty values are treated as unset.
    #[must_use]
    pub fn from_env() -> Self {
        let base_url = non_empty_env(API_URL_ENV).unwrap_or_else(|| DEFAULT_API_URL.to_owned());
        Self::new(&base_url, non_empty_env(TOKEN_ENV))
    }

    /// Return the API base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn list_url(&self, owner: &str, repo: &str, run_id: &str) -> String {
        format!(
            "{}/repos/{owner}/{repo}/actions/runs/{run_id}/artifacts?per_page={PAGE_SIZE}",
            self.base_url
        )
    }

    fn archive_endpoint(&self, owner: &str, repo: &str, artefact_id: u64) -> String {
        format!(
            "{}/repos/{owner}/{repo}/actions/artifacts/{artefact_id}/zip",
            self.base_url
        )
    }

    fn get(
        &self,
        agent: &ureq::Agent,
        url: &str,
    ) -> Result<ureq::http::Response<ureq::Body>, ApiError> {
        let mut request = agent
            .get(url)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .header("User-Agent", USER_AGENT);
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }
        request.call().map_err(|e| ApiError::Request {
            url: url.to_owned(),
            reason: e.to_string(),
        })
    }
}

impl fmt::Debug for GithubArtefactApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GithubArtefactApi")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl ArtefactApi for GithubArtefactApi {
    fn list_run_artefacts(
        &self,
        owner: &str,
        repo: &str,
        run_id: &str,
    ) -> Result<Vec<RemoteArtefact>, ApiError> {
        let url = self.list_url(owner, repo, run_id);
        debug!("listing artefacts: {url}");
        let body = self
            .get(api_agent(), &url)?
            .into_body()
            .read_to_string()
            .map_err(|e| ApiError::Request {
                url: url.clone(),
                reason: e.to_string(),
            })?;
        trace!("artefact listing response: {body}");
        parse_artefact_list(&body).map_err(|e| ApiError::Decode {
            url,
            reason: e.to_string(),
        })
    }

    fn archive_url(&self, owner: &str, repo: &str, artefact_id: u64) -> Result<String, ApiError> {
        let url = self.archive_endpoint(owner, repo, artefact_id);
        debug!("requesting archive location: {url}");
        let response = self.get(redirect_agent(), &url)?;
        response
            .headers()
            .get("location")
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
            .ok_or(ApiError::MissingLocation { url })
    }
}

/// Decode the body of a workflow-run artefact listing.
fn parse_artefact_list(body: &str) -> Result<Vec<RemoteArtefact>, serde_json::Error> {
    let list: ArtefactList = serde_json::from_str(body)?;
    Ok(list.artifacts)
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

/// Shared agent for JSON API calls.
fn api_agent() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(API_TIMEOUT))
            .build();
        ureq::Agent::new_with_config(config)
    })
}

/// Agent that hands 3xx responses back instead of following them, so the
/// archive location can be read from the `Location` header.
fn redirect_agent() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(API_TIMEOUT))
            .max_redirects(0)
            .build();
        ureq::Agent::new_with_config(config)
    })
}
