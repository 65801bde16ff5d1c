//! Fetch pipeline orchestration.
//!
//! Coordinates variable resolution, artefact location, constraint checks and
//! the archive fetcher for every file entry of a manifest. Files are handled
//! strictly in manifest order and the first fatal error aborts the run.

use crate::artefact::download::{ArchiveFetcher, FetchOptions};
use crate::artefact::github::ArtefactApi;
use crate::artefact::locator::{LocateContext, locate};
use crate::constraint::check_all;
use crate::error::Result;
use crate::facts::RuntimeFacts;
use crate::manifest::Manifest;
use crate::output::Reporter;
use crate::template::TemplateContext;
use crate::vars::resolve_all;
use camino::Utf8Path;
use log::info;

/// Context for a fetch pipeline run.
pub struct PipelineContext<'a> {
    /// Host facts constraints and templates are evaluated against.
    pub facts: &'a RuntimeFacts,
    /// Client for CI artefact lookups.
    pub api: &'a dyn ArtefactApi,
    /// Download-and-extract collaborator.
    pub fetcher: &'a dyn ArchiveFetcher,
    /// Directory archives are extracted into.
    pub working_dir: &'a Utf8Path,
    /// Current workflow run id, from `GITHUB_RUN_ID`.
    pub run_id: Option<&'a str>,
    /// Whether the fetcher reports download progress.
    pub show_progress: bool,
    /// Resolve and report only; never call the fetcher.
    pub dry_run: bool,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchSummary {
    /// Names of the artefacts downloaded (or, in dry-run mode, that would
    /// have been).
    pub downloaded: Vec<String>,
    /// Names of the artefacts whose constraints failed.
    pub skipped: Vec<String>,
}

/// Fetch every file entry of `manifest`.
///
/// # Errors
///
/// Returns [`crate::error::InstallerError::MissingResourcesSection`] before
/// doing anything else when the manifest has no resources, and otherwise the
/// first error raised while resolving variables, locating a file or fetching
/// it.
pub fn run(
    manifest: &Manifest,
    context: &PipelineContext<'_>,
    reporter: &mut dyn Reporter,
) -> Result<FetchSummary> {
    let resources = manifest.resources()?;
    let substituters = resolve_all(&resources.vars, context.facts, reporter)?;
    let locate_context = LocateContext {
        template: TemplateContext {
            version: &manifest.version,
            facts: context.facts,
            substituters: &substituters,
        },
        api: context.api,
        run_id: context.run_id,
    };
    let options = FetchOptions {
        working_dir: context.working_dir.to_owned(),
        show_progress: context.show_progress,
    };

    let mut summary = FetchSummary::default();
    for file in &resources.files {
        let artefact = locate(file, &locate_context)?;
        if !check_all(file.constraints.as_ref(), context.facts, reporter) {
            reporter.info(&format!(
                "Skipping download for {}: constraints failed",
                artefact.name
            ));
            summary.skipped.push(artefact.name);
            continue;
        }

        if context.dry_run {
            reporter.info(&format!(
                "Would download: {} from {}",
                artefact.name, artefact.url
            ));
        } else {
            reporter.info(&format!("Downloading: {}", artefact.name));
            context.fetcher.fetch_and_extract(&artefact.url, &options)?;
        }
        summary.downloaded.push(artefact.name);
    }

    info!(
        "fetched {} file(s), skipped {}",
        summary.downloaded.len(),
        summary.skipped.len()
    );
    Ok(summary)
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
