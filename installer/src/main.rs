//! Native installer CLI entrypoint.
//!
//! This binary reads a package manifest, resolves its resource templates
//! against the host, and downloads and extracts the matching native
//! artefacts into the package directory.

use camino::Utf8PathBuf;
use clap::Parser;
use log::debug;
use native_installer::artefact::download::HttpArchiveFetcher;
use native_installer::artefact::github::GithubArtefactApi;
use native_installer::artefact::locator::RUN_ID_ENV;
use native_installer::cli::Cli;
use native_installer::error::{InstallerError, Result};
use native_installer::exec::{CommandExecutor, SystemCommandExecutor};
use native_installer::facts::RuntimeFacts;
use native_installer::manifest::load_manifest;
use native_installer::output::{StreamReporter, error_banner, write_stderr_line};
use native_installer::pipeline::{self, FetchSummary, PipelineContext};
use std::io::Write;

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &SystemCommandExecutor, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn init_logging(cli: &Cli) {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(cli.log_level().to_string()),
    )
    .init();
}

fn run(
    cli: &Cli,
    executor: &dyn CommandExecutor,
    stderr: &mut dyn Write,
) -> Result<FetchSummary> {
    let cwd = current_dir()?;
    let manifest_path = cli.resolve_manifest(&cwd);
    let working_dir = cli.resolve_working_dir(&cwd);
    debug!("manifest: {manifest_path}, working directory: {working_dir}");

    let manifest = load_manifest(&manifest_path)?;
    // Host probes spawn processes, so a package without resources never
    // reaches them.
    manifest.resources()?;
    let facts = RuntimeFacts::detect(executor);
    let api = GithubArtefactApi::from_env();
    let run_id = std::env::var(RUN_ID_ENV).ok().filter(|id| !id.is_empty());

    let context = PipelineContext {
        facts: &facts,
        api: &api,
        fetcher: &HttpArchiveFetcher,
        working_dir: &working_dir,
        run_id: run_id.as_deref(),
        show_progress: !cli.quiet,
        dry_run: cli.dry_run,
    };
    let mut reporter = StreamReporter::new(stderr, cli.quiet);
    pipeline::run(&manifest, &context, &mut reporter)
}

fn current_dir() -> Result<Utf8PathBuf> {
    let cwd = std::env::current_dir()?;
    Utf8PathBuf::try_from(cwd).map_err(|e| InstallerError::from(e.into_io_error()))
}

fn exit_code_for_run_result(result: Result<FetchSummary>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(_) => 0,
        Err(err) => {
            write_stderr_line(stderr, error_banner(&err));
            1
        }
    }
}
