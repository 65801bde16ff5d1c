//! CLI argument definitions for the native installer.
//!
//! This module defines the command-line interface using clap. It is separated
//! from the main entrypoint to keep the binary small and focused on
//! orchestration.

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use log::LevelFilter;

/// Manifest file name looked up in the working directory by default.
pub const DEFAULT_MANIFEST: &str = "package.json";

/// Download the native artefacts declared by a package manifest.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "native-installer")]
#[command(version, about)]
#[command(long_about = concat!(
    "Download the native artefacts declared by a package manifest.\n\n",
    "The manifest's resources section lists variables and files. Variables are ",
    "resolved against the host (platform, architecture, libc family, installed ",
    "shared libraries), substituted into each file's URL template, and every ",
    "file whose constraints pass is downloaded and extracted into the working ",
    "directory.",
))]
#[command(after_help = concat!(
    "ENVIRONMENT:\n",
    "  GITHUB_RUN_ID    Workflow run searched by github_artifact:// hosts\n",
    "  GH_TOKEN         Token for GitHub API requests\n",
    "  GITHUB_API_URL   GitHub API base URL [default: https://api.github.com]\n",
    "  RUST_LOG         Log filter, overrides -v\n\n",
    "EXAMPLES:\n",
    "  Install from ./package.json:\n",
    "    $ native-installer\n\n",
    "  Show what would be downloaded:\n",
    "    $ native-installer --dry-run\n\n",
    "  Install into another package directory:\n",
    "    $ native-installer -C node_modules/@cubejs-backend/native",
))]
pub struct Cli {
    /// Manifest to read [default: package.json in the working directory].
    #[arg(short, long, value_name = "FILE")]
    pub manifest: Option<Utf8PathBuf>,

    /// Directory archives are extracted into [default: current directory].
    #[arg(short = 'C', long, value_name = "DIR")]
    pub working_dir: Option<Utf8PathBuf>,

    /// Resolve and report download URLs without downloading.
    #[arg(long)]
    pub dry_run: bool,

    /// Increase log verbosity (repeatable: -v, -vv, -vvv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Suppress progress output (errors and warnings still shown).
    #[arg(short, long, conflicts_with = "verbosity")]
    pub quiet: bool,
}

impl Cli {
    /// Log level selected by `-v`; `RUST_LOG` takes precedence at runtime.
    #[must_use]
    pub fn log_level(&self) -> LevelFilter {
        match self.verbosity {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    /// Extraction directory, relative paths taken from `cwd`.
    #[must_use]
    pub fn resolve_working_dir(&self, cwd: &Utf8Path) -> Utf8PathBuf {
        self.working_dir
            .as_ref()
            .map_or_else(|| cwd.to_owned(), |dir| cwd.join(dir))
    }

    /// Manifest path, relative paths taken from `cwd`.
    #[must_use]
    pub fn resolve_manifest(&self, cwd: &Utf8Path) -> Utf8PathBuf {
        self.manifest.as_ref().map_or_else(
            || self.resolve_working_dir(cwd).join(DEFAULT_MANIFEST),
            |path| cwd.join(path),
        )
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
