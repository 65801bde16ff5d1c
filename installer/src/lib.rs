//! Native installer library.
//!
//! This crate resolves the `resources` section of a package manifest against
//! the host it runs on and downloads the matching native artefacts. It is
//! used by the `native-installer` CLI binary and can be consumed
//! programmatically for testing or custom installation workflows.
//!
//! # Modules
//!
//! - [`artefact`] - Artefact location, download and extraction
//! - [`cli`] - Command-line argument definitions
//! - [`constraint`] - Constraint evaluation against runtime facts
//! - [`error`] - Semantic error types
//! - [`exec`] - External command execution abstraction
//! - [`facts`] - Host platform, architecture, libc and library detection
//! - [`manifest`] - Manifest schema and loading
//! - [`output`] - Progress reporting and error rendering
//! - [`pipeline`] - Per-file fetch orchestration
//! - [`template`] - `${token}` substitution
//! - [`vars`] - Variable resolution

pub mod artefact;
pub mod cli;
pub mod constraint;
pub mod error;
pub mod exec;
pub mod facts;
pub mod manifest;
pub mod output;
pub mod pipeline;
pub mod template;
#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
pub mod vars;
