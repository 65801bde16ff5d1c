//! Artefact location, download and extraction.
//!
//! # Sub-modules
//!
//! - [`locator`] - Resolves a manifest file entry to a download URL.
//! - [`github`] - GitHub Actions artefact API client.
//! - [`download`] - Archive download trait and HTTP implementation.
//! - [`extraction`] - Archive extraction with path traversal protection.

pub mod download;
pub mod extraction;
pub mod github;
pub mod locator;
