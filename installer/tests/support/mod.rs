//! Test support utilities for installer behavioural tests.
//!
//! Provides the named manifests the feature files refer to and helpers for
//! laying them out on disk.

use std::path::Path;

/// Returns the JSON of the manifest called `name` in the feature files.
///
/// # Panics
///
/// Panics if no manifest has that name.
pub fn manifest_json(name: &str) -> &'static str {
    match name {
        "platform-gated" => {
            r#"{
                "name": "native",
                "version": "1.0.0",
                "resources": {
                    "vars": {},
                    "files": [{
                        "host": "https://x/",
                        "path": "pkg-${version}-${platform}.tgz",
                        "constraints": {"platform": ["linux"]}
                    }]
                }
            }"#
        }
        "unconstrained" => {
            r#"{
                "version": "1.0.0",
                "resources": {
                    "files": [{"host": "https://example.invalid/", "path": "native-${version}.tar.gz"}]
                }
            }"#
        }
        "ci-artefact" => {
            r#"{
                "version": "1.0.0",
                "resources": {
                    "files": [{
                        "host": "github_artifact://cube-js/cube/actions/build",
                        "name": "native-${platform}-${arch}-${libc}"
                    }]
                }
            }"#
        }
        "no-resources" => r#"{"name": "native", "version": "1.0.0"}"#,
        "unknown-constraint" => {
            r#"{
                "version": "1.0.0",
                "resources": {
                    "files": [{
                        "host": "https://x/",
                        "path": "native.tgz",
                        "constraints": {"libc": ["glibc"]}
                    }]
                }
            }"#
        }
        "python-variable" => {
            r#"{
                "version": "1.0.0",
                "resources": {
                    "vars": {
                        "python": {
                            "value": ["libpython", ["3.12", "3.11"]],
                            "default": "none"
                        }
                    },
                    "files": [{"host": "https://x/", "path": "native-py${python}.tgz"}]
                }
            }"#
        }
        "python-required" => {
            r#"{
                "version": "1.0.0",
                "resources": {
                    "vars": {"python": {"value": ["libpython", ["3.12"]]}},
                    "files": [{"host": "https://x/", "path": "native-py${python}.tgz"}]
                }
            }"#
        }
        other => panic!("no manifest named {other}"),
    }
}

/// Writes the manifest called `name` to `dir/package.json`.
pub fn write_manifest(dir: &Path, name: &str) {
    std::fs::write(dir.join("package.json"), manifest_json(name)).expect("write package.json");
}
