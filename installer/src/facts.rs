//! Runtime facts the resolver evaluates constraints against.
//!
//! Facts are gathered once per run by [`RuntimeFacts::detect`] and passed by
//! reference everywhere else, so the resolver never reads process-global
//! state and can be driven with simulated platforms in tests.
//!
//! Platform and architecture use the spelling package manifests are written
//! in (`linux`, `darwin`, `win32`; `x64`, `arm64`, `ia32`), not Rust's
//! `std::env::consts` spelling.

use crate::exec::{CommandExecutor, combined_output};
use log::debug;
use std::collections::BTreeSet;
use std::fmt;

/// Detected C library family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Libc {
    /// GNU C library.
    Glibc,
    /// musl libc.
    Musl,
    /// Not Linux, or not determined.
    #[default]
    Unknown,
}

impl Libc {
    /// The token substituted for `${libc}`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Glibc => "glibc",
            Self::Musl => "musl",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Libc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only description of the host.
///
/// # Examples
///
/// ```
/// use native_installer::facts::{Libc, RuntimeFacts};
///
/// let facts = RuntimeFacts::new("linux", "x64")
///     .with_libc(Libc::Musl)
///     .with_libraries(["libpython3.9.so.1.0"]);
/// assert_eq!(facts.platform_arch(), "linux-x64");
/// assert!(facts.library_exists("libpython3.9"));
/// assert!(!facts.library_exists("libpython3.1"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeFacts {
    platform: String,
    arch: String,
    libc: Libc,
    libraries: BTreeSet<String>,
}

impl RuntimeFacts {
    /// Facts for `platform`/`arch` with unknown libc and no libraries.
    #[must_use]
    pub fn new(platform: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            arch: arch.into(),
            libc: Libc::Unknown,
            libraries: BTreeSet::new(),
        }
    }

    /// Replace the libc family.
    #[must_use]
    pub fn with_libc(mut self, libc: Libc) -> Self {
        self.libc = libc;
        self
    }

    /// Replace the set of installed shared libraries (sonames).
    #[must_use]
    pub fn with_libraries<I, S>(mut self, libraries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.libraries = libraries.into_iter().map(Into::into).collect();
        self
    }

    /// Gather facts from the running host.
    ///
    /// Probe failures degrade to `unknown` libc and an empty library set
    /// rather than aborting the run.
    #[must_use]
    pub fn detect(executor: &dyn CommandExecutor) -> Self {
        let platform = node_platform(std::env::consts::OS);
        let arch = node_arch(std::env::consts::ARCH);
        let facts = Self::new(platform, arch)
            .with_libc(detect_libc(executor, platform))
            .with_libraries(installed_libraries(executor, platform));
        debug!(
            "runtime facts: platform={} arch={} libc={} libraries={}",
            facts.platform,
            facts.arch,
            facts.libc,
            facts.libraries.len()
        );
        facts
    }

    /// Platform identifier, e.g. `linux`.
    #[must_use]
    pub fn platform(&self) -> &str {
        &self.platform
    }

    /// Architecture identifier, e.g. `x64`.
    #[must_use]
    pub fn arch(&self) -> &str {
        &self.arch
    }

    /// `"{platform}-{arch}"`.
    #[must_use]
    pub fn platform_arch(&self) -> String {
        format!("{}-{}", self.platform, self.arch)
    }

    /// Detected libc family.
    #[must_use]
    pub fn libc(&self) -> Libc {
        self.libc
    }

    /// Whether a shared library named `name` is installed.
    ///
    /// `name` matches a soname exactly or as the stem before `.so`, so
    /// `libpython3.9` matches `libpython3.9.so.1.0`.
    #[must_use]
    pub fn library_exists(&self, name: &str) -> bool {
        let stem = format!("{name}.so");
        self.libraries
            .iter()
            .any(|library| library == name || library.starts_with(&stem))
    }
}

/// Map a Rust OS name to the package-manifest platform spelling.
#[must_use]
pub fn node_platform(os: &str) -> &str {
    match os {
        "macos" => "darwin",
        "windows" => "win32",
        "solaris" | "illumos" => "sunos",
        other => other,
    }
}

/// Map a Rust architecture name to the package-manifest spelling.
#[must_use]
pub fn node_arch(arch: &str) -> &str {
    match arch {
        "x86_64" => "x64",
        "aarch64" => "arm64",
        "x86" => "ia32",
        "powerpc64" => "ppc64",
        "loongarch64" => "loong64",
        other => other,
    }
}

fn detect_libc(executor: &dyn CommandExecutor, platform: &str) -> Libc {
    if platform != "linux" {
        return Libc::Unknown;
    }
    combined_output(executor, "ldd", &["--version"])
        .and_then(|text| parse_ldd_version(&text))
        .unwrap_or(if cfg!(target_env = "musl") {
            Libc::Musl
        } else {
            Libc::Glibc
        })
}

/// Classify `ldd --version` output.
fn parse_ldd_version(text: &str) -> Option<Libc> {
    let lower = text.to_ascii_lowercase();
    if lower.contains("musl") {
        Some(Libc::Musl)
    } else if lower.contains("glibc") || lower.contains("gnu libc") {
        Some(Libc::Glibc)
    } else {
        None
    }
}

fn installed_libraries(executor: &dyn CommandExecutor, platform: &str) -> BTreeSet<String> {
    if platform != "linux" {
        return BTreeSet::new();
    }
    ["ldconfig", "/sbin/ldconfig"]
        .into_iter()
        .find_map(|cmd| {
            let output = executor.run(cmd, &["-p"]).ok()?;
            output
                .status
                .success()
                .then(|| parse_ldconfig_cache(&String::from_utf8_lossy(&output.stdout)))
        })
        .unwrap_or_default()
}

/// Extract sonames from `ldconfig -p` output.
fn parse_ldconfig_cache(text: &str) -> BTreeSet<String> {
    text.lines()
        .filter_map(|line| line.split_whitespace().next())
        .filter(|name| name.contains(".so"))
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ExpectedCall, StubExecutor, failure_output, output_with};
    use rstest::rstest;

    const LDCONFIG: &str = "\
1523 libs found in cache `/etc/ld.so.cache'
\tlibpython3.9.so.1.0 (libc6,x86-64) => /lib/x86_64-linux-gnu/libpython3.9.so.1.0
\tlibpython3.9.so (libc6,x86-64) => /lib/x86_64-linux-gnu/libpython3.9.so
\tlibz.so.1 (libc6,x86-64) => /lib/x86_64-linux-gnu/libz.so.1
Cache generated by: ldconfig (GNU libc) stable release version 2.36
";

    #[rstest]
    #[case::macos("macos", "darwin")]
    #[case::windows("windows", "win32")]
    #[case::linux("linux", "linux")]
    #[case::freebsd("freebsd", "freebsd")]
    fn maps_platform_names(#[case] os: &str, #[case] expected: &str) {
        assert_eq!(node_platform(os), expected);
    }

    #[rstest]
    #[case::x64("x86_64", "x64")]
    #[case::arm64("aarch64", "arm64")]
    #[case::ia32("x86", "ia32")]
    #[case::arm("arm", "arm")]
    fn maps_arch_names(#[case] arch: &str, #[case] expected: &str) {
        assert_eq!(node_arch(arch), expected);
    }

    #[rstest]
    #[case::glibc("ldd (Debian GLIBC 2.36-9+deb12u4) 2.36", Some(Libc::Glibc))]
    #[case::gnu("ldd (GNU libc) 2.39", Some(Libc::Glibc))]
    #[case::musl("musl libc (x86_64)\nVersion 1.2.4", Some(Libc::Musl))]
    #[case::other("something else", None)]
    fn classifies_ldd_output(#[case] text: &str, #[case] expected: Option<Libc>) {
        assert_eq!(parse_ldd_version(text), expected);
    }

    #[test]
    fn parses_ldconfig_cache() {
        let libraries = parse_ldconfig_cache(LDCONFIG);
        assert!(libraries.contains("libpython3.9.so.1.0"));
        assert!(libraries.contains("libz.so.1"));
        assert!(!libraries.contains("1523"));
        assert!(!libraries.contains("Cache"));
    }

    #[test]
    fn library_exists_matches_soname_stem() {
        let facts = RuntimeFacts::new("linux", "x64").with_libraries(parse_ldconfig_cache(LDCONFIG));
        assert!(facts.library_exists("libpython3.9"));
        assert!(facts.library_exists("libz.so.1"));
        assert!(!facts.library_exists("libpython3.10"));
    }

    #[test]
    fn non_linux_hosts_have_unknown_libc_without_probing() {
        let executor = StubExecutor::new(Vec::new());
        assert_eq!(detect_libc(&executor, "darwin"), Libc::Unknown);
        assert!(installed_libraries(&executor, "win32").is_empty());
        executor.assert_finished();
    }

    #[test]
    fn musl_ldd_output_on_stderr_is_detected() {
        let executor = StubExecutor::new(vec![ExpectedCall {
            cmd: "ldd",
            args: vec!["--version"],
            result: Ok(failure_output("musl libc (x86_64)\nVersion 1.2.4\n")),
        }]);
        assert_eq!(detect_libc(&executor, "linux"), Libc::Musl);
        executor.assert_finished();
    }

    #[test]
    fn ldconfig_falls_back_to_sbin() {
        let executor = StubExecutor::new(vec![
            ExpectedCall {
                cmd: "ldconfig",
                args: vec!["-p"],
                result: Err(std::io::Error::new(std::io::ErrorKind::NotFound, "not found").into()),
            },
            ExpectedCall {
                cmd: "/sbin/ldconfig",
                args: vec!["-p"],
                result: Ok(output_with(LDCONFIG)),
            },
        ]);
        let libraries = installed_libraries(&executor, "linux");
        assert!(libraries.contains("libz.so.1"));
        executor.assert_finished();
    }
}
