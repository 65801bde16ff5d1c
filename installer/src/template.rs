//! `${token}` substitution for URL, path and artefact-name templates.
//!
//! Every substitution replaces the first occurrence of its token only. A
//! template that repeats a token keeps the later copies verbatim; manifests
//! in the wild depend on this, so it is preserved rather than widened to a
//! global replace.

use crate::facts::RuntimeFacts;

/// A resolved variable bound to its `${name}` token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substituter {
    name: String,
    value: String,
}

impl Substituter {
    /// Bind `value` to the token `${name}`.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Resolved value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Replace the first `${name}` in `template`.
    ///
    /// # Examples
    ///
    /// ```
    /// use native_installer::template::Substituter;
    ///
    /// let python = Substituter::new("python", "3.9");
    /// assert_eq!(python.apply("py${python}-${python}"), "py3.9-${python}");
    /// ```
    #[must_use]
    pub fn apply(&self, template: &str) -> String {
        replace_first(template, &self.name, &self.value)
    }
}

/// Everything a template can refer to.
#[derive(Debug, Clone, Copy)]
pub struct TemplateContext<'a> {
    /// Package version for `${version}`.
    pub version: &'a str,
    /// Host facts for `${platform}`, `${arch}` and `${libc}`.
    pub facts: &'a RuntimeFacts,
    /// Resolved variables, applied in resolution order.
    pub substituters: &'a [Substituter],
}

impl TemplateContext<'_> {
    /// Substitute `${version}`, `${platform}`, `${arch}`, `${libc}` and then
    /// each variable, in that order, one occurrence each.
    ///
    /// # Examples
    ///
    /// ```
    /// use native_installer::facts::{Libc, RuntimeFacts};
    /// use native_installer::template::{Substituter, TemplateContext};
    ///
    /// let facts = RuntimeFacts::new("linux", "x64").with_libc(Libc::Glibc);
    /// let substituters = [Substituter::new("python", "3.11")];
    /// let context = TemplateContext { version: "1.0.0", facts: &facts, substituters: &substituters };
    ///
    /// assert_eq!(
    ///     context.resolve("native-${version}-${platform}-${arch}-${libc}-py${python}.tar.gz"),
    ///     "native-1.0.0-linux-x64-glibc-py3.11.tar.gz"
    /// );
    /// ```
    #[must_use]
    pub fn resolve(&self, template: &str) -> String {
        let resolved = replace_first(template, "version", self.version);
        let resolved = replace_first(&resolved, "platform", self.facts.platform());
        let resolved = replace_first(&resolved, "arch", self.facts.arch());
        let resolved = replace_first(&resolved, "libc", self.facts.libc().as_str());
        self.substituters
            .iter()
            .fold(resolved, |acc, substituter| substituter.apply(&acc))
    }
}

fn replace_first(template: &str, name: &str, value: &str) -> String {
    template.replacen(&format!("${{{name}}}"), value, 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::Libc;
    use rstest::rstest;

    fn context<'a>(facts: &'a RuntimeFacts, substituters: &'a [Substituter]) -> TemplateContext<'a> {
        TemplateContext {
            version: "1.0.0",
            facts,
            substituters,
        }
    }

    #[rstest]
    #[case::every_token_once(
        "${version}/${platform}/${arch}/${libc}",
        "1.0.0/darwin/arm64/unknown"
    )]
    #[case::duplicate_token_is_partial("${platform}-${platform}", "darwin-${platform}")]
    #[case::unknown_token_untouched("${missing}-${arch}", "${missing}-arm64")]
    #[case::no_tokens("plain.tar.gz", "plain.tar.gz")]
    fn resolves_builtin_tokens(#[case] template: &str, #[case] expected: &str) {
        let facts = RuntimeFacts::new("darwin", "arm64");
        assert_eq!(context(&facts, &[]).resolve(template), expected);
    }

    #[test]
    fn builtins_apply_before_variables() {
        // A variable whose value contains a builtin token is not expanded
        // again, because builtins have already run.
        let facts = RuntimeFacts::new("linux", "x64").with_libc(Libc::Musl);
        let substituters = [Substituter::new("suffix", "${arch}")];
        assert_eq!(
            context(&facts, &substituters).resolve("pkg-${suffix}-${libc}"),
            "pkg-${arch}-musl"
        );
    }

    #[test]
    fn variables_apply_in_resolution_order() {
        let facts = RuntimeFacts::new("linux", "x64");
        let substituters = [
            Substituter::new("first", "${second}"),
            Substituter::new("second", "done"),
        ];
        assert_eq!(context(&facts, &substituters).resolve("${first}"), "done");
    }

    #[test]
    fn variable_token_replaced_once() {
        let facts = RuntimeFacts::new("linux", "x64");
        let substituters = [Substituter::new("py", "3.9")];
        assert_eq!(
            context(&facts, &substituters).resolve("${py}/${py}"),
            "3.9/${py}"
        );
    }
}
