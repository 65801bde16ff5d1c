//! Manifest schema for native resource downloads.
//!
//! The manifest lives in the package's `package.json`: the top-level
//! `version` field plus a `resources` section listing substitution
//! variables and candidate files. Mapping order is significant (variables
//! substitute in declaration order, constraints short-circuit in
//! declaration order), so the mappings deserialize into ordered vectors
//! rather than hash maps.

use crate::error::{InstallerError, Result};
use camino::Utf8Path;
use serde::de::{Deserializer, IgnoredAny, MapAccess, Visitor};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;

/// The parts of `package.json` the installer reads.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Manifest {
    /// Package version, substituted for `${version}`. Required.
    pub version: String,
    /// The resources section; absent in packages without native files.
    #[serde(default)]
    pub resources: Option<Resources>,
}

impl Manifest {
    /// Return the resources section.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::MissingResourcesSection`] when the manifest
    /// has none.
    pub fn resources(&self) -> Result<&Resources> {
        self.resources
            .as_ref()
            .ok_or(InstallerError::MissingResourcesSection)
    }
}

/// Variables and files declared under `resources`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Resources {
    /// Substitution variables in declaration order.
    #[serde(default)]
    pub vars: Variables,
    /// Candidate files in download order.
    #[serde(default)]
    pub files: Vec<FileSpec>,
}

/// Ordered mapping of variable name to [`VariableSpec`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Variables(Vec<(String, VariableSpec)>);

impl Variables {
    /// Iterate over `(name, spec)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &VariableSpec)> {
        self.0.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    /// Whether no variables are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<(String, VariableSpec)>> for Variables {
    fn from(entries: Vec<(String, VariableSpec)>) -> Self {
        Self(entries)
    }
}

impl<'de> Deserialize<'de> for Variables {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer
            .deserialize_map(OrderedMapVisitor(PhantomData))
            .map(Self)
    }
}

/// A substitution variable.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct VariableSpec {
    /// Constraints gating the `value` directive.
    #[serde(default)]
    pub constraints: Option<Constraints>,
    /// How to compute the value when the constraints pass. Falsy JSON
    /// (`null`, `false`, `0`, `""`) counts as no directive.
    #[serde(default, deserialize_with = "truthy_directive")]
    pub value: Option<VariableValue>,
    /// Fallback used when the constraints fail or the value is unresolved.
    #[serde(default)]
    pub default: Option<String>,
}

/// A value directive.
///
/// # Examples
///
/// ```
/// use native_installer::manifest::VariableValue;
/// use serde_json::json;
///
/// let probe = VariableValue::from(json!(["libpython", ["3.9", "3.10"]]));
/// assert_eq!(
///     probe,
///     VariableValue::LibpythonProbe { versions: vec!["3.9".to_owned(), "3.10".to_owned()] }
/// );
/// assert_eq!(VariableValue::from(json!("libc")), VariableValue::LibcProbe);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "Value")]
pub enum VariableValue {
    /// `["libpython", [versions...]]`: the first version whose
    /// `libpython{version}` shared library is installed.
    LibpythonProbe {
        /// Candidate versions in preference order.
        versions: Vec<String>,
    },
    /// `"libc"`: the detected libc family.
    LibcProbe,
    /// Any other directive; resolves to nothing with a warning.
    Unknown {
        /// The directive as written in the manifest.
        raw: String,
    },
}

impl From<Value> for VariableValue {
    fn from(value: Value) -> Self {
        match &value {
            Value::String(kind) if kind == "libc" => Self::LibcProbe,
            Value::Array(items) => match items.as_slice() {
                [Value::String(kind), Value::Array(versions)] if kind == "libpython" => {
                    Self::LibpythonProbe {
                        versions: versions.iter().map(json_text).collect(),
                    }
                }
                _ => Self::Unknown {
                    raw: json_text(&value),
                },
            },
            _ => Self::Unknown {
                raw: json_text(&value),
            },
        }
    }
}

fn truthy_directive<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<VariableValue>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.filter(is_truthy).map(VariableValue::from))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Render a JSON value as text, without quotes around strings.
fn json_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// A single named constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// Passes when the platform is listed.
    Platform(Vec<String>),
    /// Passes when the architecture is listed.
    Arch(Vec<String>),
    /// Passes when `"{platform}-{arch}"` is listed.
    PlatformArch(Vec<String>),
    /// A constraint this installer does not understand; always fails.
    Unknown {
        /// The constraint name as written in the manifest.
        name: String,
    },
}

impl Constraint {
    /// The name the constraint is keyed by in the manifest.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Platform(_) => "platform",
            Self::Arch(_) => "arch",
            Self::PlatformArch(_) => "platform-arch",
            Self::Unknown { name } => name,
        }
    }
}

/// Ordered constraint section of a variable or file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Constraints(Vec<Constraint>);

impl Constraints {
    /// Iterate over constraints in declaration order.
    pub fn iter(&self) -> std::slice::Iter<'_, Constraint> {
        self.0.iter()
    }
}

impl From<Vec<Constraint>> for Constraints {
    fn from(constraints: Vec<Constraint>) -> Self {
        Self(constraints)
    }
}

impl<'de> Deserialize<'de> for Constraints {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(ConstraintsVisitor)
    }
}

struct ConstraintsVisitor;

impl<'de> Visitor<'de> for ConstraintsVisitor {
    type Value = Constraints;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a map of constraint names to arguments")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Constraints, A::Error> {
        let mut constraints = Vec::new();
        while let Some(name) = map.next_key::<String>()? {
            let constraint = match name.as_str() {
                "platform" => Constraint::Platform(map.next_value()?),
                "arch" => Constraint::Arch(map.next_value()?),
                "platform-arch" => Constraint::PlatformArch(map.next_value()?),
                _ => {
                    map.next_value::<IgnoredAny>()?;
                    Constraint::Unknown { name }
                }
            };
            constraints.push(constraint);
        }
        Ok(Constraints(constraints))
    }
}

/// Visitor collecting a JSON object into `(key, value)` pairs in order.
struct OrderedMapVisitor<V>(PhantomData<V>);

impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedMapVisitor<V> {
    type Value = Vec<(String, V)>;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a map")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Self::Value, A::Error> {
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some(entry) = map.next_entry::<String, V>()? {
            entries.push(entry);
        }
        Ok(entries)
    }
}

/// A candidate download.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FileSpec {
    /// `http(s)://` prefix or `github_artifact://owner/repo/actions/workflow`.
    pub host: String,
    /// Path template appended to an HTTP host.
    #[serde(default)]
    pub path: String,
    /// Artefact name template, required for `github_artifact://` hosts.
    #[serde(default)]
    pub name: Option<String>,
    /// Constraints gating the download.
    #[serde(default)]
    pub constraints: Option<Constraints>,
}

/// Read and parse the manifest at `path`.
///
/// # Errors
///
/// Returns [`InstallerError::ManifestRead`] if the file cannot be read and
/// [`InstallerError::ManifestParse`] if it is not a valid manifest.
pub fn load_manifest(path: &Utf8Path) -> Result<Manifest> {
    let contents = std::fs::read_to_string(path).map_err(|source| InstallerError::ManifestRead {
        path: path.to_owned(),
        source,
    })?;
    parse_manifest(&contents, path)
}

/// Parse manifest JSON; `path` is only used in error messages.
///
/// # Errors
///
/// Returns [`InstallerError::ManifestParse`] on malformed JSON, a missing
/// `version`, or fields of the wrong shape.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use native_installer::manifest::parse_manifest;
///
/// let json = r#"{"name":"pkg","version":"1.0.0","resources":{"files":[]}}"#;
/// let manifest = parse_manifest(json, Utf8Path::new("package.json")).expect("valid manifest");
/// assert_eq!(manifest.version, "1.0.0");
/// assert!(manifest.resources.is_some());
/// ```
pub fn parse_manifest(json: &str, path: &Utf8Path) -> Result<Manifest> {
    serde_json::from_str(json).map_err(|e| InstallerError::ManifestParse {
        path: path.to_owned(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
#[path = "manifest_tests.rs"]
mod tests;
