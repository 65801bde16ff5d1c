//! Variable resolution.
//!
//! Each declared variable becomes a [`Substituter`]. Its `value` directive
//! is consulted only when the variable's constraints pass; otherwise, or when
//! the directive yields nothing, the declared `default` is used. A variable
//! with neither aborts the run.

use crate::constraint::check_all;
use crate::error::{InstallerError, Result};
use crate::facts::RuntimeFacts;
use crate::manifest::{VariableSpec, VariableValue, Variables};
use crate::output::Reporter;
use crate::template::Substituter;
use log::debug;

/// Resolve every variable in declaration order.
///
/// # Errors
///
/// Returns [`InstallerError::UnresolvableVariable`] for the first variable
/// that has no value and no default.
pub fn resolve_all(
    vars: &Variables,
    facts: &RuntimeFacts,
    reporter: &mut dyn Reporter,
) -> Result<Vec<Substituter>> {
    vars.iter()
        .map(|(name, spec)| resolve_variable(name, spec, facts, reporter))
        .collect()
}

/// Resolve a single variable.
///
/// # Errors
///
/// Returns [`InstallerError::UnresolvableVariable`] when neither the value
/// directive nor a default produces a value.
pub fn resolve_variable(
    name: &str,
    spec: &VariableSpec,
    facts: &RuntimeFacts,
    reporter: &mut dyn Reporter,
) -> Result<Substituter> {
    let resolved = if check_all(spec.constraints.as_ref(), facts, reporter) {
        spec.value
            .as_ref()
            .and_then(|value| resolve_value(value, facts, reporter))
            .filter(|value| !value.is_empty())
    } else {
        debug!("variable {name}: constraints failed");
        None
    };

    let value = resolved
        .or_else(|| spec.default.clone())
        .ok_or_else(|| InstallerError::UnresolvableVariable {
            name: name.to_owned(),
        })?;
    debug!("variable {name} = {value}");
    Ok(Substituter::new(name, value))
}

/// Evaluate a value directive; `None` means unresolved.
pub fn resolve_value(
    value: &VariableValue,
    facts: &RuntimeFacts,
    reporter: &mut dyn Reporter,
) -> Option<String> {
    match value {
        VariableValue::LibpythonProbe { versions } => versions
            .iter()
            .find(|version| facts.library_exists(&format!("libpython{version}")))
            .cloned(),
        VariableValue::LibcProbe => Some(facts.libc().as_str().to_owned()),
        VariableValue::Unknown { raw } => {
            reporter.warning(&format!("Unable to resolve value, unknown value {raw}"));
            None
        }
    }
}
