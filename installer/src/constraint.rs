//! Constraint evaluation against [`RuntimeFacts`].
//!
//! Unknown constraint names fail closed: they produce a warning and are
//! treated as not satisfied.

use crate::facts::RuntimeFacts;
use crate::manifest::{Constraint, Constraints};
use crate::output::Reporter;
use log::debug;

/// Evaluate one constraint.
///
/// # Examples
///
/// ```
/// use native_installer::constraint::evaluate;
/// use native_installer::facts::RuntimeFacts;
/// use native_installer::manifest::Constraint;
/// use native_installer::output::StreamReporter;
///
/// let facts = RuntimeFacts::new("linux", "arm64");
/// let mut reporter = StreamReporter::new(Vec::new(), false);
/// let constraint = Constraint::PlatformArch(vec!["linux-arm64".to_owned()]);
/// assert!(evaluate(&constraint, &facts, &mut reporter));
/// ```
pub fn evaluate(constraint: &Constraint, facts: &RuntimeFacts, reporter: &mut dyn Reporter) -> bool {
    match constraint {
        Constraint::Platform(allowed) => contains(allowed, facts.platform()),
        Constraint::Arch(allowed) => contains(allowed, facts.arch()),
        Constraint::PlatformArch(allowed) => contains(allowed, &facts.platform_arch()),
        Constraint::Unknown { name } => {
            reporter.warning(&format!("Unknown constraint name: {name}, pass: false"));
            false
        }
    }
}

/// Evaluate a constraint section: all constraints must pass, checked in
/// declaration order and stopping at the first failure. An absent section
/// passes.
pub fn check_all(
    constraints: Option<&Constraints>,
    facts: &RuntimeFacts,
    reporter: &mut dyn Reporter,
) -> bool {
    constraints.is_none_or(|section| {
        section.iter().all(|constraint| {
            let passed = evaluate(constraint, facts, reporter);
            if !passed {
                debug!("constraint {} not satisfied", constraint.name());
            }
            passed
        })
    })
}

fn contains(allowed: &[String], value: &str) -> bool {
    allowed.iter().any(|candidate| candidate == value)
}
