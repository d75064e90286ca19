//! Conditional step predicates.
//!
//! A condition string is evaluated against the results of steps that already
//! ran, in execution order.

use crate::core::result::TaskResult;

/// Parsed form of a condition string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Always,
    Never,
    /// Every prior step succeeded. Holds vacuously when nothing ran yet.
    AllSuccess,
    /// At least one prior step failed.
    AnyFailure,
    /// The most recent prior step succeeded. Holds when nothing ran yet.
    LastSuccess,
}

impl Condition {
    /// Parse a condition string. Unknown strings fall back to `LastSuccess`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" => Condition::Always,
            "false" => Condition::Never,
            "all_success" => Condition::AllSuccess,
            "any_failure" => Condition::AnyFailure,
            _ => Condition::LastSuccess,
        }
    }

    pub fn evaluate(&self, prior: &[&TaskResult]) -> bool {
        match self {
            Condition::Always => true,
            Condition::Never => false,
            Condition::AllSuccess => prior.iter().all(|r| r.success),
            Condition::AnyFailure => prior.iter().any(|r| !r.success),
            Condition::LastSuccess => prior.last().map_or(true, |r| r.success),
        }
    }
}

/// Evaluate an optional condition string. A missing condition holds.
pub fn evaluate(condition: Option<&str>, prior: &[&TaskResult]) -> bool {
    condition.map_or(true, |raw| Condition::parse(raw).evaluate(prior))
}
