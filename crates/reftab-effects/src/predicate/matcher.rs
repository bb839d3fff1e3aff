//! Row predicates: how a table cell is compared with a requested mode value.

use super::options::PredicateOptions;
use super::value::ScalarValue;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Comparison operator applied to a mode field.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// Equality (or membership when the target is a set), honoring wildcards.
    #[default]
    Equals,
}

/// Data description of how one mode field is compared.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ComparisonSpec {
    #[serde(default)]
    pub op: Predicate,
    #[serde(flatten)]
    pub options: PredicateOptions,
}

impl ComparisonSpec {
    /// Equality with the given wildcard tokens.
    pub fn equals<I, S>(wildcards: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            op: Predicate::Equals,
            options: PredicateOptions::with_wildcards(wildcards),
        }
    }
}

/// The value a dataset requests for a mode field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Target {
    One(ScalarValue),
    AnyOf(Vec<ScalarValue>),
}

impl Target {
    fn accepts(&self, value: &ScalarValue, case_sensitive: bool) -> bool {
        match self {
            Target::One(target) => value.equals(target, case_sensitive),
            Target::AnyOf(targets) => targets.iter().any(|t| value.equals(t, case_sensitive)),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::One(value) => write!(f, "{value}"),
            Target::AnyOf(values) => {
                let rendered: Vec<String> = values.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", rendered.join(", "))
            }
        }
    }
}

/// Compiled comparison for efficient per-row evaluation.
#[derive(Debug, Clone)]
pub struct CompiledComparison {
    pub op: Predicate,
    /// Wildcard tokens, already coerced
    pub wildcards: Vec<ScalarValue>,
    pub case_sensitive: bool,
}

impl CompiledComparison {
    /// Compile a ComparisonSpec.
    pub fn compile(spec: &ComparisonSpec) -> Self {
        CompiledComparison {
            op: spec.op,
            wildcards: spec
                .options
                .wildcards
                .iter()
                .map(|w| ScalarValue::coerce(w))
                .collect(),
            case_sensitive: spec.options.case_sensitive,
        }
    }

    /// Check whether a (coerced) table cell satisfies the target.
    pub fn matches(&self, table_value: &ScalarValue, target: &Target) -> bool {
        match self.op {
            Predicate::Equals => {
                matches_equal(table_value, target, &self.wildcards, self.case_sensitive)
            }
        }
    }
}

/// Equality with wildcard support.
///
/// A cell equal to any wildcard token matches unconditionally; otherwise the
/// cell must equal the target, or be a member of it when it is a set.
pub fn matches_equal(
    table_value: &ScalarValue,
    target: &Target,
    wildcards: &[ScalarValue],
    case_sensitive: bool,
) -> bool {
    if wildcards
        .iter()
        .any(|w| table_value.equals(w, case_sensitive))
    {
        return true;
    }
    target.accepts(table_value, case_sensitive)
}
