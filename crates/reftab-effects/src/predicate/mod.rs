//! Row predicates for mode selection.
//!
//! A predicate decides whether one table cell satisfies the value a dataset
//! requests for a mode field.
//!
//! # Module Structure
//!
//! - `value` - Scalar values and the numeric coercion ladder
//! - `options` - Predicate options (wildcards, case_sensitive)
//! - `matcher` - Comparison specs, targets and the equality predicate

mod matcher;
mod options;
mod value;

pub use matcher::{matches_equal, CompiledComparison, ComparisonSpec, Predicate, Target};
pub use options::{PredicateOptions, DEFAULT_WILDCARD};
pub use value::ScalarValue;
