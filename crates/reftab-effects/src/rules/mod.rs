//! Comparison rules per reference-table kind.
//!
//! Each table kind is described by data (a [`RuleSpec`]) rather than code:
//! the mode fields that select a dataset's rows and how each is compared.
//! Supporting a new kind is a registry entry.

mod builtin;
mod registry;
mod spec;
mod stubs;

pub use registry::{builtin_registry, RuleRegistry};
pub use spec::{MetaValueMap, RuleSpec, Substitute, TableKind};
pub use stubs::HeaderStubs;
