//! Reference-table effects for calibration reprocessing.
//!
//! When a new version of a tabular reference file is assigned, only the
//! datasets whose rows actually changed need to be reprocessed. This library
//! decides that: for a dataset's mode parameters it selects the matching rows
//! from the old and new tables and compares them, failing safe toward
//! reprocessing whenever equality cannot be proven.
//!
//! # Example
//!
//! ```no_run
//! use reftab_effects::{
//!     builtin_registry, DatasetParameters, ReferenceCache, ReferenceUpdate,
//!     ReprocessingDecision,
//! };
//!
//! let decision = ReprocessingDecision::new(builtin_registry(), ReferenceCache::new("/refs"));
//! let params: DatasetParameters =
//!     [("OPT_ELEM", "G140L"), ("CENWAVE", "1280")].into_iter().collect();
//! let update = ReferenceUpdate {
//!     instrument: "cos".into(),
//!     filekind: "disptab".into(),
//!     old_reference: "x1v17414l_disp.csv".into(),
//!     new_reference: "z2d1925ql_disp.csv".into(),
//! };
//!
//! let reprocess = decision.decide(
//!     "LBYX01010",
//!     &params,
//!     Some("hst_0001.pmap"),
//!     "hst_0002.pmap",
//!     &update,
//! );
//! ```
//!
//! # Module Structure
//!
//! - `predicate` - Row predicates and numeric coercion
//! - `table` - Tables, loaders and mode selection
//! - `rules` - Rule specs, the registry and its built-in catalog
//! - `engine` - Differencing of two table versions
//! - `context` - Locating references through contexts
//! - `decision` - The top-level reprocessing decision
//! - `config` - YAML configuration

pub mod config;
pub mod context;
pub mod decision;
pub mod engine;
pub mod error;
pub mod params;
pub mod predicate;
pub mod rules;
pub mod table;

pub use config::Config;
pub use context::{CachedContext, ContextHandle, ContextResolver, ReferenceCache};
pub use decision::{
    Decision, DecisionReason, ReferenceUpdate, ReprocessingDecision,
    DEFAULT_MEANINGLESS_REFERENCES,
};
pub use engine::{evaluate, DifferencingEngine, DifferencingResult, Verdict};
pub use error::{ContextError, DecisionError, RuleError, TableAccessError};
pub use params::DatasetParameters;
pub use predicate::{ComparisonSpec, ScalarValue, Target};
pub use rules::{builtin_registry, RuleRegistry, RuleSpec, TableKind};
pub use table::{FileTableLoader, Table, TableLoader, TableRow};
