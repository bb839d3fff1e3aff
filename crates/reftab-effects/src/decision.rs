//! Top-level reprocessing decision.
//!
//! A reference assignment changed for a dataset: does the dataset need to be
//! reprocessed? The answer is `false` only when the differencing engine
//! proves the rows selected for the dataset are unchanged. Every other
//! outcome, including every failure, is `true`.

use crate::context::{ContextHandle, ContextResolver};
use crate::engine::{DifferencingEngine, DifferencingResult, Verdict};
use crate::error::DecisionError;
use crate::params::DatasetParameters;
use crate::rules::{RuleRegistry, RuleSpec};
use crate::table::{FileTableLoader, TableLoader};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use tracing::{debug, info, warn};

/// Reference values treated as "no calibration assigned".
pub const DEFAULT_MEANINGLESS_REFERENCES: &[&str] = &["n/a", "undefined", "not found"];

/// One changed reference assignment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ReferenceUpdate {
    pub instrument: String,
    pub filekind: String,
    pub old_reference: String,
    pub new_reference: String,
}

/// Why a decision came out the way it did.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DecisionReason {
    /// No prior context to compare against.
    SingleContext,
    /// The dataset moved from a placeholder to a real reference.
    PlaceholderTransition { old_reference: String },
    UnknownRule { message: String },
    ContextFailure { message: String },
    TableFailure { message: String },
    /// The differencing engine ran.
    Evaluated {
        rule: String,
        #[serde(flatten)]
        result: DifferencingResult,
    },
}

/// A decision together with its reason.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    pub reprocess: bool,
    #[serde(flatten)]
    pub reason: DecisionReason,
}

impl Decision {
    fn reprocess(reason: DecisionReason) -> Self {
        Self {
            reprocess: true,
            reason,
        }
    }
}

/// Decides whether reference updates require reprocessing.
///
/// Holds only read-only collaborators, so a single instance can serve
/// concurrent decisions for different datasets.
#[derive(Debug, Clone)]
pub struct ReprocessingDecision<'r, R, L = FileTableLoader> {
    registry: &'r RuleRegistry,
    resolver: R,
    engine: DifferencingEngine<L>,
    meaningless: Vec<String>,
}

impl<'r, R: ContextResolver> ReprocessingDecision<'r, R> {
    /// A decision reading tables from disk with [`FileTableLoader`].
    pub fn new(registry: &'r RuleRegistry, resolver: R) -> Self {
        Self::with_loader(registry, resolver, FileTableLoader)
    }
}

impl<'r, R: ContextResolver, L: TableLoader> ReprocessingDecision<'r, R, L> {
    pub fn with_loader(registry: &'r RuleRegistry, resolver: R, loader: L) -> Self {
        Self {
            registry,
            resolver,
            engine: DifferencingEngine::new(loader),
            meaningless: DEFAULT_MEANINGLESS_REFERENCES
                .iter()
                .map(|token| token.to_string())
                .collect(),
        }
    }

    /// Replace the placeholder tokens. Matching is a case-insensitive prefix
    /// test.
    pub fn with_meaningless_references<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.meaningless = tokens
            .into_iter()
            .map(|token| token.as_ref().to_lowercase())
            .collect();
        self
    }

    pub fn is_meaningless(&self, reference: &str) -> bool {
        let reference = reference.trim().to_lowercase();
        self.meaningless
            .iter()
            .any(|token| reference.starts_with(token.as_str()))
    }

    /// Whether `dataset` must be reprocessed because of `update`.
    pub fn decide(
        &self,
        dataset: &str,
        params: &DatasetParameters,
        old_context: Option<&str>,
        new_context: &str,
        update: &ReferenceUpdate,
    ) -> bool {
        self.decide_detailed(dataset, params, old_context, new_context, update)
            .reprocess
    }

    /// Like [`decide`](Self::decide), also reporting the reason.
    pub fn decide_detailed(
        &self,
        dataset: &str,
        params: &DatasetParameters,
        old_context: Option<&str>,
        new_context: &str,
        update: &ReferenceUpdate,
    ) -> Decision {
        let Some(old_context) = old_context else {
            debug!("No old context for dataset {dataset}; reprocessing.");
            return Decision::reprocess(DecisionReason::SingleContext);
        };

        if self.is_meaningless(&update.old_reference) && !self.is_meaningless(&update.new_reference)
        {
            info!(
                "Dataset {dataset} changed from {} to {} for {}; reprocessing.",
                update.old_reference, update.new_reference, update.filekind
            );
            return Decision::reprocess(DecisionReason::PlaceholderTransition {
                old_reference: update.old_reference.clone(),
            });
        }

        match self.compare(dataset, params, old_context, new_context, update) {
            Ok((rule, result)) => {
                info!(
                    "Dataset {dataset} {} {} -> {}: {}",
                    update.filekind, update.old_reference, update.new_reference, result.message
                );
                Decision {
                    reprocess: result.is_different(),
                    reason: DecisionReason::Evaluated { rule, result },
                }
            }
            Err(err) => {
                warn!("Cannot determine table effects for dataset {dataset}, presuming reprocessing: {err}");
                let message = err.to_string();
                Decision::reprocess(match err {
                    DecisionError::Rule(_) => DecisionReason::UnknownRule { message },
                    DecisionError::Context(_) => DecisionReason::ContextFailure { message },
                    DecisionError::Table(_) => DecisionReason::TableFailure { message },
                })
            }
        }
    }

    fn compare(
        &self,
        dataset: &str,
        params: &DatasetParameters,
        old_context: &str,
        new_context: &str,
        update: &ReferenceUpdate,
    ) -> Result<(String, DifferencingResult), DecisionError> {
        let old_path = self
            .resolver
            .resolve(old_context)?
            .locate_reference(&update.old_reference)?;
        let new_path = self
            .resolver
            .resolve(new_context)?
            .locate_reference(&update.new_reference)?;
        debug!(
            "Comparing {} and {} for dataset {dataset}",
            old_path.display(),
            new_path.display()
        );

        let rule = self.registry.lookup(&update.instrument, &update.filekind)?;
        let params = self.effective_parameters(rule, dataset, &update.instrument, params);
        let result = self
            .engine
            .evaluate_files(rule, &params, &old_path, &new_path)?;
        if let Verdict::IncompleteParameters { missing } = &result.verdict {
            debug!("Dataset {dataset} is missing mode fields {missing:?}");
        }
        Ok((rule.name().to_string(), result))
    }

    /// Supplied parameters, completed from the header stub table when they
    /// cannot satisfy the rule and a stub exists for the dataset.
    fn effective_parameters<'p>(
        &self,
        rule: &RuleSpec,
        dataset: &str,
        instrument: &str,
        params: &'p DatasetParameters,
    ) -> Cow<'p, DatasetParameters> {
        if params.covers(rule.field_names()) {
            return Cow::Borrowed(params);
        }
        match self.registry.header_stub(instrument, dataset) {
            Some(stub) => {
                info!("Using header stub for dataset {dataset}.");
                let mut merged = stub.lowercased();
                for (key, value) in params.iter() {
                    merged.insert(key.to_lowercase(), value);
                }
                Cow::Owned(merged)
            }
            None => Cow::Borrowed(params),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ContextError, TableAccessError};
    use crate::rules::builtin_registry;
    use crate::table::Table;
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};
    use tracing_test::traced_test;

    /// Every context maps a reference to a path of the same name.
    struct Passthrough;

    struct PassthroughContext(String);

    impl ContextHandle for PassthroughContext {
        fn name(&self) -> &str {
            &self.0
        }

        fn locate_reference(&self, reference: &str) -> Result<PathBuf, ContextError> {
            Ok(PathBuf::from(reference.to_lowercase()))
        }
    }

    impl ContextResolver for Passthrough {
        type Handle = PassthroughContext;

        fn resolve(&self, name: &str) -> Result<PassthroughContext, ContextError> {
            if name == "broken.pmap" {
                return Err(ContextError::InvalidName(name.to_string()));
            }
            Ok(PassthroughContext(name.to_string()))
        }
    }

    #[derive(Default)]
    struct MemoryLoader(HashMap<PathBuf, Table>);

    impl MemoryLoader {
        fn with(mut self, name: &str, table: Table) -> Self {
            self.0.insert(PathBuf::from(name), table);
            self
        }
    }

    impl TableLoader for MemoryLoader {
        fn load(&self, path: &Path) -> Result<Table, TableAccessError> {
            self.0
                .get(path)
                .cloned()
                .ok_or_else(|| TableAccessError::UnsupportedFormat(path.to_path_buf()))
        }
    }

    fn disptab(rows: &[[&str; 3]]) -> Table {
        Table::build(
            ["OPT_ELEM", "CENWAVE", "SEGMENT"],
            rows.iter().map(|r| r.iter().copied()),
        )
        .unwrap()
    }

    fn loader() -> MemoryLoader {
        MemoryLoader::default()
            .with("old_disp.csv", disptab(&[["G140L", "1280", "A"], ["G140L", "1280", "B"]]))
            .with("reordered_disp.csv", disptab(&[["G140L", "1280", "B"], ["G140L", "1280", "A"]]))
            .with(
                "added_disp.csv",
                disptab(&[["G140L", "1280", "B"], ["G140L", "1280", "A"], ["G140L", "1280", "C"]]),
            )
    }

    fn update(old: &str, new: &str) -> ReferenceUpdate {
        ReferenceUpdate {
            instrument: "cos".to_string(),
            filekind: "disptab".to_string(),
            old_reference: old.to_string(),
            new_reference: new.to_string(),
        }
    }

    fn params() -> DatasetParameters {
        [("OPT_ELEM", "G140L"), ("CENWAVE", "1280")].into_iter().collect()
    }

    fn decision(loader: MemoryLoader) -> ReprocessingDecision<'static, Passthrough, MemoryLoader> {
        ReprocessingDecision::with_loader(builtin_registry(), Passthrough, loader)
    }

    #[test]
    fn test_single_context_always_reprocesses() {
        let decision = decision(MemoryLoader::default());
        let result = decision.decide_detailed(
            "LA1234010",
            &params(),
            None,
            "hst_0002.pmap",
            &update("old_disp.csv", "old_disp.csv"),
        );
        assert!(result.reprocess);
        assert_eq!(result.reason, DecisionReason::SingleContext);
    }

    #[test]
    fn test_reordered_rows_do_not_reprocess() {
        let decision = decision(loader());
        assert!(!decision.decide(
            "LA1234010",
            &params(),
            Some("hst_0001.pmap"),
            "hst_0002.pmap",
            &update("old_disp.csv", "reordered_disp.csv"),
        ));
    }

    #[test]
    fn test_added_row_reprocesses() {
        let decision = decision(loader());
        let result = decision.decide_detailed(
            "LA1234010",
            &params(),
            Some("hst_0001.pmap"),
            "hst_0002.pmap",
            &update("old_disp.csv", "added_disp.csv"),
        );
        assert!(result.reprocess);
        match result.reason {
            DecisionReason::Evaluated { rule, result } => {
                assert_eq!(rule, "COSDISPTAB");
                assert_eq!(result.verdict, Verdict::Different);
            }
            other => panic!("unexpected reason {other:?}"),
        }
    }

    #[test]
    fn test_placeholder_transition() {
        let decision = decision(loader());
        for old in ["N/A", "n/a", "UNDEFINED", "Not Found: x"] {
            let result = decision.decide_detailed(
                "LA1234010",
                &params(),
                Some("hst_0001.pmap"),
                "hst_0002.pmap",
                &update(old, "reordered_disp.csv"),
            );
            assert!(result.reprocess);
            assert!(matches!(result.reason, DecisionReason::PlaceholderTransition { .. }));
        }
    }

    #[test]
    fn test_custom_meaningless_tokens() {
        let decision = decision(loader()).with_meaningless_references(["NONE"]);
        assert!(decision.is_meaningless("none"));
        assert!(!decision.is_meaningless("N/A"));
    }

    #[test]
    #[traced_test]
    fn test_unknown_rule_reprocesses() {
        let decision = decision(loader());
        let mut update = update("old_disp.csv", "reordered_disp.csv");
        update.instrument = "acs".to_string();
        update.filekind = "biasfile".to_string();
        let result =
            decision.decide_detailed("J8BT05NJQ", &params(), Some("a.pmap"), "b.pmap", &update);
        assert!(result.reprocess);
        assert!(matches!(result.reason, DecisionReason::UnknownRule { .. }));
        assert!(logs_contain("presuming reprocessing"));
    }

    #[test]
    fn test_context_failure_reprocesses() {
        let decision = decision(loader());
        let result = decision.decide_detailed(
            "LA1234010",
            &params(),
            Some("broken.pmap"),
            "hst_0002.pmap",
            &update("old_disp.csv", "reordered_disp.csv"),
        );
        assert!(result.reprocess);
        assert!(matches!(result.reason, DecisionReason::ContextFailure { .. }));
    }

    #[test]
    fn test_table_failure_reprocesses() {
        let decision = decision(loader());
        let result = decision.decide_detailed(
            "LA1234010",
            &params(),
            Some("hst_0001.pmap"),
            "hst_0002.pmap",
            &update("old_disp.csv", "x1v17414l_flat.fits"),
        );
        assert!(result.reprocess);
        assert!(matches!(result.reason, DecisionReason::TableFailure { .. }));
    }

    #[test]
    fn test_incomplete_parameters_reprocess() {
        let decision = decision(loader());
        let params: DatasetParameters = [("OPT_ELEM", "G140L")].into_iter().collect();
        let result = decision.decide_detailed(
            "LA1234010",
            &params,
            Some("hst_0001.pmap"),
            "hst_0002.pmap",
            &update("old_disp.csv", "reordered_disp.csv"),
        );
        assert!(result.reprocess);
    }

    #[test]
    #[traced_test]
    fn test_header_stub_fills_missing_parameters() {
        // LBYX01010 is stubbed as G140L / 1280.
        let decision = decision(loader());
        let result = decision.decide_detailed(
            "LBYX01010:LBYX01Q7Q",
            &DatasetParameters::new(),
            Some("hst_0001.pmap"),
            "hst_0002.pmap",
            &update("old_disp.csv", "reordered_disp.csv"),
        );
        assert!(!result.reprocess);
        assert!(logs_contain("Using header stub"));

        let registry = RuleRegistry::builtin().without_header_stubs();
        let decision = ReprocessingDecision::with_loader(&registry, Passthrough, loader());
        assert!(decision.decide(
            "LBYX01010",
            &DatasetParameters::new(),
            Some("hst_0001.pmap"),
            "hst_0002.pmap",
            &update("old_disp.csv", "reordered_disp.csv"),
        ));
    }

    #[test]
    fn test_decision_serializes_flat() {
        let decision = Decision::reprocess(DecisionReason::SingleContext);
        let json = serde_json::to_value(&decision).unwrap();
        assert_eq!(json["reprocess"], true);
        assert_eq!(json["reason"], "single_context");
    }
}
