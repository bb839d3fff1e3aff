//! Differencing engine: do two table versions select the same rows?
//!
//! Given a rule, a dataset's parameters and two versions of a reference
//! table, the engine builds the dataset's mode constraints, selects the
//! matching rows from each version and compares the selections as
//! multisets. Any condition that prevents proving equality yields a
//! "different" verdict.

use crate::error::TableAccessError;
use crate::params::DatasetParameters;
use crate::predicate::CompiledComparison;
use crate::rules::RuleSpec;
use crate::table::{select, Constraint, Constraints, FileTableLoader, Table, TableLoader, TableRow};
use serde::Serialize;
use std::path::Path;
use tracing::debug;

/// Which branch of the comparison produced the result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    /// Both versions select the same rows.
    Same,
    /// The selected rows differ.
    Different,
    /// The tables' column sets differ.
    SchemaMismatch,
    /// The dataset lacks one or more mode fields; equality cannot be proven.
    IncompleteParameters { missing: Vec<String> },
    /// A mode field is not a column of the tables; equality cannot be proven.
    MissingModeColumns { columns: Vec<String> },
}

/// Outcome of one evaluation. Created fresh per call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DifferencingResult {
    #[serde(flatten)]
    pub verdict: Verdict,
    pub message: String,
}

impl DifferencingResult {
    fn new(verdict: Verdict, message: impl Into<String>) -> Self {
        Self {
            verdict,
            message: message.into(),
        }
    }

    /// Whether the dataset must be treated as affected. Only a proven
    /// "same" selection is not different.
    pub fn is_different(&self) -> bool {
        self.verdict != Verdict::Same
    }

    /// Whether the comparison actually ran to completion.
    pub fn is_determined(&self) -> bool {
        matches!(self.verdict, Verdict::Same | Verdict::Different)
    }
}

/// Build the constraint map for a dataset, or report the missing fields.
///
/// Parameter keys are matched case-insensitively; meta-value substitution
/// is applied before numeric coercion.
pub fn resolve_constraints(
    rule: &RuleSpec,
    params: &DatasetParameters,
) -> Result<Constraints, Vec<String>> {
    let params = params.lowercased();
    let mut constraints = Constraints::new();
    let mut missing = Vec::new();

    for (field, spec) in rule.mode_fields() {
        match params.get(field) {
            Some(raw) => {
                constraints.insert(
                    field.clone(),
                    Constraint {
                        target: rule.target_for(field, raw),
                        comparison: CompiledComparison::compile(spec),
                    },
                );
            }
            None => missing.push(field.clone()),
        }
    }

    if missing.is_empty() {
        Ok(constraints)
    } else {
        Err(missing)
    }
}

/// Render and sort the canonical form of every selected row.
fn selected_rows(table: &Table, constraints: &Constraints) -> Vec<String> {
    let mut rows: Vec<String> = select(table, constraints)
        .map(TableRow::canonical)
        .collect();
    rows.sort();
    rows
}

fn incomplete(rule: &RuleSpec, missing: Vec<String>) -> DifferencingResult {
    let message = format!(
        "Not all mode fields are defined in the dataset (missing: {}); presuming references are different.",
        missing.join(", ")
    );
    debug!("Rule {}: {}", rule.name(), message);
    DifferencingResult::new(Verdict::IncompleteParameters { missing }, message)
}

fn compare_tables(
    rule: &RuleSpec,
    constraints: &Constraints,
    old: &Table,
    new: &Table,
) -> DifferencingResult {
    if old.column_names() != new.column_names() {
        return DifferencingResult::new(
            Verdict::SchemaMismatch,
            "Columns are different between references.",
        );
    }

    let absent: Vec<String> = rule
        .field_names()
        .filter(|field| !old.has_column(field))
        .map(str::to_string)
        .collect();
    if !absent.is_empty() {
        let message = format!(
            "Mode fields are not columns of the references: {}.",
            absent.join(", ")
        );
        return DifferencingResult::new(Verdict::MissingModeColumns { columns: absent }, message);
    }

    let old_rows = selected_rows(old, constraints);
    let new_rows = selected_rows(new, constraints);
    debug!(
        "Rule {}: selected {} old row(s), {} new row(s)",
        rule.name(),
        old_rows.len(),
        new_rows.len()
    );

    if old_rows == new_rows {
        DifferencingResult::new(
            Verdict::Same,
            format!(
                "Selection rules have executed and the selected rows are the same ({} row(s)).",
                old_rows.len()
            ),
        )
    } else {
        DifferencingResult::new(
            Verdict::Different,
            format!(
                "Selection rules have executed and the selected rows are different ({} old, {} new).",
                old_rows.len(),
                new_rows.len()
            ),
        )
    }
}

/// Compare two loaded table versions for a dataset.
pub fn evaluate(
    rule: &RuleSpec,
    params: &DatasetParameters,
    old: &Table,
    new: &Table,
) -> DifferencingResult {
    match resolve_constraints(rule, params) {
        Ok(constraints) => compare_tables(rule, &constraints, old, new),
        Err(missing) => incomplete(rule, missing),
    }
}

/// Differencing engine bound to a table loader.
#[derive(Debug, Clone, Default)]
pub struct DifferencingEngine<L = FileTableLoader> {
    loader: L,
}

impl<L: TableLoader> DifferencingEngine<L> {
    pub fn new(loader: L) -> Self {
        Self { loader }
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Compare two loaded table versions. See [`evaluate`].
    pub fn evaluate(
        &self,
        rule: &RuleSpec,
        params: &DatasetParameters,
        old: &Table,
        new: &Table,
    ) -> DifferencingResult {
        evaluate(rule, params, old, new)
    }

    /// Load both references and compare them.
    ///
    /// Parameters are checked before any file is read, so an incomplete
    /// dataset never touches the disk. Load failures are returned as errors
    /// for the caller to turn into a fallback decision.
    pub fn evaluate_files(
        &self,
        rule: &RuleSpec,
        params: &DatasetParameters,
        old_reference: &Path,
        new_reference: &Path,
    ) -> Result<DifferencingResult, TableAccessError> {
        let constraints = match resolve_constraints(rule, params) {
            Ok(constraints) => constraints,
            Err(missing) => return Ok(incomplete(rule, missing)),
        };
        let old = self.loader.load(old_reference)?;
        let new = self.loader.load(new_reference)?;
        Ok(compare_tables(rule, &constraints, &old, &new))
    }
}
