//! Mode selection: reduce a table to the rows a dataset would use.

use super::{Table, TableRow};
use crate::predicate::{CompiledComparison, Target};
use std::collections::BTreeMap;

/// Requested value for one field plus the comparison that applies to it.
#[derive(Debug, Clone)]
pub struct Constraint {
    pub target: Target,
    pub comparison: CompiledComparison,
}

impl Constraint {
    /// Check a row against this constraint. A row lacking the field fails.
    pub fn accepts(&self, row: &TableRow, field: &str) -> bool {
        match row.value(field) {
            Some(value) => self.comparison.matches(&value, &self.target),
            None => false,
        }
    }
}

/// Field name (lowercase) to constraint.
pub type Constraints = BTreeMap<String, Constraint>;

/// Lazily yield, in table order, every row satisfying all constraints.
///
/// Each call rescans the table from the start; nothing is cached and the
/// table is never modified. A row with no constraints always qualifies.
pub fn select<'t>(
    table: &'t Table,
    constraints: &'t Constraints,
) -> impl Iterator<Item = &'t TableRow> + 't {
    table.rows().filter(move |row| {
        constraints
            .iter()
            .all(|(field, constraint)| constraint.accepts(row, field))
    })
}
