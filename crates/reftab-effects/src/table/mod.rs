//! In-memory reference tables.
//!
//! - `loader` - Reading tables from reference files
//! - `select` - Mode selection over table rows

mod loader;
mod select;

pub use loader::{FileTableLoader, TableLoader};
pub use select::{select, Constraint, Constraints};

use crate::predicate::ScalarValue;
use std::collections::BTreeSet;
use std::sync::Arc;

/// A row whose width differs from the table's column count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeMismatch {
    pub found: usize,
    pub expected: usize,
}

/// One version of a reference table: named columns and rows of raw cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Arc<[String]>,
    rows: Vec<TableRow>,
}

impl Table {
    /// Create an empty table with the given columns.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Table {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Create a table and fill it with rows.
    pub fn build<C, R, V, S>(columns: C, rows: R) -> Result<Self, ShapeMismatch>
    where
        C: IntoIterator<Item = S>,
        R: IntoIterator<Item = V>,
        V: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Table::new(columns);
        for row in rows {
            table.push_row(row.into_iter().map(Into::into).collect())?;
        }
        Ok(table)
    }

    /// Append a row. Its width must match the column count.
    pub fn push_row(&mut self, values: Vec<String>) -> Result<(), ShapeMismatch> {
        if values.len() != self.columns.len() {
            return Err(ShapeMismatch {
                found: values.len(),
                expected: self.columns.len(),
            });
        }
        self.rows.push(TableRow {
            columns: Arc::clone(&self.columns),
            values,
        });
        Ok(())
    }

    /// Column names as stored, in on-disk order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Case-normalized set of column names.
    pub fn column_names(&self) -> BTreeSet<String> {
        self.columns.iter().map(|c| c.to_lowercase()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.columns.iter().any(|c| c.to_lowercase() == name)
    }

    pub fn rows(&self) -> impl Iterator<Item = &TableRow> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A single table row; fields are looked up case-insensitively.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    columns: Arc<[String]>,
    values: Vec<String>,
}

impl TableRow {
    /// Raw cell text for a field.
    pub fn get(&self, field: &str) -> Option<&str> {
        let field = field.to_lowercase();
        self.columns
            .iter()
            .position(|c| c.to_lowercase() == field)
            .map(|idx| self.values[idx].as_str())
    }

    /// Coerced cell value for a field.
    pub fn value(&self, field: &str) -> Option<ScalarValue> {
        self.get(field).map(ScalarValue::coerce)
    }

    /// Ordered `(column, raw value)` pairs.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(String::as_str))
    }

    /// Canonical rendering used for row-set comparison.
    ///
    /// Fields appear in lowercase column-name order and values are coerced,
    /// so column order on disk and insignificant formatting (`1.` vs `1.0`,
    /// padding) do not affect it. Text values are quoted.
    pub fn canonical(&self) -> String {
        let mut fields: Vec<(String, ScalarValue)> = self
            .fields()
            .map(|(name, raw)| (name.to_lowercase(), ScalarValue::coerce(raw)))
            .collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        let rendered: Vec<String> = fields
            .iter()
            .map(|(name, value)| match value {
                ScalarValue::Text(text) => format!("{name}={text:?}"),
                other => format!("{name}={other}"),
            })
            .collect();
        format!("({})", rendered.join(", "))
    }
}
