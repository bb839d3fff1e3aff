//! Loading reference tables from disk.

use super::Table;
use crate::error::TableAccessError;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

/// Source of reference tables.
///
/// Implementations must be safe to call concurrently for different files.
pub trait TableLoader {
    fn load(&self, path: &Path) -> Result<Table, TableAccessError>;
}

impl<T: TableLoader + ?Sized> TableLoader for &T {
    fn load(&self, path: &Path) -> Result<Table, TableAccessError> {
        (**self).load(path)
    }
}

/// Loads `.csv` and `.json` tables; any other extension is not a table.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileTableLoader;

#[derive(Debug, Deserialize)]
struct JsonTable {
    columns: Vec<String>,
    #[serde(default)]
    rows: Option<Vec<Vec<serde_json::Value>>>,
}

impl FileTableLoader {
    pub fn new() -> Self {
        Self
    }

    fn load_csv(path: &Path) -> Result<Table, TableAccessError> {
        let file = std::fs::File::open(path).map_err(|source| TableAccessError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let headers = reader
            .headers()
            .map_err(|source| csv_error(path, source))?
            .clone();
        if headers.is_empty() {
            return Err(TableAccessError::MissingSegment {
                path: path.to_path_buf(),
                segment: "header",
            });
        }

        let mut table = Table::new(headers.iter());
        for (idx, record) in reader.records().enumerate() {
            let record = record.map_err(|source| csv_error(path, source))?;
            let values = record.iter().map(str::to_string).collect();
            table
                .push_row(values)
                .map_err(|shape| TableAccessError::RaggedRow {
                    path: path.to_path_buf(),
                    row: idx + 1,
                    found: shape.found,
                    expected: shape.expected,
                })?;
        }
        Ok(table)
    }

    fn load_json(path: &Path) -> Result<Table, TableAccessError> {
        let content = std::fs::read_to_string(path).map_err(|source| TableAccessError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let parsed: JsonTable =
            serde_json::from_str(&content).map_err(|source| TableAccessError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        let rows = parsed.rows.ok_or_else(|| TableAccessError::MissingSegment {
            path: path.to_path_buf(),
            segment: "rows",
        })?;

        let mut table = Table::new(parsed.columns);
        for (idx, row) in rows.into_iter().enumerate() {
            let values = row.iter().map(render_json_cell).collect();
            table
                .push_row(values)
                .map_err(|shape| TableAccessError::RaggedRow {
                    path: path.to_path_buf(),
                    row: idx + 1,
                    found: shape.found,
                    expected: shape.expected,
                })?;
        }
        Ok(table)
    }
}

impl TableLoader for FileTableLoader {
    fn load(&self, path: &Path) -> Result<Table, TableAccessError> {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        let table = match extension.as_str() {
            "csv" => Self::load_csv(path)?,
            "json" => Self::load_json(path)?,
            _ => return Err(TableAccessError::UnsupportedFormat(path.to_path_buf())),
        };
        debug!(
            "Loaded table {} ({} columns, {} rows)",
            path.display(),
            table.columns().len(),
            table.len()
        );
        Ok(table)
    }
}

fn csv_error(path: &Path, source: csv::Error) -> TableAccessError {
    TableAccessError::Csv {
        path: path.to_path_buf(),
        source,
    }
}

fn render_json_cell(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}
