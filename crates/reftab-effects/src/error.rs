//! Error taxonomy for reference-table differencing.
//!
//! Every failure here resolves to "reprocess" at the decision boundary; the
//! types exist so callers and logs can tell *why* a comparison was not made.

use std::path::PathBuf;

/// Errors raised while looking up or building comparison rules.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("No rules for instrument {instrument} and reference file kind {filekind}")]
    UnknownRule { instrument: String, filekind: String },
    #[error("Rule {0} has no mode fields; declare it as match-all explicitly")]
    EmptyModeFields(String),
}

/// Errors raised while reading a reference table.
#[derive(Debug, thiserror::Error)]
pub enum TableAccessError {
    #[error("Failed to read table {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed CSV table {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("Malformed JSON table {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Table {path} has no {segment} segment")]
    MissingSegment { path: PathBuf, segment: &'static str },
    #[error("Reference {0} is not a supported table format")]
    UnsupportedFormat(PathBuf),
    #[error("Table {path}: row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        path: PathBuf,
        row: usize,
        found: usize,
        expected: usize,
    },
}

/// Errors raised while resolving contexts or locating references in them.
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("Invalid context name: {0:?}")]
    InvalidName(String),
    #[error("Reference {reference} not found for context {context}")]
    NotFound { context: String, reference: String },
}

/// Any failure that prevents a reprocessing decision from being proven.
#[derive(Debug, thiserror::Error)]
pub enum DecisionError {
    #[error(transparent)]
    Rule(#[from] RuleError),
    #[error(transparent)]
    Table(#[from] TableAccessError),
    #[error(transparent)]
    Context(#[from] ContextError),
}
