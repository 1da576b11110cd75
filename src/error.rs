// ⚠️ Error taxonomy
// Fatal errors abort the whole run; recoverable conditions are Diagnostics.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort processing of a file (and with it, the whole run).
#[derive(Debug, Error)]
pub enum StatementError {
    /// Referenced file or directory does not exist.
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Extension outside {csv, xlsx}.
    #[error("unsupported file format '{extension}': {path}")]
    UnsupportedFormat { path: PathBuf, extension: String },

    /// Input directory holds no csv/xlsx statements.
    #[error("input directory {path} does not contain any CSV or XLSX files")]
    MissingInput { path: PathBuf },

    /// No registered schema accepted the table's header.
    #[error("no bank schema matches columns [{}]", columns.join(", "))]
    NoMatchingSchema { columns: Vec<String> },

    /// A matched transformer could not coerce a required column.
    #[error("{bank}: column '{column}' at row {row}: {reason}")]
    SchemaMismatch {
        bank: &'static str,
        column: String,
        row: usize,
        reason: String,
    },

    /// No row of a spreadsheet carries the expected header columns.
    #[error("could not find header row with columns [{}]", columns.join(", "))]
    HeaderNotFound { columns: Vec<String> },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to read workbook {path}: {message}")]
    Workbook { path: PathBuf, message: String },

    #[error("failed to write {path}: {message}")]
    Output { path: PathBuf, message: String },
}

impl StatementError {
    pub(crate) fn mismatch(
        bank: &'static str,
        column: &str,
        row: usize,
        reason: impl Into<String>,
    ) -> Self {
        StatementError::SchemaMismatch {
            bank,
            column: column.to_string(),
            row,
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StatementError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, StatementError>;

/// Recoverable conditions: logged as warnings, processing continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// Rows were produced without a currency (no column, none sniffed).
    MissingCurrency { bank: &'static str, path: PathBuf },

    /// More than one schema accepted a header; the first registered won.
    AmbiguousSchema {
        chosen: &'static str,
        candidates: Vec<&'static str>,
    },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::MissingCurrency { bank, path } => {
                write!(f, "no currency for {} rows from {}", bank, path.display())
            }
            Diagnostic::AmbiguousSchema { chosen, candidates } => write!(
                f,
                "ambiguous schema match [{}], using {}",
                candidates.join(", "),
                chosen
            ),
        }
    }
}
