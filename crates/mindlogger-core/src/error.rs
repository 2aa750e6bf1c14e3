//! Error types for report processing.

use mindlogger_model::ParseError;
use polars::prelude::PolarsError;
use thiserror::Error;

/// Errors raised while transforming a report.
#[derive(Debug, Error)]
pub enum ProcessError {
    // === Parsing Errors ===
    /// A cell could not be decoded by its grammar.
    #[error("{processor}: cannot parse column '{column}' at row {row}: {source}")]
    Parse {
        processor: &'static str,
        column: String,
        row: usize,
        #[source]
        source: ParseError,
    },

    // === Frame Errors ===
    /// A column the operation requires is absent.
    #[error("required column '{column}' not found")]
    MissingColumn { column: String },

    /// A column holds a different kind of value than the operation expects.
    #[error("column '{column}' is not a {expected} column")]
    ColumnKind {
        column: String,
        expected: &'static str,
    },

    /// A new column does not match the frame height.
    #[error("column '{column}' has {actual} rows but the report has {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    /// A row index is past the end of the report.
    #[error("row {row} is out of bounds for a report of {height} rows")]
    RowOutOfBounds { row: usize, height: usize },

    /// Polars operation failed.
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },

    // === Chain Errors ===
    #[error(transparent)]
    Chain(#[from] ChainError),
}

impl ProcessError {
    pub fn missing_column(column: impl Into<String>) -> Self {
        ProcessError::MissingColumn {
            column: column.into(),
        }
    }
}

impl From<PolarsError> for ProcessError {
    fn from(err: PolarsError) -> Self {
        ProcessError::DataFrame {
            message: err.to_string(),
        }
    }
}

impl From<mindlogger_ingest::IngestError> for ProcessError {
    fn from(err: mindlogger_ingest::IngestError) -> Self {
        ProcessError::DataFrame {
            message: err.to_string(),
        }
    }
}

/// Errors raised while planning a processor chain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("unknown processor '{name}'")]
    UnknownProcessor { name: String },

    #[error("processor '{required_by}' depends on unknown processor '{name}'")]
    UnknownDependency { name: String, required_by: String },

    /// Dependencies loop back on themselves; `path` lists the loop.
    #[error("processor dependency cycle: {}", path.join(" -> "))]
    Cycle { path: Vec<String> },
}

/// Result type for report processing.
pub type Result<T> = std::result::Result<T, ProcessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_lists_path() {
        let err = ChainError::Cycle {
            path: vec!["A".into(), "B".into(), "A".into()],
        };
        assert_eq!(err.to_string(), "processor dependency cycle: A -> B -> A");
    }

    #[test]
    fn chain_error_converts_transparently() {
        let err: ProcessError = ChainError::UnknownProcessor {
            name: "Nope".into(),
        }
        .into();
        assert_eq!(err.to_string(), "unknown processor 'Nope'");
    }
}
