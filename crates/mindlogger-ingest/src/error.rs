//! Error types for export ingestion.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while locating and loading report files.
#[derive(Debug, Error)]
pub enum IngestError {
    // === Input Location Errors ===
    /// Input path does not exist.
    #[error("export path not found: {path}")]
    InputNotFound { path: PathBuf },

    /// Input path exists but is neither a directory nor a regular file.
    #[error("{path} is not a directory")]
    NotADirectory { path: PathBuf },

    /// Directory contains no file matching the report pattern.
    #[error("no report files matching '{pattern}' found in {path}")]
    NoMatchingFiles { path: PathBuf, pattern: String },

    /// Report pattern could not be compiled.
    #[error("invalid report file pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Failed to read directory entries.
    #[error("failed to read directory {path}: {source}")]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === CSV Parsing Errors ===
    /// Failed to read or decode a CSV record.
    #[error("failed to parse CSV {path}: {message}")]
    CsvParse { path: PathBuf, message: String },

    /// CSV file has no header row.
    #[error("CSV file is empty: {path}")]
    EmptyCsv { path: PathBuf },

    // === DataFrame Errors ===
    /// Failed DataFrame operation.
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },
}

impl From<polars::prelude::PolarsError> for IngestError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IngestError::NoMatchingFiles {
            path: PathBuf::from("/exports/applet"),
            pattern: "report*.csv".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "no report files matching 'report*.csv' found in /exports/applet"
        );
    }

    #[test]
    fn test_error_from_polars() {
        let polars_err = polars::prelude::PolarsError::ColumnNotFound("test".into());
        let ingest_err: IngestError = polars_err.into();
        assert!(matches!(ingest_err, IngestError::DataFrame { .. }));
    }
}
