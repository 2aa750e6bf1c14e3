//! Error types for output generation.

use std::path::PathBuf;

use mindlogger_core::ProcessError;
use mindlogger_ingest::IngestError;
use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OutputError {
    // === Format Errors ===
    /// No format is registered under this name.
    #[error("unknown output format '{name}'")]
    UnknownFormat { name: String },

    /// A format needs an extra `key=value` argument that was not given.
    #[error("output format '{format}' requires extra argument '{argument}' (-e {argument}=...)")]
    MissingExtraArgument {
        format: &'static str,
        argument: &'static str,
    },

    // === Companion File Errors ===
    #[error("file not found: {}", path.display())]
    MissingFile { path: PathBuf },

    /// A companion file lacks a required column.
    #[error("'{column}' column not found in {}", path.display())]
    MissingColumn { column: String, path: PathBuf },

    // === Writer Errors ===
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Polars operation failed.
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },

    // === Upstream Errors ===
    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error(transparent)]
    Ingest(#[from] IngestError),
}

impl From<PolarsError> for OutputError {
    fn from(err: PolarsError) -> Self {
        OutputError::DataFrame {
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, OutputError>;
