//! MindLogger output generation.
//!
//! Output formats shape the processed report into named tables, and the
//! writers serialize each table as CSV or Parquet:
//!
//! - **CSV**: records flattened, other nested columns dropped, durations in
//!   milliseconds
//! - **Parquet**: nested columns kept as struct and list columns

pub mod error;
pub mod formats;
mod writers;

pub use error::{OutputError, Result};
pub use formats::{
    ExtraArguments, FormatRegistry, NamedOutput, OutputFormat, default_formats, produce,
};
pub use writers::{
    csv_frame, parquet_frame, write_csv, write_output, write_outputs, write_parquet,
};
