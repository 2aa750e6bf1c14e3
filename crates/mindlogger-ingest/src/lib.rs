pub mod concat;
pub mod csv_table;
pub mod discovery;
pub mod error;
pub mod loader;
pub mod polars_utils;

pub use concat::concat_diagonal;
pub use csv_table::{CsvTable, read_csv_table};
pub use discovery::{
    DEFAULT_REPORT_PATTERN, discover_report_files, list_report_files, pattern_regex,
};
pub use error::{IngestError, Result};
pub use loader::load_reports;
pub use polars_utils::{any_to_i64, any_to_string, column_strings, format_numeric, parse_i64};
