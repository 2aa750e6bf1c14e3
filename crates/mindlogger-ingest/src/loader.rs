use std::path::Path;
use std::time::Instant;

use polars::prelude::DataFrame;
use tracing::{debug, info};

use crate::concat::concat_diagonal;
use crate::csv_table::read_csv_table;
use crate::discovery::discover_report_files;
use crate::error::Result;

/// Loads every report file for `input` into one frame of string columns.
///
/// Files with different column sets are concatenated diagonally.
pub fn load_reports(input: &Path, pattern: &str) -> Result<DataFrame> {
    let start = Instant::now();
    let files = discover_report_files(input, pattern)?;
    let mut frames = Vec::with_capacity(files.len());
    for path in &files {
        let table = read_csv_table(path)?;
        debug!(
            path = %path.display(),
            rows = table.rows.len(),
            columns = table.headers.len(),
            "read report file"
        );
        frames.push(table.into_frame()?);
    }
    let report = concat_diagonal(frames)?;
    info!(
        files = files.len(),
        rows = report.height(),
        columns = report.width(),
        duration_ms = start.elapsed().as_millis(),
        "loaded reports"
    );
    Ok(report)
}
