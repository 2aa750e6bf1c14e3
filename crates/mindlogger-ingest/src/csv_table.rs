use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use polars::prelude::{Column, DataFrame, IntoColumn, NamedFrom, Series};

use crate::error::{IngestError, Result};

/// Raw text contents of one report file. Empty cells are `None`.
#[derive(Debug, Clone)]
pub struct CsvTable {
    pub path: PathBuf,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

fn normalize_header(raw: &str) -> String {
    raw.trim().trim_matches('\u{feff}').to_string()
}

fn normalize_cell(raw: &str) -> Option<String> {
    if raw.is_empty() {
        None
    } else {
        Some(raw.to_string())
    }
}

pub fn read_csv_table(path: &Path) -> Result<CsvTable> {
    let parse_error = |err: csv::Error| IngestError::CsvParse {
        path: path.to_path_buf(),
        message: err.to_string(),
    };
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(parse_error)?;
    let headers: Vec<String> = reader
        .headers()
        .map_err(parse_error)?
        .iter()
        .map(normalize_header)
        .collect();
    if headers.iter().all(String::is_empty) {
        return Err(IngestError::EmptyCsv {
            path: path.to_path_buf(),
        });
    }
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(parse_error)?;
        if record.iter().all(|value| value.trim().is_empty()) {
            continue;
        }
        let row = (0..headers.len())
            .map(|idx| record.get(idx).and_then(normalize_cell))
            .collect();
        rows.push(row);
    }
    Ok(CsvTable {
        path: path.to_path_buf(),
        headers,
        rows,
    })
}

impl CsvTable {
    /// Builds a frame with one string column per header.
    pub fn into_frame(self) -> Result<DataFrame> {
        let mut columns: Vec<Vec<Option<String>>> =
            vec![Vec::with_capacity(self.rows.len()); self.headers.len()];
        for row in self.rows {
            for (idx, value) in row.into_iter().enumerate() {
                columns[idx].push(value);
            }
        }
        let columns: Vec<Column> = self
            .headers
            .iter()
            .zip(columns)
            .map(|(name, values)| Series::new(name.as_str().into(), values).into_column())
            .collect();
        DataFrame::new(columns).map_err(|err| IngestError::CsvParse {
            path: self.path,
            message: err.to_string(),
        })
    }
}
