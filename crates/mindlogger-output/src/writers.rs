//! CSV and Parquet writers.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::Instant;

use mindlogger_core::{OutputFileType, ReportFrame};
use polars::prelude::{
    CsvWriter, DataFrame, DataType, IntoColumn, ParquetWriter, SerWriter, TimeUnit,
};
use tracing::{debug, info};

use crate::error::{OutputError, Result};
use crate::formats::NamedOutput;

/// Scalar table for CSV: records flattened, remaining nested columns
/// dropped, durations converted to whole milliseconds in `<name>_ms`.
///
/// With `drop_null_columns`, columns that are null in every row are removed.
pub fn csv_frame(frame: &ReportFrame, drop_null_columns: bool) -> Result<DataFrame> {
    let mut df = frame.flatten_records()?.into_data();
    let durations: Vec<String> = df
        .get_columns()
        .iter()
        .filter(|column| matches!(column.dtype(), DataType::Duration(_)))
        .map(|column| column.name().to_string())
        .collect();
    for name in durations {
        let millis = df
            .column(&name)?
            .cast(&DataType::Duration(TimeUnit::Milliseconds))?
            .cast(&DataType::Int64)?
            .with_name(format!("{name}_ms").into());
        df = df.drop(&name)?;
        df.with_column(millis.into_column())?;
    }
    if drop_null_columns {
        let height = df.height();
        let empty: Vec<String> = df
            .get_columns()
            .iter()
            .filter(|column| height > 0 && column.null_count() == height)
            .map(|column| column.name().to_string())
            .collect();
        if !empty.is_empty() {
            debug!(columns = empty.len(), "dropping all-null columns");
            df = df.drop_many(empty);
        }
    }
    Ok(df)
}

/// Scalar and nested columns as native polars columns for Parquet.
pub fn parquet_frame(frame: &ReportFrame) -> Result<DataFrame> {
    Ok(frame.to_polars()?)
}

fn create(path: &Path) -> Result<File> {
    File::create(path).map_err(|source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    let mut file = create(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(df)?;
    Ok(())
}

pub fn write_parquet(df: &mut DataFrame, path: &Path) -> Result<()> {
    let file = create(path)?;
    ParquetWriter::new(file).finish(df)?;
    Ok(())
}

/// Writes one output table to `<dir>/<name>.<ext>` and returns the path.
///
/// `drop_null_columns` applies to CSV only.
pub fn write_output(
    output: &NamedOutput,
    dir: &Path,
    file_type: OutputFileType,
    drop_null_columns: bool,
) -> Result<PathBuf> {
    let start = Instant::now();
    fs::create_dir_all(dir).map_err(|source| OutputError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let path = dir.join(format!("{}.{}", output.name, file_type.extension()));
    let mut df = match file_type {
        OutputFileType::Csv => csv_frame(&output.frame, drop_null_columns)?,
        OutputFileType::Parquet => parquet_frame(&output.frame)?,
    };
    match file_type {
        OutputFileType::Csv => write_csv(&mut df, &path)?,
        OutputFileType::Parquet => write_parquet(&mut df, &path)?,
    }
    info!(
        path = %path.display(),
        rows = df.height(),
        columns = df.width(),
        duration_ms = start.elapsed().as_millis(),
        "wrote output"
    );
    Ok(path)
}

/// Writes every table and returns the written paths in order.
pub fn write_outputs(
    outputs: &[NamedOutput],
    dir: &Path,
    file_type: OutputFileType,
    drop_null_columns: bool,
) -> Result<Vec<PathBuf>> {
    outputs
        .iter()
        .map(|output| write_output(output, dir, file_type, drop_null_columns))
        .collect()
}
