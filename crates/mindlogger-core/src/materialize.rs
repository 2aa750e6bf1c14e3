//! Conversion of nested columns into native polars struct and list columns.
//!
//! Used for columnar output where nested types survive serialization.
//!
//! | Nested column | Polars type |
//! |---------------|-------------|
//! | response | struct of every response field; `value` is a list, `geo` a struct, `matrix` a list of `{row, value}` structs |
//! | options | list of `{name, value, score}` structs |
//! | record | struct of the record's fields |

use chrono::{NaiveDate, Timelike};
use mindlogger_model::{OptionRecord, ResponseRecord};
use polars::prelude::{
    DataFrame, DataType, Field, IntoColumn, IntoSeries, ListChunked, NamedFrom, PlSmallStr,
    Series, StructChunked, TimeUnit,
};

use crate::error::Result;
use crate::frame::{NestedColumn, ReportFrame};

fn int_list_type() -> DataType {
    DataType::List(Box::new(DataType::Int64))
}

fn option_type() -> DataType {
    DataType::Struct(vec![
        Field::new("name".into(), DataType::String),
        Field::new("value".into(), DataType::Int64),
        Field::new("score".into(), DataType::Int64),
    ])
}

fn matrix_row_type() -> DataType {
    DataType::Struct(vec![
        Field::new("row".into(), DataType::String),
        Field::new("value".into(), int_list_type()),
    ])
}

fn list_series(name: &str, rows: Vec<Option<Series>>, inner: DataType) -> Result<Series> {
    let list: ListChunked = rows.into_iter().collect();
    let series = list.with_name(name.into()).into_series();
    Ok(series.cast(&DataType::List(Box::new(inner)))?)
}

fn struct_series(name: &str, height: usize, fields: &[Series]) -> Result<Series> {
    Ok(StructChunked::from_series(name.into(), height, fields.iter())?.into_series())
}

fn int_list(values: &[i64]) -> Series {
    Series::new(PlSmallStr::EMPTY, values)
}

fn options_struct(options: &[OptionRecord]) -> Result<Series> {
    let names: Vec<&str> = options.iter().map(|o| o.name.as_str()).collect();
    let values: Vec<i64> = options.iter().map(|o| o.value).collect();
    let scores: Vec<Option<i64>> = options.iter().map(|o| o.score).collect();
    struct_series(
        "",
        options.len(),
        &[
            Series::new("name".into(), names),
            Series::new("value".into(), values),
            Series::new("score".into(), scores),
        ],
    )
}

fn options_series(name: &str, lists: &[Option<Vec<OptionRecord>>]) -> Result<Series> {
    let rows = lists
        .iter()
        .map(|list| list.as_deref().map(options_struct).transpose())
        .collect::<Result<Vec<_>>>()?;
    list_series(name, rows, option_type())
}

fn matrix_struct(rows: &[mindlogger_model::MatrixRow]) -> Result<Series> {
    let keys: Vec<&str> = rows.iter().map(|r| r.row.as_str()).collect();
    let values = rows.iter().map(|r| Some(int_list(&r.value))).collect();
    struct_series(
        "",
        rows.len(),
        &[
            Series::new("row".into(), keys),
            list_series("value", values, DataType::Int64)?,
        ],
    )
}

fn response_series(name: &str, records: &[Option<ResponseRecord>]) -> Result<Series> {
    let height = records.len();
    let epoch = NaiveDate::default();
    let kinds: Vec<Option<&str>> = records
        .iter()
        .map(|r| r.as_ref().map(|r| r.response_type().as_str()))
        .collect();
    let raw: Vec<Option<&str>> = records
        .iter()
        .map(|r| r.as_ref().and_then(ResponseRecord::raw_value))
        .collect();
    let nulls: Vec<Option<bool>> = records
        .iter()
        .map(|r| r.as_ref().and_then(ResponseRecord::null_value))
        .collect();
    let values = records
        .iter()
        .map(|r| r.as_ref().and_then(ResponseRecord::values).map(int_list))
        .collect();
    let text: Vec<Option<&str>> = records
        .iter()
        .map(|r| r.as_ref().and_then(ResponseRecord::text))
        .collect();
    let file: Vec<Option<&str>> = records
        .iter()
        .map(|r| r.as_ref().and_then(ResponseRecord::file))
        .collect();
    let dates: Vec<Option<i32>> = records
        .iter()
        .map(|r| {
            r.as_ref()
                .and_then(ResponseRecord::date)
                .and_then(|d| i32::try_from((d - epoch).num_days()).ok())
        })
        .collect();
    let times: Vec<Option<i64>> = records
        .iter()
        .map(|r| {
            r.as_ref()
                .and_then(ResponseRecord::time)
                .map(|t| i64::from(t.num_seconds_from_midnight()) * 1_000_000_000)
        })
        .collect();
    let ranges: Vec<Option<i64>> = records
        .iter()
        .map(|r| {
            r.as_ref()
                .and_then(ResponseRecord::time_range)
                .map(|span| span.num_milliseconds())
        })
        .collect();
    let latitude: Vec<Option<f64>> = records
        .iter()
        .map(|r| r.as_ref().and_then(ResponseRecord::geo).map(|g| g.latitude))
        .collect();
    let longitude: Vec<Option<f64>> = records
        .iter()
        .map(|r| r.as_ref().and_then(ResponseRecord::geo).map(|g| g.longitude))
        .collect();
    let matrix = records
        .iter()
        .map(|r| r.as_ref().and_then(ResponseRecord::matrix).map(matrix_struct).transpose())
        .collect::<Result<Vec<_>>>()?;

    let geo = struct_series(
        "geo",
        height,
        &[
            Series::new("latitude".into(), latitude),
            Series::new("longitude".into(), longitude),
        ],
    )?;
    struct_series(
        name,
        height,
        &[
            Series::new("type".into(), kinds),
            Series::new("raw_value".into(), raw),
            Series::new("null_value".into(), nulls),
            list_series("value", values, DataType::Int64)?,
            Series::new("text".into(), text),
            Series::new("file".into(), file),
            Series::new("date".into(), dates).cast(&DataType::Date)?,
            Series::new("time".into(), times).cast(&DataType::Time)?,
            Series::new("time_range".into(), ranges)
                .cast(&DataType::Duration(TimeUnit::Milliseconds))?,
            geo,
            list_series("matrix", matrix, matrix_row_type())?,
        ],
    )
}

fn nested_series(name: &str, column: &NestedColumn) -> Result<Series> {
    match column {
        NestedColumn::Response(records) => response_series(name, records),
        NestedColumn::Options(lists) => options_series(name, lists),
        NestedColumn::Record(record) => {
            let frame = record.to_polars()?;
            let fields: Vec<Series> = frame
                .get_columns()
                .iter()
                .map(|column| column.as_materialized_series().clone())
                .collect();
            struct_series(name, record.height(), &fields)
        }
    }
}

impl ReportFrame {
    /// Scalar columns plus every nested column as a native polars column.
    pub fn to_polars(&self) -> Result<DataFrame> {
        let mut data = self.data().clone();
        for (name, column) in self.nested_columns() {
            data.with_column(nested_series(name, column)?.into_column())?;
        }
        Ok(data)
    }
}
