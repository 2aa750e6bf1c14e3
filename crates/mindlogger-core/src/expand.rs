//! Row expansion.
//!
//! Turns nested response and option columns into flat rows:
//!
//! - [`expand_responses`] writes one `response_*` column per response field
//!   and one row per element of the cartesian product of the response's
//!   value list and its matrix cells. Values and matrix cells carry their
//!   0-based position in `*_value_index` columns.
//! - [`expand_options`] writes one row per option with `option_name`,
//!   `option_value` and `option_score`, then removes duplicate rows.
//!
//! An absent or empty list still yields exactly one row, with the expanded
//! columns null, so no source row is ever lost.

use chrono::{NaiveDate, Timelike};
use mindlogger_model::ResponseRecord;
use polars::prelude::{DataType, NamedFrom, Series, TimeUnit};
use tracing::debug;

use crate::error::{ProcessError, Result};
use crate::frame::{NestedColumn, ReportFrame};
use crate::processors::{ITEM_RECORD, OPTIONS_COLUMN, RESPONSE_COLUMN};

pub const RESPONSE_PREFIX: &str = "response_";
pub const OPTION_PREFIX: &str = "option_";
/// Options field of the item record once it is unnested.
pub const ITEM_OPTIONS_COLUMN: &str = "item_options";

const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// One output row of a response expansion.
struct Slot {
    source: usize,
    value: Option<(i64, u32)>,
    matrix: Option<(usize, Option<(i64, u32)>)>,
}

fn indexed(values: &[i64]) -> impl Iterator<Item = (i64, u32)> + '_ {
    values
        .iter()
        .enumerate()
        .map(|(index, &value)| (value, index as u32))
}

fn plan_slots(records: &[Option<ResponseRecord>]) -> Vec<Slot> {
    let mut slots = Vec::with_capacity(records.len());
    for (source, record) in records.iter().enumerate() {
        let values: Vec<Option<(i64, u32)>> = match record.as_ref().and_then(ResponseRecord::values) {
            Some(values) if !values.is_empty() => indexed(values).map(Some).collect(),
            _ => vec![None],
        };
        let cells: Vec<Option<(usize, Option<(i64, u32)>)>> =
            match record.as_ref().and_then(ResponseRecord::matrix) {
                Some(rows) if !rows.is_empty() => rows
                    .iter()
                    .enumerate()
                    .flat_map(|(row, matrix_row)| {
                        if matrix_row.value.is_empty() {
                            vec![Some((row, None))]
                        } else {
                            indexed(&matrix_row.value)
                                .map(|cell| Some((row, Some(cell))))
                                .collect()
                        }
                    })
                    .collect(),
                _ => vec![None],
            };
        for value in &values {
            for matrix in &cells {
                slots.push(Slot {
                    source,
                    value: *value,
                    matrix: *matrix,
                });
            }
        }
    }
    slots
}

fn response_records(report: &ReportFrame) -> Result<&[Option<ResponseRecord>]> {
    match report.nested(RESPONSE_COLUMN) {
        Some(NestedColumn::Response(records)) => Ok(records),
        Some(_) => Err(ProcessError::ColumnKind {
            column: RESPONSE_COLUMN.to_string(),
            expected: "response",
        }),
        None => Err(ProcessError::missing_column(RESPONSE_COLUMN)),
    }
}

fn column_name(field: &str) -> String {
    format!("{RESPONSE_PREFIX}{field}")
}

/// Expands the nested `response` column into flat `response_*` columns.
///
/// # Errors
///
/// Fails when the report has no `response` column.
pub fn expand_responses(report: &ReportFrame) -> Result<ReportFrame> {
    let records = response_records(report)?;
    let slots = plan_slots(records);
    let sources: Vec<usize> = slots.iter().map(|slot| slot.source).collect();
    let mut out = report.take(&sources)?;

    let record = |slot: &Slot| records[slot.source].as_ref();
    let epoch = NaiveDate::default();

    let kinds: Vec<Option<&str>> = slots
        .iter()
        .map(|slot| record(slot).map(|r| r.response_type().as_str()))
        .collect();
    let raw: Vec<Option<&str>> = slots
        .iter()
        .map(|slot| record(slot).and_then(ResponseRecord::raw_value))
        .collect();
    let nulls: Vec<Option<bool>> = slots
        .iter()
        .map(|slot| record(slot).and_then(ResponseRecord::null_value))
        .collect();
    let values: Vec<Option<i64>> = slots.iter().map(|slot| slot.value.map(|v| v.0)).collect();
    let value_index: Vec<Option<u32>> = slots.iter().map(|slot| slot.value.map(|v| v.1)).collect();
    let text: Vec<Option<&str>> = slots
        .iter()
        .map(|slot| record(slot).and_then(ResponseRecord::text))
        .collect();
    let file: Vec<Option<&str>> = slots
        .iter()
        .map(|slot| record(slot).and_then(ResponseRecord::file))
        .collect();
    let date: Vec<Option<i32>> = slots
        .iter()
        .map(|slot| {
            record(slot)
                .and_then(ResponseRecord::date)
                .and_then(|d| i32::try_from((d - epoch).num_days()).ok())
        })
        .collect();
    let time: Vec<Option<i64>> = slots
        .iter()
        .map(|slot| {
            record(slot)
                .and_then(ResponseRecord::time)
                .map(|t| i64::from(t.num_seconds_from_midnight()) * NANOS_PER_SECOND)
        })
        .collect();
    let time_range: Vec<Option<i64>> = slots
        .iter()
        .map(|slot| {
            record(slot)
                .and_then(ResponseRecord::time_range)
                .map(|span| span.num_milliseconds())
        })
        .collect();
    let latitude: Vec<Option<f64>> = slots
        .iter()
        .map(|slot| record(slot).and_then(ResponseRecord::geo).map(|g| g.latitude))
        .collect();
    let longitude: Vec<Option<f64>> = slots
        .iter()
        .map(|slot| record(slot).and_then(ResponseRecord::geo).map(|g| g.longitude))
        .collect();
    let matrix_row: Vec<Option<&str>> = slots
        .iter()
        .map(|slot| {
            let (row, _) = slot.matrix?;
            let rows = record(slot)?.matrix()?;
            Some(rows[row].row.as_str())
        })
        .collect();
    let matrix_value: Vec<Option<i64>> = slots
        .iter()
        .map(|slot| slot.matrix.and_then(|(_, cell)| cell).map(|c| c.0))
        .collect();
    let matrix_value_index: Vec<Option<u32>> = slots
        .iter()
        .map(|slot| slot.matrix.and_then(|(_, cell)| cell).map(|c| c.1))
        .collect();

    out.with_column(Series::new(column_name("type").into(), kinds))?;
    out.with_column(Series::new(column_name("raw_value").into(), raw))?;
    out.with_column(Series::new(column_name("null_value").into(), nulls))?;
    out.with_column(Series::new(column_name("value").into(), values))?;
    out.with_column(Series::new(column_name("value_index").into(), value_index))?;
    out.with_column(Series::new(column_name("text").into(), text))?;
    out.with_column(Series::new(column_name("file").into(), file))?;
    out.with_column(Series::new(column_name("date").into(), date).cast(&DataType::Date)?)?;
    out.with_column(Series::new(column_name("time").into(), time).cast(&DataType::Time)?)?;
    out.with_column(
        Series::new(column_name("time_range").into(), time_range)
            .cast(&DataType::Duration(TimeUnit::Milliseconds))?,
    )?;
    out.with_column(Series::new(column_name("geo_latitude").into(), latitude))?;
    out.with_column(Series::new(column_name("geo_longitude").into(), longitude))?;
    out.with_column(Series::new(column_name("matrix_row").into(), matrix_row))?;
    out.with_column(Series::new(column_name("matrix_value").into(), matrix_value))?;
    out.with_column(Series::new(
        column_name("matrix_value_index").into(),
        matrix_value_index,
    ))?;

    debug!(
        rows_in = report.height(),
        rows_out = out.height(),
        "expanded responses"
    );
    Ok(out)
}

/// Finds the option list column: top-level `parsed_options`, the unnested
/// `item_options`, or the `options` field of the `item` record.
fn resolve_options(report: &ReportFrame) -> Result<(ReportFrame, &'static str)> {
    if report.nested(OPTIONS_COLUMN).is_some() {
        return Ok((report.clone(), OPTIONS_COLUMN));
    }
    if report.nested(ITEM_OPTIONS_COLUMN).is_some() {
        return Ok((report.clone(), ITEM_OPTIONS_COLUMN));
    }
    if let Some(NestedColumn::Record(item)) = report.nested(ITEM_RECORD) {
        if item.nested("options").is_some() {
            let flat = report.unnest_record(ITEM_RECORD, &format!("{ITEM_RECORD}_"))?;
            return Ok((flat, ITEM_OPTIONS_COLUMN));
        }
    }
    Err(ProcessError::missing_column(OPTIONS_COLUMN))
}

/// Expands the option list column into `option_*` columns, one row per
/// option, and removes duplicate rows.
///
/// # Errors
///
/// Fails when no option list column can be found.
pub fn expand_options(report: &ReportFrame) -> Result<ReportFrame> {
    let (frame, source) = resolve_options(report)?;
    let Some(NestedColumn::Options(lists)) = frame.nested(source) else {
        return Err(ProcessError::ColumnKind {
            column: source.to_string(),
            expected: "options",
        });
    };

    let mut rows = Vec::with_capacity(lists.len());
    let mut names = Vec::with_capacity(lists.len());
    let mut values = Vec::with_capacity(lists.len());
    let mut scores = Vec::with_capacity(lists.len());
    for (row, list) in lists.iter().enumerate() {
        match list {
            Some(options) if !options.is_empty() => {
                for option in options {
                    rows.push(row);
                    names.push(Some(option.name.as_str()));
                    values.push(Some(option.value));
                    scores.push(option.score);
                }
            }
            _ => {
                rows.push(row);
                names.push(None);
                values.push(None);
                scores.push(None);
            }
        }
    }

    let mut out = frame.take(&rows)?.drop_columns(&[source])?;
    out.with_column(Series::new(format!("{OPTION_PREFIX}name").into(), names))?;
    out.with_column(Series::new(format!("{OPTION_PREFIX}value").into(), values))?;
    out.with_column(Series::new(format!("{OPTION_PREFIX}score").into(), scores))?;
    let out = out.distinct()?;
    debug!(
        rows_in = report.height(),
        rows_out = out.height(),
        source,
        "expanded options"
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveTime, TimeDelta};
    use mindlogger_model::{MatrixRow, OptionRecord};
    use polars::prelude::{AnyValue, DataFrame, IntoColumn};

    use super::*;

    fn report(records: Vec<Option<ResponseRecord>>) -> ReportFrame {
        let ids: Vec<String> = (0..records.len()).map(|i| format!("r{i}")).collect();
        let mut report = ReportFrame::new(
            DataFrame::new(vec![Series::new("row_id".into(), ids).into_column()]).unwrap(),
        );
        report
            .with_nested(RESPONSE_COLUMN, NestedColumn::Response(records))
            .unwrap();
        report
    }

    #[test]
    fn value_list_gets_one_row_per_value() {
        let out = expand_responses(&report(vec![Some(ResponseRecord::Value(vec![1, 2, 3]))])).unwrap();
        assert_eq!(out.height(), 3);
        let values = out.column("response_value").unwrap();
        let index = out.column("response_value_index").unwrap();
        for row in 0..3 {
            assert_eq!(values.get(row).unwrap(), AnyValue::Int64(row as i64 + 1));
            assert_eq!(index.get(row).unwrap(), AnyValue::UInt32(row as u32));
        }
        assert_eq!(out.strings("response_type").unwrap()[0].as_deref(), Some("value"));
    }

    #[test]
    fn matrix_rows_expand_with_their_values() {
        let matrix = ResponseRecord::Matrix(vec![
            MatrixRow::new("row1", vec![1, 2]),
            MatrixRow::new("row2", vec![3, 4]),
        ]);
        let out = expand_responses(&report(vec![Some(matrix)])).unwrap();
        assert_eq!(out.height(), 4);
        let rows = out.strings("response_matrix_row").unwrap();
        assert_eq!(
            rows.iter().map(|r| r.as_deref().unwrap()).collect::<Vec<_>>(),
            vec!["row1", "row1", "row2", "row2"]
        );
        let index = out.column("response_matrix_value_index").unwrap();
        assert_eq!(index.get(2).unwrap(), AnyValue::UInt32(0));
        assert_eq!(index.get(3).unwrap(), AnyValue::UInt32(1));
        assert_eq!(out.column("response_value").unwrap().null_count(), 4);
    }

    #[test]
    fn null_and_scalar_records_keep_one_row() {
        let out = expand_responses(&report(vec![
            None,
            Some(ResponseRecord::Text("hello".into())),
            Some(ResponseRecord::Value(Vec::new())),
            Some(ResponseRecord::TimeRange(TimeDelta::minutes(-30))),
            Some(ResponseRecord::Time(NaiveTime::from_hms_opt(9, 30, 0).unwrap())),
        ]))
        .unwrap();
        assert_eq!(out.height(), 5);
        let kinds = out.strings("response_type").unwrap();
        assert_eq!(kinds[0], None);
        assert_eq!(kinds[1].as_deref(), Some("text"));
        assert_eq!(out.strings("response_text").unwrap()[1].as_deref(), Some("hello"));
        assert_eq!(
            out.column("response_time_range").unwrap().dtype(),
            &DataType::Duration(TimeUnit::Milliseconds)
        );
        let range = out
            .column("response_time_range")
            .unwrap()
            .cast(&DataType::Int64)
            .unwrap();
        assert_eq!(range.get(3).unwrap(), AnyValue::Int64(-30 * 60 * 1000));
        assert_eq!(out.column("response_time").unwrap().dtype(), &DataType::Time);
    }

    #[test]
    fn options_explode_and_deduplicate() {
        let options = vec![
            OptionRecord::new("No", 0, Some(0)),
            OptionRecord::new("Yes", 1, Some(2)),
        ];
        let mut input = ReportFrame::new(
            DataFrame::new(vec![Series::new("item_id".into(), &["i1", "i1", "i2"]).into_column()])
                .unwrap(),
        );
        input
            .with_nested(
                OPTIONS_COLUMN,
                NestedColumn::Options(vec![Some(options.clone()), Some(options), None]),
            )
            .unwrap();

        let out = expand_options(&input).unwrap();
        assert_eq!(
            out.column_names(),
            vec!["item_id", "option_name", "option_value", "option_score"]
        );
        assert_eq!(out.height(), 3);
        let names = out.strings("option_name").unwrap();
        assert_eq!(names, vec![Some("No".into()), Some("Yes".into()), None]);
    }

    #[test]
    fn missing_columns_are_errors() {
        let empty = ReportFrame::new(
            DataFrame::new(vec![Series::new("item_id".into(), &["i1"]).into_column()]).unwrap(),
        );
        assert!(matches!(
            expand_responses(&empty),
            Err(ProcessError::MissingColumn { .. })
        ));
        assert!(matches!(
            expand_options(&empty),
            Err(ProcessError::MissingColumn { .. })
        ));
    }
}
