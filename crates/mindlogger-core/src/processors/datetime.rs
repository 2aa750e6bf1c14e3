//! Datetime columns derived from epoch-millisecond `*_time` columns.

use chrono::DateTime;
use chrono_tz::Tz;
use mindlogger_ingest::parse_i64;
use polars::prelude::{DataType, NamedFrom, Series, TimeUnit};
use tracing::debug;

use super::ReportProcessor;
use crate::config::ProcessingContext;
use crate::error::Result;
use crate::frame::ReportFrame;

/// Suffix of epoch-millisecond source columns.
pub const TIME_SUFFIX: &str = "_time";
/// Appended to a source column for its UTC datetime.
pub const UTC_SUFFIX: &str = "_dt";
/// Appended to a UTC datetime column for its local wall-clock datetime.
pub const LOCAL_SUFFIX: &str = "_local";

fn datetime_type() -> DataType {
    DataType::Datetime(TimeUnit::Milliseconds, None)
}

fn millis_series(name: String, millis: Vec<Option<i64>>) -> Result<Series> {
    Ok(Series::new(name.into(), millis).cast(&datetime_type())?)
}

/// Adds `<col>_dt` for every `<col>_time` column.
///
/// Values that are not whole epoch milliseconds become null.
pub struct DateTimeProcessor;

impl ReportProcessor for DateTimeProcessor {
    fn name(&self) -> &'static str {
        "DateTime"
    }

    fn description(&self) -> &'static str {
        "Derive UTC datetimes from epoch millisecond columns"
    }

    fn priority(&self) -> i32 {
        10
    }

    fn process(&self, report: &ReportFrame, _context: &ProcessingContext) -> Result<ReportFrame> {
        let mut out = report.clone();
        for name in report.data().get_column_names() {
            if !name.ends_with(TIME_SUFFIX) {
                continue;
            }
            let millis: Vec<Option<i64>> = report
                .strings(name)?
                .iter()
                .map(|value| value.as_deref().and_then(parse_i64))
                .collect();
            let derived = format!("{name}{UTC_SUFFIX}");
            debug!(
                source = %name,
                column = %derived,
                nulls = millis.iter().filter(|v| v.is_none()).count(),
                "derived UTC datetime"
            );
            out.with_column(millis_series(derived, millis)?)?;
        }
        Ok(out)
    }
}

/// Adds `<col>_dt_local` for every `<col>_time_dt` column.
///
/// The local value is the wall-clock time in the configured timezone, stored
/// without a zone. Without a timezone the report is returned unchanged.
pub struct LocalDateTimeProcessor;

impl ReportProcessor for LocalDateTimeProcessor {
    fn name(&self) -> &'static str {
        "LocalDateTime"
    }

    fn description(&self) -> &'static str {
        "Derive local wall-clock datetimes in the configured timezone"
    }

    fn priority(&self) -> i32 {
        11
    }

    fn dependencies(&self) -> &'static [&'static str] {
        &["DateTime"]
    }

    fn process(&self, report: &ReportFrame, context: &ProcessingContext) -> Result<ReportFrame> {
        let Some(timezone) = context.timezone else {
            debug!("no timezone configured; skipping local datetimes");
            return Ok(report.clone());
        };
        let utc_suffix = format!("{TIME_SUFFIX}{UTC_SUFFIX}");
        let mut out = report.clone();
        for column in report.data().get_columns() {
            if !column.name().ends_with(&utc_suffix) {
                continue;
            }
            let millis = column.cast(&DataType::Int64)?;
            let local: Vec<Option<i64>> = millis
                .as_materialized_series()
                .i64()?
                .into_iter()
                .map(|value| value.and_then(|ms| to_local_millis(ms, timezone)))
                .collect();
            out.with_column(millis_series(
                format!("{}{LOCAL_SUFFIX}", column.name()),
                local,
            )?)?;
        }
        Ok(out)
    }
}

/// Wall-clock milliseconds in `timezone` for a UTC instant.
fn to_local_millis(ms: i64, timezone: Tz) -> Option<i64> {
    let utc = DateTime::from_timestamp_millis(ms)?;
    Some(
        utc.with_timezone(&timezone)
            .naive_local()
            .and_utc()
            .timestamp_millis(),
    )
}
