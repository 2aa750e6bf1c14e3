//! Nested columns decoded from the response and options grammars.

use mindlogger_model::ParseError;
use mindlogger_parse::{parse_options, parse_response};
use tracing::debug;

use super::ReportProcessor;
use crate::config::ProcessingContext;
use crate::error::{ProcessError, Result};
use crate::frame::{NestedColumn, ReportFrame};

pub const RESPONSE_SOURCE: &str = "item_response";
pub const RESPONSE_COLUMN: &str = "response";
pub const OPTIONS_SOURCE: &str = "item_response_options";
pub const OPTIONS_COLUMN: &str = "parsed_options";

/// Parses every non-blank cell of `source`; blank and null cells map to
/// `None`. Returns `None` when the column is absent.
fn parse_column<T>(
    report: &ReportFrame,
    processor: &'static str,
    source: &str,
    parse: impl Fn(&str) -> std::result::Result<T, ParseError>,
) -> Result<Option<Vec<Option<T>>>> {
    if !report.has_column(source) {
        debug!(column = source, "source column absent; skipping");
        return Ok(None);
    }
    let cells = report.strings(source)?;
    let mut parsed = Vec::with_capacity(cells.len());
    for (row, cell) in cells.iter().enumerate() {
        let value = match cell.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(text) => Some(parse(text).map_err(|source_error| ProcessError::Parse {
                processor,
                column: source.to_string(),
                row,
                source: source_error,
            })?),
        };
        parsed.push(value);
    }
    debug!(
        column = source,
        rows = parsed.len(),
        parsed = parsed.iter().filter(|v| v.is_some()).count(),
        "parsed column"
    );
    Ok(Some(parsed))
}

/// Decodes `item_response` into the nested `response` column.
pub struct ResponseStructProcessor;

impl ReportProcessor for ResponseStructProcessor {
    fn name(&self) -> &'static str {
        "ResponseStruct"
    }

    fn description(&self) -> &'static str {
        "Parse item responses into structured records"
    }

    fn priority(&self) -> i32 {
        20
    }

    fn process(&self, report: &ReportFrame, _context: &ProcessingContext) -> Result<ReportFrame> {
        let Some(parsed) = parse_column(report, self.name(), RESPONSE_SOURCE, parse_response)?
        else {
            return Ok(report.clone());
        };
        let mut out = report.clone();
        out.with_nested(RESPONSE_COLUMN, NestedColumn::Response(parsed))?;
        Ok(out)
    }
}

/// Decodes `item_response_options` into the nested `parsed_options` column.
pub struct OptionsStructProcessor;

impl ReportProcessor for OptionsStructProcessor {
    fn name(&self) -> &'static str {
        "OptionsStruct"
    }

    fn description(&self) -> &'static str {
        "Parse item response options into option lists"
    }

    fn priority(&self) -> i32 {
        20
    }

    fn process(&self, report: &ReportFrame, _context: &ProcessingContext) -> Result<ReportFrame> {
        let Some(parsed) = parse_column(report, self.name(), OPTIONS_SOURCE, parse_options)? else {
            return Ok(report.clone());
        };
        let mut out = report.clone();
        out.with_nested(OPTIONS_COLUMN, NestedColumn::Options(parsed))?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use mindlogger_model::{Grammar, OptionRecord, ResponseRecord};
    use polars::prelude::{DataFrame, IntoColumn, NamedFrom, Series};

    use super::*;

    fn report(column: &str, values: &[Option<&str>]) -> ReportFrame {
        ReportFrame::new(
            DataFrame::new(vec![Series::new(column.into(), values).into_column()]).unwrap(),
        )
    }

    #[test]
    fn responses_keep_the_source_column() {
        let input = report(RESPONSE_SOURCE, &[Some("value: 1, 2"), Some("  "), None]);
        let out = ResponseStructProcessor
            .process(&input, &ProcessingContext::new())
            .unwrap();
        assert_eq!(out.column_names(), vec!["item_response", "response"]);
        let Some(NestedColumn::Response(values)) = out.nested(RESPONSE_COLUMN) else {
            panic!("response column missing");
        };
        assert_eq!(values[0], Some(ResponseRecord::Value(vec![1, 2])));
        assert_eq!(values[1], None);
        assert_eq!(values[2], None);
    }

    #[test]
    fn options_parse_error_carries_row() {
        let input = report(OPTIONS_SOURCE, &[Some("Yes: 1"), Some("Yes: 1 (score: 2), No: 0")]);
        let err = OptionsStructProcessor
            .process(&input, &ProcessingContext::new())
            .unwrap_err();
        let ProcessError::Parse {
            processor,
            column,
            row,
            source,
        } = err
        else {
            panic!("expected a parse error, got {err:?}");
        };
        assert_eq!(processor, "OptionsStruct");
        assert_eq!(column, OPTIONS_SOURCE);
        assert_eq!(row, 1);
        assert_eq!(source.grammar, Grammar::Options);
    }

    #[test]
    fn options_are_nested() {
        let input = report(OPTIONS_SOURCE, &[Some("Min: 0, Max: 1"), None]);
        let out = OptionsStructProcessor
            .process(&input, &ProcessingContext::new())
            .unwrap();
        let Some(NestedColumn::Options(values)) = out.nested(OPTIONS_COLUMN) else {
            panic!("options column missing");
        };
        assert_eq!(
            values[0],
            Some(vec![
                OptionRecord::from_range_step(0),
                OptionRecord::from_range_step(1)
            ])
        );
        assert_eq!(values[1], None);
    }

    #[test]
    fn missing_source_is_not_an_error() {
        let input = report("item_id", &[Some("i1")]);
        let out = ResponseStructProcessor
            .process(&input, &ProcessingContext::new())
            .unwrap();
        assert!(out.nested(RESPONSE_COLUMN).is_none());
    }
}
