//! Subscale unpivoting.
//!
//! Some instruments export computed subscale scores as extra columns on every
//! row of a submission. These are turned into response-shaped rows so they
//! flow through the same outputs as item responses.

use polars::prelude::{NamedFrom, Series};
use tracing::{debug, info};

use super::ReportProcessor;
use crate::config::ProcessingContext;
use crate::error::Result;
use crate::frame::{NestedColumn, ReportFrame};

pub const SUBSCALE_PREFIX: &str = "subscale_name_";
pub const FINAL_SUBSCALE_COLUMN: &str = "Final SubScale Score";
pub const SUBSCALE_ITEM_TYPE: &str = "subscale";
const RAW_SCORE_COLUMN: &str = "rawScore";
const ITEM_PREFIX: &str = "item_";

pub fn is_subscale_column(name: &str) -> bool {
    name.starts_with(SUBSCALE_PREFIX) || name == FINAL_SUBSCALE_COLUMN
}

/// Emits one `item_type = "subscale"` row per non-blank subscale value.
///
/// New rows copy the identity columns of the row they came from. Their item
/// and response columns are reset: `item_id` is the subscale column name,
/// `item_name` the name without its prefix, and `item_response` the score.
/// Identical new rows, such as the same score repeated on every item row of a
/// submission, are emitted once. Subscale columns are dropped.
pub struct SubscaleProcessor;

impl ReportProcessor for SubscaleProcessor {
    fn name(&self) -> &'static str {
        "Subscale"
    }

    fn description(&self) -> &'static str {
        "Unpivot subscale score columns into subscale rows"
    }

    fn priority(&self) -> i32 {
        2
    }

    fn process(&self, report: &ReportFrame, _context: &ProcessingContext) -> Result<ReportFrame> {
        let columns: Vec<String> = report
            .column_names()
            .into_iter()
            .filter(|name| is_subscale_column(name))
            .collect();
        if columns.is_empty() {
            return Ok(report.clone());
        }
        let names: Vec<&str> = columns.iter().map(String::as_str).collect();
        let base = report.drop_columns(&names)?;

        let mut rows = Vec::new();
        let mut item_ids = Vec::new();
        let mut item_names = Vec::new();
        let mut scores = Vec::new();
        for column in &columns {
            for (row, value) in report.strings(column)?.into_iter().enumerate() {
                let Some(value) = value.filter(|v| !v.trim().is_empty()) else {
                    continue;
                };
                rows.push(row);
                item_ids.push(column.clone());
                let item_name = column.strip_prefix(SUBSCALE_PREFIX).unwrap_or(column);
                item_names.push(item_name.to_string());
                scores.push(value.trim().to_string());
            }
        }
        if rows.is_empty() {
            debug!(columns = columns.len(), "subscale columns are empty");
            return Ok(base);
        }

        let mut subscales = base.take(&rows)?;
        for name in subscales.column_names() {
            let reset = name.starts_with(ITEM_PREFIX)
                || name == RAW_SCORE_COLUMN
                || matches!(
                    subscales.nested(&name),
                    Some(NestedColumn::Response(_) | NestedColumn::Options(_))
                );
            if reset {
                subscales.null_column(&name)?;
            }
        }
        let item_types = vec![SUBSCALE_ITEM_TYPE; rows.len()];
        subscales.with_column(Series::new("item_id".into(), item_ids))?;
        subscales.with_column(Series::new("item_name".into(), item_names))?;
        subscales.with_column(Series::new("item_type".into(), item_types))?;
        subscales.with_column(Series::new("item_response".into(), scores))?;
        let subscales = subscales.distinct()?;

        info!(
            columns = columns.len(),
            rows = subscales.height(),
            "unpivoted subscale columns"
        );
        base.concat(&subscales)
    }
}

#[cfg(test)]
mod tests {
    use polars::prelude::{DataFrame, IntoColumn};

    use super::*;

    fn report() -> ReportFrame {
        let column =
            |name: &str, values: &[Option<&str>]| Series::new(name.into(), values).into_column();
        ReportFrame::new(
            DataFrame::new(vec![
                column("activity_submission_id", &[Some("s1"), Some("s1"), Some("s2")]),
                column("item_id", &[Some("i1"), Some("i2"), Some("i1")]),
                column("item_name", &[Some("q1"), Some("q2"), Some("q1")]),
                column(
                    "item_response",
                    &[Some("value: 1"), Some("value: 2"), Some("value: 0")],
                ),
                column("subscale_name_Anxiety", &[Some("3"), Some("3"), None]),
                column(FINAL_SUBSCALE_COLUMN, &[Some("10"), Some("10"), Some(" ")]),
            ])
            .unwrap(),
        )
    }

    #[test]
    fn unpivots_and_deduplicates() {
        let out = SubscaleProcessor
            .process(&report(), &ProcessingContext::new())
            .unwrap();
        assert_eq!(
            out.column_names(),
            vec![
                "activity_submission_id",
                "item_id",
                "item_name",
                "item_response",
                "item_type"
            ]
        );
        // Three item rows plus one row per subscale for submission s1.
        assert_eq!(out.height(), 5);
        let ids = out.strings("item_id").unwrap();
        assert_eq!(ids[3].as_deref(), Some("subscale_name_Anxiety"));
        assert_eq!(ids[4].as_deref(), Some(FINAL_SUBSCALE_COLUMN));
        let names = out.strings("item_name").unwrap();
        assert_eq!(names[3].as_deref(), Some("Anxiety"));
        assert_eq!(names[4].as_deref(), Some(FINAL_SUBSCALE_COLUMN));
        let responses = out.strings("item_response").unwrap();
        assert_eq!(responses[3].as_deref(), Some("3"));
        assert_eq!(responses[4].as_deref(), Some("10"));
        let types = out.strings("item_type").unwrap();
        assert_eq!(types[0], None);
        assert_eq!(types[4].as_deref(), Some(SUBSCALE_ITEM_TYPE));
        let submissions = out.strings("activity_submission_id").unwrap();
        assert_eq!(submissions[4].as_deref(), Some("s1"));
    }

    #[test]
    fn passes_through_without_subscales() {
        let input = report()
            .drop_columns(&["subscale_name_Anxiety", FINAL_SUBSCALE_COLUMN])
            .unwrap();
        let out = SubscaleProcessor
            .process(&input, &ProcessingContext::new())
            .unwrap();
        assert_eq!(out.height(), 3);
        assert_eq!(out.column_names(), input.column_names());
    }
}
