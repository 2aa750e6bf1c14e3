use polars::prelude::DataType;
use tracing::debug;

use super::ReportProcessor;
use crate::config::ProcessingContext;
use crate::error::Result;
use crate::frame::ReportFrame;

pub const LEGACY_USER_ID_COLUMN: &str = "legacy_user_id";

/// Columns whose values are identifiers and must stay text even when every
/// value happens to be numeric.
pub const STRING_CAST_COLUMNS: &[&str] = &["target_secret_id"];

/// Removes the legacy user id column.
pub struct DropLegacyUserIdProcessor;

impl ReportProcessor for DropLegacyUserIdProcessor {
    fn name(&self) -> &'static str {
        "DropLegacyUserId"
    }

    fn description(&self) -> &'static str {
        "Drop the legacy user id column"
    }

    fn priority(&self) -> i32 {
        0
    }

    fn process(&self, report: &ReportFrame, _context: &ProcessingContext) -> Result<ReportFrame> {
        report.drop_columns(&[LEGACY_USER_ID_COLUMN])
    }
}

/// Re-types identifier columns as text, keeping names and values.
pub struct ColumnCastProcessor;

impl ReportProcessor for ColumnCastProcessor {
    fn name(&self) -> &'static str {
        "ColumnCast"
    }

    fn description(&self) -> &'static str {
        "Cast identifier columns to string"
    }

    fn priority(&self) -> i32 {
        1
    }

    fn process(&self, report: &ReportFrame, _context: &ProcessingContext) -> Result<ReportFrame> {
        let mut out = report.clone();
        for name in STRING_CAST_COLUMNS {
            let Ok(column) = report.column(name) else {
                continue;
            };
            if column.dtype() == &DataType::String {
                continue;
            }
            debug!(column = name, from = %column.dtype(), "casting column to string");
            out.with_column(column.cast(&DataType::String)?)?;
        }
        Ok(out)
    }
}

/// Pass-through; disabled unless selected by name.
pub struct IdentityProcessor;

impl ReportProcessor for IdentityProcessor {
    fn name(&self) -> &'static str {
        "Identity"
    }

    fn description(&self) -> &'static str {
        "Return the report unchanged"
    }

    fn priority(&self) -> i32 {
        -1
    }

    fn process(&self, report: &ReportFrame, _context: &ProcessingContext) -> Result<ReportFrame> {
        Ok(report.clone())
    }
}

#[cfg(test)]
mod tests {
    use polars::prelude::{DataFrame, IntoColumn, NamedFrom, Series};

    use super::*;

    fn report() -> ReportFrame {
        ReportFrame::new(
            DataFrame::new(vec![
                Series::new("legacy_user_id".into(), &["u1", "u2"]).into_column(),
                Series::new("target_secret_id".into(), &[101i64, 102]).into_column(),
                Series::new("item_id".into(), &["i1", "i2"]).into_column(),
            ])
            .unwrap(),
        )
    }

    #[test]
    fn drops_only_the_legacy_column() {
        let out = DropLegacyUserIdProcessor
            .process(&report(), &ProcessingContext::new())
            .unwrap();
        assert_eq!(out.column_names(), vec!["target_secret_id", "item_id"]);
    }

    #[test]
    fn casts_secret_id_in_place() {
        let out = ColumnCastProcessor
            .process(&report(), &ProcessingContext::new())
            .unwrap();
        assert_eq!(
            out.column_names(),
            vec!["legacy_user_id", "target_secret_id", "item_id"]
        );
        let column = out.column("target_secret_id").unwrap();
        assert_eq!(column.dtype(), &DataType::String);
        assert_eq!(out.strings("target_secret_id").unwrap()[1].as_deref(), Some("102"));
    }

    #[test]
    fn absent_columns_are_ignored() {
        let empty = ReportFrame::new(
            DataFrame::new(vec![Series::new("item_id".into(), &["i1"]).into_column()]).unwrap(),
        );
        let context = ProcessingContext::new();
        assert_eq!(DropLegacyUserIdProcessor.process(&empty, &context).unwrap().width(), 1);
        assert_eq!(ColumnCastProcessor.process(&empty, &context).unwrap().width(), 1);
    }
}
