//! Item definitions: the data dictionary and its per-option expansion.

use mindlogger_core::{ITEM_OPTIONS_COLUMN, ProcessError, ReportFrame, expand_options};

use super::{ExtraArguments, NamedOutput, OutputFormat, present};
use crate::error::Result;

const DICTIONARY_COLUMNS: &[&str] = &[
    "applet_version",
    "activity_flow_id",
    "activity_flow_name",
    "activity_id",
    "activity_name",
    "item_id",
    "item_name",
    "item_prompt",
    "item_response_options",
    ITEM_OPTIONS_COLUMN,
];

/// Distinct item definitions across the report.
///
/// # Errors
///
/// Fails when the report has no `item_id` column.
pub fn data_dictionary(report: &ReportFrame) -> Result<ReportFrame> {
    let flat = report.flatten_records()?;
    if !flat.has_column("item_id") {
        return Err(ProcessError::missing_column("item_id").into());
    }
    let columns = present(&flat, DICTIONARY_COLUMNS);
    Ok(flat.select(&columns)?.distinct()?)
}

pub struct DataDictionaryFormat;

impl OutputFormat for DataDictionaryFormat {
    fn name(&self) -> &'static str {
        "dictionary"
    }

    fn description(&self) -> &'static str {
        "Distinct item definitions with raw and parsed options"
    }

    fn produce(&self, report: &ReportFrame, _extra: &ExtraArguments) -> Result<Vec<NamedOutput>> {
        Ok(vec![NamedOutput::new(
            "data_dictionary",
            data_dictionary(report)?,
        )])
    }
}

/// Like the data dictionary, but one row per option with its name, value
/// and score in separate columns.
pub struct OptionsFormat;

impl OutputFormat for OptionsFormat {
    fn name(&self) -> &'static str {
        "options"
    }

    fn description(&self) -> &'static str {
        "One row per item option with name, value and score"
    }

    fn produce(&self, report: &ReportFrame, _extra: &ExtraArguments) -> Result<Vec<NamedOutput>> {
        let options = expand_options(&data_dictionary(report)?)?;
        Ok(vec![NamedOutput::new("options", options)])
    }
}
