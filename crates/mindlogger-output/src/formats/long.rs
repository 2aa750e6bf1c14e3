use mindlogger_core::{ReportFrame, expand_responses};

use super::{ExtraArguments, NamedOutput, OutputFormat};
use crate::error::Result;

/// The processed report as-is.
pub struct ReportFormat;

impl OutputFormat for ReportFormat {
    fn name(&self) -> &'static str {
        "report"
    }

    fn description(&self) -> &'static str {
        "Processed report with parsed responses and grouped records"
    }

    fn produce(&self, report: &ReportFrame, _extra: &ExtraArguments) -> Result<Vec<NamedOutput>> {
        Ok(vec![NamedOutput::new("report", report.clone())])
    }
}

/// One row per response value, with every record flattened.
pub fn long_data(report: &ReportFrame) -> Result<ReportFrame> {
    Ok(expand_responses(&report.flatten_records()?)?)
}

/// Long data: responses expanded into typed `response_*` columns.
pub struct LongDataFormat;

impl OutputFormat for LongDataFormat {
    fn name(&self) -> &'static str {
        "long"
    }

    fn description(&self) -> &'static str {
        "One row per response value with typed response columns"
    }

    fn produce(&self, report: &ReportFrame, _extra: &ExtraArguments) -> Result<Vec<NamedOutput>> {
        Ok(vec![NamedOutput::new("long_data", long_data(report)?)])
    }
}
