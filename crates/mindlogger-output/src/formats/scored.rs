//! Responses matched to the option they selected.

use std::collections::HashMap;

use mindlogger_core::{OPTION_PREFIX, ProcessError, RESPONSE_PREFIX, ReportFrame, expand_options};
use tracing::debug;

use super::{ExtraArguments, NamedOutput, OutputFormat, data_dictionary, gather, long_data, present};
use crate::error::Result;

/// Columns identifying an item in both the long data and the options table.
const ITEM_KEY: &[&str] = &["applet_version", "activity_id", "item_id"];

type JoinKey = (Vec<String>, i64);

fn join_keys(
    frame: &ReportFrame,
    key_columns: &[&str],
    value_column: &str,
) -> Result<Vec<Option<JoinKey>>> {
    let keys = key_columns
        .iter()
        .map(|name| frame.strings(name))
        .collect::<std::result::Result<Vec<_>, ProcessError>>()?;
    let values: Vec<Option<i64>> = frame.column(value_column)?.i64()?.into_iter().collect();
    Ok((0..frame.height())
        .map(|row| {
            let value = values[row]?;
            let parts = keys
                .iter()
                .map(|column| column[row].clone())
                .collect::<Option<Vec<String>>>()?;
            Some((parts, value))
        })
        .collect())
}

/// Long data left-joined to the options table on item identity and
/// `response_value = option_value`.
///
/// Every long row is kept. Rows whose value matches no option get null
/// `option_name` and `option_score`.
pub fn scored_responses(report: &ReportFrame) -> Result<ReportFrame> {
    let long = long_data(report)?;
    let options = expand_options(&data_dictionary(report)?)?;

    let key_columns: Vec<&str> = present(&long, ITEM_KEY)
        .into_iter()
        .filter(|name| options.has_column(name))
        .collect();
    let response_value = format!("{RESPONSE_PREFIX}value");
    let option_value = format!("{OPTION_PREFIX}value");

    let mut index: HashMap<JoinKey, usize> = HashMap::new();
    for (row, key) in join_keys(&options, &key_columns, &option_value)?
        .into_iter()
        .enumerate()
    {
        if let Some(key) = key {
            index.entry(key).or_insert(row);
        }
    }
    let matches: Vec<Option<usize>> = join_keys(&long, &key_columns, &response_value)?
        .into_iter()
        .map(|key| key.and_then(|key| index.get(&key).copied()))
        .collect();
    debug!(
        rows = long.height(),
        matched = matches.iter().filter(|m| m.is_some()).count(),
        "matched responses to options"
    );

    let mut scored = long;
    for field in ["name", "score"] {
        let name = format!("{OPTION_PREFIX}{field}");
        scored.with_column(gather(options.column(&name)?, &matches, &name)?)?;
    }
    Ok(scored)
}

pub struct ScoredResponsesFormat;

impl OutputFormat for ScoredResponsesFormat {
    fn name(&self) -> &'static str {
        "scored"
    }

    fn description(&self) -> &'static str {
        "Long data with the name and score of the selected option"
    }

    fn produce(&self, report: &ReportFrame, _extra: &ExtraArguments) -> Result<Vec<NamedOutput>> {
        Ok(vec![NamedOutput::new(
            "scored_responses",
            scored_responses(report)?,
        )])
    }
}
