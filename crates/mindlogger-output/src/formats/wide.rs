//! Wide data: one row per submission, one column per item value.

use std::collections::{BTreeMap, HashMap};

use mindlogger_core::{RESPONSE_PREFIX, ReportFrame};
use tracing::debug;

use super::{ExtraArguments, NamedOutput, OutputFormat, gather, long_data, present};
use crate::error::Result;

/// Response fields spread into wide columns.
pub const WIDE_FIELDS: [&str; 4] = ["raw_value", "null_value", "value", "text"];

/// Columns identifying one submission row in the wide table.
const INDEX_COLUMNS: &[&str] = &[
    "account_user_id",
    "account_user_secret_id",
    "target_user_id",
    "target_user_secret_id",
    "source_user_id",
    "source_user_secret_id",
    "source_user_relation",
    "input_user_secret_id",
    "applet_version",
    "activity_flow_id",
    "activity_flow_name",
    "activity_flow_submission_id",
    "activity_id",
    "activity_name",
    "activity_submission_id",
    "activity_schedule_start_time_dt",
    "activity_start_time_dt",
    "activity_end_time_dt",
];

fn value_indices(long: &ReportFrame) -> Result<Vec<u32>> {
    let name = format!("{RESPONSE_PREFIX}value_index");
    Ok(long
        .column(&name)?
        .u32()?
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect())
}

/// Pivots long data to one row per submission.
///
/// Each item value becomes the columns `<item_name>__<value_index>__<field>`
/// for every field in [`WIDE_FIELDS`]. Items without a name fall back to
/// their id. Columns that are null in every row are dropped.
pub fn wide_data(report: &ReportFrame) -> Result<ReportFrame> {
    let long = long_data(report)?;
    let index = present(&long, INDEX_COLUMNS);
    let keys = long.select(&index)?;

    let labels = match (long.has_column("item_name"), long.has_column("item_id")) {
        (true, true) => {
            let ids = long.strings("item_id")?;
            long.strings("item_name")?
                .into_iter()
                .zip(ids)
                .map(|(name, id)| name.or(id))
                .collect()
        }
        (true, false) => long.strings("item_name")?,
        (false, true) => long.strings("item_id")?,
        (false, false) => vec![None; long.height()],
    };
    let value_index = value_indices(&long)?;

    let mut groups: HashMap<String, usize> = HashMap::new();
    let mut first_rows: Vec<usize> = Vec::new();
    let mut cells: BTreeMap<(String, u32), Vec<Option<usize>>> = BTreeMap::new();
    for row in 0..long.height() {
        let key = keys.row_key(row)?;
        let group = *groups.entry(key).or_insert_with(|| {
            first_rows.push(row);
            first_rows.len() - 1
        });
        let Some(label) = &labels[row] else {
            continue;
        };
        let slots = cells.entry((label.clone(), value_index[row])).or_default();
        if slots.len() <= group {
            slots.resize(group + 1, None);
        }
        slots[group].get_or_insert(row);
    }

    let mut wide = keys.take(&first_rows)?;
    let height = wide.height();
    let mut dropped = 0usize;
    for ((label, position), mut slots) in cells {
        slots.resize(height, None);
        for field in WIDE_FIELDS {
            let source = format!("{RESPONSE_PREFIX}{field}");
            let name = format!("{label}__{position}__{field}");
            let column = gather(long.column(&source)?, &slots, &name)?;
            if column.null_count() == height {
                dropped += 1;
                continue;
            }
            wide.with_column(column)?;
        }
    }
    debug!(
        rows = height,
        columns = wide.width(),
        dropped,
        "pivoted long data"
    );
    Ok(wide)
}

pub struct WideFormat;

impl OutputFormat for WideFormat {
    fn name(&self) -> &'static str {
        "wide"
    }

    fn description(&self) -> &'static str {
        "One row per submission with one column per item value"
    }

    fn produce(&self, report: &ReportFrame, _extra: &ExtraArguments) -> Result<Vec<NamedOutput>> {
        Ok(vec![NamedOutput::new("wide_data", wide_data(report)?)])
    }
}
