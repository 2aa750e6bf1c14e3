//! YMHA attendance and completion reports.
//!
//! Needs a participant roster given with `-e ymha_participants=<csv>`. The
//! roster must have `secretUserId` and `site` columns; `nickname`,
//! `firstName`, `lastName` and `room` are carried when present.
//!
//! Activities whose name starts with `Student Check` (check-ins and
//! check-outs) feed the attendance report: one row per participant and
//! activity date, one boolean column per activity, split by site and date.
//! Every other activity feeds the completion report: one row per
//! participant, one boolean column per activity plus `complete`, split by
//! site. An activity counts as done when the participant has any response
//! row for it.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate};
use mindlogger_core::{ProcessError, ReportFrame};
use mindlogger_ingest::read_csv_table;
use polars::prelude::{Column, DataFrame, DataType, IntoColumn, NamedFrom, Series};
use tracing::info;

use super::{ExtraArguments, NamedOutput, OutputFormat};
use crate::error::{OutputError, Result};

pub const PARTICIPANTS_ARGUMENT: &str = "ymha_participants";

const ATTENDANCE_PREFIX: &str = "Student Check";
const DATE_COLUMN: &str = "activity_date";
const COMPLETE_COLUMN: &str = "complete";

/// Roster header, output name and whether the column is required.
const ROSTER_COLUMNS: [(&str, &str, bool); 6] = [
    ("secretUserId", "secret_id", true),
    ("nickname", "nickname", false),
    ("firstName", "first_name", false),
    ("lastName", "last_name", false),
    ("site", "site", true),
    ("room", "room", false),
];

/// Participant roster columns, in output order.
struct Roster {
    columns: Vec<(&'static str, Vec<Option<String>>)>,
    len: usize,
}

impl Roster {
    fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(OutputError::MissingFile {
                path: path.to_path_buf(),
            });
        }
        let table = read_csv_table(path)?;
        let mut found = Vec::new();
        for (header, name, required) in ROSTER_COLUMNS {
            match table.headers.iter().position(|h| h == header) {
                Some(index) => found.push((name, index)),
                None if required => {
                    return Err(OutputError::MissingColumn {
                        column: header.to_string(),
                        path: path.to_path_buf(),
                    });
                }
                None => {}
            }
        }
        let columns = found
            .into_iter()
            .map(|(name, index)| {
                let values = table
                    .rows
                    .iter()
                    .map(|row| row.get(index).cloned().flatten().map(|v| v.trim().to_string()))
                    .collect();
                (name, values)
            })
            .collect();
        Ok(Self {
            columns,
            len: table.rows.len(),
        })
    }

    fn values(&self, name: &str) -> &[Option<String>] {
        self.columns
            .iter()
            .find(|(existing, _)| *existing == name)
            .map_or(&[], |(_, values)| values.as_slice())
    }

    fn names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|(name, _)| *name).collect()
    }

    /// Roster columns repeated for the given participant rows.
    fn columns_for(&self, rows: &[usize]) -> Vec<Column> {
        self.columns
            .iter()
            .map(|(name, values)| {
                let gathered: Vec<Option<&str>> =
                    rows.iter().map(|&row| values[row].as_deref()).collect();
                Series::new((*name).into(), gathered).into_column()
            })
            .collect()
    }
}

/// Response rows reduced to participant, activity and date.
struct Activities {
    /// (secret_id, activity, date) for check-in and check-out activities.
    attendance: HashSet<(String, String, NaiveDate)>,
    attendance_names: BTreeSet<String>,
    dates: BTreeSet<NaiveDate>,
    /// (secret_id, activity) for every other activity.
    completion: HashSet<(String, String)>,
    completion_names: BTreeSet<String>,
}

fn activity_dates(flat: &ReportFrame) -> Result<Vec<Option<NaiveDate>>> {
    let name = ["activity_start_time_dt_local", "activity_start_time_dt"]
        .into_iter()
        .find(|name| flat.has_column(name))
        .ok_or_else(|| ProcessError::missing_column("activity_start_time_dt"))?;
    let millis = flat.column(name)?.cast(&DataType::Int64)?;
    Ok(millis
        .i64()?
        .into_iter()
        .map(|ms| ms.and_then(DateTime::from_timestamp_millis).map(|dt| dt.date_naive()))
        .collect())
}

impl Activities {
    fn collect(report: &ReportFrame) -> Result<Self> {
        let flat = report.flatten_records()?;
        let secret_ids = flat.strings("target_user_secret_id")?;
        let names = flat.strings("activity_name")?;
        let dates = activity_dates(&flat)?;

        let mut activities = Activities {
            attendance: HashSet::new(),
            attendance_names: BTreeSet::new(),
            dates: BTreeSet::new(),
            completion: HashSet::new(),
            completion_names: BTreeSet::new(),
        };
        for ((secret_id, name), date) in secret_ids.into_iter().zip(names).zip(dates) {
            let (Some(secret_id), Some(name)) = (secret_id, name) else {
                continue;
            };
            let name = name.trim().to_string();
            if name.starts_with(ATTENDANCE_PREFIX) {
                activities.attendance_names.insert(name.clone());
                if let Some(date) = date {
                    activities.dates.insert(date);
                    activities.attendance.insert((secret_id, name, date));
                }
            } else {
                activities.completion_names.insert(name.clone());
                activities.completion.insert((secret_id, name));
            }
        }
        Ok(activities)
    }
}

fn date_column(dates: &[NaiveDate]) -> Result<Column> {
    let epoch = NaiveDate::default();
    let days: Vec<Option<i32>> = dates
        .iter()
        .map(|date| i32::try_from((*date - epoch).num_days()).ok())
        .collect();
    Ok(Series::new(DATE_COLUMN.into(), days)
        .cast(&DataType::Date)?
        .into_column())
}

fn partition_label(value: Option<&str>) -> &str {
    value.unwrap_or("null")
}

/// Groups row numbers by key, in order of first appearance.
fn partitions(keys: &[Vec<String>]) -> Vec<(Vec<String>, Vec<usize>)> {
    let mut order: Vec<(Vec<String>, Vec<usize>)> = Vec::new();
    let mut seen: HashMap<Vec<String>, usize> = HashMap::new();
    for (row, key) in keys.iter().enumerate() {
        let slot = *seen.entry(key.clone()).or_insert_with(|| {
            order.push((key.clone(), Vec::new()));
            order.len() - 1
        });
        order[slot].1.push(row);
    }
    order
}

fn attendance(roster: &Roster, activities: &Activities) -> Result<Vec<NamedOutput>> {
    let dates: Vec<NaiveDate> = activities.dates.iter().copied().collect();
    let secret_ids = roster.values("secret_id");
    let mut participant_rows = Vec::with_capacity(roster.len * dates.len());
    let mut row_dates = Vec::with_capacity(roster.len * dates.len());
    for participant in 0..roster.len {
        for date in &dates {
            participant_rows.push(participant);
            row_dates.push(*date);
        }
    }

    let mut columns = roster.columns_for(&participant_rows);
    columns.push(date_column(&row_dates)?);
    for name in &activities.attendance_names {
        let attended: Vec<bool> = participant_rows
            .iter()
            .zip(&row_dates)
            .map(|(&participant, date)| {
                secret_ids[participant].as_ref().is_some_and(|secret_id| {
                    activities
                        .attendance
                        .contains(&(secret_id.clone(), name.clone(), *date))
                })
            })
            .collect();
        columns.push(Series::new(name.as_str().into(), attended).into_column());
    }
    let all = ReportFrame::new(DataFrame::new(columns)?);

    let sites = roster.values("site");
    let keys: Vec<Vec<String>> = participant_rows
        .iter()
        .zip(&row_dates)
        .map(|(&participant, date)| {
            vec![
                partition_label(sites[participant].as_deref()).to_string(),
                date.to_string(),
            ]
        })
        .collect();

    let mut outputs = Vec::new();
    for (key, rows) in partitions(&keys) {
        outputs.push(NamedOutput::new(
            format!("ymha_attendance-site_{}-date_{}", key[0], key[1]),
            all.take(&rows)?,
        ));
    }
    outputs.insert(0, NamedOutput::new("ymha_attendance-all", all));
    Ok(outputs)
}

fn completion(roster: &Roster, activities: &Activities) -> Result<Vec<NamedOutput>> {
    let rows: Vec<usize> = (0..roster.len).collect();
    let secret_ids = roster.values("secret_id");
    let mut columns = roster.columns_for(&rows);
    let mut complete = vec![true; roster.len];
    for name in &activities.completion_names {
        let done: Vec<bool> = secret_ids
            .iter()
            .map(|secret_id| {
                secret_id.as_ref().is_some_and(|secret_id| {
                    activities
                        .completion
                        .contains(&(secret_id.clone(), name.clone()))
                })
            })
            .collect();
        for (all_done, done) in complete.iter_mut().zip(&done) {
            *all_done &= *done;
        }
        columns.push(Series::new(name.as_str().into(), done).into_column());
    }
    columns.push(Series::new(COMPLETE_COLUMN.into(), complete).into_column());
    let all = ReportFrame::new(DataFrame::new(columns)?);

    let mut summary_columns = roster.names();
    summary_columns.push(COMPLETE_COLUMN);
    let summary = |frame: &ReportFrame| frame.select(&summary_columns);

    let sites = roster.values("site");
    let keys: Vec<Vec<String>> = sites
        .iter()
        .map(|site| vec![partition_label(site.as_deref()).to_string()])
        .collect();
    let parts = partitions(&keys);

    let mut outputs = vec![
        NamedOutput::new("ymha_completion-all", all.clone()),
        NamedOutput::new("ymha_completion_summary-all", summary(&all)?),
    ];
    for (key, rows) in &parts {
        outputs.push(NamedOutput::new(
            format!("ymha_completion-site_{}", key[0]),
            all.take(rows)?,
        ));
    }
    for (key, rows) in &parts {
        outputs.push(NamedOutput::new(
            format!("ymha_completion_summary-site_{}", key[0]),
            summary(&all.take(rows)?)?,
        ));
    }
    Ok(outputs)
}

pub struct YmhaAttendanceFormat;

impl OutputFormat for YmhaAttendanceFormat {
    fn name(&self) -> &'static str {
        "ymha-attendance"
    }

    fn description(&self) -> &'static str {
        "YMHA attendance and completion reports (requires -e ymha_participants=<csv>)"
    }

    fn required_arguments(&self) -> &'static [&'static str] {
        &[PARTICIPANTS_ARGUMENT]
    }

    fn produce(&self, report: &ReportFrame, extra: &ExtraArguments) -> Result<Vec<NamedOutput>> {
        let path = extra
            .get(PARTICIPANTS_ARGUMENT)
            .map(PathBuf::from)
            .ok_or(OutputError::MissingExtraArgument {
                format: self.name(),
                argument: PARTICIPANTS_ARGUMENT,
            })?;
        let roster = Roster::load(&path)?;
        let activities = Activities::collect(report)?;

        let mut outputs = Vec::new();
        if !activities.attendance_names.is_empty() {
            outputs.extend(attendance(&roster, &activities)?);
        }
        if !activities.completion_names.is_empty() {
            outputs.extend(completion(&roster, &activities)?);
        }
        info!(
            participants = roster.len,
            attendance_activities = activities.attendance_names.len(),
            completion_activities = activities.completion_names.len(),
            tables = outputs.len(),
            "built YMHA reports"
        );
        Ok(outputs)
    }
}
