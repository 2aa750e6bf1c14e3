//! Record assembly.
//!
//! Groups flat prefixed columns into one record column per entity. Each
//! [`RecordLayout`] lists the record's fields and, per field, the source
//! columns it may come from; the first source present wins. Fields with no
//! source present are null so every record keeps a fixed shape. A source
//! ending in `_time` also carries its derived `_dt` and `_dt_local` columns
//! into the record when they exist. Consumed source columns are dropped.

use mindlogger_model::UserType;
use polars::prelude::{Column, DataType};
use tracing::debug;

use super::ReportProcessor;
use super::datetime::{LOCAL_SUFFIX, TIME_SUFFIX, UTC_SUFFIX};
use crate::config::ProcessingContext;
use crate::error::Result;
use crate::frame::{NestedColumn, ReportFrame};

/// One record field and the columns it may be read from.
#[derive(Debug, Clone, Copy)]
pub struct FieldSource {
    pub field: &'static str,
    pub sources: &'static [&'static str],
}

const fn field(field: &'static str, sources: &'static [&'static str]) -> FieldSource {
    FieldSource { field, sources }
}

/// Fields of one record column.
#[derive(Debug, Clone, Copy)]
pub struct RecordLayout {
    pub record: &'static str,
    pub fields: &'static [FieldSource],
}

impl RecordLayout {
    fn is_present(&self, report: &ReportFrame) -> bool {
        self.fields
            .iter()
            .flat_map(|field| field.sources)
            .any(|source| report.has_column(source))
    }

    /// Builds the record and returns it with the columns it consumed.
    fn assemble(&self, report: &ReportFrame) -> Result<Option<(ReportFrame, Vec<String>)>> {
        if !self.is_present(report) {
            return Ok(None);
        }
        let height = report.height();
        let mut record = ReportFrame::with_height(height);
        let mut consumed = Vec::new();
        for entry in self.fields {
            match entry.sources.iter().find(|source| report.has_column(source)) {
                Some(source) => {
                    copy_column(report, &mut record, source, entry.field)?;
                    if source.ends_with(TIME_SUFFIX) {
                        let local_suffix = format!("{UTC_SUFFIX}{LOCAL_SUFFIX}");
                        for suffix in [UTC_SUFFIX, local_suffix.as_str()] {
                            let derived = format!("{source}{suffix}");
                            if report.has_column(&derived) {
                                let target = format!("{}{suffix}", entry.field);
                                copy_column(report, &mut record, &derived, &target)?;
                                consumed.push(derived);
                            }
                        }
                    }
                }
                None => {
                    let nulls = Column::full_null(entry.field.into(), height, &DataType::String);
                    record.with_column(nulls)?;
                }
            }
            consumed.extend(
                entry.sources
                    .iter()
                    .filter(|source| report.has_column(source))
                    .map(ToString::to_string),
            );
        }
        Ok(Some((record, consumed)))
    }
}

fn copy_column(
    report: &ReportFrame,
    record: &mut ReportFrame,
    source: &str,
    field: &str,
) -> Result<()> {
    match report.nested(source) {
        Some(nested) => {
            record.with_nested(field, nested.clone())?;
        }
        None => {
            let column = report.column(source)?.clone().with_name(field.into());
            record.with_column(column)?;
        }
    }
    Ok(())
}

/// Replaces the source columns of each layout with a record column.
pub struct RecordProcessor {
    name: &'static str,
    description: &'static str,
    dependencies: &'static [&'static str],
    layouts: &'static [RecordLayout],
}

impl RecordProcessor {
    pub const fn new(
        name: &'static str,
        description: &'static str,
        dependencies: &'static [&'static str],
        layouts: &'static [RecordLayout],
    ) -> Self {
        Self {
            name,
            description,
            dependencies,
            layouts,
        }
    }

    pub fn layouts(&self) -> &'static [RecordLayout] {
        self.layouts
    }
}

impl ReportProcessor for RecordProcessor {
    fn name(&self) -> &'static str {
        self.name
    }

    fn description(&self) -> &'static str {
        self.description
    }

    fn priority(&self) -> i32 {
        30
    }

    fn dependencies(&self) -> &'static [&'static str] {
        self.dependencies
    }

    fn process(&self, report: &ReportFrame, _context: &ProcessingContext) -> Result<ReportFrame> {
        let mut out = report.clone();
        for layout in self.layouts {
            let Some((record, consumed)) = layout.assemble(&out)? else {
                debug!(record = layout.record, "no source columns; skipping record");
                continue;
            };
            let consumed: Vec<&str> = consumed.iter().map(String::as_str).collect();
            out = out.drop_columns(&consumed)?;
            out.with_nested(layout.record, NestedColumn::Record(Box::new(record)))?;
        }
        Ok(out)
    }
}

pub const ACTIVITY: RecordLayout = RecordLayout {
    record: "activity",
    fields: &[
        field("id", &["activity_id"]),
        field("name", &["activity_name"]),
        field("submission_id", &["activity_submission_id"]),
        field("start_time", &["activity_start_time"]),
        field("end_time", &["activity_end_time"]),
        field("submission_review_id", &["activity_submission_review_id"]),
    ],
};

pub const ACTIVITY_FLOW: RecordLayout = RecordLayout {
    record: "activity_flow",
    fields: &[
        field("id", &["activity_flow_id"]),
        field("name", &["activity_flow_name"]),
        field("submission_id", &["activity_flow_submission_id"]),
    ],
};

pub const ACTIVITY_SCHEDULE: RecordLayout = RecordLayout {
    record: "activity_schedule",
    fields: &[
        field("id", &["activity_schedule_id"]),
        field("start_time", &["activity_schedule_start_time"]),
    ],
};

pub const ITEM: RecordLayout = RecordLayout {
    record: "item",
    fields: &[
        field("id", &["item_id"]),
        field("name", &["item_name"]),
        field("prompt", &["item_prompt"]),
        field("type", &["item_type"]),
        field("response_options", &["item_response_options"]),
        field("options", &["parsed_options"]),
    ],
};

const TARGET_USER: RecordLayout = RecordLayout {
    record: UserType::Target.record_name(),
    fields: &[
        field("id", &["target_id", "target_user_subject_id"]),
        field("secret_id", &["target_secret_id", "target_user_secret_id"]),
        field("nickname", &["target_nickname", "target_user_nickname"]),
        field("tag", &["target_tag", "target_user_tag"]),
    ],
};

const SOURCE_USER: RecordLayout = RecordLayout {
    record: UserType::Source.record_name(),
    fields: &[
        field("id", &["source_id", "source_user_subject_id"]),
        field("secret_id", &["source_secret_id", "source_user_secret_id"]),
        field("nickname", &["source_nickname", "source_user_nickname"]),
        field("tag", &["source_tag", "source_user_tag"]),
        field("relation", &["source_relation", "source_user_relation"]),
    ],
};

const INPUT_USER: RecordLayout = RecordLayout {
    record: UserType::Input.record_name(),
    fields: &[
        field("id", &["input_id", "input_user_subject_id"]),
        field("secret_id", &["input_secret_id", "input_user_secret_id"]),
        field("nickname", &["input_nickname", "input_user_nickname"]),
    ],
};

const ACCOUNT_USER: RecordLayout = RecordLayout {
    record: UserType::Account.record_name(),
    fields: &[
        field("id", &["userId"]),
        field("secret_id", &["secret_user_id"]),
    ],
};

pub const USERS: [RecordLayout; 4] = [TARGET_USER, SOURCE_USER, INPUT_USER, ACCOUNT_USER];

/// The built-in record processors.
pub(super) fn record_processors() -> [RecordProcessor; 5] {
    [
        RecordProcessor::new(
            "ActivityStruct",
            "Group activity columns into an activity record",
            &["DateTime"],
            &[ACTIVITY],
        ),
        RecordProcessor::new(
            "ActivityFlowStruct",
            "Group activity flow columns into an activity_flow record",
            &[],
            &[ACTIVITY_FLOW],
        ),
        RecordProcessor::new(
            "ScheduleStruct",
            "Group schedule columns into an activity_schedule record",
            &["DateTime"],
            &[ACTIVITY_SCHEDULE],
        ),
        RecordProcessor::new(
            "ItemStruct",
            "Group item columns and parsed options into an item record",
            &["OptionsStruct"],
            &[ITEM],
        ),
        RecordProcessor::new(
            "UserStruct",
            "Group user columns into one record per user role",
            &[],
            &USERS,
        ),
    ]
}
