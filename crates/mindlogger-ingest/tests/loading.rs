//! Integration tests for report discovery and loading.

use std::fs;

use mindlogger_ingest::{
    DEFAULT_REPORT_PATTERN, IngestError, column_strings, discover_report_files, load_reports,
};
use polars::prelude::DataType;
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, contents: &str) {
    fs::write(dir.path().join(name), contents).unwrap();
}

#[test]
fn loads_and_concatenates_matching_reports() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "report.csv",
        "\u{feff}item_id,item_response\ni1,value: 1\ni2,\"text: two\nlines\"\n",
    );
    write(
        &dir,
        "report-2.csv",
        "item_id,rawScore\ni3,5\n",
    );
    write(&dir, "flow-items.csv", "ignored\nx\n");

    let report = load_reports(dir.path(), DEFAULT_REPORT_PATTERN).unwrap();

    assert_eq!(report.height(), 3);
    assert_eq!(report.width(), 3);
    assert!(
        report
            .get_columns()
            .iter()
            .all(|column| column.dtype() == &DataType::String)
    );
    // report-2.csv sorts before report.csv
    let ids = column_strings(&report, "item_id").unwrap();
    assert_eq!(
        ids,
        vec![Some("i3".to_string()), Some("i1".to_string()), Some("i2".to_string())]
    );
    let responses = column_strings(&report, "item_response").unwrap();
    assert_eq!(responses[0], None);
    assert_eq!(responses[2].as_deref(), Some("text: two\nlines"));
    let scores = column_strings(&report, "rawScore").unwrap();
    assert_eq!(scores, vec![Some("5".to_string()), None, None]);
}

#[test]
fn explicit_file_is_used_directly() {
    let dir = TempDir::new().unwrap();
    write(&dir, "export.csv", "a\n1\n");
    let files = discover_report_files(&dir.path().join("export.csv"), DEFAULT_REPORT_PATTERN)
        .unwrap();
    assert_eq!(files.len(), 1);
}

#[test]
fn missing_input_is_reported() {
    let dir = TempDir::new().unwrap();
    let err = load_reports(&dir.path().join("nope"), DEFAULT_REPORT_PATTERN).unwrap_err();
    assert!(matches!(err, IngestError::InputNotFound { .. }));
}

#[test]
fn directory_without_reports_is_reported() {
    let dir = TempDir::new().unwrap();
    write(&dir, "other.csv", "a\n1\n");
    let err = load_reports(dir.path(), DEFAULT_REPORT_PATTERN).unwrap_err();
    assert!(matches!(err, IngestError::NoMatchingFiles { .. }));
}
