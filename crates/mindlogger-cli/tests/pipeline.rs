//! End-to-end export runs over a small report directory.

use std::fs;
use std::path::Path;

use mindlogger_cli::pipeline::run_export;
use mindlogger_core::{ExportConfig, OutputFileType};

const REPORT: &str = "\
activity_submission_id,activity_id,activity_name,activity_start_time,activity_end_time,item_id,item_name,item_response,item_response_options,target_secret_id
s1,a1,Intake,1733927671657,1733927971657,i1,q1,\"value: 1\",\"Yes: 1, No: 0\",P-1
s1,a1,Intake,1733927671657,1733927971657,i2,q2,\"text: fine\",,P-1
s2,a1,Intake,1734014071657,1734014371657,i1,q1,\"value: 0\",\"Yes: 1, No: 0\",P-2
";

fn export_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("report.csv"), REPORT).unwrap();
    fs::write(dir.path().join("notes.txt"), "not a report").unwrap();
    dir
}

fn written(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn selected_formats_are_written() {
    let input = export_dir();
    let out = tempfile::tempdir().unwrap();
    let config = ExportConfig::new(input.path())
        .with_output_dir(out.path())
        .with_formats(["long", "wide"]);

    let result = run_export(&config).unwrap();

    assert!(!result.has_errors());
    assert_eq!(result.rows, 3);
    assert_eq!(result.formats.len(), 2);
    assert_eq!(written(out.path()), vec!["long_data.csv", "wide_data.csv"]);
    let long = &result.formats[0].tables[0];
    assert_eq!(long.name, "long_data");
    assert_eq!(long.rows, 3);
}

#[test]
fn failing_format_does_not_stop_the_others() {
    let input = export_dir();
    let out = tempfile::tempdir().unwrap();
    let config = ExportConfig::new(input.path()).with_output_dir(out.path());

    let result = run_export(&config).unwrap();

    // ymha-attendance needs a participant roster.
    assert!(result.has_errors());
    let failed: Vec<&str> = result
        .formats
        .iter()
        .filter(|outcome| !outcome.is_ok())
        .map(|outcome| outcome.format)
        .collect();
    assert_eq!(failed, vec!["ymha-attendance"]);
    assert_eq!(
        written(out.path()),
        vec![
            "data_dictionary.csv",
            "long_data.csv",
            "options.csv",
            "report.csv",
            "scored_responses.csv",
            "wide_data.csv",
        ]
    );
}

#[test]
fn outputs_default_to_the_input_directory() {
    let input = export_dir();
    let config = ExportConfig::new(input.path())
        .with_formats(["dictionary"])
        .with_output_type(OutputFileType::Parquet);

    let result = run_export(&config).unwrap();

    assert_eq!(result.output_dir, input.path());
    assert!(input.path().join("data_dictionary.parquet").is_file());
}

#[test]
fn unknown_format_fails_before_loading() {
    let out = tempfile::tempdir().unwrap();
    let config = ExportConfig::new(out.path().join("missing")).with_formats(["pivot"]);

    let error = run_export(&config).unwrap_err();

    assert!(format!("{error:#}").contains("pivot"), "{error:#}");
}

#[test]
fn missing_input_aborts_the_run() {
    let out = tempfile::tempdir().unwrap();
    let config = ExportConfig::new(out.path().join("missing")).with_formats(["long"]);

    assert!(run_export(&config).is_err());
    assert!(written(out.path()).is_empty());
}

#[test]
fn dropped_null_columns_are_absent_from_csv() {
    let input = export_dir();
    let out = tempfile::tempdir().unwrap();
    let config = ExportConfig::new(input.path())
        .with_output_dir(out.path())
        .with_formats(["long"])
        .with_timezone(None)
        .with_drop_null_columns(true);

    run_export(&config).unwrap();

    let text = fs::read_to_string(out.path().join("long_data.csv")).unwrap();
    let header = text.lines().next().unwrap();
    assert!(header.contains("response_value"));
    assert!(!header.contains("response_geo_latitude"));
    assert!(!header.contains("_dt_local"));
}
