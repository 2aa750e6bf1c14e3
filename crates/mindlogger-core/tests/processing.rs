//! Processor chain and expansion over report-shaped frames.

use mindlogger_core::{
    NestedColumn, ProcessingContext, ProcessorChain, ReportFrame, default_registry,
    expand_options, expand_responses, parse_timezone,
};
use polars::prelude::{DataFrame, IntoColumn, NamedFrom, Series};
use proptest::prelude::*;

fn report(columns: &[(&str, Vec<Option<&str>>)]) -> ReportFrame {
    ReportFrame::new(
        DataFrame::new(
            columns
                .iter()
                .map(|(name, values)| Series::new((*name).into(), values).into_column())
                .collect(),
        )
        .unwrap(),
    )
}

fn two_submissions() -> ReportFrame {
    report(&[
        ("activity_submission_id", vec![Some("s1"), Some("s1")]),
        ("activity_id", vec![Some("a1"), Some("a1")]),
        ("activity_name", vec![Some("Intake"), Some("Intake")]),
        (
            "activity_start_time",
            vec![Some("1733927671657"), Some("1733927671657")],
        ),
        ("item_id", vec![Some("i1"), Some("i1")]),
        ("item_name", vec![Some("q1"), Some("q1")]),
        ("target_secret_id", vec![Some("P-1"), Some("P-1")]),
        ("item_response", vec![Some("text: fine"), Some("value: 1, 2")]),
        (
            "item_response_options",
            vec![Some("Yes: 1, No: 2"), Some("Yes: 1, No: 2")],
        ),
    ])
}

fn i64_values(frame: &ReportFrame, name: &str) -> Vec<Option<i64>> {
    frame.column(name).unwrap().i64().unwrap().into_iter().collect()
}

fn u32_values(frame: &ReportFrame, name: &str) -> Vec<Option<u32>> {
    frame.column(name).unwrap().u32().unwrap().into_iter().collect()
}

#[test]
fn text_and_value_rows_expand_to_three() {
    let processed = ProcessorChain::default_chain()
        .unwrap()
        .run(&two_submissions(), &ProcessingContext::new())
        .unwrap();
    let long = expand_responses(&processed.flatten_records().unwrap()).unwrap();

    assert_eq!(long.height(), 3);
    assert_eq!(i64_values(&long, "response_value"), vec![None, Some(1), Some(2)]);
    assert_eq!(
        u32_values(&long, "response_value_index"),
        vec![None, Some(0), Some(1)]
    );
    assert_eq!(
        long.strings("response_text").unwrap(),
        vec![Some("fine".to_string()), None, None]
    );
    assert_eq!(
        long.strings("response_type").unwrap(),
        vec![
            Some("text".to_string()),
            Some("value".to_string()),
            Some("value".to_string())
        ]
    );
}

#[test]
fn processed_report_is_grouped_into_records() {
    let processed = ProcessorChain::default_chain()
        .unwrap()
        .run(&two_submissions(), &ProcessingContext::new())
        .unwrap();
    for record in ["activity", "item", "target_user"] {
        assert!(
            matches!(processed.nested(record), Some(NestedColumn::Record(_))),
            "{record} was not assembled"
        );
    }
    assert!(matches!(
        processed.nested("response"),
        Some(NestedColumn::Response(_))
    ));

    let flat = processed.flatten_records().unwrap();
    assert!(flat.has_column("activity_start_time_dt"));
    assert!(flat.has_column("target_user_secret_id"));
    assert!(!flat.has_column("activity_start_time_dt_local"));
}

#[test]
fn timezone_adds_local_datetimes() {
    let context = ProcessingContext::new().with_timezone(parse_timezone("America/New_York").unwrap());
    let processed = ProcessorChain::default_chain()
        .unwrap()
        .run(&two_submissions(), &context)
        .unwrap();
    let flat = processed.flatten_records().unwrap();
    assert!(flat.has_column("activity_start_time_dt_local"));
}

#[test]
fn options_expand_once_per_distinct_item() {
    let processed = ProcessorChain::default_chain()
        .unwrap()
        .run(&two_submissions(), &ProcessingContext::new())
        .unwrap();
    let dictionary = processed
        .flatten_records()
        .unwrap()
        .select(&["item_id", "item_name", "item_options"])
        .unwrap()
        .distinct()
        .unwrap();
    let options = expand_options(&dictionary).unwrap();
    assert_eq!(options.height(), 2);
    assert_eq!(
        options.strings("option_name").unwrap(),
        vec![Some("Yes".to_string()), Some("No".to_string())]
    );
    assert_eq!(i64_values(&options, "option_value"), vec![Some(1), Some(2)]);
}

#[test]
fn additive_processors_keep_rows_and_columns() {
    let input = two_submissions();
    let context = ProcessingContext::new().with_timezone(parse_timezone("UTC").unwrap());
    let registry = default_registry();
    for name in [
        "ColumnCast",
        "DateTime",
        "LocalDateTime",
        "ResponseStruct",
        "OptionsStruct",
        "Identity",
    ] {
        let out = registry.get(name).unwrap().process(&input, &context).unwrap();
        assert_eq!(out.height(), input.height(), "{name} changed the row count");
        for column in input.column_names() {
            assert!(out.has_column(&column), "{name} dropped {column}");
        }
    }
}

#[test]
fn record_processors_keep_rows() {
    let input = two_submissions();
    let context = ProcessingContext::new();
    let registry = default_registry();
    for name in [
        "ActivityStruct",
        "ActivityFlowStruct",
        "ScheduleStruct",
        "ItemStruct",
        "UserStruct",
    ] {
        let out = registry.get(name).unwrap().process(&input, &context).unwrap();
        assert_eq!(out.height(), input.height(), "{name} changed the row count");
    }
}

#[test]
fn unparseable_options_fail_the_chain() {
    let input = report(&[("item_response_options", vec![Some("Yes, No")])]);
    let err = ProcessorChain::default_chain()
        .unwrap()
        .run(&input, &ProcessingContext::new())
        .unwrap_err();
    assert!(err.to_string().contains("item_response_options"), "{err}");
}

proptest! {
    #[test]
    fn expansion_row_count_is_product_of_list_lengths(
        lists in prop::collection::vec(
            prop::option::of(prop::collection::vec(0i64..100, 1..5)),
            1..8,
        )
    ) {
        let cells: Vec<Option<String>> = lists
            .iter()
            .map(|list| {
                list.as_ref().map(|values| {
                    let joined: Vec<String> = values.iter().map(ToString::to_string).collect();
                    format!("value: {}", joined.join(", "))
                })
            })
            .collect();
        let input = ReportFrame::new(
            DataFrame::new(vec![Series::new("item_response".into(), cells).into_column()]).unwrap(),
        );
        let processed = default_registry()
            .get("ResponseStruct")
            .unwrap()
            .process(&input, &ProcessingContext::new())
            .unwrap();
        let long = expand_responses(&processed).unwrap();

        let expected: usize = lists.iter().map(|list| list.as_ref().map_or(1, Vec::len)).sum();
        prop_assert_eq!(long.height(), expected);
        let indices = u32_values(&long, "response_value_index");
        let mut row = 0;
        for list in &lists {
            match list {
                Some(values) => {
                    for position in 0..values.len() {
                        prop_assert_eq!(indices[row], Some(position as u32));
                        row += 1;
                    }
                }
                None => {
                    prop_assert_eq!(indices[row], None);
                    row += 1;
                }
            }
        }
    }
}
