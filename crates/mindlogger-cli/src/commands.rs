use anyhow::{Context, Result};
use comfy_table::Table;

use mindlogger_core::{ExportConfig, OutputFileType, parse_extra_argument, parse_timezone};
use mindlogger_output::default_formats;

use mindlogger_cli::pipeline::{ExportResult, run_export};

use crate::cli::{OutputTypeArg, RunArgs};
use crate::summary::apply_table_style;

pub fn run_formats() -> Result<()> {
    let mut table = Table::new();
    table.set_header(vec!["Format", "Description", "Requires"]);
    apply_table_style(&mut table);
    for format in default_formats().iter() {
        let required = format
            .required_arguments()
            .iter()
            .map(|argument| format!("-e {argument}=..."))
            .collect::<Vec<_>>();
        let required = if required.is_empty() {
            "-".to_string()
        } else {
            required.join(", ")
        };
        table.add_row(vec![
            format.name().to_string(),
            format.description().to_string(),
            required,
        ]);
    }
    println!("{table}");
    Ok(())
}

pub fn run(args: &RunArgs) -> Result<ExportResult> {
    let config = export_config(args)?;
    run_export(&config)
}

fn export_config(args: &RunArgs) -> Result<ExportConfig> {
    let timezone = if args.no_local_time {
        None
    } else {
        Some(parse_timezone(&args.timezone)?)
    };
    let mut config = ExportConfig::new(&args.input)
        .with_pattern(args.pattern.clone())
        .with_output_type(output_type(args.output_type))
        .with_formats(args.formats.iter().map(String::as_str))
        .with_timezone(timezone)
        .with_drop_null_columns(args.drop_null_columns);
    if let Some(dir) = &args.output_dir {
        config = config.with_output_dir(dir);
    }
    for extra in &args.extra {
        let (key, value) =
            parse_extra_argument(extra).with_context(|| format!("parse -e {extra}"))?;
        config = config.with_extra(key, value);
    }
    Ok(config)
}

fn output_type(arg: OutputTypeArg) -> OutputFileType {
    match arg {
        OutputTypeArg::Csv => OutputFileType::Csv,
        OutputTypeArg::Parquet => OutputFileType::Parquet,
    }
}
