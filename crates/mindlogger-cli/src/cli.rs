//! CLI argument definitions for the MindLogger export processor.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "mindlogger-export",
    version,
    about = "MindLogger export processor - Turn report exports into analysis tables",
    long_about = "Process MindLogger applet report exports.\n\n\
                  Parses encoded responses and options, groups related columns and\n\
                  writes long, wide, dictionary and scored tables as CSV or Parquet."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Process an export and write the selected output tables.
    Run(RunArgs),

    /// List the available output formats.
    Formats,
}

#[derive(Parser)]
pub struct RunArgs {
    /// Export directory, or a single report CSV file.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output directory (default: the export directory).
    #[arg(short = 'o', long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// File name pattern for report files inside the export directory.
    #[arg(long = "pattern", value_name = "GLOB", default_value = "report*.csv")]
    pub pattern: String,

    /// File type written for every output table.
    #[arg(long = "output-type", value_enum, default_value = "csv")]
    pub output_type: OutputTypeArg,

    /// Output format to produce; repeat for several (default: all).
    #[arg(short = 't', long = "format", value_name = "FORMAT")]
    pub formats: Vec<String>,

    /// Timezone for local datetime columns.
    #[arg(long = "timezone", value_name = "TZ", default_value = "America/New_York")]
    pub timezone: String,

    /// Skip local datetime columns.
    #[arg(long = "no-local-time", conflicts_with = "timezone")]
    pub no_local_time: bool,

    /// Extra format argument; repeat for several.
    ///
    /// The `ymha-attendance` format reads its participant roster from
    /// `-e ymha_participants=<csv>`.
    #[arg(short = 'e', long = "extra", value_name = "KEY=VALUE")]
    pub extra: Vec<String>,

    /// Drop columns that are empty in every row (CSV output only).
    #[arg(long = "drop-null-columns")]
    pub drop_null_columns: bool,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputTypeArg {
    Csv,
    Parquet,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
