//! Run configuration.
//!
//! [`ExportConfig`] holds everything one export run needs. The CLI builds it
//! from its arguments; library callers use the `with_*` builders.
//! [`ProcessingContext`] is the part of it handed to processors.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono_tz::Tz;
use mindlogger_ingest::DEFAULT_REPORT_PATTERN;
use thiserror::Error;

/// Timezone used for local datetimes unless configured otherwise.
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::America::New_York;

/// Errors raised while building a configuration from user input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unknown timezone '{name}'")]
    UnknownTimezone { name: String },

    #[error("extra argument '{argument}' is not of the form KEY=VALUE")]
    InvalidExtraArgument { argument: String },

    #[error("unknown output type '{name}' (expected csv or parquet)")]
    UnknownOutputType { name: String },
}

/// File type written for every output table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFileType {
    #[default]
    Csv,
    Parquet,
}

impl OutputFileType {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFileType::Csv => "csv",
            OutputFileType::Parquet => "parquet",
        }
    }
}

impl fmt::Display for OutputFileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFileType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(OutputFileType::Csv),
            "parquet" => Ok(OutputFileType::Parquet),
            _ => Err(ConfigError::UnknownOutputType {
                name: s.to_string(),
            }),
        }
    }
}

/// Parses an IANA timezone name such as `Europe/Berlin`.
pub fn parse_timezone(name: &str) -> Result<Tz, ConfigError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| ConfigError::UnknownTimezone {
            name: name.to_string(),
        })
}

/// Splits a `KEY=VALUE` extra argument. The value may itself contain `=`.
pub fn parse_extra_argument(argument: &str) -> Result<(String, String), ConfigError> {
    let invalid = || ConfigError::InvalidExtraArgument {
        argument: argument.to_string(),
    };
    let (key, value) = argument.split_once('=').ok_or_else(invalid)?;
    let key = key.trim();
    if key.is_empty() {
        return Err(invalid());
    }
    Ok((key.to_string(), value.trim().to_string()))
}

/// Options for one export run.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Export directory or a single report file.
    pub input: PathBuf,
    /// Glob matched against file names when `input` is a directory.
    pub pattern: String,
    /// Where output tables are written; see [`ExportConfig::output_dir`].
    pub output_dir: Option<PathBuf>,
    pub output_type: OutputFileType,
    /// Selected output formats; empty selects every registered format.
    pub formats: Vec<String>,
    /// `None` disables local datetime columns.
    pub timezone: Option<Tz>,
    /// Format-specific `KEY=VALUE` arguments.
    pub extra: BTreeMap<String, String>,
    /// Drop all-null columns from CSV output.
    pub drop_null_columns: bool,
}

impl ExportConfig {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            pattern: DEFAULT_REPORT_PATTERN.to_string(),
            output_dir: None,
            output_type: OutputFileType::default(),
            formats: Vec::new(),
            timezone: Some(DEFAULT_TIMEZONE),
            extra: BTreeMap::new(),
            drop_null_columns: false,
        }
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn with_output_type(mut self, output_type: OutputFileType) -> Self {
        self.output_type = output_type;
        self
    }

    pub fn with_formats<I, S>(mut self, formats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.formats = formats.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timezone(mut self, timezone: Option<Tz>) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn with_drop_null_columns(mut self, drop: bool) -> Self {
        self.drop_null_columns = drop;
        self
    }

    /// Resolved output directory: the configured one, else the input
    /// directory, else the directory containing the input file.
    pub fn output_dir(&self) -> PathBuf {
        if let Some(dir) = &self.output_dir {
            return dir.clone();
        }
        if self.input.is_dir() {
            return self.input.clone();
        }
        self.input
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
    }

    pub fn extra_argument(&self, key: &str) -> Option<&str> {
        self.extra.get(key).map(String::as_str)
    }

    pub fn processing_context(&self) -> ProcessingContext {
        ProcessingContext {
            timezone: self.timezone,
        }
    }
}

/// Settings visible to processors.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessingContext {
    pub timezone: Option<Tz>,
}

impl ProcessingContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = Some(timezone);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ExportConfig::new("/data/export");
        assert_eq!(config.pattern, "report*.csv");
        assert_eq!(config.output_type, OutputFileType::Csv);
        assert_eq!(config.timezone, Some(chrono_tz::America::New_York));
        assert!(config.formats.is_empty());
        assert!(!config.drop_null_columns);
    }

    #[test]
    fn output_dir_falls_back_to_input_parent() {
        let config = ExportConfig::new("/data/export/report.csv");
        assert_eq!(config.output_dir(), PathBuf::from("/data/export"));
        let config = ExportConfig::new("report.csv");
        assert_eq!(config.output_dir(), PathBuf::from("."));
        let config = config.with_output_dir("/tmp/out");
        assert_eq!(config.output_dir(), PathBuf::from("/tmp/out"));
    }

    #[test]
    fn extra_arguments_split_on_first_equals() {
        assert_eq!(
            parse_extra_argument("ymha_participants=/a/b=c.csv").unwrap(),
            ("ymha_participants".to_string(), "/a/b=c.csv".to_string())
        );
        assert!(parse_extra_argument("novalue").is_err());
        assert!(parse_extra_argument("=value").is_err());
    }

    #[test]
    fn timezone_and_output_type_parsing() {
        assert_eq!(
            parse_timezone("Europe/Berlin").unwrap(),
            chrono_tz::Europe::Berlin
        );
        assert!(parse_timezone("Mars/Olympus").is_err());
        assert_eq!("PARQUET".parse::<OutputFileType>().unwrap(), OutputFileType::Parquet);
        assert!("xlsx".parse::<OutputFileType>().is_err());
    }
}
