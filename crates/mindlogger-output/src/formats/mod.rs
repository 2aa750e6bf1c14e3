//! Output formats.
//!
//! An output format turns the processed report into one or more named
//! tables. Formats are looked up by name in a static registry; the CLI
//! selects them with `-t NAME`.
//!
//! | Name | Tables |
//! |------|--------|
//! | `report` | `report` |
//! | `long` | `long_data` |
//! | `wide` | `wide_data` |
//! | `dictionary` | `data_dictionary` |
//! | `options` | `options` |
//! | `scored` | `scored_responses` |
//! | `ymha-attendance` | `ymha_attendance-*`, `ymha_completion-*`, `ymha_completion_summary-*` |

mod dictionary;
mod long;
mod scored;
mod wide;
mod ymha;

use std::collections::BTreeMap;
use std::sync::OnceLock;

pub use dictionary::{DataDictionaryFormat, OptionsFormat, data_dictionary};
pub use long::{LongDataFormat, ReportFormat, long_data};
pub use scored::{ScoredResponsesFormat, scored_responses};
pub use wide::{WIDE_FIELDS, WideFormat, wide_data};
pub use ymha::{PARTICIPANTS_ARGUMENT, YmhaAttendanceFormat};

use mindlogger_core::ReportFrame;
use polars::prelude::{Column, IdxCa, IdxSize, NewChunkedArray, PlSmallStr};

use crate::error::{OutputError, Result};

/// Format-specific `KEY=VALUE` arguments given on the command line.
pub type ExtraArguments = BTreeMap<String, String>;

/// One table produced by an output format.
#[derive(Debug, Clone)]
pub struct NamedOutput {
    /// File stem of the written table.
    pub name: String,
    pub frame: ReportFrame,
}

impl NamedOutput {
    pub fn new(name: impl Into<String>, frame: ReportFrame) -> Self {
        Self {
            name: name.into(),
            frame,
        }
    }
}

/// A named shaping of the processed report into output tables.
pub trait OutputFormat: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Extra arguments that must be present before the format runs.
    fn required_arguments(&self) -> &'static [&'static str] {
        &[]
    }

    /// Produces the format's tables from the processed report.
    ///
    /// # Errors
    ///
    /// Returns an error if a column the format needs is missing or a
    /// companion file cannot be read.
    fn produce(&self, report: &ReportFrame, extra: &ExtraArguments) -> Result<Vec<NamedOutput>>;
}

/// Checks required extra arguments, then produces the format's tables.
///
/// # Errors
///
/// Returns [`OutputError::MissingExtraArgument`] before any work is done when
/// a required argument is absent.
pub fn produce(
    format: &dyn OutputFormat,
    report: &ReportFrame,
    extra: &ExtraArguments,
) -> Result<Vec<NamedOutput>> {
    if let Some(argument) = format
        .required_arguments()
        .iter()
        .copied()
        .find(|argument| !extra.contains_key(*argument))
    {
        return Err(OutputError::MissingExtraArgument {
            format: format.name(),
            argument,
        });
    }
    format.produce(report, extra)
}

/// Output formats in registration order.
#[derive(Default)]
pub struct FormatRegistry {
    formats: Vec<Box<dyn OutputFormat>>,
}

impl FormatRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a format, replacing any previous one of the same name.
    pub fn register(&mut self, format: Box<dyn OutputFormat>) {
        match self.formats.iter().position(|f| f.name() == format.name()) {
            Some(index) => self.formats[index] = format,
            None => self.formats.push(format),
        }
    }

    pub fn get(&self, name: &str) -> Option<&dyn OutputFormat> {
        self.formats
            .iter()
            .find(|format| format.name() == name)
            .map(AsRef::as_ref)
    }

    /// Resolves names to formats; an empty selection means every format.
    ///
    /// # Errors
    ///
    /// Returns [`OutputError::UnknownFormat`] for the first unknown name.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<&dyn OutputFormat>> {
        if names.is_empty() {
            return Ok(self.iter().collect());
        }
        names
            .iter()
            .map(|name| {
                self.get(name.as_ref())
                    .ok_or_else(|| OutputError::UnknownFormat {
                        name: name.as_ref().to_string(),
                    })
            })
            .collect()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.formats.iter().map(|format| format.name())
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn OutputFormat> + '_ {
        self.formats.iter().map(AsRef::as_ref)
    }

    pub fn len(&self) -> usize {
        self.formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }
}

static DEFAULT_FORMATS: OnceLock<FormatRegistry> = OnceLock::new();

/// Returns the registry of built-in output formats.
pub fn default_formats() -> &'static FormatRegistry {
    DEFAULT_FORMATS.get_or_init(|| {
        let mut registry = FormatRegistry::new();
        registry.register(Box::new(ReportFormat));
        registry.register(Box::new(LongDataFormat));
        registry.register(Box::new(WideFormat));
        registry.register(Box::new(DataDictionaryFormat));
        registry.register(Box::new(OptionsFormat));
        registry.register(Box::new(ScoredResponsesFormat));
        registry.register(Box::new(YmhaAttendanceFormat));
        registry
    })
}

/// Names of the columns from `candidates` present in `report`.
pub(crate) fn present<'a>(report: &ReportFrame, candidates: &[&'a str]) -> Vec<&'a str> {
    candidates
        .iter()
        .copied()
        .filter(|name| report.has_column(name))
        .collect()
}

/// Gathers rows of `column`; a `None` index yields a null cell.
pub(crate) fn gather(column: &Column, rows: &[Option<usize>], name: &str) -> Result<Column> {
    let indices = IdxCa::from_iter_options(
        PlSmallStr::EMPTY,
        rows.iter().map(|row| row.map(|row| row as IdxSize)),
    );
    Ok(column.take(&indices)?.with_name(name.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_formats_in_order() {
        let names: Vec<_> = default_formats().names().collect();
        assert_eq!(
            names,
            vec![
                "report",
                "long",
                "wide",
                "dictionary",
                "options",
                "scored",
                "ymha-attendance"
            ]
        );
    }

    #[test]
    fn empty_selection_is_every_format() {
        let registry = default_formats();
        let none: [&str; 0] = [];
        assert_eq!(registry.select(&none).unwrap().len(), registry.len());
        let picked = registry.select(&["long", "report"]).unwrap();
        assert_eq!(picked[0].name(), "long");
        assert!(matches!(
            registry.select(&["nope"]),
            Err(OutputError::UnknownFormat { name }) if name == "nope"
        ));
    }

    #[test]
    fn required_argument_is_checked_first() {
        let format = default_formats().get("ymha-attendance").unwrap();
        let err = produce(format, &ReportFrame::default(), &ExtraArguments::new()).unwrap_err();
        assert!(matches!(
            err,
            OutputError::MissingExtraArgument {
                argument: PARTICIPANTS_ARGUMENT,
                ..
            }
        ));
    }
}
