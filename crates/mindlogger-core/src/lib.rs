//! Processing engine for MindLogger report exports.
//!
//! A loaded report table goes through a [`ProcessorChain`] that parses the
//! response and options grammars into nested columns, derives datetimes and
//! groups related columns into records. The expansion functions then turn
//! nested columns into flat rows for output.
//!
//! ```ignore
//! use mindlogger_core::{ProcessingContext, ProcessorChain, ReportFrame, expand_responses};
//!
//! let report = ReportFrame::new(mindlogger_ingest::load_reports(&input, pattern)?);
//! let processed = ProcessorChain::default_chain()?.run(&report, &ProcessingContext::new())?;
//! let long = expand_responses(&processed.flatten_records()?)?;
//! ```

pub mod config;
pub mod error;
pub mod expand;
pub mod frame;
mod materialize;
pub mod processors;

pub use config::{
    ConfigError, DEFAULT_TIMEZONE, ExportConfig, OutputFileType, ProcessingContext,
    parse_extra_argument, parse_timezone,
};
pub use error::{ChainError, ProcessError, Result};
pub use expand::{ITEM_OPTIONS_COLUMN, OPTION_PREFIX, RESPONSE_PREFIX, expand_options, expand_responses};
pub use frame::{NestedColumn, ReportFrame};
pub use processors::{ProcessorChain, ProcessorRegistry, ReportProcessor, default_registry};
