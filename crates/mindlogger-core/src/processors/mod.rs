//! Report processor trait and registry.
//!
//! Each processor is a named transformation of a [`ReportFrame`]. Processors
//! declare a priority and the names of processors that must run before them;
//! [`ProcessorChain`] turns a selection into a run order.
//!
//! # Architecture
//!
//! The [`ReportProcessor`] trait defines a common interface for all report
//! processors. Each processor is registered in the [`ProcessorRegistry`]
//! which provides lookup by name. [`default_registry`] holds every built-in
//! processor and is built once on first access.
//!
//! # Example
//!
//! ```ignore
//! use mindlogger_core::processors::ProcessorChain;
//!
//! let chain = ProcessorChain::default_chain()?;
//! let processed = chain.run(&report, &context)?;
//! ```

mod chain;
mod cleanup;
mod datetime;
mod parsed;
mod records;
mod subscale;

use std::collections::BTreeMap;
use std::sync::OnceLock;

pub use chain::ProcessorChain;
pub use cleanup::{ColumnCastProcessor, DropLegacyUserIdProcessor, IdentityProcessor};
pub use datetime::{DateTimeProcessor, LOCAL_SUFFIX, LocalDateTimeProcessor, TIME_SUFFIX, UTC_SUFFIX};
pub use parsed::{
    OPTIONS_COLUMN, OPTIONS_SOURCE, OptionsStructProcessor, RESPONSE_COLUMN, RESPONSE_SOURCE,
    ResponseStructProcessor,
};
pub use records::{
    ACTIVITY, ACTIVITY_FLOW, ACTIVITY_SCHEDULE, FieldSource, ITEM, RecordLayout, RecordProcessor,
    USERS,
};
pub use subscale::{
    FINAL_SUBSCALE_COLUMN, SUBSCALE_ITEM_TYPE, SUBSCALE_PREFIX, SubscaleProcessor,
    is_subscale_column,
};

/// Name of the nested item record column.
pub const ITEM_RECORD: &str = records::ITEM.record;

use crate::config::ProcessingContext;
use crate::error::Result;
use crate::frame::ReportFrame;

/// A named transformation of the report table.
///
/// Processors are additive: they add columns and leave existing ones alone.
/// The exceptions are processors whose whole purpose is to drop or regroup
/// columns (legacy cleanup, subscale rows, record assembly).
pub trait ReportProcessor: Send + Sync {
    /// Unique name used for lookup and dependency edges.
    fn name(&self) -> &'static str;

    /// Returns a human-readable description of the processor.
    fn description(&self) -> &'static str {
        "Report processor"
    }

    /// Lower runs earlier; negative disables the processor in the default
    /// chain.
    fn priority(&self) -> i32;

    /// Names of processors that must run before this one.
    fn dependencies(&self) -> &'static [&'static str] {
        &[]
    }

    fn is_enabled(&self) -> bool {
        self.priority() >= 0
    }

    /// Transforms the report.
    ///
    /// # Errors
    ///
    /// Returns an error if a cell cannot be parsed or a dataframe operation
    /// fails. Missing input columns are not an error; the processor leaves
    /// the report unchanged.
    fn process(&self, report: &ReportFrame, context: &ProcessingContext) -> Result<ReportFrame>;
}

/// Registry of report processors indexed by name.
///
/// # Thread Safety
///
/// The registry is thread-safe and can be shared across threads.
/// The default registry is cached using [`OnceLock`].
#[derive(Default)]
pub struct ProcessorRegistry {
    processors: BTreeMap<&'static str, Box<dyn ReportProcessor>>,
}

impl ProcessorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a processor under its name, replacing any previous one.
    pub fn register(&mut self, processor: Box<dyn ReportProcessor>) {
        self.processors.insert(processor.name(), processor);
    }

    pub fn get(&self, name: &str) -> Option<&dyn ReportProcessor> {
        self.processors.get(name).map(AsRef::as_ref)
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    /// Registered names in alphabetical order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.processors.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn ReportProcessor> + '_ {
        self.processors.values().map(AsRef::as_ref)
    }
}

/// Cached default registry with all built-in processors.
static DEFAULT_REGISTRY: OnceLock<ProcessorRegistry> = OnceLock::new();

/// Returns the registry of built-in processors.
pub fn default_registry() -> &'static ProcessorRegistry {
    DEFAULT_REGISTRY.get_or_init(build_default_registry)
}

fn build_default_registry() -> ProcessorRegistry {
    let mut registry = ProcessorRegistry::new();

    // Cleanup
    registry.register(Box::new(DropLegacyUserIdProcessor));
    registry.register(Box::new(ColumnCastProcessor));
    registry.register(Box::new(SubscaleProcessor));
    registry.register(Box::new(IdentityProcessor));

    // Derived columns
    registry.register(Box::new(DateTimeProcessor));
    registry.register(Box::new(LocalDateTimeProcessor));
    registry.register(Box::new(ResponseStructProcessor));
    registry.register(Box::new(OptionsStructProcessor));

    // Record assembly
    for processor in records::record_processors() {
        registry.register(Box::new(processor));
    }

    registry
}
