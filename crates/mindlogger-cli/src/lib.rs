//! CLI library components for the MindLogger export processor.

pub mod logging;
pub mod pipeline;
