use std::fmt;

use thiserror::Error;

/// Which mini-language a [`ParseError`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grammar {
    Response,
    Options,
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Grammar::Response => f.write_str("response"),
            Grammar::Options => f.write_str("options"),
        }
    }
}

/// A cell that could not be decoded at all.
///
/// `position` is the byte offset into `text` where scanning stopped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot parse {grammar} text at byte {position}: {reason} (text: {text:?})")]
pub struct ParseError {
    pub grammar: Grammar,
    pub text: String,
    pub position: usize,
    pub reason: String,
}

impl ParseError {
    pub fn new(
        grammar: Grammar,
        text: impl Into<String>,
        position: usize,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            grammar,
            text: text.into(),
            position,
            reason: reason.into(),
        }
    }
}
