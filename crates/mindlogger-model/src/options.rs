//! Selectable choices of an item.

use serde::{Deserialize, Serialize};

/// One choice decoded from an item's options cell.
///
/// `value` is what a `value:` response refers to; `score` is only present for
/// scored option lists and numeric ranges.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OptionRecord {
    pub name: String,
    pub value: i64,
    pub score: Option<i64>,
}

impl OptionRecord {
    pub fn new(name: impl Into<String>, value: i64, score: Option<i64>) -> Self {
        Self {
            name: name.into(),
            value,
            score,
        }
    }

    /// Option synthesized from a `Min:`/`Max:` range step.
    pub fn from_range_step(step: i64) -> Self {
        Self::new(step.to_string(), step, Some(step))
    }
}
