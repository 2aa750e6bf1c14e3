//! Parsers for the two free-text encodings found in MindLogger exports.
//!
//! - [`parse_response`] decodes an `item_response` cell into a
//!   [`ResponseRecord`](mindlogger_model::ResponseRecord).
//! - [`parse_options`] decodes an `item_response_options` cell into an ordered
//!   list of [`OptionRecord`](mindlogger_model::OptionRecord)s.
//!
//! Both are pure functions of one string and can be called per cell in any
//! order.

mod cursor;
pub mod options;
pub mod response;

pub use options::parse_options;
pub use response::{parse_response, response_rule_names};
