//! The four user roles recorded on every export row.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    /// Subject the answers are about.
    Target,
    /// Subject who answered.
    Source,
    /// Account that entered the data.
    Input,
    /// Applet account owning the submission.
    Account,
}

impl UserType {
    pub const ALL: [UserType; 4] = [
        UserType::Target,
        UserType::Source,
        UserType::Input,
        UserType::Account,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Target => "target",
            UserType::Source => "source",
            UserType::Input => "input",
            UserType::Account => "account",
        }
    }

    /// Name of the record column grouping this user's fields.
    pub const fn record_name(&self) -> &'static str {
        match self {
            UserType::Target => "target_user",
            UserType::Source => "source_user",
            UserType::Input => "input_user",
            UserType::Account => "account_user",
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
