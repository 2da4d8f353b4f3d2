use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter, EnumString, IntoStaticStr};

/// Companies the backend can answer questions about.
///
/// The set is fixed by the backend; wire names are lowercase.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    EnumIter,
    AsRefStr,
    IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Company {
    Bajaj,
    Tcs,
    Axis,
    Godrej,
    Reliance,
}

impl Company {
    /// Lowercase identifier sent in the request body.
    pub fn wire_name(self) -> &'static str {
        self.into()
    }

    /// Capitalized name shown in the UI.
    pub fn display_name(self) -> &'static str {
        match self {
            Company::Bajaj => "Bajaj",
            Company::Tcs => "TCS",
            Company::Axis => "Axis",
            Company::Godrej => "Godrej",
            Company::Reliance => "Reliance",
        }
    }
}

impl std::fmt::Display for Company {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Who authored a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Bot,
}

/// One message as persisted in a saved transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub role: ChatRole,
    pub content: String,
    pub company: Company,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}
