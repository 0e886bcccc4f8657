// src/models.rs
use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Timestamp layout of `PasswordRecord::time`. Fixed-width and zero-padded,
/// so string order matches chronological order.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One entry of the history file.
///
/// Reading is lenient so that a single odd entry never makes the whole file
/// unreadable: a missing `password`/`time` becomes `""`, a non-string value
/// is kept as its JSON text, and unknown keys are carried through `extra`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PasswordRecord {
    #[serde(default, deserialize_with = "lenient_text")]
    pub password: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub time: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        other => other.to_string(),
    })
}

impl PasswordRecord {
    pub fn new(password: String, time: String) -> Self {
        Self { password, time, extra: Map::new() }
    }

    /// Date component of `time`, or `None` if it doesn't match `TIME_FORMAT`.
    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDateTime::parse_from_str(&self.time, TIME_FORMAT)
            .ok()
            .map(|dt| dt.date())
    }
}

/// Current local time rendered in `TIME_FORMAT`.
pub fn now_timestamp() -> String {
    Local::now().format(TIME_FORMAT).to_string()
}

/// The password produced by the most recent successful generation.
/// Held by the shell and handed to the save and copy actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastGenerated {
    pub password: String,
}

impl LastGenerated {
    pub fn new(password: String) -> Self {
        Self { password }
    }
}
