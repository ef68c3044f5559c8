//! CLI usage mistakes with stable machine-readable codes, plus the process
//! exit status for any failed command.

use std::fmt;

use anyhow::Error;
use serde::Serialize;
use serde_json::Value;

/// Runtime failure: decode, encode, I/O, bad configuration file.
pub const EXIT_FAILURE: i32 = 1;
/// The command line itself was wrong.
pub const EXIT_USAGE: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageCode {
    UnknownFormat,
    InvalidTime,
    MissingDuration,
    MissingAudio,
    NoSoundbites,
    InvalidSoundbiteSelection,
    SoundbiteOutOfRange,
    EmptySoundbiteSelection,
}

impl UsageCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UnknownFormat => "unknown_format",
            Self::InvalidTime => "invalid_time",
            Self::MissingDuration => "missing_duration",
            Self::MissingAudio => "missing_audio",
            Self::NoSoundbites => "no_soundbites",
            Self::InvalidSoundbiteSelection => "invalid_soundbite_selection",
            Self::SoundbiteOutOfRange => "soundbite_out_of_range",
            Self::EmptySoundbiteSelection => "empty_soundbite_selection",
        }
    }
}

impl fmt::Display for UsageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rejected command line. Always exits with [`EXIT_USAGE`].
#[derive(Debug, Clone, Serialize, thiserror::Error)]
#[error("{code}: {message}")]
pub struct UsageError {
    pub code: UsageCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl UsageError {
    pub fn new(code: UsageCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(self, details: Value) -> Self {
        Self {
            details: Some(details),
            ..self
        }
    }

    /// `{"ok": false, "error": {"code", "message", "details"?}}` on one line.
    pub fn to_json_line(&self) -> serde_json::Result<String> {
        #[derive(Serialize)]
        struct Envelope<'a> {
            ok: bool,
            error: &'a UsageError,
        }
        serde_json::to_string(&Envelope { ok: false, error: self })
    }
}

/// The first usage error anywhere in the context chain.
pub fn usage_error(error: &Error) -> Option<&UsageError> {
    error.chain().find_map(|cause| cause.downcast_ref())
}

pub fn exit_code_for(error: &Error) -> i32 {
    if usage_error(error).is_some() {
        EXIT_USAGE
    } else {
        EXIT_FAILURE
    }
}
