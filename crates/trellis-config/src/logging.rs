//! Log output formats for the `trellis` binary.
//!
//! Logs always go to standard error. The format only decides how each event
//! is laid out there, so command results on standard output are unaffected.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Layout of each log event on standard error.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One JSON object per event with fields flattened to the top level.
    #[default]
    Json,
    /// Single-line text, abbreviated for interactive use.
    Compact,
    /// Multi-field text with span context, for debugging a plugin run.
    Full,
}

impl LogFormat {
    /// Returns `true` for formats meant for log collectors rather than people.
    #[must_use]
    pub const fn is_structured(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Errors encountered while parsing a [`LogFormat`] from text.
pub type LogFormatParseError = strum::ParseError;
