//! Severity levels.
//!
//! Levels are ordered for threshold comparison. `Unset` used as a threshold
//! means "inherit from the parent", never "accept everything".

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Threshold that wins when every node up to the root is `Unset`.
pub const DEFAULT_THRESHOLD: Severity = Severity::Warning;

/// Severity of a log event, or the threshold of a logger.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Inherit the threshold from the nearest ancestor
    #[default]
    #[serde(alias = "notset")]
    Unset = 0,
    Debug = 1,
    Info = 2,
    #[serde(alias = "warn")]
    Warning = 3,
    Error = 4,
    Critical = 5,
}

impl Severity {
    /// All levels in ascending order.
    pub const ALL: [Severity; 6] = [
        Severity::Unset,
        Severity::Debug,
        Severity::Info,
        Severity::Warning,
        Severity::Error,
        Severity::Critical,
    ];

    /// Raw numeric value used for threshold comparison.
    pub fn as_raw(self) -> i32 {
        self as i32
    }

    /// Exact conversion; `None` for out-of-range values.
    pub fn from_raw(raw: i32) -> Option<Severity> {
        Self::ALL.get(usize::try_from(raw).ok()?).copied()
    }

    /// Lowercase name (`unset`, `debug`, ...).
    pub fn name(self) -> &'static str {
        level_name(self.as_raw(), false)
    }

    pub fn is_unset(self) -> bool {
        self == Severity::Unset
    }
}

/// Name for a raw level value, `unknown` when out of range.
pub fn level_name(raw: i32, uppercase: bool) -> &'static str {
    match (raw, uppercase) {
        (0, false) => "unset",
        (0, true) => "UNSET",
        (1, false) => "debug",
        (1, true) => "DEBUG",
        (2, false) => "info",
        (2, true) => "INFO",
        (3, false) => "warning",
        (3, true) => "WARNING",
        (4, false) => "error",
        (4, true) => "ERROR",
        (5, false) => "critical",
        (5, true) => "CRITICAL",
        (_, false) => "unknown",
        (_, true) => "UNKNOWN",
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unrecognised level name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown severity '{0}'")]
pub struct ParseSeverityError(pub String);

impl FromStr for Severity {
    type Err = ParseSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unset" | "notset" => Ok(Severity::Unset),
            "debug" => Ok(Severity::Debug),
            "info" => Ok(Severity::Info),
            "warning" | "warn" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            "critical" => Ok(Severity::Critical),
            other => other
                .parse::<i32>()
                .ok()
                .and_then(Severity::from_raw)
                .ok_or_else(|| ParseSeverityError(s.to_string())),
        }
    }
}
