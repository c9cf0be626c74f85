//! Timestamp formatting for artifact names and log lines

use chrono::{DateTime, Local};

/// Supported timestamp layouts.
///
/// All layouts are fixed-width and zero-padded, so formatted values sort
/// lexicographically in chronological order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeFormat {
    /// `2024-05-01`, the day bucket.
    Day,
    /// `2024-05-01-09_04_05`, safe for file names.
    Now,
    /// `2024-05-01 09:04:05`
    Unix,
}

impl TimeFormat {
    pub fn pattern(self) -> &'static str {
        match self {
            TimeFormat::Day => "%Y-%m-%d",
            TimeFormat::Now => "%Y-%m-%d-%H_%M_%S",
            TimeFormat::Unix => "%Y-%m-%d %H:%M:%S",
        }
    }
}

/// Format the current local time
pub fn timestamp(format: TimeFormat) -> String {
    format_at(format, Local::now())
}

/// Format the given instant
pub fn format_at(format: TimeFormat, instant: DateTime<Local>) -> String {
    instant.format(format.pattern()).to_string()
}

/// Current time as Unix seconds, truncated to the second
pub fn unix_seconds() -> i64 {
    Local::now().timestamp()
}
