//! Timeout normalization and formatting
//!
//! Keywords accept timeouts either as a number of seconds or as a human
//! time-string (`"5s"`, `"1 min 30 s"`, `"500ms"`). Everything is normalized to
//! a [`Duration`] against a default before any waiting happens.

use std::time::Duration;

use crate::{Error, Result};

/// A timeout as supplied by a keyword caller
#[derive(Debug, Clone, PartialEq)]
pub enum TimeoutArg {
    /// Seconds, possibly fractional
    Seconds(f64),
    /// Human time-string, or a plain number in a string
    Text(String),
    /// Already normalized
    Duration(Duration),
}

impl From<f64> for TimeoutArg {
    fn from(seconds: f64) -> Self {
        TimeoutArg::Seconds(seconds)
    }
}

impl From<u64> for TimeoutArg {
    fn from(seconds: u64) -> Self {
        TimeoutArg::Seconds(seconds as f64)
    }
}

impl From<i32> for TimeoutArg {
    fn from(seconds: i32) -> Self {
        TimeoutArg::Seconds(f64::from(seconds))
    }
}

impl From<&str> for TimeoutArg {
    fn from(text: &str) -> Self {
        TimeoutArg::Text(text.to_string())
    }
}

impl From<String> for TimeoutArg {
    fn from(text: String) -> Self {
        TimeoutArg::Text(text)
    }
}

impl From<Duration> for TimeoutArg {
    fn from(duration: Duration) -> Self {
        TimeoutArg::Duration(duration)
    }
}

impl TimeoutArg {
    /// Convert to a duration
    pub fn to_duration(&self) -> Result<Duration> {
        match self {
            TimeoutArg::Seconds(seconds) => seconds_to_duration(*seconds),
            TimeoutArg::Text(text) => parse_timestr(text),
            TimeoutArg::Duration(duration) => Ok(*duration),
        }
    }
}

/// Resolve an optional caller timeout against `default`
pub fn normalize(timeout: Option<TimeoutArg>, default: Duration) -> Result<Duration> {
    match timeout {
        Some(timeout) => timeout.to_duration(),
        None => Ok(default),
    }
}

/// Parse a time-string.
///
/// Plain numbers (`"5"`, `"1.5"`) are seconds; anything else goes through
/// `humantime`, which accepts `"5s"`, `"5 seconds"`, `"1m 30s"`, `"250ms"`.
pub fn parse_timestr(text: &str) -> Result<Duration> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(Error::invalid_timeout("empty time string"));
    }

    if let Ok(seconds) = trimmed.parse::<f64>() {
        return seconds_to_duration(seconds);
    }

    humantime::parse_duration(trimmed)
        .map_err(|e| Error::invalid_timeout(format!("'{}': {}", text, e)))
}

/// Human form of a duration for error messages
pub fn format_timeout(timeout: Duration) -> String {
    // sub-millisecond noise only clutters the message
    let millis = Duration::from_millis(timeout.as_millis() as u64);
    if millis.is_zero() {
        return "0s".to_string();
    }
    humantime::format_duration(millis).to_string()
}

fn seconds_to_duration(seconds: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(seconds)
        .map_err(|_| Error::invalid_timeout(format!("{} seconds", seconds)))
}
