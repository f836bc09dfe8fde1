// SPDX-License-Identifier: MIT OR Apache-2.0
//! `MM:SS` timecode parsing and formatting.

use thiserror::Error;

/// Timecode parse errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimecodeError {
    /// Nothing but whitespace
    #[error("empty timecode")]
    Empty,

    /// Not of the form `MM:SS` or `MM:SS:CC`
    #[error("malformed timecode: {0:?}")]
    Malformed(String),

    /// Seconds field above 59
    #[error("seconds out of range: {0}")]
    SecondsOutOfRange(u32),

    /// Hundredths field above 99
    #[error("centiseconds out of range: {0}")]
    CentisecondsOutOfRange(u32),
}

fn parse_field(field: &str, text: &str) -> Result<u32, TimecodeError> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TimecodeError::Malformed(text.to_string()));
    }
    field
        .parse()
        .map_err(|_| TimecodeError::Malformed(text.to_string()))
}

/// Parse `MM:SS` or `MM:SS:CC` into seconds
///
/// Minutes are unbounded. Surrounding whitespace is ignored.
pub fn parse_timecode(text: &str) -> Result<f64, TimecodeError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(TimecodeError::Empty);
    }

    let fields: Vec<&str> = trimmed.split(':').collect();
    let (minutes, seconds, centis) = match fields.as_slice() {
        [mm, ss] => (parse_field(mm, trimmed)?, parse_field(ss, trimmed)?, 0),
        [mm, ss, cc] => (
            parse_field(mm, trimmed)?,
            parse_field(ss, trimmed)?,
            parse_field(cc, trimmed)?,
        ),
        _ => return Err(TimecodeError::Malformed(trimmed.to_string())),
    };

    if seconds > 59 {
        return Err(TimecodeError::SecondsOutOfRange(seconds));
    }
    if centis > 99 {
        return Err(TimecodeError::CentisecondsOutOfRange(centis));
    }

    Ok(f64::from(minutes) * 60.0 + f64::from(seconds) + f64::from(centis) / 100.0)
}

/// Format seconds as `MM:SS`, truncating fractions
pub fn format_timecode(seconds: f64) -> String {
    let whole = if seconds.is_finite() { seconds.max(0.0) as u64 } else { 0 };
    format!("{:02}:{:02}", whole / 60, whole % 60)
}

/// Format seconds as `MM:SS:CC` with hundredths
pub fn format_timecode_precise(seconds: f64) -> String {
    let centis = if seconds.is_finite() {
        (seconds.max(0.0) * 100.0).floor() as u64
    } else {
        0
    };
    let whole = centis / 100;
    format!("{:02}:{:02}:{:02}", whole / 60, whole % 60, centis % 100)
}
