//! Time utilities for CalDAV queries.
//!
//! CalDAV `time-range` filters take UTC date-times in the compact iCalendar
//! form `YYYYMMDDTHHMMSSZ`. This module converts caller-supplied ISO-8601
//! strings into that form and provides [`TimeRange`] for holding a validated
//! pair of bounds.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The `strftime` pattern for CalDAV wire date-times.
const CALDAV_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Errors produced while converting caller-facing times.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeError {
    /// The input was not a recognised ISO-8601 date or date-time.
    #[error("invalid ISO-8601 date-time: {0:?}")]
    InvalidIso(String),

    /// The input was not a CalDAV wire date-time.
    #[error("invalid CalDAV date-time: {0:?}")]
    InvalidCalDav(String),

    /// The range ends before it starts.
    #[error("time range start {start} is after end {end}")]
    InvertedRange {
        /// Start bound (wire form).
        start: String,
        /// End bound (wire form).
        end: String,
    },
}

/// Formats a UTC date-time in the CalDAV wire form (`20250205T143000Z`).
pub fn to_caldav_datetime(dt: DateTime<Utc>) -> String {
    dt.format(CALDAV_FORMAT).to_string()
}

/// Converts an ISO-8601 string into the CalDAV wire form.
///
/// Accepted inputs:
/// - RFC 3339 with an offset (`2025-02-05T14:30:00+01:00`), converted to UTC
/// - naive date-time (`2025-02-05T14:30:00`, optional fractional seconds),
///   treated as UTC
/// - date only (`2025-02-05`), midnight UTC
///
/// # Errors
///
/// Returns [`TimeError::InvalidIso`] if none of the forms match.
pub fn iso_to_caldav(input: &str) -> Result<String, TimeError> {
    parse_iso(input).map(to_caldav_datetime)
}

fn parse_iso(input: &str) -> Result<DateTime<Utc>, TimeError> {
    let s = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, pattern) {
            return Ok(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        && let Some(midnight) = date.and_hms_opt(0, 0, 0)
    {
        return Ok(midnight.and_utc());
    }

    Err(TimeError::InvalidIso(input.to_string()))
}

fn parse_caldav(input: &str) -> Result<DateTime<Utc>, TimeError> {
    NaiveDateTime::parse_from_str(input, CALDAV_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| TimeError::InvalidCalDav(input.to_string()))
}

/// A query window expressed as CalDAV wire date-times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    /// Start of the window (wire form).
    pub start: String,
    /// End of the window (wire form).
    pub end: String,
}

impl TimeRange {
    /// Creates a range from two wire-form bounds.
    ///
    /// # Errors
    ///
    /// Returns an error if either bound is not in wire form, or if `start`
    /// is after `end`.
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Result<Self, TimeError> {
        let start = start.into();
        let end = end.into();
        let (s, e) = (parse_caldav(&start)?, parse_caldav(&end)?);
        if s > e {
            return Err(TimeError::InvertedRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Creates a range from ISO-8601 strings, see [`iso_to_caldav`].
    pub fn from_iso(start: &str, end: &str) -> Result<Self, TimeError> {
        Self::new(iso_to_caldav(start)?, iso_to_caldav(end)?)
    }
}
