//! # Temporal Types: UTC-Only Timestamps
//!
//! `Timestamp` is a UTC instant truncated to whole seconds. Request expiry,
//! verdict timestamps and the `current_year/month/day` public inputs of the
//! age circuit are all derived from it, and every protocol operation takes
//! "now" as an explicit argument so tests can pin the clock.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TemporalError;

/// A UTC-only timestamp, truncated to seconds precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

/// A civil date in UTC, as fed to the age circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl Timestamp {
    /// Current UTC time, truncated.
    pub fn now() -> Self {
        Self::from_utc(Utc::now())
    }

    /// From a `DateTime<Utc>`, truncating sub-seconds.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt.with_nanosecond(0).unwrap_or(dt))
    }

    /// From a Unix epoch timestamp (seconds).
    pub fn from_epoch_secs(secs: i64) -> Result<Self, TemporalError> {
        DateTime::from_timestamp(secs, 0)
            .map(Self)
            .ok_or(TemporalError::OutOfRange(secs))
    }

    /// Parse an RFC 3339 string with any offset, converting to UTC.
    pub fn parse(s: &str) -> Result<Self, TemporalError> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| Self::from_utc(dt.with_timezone(&Utc)))
            .map_err(|_| TemporalError::InvalidFormat(s.to_string()))
    }

    /// Parse a date-valued input: RFC 3339, or a bare `YYYY-MM-DD` taken
    /// as midnight UTC. Nothing else is accepted.
    pub fn parse_date(s: &str) -> Result<Self, TemporalError> {
        let s = s.trim();
        if let Ok(ts) = Self::parse(s) {
            return Ok(ts);
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| Self(dt.and_utc()))
            .ok_or_else(|| TemporalError::InvalidFormat(s.to_string()))
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Unix epoch seconds.
    pub fn epoch_secs(&self) -> i64 {
        self.0.timestamp()
    }

    /// This instant plus `secs` seconds, saturating at chrono's range.
    pub fn plus_secs(&self, secs: u64) -> Self {
        let secs = i64::try_from(secs).unwrap_or(i64::MAX);
        Duration::try_seconds(secs)
            .and_then(|d| self.0.checked_add_signed(d))
            .map(Self)
            .unwrap_or(Self(DateTime::<Utc>::MAX_UTC))
    }

    /// Whole seconds elapsed from `earlier` to `self` (negative if `earlier` is later).
    pub fn seconds_since(&self, earlier: &Timestamp) -> i64 {
        self.epoch_secs() - earlier.epoch_secs()
    }

    /// The UTC calendar date of this instant.
    pub fn calendar_date(&self) -> CalendarDate {
        CalendarDate {
            year: self.0.year(),
            month: self.0.month(),
            day: self.0.day(),
        }
    }

    /// Render as ISO8601 with Z suffix, e.g. `2024-07-15T12:00:00Z`.
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}
