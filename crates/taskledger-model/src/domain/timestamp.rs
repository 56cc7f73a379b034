use std::{cmp::Ordering, fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::{
    OffsetDateTime, UtcOffset,
    format_description::{BorrowedFormatItem, well_known::Rfc3339},
    macros::format_description,
};

use crate::ModelError;

/// Stored layout: UTC, microsecond precision, literal `Z` suffix.
const RECORD_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:6]Z");

/// A UTC instant truncated to microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(OffsetDateTime);

impl Timestamp {
    /// Parse an RFC 3339 timestamp in any offset and normalise it to UTC.
    pub fn parse(value: &str) -> Result<Self, ModelError> {
        let dt = OffsetDateTime::parse(value.trim(), &Rfc3339).map_err(|e| {
            ModelError::InvalidTimestamp {
                value: value.to_string(),
                reason: e.to_string(),
            }
        })?;
        Self::from_datetime(dt)
    }

    /// Build from fractional seconds since the unix epoch.
    pub fn from_unix_seconds(secs: f64) -> Result<Self, ModelError> {
        let invalid = |reason: String| ModelError::InvalidTimestamp {
            value: secs.to_string(),
            reason,
        };
        if !secs.is_finite() {
            return Err(invalid("not a finite number".into()));
        }
        let micros = (secs * 1_000_000.0).round() as i128;
        let dt = OffsetDateTime::from_unix_timestamp_nanos(micros * 1_000)
            .map_err(|e| invalid(e.to_string()))?;
        Self::from_datetime(dt)
    }

    pub fn from_datetime(dt: OffsetDateTime) -> Result<Self, ModelError> {
        let utc = dt.to_offset(UtcOffset::UTC);
        let truncated = utc
            .replace_microsecond(utc.microsecond())
            .map_err(|e| ModelError::InvalidTimestamp {
                value: utc.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self(truncated))
    }

    pub fn now() -> Self {
        let now = OffsetDateTime::now_utc();
        Self(now.replace_microsecond(now.microsecond()).unwrap_or(now))
    }
}

/// Whole seconds between `start` and `stop`, rounded to nearest with ties to even.
///
/// A stop earlier than the start (clock skew) yields `0`.
pub fn run_time_seconds(start: &Timestamp, stop: &Timestamp) -> u64 {
    let micros = (stop.0 - start.0).whole_microseconds();
    if micros <= 0 {
        return 0;
    }
    let (quot, rem) = (micros / 1_000_000, micros % 1_000_000);
    let secs = match rem.cmp(&500_000) {
        Ordering::Greater => quot + 1,
        Ordering::Equal if quot % 2 == 1 => quot + 1,
        _ => quot,
    };
    u64::try_from(secs).unwrap_or(u64::MAX)
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.0.format(RECORD_FORMAT).map_err(|_| fmt::Error)?;
        f.write_str(&s)
    }
}

impl FromStr for Timestamp {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
