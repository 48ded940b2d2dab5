use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Timelike, Utc};
use thiserror::Error;

/// Days between 0001-01-01 (day 1 of the common era) and 1970-01-01.
const UNIX_EPOCH_FROM_CE: i64 = 719_163;
/// CQL dates are unsigned with the epoch in the middle of the range.
const DATE_EPOCH_OFFSET: i64 = 1 << 31;
const NANOS_PER_SECOND: i64 = 1_000_000_000;
const NANOS_PER_DAY: i64 = 86_400 * NANOS_PER_SECOND;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidTemporal {
    #[error("{0} days from the epoch is out of range for a date")]
    DaysOutOfRange(i64),
    #[error("{0}ns is not a time of day")]
    NanosOutOfRange(i64),
    #[error("{0}ms from the epoch is out of range for a timestamp")]
    MillisOutOfRange(i64),
    #[error("unable to parse `{input}`: {reason}")]
    Parse { input: String, reason: String },
}

/// A CQL `date`, stored as the wire value: days since 1970-01-01 offset by
/// 2^31 so the full range fits an unsigned 32 bit integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CqlDate(u32);

impl CqlDate {
    pub fn from_raw(raw: u32) -> Self {
        CqlDate(raw)
    }

    pub fn raw(&self) -> u32 {
        self.0
    }

    pub fn from_days_since_epoch(days: i64) -> Result<Self, InvalidTemporal> {
        days.checked_add(DATE_EPOCH_OFFSET)
            .and_then(|raw| u32::try_from(raw).ok())
            .map(CqlDate)
            .ok_or(InvalidTemporal::DaysOutOfRange(days))
    }

    pub fn days_since_epoch(&self) -> i64 {
        i64::from(self.0) - DATE_EPOCH_OFFSET
    }

    /// `None` when the date is outside of the range chrono can represent.
    pub fn to_naive_date(&self) -> Option<NaiveDate> {
        let days = i32::try_from(self.days_since_epoch() + UNIX_EPOCH_FROM_CE).ok()?;
        NaiveDate::from_num_days_from_ce_opt(days)
    }
}

impl From<NaiveDate> for CqlDate {
    fn from(date: NaiveDate) -> Self {
        let days = i64::from(date.num_days_from_ce()) - UNIX_EPOCH_FROM_CE;
        // chrono's range is a few hundred thousand years, far inside ours
        CqlDate((days + DATE_EPOCH_OFFSET) as u32)
    }
}

impl FromStr for CqlDate {
    type Err = InvalidTemporal;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(CqlDate::from)
            .map_err(|e| parse_error(s, e))
    }
}

impl fmt::Display for CqlDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_naive_date() {
            Some(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            None => write!(f, "{}", self.days_since_epoch()),
        }
    }
}

/// A CQL `time`: nanoseconds since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CqlTime(i64);

impl CqlTime {
    pub fn from_nanos(nanos: i64) -> Result<Self, InvalidTemporal> {
        if (0..NANOS_PER_DAY).contains(&nanos) {
            Ok(CqlTime(nanos))
        } else {
            Err(InvalidTemporal::NanosOutOfRange(nanos))
        }
    }

    pub fn nanos(&self) -> i64 {
        self.0
    }

    pub fn to_naive_time(&self) -> Option<NaiveTime> {
        let secs = u32::try_from(self.0 / NANOS_PER_SECOND).ok()?;
        let nanos = u32::try_from(self.0 % NANOS_PER_SECOND).ok()?;
        NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos)
    }
}

/// A leap second is folded into the last nanosecond of its second.
impl From<NaiveTime> for CqlTime {
    fn from(time: NaiveTime) -> Self {
        let nanos = i64::from(time.nanosecond()).min(NANOS_PER_SECOND - 1);
        CqlTime(i64::from(time.num_seconds_from_midnight()) * NANOS_PER_SECOND + nanos)
    }
}

impl FromStr for CqlTime {
    type Err = InvalidTemporal;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveTime::parse_from_str(s, "%H:%M:%S%.f")
            .map(CqlTime::from)
            .map_err(|e| parse_error(s, e))
    }
}

impl fmt::Display for CqlTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_naive_time() {
            Some(time) => write!(f, "{}", time.format("%H:%M:%S%.9f")),
            None => write!(f, "{}ns", self.0),
        }
    }
}

/// A CQL `timestamp`: milliseconds since 1970-01-01T00:00:00Z.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CqlTimestamp(i64);

impl CqlTimestamp {
    pub fn from_millis(millis: i64) -> Self {
        CqlTimestamp(millis)
    }

    pub fn millis(&self) -> i64 {
        self.0
    }

    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.0)
    }

    pub fn now() -> Self {
        CqlTimestamp(Utc::now().timestamp_millis())
    }
}

impl From<DateTime<Utc>> for CqlTimestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        CqlTimestamp(dt.timestamp_millis())
    }
}

/// Midnight UTC at the start of `date`.
impl From<CqlDate> for CqlTimestamp {
    fn from(date: CqlDate) -> Self {
        CqlTimestamp(date.days_since_epoch() * 86_400_000)
    }
}

impl FromStr for CqlTimestamp {
    type Err = InvalidTemporal;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| CqlTimestamp(dt.timestamp_millis()))
            .map_err(|e| parse_error(s, e))
    }
}

impl fmt::Display for CqlTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.3fZ")),
            None => write!(f, "{}ms", self.0),
        }
    }
}

fn parse_error(input: &str, error: chrono::ParseError) -> InvalidTemporal {
    InvalidTemporal::Parse {
        input: input.to_string(),
        reason: error.to_string(),
    }
}
