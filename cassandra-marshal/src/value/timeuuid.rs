use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use super::CqlTimestamp;

/// 100ns intervals between the start of the Gregorian calendar (1582-10-15)
/// and the Unix epoch.
pub(crate) const GREGORIAN_OFFSET: i64 = 0x01B2_1DD2_1381_4000;
pub(crate) const TICKS_PER_MILLI: i64 = 10_000;
const MAX_TICKS: i64 = (1 << 60) - 1;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidTimeUuid {
    #[error("invalid uuid string `{0}`")]
    Parse(String),
    #[error("uuid {uuid} has version {version}, a timeuuid must be version 1")]
    Version { uuid: Uuid, version: usize },
    #[error("{0}ms is outside of the range a timeuuid can represent")]
    OutOfRange(i64),
}

/// A version 1 (time based) UUID.
///
/// The wrapped UUID is always version 1, every constructor checks it. The
/// 60 bit timestamp counts 100ns intervals since 1582-10-15.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeUuid(Uuid);

impl TimeUuid {
    /// Parse the canonical 36 character hyphenated form.
    pub fn parse_str(s: &str) -> Result<Self, InvalidTimeUuid> {
        if s.len() != 36 {
            return Err(InvalidTimeUuid::Parse(s.to_string()));
        }
        let uuid = Uuid::parse_str(s).map_err(|_| InvalidTimeUuid::Parse(s.to_string()))?;
        TimeUuid::try_from(uuid)
    }

    /// Assemble a timeuuid from its timestamp, clock sequence and node id.
    pub fn from_parts(ticks: u64, clock_seq: u16, node: [u8; 6]) -> Self {
        let time_low = (ticks & 0xFFFF_FFFF) as u32;
        let time_mid = ((ticks >> 32) & 0xFFFF) as u16;
        let time_hi_and_version = ((ticks >> 48) & 0x0FFF) as u16 | 0x1000;
        let clock_seq = clock_seq & 0x3FFF;
        let d4 = [
            0x80 | (clock_seq >> 8) as u8,
            (clock_seq & 0xFF) as u8,
            node[0],
            node[1],
            node[2],
            node[3],
            node[4],
            node[5],
        ];
        TimeUuid(Uuid::from_fields(time_low, time_mid, time_hi_and_version, &d4))
    }

    pub(crate) fn ticks_for(timestamp: CqlTimestamp) -> Result<u64, InvalidTimeUuid> {
        let millis = timestamp.millis();
        millis
            .checked_mul(TICKS_PER_MILLI)
            .and_then(|t| t.checked_add(GREGORIAN_OFFSET))
            .filter(|t| (0..=MAX_TICKS).contains(t))
            .map(|t| t as u64)
            .ok_or(InvalidTimeUuid::OutOfRange(millis))
    }

    /// The 60 bit count of 100ns intervals since 1582-10-15.
    pub fn ticks(&self) -> u64 {
        let (time_low, time_mid, time_hi_and_version, _) = self.0.as_fields();
        (u64::from(time_hi_and_version & 0x0FFF) << 48)
            | (u64::from(time_mid) << 32)
            | u64::from(time_low)
    }

    /// The embedded time, truncated to milliseconds since the Unix epoch.
    pub fn timestamp(&self) -> CqlTimestamp {
        let ticks = self.ticks() as i64 - GREGORIAN_OFFSET;
        CqlTimestamp::from_millis(ticks.div_euclid(TICKS_PER_MILLI))
    }

    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        self.timestamp().to_datetime()
    }

    pub fn clock_seq(&self) -> u16 {
        let (_, _, _, d4) = self.0.as_fields();
        (u16::from(d4[0] & 0x3F) << 8) | u16::from(d4[1])
    }

    pub fn node(&self) -> [u8; 6] {
        let (_, _, _, d4) = self.0.as_fields();
        [d4[2], d4[3], d4[4], d4[5], d4[6], d4[7]]
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    pub fn into_uuid(self) -> Uuid {
        self.0
    }
}

impl TryFrom<Uuid> for TimeUuid {
    type Error = InvalidTimeUuid;

    fn try_from(uuid: Uuid) -> Result<Self, Self::Error> {
        match uuid.get_version_num() {
            1 => Ok(TimeUuid(uuid)),
            version => Err(InvalidTimeUuid::Version { uuid, version }),
        }
    }
}

impl From<TimeUuid> for Uuid {
    fn from(t: TimeUuid) -> Self {
        t.0
    }
}

impl FromStr for TimeUuid {
    type Err = InvalidTimeUuid;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeUuid::parse_str(s)
    }
}

impl fmt::Display for TimeUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const V1: &str = "13814000-1dd2-11b2-8000-000000000000";

    #[test]
    fn rejects_other_versions() {
        let err = TimeUuid::parse_str("f47ac10b-58cc-4372-a567-0e02b2c3d479").unwrap_err();
        assert!(matches!(err, InvalidTimeUuid::Version { version: 4, .. }));
    }

    #[test]
    fn rejects_non_canonical_strings() {
        assert!(matches!(
            TimeUuid::parse_str("138140001dd211b28000000000000000"),
            Err(InvalidTimeUuid::Parse(_))
        ));
        assert!(matches!(
            TimeUuid::parse_str("zzzzzzzz-1dd2-11b2-8000-000000000000"),
            Err(InvalidTimeUuid::Parse(_))
        ));
    }

    #[test]
    fn epoch_uuid_has_zero_timestamp() {
        let t = TimeUuid::parse_str(V1).unwrap();
        assert_eq!(t.ticks(), GREGORIAN_OFFSET as u64);
        assert_eq!(t.timestamp(), CqlTimestamp::from_millis(0));
        assert_eq!(t.to_string(), V1);
    }

    #[test]
    fn parts_survive_assembly() {
        let ts = CqlTimestamp::from_millis(1_609_459_200_123);
        let ticks = TimeUuid::ticks_for(ts).unwrap();
        let node = [1, 2, 3, 4, 5, 6];
        let t = TimeUuid::from_parts(ticks, 0x1234, node);
        assert_eq!(t.as_uuid().get_version_num(), 1);
        assert_eq!(t.timestamp(), ts);
        assert_eq!(t.clock_seq(), 0x1234);
        assert_eq!(t.node(), node);
    }

    #[test]
    fn timestamps_before_the_gregorian_calendar_are_rejected() {
        let too_early = CqlTimestamp::from_millis(-GREGORIAN_OFFSET / TICKS_PER_MILLI - 1);
        assert!(TimeUuid::ticks_for(too_early).is_err());
    }
}
