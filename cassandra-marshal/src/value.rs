use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::net::IpAddr;

use bigdecimal::num_bigint::BigInt;
use bigdecimal::{BigDecimal, ToPrimitive};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use itertools::Itertools;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::Serialize;
use smol_str::SmolStr;
use uuid::Uuid;

use crate::options::IntegerPolicy;
use crate::types::ColumnType;

mod decimal;
mod temporal;
mod timeuuid;

pub use decimal::{CqlDecimal, InvalidDecimal};
pub use temporal::{CqlDate, CqlTime, CqlTimestamp, InvalidTemporal};
pub(crate) use timeuuid::{GREGORIAN_OFFSET, TICKS_PER_MILLI};
pub use timeuuid::{InvalidTimeUuid, TimeUuid};

/// A value as the host language sees it.
///
/// The first group of variants are the generic host representations, which
/// say nothing about which CQL type they should become. `Integer` in
/// particular could be anything from `tinyint` to `varint`. The second group
/// are wrappers for values whose CQL type is fixed, and map onto exactly one
/// column type.
///
/// Values are totally ordered so they can live in the `Set` and `Map`
/// variants. Floats are compared with [`f64::total_cmp`], so `NaN` equals
/// itself and `-0.0` is distinct from `0.0`.
#[derive(Debug, Clone)]
pub enum HostValue {
    Null,
    Boolean(bool),
    Integer(BigInt),
    Real(f64),
    Numeric(BigDecimal),
    Str(SmolStr),
    Bytes(Vec<u8>),
    List(Vec<HostValue>),
    Set(BTreeSet<HostValue>),
    Map(BTreeMap<HostValue, HostValue>),
    TinyInt(i8),
    SmallInt(i16),
    Int(i32),
    BigInt(i64),
    Counter(i64),
    VarInt(BigInt),
    Float(f32),
    Double(f64),
    Decimal(CqlDecimal),
    Uuid(Uuid),
    TimeUuid(TimeUuid),
    Inet(IpAddr),
    Date(CqlDate),
    Time(CqlTime),
    Timestamp(CqlTimestamp),
}

impl HostValue {
    pub fn list<I: IntoIterator<Item = HostValue>>(items: I) -> Self {
        HostValue::List(items.into_iter().collect())
    }

    pub fn set<I: IntoIterator<Item = HostValue>>(items: I) -> Self {
        HostValue::Set(items.into_iter().collect())
    }

    pub fn map<I: IntoIterator<Item = (HostValue, HostValue)>>(entries: I) -> Self {
        HostValue::Map(entries.into_iter().collect())
    }

    /// A short description of the kind of value, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            HostValue::Null => "null",
            HostValue::Boolean(_) => "boolean",
            HostValue::Integer(_) => "integer",
            HostValue::Real(_) => "real",
            HostValue::Numeric(_) => "numeric",
            HostValue::Str(_) => "string",
            HostValue::Bytes(_) => "bytes",
            HostValue::List(_) => "list",
            HostValue::Set(_) => "set",
            HostValue::Map(_) => "map",
            HostValue::TinyInt(_) => "tinyint",
            HostValue::SmallInt(_) => "smallint",
            HostValue::Int(_) => "int",
            HostValue::BigInt(_) => "bigint",
            HostValue::Counter(_) => "counter",
            HostValue::VarInt(_) => "varint",
            HostValue::Float(_) => "float",
            HostValue::Double(_) => "double",
            HostValue::Decimal(_) => "decimal",
            HostValue::Uuid(_) => "uuid",
            HostValue::TimeUuid(_) => "timeuuid",
            HostValue::Inet(_) => "inet",
            HostValue::Date(_) => "date",
            HostValue::Time(_) => "time",
            HostValue::Timestamp(_) => "timestamp",
        }
    }

    /// The column type this value binds as when no hint is given.
    ///
    /// Collections report unknown element types, their elements are inferred
    /// one at a time. `Null` has no type of its own and reports `Unknown`.
    pub fn inferred_type(&self, integers: IntegerPolicy) -> ColumnType {
        match self {
            HostValue::Null => ColumnType::Unknown,
            HostValue::Boolean(_) => ColumnType::Boolean,
            HostValue::Integer(i) => integers.column_type_for(i),
            HostValue::Real(_) => ColumnType::Double,
            HostValue::Numeric(_) => ColumnType::Decimal,
            HostValue::Str(_) => ColumnType::Text,
            HostValue::Bytes(_) => ColumnType::Blob,
            HostValue::List(_) => ColumnType::list(ColumnType::Unknown),
            HostValue::Set(_) => ColumnType::set(ColumnType::Unknown),
            HostValue::Map(_) => ColumnType::map(ColumnType::Unknown, ColumnType::Unknown),
            HostValue::TinyInt(_) => ColumnType::TinyInt,
            HostValue::SmallInt(_) => ColumnType::SmallInt,
            HostValue::Int(_) => ColumnType::Int,
            HostValue::BigInt(_) => ColumnType::BigInt,
            HostValue::Counter(_) => ColumnType::Counter,
            HostValue::VarInt(_) => ColumnType::VarInt,
            HostValue::Float(_) => ColumnType::Float,
            HostValue::Double(_) => ColumnType::Double,
            HostValue::Decimal(_) => ColumnType::Decimal,
            HostValue::Uuid(_) => ColumnType::Uuid,
            HostValue::TimeUuid(_) => ColumnType::TimeUuid,
            HostValue::Inet(_) => ColumnType::Inet,
            HostValue::Date(_) => ColumnType::Date,
            HostValue::Time(_) => ColumnType::Time,
            HostValue::Timestamp(_) => ColumnType::Timestamp,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn is_str(&self) -> bool {
        matches!(self, Self::Str(_))
    }

    pub fn is_bytes(&self) -> bool {
        matches!(self, Self::Bytes(_))
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, Self::List(_) | Self::Set(_) | Self::Map(_))
    }

    /// Whether this is an exact integer, generic or any of the integer
    /// wrappers.
    pub fn is_integer(&self) -> bool {
        self.to_integer().is_some()
    }

    pub fn to_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn to_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn to_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// The value of any exact integer, generic or wrapped.
    pub fn to_integer(&self) -> Option<BigInt> {
        match self {
            Self::Integer(i) | Self::VarInt(i) => Some(i.clone()),
            Self::TinyInt(i) => Some(BigInt::from(*i)),
            Self::SmallInt(i) => Some(BigInt::from(*i)),
            Self::Int(i) => Some(BigInt::from(*i)),
            Self::BigInt(i) | Self::Counter(i) => Some(BigInt::from(*i)),
            _ => None,
        }
    }

    /// The integer reduced modulo 2^64 into an `i64`, for callers which
    /// want the wrap-around behaviour of a fixed width host integer.
    pub fn wrapping_i64(&self) -> Option<i64> {
        let bytes = self.to_integer()?.to_signed_bytes_le();
        let fill = match bytes.last() {
            Some(b) if b & 0x80 != 0 => 0xFF,
            _ => 0,
        };
        let mut le = [fill; 8];
        for (dst, src) in le.iter_mut().zip(&bytes) {
            *dst = *src;
        }
        Some(i64::from_le_bytes(le))
    }

    pub fn wrapping_i32(&self) -> Option<i32> {
        self.wrapping_i64().map(|i| i as i32)
    }

    pub fn wrapping_i16(&self) -> Option<i16> {
        self.wrapping_i64().map(|i| i as i16)
    }

    pub fn wrapping_i8(&self) -> Option<i8> {
        self.wrapping_i64().map(|i| i as i8)
    }

    pub fn to_i64(&self) -> Option<i64> {
        match self {
            Self::BigInt(i) | Self::Counter(i) => Some(*i),
            other => other.to_integer().and_then(|i| i.to_i64()),
        }
    }

    /// Any numeric value as a double, possibly losing precision.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Self::Real(f) | Self::Double(f) => Some(*f),
            Self::Float(f) => Some(f64::from(*f)),
            Self::Numeric(d) => d.to_f64(),
            Self::Decimal(d) => d.to_f64(),
            other => other.to_integer().and_then(|i| i.to_f64()),
        }
    }

    pub fn as_list(&self) -> Option<&[HostValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<&BTreeSet<HostValue>> {
        match self {
            Self::Set(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<HostValue, HostValue>> {
        match self {
            Self::Map(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn into_list(self) -> Result<Vec<HostValue>, Self> {
        match self {
            Self::List(items) => Ok(items),
            other => Err(other),
        }
    }

    pub fn into_set(self) -> Result<BTreeSet<HostValue>, Self> {
        match self {
            Self::Set(items) => Ok(items),
            other => Err(other),
        }
    }

    pub fn into_map(self) -> Result<BTreeMap<HostValue, HostValue>, Self> {
        match self {
            Self::Map(entries) => Ok(entries),
            other => Err(other),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            HostValue::Null => 0,
            HostValue::Boolean(_) => 1,
            HostValue::Integer(_) => 2,
            HostValue::Real(_) => 3,
            HostValue::Numeric(_) => 4,
            HostValue::Str(_) => 5,
            HostValue::Bytes(_) => 6,
            HostValue::List(_) => 7,
            HostValue::Set(_) => 8,
            HostValue::Map(_) => 9,
            HostValue::TinyInt(_) => 10,
            HostValue::SmallInt(_) => 11,
            HostValue::Int(_) => 12,
            HostValue::BigInt(_) => 13,
            HostValue::Counter(_) => 14,
            HostValue::VarInt(_) => 15,
            HostValue::Float(_) => 16,
            HostValue::Double(_) => 17,
            HostValue::Decimal(_) => 18,
            HostValue::Uuid(_) => 19,
            HostValue::TimeUuid(_) => 20,
            HostValue::Inet(_) => 21,
            HostValue::Date(_) => 22,
            HostValue::Time(_) => 23,
            HostValue::Timestamp(_) => 24,
        }
    }
}

impl Ord for HostValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (HostValue::Null, HostValue::Null) => Ordering::Equal,
            (HostValue::Boolean(a), HostValue::Boolean(b)) => a.cmp(b),
            (HostValue::Integer(a), HostValue::Integer(b)) | (HostValue::VarInt(a), HostValue::VarInt(b)) => a.cmp(b),
            (HostValue::Real(a), HostValue::Real(b)) | (HostValue::Double(a), HostValue::Double(b)) => a.total_cmp(b),
            (HostValue::Numeric(a), HostValue::Numeric(b)) => a.cmp(b),
            (HostValue::Str(a), HostValue::Str(b)) => a.cmp(b),
            (HostValue::Bytes(a), HostValue::Bytes(b)) => a.cmp(b),
            (HostValue::List(a), HostValue::List(b)) => a.cmp(b),
            (HostValue::Set(a), HostValue::Set(b)) => a.cmp(b),
            (HostValue::Map(a), HostValue::Map(b)) => a.cmp(b),
            (HostValue::TinyInt(a), HostValue::TinyInt(b)) => a.cmp(b),
            (HostValue::SmallInt(a), HostValue::SmallInt(b)) => a.cmp(b),
            (HostValue::Int(a), HostValue::Int(b)) => a.cmp(b),
            (HostValue::BigInt(a), HostValue::BigInt(b)) | (HostValue::Counter(a), HostValue::Counter(b)) => a.cmp(b),
            (HostValue::Float(a), HostValue::Float(b)) => a.total_cmp(b),
            (HostValue::Decimal(a), HostValue::Decimal(b)) => a.cmp(b),
            (HostValue::Uuid(a), HostValue::Uuid(b)) => a.cmp(b),
            (HostValue::TimeUuid(a), HostValue::TimeUuid(b)) => a.cmp(b),
            (HostValue::Inet(a), HostValue::Inet(b)) => a.cmp(b),
            (HostValue::Date(a), HostValue::Date(b)) => a.cmp(b),
            (HostValue::Time(a), HostValue::Time(b)) => a.cmp(b),
            (HostValue::Timestamp(a), HostValue::Timestamp(b)) => a.cmp(b),
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }
}

impl PartialOrd for HostValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for HostValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HostValue {}

impl fmt::Display for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostValue::Null => write!(f, "null"),
            HostValue::Boolean(b) => write!(f, "{}", b),
            HostValue::Integer(i) | HostValue::VarInt(i) => write!(f, "{}", i),
            HostValue::Real(n) | HostValue::Double(n) => write!(f, "{}", n),
            HostValue::Numeric(d) => write!(f, "{}", d),
            HostValue::Str(s) => write!(f, "\"{}\"", s),
            HostValue::Bytes(b) => write!(f, "0x{}", hex::encode(b)),
            HostValue::List(items) => write!(f, "[{}]", items.iter().join(", ")),
            HostValue::Set(items) => write!(f, "{{{}}}", items.iter().join(", ")),
            HostValue::Map(entries) => write!(
                f,
                "{{{}}}",
                entries
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k, v))
                    .join(", ")
            ),
            HostValue::TinyInt(i) => write!(f, "{}", i),
            HostValue::SmallInt(i) => write!(f, "{}", i),
            HostValue::Int(i) => write!(f, "{}", i),
            HostValue::BigInt(i) | HostValue::Counter(i) => write!(f, "{}", i),
            HostValue::Float(n) => write!(f, "{}", n),
            HostValue::Decimal(d) => write!(f, "{}", d),
            HostValue::Uuid(u) => write!(f, "{}", u),
            HostValue::TimeUuid(u) => write!(f, "{}", u),
            HostValue::Inet(ip) => write!(f, "{}", ip),
            HostValue::Date(d) => write!(f, "{}", d),
            HostValue::Time(t) => write!(f, "{}", t),
            HostValue::Timestamp(ts) => write!(f, "{}", ts),
        }
    }
}

/// Values serialize as the closest JSON-ish shape: integers which fit 64
/// bits as numbers, wider integers and decimals as strings, and everything
/// else with no natural number or string form via its display text.
impl Serialize for HostValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            HostValue::Null => serializer.serialize_none(),
            HostValue::Boolean(b) => serializer.serialize_bool(*b),
            HostValue::Integer(i) | HostValue::VarInt(i) => match i.to_i64() {
                Some(i) => serializer.serialize_i64(i),
                None => serializer.serialize_str(&i.to_string()),
            },
            HostValue::TinyInt(i) => serializer.serialize_i8(*i),
            HostValue::SmallInt(i) => serializer.serialize_i16(*i),
            HostValue::Int(i) => serializer.serialize_i32(*i),
            HostValue::BigInt(i) | HostValue::Counter(i) => serializer.serialize_i64(*i),
            HostValue::Real(n) | HostValue::Double(n) => serializer.serialize_f64(*n),
            HostValue::Float(n) => serializer.serialize_f32(*n),
            HostValue::Str(s) => serializer.serialize_str(s),
            HostValue::Bytes(b) => serializer.serialize_bytes(b),
            HostValue::Date(d) => serializer.serialize_str(&d.to_string()),
            HostValue::Time(t) => serializer.serialize_str(&t.to_string()),
            HostValue::Timestamp(ts) => serializer.serialize_str(&ts.to_string()),
            HostValue::Numeric(_)
            | HostValue::Decimal(_)
            | HostValue::Uuid(_)
            | HostValue::TimeUuid(_)
            | HostValue::Inet(_) => serializer.collect_str(self),
            HostValue::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            HostValue::Set(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            HostValue::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

impl From<bool> for HostValue {
    fn from(b: bool) -> Self {
        HostValue::Boolean(b)
    }
}

macro_rules! from_integer {
    ($($t:ty),*) => {
        $(
            impl From<$t> for HostValue {
                fn from(n: $t) -> Self {
                    HostValue::Integer(BigInt::from(n))
                }
            }
        )*
    };
}

from_integer!(i8, i16, i32, i64, i128, u16, u32, u64, usize);

impl From<BigInt> for HostValue {
    fn from(n: BigInt) -> Self {
        HostValue::Integer(n)
    }
}

impl From<f64> for HostValue {
    fn from(n: f64) -> Self {
        HostValue::Real(n)
    }
}

impl From<f32> for HostValue {
    fn from(n: f32) -> Self {
        HostValue::Float(n)
    }
}

impl From<BigDecimal> for HostValue {
    fn from(d: BigDecimal) -> Self {
        HostValue::Numeric(d)
    }
}

impl From<CqlDecimal> for HostValue {
    fn from(d: CqlDecimal) -> Self {
        HostValue::Decimal(d)
    }
}

impl From<&str> for HostValue {
    fn from(s: &str) -> Self {
        HostValue::Str(SmolStr::new(s))
    }
}

impl From<String> for HostValue {
    fn from(s: String) -> Self {
        HostValue::Str(SmolStr::from(s))
    }
}

impl From<SmolStr> for HostValue {
    fn from(s: SmolStr) -> Self {
        HostValue::Str(s)
    }
}

impl From<Vec<u8>> for HostValue {
    fn from(b: Vec<u8>) -> Self {
        HostValue::Bytes(b)
    }
}

impl From<&[u8]> for HostValue {
    fn from(b: &[u8]) -> Self {
        HostValue::Bytes(b.to_vec())
    }
}

impl From<Vec<HostValue>> for HostValue {
    fn from(items: Vec<HostValue>) -> Self {
        HostValue::List(items)
    }
}

impl From<BTreeSet<HostValue>> for HostValue {
    fn from(items: BTreeSet<HostValue>) -> Self {
        HostValue::Set(items)
    }
}

impl From<BTreeMap<HostValue, HostValue>> for HostValue {
    fn from(entries: BTreeMap<HostValue, HostValue>) -> Self {
        HostValue::Map(entries)
    }
}

impl From<Uuid> for HostValue {
    fn from(u: Uuid) -> Self {
        HostValue::Uuid(u)
    }
}

impl From<TimeUuid> for HostValue {
    fn from(u: TimeUuid) -> Self {
        HostValue::TimeUuid(u)
    }
}

impl From<IpAddr> for HostValue {
    fn from(ip: IpAddr) -> Self {
        HostValue::Inet(ip)
    }
}

impl From<CqlDate> for HostValue {
    fn from(d: CqlDate) -> Self {
        HostValue::Date(d)
    }
}

impl From<NaiveDate> for HostValue {
    fn from(d: NaiveDate) -> Self {
        HostValue::Date(d.into())
    }
}

impl From<CqlTime> for HostValue {
    fn from(t: CqlTime) -> Self {
        HostValue::Time(t)
    }
}

impl From<NaiveTime> for HostValue {
    fn from(t: NaiveTime) -> Self {
        HostValue::Time(t.into())
    }
}

impl From<CqlTimestamp> for HostValue {
    fn from(ts: CqlTimestamp) -> Self {
        HostValue::Timestamp(ts)
    }
}

impl From<DateTime<Utc>> for HostValue {
    fn from(dt: DateTime<Utc>) -> Self {
        HostValue::Timestamp(dt.into())
    }
}

impl<T: Into<HostValue>> From<Option<T>> for HostValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(HostValue::Null)
    }
}

impl FromIterator<HostValue> for HostValue {
    fn from_iter<I: IntoIterator<Item = HostValue>>(iter: I) -> Self {
        HostValue::List(iter.into_iter().collect())
    }
}
