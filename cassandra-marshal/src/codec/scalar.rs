use std::net::IpAddr;

use bigdecimal::num_bigint::BigInt;
use bigdecimal::ToPrimitive;
use tracing::trace;
use uuid::Uuid;

use super::decimal::{decode_decimal, encode_decimal};
use super::varint::{decode_varint, encode_varint};
use super::Encoder;
use crate::error::{BindError, DecodeError};
use crate::native::{NativeCollection, NativeStatement, NativeValue, RawValue};
use crate::options::BindOptions;
use crate::types::{ColumnType, Slot};
use crate::value::{
    CqlDate, CqlDecimal, CqlTime, CqlTimestamp, HostValue, InvalidTimeUuid, TimeUuid,
};

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Bind a non-collection value into `slot`.
///
/// Collection values, and collection column types, are rejected with
/// [`BindError::InvalidValueType`]; use [`super::bind_value`] or the
/// collection binders for those.
pub fn bind_scalar<S: NativeStatement>(
    statement: &mut S,
    slot: &Slot,
    value: &HostValue,
    column_type: &ColumnType,
    options: &BindOptions,
) -> Result<(), BindError> {
    let encoder = Encoder::new(slot, options);
    let target = encoder.target(value, column_type);
    let native = if value.is_null() {
        NativeValue::Null
    } else {
        encode_scalar(&encoder, value, &target)?
    };
    encoder.bind(statement, native, &target)
}

pub(crate) fn encode_scalar<C: NativeCollection>(
    encoder: &Encoder<'_>,
    value: &HostValue,
    target: &ColumnType,
) -> Result<NativeValue<C>, BindError> {
    let native = match target {
        ColumnType::Ascii => {
            let s = text(encoder, value, target)?;
            if let Some(b) = s.bytes().find(|b| !b.is_ascii()) {
                return Err(encoder.invalid(
                    target,
                    format!("string containing non-ascii byte {:#04x}", b),
                ));
            }
            NativeValue::String(s.to_string())
        }
        ColumnType::Text => NativeValue::String(text(encoder, value, target)?.to_string()),
        ColumnType::Boolean => match value {
            HostValue::Boolean(b) => NativeValue::Bool(*b),
            _ => return Err(encoder.mismatch(target, value)),
        },
        ColumnType::TinyInt => NativeValue::Int8(integer(encoder, value, target, BigInt::to_i8)?),
        ColumnType::SmallInt => {
            NativeValue::Int16(integer(encoder, value, target, BigInt::to_i16)?)
        }
        ColumnType::Int => NativeValue::Int32(integer(encoder, value, target, BigInt::to_i32)?),
        ColumnType::BigInt | ColumnType::Counter => {
            NativeValue::Int64(integer(encoder, value, target, BigInt::to_i64)?)
        }
        ColumnType::VarInt => NativeValue::Bytes(encode_varint(&varint(encoder, value, target)?)),
        ColumnType::Float => match value.to_f64() {
            Some(f) => NativeValue::Float(f as f32),
            None => return Err(encoder.mismatch(target, value)),
        },
        ColumnType::Double => match value.to_f64() {
            Some(f) => NativeValue::Double(f),
            None => return Err(encoder.mismatch(target, value)),
        },
        ColumnType::Decimal => {
            let (varint, scale) = encode_decimal(&decimal(encoder, value, target)?);
            NativeValue::Decimal { varint, scale }
        }
        ColumnType::Uuid => NativeValue::Uuid(uuid(encoder, value, target)?),
        ColumnType::TimeUuid => NativeValue::Uuid(timeuuid(encoder, value, target)?.into_uuid()),
        ColumnType::Blob => match value {
            HostValue::Bytes(b) => NativeValue::Bytes(b.clone()),
            HostValue::Str(s) => NativeValue::Bytes(s.as_bytes().to_vec()),
            _ => return Err(encoder.mismatch(target, value)),
        },
        ColumnType::Inet => match value {
            HostValue::Inet(ip) => NativeValue::Inet(*ip),
            HostValue::Str(s) => NativeValue::Inet(
                s.parse::<IpAddr>()
                    .map_err(|e| encoder.parse_failure(target, s, e))?,
            ),
            _ => return Err(encoder.mismatch(target, value)),
        },
        ColumnType::Date => NativeValue::Uint32(date(encoder, value, target)?.raw()),
        ColumnType::Time => NativeValue::Int64(time(encoder, value, target)?.nanos()),
        ColumnType::Timestamp => NativeValue::Int64(timestamp(encoder, value, target)?.millis()),
        ColumnType::List(_) | ColumnType::Set(_) | ColumnType::Map(_, _) | ColumnType::Unknown => {
            return Err(encoder.mismatch(target, value))
        }
    };
    Ok(native)
}

fn text<'v>(
    encoder: &Encoder<'_>,
    value: &'v HostValue,
    target: &ColumnType,
) -> Result<&'v str, BindError> {
    value.to_str().ok_or_else(|| encoder.mismatch(target, value))
}

fn integer<T>(
    encoder: &Encoder<'_>,
    value: &HostValue,
    target: &ColumnType,
    narrow: impl FnOnce(&BigInt) -> Option<T>,
) -> Result<T, BindError> {
    let i = value
        .to_integer()
        .ok_or_else(|| encoder.mismatch(target, value))?;
    narrow(&i).ok_or_else(|| encoder.invalid(target, format!("integer {} out of range", i)))
}

fn varint(
    encoder: &Encoder<'_>,
    value: &HostValue,
    target: &ColumnType,
) -> Result<BigInt, BindError> {
    match value {
        HostValue::Str(s) => s
            .trim()
            .parse()
            .map_err(|e| encoder.parse_failure(target, s, e)),
        other => other
            .to_integer()
            .ok_or_else(|| encoder.mismatch(target, value)),
    }
}

fn decimal(
    encoder: &Encoder<'_>,
    value: &HostValue,
    target: &ColumnType,
) -> Result<CqlDecimal, BindError> {
    match value {
        HostValue::Decimal(d) => Ok(d.clone()),
        HostValue::Numeric(n) => CqlDecimal::from_big_decimal(n).map_err(|e| encoder.validation(e)),
        HostValue::Real(f) | HostValue::Double(f) => {
            CqlDecimal::from_f64(*f).map_err(|e| encoder.validation(e))
        }
        HostValue::Float(f) if f.is_finite() => f
            .to_string()
            .parse()
            .map_err(|e| encoder.validation(e)),
        HostValue::Float(f) => Err(encoder.validation(format!("{} has no decimal representation", f))),
        HostValue::Str(s) => s.parse().map_err(|e| encoder.parse_failure(target, s, e)),
        other => other
            .to_integer()
            .map(|i| CqlDecimal::new(i, 0))
            .ok_or_else(|| encoder.mismatch(target, value)),
    }
}

/// The canonical 36 character hyphenated form, any case.
fn parse_uuid(encoder: &Encoder<'_>, target: &ColumnType, s: &str) -> Result<Uuid, BindError> {
    if s.len() != 36 {
        return Err(encoder.parse_failure(target, s, "expected 36 characters"));
    }
    Uuid::parse_str(s).map_err(|e| encoder.parse_failure(target, s, e))
}

fn uuid(encoder: &Encoder<'_>, value: &HostValue, target: &ColumnType) -> Result<Uuid, BindError> {
    match value {
        HostValue::Uuid(u) => Ok(*u),
        HostValue::TimeUuid(t) => Ok(t.into_uuid()),
        HostValue::Str(s) => parse_uuid(encoder, target, s),
        _ => Err(encoder.mismatch(target, value)),
    }
}

fn timeuuid(
    encoder: &Encoder<'_>,
    value: &HostValue,
    target: &ColumnType,
) -> Result<TimeUuid, BindError> {
    let uuid = match value {
        HostValue::TimeUuid(t) => return Ok(*t),
        HostValue::Uuid(u) => *u,
        HostValue::Str(s) => parse_uuid(encoder, target, s)?,
        _ => return Err(encoder.mismatch(target, value)),
    };
    TimeUuid::try_from(uuid).map_err(|e| match e {
        InvalidTimeUuid::Version { .. } => encoder.validation(e),
        other => encoder.invalid(target, other),
    })
}

fn date(encoder: &Encoder<'_>, value: &HostValue, target: &ColumnType) -> Result<CqlDate, BindError> {
    match value {
        HostValue::Date(d) => Ok(*d),
        HostValue::Timestamp(t) => CqlDate::from_days_since_epoch(t.millis().div_euclid(MILLIS_PER_DAY))
            .map_err(|e| encoder.validation(e)),
        HostValue::Str(s) => s.parse().map_err(|e| encoder.parse_failure(target, s, e)),
        other => {
            let days = integer(encoder, other, target, BigInt::to_i64)?;
            CqlDate::from_days_since_epoch(days).map_err(|e| encoder.validation(e))
        }
    }
}

fn time(encoder: &Encoder<'_>, value: &HostValue, target: &ColumnType) -> Result<CqlTime, BindError> {
    match value {
        HostValue::Time(t) => Ok(*t),
        HostValue::Str(s) => s.parse().map_err(|e| encoder.parse_failure(target, s, e)),
        other => {
            let nanos = integer(encoder, other, target, BigInt::to_i64)?;
            CqlTime::from_nanos(nanos).map_err(|e| encoder.validation(e))
        }
    }
}

fn timestamp(
    encoder: &Encoder<'_>,
    value: &HostValue,
    target: &ColumnType,
) -> Result<CqlTimestamp, BindError> {
    match value {
        HostValue::Timestamp(t) => Ok(*t),
        HostValue::Date(d) => Ok(CqlTimestamp::from(*d)),
        HostValue::Str(s) => s.parse().map_err(|e| encoder.parse_failure(target, s, e)),
        other => integer(encoder, other, target, BigInt::to_i64).map(CqlTimestamp::from_millis),
    }
}

/// Decode a non-collection cell.
///
/// Every integer type reads back as a generic [`HostValue::Integer`], `float`
/// cells keep their single precision as [`HostValue::Float`] and `double`
/// cells become [`HostValue::Real`].
pub fn read_scalar(raw: RawValue<'_>) -> Result<HostValue, DecodeError> {
    if raw.is_null() {
        return Ok(HostValue::Null);
    }
    let column_type = raw.column_type();
    trace!(%column_type, "decoding value");
    let value = match column_type {
        ColumnType::Ascii | ColumnType::Text => HostValue::from(raw.get_string()?),
        ColumnType::Boolean => HostValue::Boolean(raw.get_bool()?),
        ColumnType::TinyInt => HostValue::from(raw.get_int8()?),
        ColumnType::SmallInt => HostValue::from(raw.get_int16()?),
        ColumnType::Int => HostValue::from(raw.get_int32()?),
        ColumnType::BigInt | ColumnType::Counter => HostValue::from(raw.get_int64()?),
        ColumnType::VarInt => HostValue::Integer(decode_varint(raw.get_bytes()?)),
        ColumnType::Float => HostValue::Float(raw.get_float()?),
        ColumnType::Double => HostValue::Real(raw.get_double()?),
        ColumnType::Decimal => {
            let (varint, scale) = raw.get_decimal()?;
            HostValue::Decimal(decode_decimal(varint, scale))
        }
        ColumnType::Uuid => HostValue::Uuid(raw.get_uuid()?),
        ColumnType::TimeUuid => {
            let uuid = raw.get_uuid()?;
            let timeuuid = TimeUuid::try_from(uuid).map_err(|_| DecodeError::NotTimeUuid(uuid))?;
            HostValue::TimeUuid(timeuuid)
        }
        ColumnType::Blob => HostValue::Bytes(raw.get_bytes()?.to_vec()),
        ColumnType::Inet => HostValue::Inet(raw.get_inet()?),
        ColumnType::Date => HostValue::Date(CqlDate::from_raw(raw.get_uint32()?)),
        ColumnType::Time => {
            let nanos = raw.get_int64()?;
            HostValue::Time(CqlTime::from_nanos(nanos).map_err(|_| DecodeError::InvalidTime(nanos))?)
        }
        ColumnType::Timestamp => HostValue::Timestamp(CqlTimestamp::from_millis(raw.get_int64()?)),
        ColumnType::List(_) | ColumnType::Set(_) | ColumnType::Map(_, _) => {
            return Err(DecodeError::TypeMismatch {
                column_type: column_type.clone(),
                requested: "scalar",
            })
        }
        ColumnType::Unknown => return Err(DecodeError::UnsupportedType(ColumnType::Unknown)),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::{ColumnSpec, NativeResult, Prepared, WireCollection};
    use pretty_assertions::assert_eq;

    fn encode(value: HostValue, target: ColumnType) -> Result<NativeValue<WireCollection>, BindError> {
        let slot = Slot::Index(0);
        let options = BindOptions::default();
        encode_scalar(&Encoder::new(&slot, &options), &value, &target)
    }

    fn round_trip(value: HostValue, target: ColumnType) -> HostValue {
        let prepared = Prepared::new("SELECT ?", vec![ColumnSpec::new("v", target.clone())]);
        let mut statement = prepared.bind();
        bind_scalar(
            &mut statement,
            &Slot::Index(0),
            &value,
            &target,
            &BindOptions::default(),
        )
        .unwrap();
        let result = statement.submit().unwrap().into_result();
        let rows = result.rows().collect::<Vec<_>>();
        read_scalar(rows[0].get(0).unwrap()).unwrap()
    }

    #[test]
    fn ascii_rejects_non_ascii() {
        assert!(matches!(
            encode("héllo".into(), ColumnType::Ascii),
            Err(BindError::InvalidValueType { .. })
        ));
        assert_eq!(
            encode("hello".into(), ColumnType::Ascii),
            Ok(NativeValue::String("hello".into()))
        );
    }

    #[test]
    fn integers_are_range_checked() {
        assert_eq!(encode(127.into(), ColumnType::TinyInt), Ok(NativeValue::Int8(127)));
        let err = encode(128.into(), ColumnType::TinyInt).unwrap_err();
        assert_eq!(
            err,
            BindError::InvalidValueType {
                slot: Slot::Index(0),
                expected: "tinyint".into(),
                unexpected: "integer 128 out of range".into(),
            }
        );
        assert_eq!(encode(HostValue::Int(5), ColumnType::Counter), Ok(NativeValue::Int64(5)));
    }

    #[test]
    fn type_mismatches_name_both_sides() {
        let err = encode(true.into(), ColumnType::Int).unwrap_err();
        assert_eq!(
            err,
            BindError::InvalidValueType {
                slot: Slot::Index(0),
                expected: "int".into(),
                unexpected: "boolean".into(),
            }
        );
    }

    #[test]
    fn strings_parse_into_typed_values() {
        assert_eq!(
            round_trip("127.0.0.1".into(), ColumnType::Inet),
            HostValue::Inet("127.0.0.1".parse().unwrap())
        );
        assert_eq!(
            round_trip("-12345678901234567890".into(), ColumnType::VarInt),
            HostValue::Integer("-12345678901234567890".parse().unwrap())
        );
        assert_eq!(
            round_trip("2.50".into(), ColumnType::Decimal),
            HostValue::Decimal(CqlDecimal::new(250, 2))
        );
        assert!(matches!(
            encode("not an address".into(), ColumnType::Inet),
            Err(BindError::ParseFailure { .. })
        ));
    }

    #[test]
    fn uuid_strings_must_be_canonical() {
        let canonical = "550e8400-e29b-41d4-a716-446655440000";
        assert_eq!(
            round_trip(canonical.into(), ColumnType::Uuid),
            HostValue::Uuid(canonical.parse().unwrap())
        );
        assert!(matches!(
            encode("550e8400e29b41d4a716446655440000".into(), ColumnType::Uuid),
            Err(BindError::ParseFailure { .. })
        ));
    }

    #[test]
    fn timeuuid_validates_the_version() {
        let v4 = "550e8400-e29b-41d4-a716-446655440000";
        assert!(matches!(
            encode(v4.into(), ColumnType::TimeUuid),
            Err(BindError::ValidationFailure { .. })
        ));
        let v1 = "13814000-1dd2-11b2-8000-000000000000";
        let read = round_trip(v1.into(), ColumnType::TimeUuid);
        let HostValue::TimeUuid(t) = read else {
            panic!("expected a timeuuid, got {:?}", read);
        };
        assert_eq!(t.timestamp(), CqlTimestamp::from_millis(0));
    }

    #[test]
    fn decode_rejects_non_v1_timeuuid_cells() {
        let ty = ColumnType::TimeUuid;
        let v4: Uuid = "550e8400-e29b-41d4-a716-446655440000".parse().unwrap();
        let raw = RawValue::new(&ty, Some(v4.as_bytes()));
        assert_eq!(read_scalar(raw), Err(DecodeError::NotTimeUuid(v4)));
    }

    #[test]
    fn temporal_values() {
        assert_eq!(
            round_trip("2024-02-29".into(), ColumnType::Date),
            HostValue::Date("2024-02-29".parse().unwrap())
        );
        assert_eq!(
            round_trip(HostValue::from(-1), ColumnType::Date),
            HostValue::Date(CqlDate::from_days_since_epoch(-1).unwrap())
        );
        assert_eq!(
            round_trip("13:30:00.5".into(), ColumnType::Time),
            HostValue::Time(CqlTime::from_nanos(48_600_500_000_000).unwrap())
        );
        assert!(matches!(
            encode(HostValue::from(86_400_000_000_000_i64), ColumnType::Time),
            Err(BindError::ValidationFailure { .. })
        ));
        assert_eq!(
            round_trip("2021-03-04T05:06:07.123Z".into(), ColumnType::Timestamp),
            HostValue::Timestamp(CqlTimestamp::from_millis(1_614_834_367_123))
        );
        assert_eq!(
            round_trip(
                HostValue::Timestamp(CqlTimestamp::from_millis(-1)),
                ColumnType::Date
            ),
            HostValue::Date(CqlDate::from_days_since_epoch(-1).unwrap())
        );
    }

    #[test]
    fn floats_keep_their_width() {
        assert_eq!(round_trip(HostValue::Float(0.1), ColumnType::Float), HostValue::Float(0.1));
        assert_eq!(round_trip(0.1.into(), ColumnType::Double), HostValue::Real(0.1));
        assert_eq!(
            round_trip(HostValue::Float(0.1), ColumnType::Decimal),
            HostValue::Decimal(CqlDecimal::new(1, 1))
        );
    }

    #[test]
    fn integers_read_back_generic() {
        assert_eq!(round_trip(HostValue::TinyInt(-5), ColumnType::Unknown), HostValue::from(-5));
        assert_eq!(
            round_trip(HostValue::from(1_i128 << 70), ColumnType::VarInt),
            HostValue::from(1_i128 << 70)
        );
    }

    #[test]
    fn collections_are_not_scalars() {
        assert!(matches!(
            encode(HostValue::list([1.into()]), ColumnType::Unknown),
            Err(BindError::InvalidValueType { .. })
        ));
        let ty = ColumnType::list(ColumnType::Int);
        let raw = RawValue::new(&ty, Some(&[0, 0, 0, 0]));
        assert!(matches!(read_scalar(raw), Err(DecodeError::TypeMismatch { .. })));
    }
}
