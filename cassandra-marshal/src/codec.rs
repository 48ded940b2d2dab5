//! Conversions between [`HostValue`]s and the driver's representation.
//!
//! Binding is type directed: a value is encoded for a target [`ColumnType`],
//! either the hint the caller supplied or, failing that, the type the value
//! infers for itself (see [`HostValue::inferred_type`]). Reading goes the
//! other way and is directed by the declared type of the cell.

use std::fmt::Display;

use tracing::trace;

use crate::error::{BindError, DecodeError};
use crate::native::{DriverError, NativeCollection, NativeStatement, NativeValue, RawValue};
use crate::options::BindOptions;
use crate::types::{ColumnType, Slot};
use crate::value::HostValue;

mod collection;
mod decimal;
mod scalar;
mod varint;

pub use collection::{bind_list, bind_map, bind_set, read_list, read_map, read_set};
pub use decimal::{decode_decimal, decode_decimal_cell, encode_decimal, encode_decimal_cell};
pub use scalar::{bind_scalar, read_scalar};
pub use varint::{decode_varint, encode_varint, varint_len};

/// Encodes host values bound into one slot, and builds the errors which
/// describe failures to do so.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Encoder<'a> {
    slot: &'a Slot,
    options: &'a BindOptions,
}

impl<'a> Encoder<'a> {
    pub(crate) fn new(slot: &'a Slot, options: &'a BindOptions) -> Self {
        Encoder { slot, options }
    }

    /// The type `value` binds as given `hint`. An `Unknown` hint means none.
    pub(crate) fn target(&self, value: &HostValue, hint: &ColumnType) -> ColumnType {
        if hint.is_unknown() {
            value.inferred_type(self.options.integer_policy)
        } else {
            hint.clone()
        }
    }

    pub(crate) fn encode<C: NativeCollection>(
        &self,
        value: &HostValue,
        hint: &ColumnType,
    ) -> Result<NativeValue<C>, BindError> {
        if value.is_null() {
            return Ok(NativeValue::Null);
        }
        let target = self.target(value, hint);
        trace!(slot = %self.slot, value = value.type_name(), column_type = %target, "encoding value");
        if target.is_collection() {
            collection::encode_collection(self, value, &target)
        } else {
            scalar::encode_scalar(self, value, &target)
        }
    }

    pub(crate) fn bind<S: NativeStatement>(
        &self,
        statement: &mut S,
        value: NativeValue<S::Collection>,
        column_type: &ColumnType,
    ) -> Result<(), BindError> {
        statement
            .bind(self.slot, value)
            .map_err(|e| self.rejected(column_type, e))
    }

    pub(crate) fn mismatch(&self, expected: &ColumnType, value: &HostValue) -> BindError {
        BindError::InvalidValueType {
            slot: self.slot.clone(),
            expected: expected.to_string(),
            unexpected: value.type_name().to_string(),
        }
    }

    pub(crate) fn invalid<D: Display>(&self, expected: &ColumnType, unexpected: D) -> BindError {
        BindError::InvalidValueType {
            slot: self.slot.clone(),
            expected: expected.to_string(),
            unexpected: unexpected.to_string(),
        }
    }

    pub(crate) fn parse_failure<D: Display>(
        &self,
        column_type: &ColumnType,
        input: &str,
        reason: D,
    ) -> BindError {
        BindError::ParseFailure {
            slot: self.slot.clone(),
            column_type: column_type.clone(),
            input: input.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn validation<D: Display>(&self, reason: D) -> BindError {
        BindError::ValidationFailure {
            slot: self.slot.clone(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn rejected(&self, column_type: &ColumnType, source: DriverError) -> BindError {
        BindError::DriverRejected {
            slot: self.slot.clone(),
            column_type: column_type.clone(),
            source,
        }
    }
}

/// Bind `value` into `slot` of `statement`.
///
/// `column_type` is the type to bind as, `ColumnType::Unknown` lets the
/// value choose. Nulls bind as the wire null whatever the type.
pub fn bind_value<S: NativeStatement>(
    statement: &mut S,
    slot: &Slot,
    value: &HostValue,
    column_type: &ColumnType,
    options: &BindOptions,
) -> Result<(), BindError> {
    let encoder = Encoder::new(slot, options);
    let target = encoder.target(value, column_type);
    let native = encoder.encode(value, &target)?;
    encoder.bind(statement, native, &target)
}

/// Decode a cell into a host value according to its declared type.
pub fn read_value(raw: RawValue<'_>) -> Result<HostValue, DecodeError> {
    if raw.is_null() {
        return Ok(HostValue::Null);
    }
    match raw.column_type() {
        ColumnType::List(_) => read_list(raw).map(HostValue::List),
        ColumnType::Set(_) => read_set(raw).map(HostValue::Set),
        ColumnType::Map(_, _) => read_map(raw).map(HostValue::Map),
        _ => read_scalar(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::{BoundParameter, ColumnSpec, DriverCode, Prepared, WireStatement};
    use pretty_assertions::assert_eq;

    fn bind_one(value: HostValue, hint: ColumnType) -> Result<BoundParameter, BindError> {
        let mut statement = WireStatement::new("SELECT ?", 1);
        bind_value(&mut statement, &Slot::Index(0), &value, &hint, &BindOptions::default())?;
        let submission = statement.submit().unwrap();
        Ok(submission.parameters()[0].clone())
    }

    #[test]
    fn unhinted_values_infer_their_type() {
        let bound = bind_one(HostValue::from("x"), ColumnType::Unknown).unwrap();
        assert_eq!(bound.column_type, ColumnType::Text);
        assert_eq!(bound.bytes, Some(b"x".to_vec()));

        let bound = bind_one(HostValue::from(42), ColumnType::Unknown).unwrap();
        assert_eq!(bound.column_type, ColumnType::BigInt);
        assert_eq!(bound.bytes, Some(42_i64.to_be_bytes().to_vec()));
    }

    #[test]
    fn hints_override_inference() {
        let bound = bind_one(HostValue::from(42), ColumnType::Int).unwrap();
        assert_eq!(bound.column_type, ColumnType::Int);
        assert_eq!(bound.bytes, Some(vec![0, 0, 0, 42]));
    }

    #[test]
    fn nulls_bind_whatever_the_type() {
        let bound = bind_one(HostValue::Null, ColumnType::list(ColumnType::Int)).unwrap();
        assert_eq!(bound.bytes, None);
    }

    #[test]
    fn driver_errors_carry_slot_and_type() {
        let prepared = Prepared::new("SELECT ?", vec![ColumnSpec::new("a", ColumnType::Int)]);
        let mut statement = prepared.bind();
        let err = bind_value(
            &mut statement,
            &Slot::from("a"),
            &HostValue::from("x"),
            &ColumnType::Unknown,
            &BindOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err.driver_code(), Some(DriverCode::InvalidValueType));
        assert_eq!(err.slot(), Some(&Slot::from("a")));
        assert!(matches!(
            err,
            BindError::DriverRejected {
                column_type: ColumnType::Text,
                ..
            }
        ));
    }

    #[test]
    fn null_cells_read_as_null() {
        let ty = ColumnType::map(ColumnType::Text, ColumnType::Int);
        assert_eq!(read_value(RawValue::new(&ty, None)), Ok(HostValue::Null));
    }
}
