use smol_str::SmolStr;
use thiserror::Error;

use crate::native::{DriverCode, DriverError};
use crate::types::{ColumnType, Slot};

/// Failure to bind a host value into a statement slot.
///
/// Every variant which concerns a particular slot carries it so a caller can
/// tell which parameter was wrong without looking at driver internals.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BindError {
    #[error("statement is null, it has already been handed off for execution")]
    NullStatement,
    #[error("invalid value type for {slot}, expected `{expected}` but received `{unexpected}`")]
    InvalidValueType {
        slot: Slot,
        expected: String,
        unexpected: String,
    },
    #[error("unable to parse `{input}` as {column_type} for {slot}: {reason}")]
    ParseFailure {
        slot: Slot,
        column_type: ColumnType,
        input: String,
        reason: String,
    },
    #[error("invalid value for {slot}: {reason}")]
    ValidationFailure { slot: Slot, reason: String },
    #[error("driver rejected {column_type} value for {slot}: {source}")]
    DriverRejected {
        slot: Slot,
        column_type: ColumnType,
        #[source]
        source: DriverError,
    },
    #[error("unknown type hint `{0}`")]
    UnknownTypeHint(SmolStr),
}

impl BindError {
    /// The slot this error concerns, if any.
    pub fn slot(&self) -> Option<&Slot> {
        match self {
            BindError::InvalidValueType { slot, .. }
            | BindError::ParseFailure { slot, .. }
            | BindError::ValidationFailure { slot, .. }
            | BindError::DriverRejected { slot, .. } => Some(slot),
            BindError::NullStatement | BindError::UnknownTypeHint(_) => None,
        }
    }

    /// The native status code, for errors the driver reported.
    pub fn driver_code(&self) -> Option<DriverCode> {
        match self {
            BindError::DriverRejected { source, .. } => Some(source.code),
            _ => None,
        }
    }
}

/// Failure to decode a raw cell into a host value.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("value is null")]
    UnexpectedNull,
    #[error("unexpected end of value, needed {needed} bytes but only {remaining} remain")]
    Truncated { needed: usize, remaining: usize },
    #[error("invalid length {length} for {column_type} value")]
    InvalidLength {
        column_type: ColumnType,
        length: usize,
    },
    #[error("invalid collection element count {0}")]
    InvalidCount(i32),
    #[error("invalid UTF-8 in text value")]
    InvalidUtf8(#[from] std::str::Utf8Error),
    #[error("text value declared as ascii contains non-ascii byte {0:#04x}")]
    NonAscii(u8),
    #[error("uuid {0} is not a version 1 (time based) uuid")]
    NotTimeUuid(uuid::Uuid),
    #[error("time value {0}ns is outside of a single day")]
    InvalidTime(i64),
    #[error("cannot read a {column_type} value as {requested}")]
    TypeMismatch {
        column_type: ColumnType,
        requested: &'static str,
    },
    #[error("{0} is not a collection type")]
    NotACollection(ColumnType),
    #[error("unsupported column type {0}")]
    UnsupportedType(ColumnType),
    #[error("row has no column at index {0}")]
    MissingColumn(usize),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid CQL type `{input}` at position {position}")]
pub struct InvalidTypeName {
    pub input: String,
    pub position: usize,
}
