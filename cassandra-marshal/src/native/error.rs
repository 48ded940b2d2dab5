use std::fmt;

use thiserror::Error;

/// Library error codes a driver reports for bind and value access calls.
///
/// The numbering follows the C driver's `CASS_ERROR_LIB_*` codes so a status
/// received from a real driver handle can be carried through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriverCode {
    BadParams,
    IndexOutOfBounds,
    InvalidItemCount,
    InvalidValueType,
    NameDoesNotExist,
    NullValue,
    ParameterUnset,
    InvalidData,
    NotEnoughData,
    InvalidState,
}

const CASS_ERROR_SOURCE_LIB: u32 = 1;

impl DriverCode {
    pub fn as_u32(&self) -> u32 {
        let code = match self {
            DriverCode::BadParams => 1,
            DriverCode::IndexOutOfBounds => 11,
            DriverCode::InvalidItemCount => 12,
            DriverCode::InvalidValueType => 13,
            DriverCode::NameDoesNotExist => 18,
            DriverCode::NullValue => 20,
            DriverCode::ParameterUnset => 25,
            DriverCode::InvalidData => 30,
            DriverCode::NotEnoughData => 31,
            DriverCode::InvalidState => 32,
        };
        (CASS_ERROR_SOURCE_LIB << 24) | code
    }

    pub fn from_u32(code: u32) -> Option<Self> {
        if code >> 24 != CASS_ERROR_SOURCE_LIB {
            return None;
        }
        let code = match code & 0x00FF_FFFF {
            1 => DriverCode::BadParams,
            11 => DriverCode::IndexOutOfBounds,
            12 => DriverCode::InvalidItemCount,
            13 => DriverCode::InvalidValueType,
            18 => DriverCode::NameDoesNotExist,
            20 => DriverCode::NullValue,
            25 => DriverCode::ParameterUnset,
            30 => DriverCode::InvalidData,
            31 => DriverCode::NotEnoughData,
            32 => DriverCode::InvalidState,
            _ => return None,
        };
        Some(code)
    }

    /// The driver's short description of the code.
    pub fn description(&self) -> &'static str {
        match self {
            DriverCode::BadParams => "Bad parameters",
            DriverCode::IndexOutOfBounds => "Index out of bounds",
            DriverCode::InvalidItemCount => "Invalid item count",
            DriverCode::InvalidValueType => "Invalid value type",
            DriverCode::NameDoesNotExist => "Name does not exist",
            DriverCode::NullValue => "NULL value specified",
            DriverCode::ParameterUnset => "Parameter unset",
            DriverCode::InvalidData => "Invalid data",
            DriverCode::NotEnoughData => "Not enough data",
            DriverCode::InvalidState => "Invalid state",
        }
    }
}

impl fmt::Display for DriverCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// A failed driver call: the status code and whatever message came with it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct DriverError {
    pub code: DriverCode,
    pub message: String,
}

impl DriverError {
    pub fn new<S: Into<String>>(code: DriverCode, message: S) -> Self {
        DriverError {
            code,
            message: message.into(),
        }
    }
}
