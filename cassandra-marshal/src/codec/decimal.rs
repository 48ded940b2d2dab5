use super::varint::{decode_varint, encode_varint};
use crate::error::DecodeError;
use crate::native::CellDecoder;
use crate::value::CqlDecimal;

/// Split a decimal into the varint encoded unscaled value and the scale.
pub fn encode_decimal(value: &CqlDecimal) -> (Vec<u8>, i32) {
    (encode_varint(value.unscaled()), value.scale())
}

pub fn decode_decimal(varint: &[u8], scale: i32) -> CqlDecimal {
    CqlDecimal::new(decode_varint(varint), scale)
}

/// The `decimal` cell layout: `[int32 scale][varint unscaled]`.
pub fn encode_decimal_cell(value: &CqlDecimal) -> Vec<u8> {
    let (varint, scale) = encode_decimal(value);
    let mut out = Vec::with_capacity(4 + varint.len());
    out.extend_from_slice(&scale.to_be_bytes());
    out.extend(varint);
    out
}

pub fn decode_decimal_cell(cell: &[u8]) -> Result<CqlDecimal, DecodeError> {
    let mut decoder = CellDecoder::new(cell);
    let scale = decoder.read_int()?;
    Ok(decode_decimal(&cell[4..], scale))
}
