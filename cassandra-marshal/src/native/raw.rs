use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use uuid::Uuid;

use super::statement::ColumnSpec;
use super::NativeKind;
use crate::error::DecodeError;
use crate::types::ColumnType;

/// Reads the length prefixed cells of the CQL value layout.
#[derive(Clone, Debug)]
pub(crate) struct CellDecoder<'a> {
    offset: usize,
    data: &'a [u8],
}

impl<'a> CellDecoder<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        CellDecoder { offset: 0, data }
    }

    pub(crate) fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        let remaining = self.data.len() - self.offset;
        if len > remaining {
            return Err(DecodeError::Truncated {
                needed: len,
                remaining,
            });
        }
        let head = &self.data[self.offset..self.offset + len];
        self.offset += len;
        Ok(head)
    }

    pub(crate) fn read_int(&mut self) -> Result<i32, DecodeError> {
        let bytes = self.read_bytes(4)?;
        Ok(i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// A `[int32 length][bytes]` cell, `None` for a negative length.
    pub(crate) fn read_cell(&mut self) -> Result<Option<&'a [u8]>, DecodeError> {
        match self.read_int()? {
            len if len < 0 => Ok(None),
            len => self.read_bytes(len as usize).map(Some),
        }
    }
}

/// Append a `[int32 length][bytes]` cell, null cells have length `-1`.
pub(crate) fn write_cell(out: &mut Vec<u8>, cell: Option<&[u8]>) {
    match cell {
        Some(bytes) => {
            out.extend_from_slice(&(bytes.len() as i32).to_be_bytes());
            out.extend_from_slice(bytes);
        }
        None => out.extend_from_slice(&(-1_i32).to_be_bytes()),
    }
}

/// A typed view over one encoded cell of a row or collection.
///
/// The `get_*` accessors mirror the driver's value getters: each checks the
/// cell's declared type accepts the requested representation and that the
/// cell has the right length for it.
#[derive(Debug, Clone, Copy)]
pub struct RawValue<'a> {
    column_type: &'a ColumnType,
    bytes: Option<&'a [u8]>,
}

impl<'a> RawValue<'a> {
    pub fn new(column_type: &'a ColumnType, bytes: Option<&'a [u8]>) -> Self {
        RawValue { column_type, bytes }
    }

    pub fn column_type(&self) -> &'a ColumnType {
        self.column_type
    }

    pub fn is_null(&self) -> bool {
        self.bytes.is_none()
    }

    pub fn raw_bytes(&self) -> Option<&'a [u8]> {
        self.bytes
    }

    fn expect(&self, kind: NativeKind, requested: &'static str) -> Result<&'a [u8], DecodeError> {
        if !self.column_type.accepts(kind) {
            return Err(DecodeError::TypeMismatch {
                column_type: self.column_type.clone(),
                requested,
            });
        }
        self.bytes.ok_or(DecodeError::UnexpectedNull)
    }

    fn fixed<const N: usize>(
        &self,
        kind: NativeKind,
        requested: &'static str,
    ) -> Result<[u8; N], DecodeError> {
        let bytes = self.expect(kind, requested)?;
        bytes.try_into().map_err(|_| DecodeError::InvalidLength {
            column_type: self.column_type.clone(),
            length: bytes.len(),
        })
    }

    pub fn get_int8(&self) -> Result<i8, DecodeError> {
        self.fixed(NativeKind::Int8, "int8").map(i8::from_be_bytes)
    }

    pub fn get_int16(&self) -> Result<i16, DecodeError> {
        self.fixed(NativeKind::Int16, "int16").map(i16::from_be_bytes)
    }

    pub fn get_int32(&self) -> Result<i32, DecodeError> {
        self.fixed(NativeKind::Int32, "int32").map(i32::from_be_bytes)
    }

    pub fn get_uint32(&self) -> Result<u32, DecodeError> {
        self.fixed(NativeKind::Uint32, "uint32").map(u32::from_be_bytes)
    }

    pub fn get_int64(&self) -> Result<i64, DecodeError> {
        self.fixed(NativeKind::Int64, "int64").map(i64::from_be_bytes)
    }

    pub fn get_float(&self) -> Result<f32, DecodeError> {
        self.fixed(NativeKind::Float, "float").map(f32::from_be_bytes)
    }

    pub fn get_double(&self) -> Result<f64, DecodeError> {
        self.fixed(NativeKind::Double, "double").map(f64::from_be_bytes)
    }

    pub fn get_bool(&self) -> Result<bool, DecodeError> {
        self.fixed::<1>(NativeKind::Bool, "bool").map(|[b]| b != 0)
    }

    /// The cell as UTF-8 text. An `ascii` cell must also be pure ASCII.
    pub fn get_string(&self) -> Result<&'a str, DecodeError> {
        let bytes = self.expect(NativeKind::String, "string")?;
        if *self.column_type == ColumnType::Ascii {
            if let Some(b) = bytes.iter().find(|b| !b.is_ascii()) {
                return Err(DecodeError::NonAscii(*b));
            }
        }
        Ok(std::str::from_utf8(bytes)?)
    }

    pub fn get_bytes(&self) -> Result<&'a [u8], DecodeError> {
        self.expect(NativeKind::Bytes, "bytes")
    }

    pub fn get_uuid(&self) -> Result<Uuid, DecodeError> {
        self.fixed(NativeKind::Uuid, "uuid").map(Uuid::from_bytes)
    }

    pub fn get_inet(&self) -> Result<IpAddr, DecodeError> {
        let bytes = self.expect(NativeKind::Inet, "inet")?;
        if let Ok(v4) = <[u8; 4]>::try_from(bytes) {
            Ok(IpAddr::V4(Ipv4Addr::from(v4)))
        } else if let Ok(v6) = <[u8; 16]>::try_from(bytes) {
            Ok(IpAddr::V6(Ipv6Addr::from(v6)))
        } else {
            Err(DecodeError::InvalidLength {
                column_type: self.column_type.clone(),
                length: bytes.len(),
            })
        }
    }

    /// The varint encoded unscaled value and the scale of a decimal cell.
    pub fn get_decimal(&self) -> Result<(&'a [u8], i32), DecodeError> {
        let bytes = self.expect(NativeKind::Decimal, "decimal")?;
        let mut decoder = CellDecoder::new(bytes);
        let scale = decoder.read_int()?;
        Ok((&bytes[4..], scale))
    }

    /// Iterate the elements of a list or set cell.
    pub fn iter_collection(&self) -> Result<CollectionIter<'a>, DecodeError> {
        let element_type = match self.column_type {
            ColumnType::List(e) | ColumnType::Set(e) => e.as_ref(),
            other => return Err(DecodeError::NotACollection(other.clone())),
        };
        let (decoder, remaining) = self.open_collection()?;
        Ok(CollectionIter {
            element_type,
            decoder,
            remaining,
        })
    }

    /// Iterate the entries of a map cell.
    pub fn iter_map(&self) -> Result<MapIter<'a>, DecodeError> {
        let (key_type, value_type) = match self.column_type {
            ColumnType::Map(k, v) => (k.as_ref(), v.as_ref()),
            other => return Err(DecodeError::NotACollection(other.clone())),
        };
        let (decoder, remaining) = self.open_collection()?;
        Ok(MapIter {
            key_type,
            value_type,
            decoder,
            remaining,
        })
    }

    fn open_collection(&self) -> Result<(CellDecoder<'a>, usize), DecodeError> {
        let bytes = self.bytes.ok_or(DecodeError::UnexpectedNull)?;
        let mut decoder = CellDecoder::new(bytes);
        let count = decoder.read_int()?;
        let remaining = usize::try_from(count).map_err(|_| DecodeError::InvalidCount(count))?;
        Ok((decoder, remaining))
    }
}

/// The elements of a list or set cell, in wire order. Iteration stops after
/// the first error.
#[derive(Debug, Clone)]
pub struct CollectionIter<'a> {
    element_type: &'a ColumnType,
    decoder: CellDecoder<'a>,
    remaining: usize,
}

impl<'a> Iterator for CollectionIter<'a> {
    type Item = Result<RawValue<'a>, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        match self.decoder.read_cell() {
            Ok(cell) => {
                self.remaining -= 1;
                Some(Ok(RawValue::new(self.element_type, cell)))
            }
            Err(e) => {
                self.remaining = 0;
                Some(Err(e))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

/// The key/value entries of a map cell. Iteration stops after the first
/// error.
#[derive(Debug, Clone)]
pub struct MapIter<'a> {
    key_type: &'a ColumnType,
    value_type: &'a ColumnType,
    decoder: CellDecoder<'a>,
    remaining: usize,
}

impl<'a> MapIter<'a> {
    fn read_entry(&mut self) -> Result<(RawValue<'a>, RawValue<'a>), DecodeError> {
        let key = self.decoder.read_cell()?;
        let value = self.decoder.read_cell()?;
        Ok((
            RawValue::new(self.key_type, key),
            RawValue::new(self.value_type, value),
        ))
    }
}

impl<'a> Iterator for MapIter<'a> {
    type Item = Result<(RawValue<'a>, RawValue<'a>), DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let entry = self.read_entry();
        self.remaining = if entry.is_ok() { self.remaining - 1 } else { 0 };
        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

/// One row of a result: the column metadata and the raw cells.
#[derive(Debug, Clone, Copy)]
pub struct RawRow<'a> {
    columns: &'a [ColumnSpec],
    cells: &'a [Option<Vec<u8>>],
}

impl<'a> RawRow<'a> {
    pub fn new(columns: &'a [ColumnSpec], cells: &'a [Option<Vec<u8>>]) -> Self {
        RawRow { columns, cells }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<RawValue<'a>> {
        let column = self.columns.get(index)?;
        let cell = self.cells.get(index)?;
        Some(RawValue::new(&column.column_type, cell.as_deref()))
    }

    pub fn get_by_name(&self, name: &str) -> Option<RawValue<'a>> {
        let index = self.columns.iter().position(|c| c.name.as_str() == name)?;
        self.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn list_cell(cells: &[Option<&[u8]>]) -> Vec<u8> {
        let mut out = (cells.len() as i32).to_be_bytes().to_vec();
        for cell in cells {
            write_cell(&mut out, *cell);
        }
        out
    }

    #[test]
    fn fixed_width_getters_check_length() {
        let ty = ColumnType::Int;
        let value = RawValue::new(&ty, Some(&[0, 0, 1, 0]));
        assert_eq!(value.get_int32(), Ok(256));

        let short = RawValue::new(&ty, Some(&[0, 1]));
        assert_eq!(
            short.get_int32(),
            Err(DecodeError::InvalidLength {
                column_type: ColumnType::Int,
                length: 2
            })
        );
    }

    #[test]
    fn getters_check_the_declared_type() {
        let ty = ColumnType::Text;
        let value = RawValue::new(&ty, Some(b"abc"));
        assert!(matches!(
            value.get_int64(),
            Err(DecodeError::TypeMismatch { requested: "int64", .. })
        ));
        assert_eq!(value.get_string(), Ok("abc"));
    }

    #[test]
    fn ascii_cells_must_be_ascii() {
        let ty = ColumnType::Ascii;
        let value = RawValue::new(&ty, Some("é".as_bytes()));
        assert_eq!(value.get_string(), Err(DecodeError::NonAscii(0xc3)));
    }

    #[test]
    fn collection_cells_iterate_elements_and_nulls() {
        let ty = ColumnType::list(ColumnType::Int);
        let body = list_cell(&[Some(&[0, 0, 0, 1]), None, Some(&[0, 0, 0, 3])]);
        let value = RawValue::new(&ty, Some(&body));
        let elements = value
            .iter_collection()
            .unwrap()
            .map(|e| e.map(|v| v.raw_bytes().map(|b| b.to_vec())))
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(elements, vec![Some(vec![0, 0, 0, 1]), None, Some(vec![0, 0, 0, 3])]);
    }

    #[test]
    fn truncated_collections_stop_with_an_error() {
        let ty = ColumnType::set(ColumnType::Int);
        let mut body = list_cell(&[Some(&[0, 0, 0, 1])]);
        body[3] = 2;
        let value = RawValue::new(&ty, Some(&body));
        let results = value.iter_collection().unwrap().collect::<Vec<_>>();
        assert_eq!(results.len(), 2);
        assert!(matches!(results[1], Err(DecodeError::Truncated { .. })));
    }

    #[test]
    fn negative_counts_are_rejected() {
        let ty = ColumnType::list(ColumnType::Int);
        let body = (-2_i32).to_be_bytes();
        let value = RawValue::new(&ty, Some(&body));
        assert_eq!(value.iter_collection().err(), Some(DecodeError::InvalidCount(-2)));
    }

    #[test]
    fn inet_accepts_both_families() {
        let ty = ColumnType::Inet;
        let v4 = RawValue::new(&ty, Some(&[127, 0, 0, 1]));
        assert_eq!(v4.get_inet(), Ok("127.0.0.1".parse().unwrap()));
        let bad = RawValue::new(&ty, Some(&[1, 2, 3]));
        assert!(bad.get_inet().is_err());
    }

    #[test]
    fn decoder_reports_truncation() {
        let mut decoder = CellDecoder::new(&[0, 0, 0, 5, 1, 2]);
        assert_eq!(
            decoder.read_cell(),
            Err(DecodeError::Truncated {
                needed: 5,
                remaining: 2
            })
        );
    }
}
