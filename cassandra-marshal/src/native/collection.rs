use std::net::IpAddr;

use super::raw::write_cell;
use super::{CollectionKind, DriverCode, DriverError, NativeCollection, NativeKind, NativeValue};
use crate::types::ColumnType;

/// The kind and column type of the first non-null value appended to one side
/// of a collection. Later values must be bound with the same driver call.
#[derive(Debug, Clone, PartialEq)]
struct ElementType {
    kind: NativeKind,
    column_type: ColumnType,
}

/// An in-process collection handle which encodes its elements in the CQL
/// collection layout: an `int32` element count followed by one length
/// prefixed cell per element (two per map entry).
#[derive(Debug, Clone, PartialEq)]
pub struct WireCollection {
    kind: CollectionKind,
    appended: usize,
    body: Vec<u8>,
    elements: Option<ElementType>,
    values: Option<ElementType>,
}

impl WireCollection {
    /// Number of elements, or of complete entries for a map.
    pub fn len(&self) -> usize {
        match self.kind {
            CollectionKind::Map => self.appended / 2,
            _ => self.appended,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.appended == 0
    }

    /// A map with a key waiting for its value is incomplete.
    pub fn is_complete(&self) -> bool {
        self.kind != CollectionKind::Map || self.appended % 2 == 0
    }

    /// The column type implied by what has been appended so far. Sides with
    /// only nulls or no elements at all are `Unknown`.
    pub fn column_type(&self) -> ColumnType {
        let side = |e: &Option<ElementType>| {
            e.as_ref()
                .map(|e| e.column_type.clone())
                .unwrap_or(ColumnType::Unknown)
        };
        match self.kind {
            CollectionKind::List => ColumnType::list(side(&self.elements)),
            CollectionKind::Set => ColumnType::set(side(&self.elements)),
            CollectionKind::Map => ColumnType::map(side(&self.elements), side(&self.values)),
        }
    }

    /// Whether this collection may be bound to a slot declared as `declared`.
    pub fn conforms_to(&self, declared: &ColumnType) -> bool {
        let side = |declared: &ColumnType, e: &Option<ElementType>| {
            e.as_ref().map_or(true, |e| declared.accepts(e.kind))
        };
        match (declared, self.kind) {
            (ColumnType::Unknown, _) => true,
            (ColumnType::List(e), CollectionKind::List) | (ColumnType::Set(e), CollectionKind::Set) => {
                side(e, &self.elements)
            }
            (ColumnType::Map(k, v), CollectionKind::Map) => {
                side(k, &self.elements) && side(v, &self.values)
            }
            _ => false,
        }
    }

    /// The encoded collection: element count then the cells.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 + self.body.len());
        out.extend_from_slice(&(self.len() as i32).to_be_bytes());
        out.extend_from_slice(&self.body);
        out
    }
}

impl NativeCollection for WireCollection {
    fn new(kind: CollectionKind, capacity: usize) -> Self {
        WireCollection {
            kind,
            appended: 0,
            body: Vec::with_capacity(capacity * 8),
            elements: None,
            values: None,
        }
    }

    fn kind(&self) -> CollectionKind {
        self.kind
    }

    fn append(&mut self, value: NativeValue<Self>) -> Result<(), DriverError> {
        let kind = value.kind();
        if kind != NativeKind::Null {
            let is_value = self.kind == CollectionKind::Map && self.appended % 2 == 1;
            let side = if is_value {
                &mut self.values
            } else {
                &mut self.elements
            };
            let column_type = column_type_of(&value);
            match side {
                Some(existing) => {
                    // nested collections may only refine what earlier
                    // elements left unknown
                    let unified = (existing.kind == kind)
                        .then(|| existing.column_type.unify(&column_type))
                        .flatten();
                    let Some(unified) = unified else {
                        return Err(DriverError::new(
                            DriverCode::InvalidValueType,
                            format!(
                                "cannot append a {} value to a collection of {} values",
                                column_type, existing.column_type
                            ),
                        ));
                    };
                    existing.column_type = unified;
                }
                None => *side = Some(ElementType { kind, column_type }),
            }
        }
        let cell = encode_cell(value);
        if cell.as_ref().is_some_and(|c| c.len() > i32::MAX as usize) {
            return Err(DriverError::new(
                DriverCode::InvalidData,
                "collection element is too large to encode",
            ));
        }
        write_cell(&mut self.body, cell.as_deref());
        self.appended += 1;
        Ok(())
    }
}

/// The column type a bound value reads back as when nothing is declared.
pub(crate) fn column_type_of(value: &NativeValue<WireCollection>) -> ColumnType {
    match value {
        NativeValue::Collection(c) => c.column_type(),
        other => other.kind().inferred_type(),
    }
}

/// Encode a bound value as the body of a CQL cell, `None` for null.
pub(crate) fn encode_cell(value: NativeValue<WireCollection>) -> Option<Vec<u8>> {
    let bytes = match value {
        NativeValue::Null => return None,
        NativeValue::Int8(v) => v.to_be_bytes().to_vec(),
        NativeValue::Int16(v) => v.to_be_bytes().to_vec(),
        NativeValue::Int32(v) => v.to_be_bytes().to_vec(),
        NativeValue::Uint32(v) => v.to_be_bytes().to_vec(),
        NativeValue::Int64(v) => v.to_be_bytes().to_vec(),
        NativeValue::Float(v) => v.to_be_bytes().to_vec(),
        NativeValue::Double(v) => v.to_be_bytes().to_vec(),
        NativeValue::Bool(v) => vec![u8::from(v)],
        NativeValue::String(s) => s.into_bytes(),
        NativeValue::Bytes(b) => b,
        NativeValue::Uuid(u) => u.as_bytes().to_vec(),
        NativeValue::Inet(IpAddr::V4(ip)) => ip.octets().to_vec(),
        NativeValue::Inet(IpAddr::V6(ip)) => ip.octets().to_vec(),
        NativeValue::Decimal { varint, scale } => {
            let mut out = Vec::with_capacity(4 + varint.len());
            out.extend_from_slice(&scale.to_be_bytes());
            out.extend_from_slice(&varint);
            out
        }
        NativeValue::Collection(c) => c.to_bytes(),
    };
    Some(bytes)
}
