//! The contract between the marshaling layer and a native driver.
//!
//! The traits here describe the handful of driver calls the codecs need:
//! binding a typed value into a statement slot, building a collection one
//! element at a time, and walking the typed cells of a result. Cell values
//! are read through [`RawValue`], a typed view over the CQL v4 value layout
//! (`[int32 length][bytes]`, with a length of `-1` meaning null).
//!
//! [`WireStatement`], [`WireCollection`] and [`WireResult`] implement the
//! contract in process. They perform the same checks a driver performs at
//! bind time (slot bounds, unknown names, declared types, unset parameters on
//! submission) and keep every bound value in the wire layout, so a submitted
//! statement can be turned straight back into a result.

use std::fmt;
use std::net::IpAddr;

use uuid::Uuid;

use crate::types::{ColumnType, Slot};

mod collection;
mod error;
mod raw;
mod result;
mod statement;

pub use collection::WireCollection;
pub use error::{DriverCode, DriverError};
pub use raw::{CollectionIter, MapIter, RawRow, RawValue};
pub(crate) use raw::CellDecoder;
pub use result::{WireResult, WireRows};
pub use statement::{BoundParameter, ColumnSpec, Prepared, Submission, WireStatement};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    List,
    Set,
    Map,
}

/// Which driver bind call a [`NativeValue`] corresponds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeKind {
    Null,
    Int8,
    Int16,
    Int32,
    Uint32,
    Int64,
    Float,
    Double,
    Bool,
    String,
    Bytes,
    Uuid,
    Inet,
    Decimal,
    Collection(CollectionKind),
}

impl NativeKind {
    /// The column type a value bound with this call is read back as when
    /// the slot declares no type of its own.
    pub fn inferred_type(&self) -> ColumnType {
        match self {
            NativeKind::Null => ColumnType::Unknown,
            NativeKind::Int8 => ColumnType::TinyInt,
            NativeKind::Int16 => ColumnType::SmallInt,
            NativeKind::Int32 => ColumnType::Int,
            NativeKind::Uint32 => ColumnType::Date,
            NativeKind::Int64 => ColumnType::BigInt,
            NativeKind::Float => ColumnType::Float,
            NativeKind::Double => ColumnType::Double,
            NativeKind::Bool => ColumnType::Boolean,
            NativeKind::String => ColumnType::Text,
            NativeKind::Bytes => ColumnType::Blob,
            NativeKind::Uuid => ColumnType::Uuid,
            NativeKind::Inet => ColumnType::Inet,
            NativeKind::Decimal => ColumnType::Decimal,
            NativeKind::Collection(CollectionKind::List) => ColumnType::list(ColumnType::Unknown),
            NativeKind::Collection(CollectionKind::Set) => ColumnType::set(ColumnType::Unknown),
            NativeKind::Collection(CollectionKind::Map) => {
                ColumnType::map(ColumnType::Unknown, ColumnType::Unknown)
            }
        }
    }
}

impl fmt::Display for NativeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NativeKind::Null => "null",
            NativeKind::Int8 => "int8",
            NativeKind::Int16 => "int16",
            NativeKind::Int32 => "int32",
            NativeKind::Uint32 => "uint32",
            NativeKind::Int64 => "int64",
            NativeKind::Float => "float",
            NativeKind::Double => "double",
            NativeKind::Bool => "bool",
            NativeKind::String => "string",
            NativeKind::Bytes => "bytes",
            NativeKind::Uuid => "uuid",
            NativeKind::Inet => "inet",
            NativeKind::Decimal => "decimal",
            NativeKind::Collection(CollectionKind::List) => "list",
            NativeKind::Collection(CollectionKind::Set) => "set",
            NativeKind::Collection(CollectionKind::Map) => "map",
        };
        f.write_str(name)
    }
}

/// One driver bind call's worth of data.
///
/// `Decimal` carries the unscaled value already varint encoded, which is the
/// form the driver's decimal bind takes. `C` is the driver's collection
/// handle type.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeValue<C> {
    Null,
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Uint32(u32),
    Int64(i64),
    Float(f32),
    Double(f64),
    Bool(bool),
    String(String),
    Bytes(Vec<u8>),
    Uuid(Uuid),
    Inet(IpAddr),
    Decimal { varint: Vec<u8>, scale: i32 },
    Collection(C),
}

impl<C: NativeCollection> NativeValue<C> {
    pub fn kind(&self) -> NativeKind {
        match self {
            NativeValue::Null => NativeKind::Null,
            NativeValue::Int8(_) => NativeKind::Int8,
            NativeValue::Int16(_) => NativeKind::Int16,
            NativeValue::Int32(_) => NativeKind::Int32,
            NativeValue::Uint32(_) => NativeKind::Uint32,
            NativeValue::Int64(_) => NativeKind::Int64,
            NativeValue::Float(_) => NativeKind::Float,
            NativeValue::Double(_) => NativeKind::Double,
            NativeValue::Bool(_) => NativeKind::Bool,
            NativeValue::String(_) => NativeKind::String,
            NativeValue::Bytes(_) => NativeKind::Bytes,
            NativeValue::Uuid(_) => NativeKind::Uuid,
            NativeValue::Inet(_) => NativeKind::Inet,
            NativeValue::Decimal { .. } => NativeKind::Decimal,
            NativeValue::Collection(c) => NativeKind::Collection(c.kind()),
        }
    }
}

/// A collection under construction.
///
/// Map entries are appended as a key followed by its value. Dropping a
/// collection releases it, whether or not it was ever bound.
pub trait NativeCollection: Sized {
    fn new(kind: CollectionKind, capacity: usize) -> Self;

    fn kind(&self) -> CollectionKind;

    fn append(&mut self, value: NativeValue<Self>) -> Result<(), DriverError>;
}

/// A statement whose parameter slots are being bound.
pub trait NativeStatement {
    type Collection: NativeCollection;

    fn parameter_count(&self) -> usize;

    /// Bind `value` into `slot`, replacing any value bound there before.
    fn bind(
        &mut self,
        slot: &Slot,
        value: NativeValue<Self::Collection>,
    ) -> Result<(), DriverError>;
}

/// A result set: column metadata plus a forward only row iterator.
pub trait NativeResult {
    type Rows<'a>: Iterator<Item = RawRow<'a>>
    where
        Self: 'a;

    fn row_count(&self) -> usize;

    fn column_count(&self) -> usize;

    fn column_name(&self, index: usize) -> Option<&str>;

    fn column_type(&self, index: usize) -> Option<&ColumnType>;

    fn has_more_pages(&self) -> bool;

    /// A fresh iterator positioned before the first row.
    fn rows(&self) -> Self::Rows<'_>;
}
