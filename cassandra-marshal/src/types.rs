use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::error::InvalidTypeName;
use crate::native::{CollectionKind, NativeKind};

/// The CQL type of a column, parameter or collection element.
///
/// `Text` also covers `varchar`, which is an alias on the wire. The scale of a
/// `decimal` travels with each value (see [`crate::CqlDecimal`]) rather than
/// with the column type.
///
/// [`ColumnType::Unknown`] is never a bind target: as a hint it means "infer
/// the type from the value", and as a declared parameter type it means the
/// driver knows nothing about the slot (an ad hoc statement).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ColumnType {
    Ascii,
    Text,
    Boolean,
    TinyInt,
    SmallInt,
    Int,
    BigInt,
    Counter,
    VarInt,
    Float,
    Double,
    Decimal,
    Uuid,
    TimeUuid,
    Blob,
    Inet,
    Date,
    Time,
    Timestamp,
    List(Box<ColumnType>),
    Set(Box<ColumnType>),
    Map(Box<ColumnType>, Box<ColumnType>),
    Unknown,
}

impl ColumnType {
    pub fn list(element: ColumnType) -> Self {
        ColumnType::List(Box::new(element))
    }

    pub fn set(element: ColumnType) -> Self {
        ColumnType::Set(Box::new(element))
    }

    pub fn map(key: ColumnType, value: ColumnType) -> Self {
        ColumnType::Map(Box::new(key), Box::new(value))
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, ColumnType::Unknown)
    }

    pub fn is_collection(&self) -> bool {
        matches!(
            self,
            ColumnType::List(_) | ColumnType::Set(_) | ColumnType::Map(_, _)
        )
    }

    /// The most specific type both `self` and `other` describe, treating
    /// `Unknown` (at any depth) as a wildcard. `None` if they conflict.
    pub(crate) fn unify(&self, other: &ColumnType) -> Option<ColumnType> {
        match (self, other) {
            (ColumnType::Unknown, t) | (t, ColumnType::Unknown) => Some(t.clone()),
            (ColumnType::List(a), ColumnType::List(b)) => Some(ColumnType::list(a.unify(b)?)),
            (ColumnType::Set(a), ColumnType::Set(b)) => Some(ColumnType::set(a.unify(b)?)),
            (ColumnType::Map(ka, va), ColumnType::Map(kb, vb)) => {
                Some(ColumnType::map(ka.unify(kb)?, va.unify(vb)?))
            }
            (a, b) if a == b => Some(a.clone()),
            _ => None,
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            ColumnType::TinyInt
                | ColumnType::SmallInt
                | ColumnType::Int
                | ColumnType::BigInt
                | ColumnType::Counter
                | ColumnType::VarInt
        )
    }

    /// The collection kind a value of this type is built from, if any.
    pub fn collection_kind(&self) -> Option<CollectionKind> {
        match self {
            ColumnType::List(_) => Some(CollectionKind::List),
            ColumnType::Set(_) => Some(CollectionKind::Set),
            ColumnType::Map(_, _) => Some(CollectionKind::Map),
            _ => None,
        }
    }

    /// Whether a slot declared with this type accepts a value bound with the
    /// driver call of the given kind. Null is accepted everywhere and an
    /// `Unknown` slot accepts anything.
    pub fn accepts(&self, kind: NativeKind) -> bool {
        match (self, kind) {
            (_, NativeKind::Null) | (ColumnType::Unknown, _) => true,
            (ColumnType::Ascii | ColumnType::Text, NativeKind::String) => true,
            (ColumnType::Boolean, NativeKind::Bool) => true,
            (ColumnType::TinyInt, NativeKind::Int8) => true,
            (ColumnType::SmallInt, NativeKind::Int16) => true,
            (ColumnType::Int, NativeKind::Int32) => true,
            (
                ColumnType::BigInt | ColumnType::Counter | ColumnType::Time | ColumnType::Timestamp,
                NativeKind::Int64,
            ) => true,
            (ColumnType::Date, NativeKind::Uint32) => true,
            (ColumnType::VarInt | ColumnType::Blob, NativeKind::Bytes) => true,
            (ColumnType::Float, NativeKind::Float) => true,
            (ColumnType::Double, NativeKind::Double) => true,
            (ColumnType::Decimal, NativeKind::Decimal) => true,
            (ColumnType::Uuid | ColumnType::TimeUuid, NativeKind::Uuid) => true,
            (ColumnType::Inet, NativeKind::Inet) => true,
            (ColumnType::List(_), NativeKind::Collection(CollectionKind::List)) => true,
            (ColumnType::Set(_), NativeKind::Collection(CollectionKind::Set)) => true,
            (ColumnType::Map(_, _), NativeKind::Collection(CollectionKind::Map)) => true,
            _ => false,
        }
    }

    /// The CQL name of this type, without element types.
    pub fn name(&self) -> &'static str {
        match self {
            ColumnType::Ascii => "ascii",
            ColumnType::Text => "text",
            ColumnType::Boolean => "boolean",
            ColumnType::TinyInt => "tinyint",
            ColumnType::SmallInt => "smallint",
            ColumnType::Int => "int",
            ColumnType::BigInt => "bigint",
            ColumnType::Counter => "counter",
            ColumnType::VarInt => "varint",
            ColumnType::Float => "float",
            ColumnType::Double => "double",
            ColumnType::Decimal => "decimal",
            ColumnType::Uuid => "uuid",
            ColumnType::TimeUuid => "timeuuid",
            ColumnType::Blob => "blob",
            ColumnType::Inet => "inet",
            ColumnType::Date => "date",
            ColumnType::Time => "time",
            ColumnType::Timestamp => "timestamp",
            ColumnType::List(_) => "list",
            ColumnType::Set(_) => "set",
            ColumnType::Map(_, _) => "map",
            ColumnType::Unknown => "unknown",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        let ty = match name {
            "ascii" => ColumnType::Ascii,
            "text" | "varchar" => ColumnType::Text,
            "boolean" => ColumnType::Boolean,
            "tinyint" => ColumnType::TinyInt,
            "smallint" => ColumnType::SmallInt,
            "int" => ColumnType::Int,
            "bigint" => ColumnType::BigInt,
            "counter" => ColumnType::Counter,
            "varint" => ColumnType::VarInt,
            "float" => ColumnType::Float,
            "double" => ColumnType::Double,
            "decimal" => ColumnType::Decimal,
            "uuid" => ColumnType::Uuid,
            "timeuuid" => ColumnType::TimeUuid,
            "blob" => ColumnType::Blob,
            "inet" => ColumnType::Inet,
            "date" => ColumnType::Date,
            "time" => ColumnType::Time,
            "timestamp" => ColumnType::Timestamp,
            _ => return None,
        };
        Some(ty)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::List(e) => write!(f, "list<{}>", e),
            ColumnType::Set(e) => write!(f, "set<{}>", e),
            ColumnType::Map(k, v) => write!(f, "map<{}, {}>", k, v),
            other => f.write_str(other.name()),
        }
    }
}

impl FromStr for ColumnType {
    type Err = InvalidTypeName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parser = TypeParser { input: s, pos: 0 };
        let ty = parser.parse_type()?;
        parser.skip_whitespace();
        if parser.pos != s.len() {
            return Err(parser.error());
        }
        Ok(ty)
    }
}

impl TryFrom<String> for ColumnType {
    type Error = InvalidTypeName;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ColumnType> for String {
    fn from(ty: ColumnType) -> Self {
        ty.to_string()
    }
}

/// Recursive descent over CQL type syntax, e.g. `map<text, frozen<list<int>>>`.
struct TypeParser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> TypeParser<'a> {
    fn parse_type(&mut self) -> Result<ColumnType, InvalidTypeName> {
        let name = self.identifier()?.to_ascii_lowercase();
        match name.as_str() {
            "list" => {
                self.expect('<')?;
                let element = self.parse_type()?;
                self.expect('>')?;
                Ok(ColumnType::list(element))
            }
            "set" => {
                self.expect('<')?;
                let element = self.parse_type()?;
                self.expect('>')?;
                Ok(ColumnType::set(element))
            }
            "map" => {
                self.expect('<')?;
                let key = self.parse_type()?;
                self.expect(',')?;
                let value = self.parse_type()?;
                self.expect('>')?;
                Ok(ColumnType::map(key, value))
            }
            "frozen" => {
                self.expect('<')?;
                let inner = self.parse_type()?;
                self.expect('>')?;
                Ok(inner)
            }
            other => ColumnType::from_name(other).ok_or_else(|| self.error()),
        }
    }

    fn identifier(&mut self) -> Result<&'a str, InvalidTypeName> {
        self.skip_whitespace();
        let input = self.input;
        let rest = &input[self.pos..];
        let len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        if len == 0 {
            return Err(self.error());
        }
        self.pos += len;
        Ok(&rest[..len])
    }

    fn expect(&mut self, c: char) -> Result<(), InvalidTypeName> {
        self.skip_whitespace();
        if self.input[self.pos..].starts_with(c) {
            self.pos += c.len_utf8();
            Ok(())
        } else {
            Err(self.error())
        }
    }

    fn skip_whitespace(&mut self) {
        let rest = &self.input[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn error(&self) -> InvalidTypeName {
        InvalidTypeName {
            input: self.input.to_string(),
            position: self.pos,
        }
    }
}

/// A statement parameter slot, addressed by position or by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Slot {
    Index(usize),
    Name(SmolStr),
}

impl Slot {
    pub fn index(&self) -> Option<usize> {
        match self {
            Slot::Index(i) => Some(*i),
            Slot::Name(_) => None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Slot::Index(_) => None,
            Slot::Name(n) => Some(n.as_str()),
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Index(i) => write!(f, "index {}", i),
            Slot::Name(n) => write!(f, "name `{}`", n),
        }
    }
}

impl From<usize> for Slot {
    fn from(index: usize) -> Self {
        Slot::Index(index)
    }
}

impl From<&str> for Slot {
    fn from(name: &str) -> Self {
        Slot::Name(SmolStr::new(name))
    }
}

impl From<String> for Slot {
    fn from(name: String) -> Self {
        Slot::Name(SmolStr::from(name))
    }
}

impl From<SmolStr> for Slot {
    fn from(name: SmolStr) -> Self {
        Slot::Name(name)
    }
}
