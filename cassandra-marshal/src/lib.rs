//! # Cassandra marshal
//!
//! This crate converts between dynamically typed host values ([`HostValue`])
//! and the statically typed, binary encoded column values of Cassandra's CQL
//! protocol. It sits between a scripting-language binding and the native
//! driver: the binding hands over whatever value a caller supplied, this crate
//! works out which CQL type it should be written as and writes it into a
//! statement parameter slot, and on the way back it turns the raw bytes of a
//! result cell into the closest host value.
//!
//! There are two halves:
//!
//! * The encoder, reached through [`Statement`]. Values are bound by position
//!   ([`Statement::bind_by_index`]) or by name ([`Statement::bind_by_name`]),
//!   optionally with a type hint such as `"int"` or `"map<text, bigint>"`
//!   which overrides the default mapping. Explicitly typed entry points like
//!   [`Statement::bind_ascii`] or [`Statement::bind_decimal`] skip inference
//!   entirely.
//! * The decoder, reached through [`ResultReader`], which walks the rows of a
//!   result and decodes each cell according to its declared column type.
//!
//! Both halves are written against the driver contract in [`native`]. The
//! crate ships one implementation of that contract, [`native::WireStatement`]
//! and friends, which keeps bound values in the CQL v4 value layout. It is
//! what the tests use to round trip values without a cluster.
//!
//! ## Default mapping
//!
//! With no type hint a value is bound according to its runtime tag:
//!
//! | Host value                  | CQL type                                  |
//! |-----------------------------|-------------------------------------------|
//! | [`HostValue::Integer`]      | `bigint`, or `varint` beyond 64 bits      |
//! | [`HostValue::Real`]         | `double`                                  |
//! | [`HostValue::Numeric`]      | `decimal`                                 |
//! | [`HostValue::Str`]          | `text`                                    |
//! | [`HostValue::Bytes`]        | `blob`                                    |
//! | [`HostValue::Boolean`]      | `boolean`                                 |
//! | list / set / map            | `list<_>` / `set<_>` / `map<_, _>`        |
//! | wrapper types               | the type they wrap                        |
//!
//! The integer rule can be narrowed with [`IntegerPolicy::Narrowest`]. An
//! unrecognised type hint falls back to this table unless the statement is
//! configured with [`HintPolicy::Strict`].
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use cassandra_marshal::native::{ColumnSpec, Prepared};
//! use cassandra_marshal::{ColumnType, HostValue, ResultReader, Statement, TypeRegistry};
//!
//! let prepared = Prepared::new(
//!     "INSERT INTO t (a, b) VALUES (?, ?)",
//!     vec![
//!         ColumnSpec::new("a", ColumnType::Text),
//!         ColumnSpec::new("b", ColumnType::BigInt),
//!     ],
//! );
//! let registry = Arc::new(TypeRegistry::new());
//! let mut statement = Statement::new(prepared.bind(), registry);
//! statement
//!     .bind_by_index(0, "x", None)?
//!     .bind_by_name("b", 42, Some("bigint"))?;
//!
//! let submission = statement.take()?.submit()?;
//! let reader = ResultReader::new(submission.into_result());
//! let rows = reader.rows().collect::<Result<Vec<_>, _>>()?;
//! assert_eq!(rows, vec![vec![HostValue::from("x"), HostValue::from(42)]]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    bad_style,
    dead_code,
    improper_ctypes,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    unconditional_recursion,
    unused,
    unused_allocation,
    unused_comparisons,
    unused_parens,
    while_true
)]

mod binder;
pub mod codec;
pub mod error;
pub mod native;
mod options;
mod registry;
mod result;
mod types;
mod value;

pub use binder::Statement;
pub use codec::{bind_value, read_value};
pub use error::{BindError, DecodeError, InvalidTypeName};
pub use options::{BindOptions, HintPolicy, IntegerPolicy};
pub use registry::{TimeUuidGenerator, TypeRegistry, DEFAULT_MEMO_CAPACITY};
pub use result::{ResultReader, Rows};
pub use types::{ColumnType, Slot};
pub use value::{
    CqlDate, CqlDecimal, CqlTime, CqlTimestamp, HostValue, InvalidDecimal, InvalidTemporal,
    InvalidTimeUuid, TimeUuid,
};

pub use bigdecimal::num_bigint::BigInt;
pub use bigdecimal::BigDecimal;
pub use uuid::Uuid;
