use std::sync::Arc;

use cassandra_marshal::native::{ColumnSpec, NativeResult, Prepared, WireResult, WireStatement};
use cassandra_marshal::{ColumnType, HostValue, ResultReader, Statement, TypeRegistry};

#[doc(hidden)]
pub use cassandra_marshal as __marshal;

pub fn registry() -> Arc<TypeRegistry> {
    Arc::new(TypeRegistry::new())
}

/// A prepared statement whose parameters have the given names and types.
pub fn prepare(query: &str, columns: &[(&str, ColumnType)]) -> Prepared {
    Prepared::new(
        query,
        columns
            .iter()
            .map(|(name, ty)| ColumnSpec::new(*name, ty.clone()))
            .collect(),
    )
}

/// A binder over a fresh statement for `prepared`.
pub fn statement(prepared: &Prepared) -> Statement<WireStatement> {
    Statement::new(prepared.bind(), registry())
}

/// Submit the statement and read its bound parameters back as a one row
/// result.
pub fn submit_and_read(statement: &mut Statement<WireStatement>) -> ResultReader<WireResult> {
    let native = statement.take().expect("statement already taken");
    let submission = native.submit().expect("statement was not fully bound");
    ResultReader::new(submission.into_result())
}

/// The single row of `reader`, decoded.
pub fn only_row<R: NativeResult>(reader: &ResultReader<R>) -> Vec<HostValue> {
    let mut rows = reader
        .rows()
        .collect::<Result<Vec<_>, _>>()
        .expect("failed to decode rows");
    assert_eq!(rows.len(), 1, "expected exactly one row");
    rows.remove(0)
}

/// Construct a `HostValue::List`. Elements are anything which implements
/// `Into<HostValue>`, including nested `list!`, `set!` and `map!` calls.
///
/// ```
/// # use cassandra_marshal_test::list;
/// let value = list![1, "two", list![3.5]];
/// assert_eq!(value.as_list().unwrap().len(), 3);
/// ```
#[macro_export]
macro_rules! list {
    ($($value:expr),* $(,)?) => {
        $crate::__marshal::HostValue::List(vec![$($crate::__marshal::HostValue::from($value)),*])
    };
}

/// Construct a `HostValue::Set`.
#[macro_export]
macro_rules! set {
    ($($value:expr),* $(,)?) => {
        $crate::__marshal::HostValue::set([$($crate::__marshal::HostValue::from($value)),*])
    };
}

/// Construct a `HostValue::Map` from `key => value` pairs.
///
/// ```
/// # use cassandra_marshal_test::map;
/// let value = map! { "a" => 1, "b" => 2 };
/// assert_eq!(value.as_map().unwrap().len(), 2);
/// ```
#[macro_export]
macro_rules! map {
    ($($key:expr => $value:expr),* $(,)?) => {
        $crate::__marshal::HostValue::map([
            $(($crate::__marshal::HostValue::from($key), $crate::__marshal::HostValue::from($value))),*
        ])
    };
}

/// Assert that the rows decoded from a `ResultReader` equal `expected`, a
/// `Vec<Vec<HostValue>>`. On mismatch both sides are printed as JSON.
#[macro_export]
macro_rules! assert_rows {
    ($reader: expr, $expected: expr) => {{
        let rows = $reader
            .rows()
            .collect::<Result<Vec<_>, _>>()
            .expect("failed to decode rows");
        let expected: Vec<Vec<$crate::__marshal::HostValue>> = $expected;
        if rows != expected {
            $crate::pretty_panic(&expected, &rows)
        }
    }};
}

pub fn pretty_panic(expected: &[Vec<HostValue>], rows: &[Vec<HostValue>]) {
    let serde_left = serde_json::to_string_pretty(expected).unwrap();
    let serde_right = serde_json::to_string_pretty(rows).unwrap();
    panic!(
        "rows didn't match\n expected\n{}\n got\n{}",
        &serde_left, &serde_right
    );
}
