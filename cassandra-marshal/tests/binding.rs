use std::sync::Arc;

use cassandra_marshal::native::{BoundParameter, DriverCode, WireStatement};
use cassandra_marshal::{
    BindError, BindOptions, ColumnType, HintPolicy, HostValue, IntegerPolicy, Slot, Statement,
    TypeRegistry,
};

// set up logging for all the tests
use test_log::test;

use cassandra_marshal_test::{list, map, prepare, registry, statement};
use pretty_assertions::assert_eq;

fn submitted(statement: &mut Statement<WireStatement>) -> Vec<BoundParameter> {
    let native = statement.take().unwrap();
    native.submit().unwrap().parameters().to_vec()
}

#[test]
fn insert_with_text_bigint_and_null() {
    let prepared = prepare(
        "INSERT INTO t (a, b, c) VALUES (?, ?, ?)",
        &[
            ("a", ColumnType::Text),
            ("b", ColumnType::BigInt),
            ("c", ColumnType::Int),
        ],
    );
    let mut statement = statement(&prepared);
    statement
        .bind_text(Slot::Index(0), "x")
        .unwrap()
        .bind_by_name("b", 42, Some("bigint"))
        .unwrap()
        .bind_null("c")
        .unwrap();
    let parameters = submitted(&mut statement);
    assert_eq!(parameters.len(), 3);
    assert_eq!(
        parameters,
        vec![
            BoundParameter {
                name: "a".into(),
                column_type: ColumnType::Text,
                bytes: Some(b"x".to_vec()),
            },
            BoundParameter {
                name: "b".into(),
                column_type: ColumnType::BigInt,
                bytes: Some(42_i64.to_be_bytes().to_vec()),
            },
            BoundParameter {
                name: "c".into(),
                column_type: ColumnType::Int,
                bytes: None,
            },
        ]
    );
}

#[test]
fn ascii_values_are_validated() {
    let prepared = prepare("INSERT INTO t (a) VALUES (?)", &[("a", ColumnType::Ascii)]);
    let mut statement = statement(&prepared);
    let err = statement.bind_ascii("a", "héllo").unwrap_err();
    assert!(matches!(
        err,
        BindError::InvalidValueType { ref expected, .. } if expected == "ascii"
    ));
    statement.bind_ascii("a", "hello").unwrap();
    assert_eq!(submitted(&mut statement)[0].bytes, Some(b"hello".to_vec()));
}

#[test]
fn timeuuid_strings_are_version_checked() {
    let prepared = prepare("INSERT INTO t (id) VALUES (?)", &[("id", ColumnType::TimeUuid)]);
    let mut statement = statement(&prepared);
    let err = statement
        .bind_timeuuid("id", "550e8400-e29b-41d4-a716-446655440000")
        .unwrap_err();
    assert_eq!(err.slot(), Some(&Slot::from("id")));
    assert!(matches!(err, BindError::ValidationFailure { .. }));
    statement
        .bind_timeuuid("id", "13814000-1dd2-11b2-8000-000000000000")
        .unwrap();
    submitted(&mut statement);
}

#[test]
fn unknown_hints_are_soft_by_default() {
    let mut statement = Statement::new(WireStatement::new("SELECT ?", 1), registry());
    statement.bind_by_index(0, 1, Some("no_such_type")).unwrap();
    assert_eq!(submitted(&mut statement)[0].column_type, ColumnType::BigInt);
}

#[test]
fn unknown_hints_fail_when_strict() {
    let options = BindOptions::default().with_hint_policy(HintPolicy::Strict);
    let mut statement =
        Statement::new(WireStatement::new("SELECT ?", 1), registry()).with_options(options);
    assert_eq!(
        statement.bind_by_index(0, 1, Some("no_such_type")).unwrap_err(),
        BindError::UnknownTypeHint("no_such_type".into())
    );
}

#[test]
fn integer_policy_controls_unhinted_integers() {
    let bind = |policy: IntegerPolicy, value: HostValue| {
        let mut statement = Statement::new(WireStatement::new("SELECT ?", 1), registry())
            .with_options(BindOptions::default().with_integer_policy(policy));
        statement.bind_by_index(0, value, None).unwrap();
        submitted(&mut statement).remove(0)
    };
    assert_eq!(bind(IntegerPolicy::Widen, 1.into()).column_type, ColumnType::BigInt);
    assert_eq!(bind(IntegerPolicy::Narrowest, 1.into()).column_type, ColumnType::Int);
    assert_eq!(
        bind(IntegerPolicy::Narrowest, (1_i64 << 40).into()).column_type,
        ColumnType::BigInt
    );
    // too wide for bigint, sent as varint bytes
    assert_eq!(
        bind(IntegerPolicy::Widen, (1_i128 << 64).into()).bytes,
        Some(vec![1, 0, 0, 0, 0, 0, 0, 0, 0])
    );
}

#[test]
fn declared_types_reject_mismatched_binds() {
    let prepared = prepare("INSERT INTO t (n) VALUES (?)", &[("n", ColumnType::Int)]);
    let mut statement = statement(&prepared);
    let err = statement.bind_by_name("n", 1.5, None).unwrap_err();
    assert_eq!(err.driver_code(), Some(DriverCode::InvalidValueType));
    assert!(matches!(
        err,
        BindError::DriverRejected {
            column_type: ColumnType::Double,
            ..
        }
    ));
}

#[test]
fn unknown_names_and_indexes() {
    let prepared = prepare("INSERT INTO t (n) VALUES (?)", &[("n", ColumnType::Int)]);
    let mut statement = statement(&prepared);
    let err = statement.bind_by_name("m", 1, Some("int")).unwrap_err();
    assert_eq!(err.driver_code(), Some(DriverCode::NameDoesNotExist));
    let err = statement.bind_by_index(1, 1, Some("int")).unwrap_err();
    assert_eq!(err.driver_code(), Some(DriverCode::IndexOutOfBounds));
}

#[test]
fn ad_hoc_statements_do_not_know_names() {
    let mut statement = Statement::new(WireStatement::new("SELECT ?", 1), registry());
    let err = statement.bind_by_name("a", 1, None).unwrap_err();
    assert_eq!(err.driver_code(), Some(DriverCode::NameDoesNotExist));
}

#[test]
fn unset_parameters_are_rejected_on_submit() {
    let prepared = prepare(
        "INSERT INTO t (a, b) VALUES (?, ?)",
        &[("a", ColumnType::Int), ("b", ColumnType::Int)],
    );
    let mut statement = statement(&prepared);
    statement.bind_int("a", 1).unwrap();
    let err = statement.take().unwrap().submit().unwrap_err();
    assert_eq!(err.code, DriverCode::ParameterUnset);
}

#[test]
fn handed_off_statements_are_null() {
    let prepared = prepare("INSERT INTO t (a) VALUES (?)", &[("a", ColumnType::Int)]);
    let mut statement = statement(&prepared);
    statement.bind_int("a", 1).unwrap();
    let _native = statement.take().unwrap();
    assert_eq!(statement.bind_int("a", 2).unwrap_err(), BindError::NullStatement);
    assert_eq!(
        statement.bind_list("a", list![1], None).unwrap_err(),
        BindError::NullStatement
    );
}

#[test]
fn collection_hints_apply_to_elements() {
    let prepared = prepare(
        "INSERT INTO t (m) VALUES (?)",
        &[("m", ColumnType::map(ColumnType::Ascii, ColumnType::SmallInt))],
    );
    let mut statement = statement(&prepared);
    statement
        .bind_by_name("m", map! { "a" => 1, "b" => 2 }, Some("map<ascii, smallint>"))
        .unwrap();
    let parameters = submitted(&mut statement);
    assert_eq!(
        parameters[0].column_type,
        ColumnType::map(ColumnType::Ascii, ColumnType::SmallInt)
    );

    let mut statement = Statement::new(prepared.bind(), Arc::new(TypeRegistry::new()));
    let err = statement
        .bind_map("m", map! { "a" => 100_000 }, Some("ascii"), Some("smallint"))
        .unwrap_err();
    assert!(matches!(err, BindError::InvalidValueType { .. }));
}

#[test]
fn codec_level_binders() {
    use cassandra_marshal::codec::{bind_map, bind_set};
    let mut statement = WireStatement::new("SELECT ?, ?", 2);
    let entries = maplit::btreemap! {
        HostValue::from("k") => HostValue::from(1),
    };
    bind_map(
        &mut statement,
        &Slot::Index(0),
        &entries,
        None,
        Some(&ColumnType::Int),
        &BindOptions::default(),
    )
    .unwrap();
    let elements = vec![HostValue::from(1), HostValue::from(1)];
    bind_set(
        &mut statement,
        &Slot::Index(1),
        &elements,
        Some(&ColumnType::TinyInt),
        &BindOptions::default(),
    )
    .unwrap();
    let submission = statement.submit().unwrap();
    assert_eq!(
        submission.parameters()[0].column_type,
        ColumnType::map(ColumnType::Text, ColumnType::Int)
    );
    assert_eq!(
        submission.parameters()[1].bytes,
        Some(vec![0, 0, 0, 2, 0, 0, 0, 1, 1, 0, 0, 0, 1, 1])
    );
}

#[test]
fn nested_collections_are_checked_all_the_way_down() {
    let mut statement = Statement::new(WireStatement::new("SELECT ?", 1), registry());
    let err = statement
        .bind_by_index(0, list![list![1], list!["a"]], None)
        .unwrap_err();
    assert_eq!(err.driver_code(), Some(DriverCode::InvalidValueType));

    statement
        .bind_by_index(0, list![list![], list![1]], None)
        .unwrap();
    assert_eq!(
        submitted(&mut statement)[0].column_type,
        ColumnType::list(ColumnType::list(ColumnType::BigInt))
    );
}
