use smol_str::{format_smolstr, SmolStr};

use super::collection::{column_type_of, encode_cell};
use super::result::WireResult;
use super::{DriverCode, DriverError, NativeStatement, NativeValue, WireCollection};
use crate::types::{ColumnType, Slot};

/// The name and CQL type of a statement parameter or result column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: SmolStr,
    pub column_type: ColumnType,
}

impl ColumnSpec {
    pub fn new<S: Into<SmolStr>>(name: S, column_type: ColumnType) -> Self {
        ColumnSpec {
            name: name.into(),
            column_type,
        }
    }
}

/// A prepared query: the query text and its parameter metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Prepared {
    query: String,
    parameters: Vec<ColumnSpec>,
}

impl Prepared {
    pub fn new<S: Into<String>>(query: S, parameters: Vec<ColumnSpec>) -> Self {
        Prepared {
            query: query.into(),
            parameters,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn parameters(&self) -> &[ColumnSpec] {
        &self.parameters
    }

    /// A fresh statement with every parameter unset.
    pub fn bind(&self) -> WireStatement {
        WireStatement {
            query: self.query.clone(),
            params: self
                .parameters
                .iter()
                .map(|p| Param {
                    name: Some(p.name.clone()),
                    declared: p.column_type.clone(),
                    bound: None,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Param {
    name: Option<SmolStr>,
    declared: ColumnType,
    bound: Option<(ColumnType, Option<Vec<u8>>)>,
}

/// An in-process statement handle.
///
/// Statements built from a [`Prepared`] know the name and type of every
/// slot, values which the declared type does not accept are rejected the way
/// the driver rejects them. Ad hoc statements from [`WireStatement::new`]
/// have anonymous, untyped slots which can only be bound by index.
#[derive(Debug, Clone, PartialEq)]
pub struct WireStatement {
    query: String,
    params: Vec<Param>,
}

impl WireStatement {
    pub fn new<S: Into<String>>(query: S, parameter_count: usize) -> Self {
        WireStatement {
            query: query.into(),
            params: vec![
                Param {
                    name: None,
                    declared: ColumnType::Unknown,
                    bound: None,
                };
                parameter_count
            ],
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Whether the parameter at `index` has had a value bound.
    pub fn is_bound(&self, index: usize) -> bool {
        self.params.get(index).is_some_and(|p| p.bound.is_some())
    }

    fn slots(&self, slot: &Slot) -> Result<Vec<usize>, DriverError> {
        match slot {
            Slot::Index(i) if *i < self.params.len() => Ok(vec![*i]),
            Slot::Index(i) => Err(DriverError::new(
                DriverCode::IndexOutOfBounds,
                format!(
                    "index {} is out of bounds for a statement with {} parameters",
                    i,
                    self.params.len()
                ),
            )),
            Slot::Name(name) => {
                let matches = self
                    .params
                    .iter()
                    .enumerate()
                    .filter(|(_, p)| p.name.as_ref().is_some_and(|n| name_matches(name, n)))
                    .map(|(i, _)| i)
                    .collect::<Vec<_>>();
                if matches.is_empty() {
                    Err(DriverError::new(
                        DriverCode::NameDoesNotExist,
                        format!("no parameter named `{}`", name),
                    ))
                } else {
                    Ok(matches)
                }
            }
        }
    }

    /// Consume the statement, failing if any parameter is still unset.
    pub fn submit(self) -> Result<Submission, DriverError> {
        let mut parameters = Vec::with_capacity(self.params.len());
        for (i, param) in self.params.into_iter().enumerate() {
            let (column_type, bytes) = param.bound.ok_or_else(|| {
                DriverError::new(
                    DriverCode::ParameterUnset,
                    format!("parameter {} was never bound", i),
                )
            })?;
            parameters.push(BoundParameter {
                name: param.name.unwrap_or_else(|| format_smolstr!("col{}", i)),
                column_type,
                bytes,
            });
        }
        Ok(Submission {
            query: self.query,
            parameters,
        })
    }
}

/// Names bind case insensitively unless quoted, in which case the quoted
/// text must match exactly.
fn name_matches(requested: &str, declared: &str) -> bool {
    match requested
        .strip_prefix('"')
        .and_then(|r| r.strip_suffix('"'))
    {
        Some(exact) => exact == declared,
        None => requested.eq_ignore_ascii_case(declared),
    }
}

impl NativeStatement for WireStatement {
    type Collection = WireCollection;

    fn parameter_count(&self) -> usize {
        self.params.len()
    }

    fn bind(&mut self, slot: &Slot, value: NativeValue<WireCollection>) -> Result<(), DriverError> {
        let indices = self.slots(slot)?;
        let kind = value.kind();
        for &i in &indices {
            let declared = &self.params[i].declared;
            if !declared.accepts(kind) {
                return Err(DriverError::new(
                    DriverCode::InvalidValueType,
                    format!("cannot bind a {} value to a {} parameter", kind, declared),
                ));
            }
            if let NativeValue::Collection(c) = &value {
                if !c.is_complete() {
                    return Err(DriverError::new(
                        DriverCode::InvalidItemCount,
                        "map has a key without a value",
                    ));
                }
                if !c.conforms_to(declared) {
                    return Err(DriverError::new(
                        DriverCode::InvalidValueType,
                        format!("cannot bind a {} to a {} parameter", c.column_type(), declared),
                    ));
                }
            }
        }
        let column_type = column_type_of(&value);
        let bytes = encode_cell(value);
        for i in indices {
            let param = &mut self.params[i];
            let bound_type = if param.declared.is_unknown() {
                column_type.clone()
            } else {
                param.declared.clone()
            };
            param.bound = Some((bound_type, bytes.clone()));
        }
        Ok(())
    }
}

/// A bound parameter as it went to the server.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundParameter {
    pub name: SmolStr,
    pub column_type: ColumnType,
    pub bytes: Option<Vec<u8>>,
}

/// A statement which passed submission checks.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    query: String,
    parameters: Vec<BoundParameter>,
}

impl Submission {
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn parameters(&self) -> &[BoundParameter] {
        &self.parameters
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Echo the bound parameters back as a single row result, one column per
    /// parameter.
    pub fn into_result(self) -> WireResult {
        let (columns, row): (Vec<_>, Vec<_>) = self
            .parameters
            .into_iter()
            .map(|p| (ColumnSpec::new(p.name, p.column_type), p.bytes))
            .unzip();
        let mut result = WireResult::new(columns);
        result.push_raw_row(row);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::{CollectionKind, NativeCollection};
    use pretty_assertions::assert_eq;

    fn prepared() -> Prepared {
        Prepared::new(
            "INSERT INTO t (id, Name, \"Quoted\") VALUES (?, ?, ?)",
            vec![
                ColumnSpec::new("id", ColumnType::BigInt),
                ColumnSpec::new("name", ColumnType::Text),
                ColumnSpec::new("Quoted", ColumnType::Int),
            ],
        )
    }

    #[test]
    fn index_out_of_bounds() {
        let mut statement = prepared().bind();
        let err = statement
            .bind(&Slot::Index(3), NativeValue::Int64(1))
            .unwrap_err();
        assert_eq!(err.code, DriverCode::IndexOutOfBounds);
    }

    #[test]
    fn names_are_case_insensitive_unless_quoted() {
        let mut statement = prepared().bind();
        statement
            .bind(&Slot::from("NAME"), NativeValue::String("x".into()))
            .unwrap();
        assert!(statement.is_bound(1));

        let err = statement
            .bind(&Slot::from("\"quoted\""), NativeValue::Int32(1))
            .unwrap_err();
        assert_eq!(err.code, DriverCode::NameDoesNotExist);
        statement
            .bind(&Slot::from("\"Quoted\""), NativeValue::Int32(1))
            .unwrap();
        assert!(statement.is_bound(2));
    }

    #[test]
    fn declared_types_reject_other_kinds() {
        let mut statement = prepared().bind();
        let err = statement
            .bind(&Slot::Index(0), NativeValue::String("1".into()))
            .unwrap_err();
        assert_eq!(err.code, DriverCode::InvalidValueType);
        assert!(!statement.is_bound(0));
    }

    #[test]
    fn unset_parameters_fail_submission() {
        let mut statement = prepared().bind();
        statement.bind(&Slot::Index(0), NativeValue::Int64(7)).unwrap();
        let err = statement.submit().unwrap_err();
        assert_eq!(err.code, DriverCode::ParameterUnset);
    }

    #[test]
    fn incomplete_maps_are_rejected() {
        let mut statement = WireStatement::new("SELECT ?", 1);
        let mut map = WireCollection::new(CollectionKind::Map, 1);
        map.append(NativeValue::Int32(1)).unwrap();
        let err = statement
            .bind(&Slot::Index(0), NativeValue::Collection(map))
            .unwrap_err();
        assert_eq!(err.code, DriverCode::InvalidItemCount);
    }

    #[test]
    fn ad_hoc_statements_infer_types() {
        let mut statement = WireStatement::new("SELECT ?, ?", 2);
        statement.bind(&Slot::Index(0), NativeValue::Int32(5)).unwrap();
        statement.bind(&Slot::Index(1), NativeValue::Null).unwrap();
        let submission = statement.submit().unwrap();
        assert_eq!(
            submission.parameters(),
            &[
                BoundParameter {
                    name: "col0".into(),
                    column_type: ColumnType::Int,
                    bytes: Some(vec![0, 0, 0, 5]),
                },
                BoundParameter {
                    name: "col1".into(),
                    column_type: ColumnType::Unknown,
                    bytes: None,
                },
            ]
        );
    }

    #[test]
    fn rebinding_replaces_the_value() {
        let mut statement = WireStatement::new("SELECT ?", 1);
        statement.bind(&Slot::Index(0), NativeValue::Int32(1)).unwrap();
        statement.bind(&Slot::Index(0), NativeValue::Int32(2)).unwrap();
        let submission = statement.submit().unwrap();
        assert_eq!(submission.parameters()[0].bytes, Some(vec![0, 0, 0, 2]));
    }
}
