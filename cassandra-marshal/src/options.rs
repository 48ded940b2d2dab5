use bigdecimal::num_bigint::BigInt;
use bigdecimal::ToPrimitive;
use serde::Deserialize;

use crate::types::ColumnType;

/// What to do with a type hint the registry does not recognise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HintPolicy {
    /// Ignore the hint and bind as if none had been given.
    #[default]
    Lenient,
    /// Fail the bind with [`crate::BindError::UnknownTypeHint`].
    Strict,
}

/// Which CQL type a generic [`crate::HostValue::Integer`] binds as when no
/// hint is given.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegerPolicy {
    /// `bigint` for anything which fits 64 bits.
    #[default]
    Widen,
    /// `int` if the value fits 32 bits, otherwise `bigint`.
    Narrowest,
}

impl IntegerPolicy {
    /// Integers beyond 64 bits are `varint` under either policy.
    pub fn column_type_for(&self, value: &BigInt) -> ColumnType {
        match self {
            IntegerPolicy::Narrowest if value.to_i32().is_some() => ColumnType::Int,
            _ if value.to_i64().is_some() => ColumnType::BigInt,
            _ => ColumnType::VarInt,
        }
    }
}

/// Options controlling how a [`crate::Statement`] turns values into
/// parameters.
///
/// ```
/// # use cassandra_marshal::{BindOptions, HintPolicy, IntegerPolicy};
/// let options = BindOptions::default()
///     .with_hint_policy(HintPolicy::Strict)
///     .with_integer_policy(IntegerPolicy::Narrowest);
/// assert_eq!(options.hint_policy, HintPolicy::Strict);
/// ```
///
/// Hosts which keep their settings in a file can deserialize this directly,
/// missing fields take their defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BindOptions {
    pub hint_policy: HintPolicy,
    pub integer_policy: IntegerPolicy,
}

impl BindOptions {
    pub fn with_hint_policy(mut self, policy: HintPolicy) -> Self {
        self.hint_policy = policy;
        self
    }

    pub fn set_hint_policy(&mut self, policy: HintPolicy) -> &mut Self {
        self.hint_policy = policy;
        self
    }

    pub fn with_integer_policy(mut self, policy: IntegerPolicy) -> Self {
        self.integer_policy = policy;
        self
    }

    pub fn set_integer_policy(&mut self, policy: IntegerPolicy) -> &mut Self {
        self.integer_policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_are_lenient_and_wide() {
        let options = BindOptions::default();
        assert_eq!(options.hint_policy, HintPolicy::Lenient);
        assert_eq!(options.integer_policy, IntegerPolicy::Widen);
    }

    #[test]
    fn deserializes_partial_config() {
        let options: BindOptions = serde_json::from_str(r#"{"hint_policy": "strict"}"#).unwrap();
        assert_eq!(
            options,
            BindOptions::default().with_hint_policy(HintPolicy::Strict)
        );
    }

    #[test]
    fn integer_policy_boundaries() {
        let narrow = IntegerPolicy::Narrowest;
        assert_eq!(narrow.column_type_for(&BigInt::from(i32::MAX)), ColumnType::Int);
        assert_eq!(
            narrow.column_type_for(&(BigInt::from(i32::MAX) + 1)),
            ColumnType::BigInt
        );
        assert_eq!(
            IntegerPolicy::Widen.column_type_for(&(BigInt::from(i64::MIN) - 1)),
            ColumnType::VarInt
        );
    }
}
