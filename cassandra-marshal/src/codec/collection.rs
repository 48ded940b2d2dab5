use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use super::{read_value, Encoder};
use crate::error::{BindError, DecodeError};
use crate::native::{CollectionKind, NativeCollection, NativeStatement, NativeValue, RawValue};
use crate::options::BindOptions;
use crate::types::{ColumnType, Slot};
use crate::value::HostValue;

pub(crate) fn encode_collection<C: NativeCollection>(
    encoder: &Encoder<'_>,
    value: &HostValue,
    target: &ColumnType,
) -> Result<NativeValue<C>, BindError> {
    let collection = match (value, target) {
        (HostValue::List(items), ColumnType::List(element)) => {
            build(encoder, CollectionKind::List, items.iter(), element, target)
        }
        (HostValue::Set(items), ColumnType::List(element)) => {
            build(encoder, CollectionKind::List, items.iter(), element, target)
        }
        (HostValue::List(items), ColumnType::Set(element)) => {
            build(encoder, CollectionKind::Set, items.iter(), element, target)
        }
        (HostValue::Set(items), ColumnType::Set(element)) => {
            build(encoder, CollectionKind::Set, items.iter(), element, target)
        }
        (HostValue::Map(entries), ColumnType::Map(key, value)) => {
            build_map(encoder, entries.iter(), key, value, target)
        }
        _ => Err(encoder.mismatch(target, value)),
    }?;
    Ok(NativeValue::Collection(collection))
}

/// Encode and append every element. The first failure drops the partially
/// built collection and is returned.
fn build<'v, C, I>(
    encoder: &Encoder<'_>,
    kind: CollectionKind,
    elements: I,
    element_type: &ColumnType,
    target: &ColumnType,
) -> Result<C, BindError>
where
    C: NativeCollection,
    I: ExactSizeIterator<Item = &'v HostValue>,
{
    let mut collection = C::new(kind, elements.len());
    for element in elements {
        let native = encoder.encode(element, element_type)?;
        collection
            .append(native)
            .map_err(|e| encoder.rejected(target, e))?;
    }
    Ok(collection)
}

fn build_map<'v, C, I>(
    encoder: &Encoder<'_>,
    entries: I,
    key_type: &ColumnType,
    value_type: &ColumnType,
    target: &ColumnType,
) -> Result<C, BindError>
where
    C: NativeCollection,
    I: ExactSizeIterator<Item = (&'v HostValue, &'v HostValue)>,
{
    let mut collection = C::new(CollectionKind::Map, entries.len());
    for (key, value) in entries {
        let key = encoder.encode(key, key_type)?;
        collection
            .append(key)
            .map_err(|e| encoder.rejected(target, e))?;
        let value = encoder.encode(value, value_type)?;
        collection
            .append(value)
            .map_err(|e| encoder.rejected(target, e))?;
    }
    Ok(collection)
}

fn bind_built<S: NativeStatement>(
    statement: &mut S,
    encoder: &Encoder<'_>,
    built: Result<S::Collection, BindError>,
    target: &ColumnType,
) -> Result<(), BindError> {
    let collection = built.inspect_err(|e| {
        debug!(error = %e, column_type = %target, "discarding partially built collection");
    })?;
    encoder.bind(statement, NativeValue::Collection(collection), target)
}

/// Bind `elements` into `slot` as a `list`, in order.
///
/// `element_type` is the hint for every element, `None` lets each element
/// choose its own type.
pub fn bind_list<S: NativeStatement>(
    statement: &mut S,
    slot: &Slot,
    elements: &[HostValue],
    element_type: Option<&ColumnType>,
    options: &BindOptions,
) -> Result<(), BindError> {
    let encoder = Encoder::new(slot, options);
    let element_type = element_type.cloned().unwrap_or(ColumnType::Unknown);
    let target = ColumnType::list(element_type.clone());
    let built = build(&encoder, CollectionKind::List, elements.iter(), &element_type, &target);
    bind_built(statement, &encoder, built, &target)
}

/// Bind `elements` into `slot` as a `set`. Elements are sent in iteration
/// order, duplicates included.
pub fn bind_set<'v, S, I>(
    statement: &mut S,
    slot: &Slot,
    elements: I,
    element_type: Option<&ColumnType>,
    options: &BindOptions,
) -> Result<(), BindError>
where
    S: NativeStatement,
    I: IntoIterator<Item = &'v HostValue>,
    I::IntoIter: ExactSizeIterator,
{
    let encoder = Encoder::new(slot, options);
    let element_type = element_type.cloned().unwrap_or(ColumnType::Unknown);
    let target = ColumnType::set(element_type.clone());
    let built = build(&encoder, CollectionKind::Set, elements.into_iter(), &element_type, &target);
    bind_built(statement, &encoder, built, &target)
}

/// Bind `entries` into `slot` as a `map`. Keys and values are hinted
/// independently.
pub fn bind_map<'v, S, I>(
    statement: &mut S,
    slot: &Slot,
    entries: I,
    key_type: Option<&ColumnType>,
    value_type: Option<&ColumnType>,
    options: &BindOptions,
) -> Result<(), BindError>
where
    S: NativeStatement,
    I: IntoIterator<Item = (&'v HostValue, &'v HostValue)>,
    I::IntoIter: ExactSizeIterator,
{
    let encoder = Encoder::new(slot, options);
    let key_type = key_type.cloned().unwrap_or(ColumnType::Unknown);
    let value_type = value_type.cloned().unwrap_or(ColumnType::Unknown);
    let target = ColumnType::map(key_type.clone(), value_type.clone());
    let built = build_map(&encoder, entries.into_iter(), &key_type, &value_type, &target);
    bind_built(statement, &encoder, built, &target)
}

/// Decode a `list` (or `set`) cell, in wire order.
pub fn read_list(raw: RawValue<'_>) -> Result<Vec<HostValue>, DecodeError> {
    raw.iter_collection()?
        .map(|element| element.and_then(read_value))
        .collect()
}

pub fn read_set(raw: RawValue<'_>) -> Result<BTreeSet<HostValue>, DecodeError> {
    raw.iter_collection()?
        .map(|element| element.and_then(read_value))
        .collect()
}

pub fn read_map(raw: RawValue<'_>) -> Result<BTreeMap<HostValue, HostValue>, DecodeError> {
    raw.iter_map()?
        .map(|entry| {
            let (key, value) = entry?;
            Ok((read_value(key)?, read_value(value)?))
        })
        .collect()
}
