use std::sync::Arc;

use smol_str::SmolStr;
use tracing::{debug, trace, warn};

use crate::codec;
use crate::error::BindError;
use crate::native::NativeStatement;
use crate::options::{BindOptions, HintPolicy};
use crate::registry::TypeRegistry;
use crate::types::{ColumnType, Slot};
use crate::value::HostValue;

/// A statement being bound, wrapping the driver's statement handle.
///
/// Every `bind_*` method returns `&mut Self` so calls can be chained. Once
/// the native statement has been handed off with [`Statement::take`] every
/// further bind fails with [`BindError::NullStatement`].
///
/// Values are bound with [`Statement::bind_by_index`] or
/// [`Statement::bind_by_name`], optionally with a type hint, or with one of
/// the typed entry points such as [`Statement::bind_timestamp`] which bind
/// as a fixed column type.
#[derive(Debug)]
pub struct Statement<S> {
    native: Option<S>,
    registry: Arc<TypeRegistry>,
    options: BindOptions,
}

macro_rules! typed_binders {
    ($($name:ident => $variant:ident),* $(,)?) => {
        $(
            #[doc = concat!("Bind `value` into `slot` as [`ColumnType::", stringify!($variant), "`].")]
            pub fn $name<V: Into<HostValue>>(
                &mut self,
                slot: impl Into<Slot>,
                value: V,
            ) -> Result<&mut Self, BindError> {
                self.bind_as(slot.into(), &value.into(), &ColumnType::$variant)
            }
        )*
    };
}

impl<S: NativeStatement> Statement<S> {
    pub fn new(native: S, registry: Arc<TypeRegistry>) -> Self {
        Statement {
            native: Some(native),
            registry,
            options: BindOptions::default(),
        }
    }

    pub fn with_options(mut self, options: BindOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &BindOptions {
        &self.options
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    pub fn parameter_count(&self) -> Result<usize, BindError> {
        self.native
            .as_ref()
            .map(NativeStatement::parameter_count)
            .ok_or(BindError::NullStatement)
    }

    /// Hand the native statement off, typically for execution.
    pub fn take(&mut self) -> Result<S, BindError> {
        self.native.take().ok_or(BindError::NullStatement)
    }

    pub fn into_native(self) -> Option<S> {
        self.native
    }

    /// Bind `value` into `slot`. `hint` names the column type to bind as,
    /// `None` binds according to the value's own type.
    pub fn bind<V: Into<HostValue>>(
        &mut self,
        slot: impl Into<Slot>,
        value: V,
        hint: Option<&str>,
    ) -> Result<&mut Self, BindError> {
        let column_type = self.resolve_hint(hint)?;
        self.bind_as(slot.into(), &value.into(), &column_type)
    }

    pub fn bind_by_index<V: Into<HostValue>>(
        &mut self,
        index: usize,
        value: V,
        hint: Option<&str>,
    ) -> Result<&mut Self, BindError> {
        self.bind(Slot::Index(index), value, hint)
    }

    pub fn bind_by_name<V: Into<HostValue>>(
        &mut self,
        name: &str,
        value: V,
        hint: Option<&str>,
    ) -> Result<&mut Self, BindError> {
        self.bind(Slot::from(name), value, hint)
    }

    pub fn bind_null(&mut self, slot: impl Into<Slot>) -> Result<&mut Self, BindError> {
        self.bind_as(slot.into(), &HostValue::Null, &ColumnType::Unknown)
    }

    typed_binders! {
        bind_text => Text,
        bind_ascii => Ascii,
        bind_blob => Blob,
        bind_inet => Inet,
        bind_boolean => Boolean,
        bind_tinyint => TinyInt,
        bind_smallint => SmallInt,
        bind_int => Int,
        bind_bigint => BigInt,
        bind_counter => Counter,
        bind_varint => VarInt,
        bind_float => Float,
        bind_double => Double,
        bind_decimal => Decimal,
        bind_uuid => Uuid,
        bind_timeuuid => TimeUuid,
        bind_date => Date,
        bind_time => Time,
        bind_timestamp => Timestamp,
    }

    /// Bind a list (or set) value as a `list`. `element_hint` is the type of
    /// each element, e.g. `"int"`.
    pub fn bind_list<V: Into<HostValue>>(
        &mut self,
        slot: impl Into<Slot>,
        value: V,
        element_hint: Option<&str>,
    ) -> Result<&mut Self, BindError> {
        let element = self.resolve_hint(element_hint)?;
        self.bind_as(slot.into(), &value.into(), &ColumnType::list(element))
    }

    pub fn bind_set<V: Into<HostValue>>(
        &mut self,
        slot: impl Into<Slot>,
        value: V,
        element_hint: Option<&str>,
    ) -> Result<&mut Self, BindError> {
        let element = self.resolve_hint(element_hint)?;
        self.bind_as(slot.into(), &value.into(), &ColumnType::set(element))
    }

    pub fn bind_map<V: Into<HostValue>>(
        &mut self,
        slot: impl Into<Slot>,
        value: V,
        key_hint: Option<&str>,
        value_hint: Option<&str>,
    ) -> Result<&mut Self, BindError> {
        let key = self.resolve_hint(key_hint)?;
        let value_type = self.resolve_hint(value_hint)?;
        self.bind_as(slot.into(), &value.into(), &ColumnType::map(key, value_type))
    }

    /// `Unknown` for no hint, or for an unrecognised hint under the lenient
    /// policy.
    fn resolve_hint(&self, hint: Option<&str>) -> Result<ColumnType, BindError> {
        let Some(hint) = hint else {
            return Ok(ColumnType::Unknown);
        };
        match (self.registry.resolve(hint), self.options.hint_policy) {
            (Some(column_type), _) => Ok(column_type),
            (None, HintPolicy::Lenient) => {
                debug!(hint, "unrecognised type hint, binding with the default mapping");
                Ok(ColumnType::Unknown)
            }
            (None, HintPolicy::Strict) => Err(BindError::UnknownTypeHint(SmolStr::new(hint))),
        }
    }

    fn bind_as(
        &mut self,
        slot: Slot,
        value: &HostValue,
        column_type: &ColumnType,
    ) -> Result<&mut Self, BindError> {
        let native = self.native.as_mut().ok_or(BindError::NullStatement)?;
        trace!(%slot, value = value.type_name(), %column_type, "binding value");
        codec::bind_value(native, &slot, value, column_type, &self.options).inspect_err(|e| {
            warn!(%slot, error = %e, "failed to bind value");
        })?;
        Ok(self)
    }
}
