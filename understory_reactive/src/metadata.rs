// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Callback property metadata.
//!
//! This module provides [`PropertyMetadata`] for storing the declared
//! configuration of a callback property and [`PropertyMetadataBuilder`] for
//! ergonomic construction.

use alloc::rc::Rc;
use core::fmt;

use crate::error::PropertyError;
use crate::object::ReactiveObject;
use crate::selection::SelectionMetadata;
use crate::value::Value;

/// A validator. It receives the proposed value and returns the value to store,
/// or an error to reject the assignment.
pub type Validator = Rc<dyn Fn(&Value) -> Result<Value, PropertyError>>;

/// Callback for coercing a property value before it's stored.
pub type CoerceValueCallback = Rc<dyn Fn(Value) -> Value>;

/// Produces the initial value for one instance.
pub type DefaultFactory = Rc<dyn Fn() -> Value>;

/// Reads a computed property from its object.
pub type ComputedGetter = Rc<dyn Fn(&ReactiveObject) -> Value>;

/// Writes a computed property, usually into other state of the object.
pub type ComputedSetter = Rc<dyn Fn(&ReactiveObject, Value) -> Result<(), PropertyError>>;

/// Where a property's initial value comes from.
#[derive(Clone)]
pub enum DefaultValue {
    /// A fixed value, cloned for each instance.
    Value(Value),
    /// A factory called once per instance on first access.
    Factory(DefaultFactory),
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

/// What values a property accepts and how it stores them.
#[derive(Clone, Debug)]
pub enum PropertyKind {
    /// Any value, stored as given.
    Scalar,
    /// Only lists. Each assignment is stored in a fresh
    /// [`CallbackList`](crate::CallbackList) whose mutations notify the
    /// property's observers.
    List,
    /// Only dicts, with the same wrapping as [`PropertyKind::List`].
    Dict,
    /// `None` or one of a dynamic set of choices.
    Selection(SelectionMetadata),
    /// No stored value: reads go through a getter and writes through a
    /// setter. See [`PropertyMetadataBuilder::computed`].
    Computed(Computed),
}

/// Getter and setter of a computed property.
#[derive(Clone)]
pub struct Computed {
    get: ComputedGetter,
    set: ComputedSetter,
}

impl Computed {
    /// Runs the getter.
    #[must_use]
    pub fn get(&self, object: &ReactiveObject) -> Value {
        (self.get)(object)
    }

    /// Runs the setter.
    ///
    /// # Errors
    ///
    /// Whatever the setter returns.
    pub fn set(&self, object: &ReactiveObject, value: Value) -> Result<(), PropertyError> {
        (self.set)(object, value)
    }
}

impl fmt::Debug for Computed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Computed(..)")
    }
}

/// Metadata for a callback property.
///
/// # Example
///
/// ```rust
/// use understory_reactive::{PropertyMetadataBuilder, Value};
///
/// let metadata = PropertyMetadataBuilder::new(10)
///     .coerce(|v| match v {
///         Value::Int(i) => Value::Int(i.clamp(0, 100)),
///         other => other,
///     })
///     .doc("Opacity in percent")
///     .build();
///
/// assert_eq!(metadata.initial_value(), Value::Int(10));
/// assert_eq!(metadata.validate(Value::Int(150)).unwrap(), Value::Int(100));
/// assert_eq!(metadata.doc(), Some("Opacity in percent"));
/// ```
#[derive(Clone)]
pub struct PropertyMetadata {
    default: DefaultValue,
    kind: PropertyKind,
    validator: Option<Validator>,
    coerce: Option<CoerceValueCallback>,
    doc: Option<&'static str>,
}

impl PropertyMetadata {
    /// Metadata for a plain property with the given default.
    #[must_use]
    pub fn new(default: impl Into<Value>) -> Self {
        PropertyMetadataBuilder::new(default).build()
    }

    /// Returns the default source.
    #[must_use]
    #[inline]
    pub fn default_value(&self) -> &DefaultValue {
        &self.default
    }

    /// Returns the property kind.
    #[must_use]
    #[inline]
    pub fn kind(&self) -> &PropertyKind {
        &self.kind
    }

    /// Returns the selection metadata for selection properties.
    #[must_use]
    pub fn selection(&self) -> Option<&SelectionMetadata> {
        match &self.kind {
            PropertyKind::Selection(selection) => Some(selection),
            _ => None,
        }
    }

    /// Returns the getter and setter of computed properties.
    #[must_use]
    pub fn computed(&self) -> Option<&Computed> {
        match &self.kind {
            PropertyKind::Computed(computed) => Some(computed),
            _ => None,
        }
    }

    /// Returns the docstring, if any.
    #[must_use]
    #[inline]
    pub fn doc(&self) -> Option<&'static str> {
        self.doc
    }

    /// Produces a fresh initial value for one instance.
    ///
    /// Factories are called every time. Selection properties without an
    /// explicit default start at the fallback choice for their default
    /// choices.
    #[must_use]
    pub fn initial_value(&self) -> Value {
        match (&self.default, &self.kind) {
            (DefaultValue::Factory(factory), _) => factory(),
            (DefaultValue::Value(Value::None), PropertyKind::Selection(selection)) => {
                selection.fallback(&Value::None, &selection.valid_default_choices())
            }
            (DefaultValue::Value(value), _) => value.clone(),
        }
    }

    /// Runs the declared validator, then the coerce callback.
    ///
    /// # Errors
    ///
    /// Whatever the validator returns.
    pub fn validate(&self, value: Value) -> Result<Value, PropertyError> {
        let value = match &self.validator {
            Some(validator) => validator(&value)?,
            None => value,
        };
        Ok(match &self.coerce {
            Some(coerce) => coerce(value),
            None => value,
        })
    }

    /// Returns whether a validator is set.
    #[must_use]
    #[inline]
    pub fn has_validator(&self) -> bool {
        self.validator.is_some()
    }
}

impl fmt::Debug for PropertyMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyMetadata")
            .field("default", &self.default)
            .field("kind", &self.kind)
            .field("has_validator", &self.validator.is_some())
            .field("has_coerce_callback", &self.coerce.is_some())
            .field("doc", &self.doc)
            .finish()
    }
}

/// Builder for [`PropertyMetadata`].
///
/// # Example
///
/// ```rust
/// use understory_reactive::{PropertyError, PropertyMetadataBuilder, Value};
///
/// let items = PropertyMetadataBuilder::list().doc("Layer names").build();
/// let count = PropertyMetadataBuilder::new(0)
///     .validator(|v| match v.as_int() {
///         Some(i) if i >= 0 => Ok(v.clone()),
///         _ => Err(PropertyError::validation("count must be a non-negative integer")),
///     })
///     .build();
///
/// assert!(count.validate(Value::Int(-1)).is_err());
/// assert!(items.initial_value().as_list().is_some());
/// ```
pub struct PropertyMetadataBuilder {
    default: DefaultValue,
    kind: PropertyKind,
    validator: Option<Validator>,
    coerce: Option<CoerceValueCallback>,
    doc: Option<&'static str>,
}

impl fmt::Debug for PropertyMetadataBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyMetadataBuilder")
            .field("default", &self.default)
            .field("kind", &self.kind)
            .field("has_validator", &self.validator.is_some())
            .field("has_coerce_callback", &self.coerce.is_some())
            .field("doc", &self.doc)
            .finish()
    }
}

impl PropertyMetadataBuilder {
    /// Creates a builder for a plain property with the given default.
    #[must_use]
    pub fn new(default: impl Into<Value>) -> Self {
        Self::with_kind(PropertyKind::Scalar, DefaultValue::Value(default.into()))
    }

    /// Creates a builder for a list property that defaults to an empty list.
    #[must_use]
    pub fn list() -> Self {
        Self::with_kind(PropertyKind::List, DefaultValue::Factory(Rc::new(|| Value::list([]))))
    }

    /// Creates a builder for a dict property that defaults to an empty dict.
    #[must_use]
    pub fn dict() -> Self {
        Self::with_kind(
            PropertyKind::Dict,
            DefaultValue::Factory(Rc::new(|| Value::dict::<&str>([]))),
        )
    }

    /// Creates a builder for a computed property.
    ///
    /// Reading the property calls `get`. Writing it runs the validators, then
    /// `set`, then reads the result back through `get`; observers are notified
    /// when that differs from the value before the write. Delay, ignore and
    /// disable apply as for stored properties. The default is unused.
    ///
    /// ```rust
    /// use std::rc::Rc;
    /// use understory_reactive::{
    ///     PropertyMetadata, PropertyMetadataBuilder, PropertyRegistry, ReactiveObject, Value,
    /// };
    ///
    /// let mut registry = PropertyRegistry::new();
    /// registry.register("celsius", PropertyMetadata::new(0.0));
    /// registry.register(
    ///     "fahrenheit",
    ///     PropertyMetadataBuilder::computed(
    ///         |o| {
    ///             let c = o.get("celsius").ok().and_then(|v| v.as_float()).unwrap_or(0.0);
    ///             Value::Float(c * 9.0 / 5.0 + 32.0)
    ///         },
    ///         |o, v| o.set("celsius", (v.as_float().unwrap_or(32.0) - 32.0) * 5.0 / 9.0),
    ///     )
    ///     .build(),
    /// );
    /// let thermometer = ReactiveObject::new(&Rc::new(registry));
    ///
    /// assert_eq!(thermometer.get("fahrenheit"), Ok(Value::Float(32.0)));
    /// thermometer.set("fahrenheit", 212.0).unwrap();
    /// assert_eq!(thermometer.get("celsius"), Ok(Value::Float(100.0)));
    /// ```
    #[must_use]
    pub fn computed<G, S>(get: G, set: S) -> Self
    where
        G: Fn(&ReactiveObject) -> Value + 'static,
        S: Fn(&ReactiveObject, Value) -> Result<(), PropertyError> + 'static,
    {
        let computed = Computed {
            get: Rc::new(get),
            set: Rc::new(set),
        };
        Self::with_kind(PropertyKind::Computed(computed), DefaultValue::Value(Value::None))
    }

    pub(crate) fn with_kind(kind: PropertyKind, default: DefaultValue) -> Self {
        Self {
            default,
            kind,
            validator: None,
            coerce: None,
            doc: None,
        }
    }

    /// Replaces the default with a fixed value.
    #[must_use]
    pub fn default(mut self, default: impl Into<Value>) -> Self {
        self.default = DefaultValue::Value(default.into());
        self
    }

    /// Replaces the default with a factory called once per instance.
    #[must_use]
    pub fn factory<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Value + 'static,
    {
        self.default = DefaultValue::Factory(Rc::new(factory));
        self
    }

    /// Sets the declared validator. It runs before any instance validators.
    #[must_use]
    pub fn validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, PropertyError> + 'static,
    {
        self.validator = Some(Rc::new(validator));
        self
    }

    /// Sets a callback to coerce values after validation.
    #[must_use]
    pub fn coerce<F>(mut self, callback: F) -> Self
    where
        F: Fn(Value) -> Value + 'static,
    {
        self.coerce = Some(Rc::new(callback));
        self
    }

    /// Sets the docstring.
    #[must_use]
    pub fn doc(mut self, doc: &'static str) -> Self {
        self.doc = Some(doc);
        self
    }

    /// Builds the [`PropertyMetadata`].
    #[must_use]
    pub fn build(self) -> PropertyMetadata {
        PropertyMetadata {
            default: self.default,
            kind: self.kind,
            validator: self.validator,
            coerce: self.coerce,
            doc: self.doc,
        }
    }
}
