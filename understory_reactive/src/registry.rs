// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Attribute registry.
//!
//! This module provides [`PropertyRegistry`], which plays the role of a class:
//! it declares the callback properties, aliases and plain attributes every
//! [`ReactiveObject`] built from it has.

use alloc::vec::Vec;
use core::fmt;
use hashbrown::HashMap;

use crate::alias::{AliasMetadata, AliasRef};
use crate::callback::{Callback, DeliveryMode};
use crate::error::PropertyError;
use crate::id::PropertyId;
use crate::metadata::{PropertyKind, PropertyMetadata};
use crate::object::ReactiveObject;
use crate::selection::Choice;
use crate::value::Value;

/// What a registered name refers to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    /// A callback property.
    Property,
    /// An alias redirecting to another name.
    Alias,
    /// An attribute that exists but is not observable.
    Plain,
}

enum Attribute {
    Property(PropertyMetadata),
    Alias(AliasMetadata),
    Plain,
}

struct Registration {
    name: &'static str,
    attribute: Attribute,
}

impl Registration {
    fn kind(&self) -> AttributeKind {
        match self.attribute {
            Attribute::Property(_) => AttributeKind::Property,
            Attribute::Alias(_) => AttributeKind::Alias,
            Attribute::Plain => AttributeKind::Plain,
        }
    }
}

/// A registry of attributes, shared by every object of one "type".
///
/// Attributes are registered once, before any object is created, and the
/// registry is then shared behind an [`Rc`](alloc::rc::Rc).
///
/// # Example
///
/// ```rust
/// use std::rc::Rc;
/// use understory_reactive::{AliasMetadata, PropertyMetadata, PropertyRegistry, ReactiveObject, Value};
///
/// let mut registry = PropertyRegistry::new();
/// registry.register("line_color", PropertyMetadata::new("red"));
/// registry.register_alias("color", AliasMetadata::new("line_color"));
/// registry.register_plain("label");
///
/// assert!(registry.is_callback_property("line_color"));
/// assert!(registry.is_callback_property("color"));
/// assert!(registry.is_alias("color"));
/// assert!(!registry.is_callback_property("label"));
/// assert_eq!(registry.callback_properties(), ["line_color"]);
///
/// let object = ReactiveObject::new(&Rc::new(registry));
/// object.set("color", "blue").unwrap();
/// assert_eq!(object.get("line_color").unwrap(), Value::from("blue"));
/// ```
#[derive(Default)]
pub struct PropertyRegistry {
    attributes: Vec<Registration>,
    by_name: HashMap<&'static str, PropertyId>,
}

impl PropertyRegistry {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a callback property.
    ///
    /// # Panics
    ///
    /// Panics if the name is already registered, or if more than 65,535
    /// attributes are registered.
    pub fn register(&mut self, name: &'static str, metadata: PropertyMetadata) -> PropertyId {
        self.push(name, Attribute::Property(metadata))
    }

    /// Registers an alias. The target does not need to be registered yet;
    /// call [`validate`](Self::validate) once registration is done to catch
    /// aliases that lead nowhere.
    ///
    /// # Panics
    ///
    /// As [`register`](Self::register).
    pub fn register_alias(&mut self, name: &'static str, alias: AliasMetadata) -> PropertyId {
        self.push(name, Attribute::Alias(alias))
    }

    /// Registers a plain attribute. Plain attributes hold no observable state;
    /// registering one makes observer operations on that name fail with
    /// [`PropertyError::NotCallbackProperty`] rather than
    /// [`PropertyError::UnknownAttribute`].
    ///
    /// # Panics
    ///
    /// As [`register`](Self::register).
    pub fn register_plain(&mut self, name: &'static str) -> PropertyId {
        self.push(name, Attribute::Plain)
    }

    fn push(&mut self, name: &'static str, attribute: Attribute) -> PropertyId {
        assert!(
            !self.by_name.contains_key(name),
            "Attribute '{name}' is already registered"
        );
        assert!(
            self.attributes.len() < u16::MAX as usize,
            "Too many attributes registered (max {})",
            u16::MAX
        );

        #[expect(clippy::cast_possible_truncation, reason = "checked above")]
        let id = PropertyId::new(self.attributes.len() as u16);

        self.attributes.push(Registration { name, attribute });
        self.by_name.insert(name, id);
        id
    }

    /// Returns the number of registered attributes of every kind.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Looks up an attribute by name.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<PropertyId> {
        self.by_name.get(name).copied()
    }

    /// Returns the name of an attribute.
    #[must_use]
    pub fn name(&self, id: PropertyId) -> Option<&'static str> {
        self.attributes.get(id.slot()).map(|r| r.name)
    }

    /// Returns what `name` refers to.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<AttributeKind> {
        self.by_name(name)
            .and_then(|id| self.attributes.get(id.slot()))
            .map(Registration::kind)
    }

    /// Returns `true` if `name` is a callback property, or an alias that
    /// resolves to one.
    #[must_use]
    pub fn is_callback_property(&self, name: &str) -> bool {
        self.resolve_quiet(name).is_ok()
    }

    /// Returns `true` if `name` is an alias.
    #[must_use]
    pub fn is_alias(&self, name: &str) -> bool {
        self.attribute(name) == Some(AttributeKind::Alias)
    }

    /// Names of the callback properties in registration order. Aliases are
    /// not included.
    #[must_use]
    pub fn callback_properties(&self) -> Vec<&'static str> {
        self.iter_callback_properties().map(|p| p.name()).collect()
    }

    /// Iterates over the callback properties in registration order. Aliases
    /// are not included.
    pub fn iter_callback_properties(&self) -> impl Iterator<Item = PropertyRef<'_>> + '_ {
        (0..self.attributes.len())
            .filter_map(|index| u16::try_from(index).ok())
            .filter_map(|index| self.property_by_id(PropertyId::new(index)))
    }

    /// The class-level view of the callback property `name`.
    ///
    /// Aliases are not followed; use [`alias`](Self::alias) for them.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<PropertyRef<'_>> {
        self.by_name(name).and_then(|id| self.property_by_id(id))
    }

    /// The class-level view of a callback property by id.
    #[must_use]
    pub fn property_by_id(&self, id: PropertyId) -> Option<PropertyRef<'_>> {
        let registration = self.attributes.get(id.slot())?;
        match &registration.attribute {
            Attribute::Property(metadata) => Some(PropertyRef {
                id,
                name: registration.name,
                metadata,
            }),
            _ => None,
        }
    }

    /// The class-level view of the alias `name`.
    #[must_use]
    pub fn alias(&self, name: &str) -> Option<AliasRef<'_>> {
        let registration = self.attributes.get(self.by_name(name)?.slot())?;
        match &registration.attribute {
            Attribute::Alias(alias) => Some(AliasRef::new(self, registration.name, alias)),
            _ => None,
        }
    }

    /// Returns the metadata of a callback property.
    #[must_use]
    pub fn metadata(&self, id: PropertyId) -> Option<&PropertyMetadata> {
        match &self.attributes.get(id.slot())?.attribute {
            Attribute::Property(metadata) => Some(metadata),
            _ => None,
        }
    }

    /// Names of the aliases that do not lead to a callback property, in
    /// registration order.
    pub fn dangling_aliases(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.attributes
            .iter()
            .filter(|r| matches!(r.attribute, Attribute::Alias(_)))
            .map(|r| r.name)
            .filter(|name| self.resolve_quiet(name).is_err())
    }

    /// Checks that every alias resolves to a callback property.
    ///
    /// # Errors
    ///
    /// The resolution error of the first alias that does not, as
    /// [`ReactiveObject::get`](crate::ReactiveObject::get) would report it.
    pub fn validate(&self) -> Result<(), PropertyError> {
        match self.dangling_aliases().next() {
            Some(name) => self.resolve_quiet(name).map(|_| ()),
            None => Ok(()),
        }
    }

    /// Resolves `name` to a callback property, following aliases and logging
    /// a warning for each deprecated alias on the way.
    pub(crate) fn resolve(&self, name: &str) -> Result<PropertyId, PropertyError> {
        self.resolve_with(name, true)
    }

    /// Like [`resolve`](Self::resolve), without warnings.
    pub(crate) fn resolve_quiet(&self, name: &str) -> Result<PropertyId, PropertyError> {
        self.resolve_with(name, false)
    }

    fn resolve_with(&self, name: &str, warn: bool) -> Result<PropertyId, PropertyError> {
        let mut current = name;
        // An alias chain can't be longer than the registry; anything longer loops.
        for _ in 0..=self.attributes.len() {
            let Some(id) = self.by_name(current) else {
                break;
            };
            match &self.attributes[id.slot()].attribute {
                Attribute::Property(_) => return Ok(id),
                Attribute::Plain => {
                    return Err(PropertyError::NotCallbackProperty { name: name.into() });
                }
                Attribute::Alias(alias) => {
                    if warn {
                        alias.warn(current);
                    }
                    current = alias.target();
                }
            }
        }
        Err(PropertyError::UnknownAttribute { name: name.into() })
    }

    pub(crate) fn callback_property_ids(&self) -> impl Iterator<Item = PropertyId> + '_ {
        self.iter_callback_properties().map(|p| p.id())
    }
}

impl fmt::Debug for PropertyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.attributes.iter().map(|r| (r.name, r.kind())))
            .finish()
    }
}

/// A class-level view of one callback property.
///
/// This is the descriptor itself, as opposed to its value on an object:
/// reading it never runs validation or touches instance state.
#[derive(Clone, Copy)]
pub struct PropertyRef<'r> {
    id: PropertyId,
    name: &'static str,
    metadata: &'r PropertyMetadata,
}

impl<'r> PropertyRef<'r> {
    /// The property id.
    #[must_use]
    pub fn id(&self) -> PropertyId {
        self.id
    }

    /// The property name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The declared metadata.
    #[must_use]
    pub fn metadata(&self) -> &'r PropertyMetadata {
        self.metadata
    }

    /// The docstring.
    #[must_use]
    pub fn doc(&self) -> Option<&'static str> {
        self.metadata.doc()
    }

    /// Returns `true` for selection properties.
    #[must_use]
    pub fn is_selection(&self) -> bool {
        matches!(self.metadata.kind(), PropertyKind::Selection(_))
    }

    /// The declared choices of a selection property.
    #[must_use]
    pub fn default_choices(&self) -> Option<&'r [Choice]> {
        self.metadata.selection().map(|s| s.default_choices())
    }

    /// Reads this property on `object`.
    ///
    /// # Errors
    ///
    /// As [`ReactiveObject::get`].
    pub fn get(&self, object: &ReactiveObject) -> Result<Value, PropertyError> {
        object.get(self.name)
    }

    /// Writes this property on `object`.
    ///
    /// # Errors
    ///
    /// As [`ReactiveObject::set`].
    pub fn set(&self, object: &ReactiveObject, value: impl Into<Value>) -> Result<(), PropertyError> {
        object.set(self.name, value)
    }

    /// Adds an observer for this property on `object`.
    ///
    /// # Errors
    ///
    /// As [`ReactiveObject::add_observer`].
    pub fn add_observer(
        &self,
        object: &ReactiveObject,
        callback: Callback,
        priority: i32,
        mode: DeliveryMode,
    ) -> Result<bool, PropertyError> {
        object.add_observer(self.name, callback, priority, mode)
    }

    /// Removes an observer for this property on `object`.
    ///
    /// # Errors
    ///
    /// As [`ReactiveObject::remove_observer`].
    pub fn remove_observer(
        &self,
        object: &ReactiveObject,
        callback: &Callback,
    ) -> Result<(), PropertyError> {
        object.remove_observer(self.name, callback)
    }
}

impl fmt::Debug for PropertyRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyRef")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("metadata", self.metadata)
            .finish()
    }
}
