// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property aliases.
//!
//! An alias is a name that redirects to another attribute of the same
//! registry. It stores nothing: every read, write, validation and
//! notification happens on the target. Deprecated aliases log a warning
//! through `tracing` (target `understory_reactive::deprecation`) every time
//! they are used.

use alloc::borrow::Cow;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use crate::error::PropertyError;
use crate::object::ReactiveObject;
use crate::registry::{PropertyRef, PropertyRegistry};
use crate::selection::Choice;
use crate::value::Value;

/// Declared configuration of an alias.
///
/// # Example
///
/// ```rust
/// use understory_reactive::AliasMetadata;
///
/// let silent = AliasMetadata::new("line_color");
/// assert!(!silent.is_deprecated());
///
/// // A custom message implies deprecation.
/// let loud = AliasMetadata::new("line_color").message("use line_color");
/// assert!(loud.is_deprecated());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AliasMetadata {
    target: &'static str,
    deprecated: bool,
    message: Option<Cow<'static, str>>,
}

impl AliasMetadata {
    /// A silent alias for `target`.
    #[must_use]
    pub fn new(target: &'static str) -> Self {
        Self {
            target,
            deprecated: false,
            message: None,
        }
    }

    /// Marks the alias as deprecated.
    #[must_use]
    pub fn deprecated(mut self, deprecated: bool) -> Self {
        self.deprecated = deprecated;
        self
    }

    /// Sets a custom deprecation message. This also marks the alias deprecated.
    #[must_use]
    pub fn message(mut self, message: impl Into<Cow<'static, str>>) -> Self {
        self.message = Some(message.into());
        self.deprecated = true;
        self
    }

    /// The name this alias redirects to.
    #[must_use]
    #[inline]
    pub fn target(&self) -> &'static str {
        self.target
    }

    /// Returns `true` if using the alias logs a deprecation warning.
    #[must_use]
    #[inline]
    pub fn is_deprecated(&self) -> bool {
        self.deprecated
    }

    /// Logs the deprecation warning for an alias registered as `name`, and
    /// returns the message. Silent aliases log nothing and return `None`.
    pub(crate) fn warn(&self, name: &str) -> Option<String> {
        if !self.deprecated {
            return None;
        }
        let message = match &self.message {
            Some(message) => String::from(message.as_ref()),
            None => format!("'{name}' is deprecated, use '{}' instead", self.target),
        };
        tracing::warn!(
            target: "understory_reactive::deprecation",
            alias = name,
            target_property = self.target,
            "{message}"
        );
        Some(message)
    }
}

/// A class-level view of an alias.
///
/// Returned by [`PropertyRegistry::alias`]. Operations that touch an instance
/// go through the alias name, so they warn when the alias is deprecated and
/// otherwise behave exactly like the target.
#[derive(Clone, Copy, Debug)]
pub struct AliasRef<'r> {
    registry: &'r PropertyRegistry,
    name: &'static str,
    metadata: &'r AliasMetadata,
}

impl<'r> AliasRef<'r> {
    pub(crate) fn new(
        registry: &'r PropertyRegistry,
        name: &'static str,
        metadata: &'r AliasMetadata,
    ) -> Self {
        Self {
            registry,
            name,
            metadata,
        }
    }

    /// The alias name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The name the alias redirects to.
    #[must_use]
    pub fn target_name(&self) -> &'static str {
        self.metadata.target()
    }

    /// Returns `true` if the alias is deprecated.
    #[must_use]
    pub fn is_deprecated(&self) -> bool {
        self.metadata.is_deprecated()
    }

    /// Logs the deprecation warning, if any, and returns its message.
    pub fn warn(&self) -> Option<String> {
        self.metadata.warn(self.name)
    }

    /// The property the alias ultimately resolves to, following alias chains.
    #[must_use]
    pub fn target_property(&self) -> Option<PropertyRef<'r>> {
        let id = self.registry.resolve_quiet(self.name).ok()?;
        self.registry.property_by_id(id)
    }

    /// The target's docstring.
    #[must_use]
    pub fn doc(&self) -> Option<&'static str> {
        self.target_property().and_then(|p| p.doc())
    }

    /// The target's declared choices, for selection targets.
    #[must_use]
    pub fn default_choices(&self) -> Option<&'r [Choice]> {
        self.target_property().and_then(|p| p.default_choices())
    }

    /// Reads the target on `object`.
    ///
    /// # Errors
    ///
    /// As [`ReactiveObject::get`].
    pub fn get(&self, object: &ReactiveObject) -> Result<Value, PropertyError> {
        object.get(self.name)
    }

    /// Writes the target on `object`.
    ///
    /// # Errors
    ///
    /// As [`ReactiveObject::set`]; validation errors are the target's.
    pub fn set(&self, object: &ReactiveObject, value: impl Into<Value>) -> Result<(), PropertyError> {
        object.set(self.name, value)
    }

    /// The target's current choices on `object`.
    ///
    /// # Errors
    ///
    /// As [`ReactiveObject::choices`].
    pub fn choices(&self, object: &ReactiveObject) -> Result<Vec<Choice>, PropertyError> {
        object.choices(self.name)
    }

    /// Replaces the target's choices on `object`.
    ///
    /// # Errors
    ///
    /// As [`ReactiveObject::set_choices`].
    pub fn set_choices(
        &self,
        object: &ReactiveObject,
        choices: impl IntoIterator<Item = Choice>,
    ) -> Result<(), PropertyError> {
        object.set_choices(self.name, choices)
    }

    /// Sets the target's display function on `object`.
    ///
    /// # Errors
    ///
    /// As [`ReactiveObject::set_display_func`].
    pub fn set_display_func<F>(&self, object: &ReactiveObject, display: F) -> Result<(), PropertyError>
    where
        F: Fn(&Value) -> String + 'static,
    {
        object.set_display_func(self.name, display)
    }

    /// The target's label for `value` on `object`.
    ///
    /// # Errors
    ///
    /// As [`ReactiveObject::display_label`].
    pub fn display_label(
        &self,
        object: &ReactiveObject,
        value: &Value,
    ) -> Result<Option<String>, PropertyError> {
        object.display_label(self.name, value)
    }
}
