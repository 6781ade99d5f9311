// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error type shared by every fallible operation in the crate.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::value::Value;

/// The kind of container a list- or dict-typed property accepts.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    /// A [`CallbackList`](crate::CallbackList).
    List,
    /// A [`CallbackDict`](crate::CallbackDict).
    Dict,
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List => f.write_str("list"),
            Self::Dict => f.write_str("dict"),
        }
    }
}

/// Errors reported by registries, objects and containers.
///
/// None of these are ever raised from inside notification dispatch; expired
/// weak observers are pruned silently instead.
#[derive(Clone, PartialEq)]
pub enum PropertyError {
    /// An observer could not be called, e.g. its receiver is already gone.
    NotCallable,
    /// The name is not an attribute of the object's registry.
    UnknownAttribute {
        /// The name that failed to resolve.
        name: String,
    },
    /// The name resolves to an attribute that is not a callback property.
    NotCallbackProperty {
        /// The attribute name.
        name: String,
    },
    /// `remove_observer` was asked to remove an observer that is not registered.
    CallbackNotFound {
        /// The property the observer was expected on.
        name: String,
        /// A description of the missing observer.
        callback: String,
    },
    /// A value outside of a selection property's valid choices.
    InvalidChoice {
        /// The rejected value.
        value: Value,
        /// The valid choices at the time of the assignment.
        choices: Vec<Value>,
    },
    /// A validator rejected the value.
    Validation {
        /// Validator supplied message.
        message: String,
    },
    /// A list-typed property was given something other than a list (or a
    /// dict-typed property something other than a dict).
    WrongContainerType {
        /// The property name.
        name: String,
        /// The container kind the property accepts.
        expected: ContainerKind,
    },
    /// A selection-only operation was used on a property without choices.
    NotASelection {
        /// The property name.
        name: String,
    },
    /// A container index outside `0..len`.
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// The container length.
        len: usize,
    },
}

impl PropertyError {
    /// Convenience constructor for [`PropertyError::Validation`].
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

impl fmt::Debug for PropertyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PropertyError({self})")
    }
}

impl fmt::Display for PropertyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotCallable => f.write_str("only callable values can be stored as observers"),
            Self::UnknownAttribute { name } => write!(f, "object has no attribute '{name}'"),
            Self::NotCallbackProperty { name } => write!(f, "{name} is not a callback property"),
            Self::CallbackNotFound { callback, .. } => {
                write!(f, "Callback function not found: {callback}")
            }
            Self::InvalidChoice { value, choices } => {
                write!(f, "value {value} is not in valid choices: [")?;
                for (i, choice) in choices.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{choice}")?;
                }
                f.write_str("]")
            }
            Self::Validation { message } => f.write_str(message),
            Self::WrongContainerType { expected, .. } => {
                write!(f, "callback property should be a {expected}")
            }
            Self::NotASelection { name } => write!(f, "{name} is not a selection property"),
            Self::IndexOutOfRange { index, len } => {
                write!(f, "index {index} out of range for length {len}")
            }
        }
    }
}

impl core::error::Error for PropertyError {}
