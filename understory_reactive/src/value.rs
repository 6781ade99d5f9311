// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dynamic property values.
//!
//! This module provides [`Value`], the type stored by every callback property,
//! reactive container and selection choice. Scalars are stored inline;
//! containers and observable objects are stored as shared handles, so placing
//! the same list in two places shares it rather than copying it.

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cell::Cell;
use core::cmp::Ordering;
use core::fmt;

use crate::dict::CallbackDict;
use crate::list::CallbackList;
use crate::object::ReactiveObject;

/// A dynamically typed property value.
///
/// # Equality
///
/// - `Int` and `Float` compare numerically, so `Int(4) == Float(4.0)`.
/// - Lists and dicts compare by content (dict order is ignored).
/// - Objects compare by identity.
///
/// # Formatting
///
/// `Display` quotes strings, writes `None`, `True` and `False` for the
/// constants, and keeps the decimal point of whole floats (`None`, `'red'`,
/// `[4, 3.5]`, `{'a': 1}`). Error messages use this form. A list or dict that
/// contains itself prints `[...]` or `{...}` where it recurs.
///
/// # Example
///
/// ```rust
/// use understory_reactive::Value;
///
/// assert_eq!(Value::Int(4), Value::Float(4.0));
/// assert_eq!(Value::from("red").to_string(), "'red'");
/// assert_eq!(Value::list([4.into(), 3.5.into()]).to_string(), "[4, 3.5]");
/// ```
#[derive(Clone, Debug, Default)]
pub enum Value {
    /// The absence of a value.
    #[default]
    None,
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// A floating point number.
    Float(f64),
    /// A string.
    Str(String),
    /// A shared reactive list.
    List(CallbackList),
    /// A shared reactive dict.
    Dict(CallbackDict),
    /// A shared observable object.
    Object(ReactiveObject),
}

impl Value {
    /// Builds a new, unowned reactive list from `items`.
    pub fn list(items: impl IntoIterator<Item = Self>) -> Self {
        Self::List(items.into_iter().collect())
    }

    /// Builds a new, unowned reactive dict from `entries`.
    pub fn dict<K: Into<String>>(entries: impl IntoIterator<Item = (K, Self)>) -> Self {
        Self::Dict(entries.into_iter().collect())
    }

    /// Returns `true` for [`Value::None`].
    #[must_use]
    #[inline]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Returns `true` for lists and dicts.
    #[must_use]
    #[inline]
    pub fn is_container(&self) -> bool {
        matches!(self, Self::List(_) | Self::Dict(_))
    }

    /// Returns the boolean, if this is a `Bool`.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer, if this is an `Int`.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the number as `f64`, if this is an `Int` or a `Float`.
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns the string slice, if this is a `Str`.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the list handle, if this is a `List`.
    #[must_use]
    pub fn as_list(&self) -> Option<&CallbackList> {
        match self {
            Self::List(list) => Some(list),
            _ => None,
        }
    }

    /// Returns the dict handle, if this is a `Dict`.
    #[must_use]
    pub fn as_dict(&self) -> Option<&CallbackDict> {
        match self {
            Self::Dict(dict) => Some(dict),
            _ => None,
        }
    }

    /// Returns the object handle, if this is an `Object`.
    #[must_use]
    pub fn as_object(&self) -> Option<&ReactiveObject> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Returns `true` if both values are the same list, dict or object handle.
    ///
    /// Scalars never share a handle, even when equal.
    #[must_use]
    pub fn same_handle(&self, other: &Self) -> bool {
        match (self.handle_addr(), other.handle_addr()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// The allocation address of a handle value.
    pub(crate) fn handle_addr(&self) -> Option<usize> {
        match self {
            Self::List(list) => Some(list.addr()),
            Self::Dict(dict) => Some(dict.addr()),
            Self::Object(object) => Some(object.addr()),
            _ => None,
        }
    }

    /// A human readable label: strings are unquoted, everything else uses the
    /// `Display` representation.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Str(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Total order used by [`CallbackList::sort`].
    ///
    /// Values are ranked by kind first (`None`, booleans, numbers, strings,
    /// then handles) and compared within their kind. Handles and `NaN` compare
    /// equal to their peers, so a stable sort leaves them in place.
    pub(crate) fn sort_cmp(&self, other: &Self) -> Ordering {
        fn rank(value: &Value) -> u8 {
            match value {
                Value::None => 0,
                Value::Bool(_) => 1,
                Value::Int(_) | Value::Float(_) => 2,
                Value::Str(_) => 3,
                Value::List(_) => 4,
                Value::Dict(_) => 5,
                Value::Object(_) => 6,
            }
        }
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Str(a), Self::Str(b)) => a.cmp(b),
            (a, b) if rank(a) == 2 && rank(b) == 2 => {
                let (a, b) = (a.as_float().unwrap_or_default(), b.as_float().unwrap_or_default());
                a.partial_cmp(&b).unwrap_or(Ordering::Equal)
            }
            (a, b) => rank(a).cmp(&rank(b)),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::None, Self::None) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Int(i), Self::Float(f)) | (Self::Float(f), Self::Int(i)) => *i as f64 == *f,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Dict(a), Self::Dict(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => {
                // Whole floats keep their decimal point, like `4.0`.
                if v.is_finite() && (*v as i64) as f64 == *v {
                    write!(f, "{v:.1}")
                } else {
                    write!(f, "{v}")
                }
            }
            Self::Str(s) => write!(f, "'{s}'"),
            Self::List(list) => {
                let Some(_visit) = list.visit() else {
                    return f.write_str("[...]");
                };
                f.write_str("[")?;
                for (i, item) in list.to_vec().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Dict(dict) => {
                let Some(_visit) = dict.visit() else {
                    return f.write_str("{...}");
                };
                f.write_str("{")?;
                for (i, (key, item)) in dict.to_vec().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "'{key}': {item}")?;
                }
                f.write_str("}")
            }
            Self::Object(_) => f.write_str("<ReactiveObject>"),
        }
    }
}

/// Marks a container as being walked by `Display`, `Debug` or `==`, so a walk
/// that reaches it again can stop.
pub(crate) struct Visit<'a>(&'a Cell<bool>);

impl<'a> Visit<'a> {
    /// Returns `None` if the container is already being walked.
    pub(crate) fn enter(flag: &'a Cell<bool>) -> Option<Self> {
        (!flag.replace(true)).then_some(Self(flag))
    }
}

impl Drop for Visit<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.into())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<CallbackList> for Value {
    fn from(value: CallbackList) -> Self {
        Self::List(value)
    }
}

impl From<CallbackDict> for Value {
    fn from(value: CallbackDict) -> Self {
        Self::Dict(value)
    }
}

impl From<ReactiveObject> for Value {
    fn from(value: ReactiveObject) -> Self {
        Self::Object(value)
    }
}

impl From<Vec<Self>> for Value {
    fn from(value: Vec<Self>) -> Self {
        Self::list(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::None, Into::into)
    }
}
