// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Selection properties.
//!
//! A selection property holds `None` or one of a set of choices. The choice
//! set can be replaced per instance; when that happens the current value is
//! kept if it is still valid and otherwise falls back to the choice at the
//! declared default index.

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::metadata::{DefaultValue, PropertyKind, PropertyMetadata, PropertyMetadataBuilder};
use crate::value::Value;

/// Maps a choice to the label a user interface shows for it.
pub type DisplayFunc = Rc<dyn Fn(&Value) -> String>;

/// One entry of a choice set.
#[derive(Clone, Debug, PartialEq)]
pub enum Choice {
    /// A selectable value.
    Value(Value),
    /// A non-selectable separator, optionally labelled. Kept for display order
    /// only.
    Separator(Option<String>),
}

impl Choice {
    /// A selectable value.
    pub fn value(value: impl Into<Value>) -> Self {
        Self::Value(value.into())
    }

    /// An unlabelled separator.
    #[must_use]
    pub fn separator() -> Self {
        Self::Separator(None)
    }

    /// A labelled separator.
    pub fn labeled_separator(label: impl Into<String>) -> Self {
        Self::Separator(Some(label.into()))
    }

    /// Returns `true` for separators.
    #[must_use]
    pub fn is_separator(&self) -> bool {
        matches!(self, Self::Separator(_))
    }

    /// Returns the value of a selectable choice.
    #[must_use]
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            Self::Separator(_) => None,
        }
    }
}

impl From<Value> for Choice {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

/// The selectable values of `choices`, in order, with separators removed.
#[must_use]
pub fn valid_choices(choices: &[Choice]) -> Vec<Value> {
    choices.iter().filter_map(Choice::as_value).cloned().collect()
}

/// Picks the value a selection holds after its choices become `valid`.
///
/// `current` is kept if it is one of `valid`. Otherwise the choice at
/// `default_index` is used, counting from the end when negative. An index past
/// the end selects the last choice; one before the start selects the first.
/// An empty set yields `None`.
///
/// ```rust
/// use understory_reactive::{fallback_selection, Value};
///
/// let current = Value::Float(3.5);
/// let pick = |valid: &[Value]| fallback_selection(&current, valid, 1);
///
/// assert_eq!(pick(&[Value::Int(4), Value::Float(3.5)]), Value::Float(3.5));
/// assert_eq!(pick(&[Value::Int(4), Value::Int(5), Value::Int(6)]), Value::Int(5));
/// assert_eq!(pick(&[Value::Int(9)]), Value::Int(9));
/// assert_eq!(pick(&[]), Value::None);
/// ```
#[must_use]
pub fn fallback_selection(current: &Value, valid: &[Value], default_index: isize) -> Value {
    if !current.is_none() && valid.contains(current) {
        return current.clone();
    }
    let Some(last) = valid.last() else {
        return Value::None;
    };
    let index = if default_index >= 0 {
        usize::try_from(default_index).ok()
    } else {
        valid.len().checked_sub(default_index.unsigned_abs())
    };
    match index.and_then(|i| valid.get(i)) {
        Some(choice) => choice.clone(),
        None if default_index > 0 => last.clone(),
        None => valid[0].clone(),
    }
}

/// Declared configuration of a selection property.
#[derive(Clone)]
pub struct SelectionMetadata {
    default_choices: Vec<Choice>,
    default_index: isize,
    display: Option<DisplayFunc>,
}

impl SelectionMetadata {
    /// The choices every instance starts with.
    #[must_use]
    pub fn default_choices(&self) -> &[Choice] {
        &self.default_choices
    }

    /// The selectable subset of [`default_choices`](Self::default_choices).
    #[must_use]
    pub fn valid_default_choices(&self) -> Vec<Value> {
        valid_choices(&self.default_choices)
    }

    /// The index used when the current value is no longer a valid choice.
    #[must_use]
    pub fn default_index(&self) -> isize {
        self.default_index
    }

    /// The declared display function, if any.
    #[must_use]
    pub fn display(&self) -> Option<&DisplayFunc> {
        self.display.as_ref()
    }

    pub(crate) fn fallback(&self, current: &Value, valid: &[Value]) -> Value {
        fallback_selection(current, valid, self.default_index)
    }
}

impl fmt::Debug for SelectionMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectionMetadata")
            .field("default_choices", &self.default_choices)
            .field("default_index", &self.default_index)
            .field("has_display", &self.display.is_some())
            .finish()
    }
}

/// The label for `value`: the display function's output if there is one,
/// otherwise the value's plain label. Lists and dicts have no automatic label.
pub(crate) fn display_label(display: Option<&DisplayFunc>, value: &Value) -> Option<String> {
    match display {
        Some(display) => Some(display(value)),
        None if value.is_container() => None,
        None => Some(value.label()),
    }
}

/// Builder for selection property metadata.
///
/// # Example
///
/// ```rust
/// use understory_reactive::{Choice, SelectionBuilder, Value};
///
/// let metadata = SelectionBuilder::new()
///     .choices([Choice::value("red"), Choice::separator(), Choice::value("blue")])
///     .default_index(1)
///     .build();
///
/// // Separators are not selectable, so index 1 is "blue".
/// assert_eq!(metadata.initial_value(), Value::from("blue"));
/// ```
pub struct SelectionBuilder {
    choices: Vec<Choice>,
    default_index: isize,
    default: Value,
    display: Option<DisplayFunc>,
    doc: Option<&'static str>,
}

impl Default for SelectionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SelectionBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectionBuilder")
            .field("choices", &self.choices)
            .field("default_index", &self.default_index)
            .field("default", &self.default)
            .field("has_display", &self.display.is_some())
            .field("doc", &self.doc)
            .finish()
    }
}

impl SelectionBuilder {
    /// An empty choice set with default index 0.
    #[must_use]
    pub fn new() -> Self {
        Self {
            choices: Vec::new(),
            default_index: 0,
            default: Value::None,
            display: None,
            doc: None,
        }
    }

    /// Sets the default choices, separators included.
    #[must_use]
    pub fn choices(mut self, choices: impl IntoIterator<Item = Choice>) -> Self {
        self.choices = choices.into_iter().collect();
        self
    }

    /// Sets the default choices from plain values.
    #[must_use]
    pub fn values<V: Into<Value>>(self, values: impl IntoIterator<Item = V>) -> Self {
        self.choices(values.into_iter().map(Choice::value))
    }

    /// Sets the fallback index.
    #[must_use]
    pub fn default_index(mut self, index: isize) -> Self {
        self.default_index = index;
        self
    }

    /// Sets an explicit initial value instead of the fallback choice.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = value.into();
        self
    }

    /// Sets the display function.
    #[must_use]
    pub fn display<F>(mut self, display: F) -> Self
    where
        F: Fn(&Value) -> String + 'static,
    {
        self.display = Some(Rc::new(display));
        self
    }

    /// Sets the docstring.
    #[must_use]
    pub fn doc(mut self, doc: &'static str) -> Self {
        self.doc = Some(doc);
        self
    }

    /// Builds the property metadata.
    #[must_use]
    pub fn build(self) -> PropertyMetadata {
        let selection = SelectionMetadata {
            default_choices: self.choices,
            default_index: self.default_index,
            display: self.display,
        };
        let builder = PropertyMetadataBuilder::with_kind(
            PropertyKind::Selection(selection),
            DefaultValue::Value(self.default),
        );
        match self.doc {
            Some(doc) => builder.doc(doc).build(),
            None => builder.build(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;
    use alloc::vec;

    #[test]
    fn separators_are_not_valid() {
        let choices = vec![
            Choice::value(1),
            Choice::labeled_separator("more"),
            Choice::value(2),
            Choice::separator(),
        ];
        assert_eq!(valid_choices(&choices), vec![Value::Int(1), Value::Int(2)]);
        assert!(choices[1].is_separator());
        assert_eq!(choices[1].as_value(), None);
    }

    #[test]
    fn fallback_keeps_valid_current() {
        let valid = vec![Value::Int(4), Value::Float(3.5)];
        assert_eq!(fallback_selection(&Value::Float(3.5), &valid, 0), Value::Float(3.5));
        // Numeric equality crosses int and float.
        assert_eq!(fallback_selection(&Value::Float(4.0), &valid, 1), Value::Float(4.0));
    }

    #[test]
    fn fallback_index_rules() {
        let valid = vec![Value::Int(1), Value::Int(2), Value::Int(3)];
        let none = Value::None;
        assert_eq!(fallback_selection(&none, &valid, 0), Value::Int(1));
        assert_eq!(fallback_selection(&none, &valid, 2), Value::Int(3));
        assert_eq!(fallback_selection(&none, &valid, 7), Value::Int(3));
        assert_eq!(fallback_selection(&none, &valid, -1), Value::Int(3));
        assert_eq!(fallback_selection(&none, &valid, -3), Value::Int(1));
        assert_eq!(fallback_selection(&none, &valid, -9), Value::Int(1));
        assert_eq!(fallback_selection(&Value::Int(8), &[], 0), Value::None);
    }

    #[test]
    fn labels() {
        assert_eq!(display_label(None, &Value::from("a")), Some("a".into()));
        assert_eq!(display_label(None, &Value::Float(2.0)), Some("2.0".into()));
        assert_eq!(display_label(None, &Value::list([1.into()])), None);

        let upper: DisplayFunc = Rc::new(|v: &Value| v.label().to_uppercase());
        assert_eq!(display_label(Some(&upper), &Value::from("a")), Some("A".into()));
    }

    #[test]
    fn builder_initial_value() {
        let metadata = SelectionBuilder::new().values([4.0, 3.5]).default_index(1).build();
        assert_eq!(metadata.initial_value(), Value::Float(3.5));

        let metadata = SelectionBuilder::new()
            .values(["a", "b"])
            .default_value("b")
            .doc("letter")
            .build();
        assert_eq!(metadata.initial_value(), Value::from("b"));
        assert_eq!(metadata.doc(), Some("letter"));

        let selection = metadata.selection().unwrap();
        assert_eq!(selection.default_choices().len(), 2);
        assert!(format!("{selection:?}").contains("default_index: 0"));

        let empty = SelectionBuilder::new().build();
        assert_eq!(empty.initial_value(), Value::None);
    }
}
