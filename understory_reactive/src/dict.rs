// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reactive dict.

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;
use hashbrown::DefaultHashBuilder;
use indexmap::IndexMap;

use crate::bubble::{self, Notifier};
use crate::callback::Callback;
use crate::error::PropertyError;
use crate::value::{Value, Visit};

type Entries = IndexMap<String, Value, DefaultHashBuilder>;

pub(crate) struct DictInner {
    entries: RefCell<Entries>,
    notifier: Notifier,
    visited: Cell<bool>,
}

/// A shared string-keyed map that notifies its observers whenever it is
/// mutated.
///
/// Entries keep insertion order. Like [`CallbackList`](crate::CallbackList),
/// this is a handle; nested lists, dicts and objects are linked back to it.
///
/// # Example
///
/// ```rust
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use understory_reactive::{Callback, CallbackDict, Value};
///
/// let dict = CallbackDict::new();
/// let hits = Rc::new(Cell::new(0));
/// let counter = hits.clone();
/// dict.add_callback(Callback::new(move |_| counter.set(counter.get() + 1)), 0)
///     .unwrap();
///
/// dict.insert("a", 1);
/// dict.update([("b", 2.into()), ("c", 3.into())]);
/// assert_eq!(dict.keys(), ["a", "b", "c"]);
/// assert_eq!(dict.popitem(), Some(("c".into(), Value::Int(3))));
/// assert_eq!(dict.pop("missing"), None);
/// assert_eq!(hits.get(), 3);
/// ```
#[derive(Clone)]
pub struct CallbackDict {
    inner: Rc<DictInner>,
}

impl CallbackDict {
    /// Creates an empty dict.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(DictInner {
                entries: RefCell::new(Entries::default()),
                notifier: Notifier::default(),
                visited: Cell::new(false),
            }),
        }
    }

    fn link(&self) -> Callback {
        Callback::edge(&self.inner, 0, |inner, _| {
            let this = Self { inner };
            bubble::relay(&this.inner.notifier, || this.notify());
        })
    }

    pub(crate) fn notifier(&self) -> &Notifier {
        &self.inner.notifier
    }

    fn notify(&self) {
        self.inner.notifier.fire(&Value::Dict(self.clone()));
    }

    fn holds(&self, value: &Value) -> bool {
        self.inner
            .entries
            .borrow()
            .values()
            .any(|v| v.same_handle(value))
    }

    fn settle(&self, removed: &[Value], inserted: &[Value]) {
        let link = self.link();
        for value in removed {
            if value.handle_addr().is_some() && !self.holds(value) {
                bubble::detach(value, &link);
            }
        }
        for value in inserted {
            bubble::attach(value, &link);
        }
    }

    fn apply<R>(&self, removed: &[Value], inserted: &[Value], result: R) -> R {
        self.settle(removed, inserted);
        self.notify();
        result
    }

    /// Adds an observer. Returns `Ok(false)` if it was already registered at
    /// `priority`.
    ///
    /// # Errors
    ///
    /// [`PropertyError::NotCallable`] if the callback's receiver is gone.
    pub fn add_callback(&self, callback: Callback, priority: i32) -> Result<bool, PropertyError> {
        self.inner.notifier.add(callback, priority)
    }

    /// Removes every entry for `callback`. Returns `false` if there was none.
    pub fn remove_callback(&self, callback: &Callback) -> bool {
        self.inner.notifier.remove(callback) > 0
    }

    /// The number of live observers, not counting links.
    #[must_use]
    pub fn callback_count(&self) -> usize {
        self.inner.notifier.count()
    }

    /// Inserts or replaces the value for `key` and returns the previous one.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let value = value.into();
        let old = self
            .inner
            .entries
            .borrow_mut()
            .insert(key.into(), value.clone());
        let removed: Vec<Value> = old.iter().cloned().collect();
        self.apply(&removed, &[value], old)
    }

    /// Inserts or replaces every entry of `entries`, then notifies once.
    pub fn update<K: Into<String>>(&self, entries: impl IntoIterator<Item = (K, Value)>) {
        let mut removed = Vec::new();
        let mut inserted = Vec::new();
        {
            let mut map = self.inner.entries.borrow_mut();
            for (key, value) in entries {
                inserted.push(value.clone());
                removed.extend(map.insert(key.into(), value));
            }
        }
        self.apply(&removed, &inserted, ());
    }

    /// Removes and returns the value for `key`. A missing key does not
    /// notify.
    pub fn pop(&self, key: &str) -> Option<Value> {
        let value = self.inner.entries.borrow_mut().shift_remove(key)?;
        Some(self.apply(&[value.clone()], &[], value))
    }

    /// Removes and returns the most recently inserted entry. An empty dict
    /// does not notify.
    pub fn popitem(&self) -> Option<(String, Value)> {
        let (key, value) = self.inner.entries.borrow_mut().pop()?;
        Some(self.apply(&[value.clone()], &[], (key, value)))
    }

    /// Removes every entry.
    pub fn clear(&self) {
        let removed: Vec<Value> = core::mem::take(&mut *self.inner.entries.borrow_mut())
            .into_values()
            .collect();
        self.apply(&removed, &[], ());
    }

    /// Returns the value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.entries.borrow().get(key).cloned()
    }

    /// Returns `true` if `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.entries.borrow().contains_key(key)
    }

    /// The keys, in insertion order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.inner.entries.borrow().keys().cloned().collect()
    }

    /// The values, in insertion order.
    #[must_use]
    pub fn values(&self) -> Vec<Value> {
        self.inner.entries.borrow().values().cloned().collect()
    }

    /// The number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.entries.borrow().len()
    }

    /// Returns `true` if the dict is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.entries.borrow().is_empty()
    }

    /// A copy of the entries in insertion order. Nested values are shared.
    #[must_use]
    pub fn to_vec(&self) -> Vec<(String, Value)> {
        self.inner
            .entries
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Returns `true` if both handles refer to the same dict.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn visit(&self) -> Option<Visit<'_>> {
        Visit::enter(&self.inner.visited)
    }

    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.inner).cast::<()>() as usize
    }
}

impl Default for CallbackDict {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for CallbackDict {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let dict = Self::new();
        let entries: Entries = iter.into_iter().map(|(k, v)| (k.into(), v)).collect();
        let values: Vec<Value> = entries.values().cloned().collect();
        *dict.inner.entries.borrow_mut() = entries;
        dict.settle(&[], &values);
        dict
    }
}

impl PartialEq for CallbackDict {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        let (mine, theirs) = (self.visit(), other.visit());
        if mine.is_none() || theirs.is_none() {
            return mine.is_none() && theirs.is_none();
        }
        let (a, b) = (self.inner.entries.borrow(), other.inner.entries.borrow());
        a.len() == b.len() && a.iter().all(|(k, v)| b.get(k).is_some_and(|w| v == w))
    }
}

impl fmt::Debug for CallbackDict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(_visit) = self.visit() else {
            return f.write_str("CallbackDict({...})");
        };
        match self.inner.entries.try_borrow() {
            Ok(entries) => {
                f.write_str("CallbackDict(")?;
                f.debug_map().entries(entries.iter()).finish()?;
                f.write_str(")")
            }
            Err(_) => f.write_str("CallbackDict(<borrowed>)"),
        }
    }
}
