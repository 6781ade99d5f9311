// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reactive list.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::cmp::Ordering;
use core::fmt;
use core::ops::Range;

use crate::bubble::{self, Notifier};
use crate::callback::Callback;
use crate::error::PropertyError;
use crate::value::{Value, Visit};

pub(crate) struct ListInner {
    items: RefCell<Vec<Value>>,
    notifier: Notifier,
    visited: Cell<bool>,
}

/// A shared list that notifies its observers whenever it is mutated.
///
/// `CallbackList` is a handle: clones share the same storage and observers.
/// Lists, dicts and objects stored in it are linked back to it, so a change
/// anywhere below also notifies this list's observers. Every mutating method
/// settles those links for the elements that left and entered before any
/// observer runs.
///
/// Observers receive the list itself as the notification value.
///
/// # Example
///
/// ```rust
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use understory_reactive::{Callback, CallbackList, Value};
///
/// let list = CallbackList::new();
/// let hits = Rc::new(Cell::new(0));
/// let counter = hits.clone();
/// list.add_callback(Callback::new(move |_| counter.set(counter.get() + 1)), 0)
///     .unwrap();
///
/// list.append(1);
/// list.extend([2.into(), 3.into()]);
/// assert_eq!(hits.get(), 2);
///
/// // Mutating a nested list notifies the outer list too.
/// let inner = CallbackList::new();
/// list.append(inner.clone());
/// inner.append("x");
/// assert_eq!(hits.get(), 4);
///
/// assert_eq!(list.pop(), Some(Value::List(inner.clone())));
/// inner.append("y");
/// assert_eq!(hits.get(), 5);
/// ```
#[derive(Clone)]
pub struct CallbackList {
    inner: Rc<ListInner>,
}

impl CallbackList {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(ListInner {
                items: RefCell::new(Vec::new()),
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
        self.inner.notifier.fire(&Value::List(self.clone()));
    }

    fn holds(&self, value: &Value) -> bool {
        self.inner.items.borrow().iter().any(|v| v.same_handle(value))
    }

    /// Unlinks the elements that left (unless another copy is still present)
    /// and links the elements that entered.
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

    /// The number of live observers. Links from containers holding this list
    /// are not counted.
    #[must_use]
    pub fn callback_count(&self) -> usize {
        self.inner.notifier.count()
    }

    /// Appends a value.
    pub fn append(&self, value: impl Into<Value>) {
        let value = value.into();
        self.inner.items.borrow_mut().push(value.clone());
        self.apply(&[], &[value], ());
    }

    /// Appends every value of `values`.
    pub fn extend(&self, values: impl IntoIterator<Item = Value>) {
        let values: Vec<Value> = values.into_iter().collect();
        self.inner.items.borrow_mut().extend(values.iter().cloned());
        self.apply(&[], &values, ());
    }

    /// Inserts `value` before `index`. An index past the end appends.
    pub fn insert(&self, index: usize, value: impl Into<Value>) {
        let value = value.into();
        {
            let mut items = self.inner.items.borrow_mut();
            let index = index.min(items.len());
            items.insert(index, value.clone());
        }
        self.apply(&[], &[value], ());
    }

    /// Removes and returns the last value. An empty list is left alone and
    /// does not notify.
    pub fn pop(&self) -> Option<Value> {
        let value = self.inner.items.borrow_mut().pop()?;
        Some(self.apply(&[value.clone()], &[], value))
    }

    /// Removes and returns the value at `index`.
    ///
    /// # Errors
    ///
    /// [`PropertyError::IndexOutOfRange`] if `index >= len`; nothing changes.
    pub fn pop_at(&self, index: usize) -> Result<Value, PropertyError> {
        let value = {
            let mut items = self.inner.items.borrow_mut();
            if index >= items.len() {
                return Err(PropertyError::IndexOutOfRange {
                    index,
                    len: items.len(),
                });
            }
            items.remove(index)
        };
        Ok(self.apply(&[value.clone()], &[], value))
    }

    /// Removes the first value equal to `value`. Returns `false`, without
    /// notifying, if there is none.
    pub fn remove(&self, value: &Value) -> bool {
        let Some(index) = self.index_of(value) else {
            return false;
        };
        let removed = self.inner.items.borrow_mut().remove(index);
        self.apply(&[removed], &[], true)
    }

    /// Reverses the list in place.
    pub fn reverse(&self) {
        self.inner.items.borrow_mut().reverse();
        self.apply(&[], &[], ());
    }

    /// Sorts the list: `None` first, then booleans, numbers, strings, lists,
    /// dicts and objects. The sort is stable.
    pub fn sort(&self) {
        self.sort_by(Value::sort_cmp);
    }

    /// Sorts the list with a comparator. The sort is stable.
    ///
    /// The comparator may read the list; it sees it empty while sorting.
    pub fn sort_by<F>(&self, compare: F)
    where
        F: FnMut(&Value, &Value) -> Ordering,
    {
        let mut items = core::mem::take(&mut *self.inner.items.borrow_mut());
        items.sort_by(compare);
        *self.inner.items.borrow_mut() = items;
        self.apply(&[], &[], ());
    }

    /// Replaces the value at `index` and returns the previous one.
    ///
    /// # Errors
    ///
    /// [`PropertyError::IndexOutOfRange`] if `index >= len`; nothing changes.
    pub fn set(&self, index: usize, value: impl Into<Value>) -> Result<Value, PropertyError> {
        let value = value.into();
        let old = {
            let mut items = self.inner.items.borrow_mut();
            let len = items.len();
            let slot = items
                .get_mut(index)
                .ok_or(PropertyError::IndexOutOfRange { index, len })?;
            core::mem::replace(slot, value.clone())
        };
        Ok(self.apply(&[old.clone()], &[value], old))
    }

    /// Replaces `range` with `values`, like slice assignment. The range is
    /// clamped to the list, so it never fails. Returns the removed values.
    pub fn set_slice(&self, range: Range<usize>, values: impl IntoIterator<Item = Value>) -> Vec<Value> {
        let values: Vec<Value> = values.into_iter().collect();
        let removed: Vec<Value> = {
            let mut items = self.inner.items.borrow_mut();
            let end = range.end.min(items.len());
            let start = range.start.min(end);
            items.splice(start..end, values.iter().cloned()).collect()
        };
        self.apply(&removed, &values, removed.clone())
    }

    /// Removes every value.
    pub fn clear(&self) {
        let removed = core::mem::take(&mut *self.inner.items.borrow_mut());
        self.apply(&removed, &[], ());
    }

    /// Returns the value at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Value> {
        self.inner.items.borrow().get(index).cloned()
    }

    /// The number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.items.borrow().len()
    }

    /// Returns `true` if the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.items.borrow().is_empty()
    }

    /// Returns `true` if some value equals `value`.
    #[must_use]
    pub fn contains(&self, value: &Value) -> bool {
        self.inner.items.borrow().contains(value)
    }

    /// The index of the first value equal to `value`.
    #[must_use]
    pub fn index_of(&self, value: &Value) -> Option<usize> {
        self.inner.items.borrow().iter().position(|v| v == value)
    }

    /// A copy of the values. Nested lists, dicts and objects are shared.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Value> {
        self.inner.items.borrow().clone()
    }

    /// Returns `true` if both handles refer to the same list.
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

impl Default for CallbackList {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<Value> for CallbackList {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        let list = Self::new();
        let items: Vec<Value> = iter.into_iter().collect();
        *list.inner.items.borrow_mut() = items.clone();
        list.settle(&[], &items);
        list
    }
}

impl PartialEq for CallbackList {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        // Back at a pair that is already being compared.
        let (mine, theirs) = (self.visit(), other.visit());
        if mine.is_none() || theirs.is_none() {
            return mine.is_none() && theirs.is_none();
        }
        *self.inner.items.borrow() == *other.inner.items.borrow()
    }
}

impl fmt::Debug for CallbackList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(_visit) = self.visit() else {
            return f.write_str("CallbackList([...])");
        };
        match self.inner.items.try_borrow() {
            Ok(items) => f.debug_tuple("CallbackList").field(&*items).finish(),
            Err(_) => f.write_str("CallbackList(<borrowed>)"),
        }
    }
}
