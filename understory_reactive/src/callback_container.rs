// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ordered observer registry.
//!
//! This module provides [`CallbackContainer`], the collection every property
//! slot, object and reactive container keeps its observers in.

use alloc::vec::Vec;

use crate::callback::{Callback, DeliveryMode};
use crate::error::PropertyError;

#[derive(Clone, Debug)]
struct Entry {
    callback: Callback,
    priority: i32,
    mode: DeliveryMode,
}

/// An ordered collection of observers with priorities.
///
/// - Appending an observer that is already present at the same priority is a
///   no-op. The same observer at another priority is a separate entry.
/// - Removing an observer removes every entry for it, whatever the priority.
/// - Iteration in priority order yields the highest priority first; ties keep
///   insertion order.
/// - Method observers whose receiver has been dropped are skipped and pruned
///   on the next mutable access.
///
/// # Example
///
/// ```rust
/// use understory_reactive::{Callback, CallbackContainer, DeliveryMode};
///
/// let mut observers = CallbackContainer::new();
/// let a = Callback::new(|_| {});
/// let b = Callback::new(|_| {});
///
/// observers.append(a.clone(), 0, DeliveryMode::VALUE).unwrap();
/// observers.append(b.clone(), 5, DeliveryMode::VALUE).unwrap();
/// // Same observer, same priority: ignored.
/// assert!(!observers.append(a.clone(), 0, DeliveryMode::VALUE).unwrap());
///
/// let order: Vec<_> = observers.iter(true).map(|(cb, _)| cb.clone()).collect();
/// assert!(order[0].same_as(&b));
/// assert!(order[1].same_as(&a));
///
/// assert_eq!(observers.remove(&a), 1);
/// assert_eq!(observers.len(), 1);
/// ```
#[derive(Clone, Debug, Default)]
pub struct CallbackContainer {
    entries: Vec<Entry>,
}

impl CallbackContainer {
    /// Creates an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an observer at `priority`, delivered according to `mode`.
    ///
    /// Returns `Ok(false)` if the observer was already registered at that
    /// priority.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError::NotCallable`] if `callback` is a method whose
    /// receiver is already gone.
    pub fn append(
        &mut self,
        callback: Callback,
        priority: i32,
        mode: DeliveryMode,
    ) -> Result<bool, PropertyError> {
        if !callback.is_alive() {
            return Err(PropertyError::NotCallable);
        }
        if self.contains(&callback, Some(priority)) {
            return Ok(false);
        }
        self.entries.push(Entry {
            callback,
            priority,
            mode,
        });
        Ok(true)
    }

    /// Removes every entry for `callback` and returns how many were removed.
    ///
    /// Expired entries are pruned along the way but not counted.
    pub fn remove(&mut self, callback: &Callback) -> usize {
        self.prune();
        let before = self.entries.len();
        let identity = callback.identity();
        self.entries.retain(|e| e.callback.identity() != identity);
        before - self.entries.len()
    }

    /// Returns `true` if `callback` is registered, at `priority` if given.
    #[must_use]
    pub fn contains(&self, callback: &Callback, priority: Option<i32>) -> bool {
        self.live().any(|e| {
            e.callback.same_as(callback) && priority.is_none_or(|p| p == e.priority)
        })
    }

    /// The number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live().count()
    }

    /// Returns `true` if there are no live entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live().next().is_none()
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drops entries whose receiver is gone and returns how many were dropped.
    pub fn prune(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.callback.is_alive());
        let pruned = before - self.entries.len();
        if pruned > 0 {
            tracing::debug!(pruned, "pruned expired observers");
        }
        pruned
    }

    /// Iterates over live observers with their delivery modes.
    ///
    /// With `ordered`, entries come in descending priority (ties in insertion
    /// order); otherwise in insertion order. Unordered iteration walks the
    /// entries lazily. Ordered iteration sorts references to the live entries
    /// up front, so it reflects the container as of the call.
    pub fn iter(&self, ordered: bool) -> impl Iterator<Item = (&Callback, DeliveryMode)> + '_ {
        let mut sorted: Vec<&Entry> = Vec::new();
        if ordered {
            sorted.extend(self.live());
            sorted.sort_by(|a, b| b.priority.cmp(&a.priority));
        }
        let lazy = (!ordered).then(|| self.live()).into_iter().flatten();
        sorted.into_iter().chain(lazy).map(|e| (&e.callback, e.mode))
    }

    /// Prunes, then clones the observers out so they can be called without
    /// holding a borrow of whatever owns this container.
    pub(crate) fn snapshot(&mut self, ordered: bool) -> Vec<(Callback, DeliveryMode)> {
        self.prune();
        self.iter(ordered).map(|(cb, mode)| (cb.clone(), mode)).collect()
    }

    /// Adds an internal link. Links are never expired at this point and
    /// never carry a priority.
    pub(crate) fn link(&mut self, callback: Callback) {
        debug_assert!(callback.is_edge());
        if !self.contains(&callback, Some(0)) {
            self.entries.push(Entry {
                callback,
                priority: 0,
                mode: DeliveryMode::VALUE,
            });
        }
    }

    /// The number of live entries that are not internal links.
    pub(crate) fn observer_count(&self) -> usize {
        self.live().filter(|e| !e.callback.is_edge()).count()
    }

    /// The number of live internal links whose receiver lives at `receiver`.
    pub(crate) fn links_into(&self, receiver: usize) -> usize {
        self.live()
            .filter(|e| e.callback.is_edge() && e.callback.receiver_addr() == Some(receiver))
            .count()
    }

    fn live(&self) -> impl Iterator<Item = &Entry> + '_ {
        self.entries.iter().filter(|e| e.callback.is_alive())
    }
}
