// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Delay and ignore scopes.
//!
//! A delay scope holds back notifications for a set of properties and
//! delivers at most one per property when the outermost scope ends, and only
//! if the value changed overall (or a held list or dict was mutated in place).
//! An ignore scope drops notifications outright.
//!
//! Scopes are guards: the scope ends when the [`BatchGuard`] is dropped.
//! Scopes nest, per object and per property.

use smallvec::SmallVec;

use crate::error::PropertyError;
use crate::id::PropertyId;
use crate::object::{ALL_PROPERTIES, ReactiveObject};

/// What a [`BatchGuard`] does with notifications.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BatchKind {
    /// Coalesce, then deliver when the outermost scope ends.
    Delay,
    /// Drop.
    Ignore,
}

/// An active delay or ignore scope. See the [module docs](self).
#[must_use = "the scope ends as soon as the guard is dropped"]
#[derive(Debug)]
pub struct BatchGuard {
    object: ReactiveObject,
    kind: BatchKind,
    ids: SmallVec<[PropertyId; 4]>,
    flush: bool,
}

impl BatchGuard {
    pub(crate) fn enter(
        object: &ReactiveObject,
        kind: BatchKind,
        names: &[&str],
    ) -> Result<Self, PropertyError> {
        let mut ids = SmallVec::new();
        for name in names {
            if *name == ALL_PROPERTIES {
                ids.extend(object.registry().callback_property_ids());
            } else {
                ids.push(object.resolve_for_batch(name)?);
            }
        }
        for &id in &ids {
            match kind {
                BatchKind::Delay => object.begin_delay(id),
                BatchKind::Ignore => object.begin_ignore(id),
            }
        }
        Ok(Self {
            object: object.clone(),
            kind,
            ids,
            flush: true,
        })
    }

    /// The kind of this scope.
    #[must_use]
    pub fn kind(&self) -> BatchKind {
        self.kind
    }

    /// Ends the scope without delivering the held-back notifications.
    ///
    /// Values written inside the scope stay written. Enclosing delay scopes
    /// on the same properties still flush when they end.
    pub fn discard(mut self) {
        self.flush = false;
    }
}

impl Drop for BatchGuard {
    fn drop(&mut self) {
        #[cfg(feature = "std")]
        if std::thread::panicking() {
            self.flush = false;
        }
        for &id in &self.ids {
            match self.kind {
                BatchKind::Delay => self.object.end_delay(id, self.flush),
                BatchKind::Ignore => self.object.end_ignore(id),
            }
        }
    }
}

impl ReactiveObject {
    /// Holds back notifications for `names` until the returned guard is
    /// dropped. `"*"` names every callback property.
    ///
    /// # Errors
    ///
    /// [`PropertyError::UnknownAttribute`] or
    /// [`PropertyError::NotCallbackProperty`] for a bad name, in which case
    /// no scope is entered.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::cell::Cell;
    /// use std::rc::Rc;
    /// use understory_reactive::{
    ///     Callback, DeliveryMode, PropertyMetadata, PropertyRegistry, ReactiveObject,
    /// };
    ///
    /// let mut registry = PropertyRegistry::new();
    /// registry.register("a", PropertyMetadata::new(0));
    /// let object = ReactiveObject::new(&Rc::new(registry));
    /// let hits = Rc::new(Cell::new(0));
    /// let counter = hits.clone();
    /// object
    ///     .add_observer("a", Callback::new(move |_| counter.set(counter.get() + 1)), 0, DeliveryMode::VALUE)
    ///     .unwrap();
    ///
    /// {
    ///     let _delay = object.delay(&["a"]).unwrap();
    ///     object.set("a", 1).unwrap();
    ///     object.set("a", 2).unwrap();
    ///     assert_eq!(hits.get(), 0);
    /// }
    /// assert_eq!(hits.get(), 1);
    /// ```
    pub fn delay(&self, names: &[&str]) -> Result<BatchGuard, PropertyError> {
        BatchGuard::enter(self, BatchKind::Delay, names)
    }

    /// Drops notifications for `names` until the returned guard is dropped.
    ///
    /// # Errors
    ///
    /// As [`delay`](Self::delay).
    pub fn ignore(&self, names: &[&str]) -> Result<BatchGuard, PropertyError> {
        BatchGuard::enter(self, BatchKind::Ignore, names)
    }

    /// Runs `f` inside a delay scope on `names`.
    ///
    /// If `f` returns an error the held-back notifications are discarded.
    ///
    /// # Errors
    ///
    /// Errors from entering the scope, converted into `E`, or from `f`.
    pub fn with_delay<T, E, F>(&self, names: &[&str], f: F) -> Result<T, E>
    where
        E: From<PropertyError>,
        F: FnOnce(&Self) -> Result<T, E>,
    {
        let guard = self.delay(names)?;
        finish(guard, f(self))
    }

    /// Runs `f` inside an ignore scope on `names`.
    ///
    /// # Errors
    ///
    /// Errors from entering the scope, converted into `E`, or from `f`.
    pub fn with_ignore<T, E, F>(&self, names: &[&str], f: F) -> Result<T, E>
    where
        E: From<PropertyError>,
        F: FnOnce(&Self) -> Result<T, E>,
    {
        let guard = self.ignore(names)?;
        finish(guard, f(self))
    }
}

fn finish<T, E>(guard: BatchGuard, result: Result<T, E>) -> Result<T, E> {
    if result.is_err() {
        guard.discard();
    } else {
        drop(guard);
    }
    result
}
