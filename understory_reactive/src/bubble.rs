// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bubble links between nested values.
//!
//! When a list, dict or observable object is placed inside a reactive
//! container, the container registers an internal link callback on the
//! element. A change inside the element then fires the link, which fires the
//! container's own observers, and so on up to the owning property.
//!
//! Links hold their receiver weakly, so they never keep a container alive.

use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

use crate::callback::{Callback, DeliveryMode, Notification};
use crate::callback_container::CallbackContainer;
use crate::error::PropertyError;
use crate::value::Value;

/// The observer registry of one reactive container.
///
/// `depth` counts the [`fire`](Self::fire) calls in progress, so bubble links
/// can tell when a change has come back around to a container that is still
/// notifying.
#[derive(Debug, Default)]
pub(crate) struct Notifier {
    callbacks: RefCell<CallbackContainer>,
    depth: Cell<u32>,
}

impl Notifier {
    pub(crate) fn add(&self, callback: Callback, priority: i32) -> Result<bool, PropertyError> {
        self.callbacks
            .borrow_mut()
            .append(callback, priority, DeliveryMode::VALUE)
    }

    pub(crate) fn remove(&self, callback: &Callback) -> usize {
        self.callbacks.borrow_mut().remove(callback)
    }

    pub(crate) fn count(&self) -> usize {
        self.callbacks.borrow().observer_count()
    }

    pub(crate) fn link(&self, link: Callback) {
        self.callbacks.borrow_mut().link(link);
    }

    pub(crate) fn unlink(&self, link: &Callback) {
        self.callbacks.borrow_mut().remove(link);
    }

    pub(crate) fn links_into(&self, receiver: usize) -> usize {
        self.callbacks.borrow().links_into(receiver)
    }

    pub(crate) fn is_firing(&self) -> bool {
        self.depth.get() > 0
    }

    /// Calls every observer with `value`.
    ///
    /// Fires always go through, including ones an observer triggers by
    /// mutating the container again. Only bubble links skip a notifier that is
    /// already firing (see [`relay`]).
    pub(crate) fn fire(&self, value: &Value) {
        self.depth.set(self.depth.get() + 1);
        let _depth = Leave(&self.depth);
        let observers: Vec<_> = self.callbacks.borrow_mut().snapshot(true);
        tracing::trace!(observers = observers.len(), "container changed");
        let notification = Notification::new(value);
        for (callback, _) in &observers {
            callback.call(&notification);
        }
    }
}

struct Leave<'a>(&'a Cell<u32>);

impl Drop for Leave<'_> {
    fn drop(&mut self) {
        self.0.set(self.0.get() - 1);
    }
}

/// Forwards a change that bubbled up from an element to the container owning
/// `notifier`, unless that container is mid-fire. A container that
/// (indirectly) contains itself therefore notifies once per change.
pub(crate) fn relay(notifier: &Notifier, notify: impl FnOnce()) {
    if notifier.is_firing() {
        tracing::trace!("bubble cycle cut");
        return;
    }
    notify();
}

/// Makes changes inside `value` fire `link`. Scalars are ignored.
pub(crate) fn attach(value: &Value, link: &Callback) {
    match value {
        Value::List(list) => list.notifier().link(link.clone()),
        Value::Dict(dict) => dict.notifier().link(link.clone()),
        Value::Object(object) => object.link_global(link.clone()),
        _ => {}
    }
}

/// Undoes [`attach`].
pub(crate) fn detach(value: &Value, link: &Callback) {
    match value {
        Value::List(list) => list.notifier().unlink(link),
        Value::Dict(dict) => dict.notifier().unlink(link),
        Value::Object(object) => object.unlink_global(link),
        _ => {}
    }
}

impl Value {
    /// The number of live bubble links from this value into `receiver`.
    ///
    /// For a list, dict or object `e` that is an element of container `c`,
    /// `e.link_count(&c)` is 1 while `e` is in `c` and 0 once it has been
    /// removed. For a list or dict held by a property of object `o`,
    /// `value.link_count(&Value::Object(o))` is 1 while the property holds it.
    /// Scalars always report 0.
    ///
    /// ```rust
    /// use understory_reactive::Value;
    ///
    /// let inner = Value::list([1.into()]);
    /// let outer = Value::list([inner.clone()]);
    /// assert_eq!(inner.link_count(&outer), 1);
    ///
    /// outer.as_list().unwrap().clear();
    /// assert_eq!(inner.link_count(&outer), 0);
    /// ```
    #[must_use]
    pub fn link_count(&self, receiver: &Self) -> usize {
        let Some(receiver) = receiver.handle_addr() else {
            return 0;
        };
        match self {
            Self::List(list) => list.notifier().links_into(receiver),
            Self::Dict(dict) => dict.notifier().links_into(receiver),
            Self::Object(object) => object.global_links_into(receiver),
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::rc::Rc;

    #[test]
    fn notifier_fires_in_priority_order_once() {
        let notifier = Notifier::default();
        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        let cb = Callback::new(move |_| counter.set(counter.get() + 1));
        assert!(notifier.add(cb.clone(), 0).unwrap());
        assert!(!notifier.add(cb.clone(), 0).unwrap());
        assert_eq!(notifier.count(), 1);

        notifier.fire(&Value::None);
        assert_eq!(hits.get(), 1);

        assert_eq!(notifier.remove(&cb), 1);
        notifier.fire(&Value::None);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn nested_fires_are_delivered() {
        let notifier = Rc::new(Notifier::default());
        let hits = Rc::new(Cell::new(0));
        let weak = Rc::downgrade(&notifier);
        let counter = hits.clone();
        notifier
            .add(
                Callback::new(move |n| {
                    counter.set(counter.get() + 1);
                    let Some(notifier) = weak.upgrade() else {
                        return;
                    };
                    assert!(notifier.is_firing());
                    if counter.get() < 3 {
                        notifier.fire(n.value());
                    }
                }),
                0,
            )
            .unwrap();

        notifier.fire(&Value::None);
        assert_eq!(hits.get(), 3);
        assert!(!notifier.is_firing());
    }

    #[test]
    fn relay_skips_a_firing_notifier() {
        let notifier = Rc::new(Notifier::default());
        let relayed = Rc::new(Cell::new(0));
        let weak = Rc::downgrade(&notifier);
        let counter = relayed.clone();
        notifier
            .add(
                Callback::new(move |_| {
                    if let Some(notifier) = weak.upgrade() {
                        relay(&notifier, || counter.set(counter.get() + 1));
                    }
                }),
                0,
            )
            .unwrap();

        notifier.fire(&Value::None);
        assert_eq!(relayed.get(), 0);
        relay(&notifier, || relayed.set(relayed.get() + 1));
        assert_eq!(relayed.get(), 1);
    }
}
