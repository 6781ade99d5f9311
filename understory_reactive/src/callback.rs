// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Observer handles.
//!
//! A [`Callback`] is what gets registered with a
//! [`CallbackContainer`](crate::CallbackContainer). There are two flavours:
//!
//! - **Functions** own their closure. Two function callbacks are the same
//!   observer when they are clones of one another.
//! - **Methods** pair a receiver with a function but only hold a [`Weak`]
//!   reference to the receiver. An object can therefore observe its own
//!   properties (or a container it owns) without creating a reference cycle.
//!   Once the receiver is dropped the callback stops firing and is pruned from
//!   any container that holds it.
//!
//! There is no finalizer hook on [`Rc`], so pruning of expired methods happens
//! lazily: the next time a container dispatches, counts, or removes entries.

use alloc::rc::{Rc, Weak};
use core::any::Any;
use core::fmt;

use crate::error::PropertyError;
use crate::value::Value;

bitflags::bitflags! {
    /// Which parts of a change an observer wants delivered.
    ///
    /// The empty set delivers the new value only.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct DeliveryMode: u8 {
        /// Also deliver the previous value.
        const ECHO_OLD  = 0b0000_0001;
        /// Also deliver the property name.
        const ECHO_NAME = 0b0000_0010;
    }
}

impl DeliveryMode {
    /// Deliver the new value only.
    pub const VALUE: Self = Self::empty();
}

/// The payload handed to an observer.
///
/// [`value`](Self::value) is always present. [`old`](Self::old) and
/// [`name`](Self::name) are filled in according to the [`DeliveryMode`] the
/// observer was registered with. Container observers receive the container
/// itself as the value.
#[derive(Clone, Copy, Debug)]
pub struct Notification<'a> {
    name: Option<&'a str>,
    old: Option<&'a Value>,
    value: &'a Value,
}

impl<'a> Notification<'a> {
    /// A value-only notification.
    #[must_use]
    pub fn new(value: &'a Value) -> Self {
        Self {
            name: None,
            old: None,
            value,
        }
    }

    pub(crate) fn for_mode(
        mode: DeliveryMode,
        name: &'a str,
        old: &'a Value,
        value: &'a Value,
    ) -> Self {
        Self {
            name: mode.contains(DeliveryMode::ECHO_NAME).then_some(name),
            old: mode.contains(DeliveryMode::ECHO_OLD).then_some(old),
            value,
        }
    }

    /// The property name, when delivered with [`DeliveryMode::ECHO_NAME`].
    #[must_use]
    #[inline]
    pub fn name(&self) -> Option<&'a str> {
        self.name
    }

    /// The previous value, when delivered with [`DeliveryMode::ECHO_OLD`].
    #[must_use]
    #[inline]
    pub fn old(&self) -> Option<&'a Value> {
        self.old
    }

    /// The new value.
    #[must_use]
    #[inline]
    pub fn value(&self) -> &'a Value {
        self.value
    }
}

type Function = Rc<dyn Fn(&Notification<'_>)>;
type Invoke = Rc<dyn Fn(Rc<dyn Any>, &Notification<'_>)>;

/// What makes two callbacks "the same observer".
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) enum Identity {
    Function(usize),
    Method { receiver: usize, func: usize },
    /// Internal bubble/owner link; `slot` tells apart links into the same receiver.
    Edge { receiver: usize, slot: u32 },
}

#[derive(Clone)]
enum Target {
    Function(Function),
    Bound {
        receiver: Weak<dyn Any>,
        invoke: Invoke,
    },
}

/// An observer that can be registered on properties, objects and containers.
///
/// Cloning a callback is cheap and the clone is the same observer, which is
/// how callers later remove what they registered.
///
/// # Example
///
/// ```rust
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use understory_reactive::{Callback, Notification, Value};
///
/// struct Counter {
///     hits: Cell<u32>,
/// }
///
/// let counter = Rc::new(Counter { hits: Cell::new(0) });
/// let observer = Callback::method(&counter, |c: &Counter, _: &Notification<'_>| {
///     c.hits.set(c.hits.get() + 1);
/// });
///
/// assert!(observer.call(&Notification::new(&Value::Int(1))));
/// assert_eq!(counter.hits.get(), 1);
///
/// // The callback does not keep the receiver alive.
/// drop(counter);
/// assert!(!observer.is_alive());
/// assert!(!observer.call(&Notification::new(&Value::Int(2))));
/// ```
#[derive(Clone)]
pub struct Callback {
    target: Target,
    identity: Identity,
}

impl Callback {
    /// Wraps a closure. The callback owns the closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Notification<'_>) + 'static,
    {
        let f: Function = Rc::new(f);
        let identity = Identity::Function(Rc::as_ptr(&f).cast::<()>() as usize);
        Self {
            target: Target::Function(f),
            identity,
        }
    }

    /// Binds `f` to `receiver` without keeping the receiver alive.
    ///
    /// Two method callbacks are the same observer when they share a receiver
    /// and the same function, so a method can be rebuilt later to remove it.
    /// `f` is a plain function (or a closure that captures nothing); its
    /// address is the function half of the identity. State the observer needs
    /// lives on the receiver.
    pub fn method<R: Any>(receiver: &Rc<R>, f: fn(&R, &Notification<'_>)) -> Self {
        let identity = Identity::Method {
            receiver: Rc::as_ptr(receiver).cast::<()>() as usize,
            func: f as *const () as usize,
        };
        Self::bind(Rc::downgrade(receiver), identity, f)
    }

    /// Like [`Callback::method`], starting from a weak receiver.
    ///
    /// Fails with [`PropertyError::NotCallable`] if the receiver is already gone.
    pub fn from_weak<R: Any>(
        receiver: &Weak<R>,
        f: fn(&R, &Notification<'_>),
    ) -> Result<Self, PropertyError> {
        if receiver.strong_count() == 0 {
            return Err(PropertyError::NotCallable);
        }
        let identity = Identity::Method {
            receiver: Weak::as_ptr(receiver).cast::<()>() as usize,
            func: f as *const () as usize,
        };
        Ok(Self::bind(receiver.clone(), identity, f))
    }

    /// An internal link that calls `on_change(receiver, slot)`.
    pub(crate) fn edge<R: Any>(receiver: &Rc<R>, slot: u32, on_change: fn(Rc<R>, u32)) -> Self {
        let identity = Identity::Edge {
            receiver: Rc::as_ptr(receiver).cast::<()>() as usize,
            slot,
        };
        let invoke: Invoke = Rc::new(move |receiver: Rc<dyn Any>, _: &Notification<'_>| {
            if let Ok(receiver) = receiver.downcast::<R>() {
                on_change(receiver, slot);
            }
        });
        let receiver: Weak<R> = Rc::downgrade(receiver);
        let receiver: Weak<dyn Any> = receiver;
        Self {
            target: Target::Bound { receiver, invoke },
            identity,
        }
    }

    fn bind<R: Any>(receiver: Weak<R>, identity: Identity, f: fn(&R, &Notification<'_>)) -> Self {
        let invoke: Invoke = Rc::new(move |receiver: Rc<dyn Any>, n: &Notification<'_>| {
            if let Ok(receiver) = receiver.downcast::<R>() {
                f(&receiver, n);
            }
        });
        let receiver: Weak<dyn Any> = receiver;
        Self {
            target: Target::Bound { receiver, invoke },
            identity,
        }
    }

    /// Returns `false` once a method's receiver has been dropped.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        match &self.target {
            Target::Function(_) => true,
            Target::Bound { receiver, .. } => receiver.strong_count() > 0,
        }
    }

    /// Returns `true` for callbacks created with [`Callback::method`] or
    /// [`Callback::from_weak`].
    #[must_use]
    pub fn is_method(&self) -> bool {
        matches!(self.identity, Identity::Method { .. })
    }

    /// Returns `true` if both handles denote the same observer.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        self.identity == other.identity
    }

    /// Invokes the callback.
    ///
    /// Returns `false` without calling anything if the receiver is gone.
    pub fn call(&self, notification: &Notification<'_>) -> bool {
        match &self.target {
            Target::Function(f) => {
                f(notification);
                true
            }
            Target::Bound { receiver, invoke } => match receiver.upgrade() {
                Some(receiver) => {
                    invoke(receiver, notification);
                    true
                }
                None => false,
            },
        }
    }

    pub(crate) fn identity(&self) -> Identity {
        self.identity
    }

    pub(crate) fn is_edge(&self) -> bool {
        matches!(self.identity, Identity::Edge { .. })
    }

    pub(crate) fn receiver_addr(&self) -> Option<usize> {
        match self.identity {
            Identity::Function(_) => None,
            Identity::Method { receiver, .. } | Identity::Edge { receiver, .. } => Some(receiver),
        }
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.identity {
            Identity::Function(addr) => write!(f, "<function at {addr:#x}>"),
            Identity::Method { receiver, .. } => {
                write!(f, "<method bound to {receiver:#x}>")
            }
            Identity::Edge { receiver, slot } => {
                write!(f, "<link to {receiver:#x} slot {slot}>")
            }
        }
    }
}
