// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Reactive: observable callback properties.
//!
//! This crate lets a type declare named properties whose assignment notifies
//! a list of observers. Notifications can be delayed or ignored in nested
//! scopes, lists and dicts held by properties report in-place mutations to
//! the owning property, and properties can be renamed behind aliases.
//!
//! ## Core Concepts
//!
//! ### Registry and objects
//!
//! A [`PropertyRegistry`] describes a type: its callback properties, aliases
//! and plain attributes. It is built once and shared by `Rc` among all
//! [`ReactiveObject`]s created from it. Each object stores its own values and
//! observers, created lazily on first use.
//!
//! ### Observers
//!
//! A [`Callback`] is either a closure or a method on an `Rc` receiver. Method
//! observers hold their receiver weakly and disappear once it is dropped, so
//! an object can observe itself without a reference cycle. Observers are kept
//! in a [`CallbackContainer`] with priorities; each chooses what it receives
//! through [`DeliveryMode`].
//!
//! ### Key Operations
//!
//! - `get(name)` / `set(name, value)`: read and write; unchanged values never notify
//! - `add_observer(name, callback, priority, mode)`: `"*"` observes every property
//! - `delay(names)` / `ignore(names)`: scoped batching, see [`BatchGuard`]
//! - `set_choices(name, choices)`: selection properties, see [`SelectionBuilder`]
//! - [`PropertyMetadataBuilder::computed`]: properties backed by a getter and a setter
//!
//! ## Quick Start
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use understory_reactive::{
//!     AliasMetadata, Callback, DeliveryMode, PropertyMetadataBuilder, PropertyRegistry,
//!     ReactiveObject, SelectionBuilder, Value,
//! };
//!
//! let mut registry = PropertyRegistry::new();
//! registry.register("points", PropertyMetadataBuilder::list().build());
//! registry.register(
//!     "color",
//!     SelectionBuilder::new().values(["red", "green", "blue"]).build(),
//! );
//! registry.register_alias("colour", AliasMetadata::new("color"));
//! let registry = Rc::new(registry);
//!
//! let layer = ReactiveObject::new(&registry);
//! let log = Rc::new(RefCell::new(Vec::new()));
//! let sink = log.clone();
//! layer
//!     .add_observer(
//!         "*",
//!         Callback::new(move |n| sink.borrow_mut().push(n.name().unwrap_or("").to_owned())),
//!         0,
//!         DeliveryMode::VALUE,
//!     )
//!     .unwrap();
//!
//! // Aliases write through to their target.
//! layer.set("colour", "blue").unwrap();
//! assert_eq!(layer.get("color").unwrap(), Value::from("blue"));
//! assert!(layer.set("color", "purple").is_err());
//!
//! // In-place mutation of a held list notifies the owning property.
//! layer.get("points").unwrap().as_list().unwrap().append(3);
//!
//! // Inside a delay scope, observers fire once at the end.
//! {
//!     let _delay = layer.delay(&["color"]).unwrap();
//!     layer.set("color", "red").unwrap();
//!     layer.set("color", "green").unwrap();
//! }
//!
//! assert_eq!(*log.borrow(), ["color", "points", "color"]);
//! ```
//!
//! ## Reactive containers
//!
//! [`CallbackList`] and [`CallbackDict`] are shared handles that notify their
//! own observers on every mutation. Nested lists, dicts and objects are linked
//! to the container that holds them while, and only while, they are present;
//! [`Value::link_count`] exposes the links for inspection.
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`. The default `std` feature makes
//! batching guards discard held-back notifications when dropped during a
//! panic.

#![no_std]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

mod alias;
mod batch;
mod bubble;
mod callback;
mod callback_container;
mod dict;
mod error;
mod id;
mod list;
mod metadata;
mod object;
mod registry;
mod selection;
mod store;
mod value;

pub use alias::{AliasMetadata, AliasRef};
pub use batch::{BatchGuard, BatchKind};
pub use callback::{Callback, DeliveryMode, Notification};
pub use callback_container::CallbackContainer;
pub use dict::CallbackDict;
pub use error::{ContainerKind, PropertyError};
pub use id::PropertyId;
pub use list::CallbackList;
pub use metadata::{
    CoerceValueCallback, Computed, ComputedGetter, ComputedSetter, DefaultFactory, DefaultValue,
    PropertyKind, PropertyMetadata, PropertyMetadataBuilder, Validator,
};
pub use object::{ALL_PROPERTIES, ReactiveObject};
pub use registry::{AttributeKind, PropertyRef, PropertyRegistry};
pub use selection::{
    Choice, DisplayFunc, SelectionBuilder, SelectionMetadata, fallback_selection, valid_choices,
};
pub use value::Value;
