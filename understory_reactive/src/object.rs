// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Observable objects.
//!
//! This module provides [`ReactiveObject`], an instance of a
//! [`PropertyRegistry`]. It owns the values and observers of its callback
//! properties and dispatches change notifications.
//!
//! # Dispatch
//!
//! A change to property `p` is delivered when the new value differs from the
//! old one, unless `p` is disabled, inside an ignore scope, or inside a delay
//! scope on this object. Delivery goes to `p`'s observers in priority order,
//! then to the object's global observers (always with the property name).
//!
//! No `RefCell` borrow is held while user code runs: observers, validators and
//! default factories may freely read and write the object.

use alloc::format;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use crate::bubble;
use crate::callback::{Callback, DeliveryMode, Notification};
use crate::callback_container::CallbackContainer;
use crate::dict::CallbackDict;
use crate::error::{ContainerKind, PropertyError};
use crate::id::PropertyId;
use crate::list::CallbackList;
use crate::metadata::{PropertyKind, PropertyMetadata, Validator};
use crate::registry::PropertyRegistry;
use crate::selection::{self, Choice, DisplayFunc, SelectionMetadata, valid_choices};
use crate::store::{DelayState, PropertyStore, Slot};
use crate::value::Value;

/// Wildcard name matching every callback property.
pub const ALL_PROPERTIES: &str = "*";

pub(crate) struct ObjectInner {
    registry: Rc<PropertyRegistry>,
    state: RefCell<ObjectState>,
}

#[derive(Debug, Default)]
struct ObjectState {
    store: PropertyStore,
    global: CallbackContainer,
}

/// An object with callback properties.
///
/// `ReactiveObject` is a handle: clones refer to the same object, and
/// [`Value::Object`] compares objects by identity.
///
/// # Example
///
/// ```rust
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use understory_reactive::{
///     Callback, DeliveryMode, PropertyMetadata, PropertyRegistry, ReactiveObject, Value,
/// };
///
/// let mut registry = PropertyRegistry::new();
/// registry.register("width", PropertyMetadata::new(1));
/// let object = ReactiveObject::new(&Rc::new(registry));
///
/// let seen = Rc::new(RefCell::new(Vec::new()));
/// let log = seen.clone();
/// object
///     .add_observer(
///         "width",
///         Callback::new(move |n| log.borrow_mut().push((n.old().cloned(), n.value().clone()))),
///         0,
///         DeliveryMode::ECHO_OLD,
///     )
///     .unwrap();
///
/// object.set("width", 2).unwrap();
/// object.set("width", 2).unwrap(); // unchanged: no notification
/// assert_eq!(*seen.borrow(), [(Some(Value::Int(1)), Value::Int(2))]);
/// ```
#[derive(Clone)]
pub struct ReactiveObject {
    inner: Rc<ObjectInner>,
}

impl ReactiveObject {
    /// Creates an object with the attributes of `registry`.
    #[must_use]
    pub fn new(registry: &Rc<PropertyRegistry>) -> Self {
        Self {
            inner: Rc::new(ObjectInner {
                registry: registry.clone(),
                state: RefCell::new(ObjectState::default()),
            }),
        }
    }

    /// The registry this object was created from.
    #[must_use]
    pub fn registry(&self) -> &Rc<PropertyRegistry> {
        &self.inner.registry
    }

    /// Returns `true` if both handles refer to the same object.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.inner).cast::<()>() as usize
    }

    // =========================================================================
    // Values
    // =========================================================================

    /// Reads a property. Aliases are followed.
    ///
    /// The first read initializes the property from its default or factory.
    ///
    /// # Errors
    ///
    /// [`PropertyError::UnknownAttribute`] or
    /// [`PropertyError::NotCallbackProperty`] if `name` does not resolve to a
    /// callback property.
    pub fn get(&self, name: &str) -> Result<Value, PropertyError> {
        let id = self.inner.registry.resolve(name)?;
        self.get_by_id(id)
    }

    /// Writes a property. Aliases are followed.
    ///
    /// The value goes through the declared validator, then instance
    /// validators, then the kind check (list, dict or selection membership).
    /// Any failure leaves the stored value untouched. Observers are notified
    /// only if the stored value changed.
    ///
    /// # Errors
    ///
    /// Name resolution errors as for [`get`](Self::get), validator errors,
    /// [`PropertyError::WrongContainerType`] and
    /// [`PropertyError::InvalidChoice`].
    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<(), PropertyError> {
        let id = self.inner.registry.resolve(name)?;
        self.set_by_id(id, value.into())
    }

    /// Reads a property by id.
    ///
    /// # Errors
    ///
    /// [`PropertyError::NotCallbackProperty`] if `id` is not a callback
    /// property of this object's registry.
    pub fn get_by_id(&self, id: PropertyId) -> Result<Value, PropertyError> {
        let metadata = self.metadata(id)?;
        Ok(self.value(id, metadata))
    }

    /// Writes a property by id. See [`set`](Self::set).
    ///
    /// # Errors
    ///
    /// As [`set`](Self::set).
    pub fn set_by_id(&self, id: PropertyId, value: Value) -> Result<(), PropertyError> {
        let metadata = self.metadata(id)?;
        let mut value = metadata.validate(value)?;
        let validators = self
            .inner
            .state
            .borrow()
            .store
            .get(id)
            .map(Slot::ordered_validators)
            .unwrap_or_default();
        for validator in validators {
            value = validator(&value)?;
        }
        self.check_kind(id, metadata, &value)?;

        if let Some(computed) = metadata.computed() {
            let old = computed.get(self);
            computed.set(self, value)?;
            let new = computed.get(self);
            if old != new {
                self.notify(id, &old, &new);
            }
            return Ok(());
        }

        let old = self.value(id, metadata);
        let new = self.adopt(id, metadata.kind(), value);
        self.inner.state.borrow_mut().store.slot_mut(id).value = Some(new.clone());
        if !old.same_handle(&new) {
            self.release(id, metadata.kind(), &old);
        }
        if old != new {
            self.notify(id, &old, &new);
        }
        Ok(())
    }

    fn metadata(&self, id: PropertyId) -> Result<&PropertyMetadata, PropertyError> {
        self.inner
            .registry
            .metadata(id)
            .ok_or_else(|| PropertyError::NotCallbackProperty {
                name: self.name_of(id).into(),
            })
    }

    fn name_of(&self, id: PropertyId) -> &'static str {
        self.inner.registry.name(id).unwrap_or("<unregistered>")
    }

    /// The current value, initializing the property if needed.
    fn value(&self, id: PropertyId, metadata: &PropertyMetadata) -> Value {
        if let Some(computed) = metadata.computed() {
            return computed.get(self);
        }
        if let Some(value) = self.inner.state.borrow().store.value(id) {
            return value.clone();
        }
        let initial = self.adopt(id, metadata.kind(), metadata.initial_value());
        let mut state = self.inner.state.borrow_mut();
        let slot = state.store.slot_mut(id);
        if let Some(existing) = &slot.value {
            // The factory initialized the property itself.
            let existing = existing.clone();
            drop(state);
            self.release(id, metadata.kind(), &initial);
            return existing;
        }
        slot.value = Some(initial.clone());
        initial
    }

    /// The stored value without initializing. Computed properties are read
    /// through their getter.
    fn stored(&self, id: PropertyId) -> Option<Value> {
        if let Some(computed) = self.metadata(id).ok().and_then(PropertyMetadata::computed) {
            return Some(computed.get(self));
        }
        self.inner.state.borrow().store.value(id).cloned()
    }

    fn check_kind(
        &self,
        id: PropertyId,
        metadata: &PropertyMetadata,
        value: &Value,
    ) -> Result<(), PropertyError> {
        let expected = match metadata.kind() {
            PropertyKind::Scalar | PropertyKind::Computed(_) => return Ok(()),
            PropertyKind::List if matches!(value, Value::List(_)) => return Ok(()),
            PropertyKind::Dict if matches!(value, Value::Dict(_)) => return Ok(()),
            PropertyKind::List => ContainerKind::List,
            PropertyKind::Dict => ContainerKind::Dict,
            PropertyKind::Selection(selection) => {
                if value.is_none() {
                    return Ok(());
                }
                let valid = self.current_valid_choices(id, selection);
                if valid.contains(value) {
                    return Ok(());
                }
                return Err(PropertyError::InvalidChoice {
                    value: value.clone(),
                    choices: valid,
                });
            }
        };
        Err(PropertyError::WrongContainerType {
            name: self.name_of(id).into(),
            expected,
        })
    }

    /// Stores lists and dicts of list and dict properties in a fresh wrapper
    /// linked to this object.
    fn adopt(&self, id: PropertyId, kind: &PropertyKind, value: Value) -> Value {
        let wrapped = match kind {
            PropertyKind::List => {
                let items = value.as_list().map(CallbackList::to_vec).unwrap_or_default();
                Value::List(items.into_iter().collect())
            }
            PropertyKind::Dict => {
                let entries = value.as_dict().map(CallbackDict::to_vec).unwrap_or_default();
                Value::Dict(entries.into_iter().collect())
            }
            _ => return value,
        };
        bubble::attach(&wrapped, &self.owner_link(id));
        wrapped
    }

    /// Undoes [`adopt`](Self::adopt) for a value the property no longer holds.
    fn release(&self, id: PropertyId, kind: &PropertyKind, value: &Value) {
        if matches!(kind, PropertyKind::List | PropertyKind::Dict) {
            bubble::detach(value, &self.owner_link(id));
        }
    }

    fn owner_link(&self, id: PropertyId) -> Callback {
        Callback::edge(&self.inner, u32::from(id.index()), |inner, slot| {
            if let Ok(index) = u16::try_from(slot) {
                Self { inner }.container_changed(PropertyId::new(index));
            }
        })
    }

    /// A list or dict held by property `id` was mutated in place.
    fn container_changed(&self, id: PropertyId) {
        let value = {
            let mut state = self.inner.state.borrow_mut();
            let Some(slot) = state.store.get_mut(id) else {
                return;
            };
            if let Some(delay) = &mut slot.delay {
                delay.in_place = true;
                return;
            }
            match &slot.value {
                Some(value) => value.clone(),
                None => return,
            }
        };
        self.notify(id, &value, &value);
    }

    /// Delivers a change of property `id` unless it is muted.
    fn notify(&self, id: PropertyId, old: &Value, new: &Value) {
        let (observers, globals) = {
            let mut state = self.inner.state.borrow_mut();
            let state = &mut *state;
            let slot = state.store.slot_mut(id);
            if slot.is_muted() {
                return;
            }
            (slot.observers.snapshot(true), state.global.snapshot(true))
        };
        let name = self.name_of(id);
        tracing::trace!(
            property = name,
            observers = observers.len(),
            global = globals.len(),
            "dispatching change"
        );
        for (callback, mode) in &observers {
            callback.call(&Notification::for_mode(*mode, name, old, new));
        }
        for (callback, mode) in &globals {
            let mode = *mode | DeliveryMode::ECHO_NAME;
            callback.call(&Notification::for_mode(mode, name, old, new));
        }
    }

    // =========================================================================
    // Observers
    // =========================================================================

    /// Adds an observer to property `name`.
    ///
    /// `"*"` ([`ALL_PROPERTIES`]) adds it to every callback property, with
    /// [`DeliveryMode::ECHO_NAME`] added to `mode`.
    ///
    /// Returns `Ok(false)` if the observer was already registered at
    /// `priority` (on every property, for `"*"`).
    ///
    /// # Errors
    ///
    /// Name resolution errors as for [`get`](Self::get), and
    /// [`PropertyError::NotCallable`] if the callback's receiver is gone.
    pub fn add_observer(
        &self,
        name: &str,
        callback: Callback,
        priority: i32,
        mode: DeliveryMode,
    ) -> Result<bool, PropertyError> {
        if name == ALL_PROPERTIES {
            let mode = mode | DeliveryMode::ECHO_NAME;
            let mut added = false;
            let mut state = self.inner.state.borrow_mut();
            for id in self.inner.registry.callback_property_ids() {
                let slot = state.store.slot_mut(id);
                added |= slot.observers.append(callback.clone(), priority, mode)?;
            }
            return Ok(added);
        }
        let id = self.inner.registry.resolve(name)?;
        self.inner
            .state
            .borrow_mut()
            .store
            .slot_mut(id)
            .observers
            .append(callback, priority, mode)
    }

    /// Removes every registration of `callback` from property `name`, or from
    /// every property for `"*"`.
    ///
    /// # Errors
    ///
    /// Name resolution errors as for [`get`](Self::get), and
    /// [`PropertyError::CallbackNotFound`] if nothing was removed.
    pub fn remove_observer(&self, name: &str, callback: &Callback) -> Result<(), PropertyError> {
        let removed = if name == ALL_PROPERTIES {
            let mut state = self.inner.state.borrow_mut();
            self.inner
                .registry
                .callback_property_ids()
                .map(|id| state.store.slot_mut(id).observers.remove(callback))
                .sum::<usize>()
        } else {
            let id = self.inner.registry.resolve(name)?;
            self.inner
                .state
                .borrow_mut()
                .store
                .get_mut(id)
                .map_or(0, |slot| slot.observers.remove(callback))
        };
        if removed == 0 {
            return Err(PropertyError::CallbackNotFound {
                name: name.into(),
                callback: format!("{callback:?}"),
            });
        }
        Ok(())
    }

    /// Returns `true` if `callback` observes property `name`.
    ///
    /// # Errors
    ///
    /// Name resolution errors as for [`get`](Self::get).
    pub fn has_observer(&self, name: &str, callback: &Callback) -> Result<bool, PropertyError> {
        let id = self.inner.registry.resolve_quiet(name)?;
        Ok(self
            .inner
            .state
            .borrow()
            .store
            .get(id)
            .is_some_and(|slot| slot.observers.contains(callback, None)))
    }

    /// The number of live observers of property `name`.
    ///
    /// # Errors
    ///
    /// Name resolution errors as for [`get`](Self::get).
    pub fn observer_count(&self, name: &str) -> Result<usize, PropertyError> {
        let id = self.inner.registry.resolve_quiet(name)?;
        Ok(self
            .inner
            .state
            .borrow()
            .store
            .get(id)
            .map_or(0, |slot| slot.observers.observer_count()))
    }

    /// Adds an observer for every property change of this object. Global
    /// observers always receive the property name.
    ///
    /// # Errors
    ///
    /// [`PropertyError::NotCallable`] if the callback's receiver is gone.
    pub fn add_global_observer(
        &self,
        callback: Callback,
        priority: i32,
    ) -> Result<bool, PropertyError> {
        self.inner
            .state
            .borrow_mut()
            .global
            .append(callback, priority, DeliveryMode::ECHO_NAME)
    }

    /// Removes a global observer. Returns `false` if it was not registered.
    ///
    /// Unlike [`remove_observer`](Self::remove_observer) there is no name to
    /// resolve, and a miss is not an error: this matches
    /// [`CallbackList::remove_callback`] and
    /// [`CallbackDict::remove_callback`], which also report a miss as `false`.
    pub fn remove_global_observer(&self, callback: &Callback) -> bool {
        self.inner.state.borrow_mut().global.remove(callback) > 0
    }

    /// The number of live global observers. Links from containers holding
    /// this object are not counted.
    #[must_use]
    pub fn global_observer_count(&self) -> usize {
        self.inner.state.borrow().global.observer_count()
    }

    pub(crate) fn link_global(&self, link: Callback) {
        self.inner.state.borrow_mut().global.link(link);
    }

    pub(crate) fn unlink_global(&self, link: &Callback) {
        self.inner.state.borrow_mut().global.remove(link);
    }

    pub(crate) fn global_links_into(&self, receiver: usize) -> usize {
        self.inner.state.borrow().global.links_into(receiver)
    }

    // =========================================================================
    // Validation and muting
    // =========================================================================

    /// Adds a validator to property `name` on this object only.
    ///
    /// Instance validators run after the declared validator, highest
    /// priority first, each receiving the previous one's output.
    ///
    /// # Errors
    ///
    /// Name resolution errors as for [`get`](Self::get).
    pub fn add_validator<F>(&self, name: &str, validator: F, priority: i32) -> Result<(), PropertyError>
    where
        F: Fn(&Value) -> Result<Value, PropertyError> + 'static,
    {
        let id = self.inner.registry.resolve(name)?;
        let validator: Validator = Rc::new(validator);
        self.inner
            .state
            .borrow_mut()
            .store
            .slot_mut(id)
            .validators
            .push((validator, priority));
        Ok(())
    }

    /// Re-enables notifications for property `name`.
    ///
    /// # Errors
    ///
    /// Name resolution errors as for [`get`](Self::get).
    pub fn enable(&self, name: &str) -> Result<(), PropertyError> {
        self.set_enabled(name, true)
    }

    /// Stops notifications for property `name`. Values are still stored.
    ///
    /// # Errors
    ///
    /// Name resolution errors as for [`get`](Self::get).
    pub fn disable(&self, name: &str) -> Result<(), PropertyError> {
        self.set_enabled(name, false)
    }

    fn set_enabled(&self, name: &str, enabled: bool) -> Result<(), PropertyError> {
        let id = self.inner.registry.resolve(name)?;
        self.inner.state.borrow_mut().store.slot_mut(id).disabled = !enabled;
        Ok(())
    }

    /// Returns `false` while property `name` is disabled.
    ///
    /// # Errors
    ///
    /// Name resolution errors as for [`get`](Self::get).
    pub fn is_enabled(&self, name: &str) -> Result<bool, PropertyError> {
        let id = self.inner.registry.resolve_quiet(name)?;
        Ok(!self
            .inner
            .state
            .borrow()
            .store
            .get(id)
            .is_some_and(|slot| slot.disabled))
    }

    // =========================================================================
    // Batching internals (see `batch`)
    // =========================================================================

    pub(crate) fn resolve_for_batch(&self, name: &str) -> Result<PropertyId, PropertyError> {
        self.inner.registry.resolve(name)
    }

    pub(crate) fn begin_delay(&self, id: PropertyId) {
        {
            let mut state = self.inner.state.borrow_mut();
            if let Some(delay) = state.store.get_mut(id).and_then(|s| s.delay.as_mut()) {
                delay.depth += 1;
                return;
            }
        }
        let Ok(metadata) = self.metadata(id) else {
            return;
        };
        let snapshot = self.value(id, metadata);
        self.inner.state.borrow_mut().store.slot_mut(id).delay = Some(DelayState {
            depth: 1,
            snapshot,
            in_place: false,
        });
    }

    pub(crate) fn end_delay(&self, id: PropertyId, flush: bool) {
        let finished = {
            let mut state = self.inner.state.borrow_mut();
            let Some(slot) = state.store.get_mut(id) else {
                return;
            };
            let Some(delay) = slot.delay.as_mut() else {
                return;
            };
            delay.depth -= 1;
            if delay.depth > 0 {
                return;
            }
            slot.delay.take()
        };
        let (Some(delay), Some(current)) = (finished, self.stored(id)) else {
            return;
        };
        let name = self.name_of(id);
        if !flush {
            tracing::trace!(property = name, "delayed change discarded");
            return;
        }
        if delay.in_place || delay.snapshot != current {
            tracing::trace!(property = name, "flushing delayed change");
            self.notify(id, &delay.snapshot, &current);
        }
    }

    pub(crate) fn begin_ignore(&self, id: PropertyId) {
        self.inner.state.borrow_mut().store.slot_mut(id).ignore_depth += 1;
    }

    pub(crate) fn end_ignore(&self, id: PropertyId) {
        if let Some(slot) = self.inner.state.borrow_mut().store.get_mut(id) {
            slot.ignore_depth = slot.ignore_depth.saturating_sub(1);
        }
    }

    // =========================================================================
    // Selection
    // =========================================================================

    fn selection(&self, name: &str) -> Result<(PropertyId, &SelectionMetadata), PropertyError> {
        let id = self.inner.registry.resolve(name)?;
        let selection = self
            .metadata(id)?
            .selection()
            .ok_or_else(|| PropertyError::NotASelection { name: name.into() })?;
        Ok((id, selection))
    }

    fn current_valid_choices(&self, id: PropertyId, selection: &SelectionMetadata) -> Vec<Value> {
        self.inner
            .state
            .borrow()
            .store
            .get(id)
            .and_then(|slot| slot.choices.as_deref())
            .map_or_else(|| selection.valid_default_choices(), valid_choices)
    }

    /// The choices of selection property `name` on this object, separators
    /// included.
    ///
    /// # Errors
    ///
    /// Name resolution errors as for [`get`](Self::get), and
    /// [`PropertyError::NotASelection`].
    pub fn choices(&self, name: &str) -> Result<Vec<Choice>, PropertyError> {
        let (id, selection) = self.selection(name)?;
        Ok(self
            .inner
            .state
            .borrow()
            .store
            .get(id)
            .and_then(|slot| slot.choices.clone())
            .unwrap_or_else(|| selection.default_choices().to_vec()))
    }

    /// The selectable choices of selection property `name` on this object.
    ///
    /// # Errors
    ///
    /// As [`choices`](Self::choices).
    pub fn valid_choices(&self, name: &str) -> Result<Vec<Value>, PropertyError> {
        let (id, selection) = self.selection(name)?;
        Ok(self.current_valid_choices(id, selection))
    }

    /// Replaces the choices of selection property `name` on this object.
    ///
    /// The current value is kept if it is still a valid choice; otherwise the
    /// property falls back to the choice at the declared default index and
    /// observers are notified.
    ///
    /// # Errors
    ///
    /// As [`choices`](Self::choices).
    pub fn set_choices(
        &self,
        name: &str,
        choices: impl IntoIterator<Item = Choice>,
    ) -> Result<(), PropertyError> {
        let (id, selection) = self.selection(name)?;
        let choices: Vec<Choice> = choices.into_iter().collect();
        let valid = valid_choices(&choices);
        self.inner.state.borrow_mut().store.slot_mut(id).choices = Some(choices);

        let current = self.get_by_id(id)?;
        let next = selection.fallback(&current, &valid);
        if next != current {
            self.inner.state.borrow_mut().store.slot_mut(id).value = Some(next.clone());
            self.notify(id, &current, &next);
        }
        Ok(())
    }

    /// Sets the display function of selection property `name` on this
    /// object. This never affects validation.
    ///
    /// # Errors
    ///
    /// As [`choices`](Self::choices).
    pub fn set_display_func<F>(&self, name: &str, display: F) -> Result<(), PropertyError>
    where
        F: Fn(&Value) -> String + 'static,
    {
        let (id, _) = self.selection(name)?;
        let display: DisplayFunc = Rc::new(display);
        self.inner.state.borrow_mut().store.slot_mut(id).display = Some(display);
        Ok(())
    }

    /// The label a user interface shows for `value` as a choice of selection
    /// property `name`. Lists and dicts have no label unless a display
    /// function provides one.
    ///
    /// # Errors
    ///
    /// As [`choices`](Self::choices).
    pub fn display_label(&self, name: &str, value: &Value) -> Result<Option<String>, PropertyError> {
        let (id, selection) = self.selection(name)?;
        let display = self
            .inner
            .state
            .borrow()
            .store
            .get(id)
            .and_then(|slot| slot.display.clone())
            .or_else(|| selection.display().cloned());
        Ok(selection::display_label(display.as_ref(), value))
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// Returns `true` if `name` is a callback property or an alias of one.
    #[must_use]
    pub fn is_callback_property(&self, name: &str) -> bool {
        self.inner.registry.is_callback_property(name)
    }

    /// Returns `true` if `name` is an alias.
    #[must_use]
    pub fn is_alias(&self, name: &str) -> bool {
        self.inner.registry.is_alias(name)
    }

    /// Names of the callback properties, aliases excluded.
    #[must_use]
    pub fn callback_properties(&self) -> Vec<&'static str> {
        self.inner.registry.callback_properties()
    }

    /// Iterates over `(name, value)` for every callback property, aliases
    /// excluded.
    pub fn iter_callback_properties(&self) -> impl Iterator<Item = (&'static str, Value)> + '_ {
        self.inner
            .registry
            .iter_callback_properties()
            .map(|p| (p.name(), self.value(p.id(), p.metadata())))
    }
}

impl fmt::Debug for ReactiveObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("ReactiveObject");
        s.field("addr", &format_args!("{:#x}", self.addr()));
        if let Ok(state) = self.inner.state.try_borrow() {
            s.field("slots", &state.store.len())
                .field("global_observers", &state.global.observer_count());
        }
        s.finish_non_exhaustive()
    }
}
