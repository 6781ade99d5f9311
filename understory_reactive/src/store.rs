// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-object sparse property state.
//!
//! Every [`ReactiveObject`](crate::ReactiveObject) owns one [`PropertyStore`].
//! A slot is created the first time a property is read, written, observed or
//! batched on that object, so objects only pay for the properties they use.
//!
//! Slots live in a sorted `SmallVec` searched with binary search rather than a
//! hash map. The number of touched properties per object is small.

use alloc::vec::Vec;
use core::fmt;
use smallvec::SmallVec;

use crate::callback_container::CallbackContainer;
use crate::id::PropertyId;
use crate::metadata::Validator;
use crate::selection::{Choice, DisplayFunc};
use crate::value::Value;

/// Inline capacity for slots. Most objects touch only a handful of properties.
const INLINE_CAPACITY: usize = 4;

/// State of an active delay scope on one property.
#[derive(Debug)]
pub(crate) struct DelayState {
    /// Nesting depth; the scope flushes when this returns to zero.
    pub(crate) depth: u32,
    /// The value when the outermost scope was entered.
    pub(crate) snapshot: Value,
    /// A list or dict held by the property was mutated in place.
    pub(crate) in_place: bool,
}

/// Everything one object knows about one property.
#[derive(Default)]
pub(crate) struct Slot {
    /// `None` until the property is first initialized.
    pub(crate) value: Option<Value>,
    pub(crate) observers: CallbackContainer,
    /// Instance validators with their priorities.
    pub(crate) validators: Vec<(Validator, i32)>,
    pub(crate) disabled: bool,
    pub(crate) ignore_depth: u32,
    pub(crate) delay: Option<DelayState>,
    /// Per-instance choices of a selection property.
    pub(crate) choices: Option<Vec<Choice>>,
    pub(crate) display: Option<DisplayFunc>,
}

impl Slot {
    /// Returns `true` if a change must not be delivered right now.
    pub(crate) fn is_muted(&self) -> bool {
        self.disabled || self.ignore_depth > 0 || self.delay.is_some()
    }

    /// Instance validators, highest priority first.
    pub(crate) fn ordered_validators(&self) -> Vec<Validator> {
        let mut validators: Vec<_> = self.validators.iter().collect();
        validators.sort_by(|a, b| b.1.cmp(&a.1));
        validators.into_iter().map(|(v, _)| v.clone()).collect()
    }
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("value", &self.value)
            .field("observers", &self.observers.len())
            .field("validators", &self.validators.len())
            .field("disabled", &self.disabled)
            .field("ignore_depth", &self.ignore_depth)
            .field("delay", &self.delay)
            .field("choices", &self.choices)
            .field("has_display", &self.display.is_some())
            .finish()
    }
}

/// Sparse per-object storage, sorted by [`PropertyId`].
#[derive(Debug, Default)]
pub(crate) struct PropertyStore {
    entries: SmallVec<[(PropertyId, Slot); INLINE_CAPACITY]>,
}

impl PropertyStore {
    #[inline]
    fn find(&self, id: PropertyId) -> Result<usize, usize> {
        self.entries.binary_search_by_key(&id, |(pid, _)| *pid)
    }

    pub(crate) fn get(&self, id: PropertyId) -> Option<&Slot> {
        self.find(id).ok().map(|idx| &self.entries[idx].1)
    }

    pub(crate) fn get_mut(&mut self, id: PropertyId) -> Option<&mut Slot> {
        self.find(id).ok().map(|idx| &mut self.entries[idx].1)
    }

    /// Returns the slot for `id`, creating an empty one if needed.
    pub(crate) fn slot_mut(&mut self, id: PropertyId) -> &mut Slot {
        let idx = match self.find(id) {
            Ok(idx) => idx,
            Err(idx) => {
                self.entries.insert(idx, (id, Slot::default()));
                idx
            }
        };
        &mut self.entries[idx].1
    }

    /// The stored value, if the property has been initialized.
    pub(crate) fn value(&self, id: PropertyId) -> Option<&Value> {
        self.get(id).and_then(|slot| slot.value.as_ref())
    }

    /// Number of slots.
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
