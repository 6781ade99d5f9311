// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Attribute identification.
//!
//! This module provides [`PropertyId`], the compact handle a
//! [`PropertyRegistry`](crate::PropertyRegistry) hands out for every attribute
//! it registers (callback properties, aliases and plain attributes alike).

use core::fmt;

/// A runtime attribute identifier.
///
/// This is a lightweight handle (u16) that identifies an attribute within the
/// [`PropertyRegistry`](crate::PropertyRegistry) that registered it. Ids are
/// dense and assigned in registration order, which is also the order used when
/// listing callback properties.
///
/// # Example
///
/// ```rust
/// use understory_reactive::PropertyId;
///
/// let id = PropertyId::new(42);
/// assert_eq!(id.index(), 42);
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PropertyId(u16);

impl PropertyId {
    /// Creates a new property ID from the given index.
    ///
    /// This is typically called by the registry rather than directly.
    #[must_use]
    #[inline]
    pub const fn new(index: u16) -> Self {
        Self(index)
    }

    /// Returns the underlying index of this property ID.
    #[must_use]
    #[inline]
    pub const fn index(self) -> u16 {
        self.0
    }

    #[inline]
    pub(crate) const fn slot(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PropertyId").field(&self.0).finish()
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PropertyId({})", self.0)
    }
}
