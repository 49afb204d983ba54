// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Style key and definition identifiers.
//!
//! [`StyleKeyId`] identifies a key at runtime; [`StyleKey<T>`] adds the value
//! type as a phantom parameter so declarations and reads are checked at
//! compile time.

use core::fmt;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;

/// A runtime style key identifier.
///
/// Ids are dense indices into a [`StyleRegistry`](crate::StyleRegistry),
/// assigned in registration order.
///
/// ```rust
/// use understory_style_key::StyleKeyId;
///
/// let id = StyleKeyId::new(7);
/// assert_eq!(id.index(), 7);
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StyleKeyId(u16);

impl StyleKeyId {
    /// Creates a key id from a registry index.
    #[must_use]
    #[inline]
    pub const fn new(index: u16) -> Self {
        Self(index)
    }

    /// Returns the registry index of this key.
    #[must_use]
    #[inline]
    pub const fn index(self) -> u16 {
        self.0
    }
}

impl fmt::Debug for StyleKeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StyleKeyId").field(&self.0).finish()
    }
}

impl fmt::Display for StyleKeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StyleKeyId({})", self.0)
    }
}

/// Identifies a [`StyleDefinition`](crate::StyleDefinition) within a registry.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DefinitionId(u16);

impl DefinitionId {
    pub(crate) const fn new(index: u16) -> Self {
        Self(index)
    }

    /// Returns the registry index of this definition.
    #[must_use]
    #[inline]
    pub const fn index(self) -> u16 {
        self.0
    }
}

/// A typed handle to one styleable attribute.
///
/// Handles are created by
/// [`DefinitionBuilder::create_key`](crate::DefinitionBuilder::create_key) and
/// are `Copy`; the key's name, default value and inheritance flag live in the
/// registry that created it.
///
/// `StyleKey<T>` is the same size as [`StyleKeyId`].
pub struct StyleKey<T> {
    id: StyleKeyId,
    _marker: PhantomData<fn() -> T>,
}

impl<T> StyleKey<T> {
    /// Wraps a key id with a value type.
    ///
    /// Registries hand out typed keys directly; this is for loaders that
    /// recover a key from its id. Reads through a key whose type differs from
    /// the registered type return `None`.
    #[must_use]
    #[inline]
    pub const fn from_id(id: StyleKeyId) -> Self {
        Self {
            id,
            _marker: PhantomData,
        }
    }

    /// Returns the untyped id of this key.
    #[must_use]
    #[inline]
    pub const fn id(self) -> StyleKeyId {
        self.id
    }
}

impl<T> Copy for StyleKey<T> {}

impl<T> Clone for StyleKey<T> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> PartialEq for StyleKey<T> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for StyleKey<T> {}

impl<T> Hash for StyleKey<T> {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> fmt::Debug for StyleKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StyleKey")
            .field("id", &self.id)
            .field("type", &core::any::type_name::<T>())
            .finish()
    }
}
