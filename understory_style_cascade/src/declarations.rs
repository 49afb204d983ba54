// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-rule declaration blocks.

use alloc::rc::Rc;
use alloc::vec::Vec;

use understory_style_key::{ErasedValue, StyleKey, StyleKeyId, StyleRegistry, StyleValue};

use crate::stylesheet::SheetError;

/// The `key → value` mapping of one rule.
///
/// Immutable and `Rc`-backed, so a block can be shared between rules and
/// cloned cheaply. Entries are sorted by key id and unique per key.
///
/// ```rust
/// use understory_style_cascade::Declarations;
/// use understory_style_key::StyleRegistry;
///
/// let mut registry = StyleRegistry::new();
/// let mut border = registry.define("Border").unwrap();
/// let width = border.create_key::<f64>("Width", false).unwrap();
/// let _ = border.finish();
///
/// let decls = Declarations::builder().set(width, 1.0).set(width, 2.0).build();
/// assert_eq!(decls.len(), 1);
/// assert_eq!(decls.get(width), Some(&2.0));
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Declarations {
    entries: Rc<[(StyleKeyId, ErasedValue)]>,
}

impl Declarations {
    /// Returns a builder for a declaration block.
    #[must_use]
    pub fn builder() -> DeclarationsBuilder {
        DeclarationsBuilder::default()
    }

    /// Returns the number of declared keys.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is declared.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the declared value for `key`.
    ///
    /// `None` if the key is undeclared or the stored value has another type.
    #[must_use]
    pub fn get<T: StyleValue>(&self, key: StyleKey<T>) -> Option<&T> {
        self.get_erased(key.id())?.downcast_ref()
    }

    /// Returns the declared value for `id` without downcasting.
    #[must_use]
    pub fn get_erased(&self, id: StyleKeyId) -> Option<&ErasedValue> {
        self.entries
            .binary_search_by_key(&id, |(key, _)| *key)
            .ok()
            .map(|idx| &self.entries[idx].1)
    }

    /// Returns `true` if `id` is declared.
    #[must_use]
    pub fn contains(&self, id: StyleKeyId) -> bool {
        self.entries
            .binary_search_by_key(&id, |(key, _)| *key)
            .is_ok()
    }

    /// Iterates over `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (StyleKeyId, &ErasedValue)> + '_ {
        self.entries.iter().map(|(id, value)| (*id, value))
    }

    /// Iterates over declared keys in key order.
    pub fn key_ids(&self) -> impl Iterator<Item = StyleKeyId> + '_ {
        self.entries.iter().map(|(id, _)| *id)
    }
}

/// Builder for [`Declarations`].
#[derive(Debug, Default)]
pub struct DeclarationsBuilder {
    entries: Vec<(StyleKeyId, ErasedValue)>,
}

impl DeclarationsBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a typed value. A later value for the same key replaces the
    /// earlier one.
    #[must_use]
    pub fn set<T: StyleValue>(self, key: StyleKey<T>, value: T) -> Self {
        self.set_erased(key.id(), ErasedValue::new(value))
    }

    /// Declares an already erased value.
    ///
    /// The value's type is checked against the key when the owning sheet is
    /// built.
    #[must_use]
    pub fn set_erased(mut self, id: StyleKeyId, value: ErasedValue) -> Self {
        match self.entries.binary_search_by_key(&id, |(key, _)| *key) {
            Ok(idx) => self.entries[idx].1 = value,
            Err(idx) => self.entries.insert(idx, (id, value)),
        }
        self
    }

    /// Declares a value for the key `definition.name`, as loaders reading
    /// textual sheets do.
    ///
    /// # Errors
    ///
    /// Returns [`SheetError::UnknownName`] if the registry has no such key.
    pub fn set_by_name<T: StyleValue>(
        self,
        registry: &StyleRegistry,
        definition: &str,
        name: &str,
        value: T,
    ) -> Result<Self, SheetError> {
        let Some(id) = registry.key_by_name(definition, name) else {
            return Err(SheetError::UnknownName {
                definition: definition.into(),
                name: name.into(),
            });
        };
        Ok(self.set_erased(id, ErasedValue::new(value)))
    }

    /// Finishes the block.
    #[must_use]
    pub fn build(self) -> Declarations {
        Declarations {
            entries: self.entries.into(),
        }
    }
}
