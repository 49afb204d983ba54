// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-key metadata: default value, inheritance and change flags.

use bitflags::bitflags;

use crate::value::StyleValue;

bitflags! {
    /// What a change to a style key's resolved value affects downstream.
    ///
    /// Layout and paint code use these flags to decide between re-measuring
    /// and re-painting when a widget's resolved style changes.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ChangeFlags: u8 {
        /// The key feeds measurement or arrangement.
        const LAYOUT = 1 << 0;
        /// The key feeds painting only.
        const PAINT = 1 << 1;
    }
}

/// Registration-time configuration for a style key.
///
/// ```rust
/// use understory_style_key::{ChangeFlags, KeyMetadata};
///
/// let metadata = KeyMetadata::new(14.0_f32)
///     .with_inherits(true)
///     .with_affects(ChangeFlags::LAYOUT | ChangeFlags::PAINT);
///
/// assert_eq!(metadata.default_value(), &14.0);
/// assert!(metadata.inherits());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct KeyMetadata<T: StyleValue> {
    default_value: T,
    inherits: bool,
    affects: ChangeFlags,
}

impl<T: StyleValue> KeyMetadata<T> {
    /// Creates metadata with the given default.
    ///
    /// The key does not inherit and affects [`ChangeFlags::PAINT`] unless
    /// configured otherwise.
    #[must_use]
    pub fn new(default_value: T) -> Self {
        Self {
            default_value,
            inherits: false,
            affects: ChangeFlags::PAINT,
        }
    }

    /// Sets whether undeclared values fall back to the nearest ancestor.
    #[must_use]
    pub fn with_inherits(mut self, inherits: bool) -> Self {
        self.inherits = inherits;
        self
    }

    /// Sets what a change to this key affects.
    #[must_use]
    pub fn with_affects(mut self, affects: ChangeFlags) -> Self {
        self.affects = affects;
        self
    }

    /// Returns the default value.
    #[must_use]
    #[inline]
    pub fn default_value(&self) -> &T {
        &self.default_value
    }

    /// Returns whether the key inherits.
    #[must_use]
    #[inline]
    pub fn inherits(&self) -> bool {
        self.inherits
    }

    /// Returns what a change to this key affects.
    #[must_use]
    #[inline]
    pub fn affects(&self) -> ChangeFlags {
        self.affects
    }

    pub(crate) fn into_parts(self) -> (T, bool, ChangeFlags) {
        (self.default_value, self.inherits, self.affects)
    }
}
