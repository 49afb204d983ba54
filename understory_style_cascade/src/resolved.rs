// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-widget result of cascade resolution.

use alloc::vec::Vec;

use understory_style_key::{ChangeFlags, ErasedValue, StyleKey, StyleKeyId, StyleRegistry, StyleValue};

/// The resolved values of one widget.
///
/// Holds an entry for every key that was declared by a matching rule or
/// inherited from the parent. Keys without an entry read as the registry
/// default through [`ResolvedStyle::value`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResolvedStyle {
    /// Sorted by `StyleKeyId`.
    entries: Vec<(StyleKeyId, ErasedValue)>,
}

impl ResolvedStyle {
    pub(crate) fn from_sorted(entries: Vec<(StyleKeyId, ErasedValue)>) -> Self {
        debug_assert!(
            entries.windows(2).all(|w| w[0].0 < w[1].0),
            "resolved entries must be sorted and unique"
        );
        Self { entries }
    }

    /// Returns the number of declared or inherited entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if every key reads as its default.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the entry for `id`, without default fallback.
    #[must_use]
    pub fn get_erased(&self, id: StyleKeyId) -> Option<&ErasedValue> {
        self.entries
            .binary_search_by_key(&id, |(key, _)| *key)
            .ok()
            .map(|idx| &self.entries[idx].1)
    }

    /// Returns the typed entry for `key`, without default fallback.
    #[must_use]
    pub fn get<T: StyleValue>(&self, key: StyleKey<T>) -> Option<&T> {
        self.get_erased(key.id())?.downcast_ref()
    }

    /// Returns the value for `key`, falling back to the registry default.
    #[must_use]
    pub fn value<'a, T: StyleValue>(
        &'a self,
        key: StyleKey<T>,
        registry: &'a StyleRegistry,
    ) -> Option<&'a T> {
        self.get(key).or_else(|| registry.default_value(key))
    }

    /// Iterates over entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (StyleKeyId, &ErasedValue)> + '_ {
        self.entries.iter().map(|(id, value)| (*id, value))
    }

    pub(crate) fn entries(&self) -> &[(StyleKeyId, ErasedValue)] {
        &self.entries
    }

    /// Compares effective values with `previous` and returns the union of
    /// [`ChangeFlags`] of every changed key, or `None` if nothing changed.
    ///
    /// A key present on one side only is compared against its default.
    #[must_use]
    pub fn diff(&self, previous: &Self, registry: &StyleRegistry) -> Option<ChangeFlags> {
        let mut changed: Option<ChangeFlags> = None;
        let mut note = |id: StyleKeyId| {
            *changed.get_or_insert_default() |= registry.affects(id);
        };
        let (mut a, mut b) = (self.entries.iter().peekable(), previous.entries.iter().peekable());
        loop {
            match (a.peek(), b.peek()) {
                (None, None) => break,
                (Some((id, value)), None) => {
                    if registry.default_erased(*id) != Some(value) {
                        note(*id);
                    }
                    a.next();
                }
                (None, Some((id, value))) => {
                    if registry.default_erased(*id) != Some(value) {
                        note(*id);
                    }
                    b.next();
                }
                (Some((ia, va)), Some((ib, vb))) => {
                    if ia == ib {
                        if va != vb {
                            note(*ia);
                        }
                        a.next();
                        b.next();
                    } else if ia < ib {
                        if registry.default_erased(*ia) != Some(va) {
                            note(*ia);
                        }
                        a.next();
                    } else {
                        if registry.default_erased(*ib) != Some(vb) {
                            note(*ib);
                        }
                        b.next();
                    }
                }
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn setup() -> (StyleRegistry, StyleKey<u32>, StyleKey<f64>) {
        let mut registry = StyleRegistry::new();
        let mut text = registry.define("Text").unwrap();
        let color = text.create_key::<u32>("Color", true).unwrap();
        let size = text
            .create_key_with(
                "Size",
                understory_style_key::KeyMetadata::new(14.0_f64)
                    .with_affects(ChangeFlags::LAYOUT),
            )
            .unwrap();
        let _ = text.finish();
        (registry, color, size)
    }

    #[test]
    fn value_falls_back_to_default() {
        let (registry, color, size) = setup();
        let style = ResolvedStyle::from_sorted(vec![(color.id(), ErasedValue::new(5_u32))]);
        assert_eq!(style.value(color, &registry), Some(&5));
        assert_eq!(style.value(size, &registry), Some(&14.0));
        assert_eq!(style.get(size), None);
    }

    #[test]
    fn diff_reports_affected_flags() {
        let (registry, color, size) = setup();
        let before = ResolvedStyle::from_sorted(vec![(color.id(), ErasedValue::new(5_u32))]);
        let same = before.clone();
        assert_eq!(same.diff(&before, &registry), None);

        let after = ResolvedStyle::from_sorted(vec![
            (color.id(), ErasedValue::new(5_u32)),
            (size.id(), ErasedValue::new(20.0_f64)),
        ]);
        assert_eq!(after.diff(&before, &registry), Some(ChangeFlags::LAYOUT));

        let recolored = ResolvedStyle::from_sorted(vec![(color.id(), ErasedValue::new(6_u32))]);
        assert_eq!(recolored.diff(&before, &registry), Some(ChangeFlags::PAINT));
    }

    #[test]
    fn explicit_default_is_not_a_change() {
        let (registry, _, size) = setup();
        let implicit = ResolvedStyle::default();
        let explicit = ResolvedStyle::from_sorted(vec![(size.id(), ErasedValue::new(14.0_f64))]);
        assert_eq!(explicit.diff(&implicit, &registry), None);
        assert_eq!(implicit.diff(&explicit, &registry), None);
    }
}
