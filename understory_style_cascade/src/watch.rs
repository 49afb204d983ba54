// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Watch rules: live observers of mutable selector fragments.
//!
//! Resolving a widget consults classes and pseudo-classes of the widget itself
//! and, for combinator rules, of its ancestors. Each consulted
//! `(target, fragment)` pair gets exactly one [`WatchRule`], shared by every
//! widget whose resolved style depended on it. When the fragment flips, the
//! owners are invalidated.

use core::fmt::Debug;
use core::hash::{Hash, Hasher};

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::selector::{ClassId, PseudoClassId, SelectorInputs};

/// The kind of mutable selector fragment a watch rule observes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum WatchFragment {
    /// Matches while the target carries this pseudo-class.
    PseudoClass(PseudoClassId),
    /// Matches while the target carries this class.
    Class(ClassId),
}

impl WatchFragment {
    /// Returns `true` if the fragment is present in `inputs`.
    #[must_use]
    pub fn is_present(&self, inputs: &SelectorInputs<'_>) -> bool {
        match *self {
            Self::PseudoClass(pseudo) => inputs.has_pseudo(pseudo),
            Self::Class(class) => inputs.has_class(class),
        }
    }
}

/// Identity of a watch rule: the observed widget and fragment.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct WatchKey<K> {
    /// The widget whose state is observed.
    pub target: K,
    /// The observed fragment.
    pub fragment: WatchFragment,
}

impl<K> WatchKey<K> {
    /// Creates a watch key.
    #[must_use]
    pub const fn new(target: K, fragment: WatchFragment) -> Self {
        Self { target, fragment }
    }
}

/// Lifecycle state of a [`WatchRule`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum WatchState {
    /// Created but not yet evaluated.
    #[default]
    Unattached,
    /// Attached; the fragment is currently present.
    Matching,
    /// Attached; the fragment is currently absent.
    NotMatching,
    /// Torn down; notifications are ignored.
    Detached,
}

impl WatchState {
    /// Returns `true` in the two attached states.
    #[must_use]
    pub fn is_attached(self) -> bool {
        matches!(self, Self::Matching | Self::NotMatching)
    }

    fn from_truth(matching: bool) -> Self {
        if matching {
            Self::Matching
        } else {
            Self::NotMatching
        }
    }
}

/// A live observer of one `(target, fragment)` pair.
///
/// Equality and hashing use the [`WatchKey`] only.
///
/// ```rust
/// use understory_style_cascade::{PseudoClassId, WatchFragment, WatchKey, WatchRule, WatchState};
///
/// let hover = WatchFragment::PseudoClass(PseudoClassId(1));
/// let mut rule = WatchRule::new(WatchKey::new(7_u32, hover), false);
/// assert!(!rule.observe(true));
///
/// rule.attach(false);
/// assert_eq!(rule.state(), WatchState::NotMatching);
/// assert!(rule.observe(true));
/// assert!(!rule.observe(true));
///
/// rule.detach();
/// assert!(!rule.observe(false));
/// ```
#[derive(Clone, Debug)]
pub struct WatchRule<K> {
    key: WatchKey<K>,
    state: WatchState,
    owners: SmallVec<[K; 2]>,
    affects_inherited: bool,
}

impl<K: Copy + Eq> WatchRule<K> {
    /// Creates an unattached rule without owners.
    #[must_use]
    pub fn new(key: WatchKey<K>, affects_inherited: bool) -> Self {
        Self {
            key,
            state: WatchState::Unattached,
            owners: SmallVec::new(),
            affects_inherited,
        }
    }

    /// Returns the rule's identity.
    #[must_use]
    pub fn key(&self) -> WatchKey<K> {
        self.key
    }

    /// Returns the observed widget.
    #[must_use]
    pub fn target(&self) -> K {
        self.key.target
    }

    /// Returns the observed fragment.
    #[must_use]
    pub fn fragment(&self) -> WatchFragment {
        self.key.fragment
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub fn state(&self) -> WatchState {
        self.state
    }

    /// Returns the widgets whose resolved style consulted this fragment.
    #[must_use]
    pub fn owners(&self) -> &[K] {
        &self.owners
    }

    /// Returns `true` if a flip can change inherited values below the owners.
    #[must_use]
    pub fn affects_inherited(&self) -> bool {
        self.affects_inherited
    }

    /// Records the fragment's current truth and starts observing.
    ///
    /// Only valid from [`WatchState::Unattached`]; otherwise ignored.
    pub fn attach(&mut self, observed: bool) {
        if self.state == WatchState::Unattached {
            self.state = WatchState::from_truth(observed);
        }
    }

    /// Updates the observed truth; returns `true` if the rule flipped.
    ///
    /// A no-op returning `false` while unattached or detached.
    pub fn observe(&mut self, now: bool) -> bool {
        if !self.state.is_attached() {
            return false;
        }
        let next = WatchState::from_truth(now);
        if next == self.state {
            return false;
        }
        self.state = next;
        true
    }

    /// Stops observing and releases every owner.
    pub fn detach(&mut self) {
        self.state = WatchState::Detached;
        self.owners.clear();
    }

    pub(crate) fn add_owner(&mut self, owner: K, affects_inherited: bool) {
        if !self.owners.contains(&owner) {
            self.owners.push(owner);
        }
        self.affects_inherited |= affects_inherited;
    }

    /// Returns `true` if the rule has no owners left.
    pub(crate) fn remove_owner(&mut self, owner: K) -> bool {
        if let Some(pos) = self.owners.iter().position(|o| *o == owner) {
            self.owners.swap_remove(pos);
        }
        self.owners.is_empty()
    }
}

impl<K: PartialEq> PartialEq for WatchRule<K> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<K: Eq> Eq for WatchRule<K> {}

impl<K: Hash> Hash for WatchRule<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

/// The subscription index: every live watch rule, keyed by `(target, fragment)`.
#[derive(Clone, Debug)]
pub struct WatchRegistry<K> {
    rules: HashMap<WatchKey<K>, WatchRule<K>>,
    by_target: HashMap<K, SmallVec<[WatchFragment; 4]>>,
}

impl<K> Default for WatchRegistry<K> {
    fn default() -> Self {
        Self {
            rules: HashMap::new(),
            by_target: HashMap::new(),
        }
    }
}

impl<K: Copy + Eq + Hash> WatchRegistry<K> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of live rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` if no rules are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Returns the rule for `key`, if any.
    #[must_use]
    pub fn get(&self, key: &WatchKey<K>) -> Option<&WatchRule<K>> {
        self.rules.get(key)
    }

    /// Iterates over every live rule.
    pub fn iter(&self) -> impl Iterator<Item = &WatchRule<K>> {
        self.rules.values()
    }

    /// Ensures a rule exists for `key` and that `owner` is one of its owners.
    ///
    /// A new rule is attached with `observed` as its current truth. Returns
    /// `true` if the rule was created.
    pub fn ensure(
        &mut self,
        key: WatchKey<K>,
        owner: K,
        observed: bool,
        affects_inherited: bool,
    ) -> bool {
        let mut created = false;
        let rule = self.rules.entry(key).or_insert_with(|| {
            created = true;
            let mut rule = WatchRule::new(key, affects_inherited);
            rule.attach(observed);
            rule
        });
        rule.add_owner(owner, affects_inherited);
        if created {
            self.by_target
                .entry(key.target)
                .or_default()
                .push(key.fragment);
        }
        created
    }

    /// Drops `owner` from the rule for `key`; a rule left without owners is
    /// detached and removed. Returns `true` if the rule was removed.
    pub fn release(&mut self, key: &WatchKey<K>, owner: K) -> bool {
        let Some(rule) = self.rules.get_mut(key) else {
            return false;
        };
        if !rule.remove_owner(owner) {
            return false;
        }
        rule.detach();
        self.rules.remove(key);
        self.forget_fragment(key);
        true
    }

    /// Feeds the current truth of `key`'s fragment into its rule.
    ///
    /// Returns the rule if it flipped.
    pub fn observe(&mut self, key: &WatchKey<K>, now: bool) -> Option<&WatchRule<K>> {
        let rule = self.rules.get_mut(key)?;
        if rule.observe(now) {
            Some(rule)
        } else {
            None
        }
    }

    /// Detaches and removes every rule observing `target`.
    ///
    /// Returns the owners the rules had before teardown, each once.
    pub fn detach_target(&mut self, target: K) -> SmallVec<[K; 4]> {
        let mut owners: SmallVec<[K; 4]> = SmallVec::new();
        let Some(fragments) = self.by_target.remove(&target) else {
            return owners;
        };
        for fragment in fragments {
            if let Some(mut rule) = self.rules.remove(&WatchKey::new(target, fragment)) {
                for owner in rule.owners() {
                    if !owners.contains(owner) {
                        owners.push(*owner);
                    }
                }
                rule.detach();
            }
        }
        owners
    }

    /// Detaches and removes every rule.
    pub fn clear(&mut self) {
        for rule in self.rules.values_mut() {
            rule.detach();
        }
        self.rules.clear();
        self.by_target.clear();
    }

    fn forget_fragment(&mut self, key: &WatchKey<K>) {
        if let Some(fragments) = self.by_target.get_mut(&key.target) {
            fragments.retain(|f| *f != key.fragment);
            if fragments.is_empty() {
                self.by_target.remove(&key.target);
            }
        }
    }
}
