// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cached cascade resolution with watch-rule invalidation.

use alloc::vec::Vec;
use core::fmt;
use core::hash::Hash;

use hashbrown::{HashMap, HashSet};
use smallvec::SmallVec;
use tracing::{debug, trace};
use understory_style_key::{
    ChangeFlags, ErasedValue, StyleKey, StyleKeyId, StyleRegistry, StyleValue,
};

use crate::matching::evaluate;
use crate::resolved::ResolvedStyle;
use crate::selector::Specificity;
use crate::stylesheet::{StyleCascade, StyleOrigin, StyleSheet};
use crate::tree::{StateChange, StyleTree};
use crate::watch::{WatchFragment, WatchKey, WatchRegistry, WatchRule};

/// Resolver behavior switches.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ResolverConfig {
    compare_on_recompute: bool,
    emit_events: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            compare_on_recompute: true,
            emit_events: true,
        }
    }
}

impl ResolverConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a recompute diffs old and new values before reporting
    /// [`StyleEvent::Changed`].
    ///
    /// When disabled, every recompute of a previously cached style reports a
    /// change to [`ChangeFlags::all`].
    #[must_use]
    pub fn with_compare_on_recompute(mut self, compare: bool) -> Self {
        self.compare_on_recompute = compare;
        self
    }

    /// Whether events are queued for [`StyleResolver::drain_events`].
    #[must_use]
    pub fn with_emit_events(mut self, emit: bool) -> Self {
        self.emit_events = emit;
        self
    }

    /// Returns whether recomputes are diffed.
    #[must_use]
    pub fn compare_on_recompute(&self) -> bool {
        self.compare_on_recompute
    }

    /// Returns whether events are queued.
    #[must_use]
    pub fn emit_events(&self) -> bool {
        self.emit_events
    }
}

/// Notifications for layout and paint.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StyleEvent<K> {
    /// The widget's cached style was marked dirty.
    ///
    /// Reported once per transition from clean to dirty.
    Invalidated {
        /// The invalidated widget.
        widget: K,
    },
    /// A recompute produced different values.
    Changed {
        /// The recomputed widget.
        widget: K,
        /// Union of the change flags of every changed key.
        affects: ChangeFlags,
    },
}

#[derive(Debug)]
struct CacheEntry<K> {
    style: ResolvedStyle,
    dirty: bool,
    /// Parent at the last recompute or reparent.
    parent: Option<K>,
    watches: SmallVec<[WatchKey<K>; 4]>,
}

type Rank = (StyleOrigin, Specificity, usize, u32);

/// Resolves and caches styles for the widgets of one tree.
///
/// The resolver owns the per-widget [`ResolvedStyle`] caches and every
/// [`WatchRule`]; the registry and cascade are shared read-only.
///
/// ```rust
/// # use understory_style_cascade::{PseudoClassId, SelectorInputs, StyleTree};
/// # struct One { pseudos: Vec<PseudoClassId> }
/// # impl StyleTree for One {
/// #     type Key = u32;
/// #     fn selector_inputs(&self, _: u32) -> Option<SelectorInputs<'_>> {
/// #         Some(SelectorInputs::new(None, None, &[], &self.pseudos))
/// #     }
/// #     fn parent(&self, _: u32) -> Option<u32> { None }
/// #     fn children(&self, _: u32) -> impl Iterator<Item = u32> + '_ { core::iter::empty() }
/// # }
/// use understory_style_cascade::{
///     Declarations, Selector, StateChange, StyleEvent, StyleResolver, StyleSheetBuilder,
/// };
/// use understory_style_key::StyleRegistry;
///
/// const PRESSED: PseudoClassId = PseudoClassId(3);
///
/// let mut registry = StyleRegistry::new();
/// let mut border = registry.define("Border").unwrap();
/// let width = border.create_key::<f64>("Width", false).unwrap();
/// let _ = border.finish();
/// registry.seal();
///
/// let sheet = StyleSheetBuilder::new()
///     .rule(
///         Selector::new().pseudo(PRESSED),
///         Declarations::builder().set(width, 2.0).build(),
///     )
///     .build(&registry)
///     .unwrap();
///
/// let mut tree = One { pseudos: Vec::new() };
/// let mut resolver = StyleResolver::new(&registry, sheet);
/// assert_eq!(resolver.get(&tree, 0, width), Some(&0.0));
///
/// tree.pseudos.push(PRESSED);
/// resolver.notify(&tree, StateChange::PseudoClass { widget: 0, pseudo: PRESSED });
/// assert!(resolver.is_dirty(0));
/// assert_eq!(resolver.get(&tree, 0, width), Some(&2.0));
///
/// let events: Vec<_> = resolver.drain_events().collect();
/// assert_eq!(events[0], StyleEvent::Invalidated { widget: 0 });
/// ```
pub struct StyleResolver<'r, K> {
    registry: &'r StyleRegistry,
    cascade: StyleCascade,
    config: ResolverConfig,
    entries: HashMap<K, CacheEntry<K>>,
    /// Cached children per cached parent, mirroring `CacheEntry::parent`.
    children: HashMap<K, SmallVec<[K; 4]>>,
    watches: WatchRegistry<K>,
    events: Vec<StyleEvent<K>>,
    empty: ResolvedStyle,
}

impl<K: Copy + Eq + Hash + fmt::Debug> fmt::Debug for StyleResolver<'_, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StyleResolver")
            .field("sheets", &self.cascade.len())
            .field("config", &self.config)
            .field("cached", &self.entries.len())
            .field("watches", &self.watches.len())
            .field("events", &self.events.len())
            .finish_non_exhaustive()
    }
}

impl<'r, K> StyleResolver<'r, K>
where
    K: Copy + Eq + Hash + fmt::Debug,
{
    /// Creates a resolver with the default configuration.
    #[must_use]
    pub fn new(registry: &'r StyleRegistry, cascade: impl Into<StyleCascade>) -> Self {
        Self::with_config(registry, cascade, ResolverConfig::default())
    }

    /// Creates a resolver with an explicit configuration.
    #[must_use]
    pub fn with_config(
        registry: &'r StyleRegistry,
        cascade: impl Into<StyleCascade>,
        config: ResolverConfig,
    ) -> Self {
        Self {
            registry,
            cascade: cascade.into(),
            config,
            entries: HashMap::new(),
            children: HashMap::new(),
            watches: WatchRegistry::new(),
            events: Vec::new(),
            empty: ResolvedStyle::default(),
        }
    }

    /// Returns the registry styles are resolved against.
    #[must_use]
    pub fn registry(&self) -> &'r StyleRegistry {
        self.registry
    }

    /// Returns the active cascade.
    #[must_use]
    pub fn cascade(&self) -> &StyleCascade {
        &self.cascade
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> ResolverConfig {
        self.config
    }

    /// Returns the number of cached styles, dirty or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if `widget` has a cached style.
    #[must_use]
    pub fn is_cached(&self, widget: K) -> bool {
        self.entries.contains_key(&widget)
    }

    /// Returns `true` if `widget` has a cached style that awaits recompute.
    #[must_use]
    pub fn is_dirty(&self, widget: K) -> bool {
        self.entries.get(&widget).is_some_and(|entry| entry.dirty)
    }

    /// Returns the cached style without recomputing it, dirty or not.
    #[must_use]
    pub fn cached(&self, widget: K) -> Option<&ResolvedStyle> {
        self.entries.get(&widget).map(|entry| &entry.style)
    }

    /// Returns the number of live watch rules.
    #[must_use]
    pub fn watch_count(&self) -> usize {
        self.watches.len()
    }

    /// Returns the watch rule for `(target, fragment)`, if one is live.
    #[must_use]
    pub fn watch_rule(&self, target: K, fragment: WatchFragment) -> Option<&WatchRule<K>> {
        self.watches.get(&WatchKey::new(target, fragment))
    }

    /// Iterates over every live watch rule.
    pub fn watch_rules(&self) -> impl Iterator<Item = &WatchRule<K>> {
        self.watches.iter()
    }

    /// Takes every queued event in the order it was raised.
    pub fn drain_events(&mut self) -> alloc::vec::Drain<'_, StyleEvent<K>> {
        self.events.drain(..)
    }

    /// Replaces the active cascade.
    ///
    /// Every cached style is marked dirty and every watch rule is torn down;
    /// rules are rebuilt as widgets are resolved again.
    pub fn set_cascade(&mut self, cascade: impl Into<StyleCascade>) {
        self.cascade = cascade.into();
        self.watches.clear();
        for (widget, entry) in &mut self.entries {
            entry.watches.clear();
            if !entry.dirty {
                entry.dirty = true;
                if self.config.emit_events {
                    self.events.push(StyleEvent::Invalidated { widget: *widget });
                }
            }
        }
        debug!(
            sheets = self.cascade.len(),
            cached = self.entries.len(),
            "style cascade replaced"
        );
    }

    /// Replaces the active cascade with a single sheet.
    pub fn set_sheet(&mut self, sheet: StyleSheet) {
        self.set_cascade(sheet);
    }

    /// Returns the resolved style of `widget`, recomputing it and any stale
    /// ancestors first.
    ///
    /// Widgets that are not attached to `tree` resolve to an empty style, so
    /// every key reads as its default.
    pub fn resolve<T>(&mut self, tree: &T, widget: K) -> &ResolvedStyle
    where
        T: StyleTree<Key = K>,
    {
        if tree.selector_inputs(widget).is_none() {
            trace!(?widget, "resolving unattached widget to defaults");
            return &self.empty;
        }
        if !self.is_fresh(widget) {
            let mut path: SmallVec<[K; 16]> = SmallVec::new();
            let mut current = Some(widget);
            while let Some(node) = current {
                path.push(node);
                current = tree.parent(node);
            }
            // Recomputing an ancestor can stale nodes further down the path.
            for node in path.into_iter().rev() {
                if !self.is_fresh(node) {
                    self.recompute(tree, node);
                }
            }
        }
        self.entries
            .get(&widget)
            .map_or(&self.empty, |entry| &entry.style)
    }

    /// Returns the resolved value of `key` for `widget`, falling back to the
    /// key's default.
    ///
    /// `None` only for keys unknown to the resolver's registry.
    pub fn get<T, V>(&mut self, tree: &T, widget: K, key: StyleKey<V>) -> Option<&V>
    where
        T: StyleTree<Key = K>,
        V: StyleValue,
    {
        let registry = self.registry;
        self.resolve(tree, widget).value(key, registry)
    }

    /// Like [`StyleResolver::get`], but returns an owned value.
    pub fn resolve_value<T, V>(&mut self, tree: &T, widget: K, key: StyleKey<V>) -> Option<V>
    where
        T: StyleTree<Key = K>,
        V: StyleValue,
    {
        self.get(tree, widget, key).cloned()
    }

    /// Applies a state change reported by the tree.
    ///
    /// The tree must already reflect the change. Changes that no watch rule
    /// observes are no-ops.
    pub fn notify<T>(&mut self, tree: &T, change: StateChange<K>)
    where
        T: StyleTree<Key = K>,
    {
        match change {
            StateChange::PseudoClass { widget, pseudo } => {
                self.fragment_changed(tree, WatchKey::new(widget, WatchFragment::PseudoClass(pseudo)));
            }
            StateChange::Class { widget, class } => {
                self.fragment_changed(tree, WatchKey::new(widget, WatchFragment::Class(class)));
            }
            StateChange::Identity { widget } => {
                self.mark_dirty(widget);
                if self.cascade.has_combinators() || self.cascade.declares_inherited() {
                    self.mark_descendants(tree, widget);
                }
            }
            StateChange::Reparented { widget } => {
                let parent = tree.parent(widget);
                if let Some(entry) = self.entries.get_mut(&widget) {
                    let old = core::mem::replace(&mut entry.parent, parent);
                    self.relink(widget, old, parent);
                }
                self.mark_dirty(widget);
                self.mark_descendants(tree, widget);
            }
            StateChange::Detached { widget } => self.detach_subtree(widget),
        }
    }

    /// Drops the caches of `root` and every cached descendant, and tears down
    /// the watch rules that observe them.
    ///
    /// Descendants are found through the parent links recorded at resolve
    /// time, so the tree may already have forgotten the subtree.
    pub fn detach_subtree(&mut self, root: K) {
        let mut subtree: Vec<K> = Vec::new();
        subtree.push(root);
        let mut next = 0;
        while next < subtree.len() {
            let node = subtree[next];
            if let Some(children) = self.children.get(&node) {
                subtree.extend(children.iter().copied());
            }
            next += 1;
        }
        let doomed: HashSet<K> = subtree.iter().copied().collect();
        let mut detached = 0_usize;
        for node in subtree {
            if self.detach(node, &doomed) {
                detached += 1;
            }
        }
        debug!(?root, detached, watches = self.watches.len(), "detached subtree");
    }

    /// Returns `true` if `widget` had a cached style.
    fn detach(&mut self, widget: K, doomed: &HashSet<K>) -> bool {
        self.children.remove(&widget);
        let entry = self.entries.remove(&widget);
        if let Some(entry) = &entry {
            if let Some(parent) = entry.parent {
                self.unlink(parent, widget);
            }
            for key in &entry.watches {
                self.watches.release(key, widget);
            }
        }
        for owner in self.watches.detach_target(widget) {
            if !doomed.contains(&owner) {
                self.mark_dirty(owner);
            }
        }
        entry.is_some()
    }

    fn relink(&mut self, widget: K, old: Option<K>, new: Option<K>) {
        if old == new {
            return;
        }
        if let Some(old) = old {
            self.unlink(old, widget);
        }
        if let Some(new) = new {
            self.children.entry(new).or_default().push(widget);
        }
    }

    fn unlink(&mut self, parent: K, child: K) {
        if let Some(children) = self.children.get_mut(&parent) {
            children.retain(|c| *c != child);
            if children.is_empty() {
                self.children.remove(&parent);
            }
        }
    }

    fn is_fresh(&self, widget: K) -> bool {
        self.entries.get(&widget).is_some_and(|entry| !entry.dirty)
    }

    fn emit(&mut self, event: StyleEvent<K>) {
        if self.config.emit_events {
            self.events.push(event);
        }
    }

    fn mark_dirty(&mut self, widget: K) {
        let Some(entry) = self.entries.get_mut(&widget) else {
            return;
        };
        if entry.dirty {
            return;
        }
        entry.dirty = true;
        trace!(?widget, "style marked dirty");
        self.emit(StyleEvent::Invalidated { widget });
    }

    fn mark_descendants<T>(&mut self, tree: &T, widget: K)
    where
        T: StyleTree<Key = K>,
    {
        let mut stack: SmallVec<[K; 16]> = tree.children(widget).collect();
        while let Some(node) = stack.pop() {
            self.mark_dirty(node);
            stack.extend(tree.children(node));
        }
    }

    fn fragment_changed<T>(&mut self, tree: &T, key: WatchKey<K>)
    where
        T: StyleTree<Key = K>,
    {
        let now = tree
            .selector_inputs(key.target)
            .is_some_and(|inputs| key.fragment.is_present(&inputs));
        let Some(rule) = self.watches.observe(&key, now) else {
            trace!(watched = ?key.target, fragment = ?key.fragment, "state change without flip");
            return;
        };
        let owners: SmallVec<[K; 4]> = rule.owners().iter().copied().collect();
        let inherited = rule.affects_inherited();
        trace!(
            watched = ?key.target,
            fragment = ?key.fragment,
            matching = now,
            owners = owners.len(),
            "watch rule flipped"
        );
        for owner in owners {
            self.mark_dirty(owner);
            if inherited {
                self.mark_descendants(tree, owner);
            }
        }
    }

    fn recompute<T>(&mut self, tree: &T, widget: K)
    where
        T: StyleTree<Key = K>,
    {
        let Some(inputs) = tree.selector_inputs(widget) else {
            return;
        };
        let cascade = self.cascade.clone();
        let mut winners: Vec<(StyleKeyId, Rank, &ErasedValue)> = Vec::new();
        let mut consulted: Vec<(WatchKey<K>, bool)> = Vec::new();
        let mut scratch = Vec::new();

        for (sheet_index, (origin, sheet)) in cascade.sheets().enumerate() {
            for rule in sheet.rules() {
                scratch.clear();
                let Some(matched) = evaluate(rule.selector(), tree, widget, &inputs, &mut scratch)
                else {
                    continue;
                };
                for key in scratch.drain(..) {
                    match consulted.iter_mut().find(|(k, _)| *k == key) {
                        Some((_, inherited)) => *inherited |= rule.declares_inherited(),
                        None => consulted.push((key, rule.declares_inherited())),
                    }
                }
                if !matched {
                    continue;
                }
                let rank: Rank = (origin, rule.specificity(), sheet_index, rule.order());
                for (id, value) in rule.declarations().iter() {
                    match winners.binary_search_by_key(&id, |(key, _, _)| *key) {
                        Ok(idx) => {
                            if rank > winners[idx].1 {
                                winners[idx] = (id, rank, value);
                            }
                        }
                        Err(idx) => winners.insert(idx, (id, rank, value)),
                    }
                }
            }
        }

        let parent = tree.parent(widget);
        let parent_style = parent
            .and_then(|parent| self.entries.get(&parent))
            .map(|entry| entry.style.entries())
            .unwrap_or_default();
        let style = ResolvedStyle::from_sorted(merge_inherited(
            &winners,
            parent_style,
            self.registry,
        ));

        let previous = self.entries.remove(&widget);
        self.relink(widget, previous.as_ref().and_then(|p| p.parent), parent);
        let mut watches: SmallVec<[WatchKey<K>; 4]> = SmallVec::new();
        for (key, inherited) in consulted {
            let observed = if key.target == widget {
                key.fragment.is_present(&inputs)
            } else {
                tree.selector_inputs(key.target)
                    .is_some_and(|target| key.fragment.is_present(&target))
            };
            if self.watches.ensure(key, widget, observed, inherited) {
                trace!(watched = ?key.target, fragment = ?key.fragment, "watch rule created");
            }
            watches.push(key);
        }
        if let Some(previous) = &previous {
            for key in previous.watches.iter().filter(|key| !watches.contains(key)) {
                if self.watches.release(key, widget) {
                    trace!(watched = ?key.target, fragment = ?key.fragment, "watch rule removed");
                }
            }
        }
        trace!(?widget, entries = style.len(), watches = watches.len(), "style recomputed");

        let mut inherited_changed = false;
        if let Some(previous) = &previous {
            let affects = if self.config.compare_on_recompute {
                inherited_changed = inherited_differs(&style, &previous.style, self.registry);
                style.diff(&previous.style, self.registry)
            } else {
                inherited_changed = self.registry.has_inherited_keys();
                Some(ChangeFlags::all())
            };
            if let Some(affects) = affects {
                self.emit(StyleEvent::Changed { widget, affects });
            }
        }
        self.entries.insert(
            widget,
            CacheEntry {
                style,
                dirty: false,
                parent,
                watches,
            },
        );
        if inherited_changed {
            self.mark_descendants(tree, widget);
        }
    }
}

/// Merges the winning declarations with the parent's inheritable entries.
fn merge_inherited(
    winners: &[(StyleKeyId, Rank, &ErasedValue)],
    parent: &[(StyleKeyId, ErasedValue)],
    registry: &StyleRegistry,
) -> Vec<(StyleKeyId, ErasedValue)> {
    let mut out = Vec::with_capacity(winners.len() + parent.len());
    let mut inherited = parent.iter().filter(|(id, _)| registry.inherits(*id)).peekable();
    for (id, _, value) in winners {
        while let Some((pid, pvalue)) = inherited.next_if(|(pid, _)| pid <= id) {
            if pid != id {
                out.push((*pid, pvalue.clone()));
            }
        }
        out.push((*id, (*value).clone()));
    }
    out.extend(inherited.map(|(id, value)| (*id, value.clone())));
    out
}

fn inherited_differs(a: &ResolvedStyle, b: &ResolvedStyle, registry: &StyleRegistry) -> bool {
    let differs_from = |x: &ResolvedStyle, y: &ResolvedStyle| {
        x.iter()
            .filter(|(id, _)| registry.inherits(*id))
            .any(|(id, value)| y.get_erased(id) != Some(value))
    };
    differs_from(a, b) || differs_from(b, a)
}
