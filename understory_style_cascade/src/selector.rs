// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Selector inputs and selector predicates for style matching.
//!
//! A [`Selector`] is a compound predicate over one widget's type tag, style
//! id, classes and pseudo-classes, optionally chained to an ancestor compound
//! through a [`Combinator`].

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::iter::FromIterator;

use crate::tree::StyleTree;

/// Bucketed selector specificity: `(ids, classes + pseudo-classes, tags)`.
///
/// Fields are ordered highest-weight-first so the derived `Ord` compares
/// lexicographically: one id outranks any number of classes, which outrank
/// type tags. Counts are summed over a selector's whole ancestor chain.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Specificity(pub u32, pub u32, pub u32);

/// A stable identifier for a widget type in selectors (e.g. `Button`).
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeTag(pub u32);

/// A stable identifier for a widget's style id (e.g. `#btn`).
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StyleId(pub u32);

/// A stable identifier for a style class (e.g. `.primary`).
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClassId(pub u32);

/// A stable identifier for a pseudo-class (e.g. `:hover`, `:focus`).
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PseudoClassId(pub u32);

/// An owned, sorted, deduplicated set of IDs.
///
/// Optimized for small sets over unbounded vocabularies: membership is
/// O(log n), subset checks are a merge walk.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct IdSet<T>(Box<[T]>);

impl<T> Default for IdSet<T> {
    fn default() -> Self {
        Self(Vec::new().into_boxed_slice())
    }
}

impl<T> IdSet<T>
where
    T: Copy + Ord,
{
    /// Constructs a set from an iterator, sorting and deduplicating.
    #[must_use]
    pub fn from_ids(iter: impl IntoIterator<Item = T>) -> Self {
        let mut ids: Vec<T> = iter.into_iter().collect();
        ids.sort();
        ids.dedup();
        Self(ids.into_boxed_slice())
    }

    /// Returns `true` if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of IDs in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the set as a sorted slice.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.0
    }

    /// Returns `true` if this set contains the given ID.
    #[must_use]
    pub fn contains(&self, id: T) -> bool {
        self.0.binary_search(&id).is_ok()
    }

    /// Inserts an ID; returns `false` if it was already present.
    pub fn insert(&mut self, id: T) -> bool {
        match self.0.binary_search(&id) {
            Ok(_) => false,
            Err(idx) => {
                let mut ids = core::mem::take(&mut self.0).into_vec();
                ids.insert(idx, id);
                self.0 = ids.into_boxed_slice();
                true
            }
        }
    }

    /// Removes an ID; returns `false` if it was absent.
    pub fn remove(&mut self, id: T) -> bool {
        match self.0.binary_search(&id) {
            Ok(idx) => {
                let mut ids = core::mem::take(&mut self.0).into_vec();
                ids.remove(idx);
                self.0 = ids.into_boxed_slice();
                true
            }
            Err(_) => false,
        }
    }

    /// Returns `true` if this set is a subset of the sorted slice `other`.
    #[must_use]
    pub fn is_subset_of_slice(&self, other: &[T]) -> bool {
        is_subset(self.as_slice(), other)
    }
}

impl<T> FromIterator<T> for IdSet<T>
where
    T: Copy + Ord,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_ids(iter)
    }
}

/// A borrowed snapshot of selector inputs for a single widget.
///
/// The `classes` and `pseudos` slices must be sorted and deduplicated.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SelectorInputs<'a> {
    /// Optional type tag for the widget.
    pub type_tag: Option<TypeTag>,
    /// Optional style id for the widget.
    pub style_id: Option<StyleId>,
    /// Sorted, unique class IDs.
    pub classes: &'a [ClassId],
    /// Sorted, unique pseudo-class IDs.
    pub pseudos: &'a [PseudoClassId],
}

impl SelectorInputs<'static> {
    /// Empty selector inputs (no type, id, classes, or pseudo-classes).
    pub const EMPTY: Self = Self {
        type_tag: None,
        style_id: None,
        classes: &[],
        pseudos: &[],
    };
}

impl<'a> SelectorInputs<'a> {
    /// Constructs selector inputs from borrowed slices.
    ///
    /// # Panics (debug only)
    ///
    /// Panics in debug builds if the slices are not sorted and deduplicated.
    #[must_use]
    pub fn new(
        type_tag: Option<TypeTag>,
        style_id: Option<StyleId>,
        classes: &'a [ClassId],
        pseudos: &'a [PseudoClassId],
    ) -> Self {
        debug_assert!(
            is_sorted_unique(classes),
            "`classes` must be sorted and unique"
        );
        debug_assert!(
            is_sorted_unique(pseudos),
            "`pseudos` must be sorted and unique"
        );
        Self {
            type_tag,
            style_id,
            classes,
            pseudos,
        }
    }

    /// Returns `true` if the widget carries `class`.
    #[must_use]
    pub fn has_class(&self, class: ClassId) -> bool {
        self.classes.binary_search(&class).is_ok()
    }

    /// Returns `true` if the widget carries `pseudo`.
    #[must_use]
    pub fn has_pseudo(&self, pseudo: PseudoClassId) -> bool {
        self.pseudos.binary_search(&pseudo).is_ok()
    }
}

/// How an ancestor compound relates to the compound it qualifies.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Combinator {
    /// The ancestor compound must match the direct parent.
    Child,
    /// The ancestor compound must match some ancestor.
    Descendant,
}

/// An ancestor compound and its relation to the qualified compound.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AncestorSelector {
    /// Relation to the qualified compound.
    pub combinator: Combinator,
    /// The ancestor's own selector, which may chain further.
    pub selector: Selector,
}

/// A selector predicate over a widget and, optionally, its ancestors.
///
/// Absent fragments are wildcards; the default selector matches every widget
/// with the lowest specificity.
///
/// ```rust
/// use understory_style_cascade::{ClassId, PseudoClassId, Selector, SelectorInputs, Specificity, TypeTag};
///
/// const BUTTON: TypeTag = TypeTag(1);
/// const PRIMARY: ClassId = ClassId(1);
/// const HOVER: PseudoClassId = PseudoClassId(1);
///
/// let selector = Selector::new().tag(BUTTON).class(PRIMARY).pseudo(HOVER);
/// assert_eq!(selector.specificity(), Specificity(0, 2, 1));
///
/// let classes = [PRIMARY];
/// let pseudos = [HOVER];
/// let inputs = SelectorInputs::new(Some(BUTTON), None, &classes, &pseudos);
/// assert!(selector.matches(&inputs));
/// assert!(!selector.matches(&SelectorInputs::new(Some(BUTTON), None, &classes, &[])));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selector {
    /// Optional type tag predicate.
    pub type_tag: Option<TypeTag>,
    /// Optional style id predicate.
    pub style_id: Option<StyleId>,
    /// Required class IDs.
    pub required_classes: IdSet<ClassId>,
    /// Required pseudo-class IDs.
    pub required_pseudos: IdSet<PseudoClassId>,
    /// Optional ancestor compound.
    pub ancestor: Option<Box<AncestorSelector>>,
}

impl Selector {
    /// Creates the empty (universal) selector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires the widget's type tag.
    #[must_use]
    pub fn tag(mut self, tag: TypeTag) -> Self {
        self.type_tag = Some(tag);
        self
    }

    /// Requires the widget's style id.
    #[must_use]
    pub fn id(mut self, id: StyleId) -> Self {
        self.style_id = Some(id);
        self
    }

    /// Requires a class.
    #[must_use]
    pub fn class(mut self, class: ClassId) -> Self {
        self.required_classes.insert(class);
        self
    }

    /// Requires a pseudo-class.
    #[must_use]
    pub fn pseudo(mut self, pseudo: PseudoClassId) -> Self {
        self.required_pseudos.insert(pseudo);
        self
    }

    /// Requires the direct parent to match `parent`.
    #[must_use]
    pub fn child_of(self, parent: Self) -> Self {
        self.with_ancestor(Combinator::Child, parent)
    }

    /// Requires some ancestor to match `ancestor`.
    #[must_use]
    pub fn descendant_of(self, ancestor: Self) -> Self {
        self.with_ancestor(Combinator::Descendant, ancestor)
    }

    fn with_ancestor(mut self, combinator: Combinator, selector: Self) -> Self {
        self.ancestor = Some(Box::new(AncestorSelector {
            combinator,
            selector,
        }));
        self
    }

    /// Returns `true` if the fragments that only change with widget identity
    /// (type tag and style id) match.
    ///
    /// Classes, pseudo-classes and ancestors are not considered.
    #[must_use]
    pub fn matches_static(&self, inputs: &SelectorInputs<'_>) -> bool {
        if let Some(required) = self.type_tag
            && inputs.type_tag != Some(required)
        {
            return false;
        }
        if let Some(required) = self.style_id
            && inputs.style_id != Some(required)
        {
            return false;
        }
        true
    }

    /// Returns `true` if this compound matches the given inputs.
    ///
    /// The ancestor compound, if any, is ignored.
    #[must_use]
    pub fn matches(&self, inputs: &SelectorInputs<'_>) -> bool {
        self.matches_static(inputs)
            && self.required_classes.is_subset_of_slice(inputs.classes)
            && self.required_pseudos.is_subset_of_slice(inputs.pseudos)
    }

    /// Returns `true` if this selector matches `widget` in `tree`, ancestor
    /// chain included.
    ///
    /// Widgets that are not attached to `tree` never match.
    #[must_use]
    pub fn matches_in<T: StyleTree>(&self, tree: &T, widget: T::Key) -> bool {
        let Some(inputs) = tree.selector_inputs(widget) else {
            return false;
        };
        self.matches(&inputs)
            && self
                .ancestor
                .as_deref()
                .is_none_or(|ancestor| ancestor.matches_above(tree, widget))
    }

    /// Returns a bucketed specificity score, summed over the ancestor chain.
    #[must_use]
    pub fn specificity(&self) -> Specificity {
        let ids = u32::from(self.style_id.is_some());
        let classes = u32::try_from(self.required_classes.len()).unwrap_or(u32::MAX);
        let pseudos = u32::try_from(self.required_pseudos.len()).unwrap_or(u32::MAX);
        let tags = u32::from(self.type_tag.is_some());
        let own = Specificity(ids, classes.saturating_add(pseudos), tags);
        match &self.ancestor {
            None => own,
            Some(ancestor) => {
                let up = ancestor.selector.specificity();
                Specificity(
                    own.0.saturating_add(up.0),
                    own.1.saturating_add(up.1),
                    own.2.saturating_add(up.2),
                )
            }
        }
    }

    /// Returns `true` if any compound in the chain has class or pseudo-class
    /// fragments, i.e. whether the selector's truth can change at runtime.
    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        !self.required_classes.is_empty()
            || !self.required_pseudos.is_empty()
            || self
                .ancestor
                .as_deref()
                .is_some_and(|ancestor| ancestor.selector.is_dynamic())
    }

    /// Returns `true` if the selector has an ancestor compound.
    #[must_use]
    pub fn has_combinator(&self) -> bool {
        self.ancestor.is_some()
    }
}

impl AncestorSelector {
    fn matches_above<T: StyleTree>(&self, tree: &T, widget: T::Key) -> bool {
        match self.combinator {
            Combinator::Child => tree
                .parent(widget)
                .is_some_and(|parent| self.selector.matches_in(tree, parent)),
            Combinator::Descendant => {
                let mut current = tree.parent(widget);
                while let Some(node) = current {
                    if self.selector.matches_in(tree, node) {
                        return true;
                    }
                    current = tree.parent(node);
                }
                false
            }
        }
    }
}

fn is_sorted_unique<T: Ord>(slice: &[T]) -> bool {
    slice
        .windows(2)
        .all(|w| w[0].cmp(&w[1]) == core::cmp::Ordering::Less)
}

fn is_subset<T: Ord>(needles: &[T], haystack: &[T]) -> bool {
    if needles.is_empty() {
        return true;
    }
    if haystack.is_empty() {
        return false;
    }

    let mut i = 0;
    let mut j = 0;
    while i < needles.len() && j < haystack.len() {
        match needles[i].cmp(&haystack[j]) {
            core::cmp::Ordering::Less => return false,
            core::cmp::Ordering::Equal => {
                i += 1;
                j += 1;
            }
            core::cmp::Ordering::Greater => j += 1,
        }
    }
    i == needles.len()
}
