// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The widget-tree seam the resolver reads structure and selector inputs from.

use core::fmt::Debug;
use core::hash::Hash;

use crate::selector::{ClassId, PseudoClassId, SelectorInputs};

/// Read access to the embedder's widget tree.
///
/// The resolver never owns widgets; it keys caches and watch rules by
/// [`StyleTree::Key`] and asks the tree for structure and state on demand.
pub trait StyleTree {
    /// Non-owning widget handle.
    type Key: Copy + Eq + Hash + Debug;

    /// Returns the widget's current selector inputs, or `None` if the widget
    /// is not attached to the tree.
    fn selector_inputs(&self, widget: Self::Key) -> Option<SelectorInputs<'_>>;

    /// Returns the widget's parent, or `None` for a root.
    fn parent(&self, widget: Self::Key) -> Option<Self::Key>;

    /// Returns the widget's children.
    fn children(&self, widget: Self::Key) -> impl Iterator<Item = Self::Key> + '_;
}

/// A state change the embedder reports to the resolver.
///
/// Changes must be reported after the tree reflects them and before the next
/// [`StyleResolver::resolve`](crate::StyleResolver::resolve) in the same frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StateChange<K> {
    /// A pseudo-class was set or cleared on `widget`.
    PseudoClass {
        /// The widget whose state changed.
        widget: K,
        /// The toggled pseudo-class.
        pseudo: PseudoClassId,
    },
    /// A class was added to or removed from `widget`.
    Class {
        /// The widget whose state changed.
        widget: K,
        /// The toggled class.
        class: ClassId,
    },
    /// The widget's type tag or style id was edited.
    Identity {
        /// The edited widget.
        widget: K,
    },
    /// The widget was moved under a new parent.
    Reparented {
        /// The moved widget.
        widget: K,
    },
    /// The widget and its subtree left the tree.
    ///
    /// The resolver finds the cached subtree from its own records.
    Detached {
        /// The removed widget.
        widget: K,
    },
}

impl<K: Copy> StateChange<K> {
    /// Returns the widget the change applies to.
    #[must_use]
    pub fn widget(&self) -> K {
        match *self {
            Self::PseudoClass { widget, .. }
            | Self::Class { widget, .. }
            | Self::Identity { widget }
            | Self::Reparented { widget }
            | Self::Detached { widget } => widget,
        }
    }
}
