// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Candidate evaluation with watch collection.

use alloc::vec::Vec;

use crate::selector::{Combinator, Selector, SelectorInputs};
use crate::tree::StyleTree;
use crate::watch::{WatchFragment, WatchKey};

/// Evaluates `selector` against `widget`, recording every dynamic fragment it
/// consults into `watches`.
///
/// Returns `None` if the rule is not a candidate: a static fragment (type tag
/// or style id) fails somewhere in the chain. Nothing is recorded in that case.
/// Otherwise returns whether the rule currently matches.
pub(crate) fn evaluate<T: StyleTree>(
    selector: &Selector,
    tree: &T,
    widget: T::Key,
    inputs: &SelectorInputs<'_>,
    watches: &mut Vec<WatchKey<T::Key>>,
) -> Option<bool> {
    if !selector.matches_static(inputs) {
        return None;
    }
    let mark = watches.len();
    watches.extend(
        selector
            .required_classes
            .as_slice()
            .iter()
            .map(|class| WatchKey::new(widget, WatchFragment::Class(*class))),
    );
    watches.extend(
        selector
            .required_pseudos
            .as_slice()
            .iter()
            .map(|pseudo| WatchKey::new(widget, WatchFragment::PseudoClass(*pseudo))),
    );
    let own = selector.matches(inputs);

    let Some(ancestor) = selector.ancestor.as_deref() else {
        return Some(own);
    };
    let above = match ancestor.combinator {
        Combinator::Child => tree.parent(widget).and_then(|parent| {
            let parent_inputs = tree.selector_inputs(parent)?;
            evaluate(&ancestor.selector, tree, parent, &parent_inputs, watches)
        }),
        Combinator::Descendant => {
            let mut found = None;
            let mut current = tree.parent(widget);
            while let Some(node) = current {
                if let Some(node_inputs) = tree.selector_inputs(node)
                    && let Some(matched) =
                        evaluate(&ancestor.selector, tree, node, &node_inputs, watches)
                {
                    found = Some(found.unwrap_or(false) || matched);
                }
                current = tree.parent(node);
            }
            found
        }
    };
    match above {
        Some(matched) => Some(own && matched),
        None => {
            watches.truncate(mark);
            None
        }
    }
}
