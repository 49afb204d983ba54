// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Style Cascade: rule matching, cascade resolution and targeted
//! invalidation for widget trees.
//!
//! This crate decides the value of every style key declared with
//! `understory_style_key` for every widget of a tree, and keeps those values
//! current as pseudo-classes (hover, focus, pressed, ...) and classes change,
//! without re-resolving the whole tree.
//!
//! ## Core Concepts
//!
//! ### Selectors and sheets
//!
//! A [`Selector`] matches a widget's type tag, style id, classes and
//! pseudo-classes, optionally qualified by an ancestor through a
//! [`Combinator`]. A [`StyleSheet`] is an ordered list of [`StyleRule`]s
//! pairing selectors with [`Declarations`]; sheets are validated against the
//! registry when built. A [`StyleCascade`] layers sheets by [`StyleOrigin`].
//!
//! Precedence for a key: origin, then [`Specificity`]
//! (ids, classes + pseudo-classes, tags), then sheet order, then rule order.
//! Undeclared inherited keys take the parent's value; everything else reads
//! as the key's default.
//!
//! ### The tree seam
//!
//! The embedder's widget tree implements [`StyleTree`]. The resolver never
//! owns widgets; it reads structure and [`SelectorInputs`] on demand.
//!
//! ### Resolution and watch rules
//!
//! [`StyleResolver`] caches a [`ResolvedStyle`] per widget. While resolving,
//! every class or pseudo-class fragment a candidate rule consults becomes a
//! [`WatchRule`], one per `(target, fragment)` pair. The embedder reports state
//! changes with [`StyleResolver::notify`]; a flipped rule marks its owners
//! (and, for inherited keys, their descendants) dirty, and dirty styles are
//! recomputed on next read. Layout and paint learn what changed from
//! [`StyleResolver::drain_events`].
//!
//! ```rust
//! use understory_style_cascade::{
//!     ClassId, Declarations, Selector, SelectorInputs, StateChange, StyleId, StyleResolver,
//!     StyleSheetBuilder, StyleTree, TypeTag,
//! };
//! use understory_style_key::StyleRegistry;
//!
//! const PANEL: TypeTag = TypeTag(0);
//! const BUTTON: TypeTag = TypeTag(1);
//! const BTN: StyleId = StyleId(0);
//! const PRIMARY: ClassId = ClassId(0);
//!
//! // Widget 0 is a panel; widget 1 is `Button#btn` inside it.
//! struct Tree {
//!     button_classes: Vec<ClassId>,
//! }
//!
//! impl StyleTree for Tree {
//!     type Key = u32;
//!     fn selector_inputs(&self, widget: u32) -> Option<SelectorInputs<'_>> {
//!         match widget {
//!             0 => Some(SelectorInputs::new(Some(PANEL), None, &[], &[])),
//!             1 => Some(SelectorInputs::new(Some(BUTTON), Some(BTN), &self.button_classes, &[])),
//!             _ => None,
//!         }
//!     }
//!     fn parent(&self, widget: u32) -> Option<u32> {
//!         (widget == 1).then_some(0)
//!     }
//!     fn children(&self, widget: u32) -> impl Iterator<Item = u32> + '_ {
//!         (widget == 0).then_some(1).into_iter()
//!     }
//! }
//!
//! let mut registry = StyleRegistry::new();
//! let mut text = registry.define("Text").unwrap();
//! let color = text.create_key::<u32>("Color", true).unwrap();
//! let _ = text.finish();
//! let mut frame = registry.define("Frame").unwrap();
//! let padding = frame.create_key::<f32>("Padding", false).unwrap();
//! let _ = frame.finish();
//! registry.seal();
//!
//! let sheet = StyleSheetBuilder::new()
//!     .rule(Selector::new().tag(PANEL), Declarations::builder().set(color, 0x00ff00).build())
//!     .rule(Selector::new().class(PRIMARY), Declarations::builder().set(padding, 8.0).build())
//!     .rule(Selector::new().id(BTN), Declarations::builder().set(padding, 4.0).build())
//!     .build(&registry)
//!     .unwrap();
//!
//! let mut tree = Tree { button_classes: Vec::new() };
//! let mut resolver = StyleResolver::new(&registry, sheet);
//!
//! // Color is inherited from the panel; padding comes from `#btn`.
//! assert_eq!(resolver.get(&tree, 1, color), Some(&0x00ff00));
//! assert_eq!(resolver.get(&tree, 1, padding), Some(&4.0));
//!
//! // `.primary` is watched; gaining it dirties the button, but `#btn` still wins.
//! tree.button_classes.push(PRIMARY);
//! resolver.notify(&tree, StateChange::Class { widget: 1, class: PRIMARY });
//! assert!(resolver.is_dirty(1));
//! assert!(!resolver.is_dirty(0));
//! assert_eq!(resolver.get(&tree, 1, padding), Some(&4.0));
//! assert_eq!(resolver.watch_count(), 2);
//! ```
//!
//! ## Logging
//!
//! The resolver reports sheet swaps and detaches at `debug` level and watch
//! rule and cache activity at `trace` level through `tracing`. No subscriber
//! is installed here.
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`. It does not depend on `std`.

#![no_std]

extern crate alloc;

mod declarations;
mod matching;
mod names;
mod resolve;
mod resolved;
mod selector;
mod stylesheet;
#[cfg(test)]
mod testing;
mod tree;
mod watch;

pub use declarations::{Declarations, DeclarationsBuilder};
pub use names::NameTable;
pub use resolve::{ResolverConfig, StyleEvent, StyleResolver};
pub use resolved::ResolvedStyle;
pub use selector::{
    AncestorSelector, ClassId, Combinator, IdSet, PseudoClassId, Selector, SelectorInputs,
    Specificity, StyleId, TypeTag,
};
pub use stylesheet::{
    SheetError, StyleCascade, StyleCascadeBuilder, StyleOrigin, StyleRule, StyleSheet,
    StyleSheetBuilder,
};
pub use tree::{StateChange, StyleTree};
pub use watch::{WatchFragment, WatchKey, WatchRegistry, WatchRule, WatchState};
