// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rule-based style selection.
//!
//! A [`StyleSheet`] is an ordered collection of [`StyleRule`]s, each pairing a
//! [`Selector`] with [`Declarations`]. Sheets are validated against the
//! [`StyleRegistry`] when built, so resolution never sees an unknown key or a
//! mistyped value. A [`StyleCascade`] layers sheets by [`StyleOrigin`].

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;

use understory_style_key::{StyleKey, StyleKeyId, StyleRegistry, StyleValue};

use crate::declarations::Declarations;
use crate::selector::{Selector, Specificity};
use crate::tree::StyleTree;

/// Errors raised while building a sheet from loader input.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SheetError {
    /// A declaration names a key id the registry does not know.
    #[error("rule {rule} declares unknown style key {key}")]
    UnknownKey {
        /// Index of the offending rule in the sheet.
        rule: usize,
        /// The unknown key id.
        key: StyleKeyId,
    },
    /// A declared value's type differs from the key's registered type.
    #[error("rule {rule} declares `{key}` as `{found}`, expected `{expected}`")]
    TypeMismatch {
        /// Index of the offending rule in the sheet.
        rule: usize,
        /// Qualified key name.
        key: Box<str>,
        /// The key's registered value type.
        expected: &'static str,
        /// The declared value's type.
        found: &'static str,
    },
    /// A loader referenced a `definition.name` pair the registry does not know.
    #[error("unknown style key `{definition}.{name}`")]
    UnknownName {
        /// The definition namespace.
        definition: Box<str>,
        /// The key name.
        name: Box<str>,
    },
}

/// The origin/strength of a sheet within a [`StyleCascade`].
///
/// Higher origins win over lower ones regardless of selector specificity.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StyleOrigin {
    /// Low-precedence base styling (e.g. control defaults).
    Base = 0,
    /// Rule-based styling (application sheets).
    #[default]
    Sheet = 1,
    /// High-precedence overrides (e.g. explicit style assignment).
    Override = 2,
}

/// A single rule in a [`StyleSheet`].
#[derive(Clone, Debug)]
pub struct StyleRule {
    selector: Selector,
    declarations: Declarations,
    order: u32,
    specificity: Specificity,
    declares_inherited: bool,
}

impl StyleRule {
    /// Returns the selector.
    #[must_use]
    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Returns the declarations.
    #[must_use]
    pub fn declarations(&self) -> &Declarations {
        &self.declarations
    }

    /// Returns the rule's position in its sheet.
    #[must_use]
    pub fn order(&self) -> u32 {
        self.order
    }

    /// Returns the selector's specificity.
    #[must_use]
    pub fn specificity(&self) -> Specificity {
        self.specificity
    }

    /// Returns `true` if the rule declares any inherited key.
    #[must_use]
    pub fn declares_inherited(&self) -> bool {
        self.declares_inherited
    }
}

#[derive(Debug, Default)]
struct StyleSheetData {
    rules: Vec<StyleRule>,
    has_combinators: bool,
    declares_inherited: bool,
}

/// An ordered, validated collection of style rules.
///
/// Immutable after creation and cheap to clone. Use [`StyleSheetBuilder`] to
/// construct instances.
///
/// ```rust
/// use understory_style_cascade::{ClassId, Declarations, Selector, SheetError, StyleSheetBuilder};
/// use understory_style_key::{ErasedValue, StyleRegistry};
///
/// let mut registry = StyleRegistry::new();
/// let mut text = registry.define("Text").unwrap();
/// let color = text.create_key::<u32>("Color", true).unwrap();
/// let _ = text.finish();
///
/// let sheet = StyleSheetBuilder::new()
///     .rule(Selector::new(), Declarations::builder().set(color, 1).build())
///     .build(&registry)
///     .unwrap();
/// assert_eq!(sheet.len(), 1);
///
/// let mistyped = Declarations::builder()
///     .set_erased(color.id(), ErasedValue::new(1.0_f32))
///     .build();
/// let err = StyleSheetBuilder::new()
///     .rule(Selector::new().class(ClassId(1)), mistyped)
///     .build(&registry)
///     .unwrap_err();
/// assert!(matches!(err, SheetError::TypeMismatch { rule: 0, .. }));
/// ```
#[derive(Clone, Debug, Default)]
pub struct StyleSheet {
    inner: Rc<StyleSheetData>,
}

impl StyleSheet {
    /// Returns the number of rules in this sheet.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.rules.len()
    }

    /// Returns `true` if this sheet has no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.rules.is_empty()
    }

    /// Returns an iterator over rules in declaration order.
    pub fn rules(&self) -> impl Iterator<Item = &StyleRule> + '_ {
        self.inner.rules.iter()
    }

    /// Returns `true` if any rule uses a combinator.
    #[must_use]
    pub fn has_combinators(&self) -> bool {
        self.inner.has_combinators
    }

    /// Returns `true` if any rule declares an inherited key.
    #[must_use]
    pub fn declares_inherited(&self) -> bool {
        self.inner.declares_inherited
    }

    /// Returns the winning declared value for `key` on `widget` in this sheet
    /// alone, without caching or inheritance.
    #[must_use]
    pub fn lookup<T: StyleTree, V: StyleValue>(
        &self,
        tree: &T,
        widget: T::Key,
        key: StyleKey<V>,
    ) -> Option<&V> {
        self.best(tree, widget, key).map(|(_, _, value)| value)
    }

    fn best<T: StyleTree, V: StyleValue>(
        &self,
        tree: &T,
        widget: T::Key,
        key: StyleKey<V>,
    ) -> Option<(Specificity, u32, &V)> {
        let mut best: Option<(Specificity, u32, &V)> = None;
        for rule in &self.inner.rules {
            let Some(value) = rule.declarations.get(key) else {
                continue;
            };
            if !rule.selector.matches_in(tree, widget) {
                continue;
            }
            if best.is_none_or(|(spec, order, _)| (rule.specificity, rule.order) > (spec, order)) {
                best = Some((rule.specificity, rule.order, value));
            }
        }
        best
    }
}

/// Builder for constructing [`StyleSheet`] instances.
#[derive(Debug, Default)]
pub struct StyleSheetBuilder {
    rules: Vec<(Selector, Declarations)>,
}

impl StyleSheetBuilder {
    /// Creates a new empty stylesheet builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a rule; later rules win specificity ties.
    #[must_use]
    pub fn rule(mut self, selector: Selector, declarations: Declarations) -> Self {
        self.rules.push((selector, declarations));
        self
    }

    /// Validates every declaration against `registry` and builds the sheet.
    ///
    /// # Errors
    ///
    /// Returns [`SheetError::UnknownKey`] for a key the registry does not know
    /// and [`SheetError::TypeMismatch`] for a value of the wrong type.
    pub fn build(self, registry: &StyleRegistry) -> Result<StyleSheet, SheetError> {
        let mut rules = Vec::with_capacity(self.rules.len());
        let mut has_combinators = false;
        let mut sheet_inherited = false;
        for (index, (selector, declarations)) in self.rules.into_iter().enumerate() {
            let mut declares_inherited = false;
            for (id, value) in declarations.iter() {
                let Some(registration) = registry.get(id) else {
                    return Err(SheetError::UnknownKey { rule: index, key: id });
                };
                if registration.type_id() != value.type_id() {
                    return Err(SheetError::TypeMismatch {
                        rule: index,
                        key: registry
                            .qualified_name(id)
                            .unwrap_or_default()
                            .into_boxed_str(),
                        expected: registration.type_name(),
                        found: value.type_name(),
                    });
                }
                declares_inherited |= registration.inherits();
            }
            has_combinators |= selector.has_combinator();
            sheet_inherited |= declares_inherited;
            rules.push(StyleRule {
                specificity: selector.specificity(),
                order: u32::try_from(index).unwrap_or(u32::MAX),
                selector,
                declarations,
                declares_inherited,
            });
        }
        Ok(StyleSheet {
            inner: Rc::new(StyleSheetData {
                rules,
                has_combinators,
                declares_inherited: sheet_inherited,
            }),
        })
    }
}

#[derive(Debug, Default)]
struct StyleCascadeData {
    sheets: Vec<(StyleOrigin, StyleSheet)>,
}

/// A composed, ordered set of sheets.
///
/// Winning order for a key is deterministic:
/// 1. Higher [`StyleOrigin`] wins.
/// 2. Higher selector specificity wins.
/// 3. Later sheets win.
/// 4. Later rules win within a sheet.
#[derive(Clone, Debug, Default)]
pub struct StyleCascade {
    inner: Rc<StyleCascadeData>,
}

impl StyleCascade {
    /// Returns a builder.
    #[must_use]
    pub fn builder() -> StyleCascadeBuilder {
        StyleCascadeBuilder::default()
    }

    /// Returns the number of sheets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.sheets.len()
    }

    /// Returns `true` if the cascade has no sheets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.sheets.is_empty()
    }

    /// Returns an iterator over `(origin, sheet)` pairs in cascade order.
    pub fn sheets(&self) -> impl Iterator<Item = (StyleOrigin, &StyleSheet)> + '_ {
        self.inner.sheets.iter().map(|(origin, sheet)| (*origin, sheet))
    }

    /// Returns `true` if any sheet uses a combinator.
    #[must_use]
    pub fn has_combinators(&self) -> bool {
        self.inner.sheets.iter().any(|(_, s)| s.has_combinators())
    }

    /// Returns `true` if any sheet declares an inherited key.
    #[must_use]
    pub fn declares_inherited(&self) -> bool {
        self.inner.sheets.iter().any(|(_, s)| s.declares_inherited())
    }

    /// Returns the winning declared value for `key` on `widget`, without
    /// caching or inheritance.
    #[must_use]
    pub fn lookup<T: StyleTree, V: StyleValue>(
        &self,
        tree: &T,
        widget: T::Key,
        key: StyleKey<V>,
    ) -> Option<&V> {
        type Rank = (StyleOrigin, Specificity, usize, u32);
        let mut best: Option<(Rank, &V)> = None;
        for (sheet_index, (origin, sheet)) in self.inner.sheets.iter().enumerate() {
            let Some((spec, order, value)) = sheet.best(tree, widget, key) else {
                continue;
            };
            let rank: Rank = (*origin, spec, sheet_index, order);
            if best.is_none_or(|(current, _)| rank > current) {
                best = Some((rank, value));
            }
        }
        best.map(|(_, value)| value)
    }
}

impl From<StyleSheet> for StyleCascade {
    fn from(sheet: StyleSheet) -> Self {
        StyleCascadeBuilder::new()
            .push_sheet(StyleOrigin::Sheet, sheet)
            .build()
    }
}

/// Builder for constructing [`StyleCascade`] instances.
#[derive(Debug, Default)]
pub struct StyleCascadeBuilder {
    sheets: Vec<(StyleOrigin, StyleSheet)>,
}

impl StyleCascadeBuilder {
    /// Creates a new empty cascade builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a sheet at the given origin.
    #[must_use]
    pub fn push_sheet(mut self, origin: StyleOrigin, sheet: StyleSheet) -> Self {
        self.sheets.push((origin, sheet));
        self
    }

    /// Builds the cascade.
    #[must_use]
    pub fn build(self) -> StyleCascade {
        StyleCascade {
            inner: Rc::new(StyleCascadeData {
                sheets: self.sheets,
            }),
        }
    }
}
