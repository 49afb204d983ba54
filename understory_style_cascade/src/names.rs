// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Name interning for sheet loaders.
//!
//! Selectors work on compact ids. Loaders that read textual sheets use a
//! [`NameTable`] to map type names, style ids, classes and pseudo-classes to
//! those ids, and to map them back for diagnostics.
//!
//! ```rust
//! use understory_style_cascade::NameTable;
//!
//! let mut names = NameTable::new();
//! let hover = names.pseudo_class("hover");
//! assert_eq!(names.pseudo_class("hover"), hover);
//! assert_eq!(names.find_pseudo_class("hover"), Some(hover));
//! assert_eq!(names.pseudo_class_name(hover), Some("hover"));
//!
//! // Each namespace is independent.
//! assert_eq!(names.find_class("hover"), None);
//! ```

use alloc::rc::Rc;
use alloc::vec::Vec;

use hashbrown::HashMap;

use crate::selector::{ClassId, PseudoClassId, StyleId, TypeTag};

#[derive(Clone, Debug, Default)]
struct Names {
    names: Vec<Rc<str>>,
    ids: HashMap<Rc<str>, u32>,
}

impl Names {
    fn intern(&mut self, name: &str) -> u32 {
        if let Some(id) = self.ids.get(name) {
            return *id;
        }
        #[expect(
            clippy::cast_possible_truncation,
            reason = "a sheet vocabulary never approaches u32::MAX names"
        )]
        let id = self.names.len() as u32;
        let name: Rc<str> = name.into();
        self.names.push(name.clone());
        self.ids.insert(name, id);
        id
    }

    fn find(&self, name: &str) -> Option<u32> {
        self.ids.get(name).copied()
    }

    fn name(&self, id: u32) -> Option<&str> {
        self.names.get(usize::try_from(id).ok()?).map(|n| &**n)
    }
}

/// Interner for the four selector vocabularies.
#[derive(Clone, Debug, Default)]
pub struct NameTable {
    types: Names,
    ids: Names,
    classes: Names,
    pseudos: Names,
}

impl NameTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns a widget type name.
    pub fn type_tag(&mut self, name: &str) -> TypeTag {
        TypeTag(self.types.intern(name))
    }

    /// Interns a style id.
    pub fn style_id(&mut self, name: &str) -> StyleId {
        StyleId(self.ids.intern(name))
    }

    /// Interns a class name.
    pub fn class(&mut self, name: &str) -> ClassId {
        ClassId(self.classes.intern(name))
    }

    /// Interns a pseudo-class name.
    pub fn pseudo_class(&mut self, name: &str) -> PseudoClassId {
        PseudoClassId(self.pseudos.intern(name))
    }

    /// Looks up a type name without interning.
    #[must_use]
    pub fn find_type_tag(&self, name: &str) -> Option<TypeTag> {
        self.types.find(name).map(TypeTag)
    }

    /// Looks up a style id without interning.
    #[must_use]
    pub fn find_style_id(&self, name: &str) -> Option<StyleId> {
        self.ids.find(name).map(StyleId)
    }

    /// Looks up a class without interning.
    #[must_use]
    pub fn find_class(&self, name: &str) -> Option<ClassId> {
        self.classes.find(name).map(ClassId)
    }

    /// Looks up a pseudo-class without interning.
    #[must_use]
    pub fn find_pseudo_class(&self, name: &str) -> Option<PseudoClassId> {
        self.pseudos.find(name).map(PseudoClassId)
    }

    /// Returns the name of a type tag.
    #[must_use]
    pub fn type_tag_name(&self, tag: TypeTag) -> Option<&str> {
        self.types.name(tag.0)
    }

    /// Returns the name of a style id.
    #[must_use]
    pub fn style_id_name(&self, id: StyleId) -> Option<&str> {
        self.ids.name(id.0)
    }

    /// Returns the name of a class.
    #[must_use]
    pub fn class_name(&self, class: ClassId) -> Option<&str> {
        self.classes.name(class.0)
    }

    /// Returns the name of a pseudo-class.
    #[must_use]
    pub fn pseudo_class_name(&self, pseudo: PseudoClassId) -> Option<&str> {
        self.pseudos.name(pseudo.0)
    }
}
