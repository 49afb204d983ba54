// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory widget tree for unit tests.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use crate::selector::{ClassId, PseudoClassId, SelectorInputs, StyleId, TypeTag};
use crate::tree::StyleTree;

#[derive(Debug, Default)]
struct Node {
    parent: Option<u32>,
    children: Vec<u32>,
    tag: Option<TypeTag>,
    id: Option<StyleId>,
    classes: Vec<ClassId>,
    pseudos: Vec<PseudoClassId>,
}

#[derive(Debug, Default)]
pub(crate) struct TestTree {
    nodes: BTreeMap<u32, Node>,
}

impl TestTree {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, key: u32, parent: Option<u32>, tag: Option<TypeTag>) {
        self.nodes.insert(
            key,
            Node {
                parent,
                tag,
                ..Node::default()
            },
        );
        if let Some(parent) = parent {
            self.nodes.get_mut(&parent).unwrap().children.push(key);
        }
    }

    pub(crate) fn remove(&mut self, key: u32) {
        let node = self.nodes.remove(&key).unwrap();
        if let Some(parent) = node.parent.and_then(|p| self.nodes.get_mut(&p)) {
            parent.children.retain(|c| *c != key);
        }
        for child in node.children {
            self.remove(child);
        }
    }

    pub(crate) fn set_tag(&mut self, key: u32, tag: Option<TypeTag>) {
        self.nodes.get_mut(&key).unwrap().tag = tag;
    }

    pub(crate) fn set_id(&mut self, key: u32, id: Option<StyleId>) {
        self.nodes.get_mut(&key).unwrap().id = id;
    }

    pub(crate) fn add_class(&mut self, key: u32, class: ClassId) {
        insert_sorted(&mut self.nodes.get_mut(&key).unwrap().classes, class);
    }

    pub(crate) fn remove_class(&mut self, key: u32, class: ClassId) {
        self.nodes.get_mut(&key).unwrap().classes.retain(|c| *c != class);
    }

    pub(crate) fn add_pseudo(&mut self, key: u32, pseudo: PseudoClassId) {
        insert_sorted(&mut self.nodes.get_mut(&key).unwrap().pseudos, pseudo);
    }

    pub(crate) fn remove_pseudo(&mut self, key: u32, pseudo: PseudoClassId) {
        self.nodes.get_mut(&key).unwrap().pseudos.retain(|p| *p != pseudo);
    }

    pub(crate) fn reparent(&mut self, key: u32, parent: u32) {
        if let Some(old) = self.nodes[&key].parent {
            self.nodes.get_mut(&old).unwrap().children.retain(|c| *c != key);
        }
        self.nodes.get_mut(&key).unwrap().parent = Some(parent);
        self.nodes.get_mut(&parent).unwrap().children.push(key);
    }
}

fn insert_sorted<T: Ord>(ids: &mut Vec<T>, id: T) {
    if let Err(pos) = ids.binary_search(&id) {
        ids.insert(pos, id);
    }
}

impl StyleTree for TestTree {
    type Key = u32;

    fn selector_inputs(&self, widget: u32) -> Option<SelectorInputs<'_>> {
        let node = self.nodes.get(&widget)?;
        Some(SelectorInputs::new(
            node.tag,
            node.id,
            &node.classes,
            &node.pseudos,
        ))
    }

    fn parent(&self, widget: u32) -> Option<u32> {
        self.nodes.get(&widget)?.parent
    }

    fn children(&self, widget: u32) -> impl Iterator<Item = u32> + '_ {
        self.nodes
            .get(&widget)
            .into_iter()
            .flat_map(|node| node.children.iter().copied())
    }
}
