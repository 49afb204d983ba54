// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmarks for `understory_style_key` + `understory_style_cascade`.

use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use std::vec::Vec;

use understory_style_cascade::{
    ClassId, Declarations, PseudoClassId, Selector, SelectorInputs, StateChange, StyleResolver,
    StyleSheet, StyleSheetBuilder, StyleTree, TypeTag,
};
use understory_style_key::{ChangeFlags, KeyMetadata, StyleKey, StyleRegistry};

const PANEL: TypeTag = TypeTag(0);
const BUTTON: TypeTag = TypeTag(1);
const LABEL: TypeTag = TypeTag(2);
const DARK: ClassId = ClassId(0);
const PRIMARY: ClassId = ClassId(1);
const HOVER: PseudoClassId = PseudoClassId(0);
const PRESSED: PseudoClassId = PseudoClassId(1);

struct Node {
    parent: Option<u32>,
    children: Vec<u32>,
    tag: TypeTag,
    classes: Vec<ClassId>,
    pseudos: Vec<PseudoClassId>,
}

/// Panels nested `depth` deep, each holding `fanout` buttons and labels.
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn new(depth: u32, fanout: u32) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        let mut parent = None;
        for level in 0..depth {
            let panel = tree.push(parent, PANEL);
            if level % 2 == 0 {
                tree.nodes[panel as usize].classes.push(DARK);
            }
            for i in 0..fanout {
                let tag = if i % 2 == 0 { BUTTON } else { LABEL };
                let leaf = tree.push(Some(panel), tag);
                if i % 3 == 0 {
                    tree.nodes[leaf as usize].classes.push(PRIMARY);
                }
            }
            parent = Some(panel);
        }
        tree
    }

    fn push(&mut self, parent: Option<u32>, tag: TypeTag) -> u32 {
        let key = u32::try_from(self.nodes.len()).unwrap();
        self.nodes.push(Node {
            parent,
            children: Vec::new(),
            tag,
            classes: Vec::new(),
            pseudos: Vec::new(),
        });
        if let Some(parent) = parent {
            self.nodes[parent as usize].children.push(key);
        }
        key
    }

    fn toggle(&mut self, widget: u32, pseudo: PseudoClassId) {
        let pseudos = &mut self.nodes[widget as usize].pseudos;
        match pseudos.binary_search(&pseudo) {
            Ok(idx) => {
                pseudos.remove(idx);
            }
            Err(idx) => pseudos.insert(idx, pseudo),
        }
    }

    fn keys(&self) -> impl Iterator<Item = u32> {
        0..u32::try_from(self.nodes.len()).unwrap()
    }
}

impl StyleTree for Tree {
    type Key = u32;

    fn selector_inputs(&self, widget: u32) -> Option<SelectorInputs<'_>> {
        let node = self.nodes.get(widget as usize)?;
        Some(SelectorInputs::new(
            Some(node.tag),
            None,
            &node.classes,
            &node.pseudos,
        ))
    }

    fn parent(&self, widget: u32) -> Option<u32> {
        self.nodes.get(widget as usize)?.parent
    }

    fn children(&self, widget: u32) -> impl Iterator<Item = u32> + '_ {
        self.nodes
            .get(widget as usize)
            .into_iter()
            .flat_map(|node| node.children.iter().copied())
    }
}

struct Keys {
    color: StyleKey<u32>,
    font_size: StyleKey<f32>,
    border: StyleKey<f64>,
    padding: StyleKey<f64>,
}

fn registry() -> (StyleRegistry, Keys) {
    let mut registry = StyleRegistry::new();
    let mut text = registry.define("Text").unwrap();
    let color = text.create_key::<u32>("Color", true).unwrap();
    let font_size = text
        .create_key_with(
            "Size",
            KeyMetadata::new(14.0_f32)
                .with_inherits(true)
                .with_affects(ChangeFlags::LAYOUT | ChangeFlags::PAINT),
        )
        .unwrap();
    let _ = text.finish();
    let mut frame = registry.define("Frame").unwrap();
    let border = frame.create_key::<f64>("BorderWidth", false).unwrap();
    let padding = frame
        .create_key_with(
            "Padding",
            KeyMetadata::new(4.0_f64).with_affects(ChangeFlags::LAYOUT),
        )
        .unwrap();
    let _ = frame.finish();
    registry.seal();
    (
        registry,
        Keys {
            color,
            font_size,
            border,
            padding,
        },
    )
}

fn sheet(registry: &StyleRegistry, keys: &Keys) -> StyleSheet {
    StyleSheetBuilder::new()
        .rule(
            Selector::new().tag(PANEL),
            Declarations::builder().set(keys.color, 0x202020).build(),
        )
        .rule(
            Selector::new().tag(PANEL).class(DARK),
            Declarations::builder()
                .set(keys.color, 0xf0f0f0)
                .set(keys.font_size, 13.0)
                .build(),
        )
        .rule(
            Selector::new().tag(BUTTON),
            Declarations::builder()
                .set(keys.border, 1.0)
                .set(keys.padding, 6.0)
                .build(),
        )
        .rule(
            Selector::new().tag(BUTTON).pseudo(HOVER),
            Declarations::builder().set(keys.color, 0x3060ff).build(),
        )
        .rule(
            Selector::new().tag(BUTTON).pseudo(PRESSED),
            Declarations::builder().set(keys.border, 2.0).build(),
        )
        .rule(
            Selector::new().class(PRIMARY),
            Declarations::builder().set(keys.padding, 8.0).build(),
        )
        .rule(
            Selector::new()
                .tag(LABEL)
                .child_of(Selector::new().tag(PANEL).class(DARK)),
            Declarations::builder().set(keys.font_size, 12.0).build(),
        )
        .build(registry)
        .unwrap()
}

fn bench_style_cascade(c: &mut Criterion) {
    let (registry, keys) = registry();
    let sheet = sheet(&registry, &keys);

    let mut group = c.benchmark_group("style_cascade/resolve");
    for (depth, fanout) in [(4_u32, 8_u32), (16, 16)] {
        let tree = Tree::new(depth, fanout);
        let widgets = tree.nodes.len();

        group.bench_function(BenchmarkId::new("cold", widgets), |b| {
            b.iter_batched(
                || StyleResolver::new(&registry, sheet.clone()),
                |mut resolver| {
                    for widget in tree.keys() {
                        black_box(resolver.resolve(&tree, widget).len());
                    }
                    resolver
                },
                BatchSize::SmallInput,
            );
        });

        group.bench_function(BenchmarkId::new("warm", widgets), |b| {
            let mut resolver = StyleResolver::new(&registry, sheet.clone());
            for widget in tree.keys() {
                let _ = resolver.resolve(&tree, widget);
            }
            let leaf = tree.keys().last().unwrap();
            b.iter(|| black_box(resolver.get(&tree, leaf, keys.font_size).copied()));
        });
    }
    group.finish();

    let mut group = c.benchmark_group("style_cascade/invalidate");

    group.bench_function("pseudo_toggle", |b| {
        let mut tree = Tree::new(16, 16);
        let mut resolver = StyleResolver::new(&registry, sheet.clone());
        for widget in tree.keys() {
            let _ = resolver.resolve(&tree, widget);
        }
        let button = tree.nodes[0].children[0];
        b.iter(|| {
            tree.toggle(button, HOVER);
            resolver.notify(&tree, StateChange::PseudoClass { widget: button, pseudo: HOVER });
            black_box(resolver.get(&tree, button, keys.color).copied());
            resolver.drain_events().count()
        });
    });

    group.bench_function("inherited_class_toggle", |b| {
        let mut tree = Tree::new(16, 16);
        let mut resolver = StyleResolver::new(&registry, sheet.clone());
        for widget in tree.keys() {
            let _ = resolver.resolve(&tree, widget);
        }
        let leaf = tree.keys().last().unwrap();
        b.iter(|| {
            let classes = &mut tree.nodes[0].classes;
            if classes.is_empty() {
                classes.push(DARK);
            } else {
                classes.clear();
            }
            resolver.notify(&tree, StateChange::Class { widget: 0, class: DARK });
            black_box(resolver.get(&tree, leaf, keys.color).copied());
            resolver.drain_events().count()
        });
    });

    group.finish();
}

criterion_group!(benches, bench_style_cascade);
criterion_main!(benches);
