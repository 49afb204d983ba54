// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end cascade and invalidation behavior against an in-memory tree.

use std::collections::BTreeMap;

use understory_style_cascade::{
    ClassId, Declarations, NameTable, PseudoClassId, Selector, SelectorInputs, SheetError,
    StateChange, StyleCascade, StyleEvent, StyleId, StyleOrigin, StyleResolver, StyleSheet,
    StyleSheetBuilder, StyleTree, TypeTag, WatchFragment,
};
use understory_style_key::{
    ChangeFlags, ErasedValue, KeyMetadata, RegistryError, StyleKey, StyleRegistry,
};

#[derive(Default)]
struct Widget {
    parent: Option<u32>,
    children: Vec<u32>,
    tag: Option<TypeTag>,
    id: Option<StyleId>,
    classes: Vec<ClassId>,
    pseudos: Vec<PseudoClassId>,
}

#[derive(Default)]
struct Widgets {
    nodes: BTreeMap<u32, Widget>,
}

impl Widgets {
    fn add(&mut self, key: u32, parent: Option<u32>, tag: TypeTag) -> &mut Widget {
        if let Some(parent) = parent {
            self.nodes.get_mut(&parent).unwrap().children.push(key);
        }
        self.nodes.entry(key).or_insert(Widget {
            parent,
            tag: Some(tag),
            ..Widget::default()
        })
    }

    fn set_pseudo(&mut self, key: u32, pseudo: PseudoClassId, on: bool) {
        let pseudos = &mut self.nodes.get_mut(&key).unwrap().pseudos;
        pseudos.retain(|p| *p != pseudo);
        if on {
            pseudos.push(pseudo);
            pseudos.sort();
        }
    }

    fn remove(&mut self, key: u32) {
        let widget = self.nodes.remove(&key).unwrap();
        if let Some(parent) = widget.parent.and_then(|p| self.nodes.get_mut(&p)) {
            parent.children.retain(|c| *c != key);
        }
        for child in widget.children {
            self.remove(child);
        }
    }
}

impl StyleTree for Widgets {
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

const RED: u32 = 0xff0000;
const GREEN: u32 = 0x00ff00;
const BLUE: u32 = 0x0000ff;

struct Fixture {
    names: NameTable,
    registry: StyleRegistry,
    color: StyleKey<u32>,
    border_width: StyleKey<f64>,
}

fn fixture() -> Fixture {
    let mut registry = StyleRegistry::new();
    let mut text = registry.define("Text").unwrap();
    let color = text.create_key::<u32>("Color", true).unwrap();
    let _ = text.finish();
    let mut border = registry.define("Border").unwrap();
    let border_width = border
        .create_key_with(
            "Width",
            KeyMetadata::new(0.0_f64).with_affects(ChangeFlags::LAYOUT | ChangeFlags::PAINT),
        )
        .unwrap();
    let _ = border.finish();
    registry.seal();
    Fixture {
        names: NameTable::new(),
        registry,
        color,
        border_width,
    }
}

/// `Panel` (1) holding `Button#btn` (2) and `Label` (3).
fn widgets(names: &mut NameTable) -> Widgets {
    let mut widgets = Widgets::default();
    widgets.add(1, None, names.type_tag("Panel"));
    widgets.add(2, Some(1), names.type_tag("Button")).id = Some(names.style_id("btn"));
    widgets.add(3, Some(1), names.type_tag("Label"));
    widgets
}

#[test]
fn id_rule_beats_hover_rule() {
    let mut fx = fixture();
    let mut tree = widgets(&mut fx.names);
    let hover = fx.names.pseudo_class("hover");
    let btn = fx.names.style_id("btn");

    let sheet = StyleSheetBuilder::new()
        .rule(
            Selector::new().pseudo(hover),
            Declarations::builder().set(fx.color, BLUE).build(),
        )
        .rule(
            Selector::new().id(btn),
            Declarations::builder().set(fx.color, RED).build(),
        )
        .build(&fx.registry)
        .unwrap();
    let reversed = StyleSheetBuilder::new()
        .rule(
            Selector::new().id(btn),
            Declarations::builder().set(fx.color, RED).build(),
        )
        .rule(
            Selector::new().pseudo(hover),
            Declarations::builder().set(fx.color, BLUE).build(),
        )
        .build(&fx.registry)
        .unwrap();

    tree.set_pseudo(2, hover, true);
    for sheet in [sheet, reversed] {
        let mut resolver = StyleResolver::new(&fx.registry, sheet);
        assert_eq!(resolver.get(&tree, 2, fx.color), Some(&RED));
        assert_eq!(resolver.get(&tree, 3, fx.color), Some(&0));
    }
}

#[test]
fn undeclared_inherited_key_reads_parent_value() {
    let mut fx = fixture();
    let tree = widgets(&mut fx.names);
    let panel = fx.names.type_tag("Panel");

    let sheet = StyleSheetBuilder::new()
        .rule(
            Selector::new().tag(panel),
            Declarations::builder()
                .set(fx.color, GREEN)
                .set(fx.border_width, 3.0)
                .build(),
        )
        .build(&fx.registry)
        .unwrap();
    let mut resolver = StyleResolver::new(&fx.registry, sheet);

    assert_eq!(resolver.get(&tree, 2, fx.color), Some(&GREEN));
    assert_eq!(resolver.get(&tree, 2, fx.border_width), Some(&0.0));
    assert_eq!(resolver.get(&tree, 1, fx.border_width), Some(&3.0));
}

#[test]
fn pressed_border_width_follows_state() {
    let mut fx = fixture();
    let mut tree = widgets(&mut fx.names);
    let pressed = fx.names.pseudo_class("pressed");

    let sheet = StyleSheetBuilder::new()
        .rule(
            Selector::new().pseudo(pressed),
            Declarations::builder().set(fx.border_width, 2.0).build(),
        )
        .build(&fx.registry)
        .unwrap();
    let mut resolver = StyleResolver::new(&fx.registry, sheet);
    for widget in 1..=3 {
        assert_eq!(resolver.get(&tree, widget, fx.border_width), Some(&0.0));
    }

    tree.set_pseudo(2, pressed, true);
    resolver.notify(&tree, StateChange::PseudoClass { widget: 2, pseudo: pressed });
    assert!(resolver.is_dirty(2));
    assert!(!resolver.is_dirty(1));
    assert!(!resolver.is_dirty(3));
    assert_eq!(resolver.get(&tree, 2, fx.border_width), Some(&2.0));

    tree.set_pseudo(2, pressed, false);
    resolver.notify(&tree, StateChange::PseudoClass { widget: 2, pseudo: pressed });
    assert_eq!(resolver.get(&tree, 2, fx.border_width), Some(&0.0));

    let changes: Vec<_> = resolver
        .drain_events()
        .filter_map(|event| match event {
            StyleEvent::Changed { widget, affects } => Some((widget, affects)),
            StyleEvent::Invalidated { .. } => None,
        })
        .collect();
    assert_eq!(changes, [(2, ChangeFlags::all()), (2, ChangeFlags::all())]);

    // Each widget watched its own `:pressed` exactly once.
    assert_eq!(resolver.watch_count(), 3);
    let rule = resolver
        .watch_rule(2, WatchFragment::PseudoClass(pressed))
        .unwrap();
    assert_eq!(rule.owners(), &[2]);
}

#[test]
fn resolution_is_stable_without_changes() {
    let mut fx = fixture();
    let tree = widgets(&mut fx.names);
    let button = fx.names.type_tag("Button");
    let focus = fx.names.pseudo_class("focus");

    let sheet = StyleSheetBuilder::new()
        .rule(
            Selector::new().tag(button),
            Declarations::builder().set(fx.color, BLUE).build(),
        )
        .rule(
            Selector::new().tag(button).pseudo(focus),
            Declarations::builder().set(fx.color, RED).build(),
        )
        .build(&fx.registry)
        .unwrap();
    let mut resolver = StyleResolver::new(&fx.registry, sheet.clone());
    let first = resolver.resolve(&tree, 2).clone();
    for _ in 0..4 {
        assert_eq!(resolver.resolve(&tree, 2), &first);
    }
    assert_eq!(resolver.watch_count(), 1);
    assert_eq!(sheet.lookup(&tree, 2, fx.color), first.get(fx.color));
}

#[test]
fn ancestor_hover_invalidates_only_descendant_owners() {
    let mut fx = fixture();
    let mut tree = widgets(&mut fx.names);
    let panel = fx.names.type_tag("Panel");
    let label = fx.names.type_tag("Label");
    let hover = fx.names.pseudo_class("hover");

    let sheet = StyleSheetBuilder::new()
        .rule(
            Selector::new()
                .tag(label)
                .child_of(Selector::new().tag(panel).pseudo(hover)),
            Declarations::builder().set(fx.border_width, 1.0).build(),
        )
        .build(&fx.registry)
        .unwrap();
    let mut resolver = StyleResolver::new(&fx.registry, sheet);
    for widget in 1..=3 {
        let _ = resolver.resolve(&tree, widget);
    }

    tree.set_pseudo(1, hover, true);
    resolver.notify(&tree, StateChange::PseudoClass { widget: 1, pseudo: hover });
    assert!(!resolver.is_dirty(1));
    assert!(!resolver.is_dirty(2));
    assert!(resolver.is_dirty(3));
    assert_eq!(resolver.get(&tree, 3, fx.border_width), Some(&1.0));
}

#[test]
fn origins_outrank_specificity() {
    let mut fx = fixture();
    let tree = widgets(&mut fx.names);
    let btn = fx.names.style_id("btn");

    let defaults = StyleSheetBuilder::new()
        .rule(
            Selector::new().id(btn),
            Declarations::builder().set(fx.color, RED).build(),
        )
        .build(&fx.registry)
        .unwrap();
    let overrides = StyleSheetBuilder::new()
        .rule(
            Selector::new(),
            Declarations::builder().set(fx.color, GREEN).build(),
        )
        .build(&fx.registry)
        .unwrap();
    let cascade = StyleCascade::builder()
        .push_sheet(StyleOrigin::Override, overrides)
        .push_sheet(StyleOrigin::Sheet, defaults)
        .build();

    let mut resolver = StyleResolver::new(&fx.registry, cascade);
    assert_eq!(resolver.get(&tree, 2, fx.color), Some(&GREEN));
}

#[test]
fn detached_widgets_drop_caches_and_ignore_notifications() {
    let mut fx = fixture();
    let mut tree = widgets(&mut fx.names);
    let hover = fx.names.pseudo_class("hover");

    let sheet = StyleSheetBuilder::new()
        .rule(
            Selector::new().pseudo(hover),
            Declarations::builder().set(fx.color, BLUE).build(),
        )
        .build(&fx.registry)
        .unwrap();
    let mut resolver = StyleResolver::new(&fx.registry, sheet);
    for widget in 1..=3 {
        let _ = resolver.resolve(&tree, widget);
    }
    assert_eq!(resolver.watch_count(), 3);

    tree.remove(1);
    resolver.notify(&tree, StateChange::Detached { widget: 1 });
    assert!(resolver.is_empty());
    assert_eq!(resolver.watch_count(), 0);

    resolver.notify(&tree, StateChange::PseudoClass { widget: 2, pseudo: hover });
    assert!(!resolver.is_cached(2));
    assert_eq!(resolver.get(&tree, 2, fx.color), Some(&0));
    assert!(resolver.is_empty());
}

#[test]
fn loader_errors_surface_at_build_time() {
    let mut fx = fixture();
    let hover = fx.names.pseudo_class("hover");

    let mistyped = Declarations::builder()
        .set_erased(fx.color.id(), ErasedValue::new(1.5_f32))
        .build();
    let err = StyleSheetBuilder::new()
        .rule(Selector::new().pseudo(hover), mistyped)
        .build(&fx.registry)
        .unwrap_err();
    assert_eq!(
        err,
        SheetError::TypeMismatch {
            rule: 0,
            key: "Text.Color".into(),
            expected: "u32",
            found: "f32",
        }
    );

    let err = Declarations::builder()
        .set_by_name(&fx.registry, "Text", "Weight", 700_u32)
        .unwrap_err();
    assert!(matches!(err, SheetError::UnknownName { .. }));

    let by_name = Declarations::builder()
        .set_by_name(&fx.registry, "Border", "Width", 4.0_f64)
        .unwrap()
        .build();
    let sheet: StyleSheet = StyleSheetBuilder::new()
        .rule(Selector::new().pseudo(hover), by_name)
        .build(&fx.registry)
        .unwrap();
    assert_eq!(sheet.len(), 1);

    assert!(matches!(
        fx.registry.define("Caret"),
        Err(RegistryError::Sealed { .. })
    ));
}
