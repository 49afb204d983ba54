// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Style Key: typed style keys and style definitions.
//!
//! This crate declares *what* can be styled. It is the foundation that
//! `understory_style_cascade` builds its rule matching and resolution on.
//!
//! ## Core Concepts
//!
//! - [`StyleKey<T>`]: a typed, `Copy` handle for one styleable attribute
//!   (text color, caret blink rate, border width, ...).
//! - [`KeyMetadata`]: the key's default value, whether it inherits from
//!   ancestors, and which [`ChangeFlags`] a change implies.
//! - [`StyleDefinition`]: a named group of related keys registered together;
//!   the unit a widget kind declares it reads.
//! - [`StyleRegistry`]: the explicitly owned registry of definitions and keys.
//!   Key names are unique within a definition's namespace, and the registry
//!   can be sealed once startup is complete.
//! - [`ErasedValue`]: the type-erased, shared value cell used for
//!   heterogeneous storage.
//!
//! ## Quick Start
//!
//! ```rust
//! use understory_style_key::{ChangeFlags, KeyMetadata, StyleRegistry};
//!
//! let mut registry = StyleRegistry::new();
//!
//! let mut text = registry.define("Text").unwrap();
//! let color = text.create_key::<u32>("Color", true).unwrap();
//! let size = text
//!     .create_key_with(
//!         "Size",
//!         KeyMetadata::new(14.0_f32)
//!             .with_inherits(true)
//!             .with_affects(ChangeFlags::LAYOUT | ChangeFlags::PAINT),
//!     )
//!     .unwrap();
//! let text = text.finish();
//!
//! registry.seal();
//!
//! assert_eq!(text.keys().len(), 2);
//! assert_eq!(registry.default_value(color), Some(&0));
//! assert_eq!(registry.default_value(size), Some(&14.0));
//! assert!(registry.affects(size.id()).contains(ChangeFlags::LAYOUT));
//! ```
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`. It does not depend on `std`.

#![no_std]

extern crate alloc;

mod id;
mod metadata;
mod registry;
mod value;

pub use id::{DefinitionId, StyleKey, StyleKeyId};
pub use metadata::{ChangeFlags, KeyMetadata};
pub use registry::{
    DefinitionBuilder, KeyRegistration, RegistryError, StyleDefinition, StyleRegistry,
};
pub use value::{ErasedValue, StyleValue};
