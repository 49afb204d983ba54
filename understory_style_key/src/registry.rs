// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Style key registry and style definitions.
//!
//! A [`StyleRegistry`] is an explicitly owned context object: it is created
//! at style-system startup, filled with [`StyleDefinition`]s, sealed, and then
//! shared read-only by every sheet loader and resolver that uses it.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::any::TypeId;

use hashbrown::HashMap;

use crate::id::{DefinitionId, StyleKey, StyleKeyId};
use crate::metadata::{ChangeFlags, KeyMetadata};
use crate::value::{ErasedValue, StyleValue};

/// Configuration errors raised while registering definitions and keys.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// A definition with this name already exists.
    #[error("style definition `{name}` is already registered")]
    DuplicateDefinition {
        /// The rejected definition name.
        name: Box<str>,
    },
    /// A key with this name already exists in the definition's namespace.
    #[error("style key `{name}` is already registered in definition `{definition}`")]
    DuplicateKey {
        /// The definition namespace.
        definition: Box<str>,
        /// The rejected key name.
        name: Box<str>,
    },
    /// The registry was sealed; no more definitions or keys are accepted.
    #[error("style registry is sealed; cannot register `{name}`")]
    Sealed {
        /// The rejected definition name.
        name: Box<str>,
    },
    /// The key id space is exhausted.
    #[error("too many style keys registered (max {max})")]
    TooManyKeys {
        /// The maximum number of keys a registry can hold.
        max: usize,
    },
}

/// Registration record for one key.
#[derive(Debug)]
pub struct KeyRegistration {
    name: Box<str>,
    definition: DefinitionId,
    type_id: TypeId,
    type_name: &'static str,
    inherits: bool,
    affects: ChangeFlags,
    default: ErasedValue,
}

impl KeyRegistration {
    /// Returns the key name within its definition.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the definition this key belongs to.
    #[must_use]
    pub fn definition(&self) -> DefinitionId {
        self.definition
    }

    /// Returns the [`TypeId`] of the key's value type.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the Rust type name of the key's value type.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns whether undeclared values inherit from ancestors.
    #[must_use]
    pub fn inherits(&self) -> bool {
        self.inherits
    }

    /// Returns what a change to this key affects.
    #[must_use]
    pub fn affects(&self) -> ChangeFlags {
        self.affects
    }

    /// Returns the default value.
    #[must_use]
    pub fn default_value(&self) -> &ErasedValue {
        &self.default
    }
}

#[derive(Debug)]
struct DefinitionEntry {
    name: Rc<str>,
    keys: Vec<StyleKeyId>,
    by_name: HashMap<Box<str>, StyleKeyId>,
}

/// A named, cohesive group of style keys.
///
/// Widgets of a given kind declare the definitions they read; the definition
/// is shared read-only across all of them. Cloning is cheap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StyleDefinition {
    id: DefinitionId,
    name: Rc<str>,
    keys: Rc<[StyleKeyId]>,
}

impl StyleDefinition {
    /// Returns the definition id.
    #[must_use]
    pub fn id(&self) -> DefinitionId {
        self.id
    }

    /// Returns the definition name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the keys of this definition in creation order.
    #[must_use]
    pub fn keys(&self) -> &[StyleKeyId] {
        &self.keys
    }

    /// Returns `true` if `key` belongs to this definition.
    #[must_use]
    pub fn contains(&self, key: StyleKeyId) -> bool {
        self.keys.contains(&key)
    }
}

/// Registry of style definitions and their keys.
///
/// # Example
///
/// ```rust
/// use understory_style_key::{RegistryError, StyleRegistry};
///
/// let mut registry = StyleRegistry::new();
/// let mut text = registry.define("Text").unwrap();
/// let color = text.create_key::<u32>("Color", true).unwrap();
/// let size = text.create_key::<f32>("Size", true).unwrap();
/// assert!(matches!(
///     text.create_key::<u32>("Color", false),
///     Err(RegistryError::DuplicateKey { .. })
/// ));
/// let text = text.finish();
///
/// registry.seal();
/// assert!(registry.define("Caret").is_err());
///
/// assert_eq!(text.keys(), &[color.id(), size.id()]);
/// assert_eq!(registry.key_by_name("Text", "Size"), Some(size.id()));
/// assert_eq!(registry.qualified_name(color.id()).as_deref(), Some("Text.Color"));
/// assert!(registry.inherits(color.id()));
/// ```
#[derive(Debug, Default)]
pub struct StyleRegistry {
    keys: Vec<KeyRegistration>,
    definitions: Vec<DefinitionEntry>,
    by_name: HashMap<Rc<str>, DefinitionId>,
    inherited_keys: usize,
    sealed: bool,
}

impl StyleRegistry {
    /// Creates an empty, unsealed registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a new definition namespace.
    ///
    /// Keys are added through the returned [`DefinitionBuilder`].
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Sealed`] after [`StyleRegistry::seal`], and
    /// [`RegistryError::DuplicateDefinition`] if `name` is taken.
    pub fn define(&mut self, name: &str) -> Result<DefinitionBuilder<'_>, RegistryError> {
        if self.sealed {
            return Err(RegistryError::Sealed { name: name.into() });
        }
        if self.by_name.contains_key(name) {
            return Err(RegistryError::DuplicateDefinition { name: name.into() });
        }
        let index =
            u16::try_from(self.definitions.len()).map_err(|_| RegistryError::TooManyKeys {
                max: usize::from(u16::MAX),
            })?;
        let id = DefinitionId::new(index);
        let name: Rc<str> = name.into();
        self.definitions.push(DefinitionEntry {
            name: name.clone(),
            keys: Vec::new(),
            by_name: HashMap::new(),
        });
        self.by_name.insert(name, id);
        Ok(DefinitionBuilder { registry: self, id })
    }

    /// Rejects every further definition and key.
    ///
    /// Called once style-system startup is complete.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    /// Returns `true` once [`StyleRegistry::seal`] was called.
    #[must_use]
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Returns the number of registered keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns `true` if no keys are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Returns `true` if any registered key inherits.
    #[must_use]
    pub fn has_inherited_keys(&self) -> bool {
        self.inherited_keys > 0
    }

    /// Returns the registration for a key.
    #[must_use]
    pub fn get(&self, id: StyleKeyId) -> Option<&KeyRegistration> {
        self.keys.get(usize::from(id.index()))
    }

    /// Returns the key name within its definition.
    #[must_use]
    pub fn name(&self, id: StyleKeyId) -> Option<&str> {
        self.get(id).map(KeyRegistration::name)
    }

    /// Returns `Definition.Key` for diagnostics.
    #[must_use]
    pub fn qualified_name(&self, id: StyleKeyId) -> Option<alloc::string::String> {
        let registration = self.get(id)?;
        let definition = self
            .definitions
            .get(usize::from(registration.definition.index()))?;
        Some(alloc::format!("{}.{}", definition.name, registration.name))
    }

    /// Returns whether a key inherits. Unknown keys do not.
    #[must_use]
    pub fn inherits(&self, id: StyleKeyId) -> bool {
        self.get(id).is_some_and(KeyRegistration::inherits)
    }

    /// Returns what a change to a key affects. Unknown keys affect nothing.
    #[must_use]
    pub fn affects(&self, id: StyleKeyId) -> ChangeFlags {
        self.get(id).map(KeyRegistration::affects).unwrap_or_default()
    }

    /// Returns the value type of a key.
    #[must_use]
    pub fn type_id(&self, id: StyleKeyId) -> Option<TypeId> {
        self.get(id).map(KeyRegistration::type_id)
    }

    /// Returns the type-erased default of a key.
    #[must_use]
    pub fn default_erased(&self, id: StyleKeyId) -> Option<&ErasedValue> {
        self.get(id).map(KeyRegistration::default_value)
    }

    /// Returns the typed default of a key.
    ///
    /// Returns `None` if the key is unknown or was registered with another type.
    #[must_use]
    pub fn default_value<T: StyleValue>(&self, key: StyleKey<T>) -> Option<&T> {
        self.default_erased(key.id())?.downcast_ref()
    }

    /// Looks up a definition by name.
    #[must_use]
    pub fn definition_id(&self, name: &str) -> Option<DefinitionId> {
        self.by_name.get(name).copied()
    }

    /// Returns a shared handle to a definition.
    #[must_use]
    pub fn definition(&self, id: DefinitionId) -> Option<StyleDefinition> {
        let entry = self.definitions.get(usize::from(id.index()))?;
        Some(StyleDefinition {
            id,
            name: entry.name.clone(),
            keys: entry.keys.as_slice().into(),
        })
    }

    /// Looks up a key by definition and key name.
    #[must_use]
    pub fn key_by_name(&self, definition: &str, key: &str) -> Option<StyleKeyId> {
        let id = self.definition_id(definition)?;
        self.definitions
            .get(usize::from(id.index()))?
            .by_name
            .get(key)
            .copied()
    }

    /// Returns an iterator over all keys in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (StyleKeyId, &KeyRegistration)> {
        self.keys.iter().enumerate().map(|(i, r)| {
            #[expect(clippy::cast_possible_truncation, reason = "index < len <= u16::MAX")]
            (StyleKeyId::new(i as u16), r)
        })
    }

    fn insert_key<T: StyleValue>(
        &mut self,
        definition: DefinitionId,
        name: &str,
        metadata: KeyMetadata<T>,
    ) -> Result<StyleKey<T>, RegistryError> {
        let def_index = usize::from(definition.index());
        if self.definitions[def_index].by_name.contains_key(name) {
            return Err(RegistryError::DuplicateKey {
                definition: self.definitions[def_index].name.as_ref().into(),
                name: name.into(),
            });
        }
        let index = u16::try_from(self.keys.len())
            .ok()
            .filter(|index| *index < u16::MAX)
            .ok_or(RegistryError::TooManyKeys {
                max: usize::from(u16::MAX),
            })?;
        let id = StyleKeyId::new(index);
        let (default, inherits, affects) = metadata.into_parts();
        self.keys.push(KeyRegistration {
            name: name.into(),
            definition,
            type_id: TypeId::of::<T>(),
            type_name: core::any::type_name::<T>(),
            inherits,
            affects,
            default: ErasedValue::new(default),
        });
        if inherits {
            self.inherited_keys += 1;
        }
        let entry = &mut self.definitions[def_index];
        entry.keys.push(id);
        entry.by_name.insert(name.into(), id);
        Ok(StyleKey::from_id(id))
    }
}

/// Adds keys to one definition namespace.
///
/// Obtained from [`StyleRegistry::define`]; the definition exists from that
/// point on, and [`DefinitionBuilder::finish`] returns its shared handle.
#[derive(Debug)]
pub struct DefinitionBuilder<'r> {
    registry: &'r mut StyleRegistry,
    id: DefinitionId,
}

impl DefinitionBuilder<'_> {
    /// Returns the id of the definition being built.
    #[must_use]
    pub fn id(&self) -> DefinitionId {
        self.id
    }

    /// Creates a key whose default is `T::default()`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateKey`] if `name` exists in this
    /// definition, or [`RegistryError::TooManyKeys`] if ids are exhausted.
    pub fn create_key<T: StyleValue + Default>(
        &mut self,
        name: &str,
        inherited: bool,
    ) -> Result<StyleKey<T>, RegistryError> {
        self.create_key_with(name, KeyMetadata::new(T::default()).with_inherits(inherited))
    }

    /// Creates a key with explicit metadata.
    ///
    /// # Errors
    ///
    /// Same as [`DefinitionBuilder::create_key`].
    pub fn create_key_with<T: StyleValue>(
        &mut self,
        name: &str,
        metadata: KeyMetadata<T>,
    ) -> Result<StyleKey<T>, RegistryError> {
        self.registry.insert_key(self.id, name, metadata)
    }

    /// Completes the definition and returns its shared handle.
    #[must_use]
    pub fn finish(self) -> StyleDefinition {
        let entry = &self.registry.definitions[usize::from(self.id.index())];
        StyleDefinition {
            id: self.id,
            name: entry.name.clone(),
            keys: entry.keys.as_slice().into(),
        }
    }
}
