// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Type-erased style values.

use alloc::rc::Rc;
use core::any::{Any, TypeId};
use core::fmt;

/// Bound satisfied by every style value type.
///
/// `PartialEq` lets resolvers detect whether a recompute actually changed a
/// value; `Debug` keeps values printable in traces.
pub trait StyleValue: Clone + PartialEq + fmt::Debug + 'static {}

impl<T> StyleValue for T where T: Clone + PartialEq + fmt::Debug + 'static {}

/// An immutable, reference-counted, type-erased style value.
///
/// Declarations, defaults and resolved styles all store values in this form.
/// Cloning only bumps a reference count, so inherited values are shared with
/// the ancestor they came from.
///
/// ```rust
/// use understory_style_key::ErasedValue;
///
/// let value = ErasedValue::new(2.0_f64);
/// assert!(value.is::<f64>());
/// assert_eq!(value.downcast_ref::<f64>(), Some(&2.0));
/// assert_eq!(value, ErasedValue::new(2.0_f64));
/// assert_ne!(value, ErasedValue::new(2_u32));
/// ```
#[derive(Clone)]
pub struct ErasedValue {
    inner: Rc<dyn ErasedValueTrait>,
    type_id: TypeId,
}

impl ErasedValue {
    /// Erases a concrete value.
    #[must_use]
    pub fn new<T: StyleValue>(value: T) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            inner: Rc::new(value),
        }
    }

    /// Returns the [`TypeId`] of the contained value.
    #[must_use]
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the Rust type name of the contained value.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.inner.type_name()
    }

    /// Returns `true` if the contained value is a `T`.
    #[must_use]
    #[inline]
    pub fn is<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// Downcasts to a reference of type `T`.
    #[must_use]
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        if self.is::<T>() {
            self.inner.as_any().downcast_ref()
        } else {
            None
        }
    }

    /// Returns `true` if both handles share the same allocation.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for ErasedValue {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
            && (self.ptr_eq(other) || self.inner.dyn_eq(other.inner.as_any()))
    }
}

impl fmt::Debug for ErasedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ErasedValue").field(&self.inner).finish()
    }
}

trait ErasedValueTrait: Any + fmt::Debug {
    fn as_any(&self) -> &dyn Any;
    fn dyn_eq(&self, other: &dyn Any) -> bool;
    fn type_name(&self) -> &'static str;
}

impl<T: StyleValue> ErasedValueTrait for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn Any) -> bool {
        other.downcast_ref::<T>().is_some_and(|other| self == other)
    }

    fn type_name(&self) -> &'static str {
        core::any::type_name::<T>()
    }
}
