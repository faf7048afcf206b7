// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Shared, identity-bearing references.
//!
//! [`Ref<T>`] is the only construct whose identity the codec tracks. A
//! `Ref<Concrete>` is closed (its payload type is known statically); a
//! `Ref<dyn Trait>` declared with [`interface!`](crate::interface) is open
//! and goes through the tagged dispatcher.

use super::shape::{Describe, InterfaceShape, ReferenceShape, ShapeFn, TypeKind, TypeShape};
use crate::error::{CodecError, CodecResult};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Type-erased, `'static` object stored behind an open reference.
///
/// Blanket-implemented; user interfaces declare `trait Shape: Object`.
pub trait Object: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any + Send + Sync> Object for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Nullable shared handle with pointer identity.
///
/// Cloning a `Ref` shares the target; two handles are the same instance iff
/// [`Ref::ptr_eq`] holds. The default value is null.
pub struct Ref<T: ?Sized>(Option<Arc<RwLock<T>>>);

impl<T> Ref<T> {
    pub fn new(value: T) -> Self {
        Self(Some(Arc::new(RwLock::new(value))))
    }
}

impl<T: Object> Ref<T> {
    /// Same instance, seen through the open `Ref<dyn Object>`.
    pub fn to_object(&self) -> Ref<dyn Object> {
        self.map_arc(|cell| cell as Arc<RwLock<dyn Object>>)
    }
}

impl<T: ?Sized> Ref<T> {
    pub const fn null() -> Self {
        Self(None)
    }

    pub fn from_arc(arc: Arc<RwLock<T>>) -> Self {
        Self(Some(arc))
    }

    pub fn is_null(&self) -> bool {
        self.0.is_none()
    }

    pub fn as_arc(&self) -> Option<&Arc<RwLock<T>>> {
        self.0.as_ref()
    }

    /// Shared access; re-entrant for the same thread so cyclic graphs can be
    /// walked while an outer guard is held.
    pub fn read(&self) -> Option<RwLockReadGuard<'_, T>> {
        self.0.as_ref().map(|cell| cell.read_recursive())
    }

    pub fn write(&self) -> Option<RwLockWriteGuard<'_, T>> {
        self.0.as_ref().map(|cell| cell.write())
    }

    /// Same instance (or both null).
    pub fn ptr_eq(&self, other: &Ref<T>) -> bool {
        match (&self.0, &other.0) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    /// Address of the shared cell; stable for the lifetime of the instance.
    pub fn identity(&self) -> Option<usize> {
        self.0
            .as_ref()
            .map(|cell| Arc::as_ptr(cell) as *const () as usize)
    }

    /// Number of handles sharing the instance (0 for null).
    pub fn share_count(&self) -> usize {
        self.0.as_ref().map_or(0, Arc::strong_count)
    }

    /// Re-type the shared cell, typically to upcast into `Ref<dyn Trait>`.
    pub fn map_arc<U: ?Sized>(&self, f: impl FnOnce(Arc<RwLock<T>>) -> Arc<RwLock<U>>) -> Ref<U> {
        Ref(self.0.clone().map(f))
    }
}

impl<T: ?Sized> Clone for Ref<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: ?Sized> Default for Ref<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T: ?Sized> fmt::Debug for Ref<T> {
    // Address only: printing the target would not terminate on cycles.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.identity() {
            Some(addr) => write!(f, "Ref(@{:#x})", addr),
            None => f.write_str("Ref(null)"),
        }
    }
}

impl<T> From<T> for Ref<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

/// A type that may sit behind a [`Ref`].
///
/// Implemented by `#[derive(Codec)]` for structs and by
/// [`interface!`](crate::interface) for trait objects.
pub trait RefTarget: Send + Sync + 'static {
    /// The concrete value, type-erased.
    fn target_any(&self) -> &dyn Any;

    /// Shape of `Ref<Self>`.
    fn ref_shape() -> TypeShape;
}

impl<T: ?Sized + RefTarget> Describe for Ref<T> {
    fn shape() -> TypeShape {
        T::ref_shape()
    }
}

/// Visitor over a type-erased value.
pub type ValueVisitor<'v> = dyn FnMut(&dyn Any) -> CodecResult<()> + 'v;

/// Visitor over a type-erased mutable slot.
pub type SlotVisitor<'v> = dyn FnMut(&mut dyn Any) -> CodecResult<()> + 'v;

/// Type-erased handle operations for `Ref<C>` with a concrete `C`.
#[derive(Clone, Copy)]
pub struct RefOps {
    /// Outer `None` on type mismatch, inner `None` for a null handle.
    pub identity: fn(&dyn Any) -> Option<Option<usize>>,
    /// Fresh `Ref<C>` holding `C::default()`.
    pub allocate: fn() -> Box<dyn Any + Send + Sync>,
    pub clone_handle: fn(&dyn Any) -> Option<Box<dyn Any + Send + Sync>>,
    /// Store a clone of `handle` into `slot`; `false` on type mismatch.
    pub assign: fn(&mut dyn Any, &dyn Any) -> bool,
    pub set_null: fn(&mut dyn Any) -> bool,
    /// Read-lock the target and pass it to the visitor (no-op when null).
    pub visit: fn(&dyn Any, &mut ValueVisitor<'_>) -> CodecResult<()>,
    /// Fill a detached default `C` through the visitor, then store it.
    pub fill: fn(&dyn Any, &mut SlotVisitor<'_>) -> CodecResult<()>,
    /// Re-type a `Ref<C>` as `Ref<dyn Object>`.
    pub erase: fn(&dyn Any) -> Option<Box<dyn Any + Send + Sync>>,
}

impl RefOps {
    pub fn of<T: Describe>() -> Self {
        Self {
            identity: |h| h.downcast_ref::<Ref<T>>().map(Ref::identity),
            allocate: || Box::new(Ref::new(T::default())),
            clone_handle: |h| {
                h.downcast_ref::<Ref<T>>()
                    .map(|r| Box::new(r.clone()) as Box<dyn Any + Send + Sync>)
            },
            assign: |slot, h| match (slot.downcast_mut::<Ref<T>>(), h.downcast_ref::<Ref<T>>()) {
                (Some(slot), Some(handle)) => {
                    *slot = handle.clone();
                    true
                }
                _ => false,
            },
            set_null: |slot| match slot.downcast_mut::<Ref<T>>() {
                Some(slot) => {
                    *slot = Ref::null();
                    true
                }
                None => false,
            },
            visit: |h, visit| {
                let handle = h
                    .downcast_ref::<Ref<T>>()
                    .ok_or_else(CodecError::mismatch::<Ref<T>>)?;
                match handle.read() {
                    Some(guard) => visit(&*guard as &dyn Any),
                    None => Ok(()),
                }
            },
            fill: |h, visit| {
                let handle = h
                    .downcast_ref::<Ref<T>>()
                    .ok_or_else(CodecError::mismatch::<Ref<T>>)?;
                // Decode into a detached value: no lock is held while nested
                // procedures clone this handle for back-references.
                let mut value = T::default();
                visit(&mut value as &mut dyn Any)?;
                if let Some(mut guard) = handle.write() {
                    *guard = value;
                }
                Ok(())
            },
            erase: |h| {
                h.downcast_ref::<Ref<T>>()
                    .map(|r| Box::new(r.to_object()) as Box<dyn Any + Send + Sync>)
            },
        }
    }
}

/// Type-erased handle operations for `Ref<dyn I>`.
#[derive(Clone, Copy)]
pub struct InterfaceOps {
    pub identity: fn(&dyn Any) -> Option<Option<usize>>,
    /// Read-lock and pass the concrete target (via `RefTarget::target_any`).
    pub visit: fn(&dyn Any, &mut ValueVisitor<'_>) -> CodecResult<()>,
    pub set_null: fn(&mut dyn Any) -> bool,
    /// Store an already upcast `Ref<dyn I>`; `false` on type mismatch.
    pub assign: fn(&mut dyn Any, Box<dyn Any + Send + Sync>) -> bool,
}

impl InterfaceOps {
    pub fn of<I: ?Sized + RefTarget>() -> Self {
        Self {
            identity: |h| h.downcast_ref::<Ref<I>>().map(Ref::identity),
            visit: |h, visit| {
                let handle = h
                    .downcast_ref::<Ref<I>>()
                    .ok_or_else(CodecError::mismatch::<Ref<I>>)?;
                match handle.read() {
                    Some(guard) => visit(guard.target_any()),
                    None => Ok(()),
                }
            },
            set_null: |slot| match slot.downcast_mut::<Ref<I>>() {
                Some(slot) => {
                    *slot = Ref::null();
                    true
                }
                None => false,
            },
            assign: |slot, value| match (slot.downcast_mut::<Ref<I>>(), value.downcast::<Ref<I>>()) {
                (Some(slot), Ok(value)) => {
                    *slot = *value;
                    true
                }
                _ => false,
            },
        }
    }
}

/// Upcast from a boxed `Ref<C>` to a boxed `Ref<dyn I>`.
pub type UpcastFn = fn(&dyn Any) -> Option<Box<dyn Any + Send + Sync>>;

/// One concrete implementor of an interface.
#[derive(Clone, Copy)]
pub struct Implementor {
    pub shape: ShapeFn,
    pub upcast: UpcastFn,
}

impl Implementor {
    pub fn new(shape: ShapeFn, upcast: UpcastFn) -> Self {
        Self { shape, upcast }
    }
}

impl TypeShape {
    /// Shape of `Ref<T>` for a concrete, referenceable `T`.
    pub fn reference<T: Describe + RefTarget>() -> TypeShape {
        TypeShape::new::<Ref<T>>(TypeKind::Reference(ReferenceShape {
            target: T::shape,
            ops: RefOps::of::<T>(),
        }))
    }

    /// Shape of `Ref<dyn I>` with its implementors.
    pub fn interface<I: ?Sized + RefTarget>(
        name: &'static str,
        implementors: Vec<Implementor>,
    ) -> TypeShape {
        TypeShape::new::<Ref<I>>(TypeKind::Interface(InterfaceShape {
            name,
            ops: InterfaceOps::of::<I>(),
            implementors,
            open: false,
        }))
    }
}

impl RefTarget for dyn Object {
    fn target_any(&self) -> &dyn Any {
        Object::as_any(self)
    }

    fn ref_shape() -> TypeShape {
        let mut shape = TypeShape::interface::<dyn Object>("Object", Vec::new());
        if let TypeKind::Interface(interface) = &mut shape.kind {
            interface.open = true;
        }
        shape
    }
}

/// Declare `Ref<dyn Trait>` as a serializable interface.
///
/// ```ignore
/// pub trait Shape: objgraph::Object {
///     fn area(&self) -> f64;
/// }
/// objgraph::interface!(Shape: Circle, Square);
/// ```
///
/// Every listed implementor must implement the trait and `#[derive(Codec)]`;
/// it becomes part of the type graph whenever the interface does.
#[macro_export]
macro_rules! interface {
    ($iface:path $(: $($implementor:ty),+ $(,)?)?) => {
        impl $crate::RefTarget for dyn $iface {
            fn target_any(&self) -> &dyn ::core::any::Any {
                $crate::Object::as_any(self)
            }

            fn ref_shape() -> $crate::TypeShape {
                $crate::TypeShape::interface::<dyn $iface>(
                    ::core::stringify!($iface),
                    ::std::vec![$($(
                        $crate::Implementor::new(
                            <$implementor as $crate::Describe>::shape,
                            |handle| {
                                handle
                                    .downcast_ref::<$crate::Ref<$implementor>>()
                                    .map(|r| {
                                        ::std::boxed::Box::new(r.map_arc(|cell| {
                                            cell as ::std::sync::Arc<
                                                $crate::__private::RwLock<dyn $iface>,
                                            >
                                        }))
                                            as ::std::boxed::Box<
                                                dyn ::core::any::Any
                                                    + ::core::marker::Send
                                                    + ::core::marker::Sync,
                                            >
                                    })
                            },
                        )
                    ),+)?],
                )
            }
        }
    };
}
