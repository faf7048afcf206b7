// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Static type metadata.
//!
//! A [`TypeShape`] is what the engine knows about a type: its identity,
//! its canonical name, and a [`TypeKind`] carrying plain `fn` accessors that
//! reach into values through `&dyn Any`. Shapes are cheap to rebuild and are
//! only consulted while the registry is being constructed.

use super::reference::{InterfaceOps, Implementor, RefOps};
use crate::error::{CodecError, CodecResult};
use std::any::{type_name, Any, TypeId};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::Hash;

/// Lazily evaluated link to another type's shape.
pub type ShapeFn = fn() -> TypeShape;

/// Boxed `Default` constructor.
pub type CreateFn = fn() -> Box<dyn Any + Send + Sync>;

/// Post-decode hook on an aggregate.
pub type HookFn = fn(&mut dyn Any);

/// A type the codec can describe.
///
/// Implemented by the crate for primitives, `Option`, `Vec`, arrays, maps,
/// pairs and [`Ref`](super::Ref), and by `#[derive(Codec)]` for user types.
/// `Default` is required because decoding fills default-constructed slots.
pub trait Describe: Any + Send + Sync + Default {
    fn shape() -> TypeShape;
}

/// Scalar kinds handled by the primitive codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Bool,
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    Usize,
    Isize,
    F32,
    F64,
    Char,
    String,
    Decimal,
    DateTime,
    TimeDelta,
    Uuid,
    Uri,
}

impl PrimitiveKind {
    /// Whether the encoding has its own zero null marker.
    pub fn is_nullable(self) -> bool {
        matches!(self, PrimitiveKind::String | PrimitiveKind::Uri)
    }

    /// Integer kinds usable as an enum representation.
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            PrimitiveKind::U8
                | PrimitiveKind::I8
                | PrimitiveKind::U16
                | PrimitiveKind::I16
                | PrimitiveKind::U32
                | PrimitiveKind::I32
                | PrimitiveKind::U64
                | PrimitiveKind::I64
                | PrimitiveKind::Usize
                | PrimitiveKind::Isize
        )
    }

    /// Shape of the Rust type backing this kind.
    pub fn shape_fn(self) -> ShapeFn {
        use chrono::{DateTime, TimeDelta, Utc};
        match self {
            PrimitiveKind::Bool => <bool as Describe>::shape,
            PrimitiveKind::U8 => <u8 as Describe>::shape,
            PrimitiveKind::I8 => <i8 as Describe>::shape,
            PrimitiveKind::U16 => <u16 as Describe>::shape,
            PrimitiveKind::I16 => <i16 as Describe>::shape,
            PrimitiveKind::U32 => <u32 as Describe>::shape,
            PrimitiveKind::I32 => <i32 as Describe>::shape,
            PrimitiveKind::U64 => <u64 as Describe>::shape,
            PrimitiveKind::I64 => <i64 as Describe>::shape,
            PrimitiveKind::Usize => <usize as Describe>::shape,
            PrimitiveKind::Isize => <isize as Describe>::shape,
            PrimitiveKind::F32 => <f32 as Describe>::shape,
            PrimitiveKind::F64 => <f64 as Describe>::shape,
            PrimitiveKind::Char => <char as Describe>::shape,
            PrimitiveKind::String => <String as Describe>::shape,
            PrimitiveKind::Decimal => <crate::wire::Decimal as Describe>::shape,
            PrimitiveKind::DateTime => <DateTime<Utc> as Describe>::shape,
            PrimitiveKind::TimeDelta => <TimeDelta as Describe>::shape,
            PrimitiveKind::Uuid => <uuid::Uuid as Describe>::shape,
            PrimitiveKind::Uri => <crate::wire::Uri as Describe>::shape,
        }
    }
}

/// Element access for `Vec<T>` and `[T; N]`.
#[derive(Clone, Copy)]
pub struct SeqOps {
    pub len: fn(&dyn Any) -> Option<usize>,
    pub item: fn(&dyn Any, usize) -> Option<&dyn Any>,
    /// Make room for `len` elements; `false` if the length is not allowed.
    pub prepare: fn(&mut dyn Any, usize) -> bool,
    /// Slot `index`; growable sequences append a default element at `len`.
    pub item_mut: fn(&mut dyn Any, usize) -> Option<&mut dyn Any>,
}

impl SeqOps {
    pub fn vec<T: Describe>() -> Self {
        Self {
            len: |v| v.downcast_ref::<Vec<T>>().map(Vec::len),
            item: |v, i| {
                v.downcast_ref::<Vec<T>>()?
                    .get(i)
                    .map(|x| x as &dyn Any)
            },
            prepare: |v, len| match v.downcast_mut::<Vec<T>>() {
                Some(v) => {
                    v.clear();
                    v.reserve(len.min(crate::config::PREALLOC_LIMIT));
                    true
                }
                None => false,
            },
            item_mut: |v, i| {
                let v = v.downcast_mut::<Vec<T>>()?;
                if i == v.len() {
                    v.push(T::default());
                }
                v.get_mut(i).map(|x| x as &mut dyn Any)
            },
        }
    }

    pub fn array<T: Describe, const N: usize>() -> Self {
        Self {
            len: |v| v.downcast_ref::<[T; N]>().map(|_| N),
            item: |v, i| v.downcast_ref::<[T; N]>()?.get(i).map(|x| x as &dyn Any),
            prepare: |v, len| v.is::<[T; N]>() && len == N,
            item_mut: |v, i| {
                v.downcast_mut::<[T; N]>()?
                    .get_mut(i)
                    .map(|x| x as &mut dyn Any)
            },
        }
    }
}

#[derive(Clone, Copy)]
pub struct ArrayShape {
    pub element: ShapeFn,
    pub fixed_len: Option<usize>,
    pub ops: SeqOps,
}

/// Access to the payload of an `Option<T>`.
#[derive(Clone, Copy)]
pub struct OptionOps {
    /// Outer `None` on type mismatch, inner `None` when absent.
    pub get: fn(&dyn Any) -> Option<Option<&dyn Any>>,
    pub set_none: fn(&mut dyn Any) -> bool,
    pub insert_default: fn(&mut dyn Any) -> Option<&mut dyn Any>,
}

impl OptionOps {
    pub fn of<T: Describe>() -> Self {
        Self {
            get: |v| {
                v.downcast_ref::<Option<T>>()
                    .map(|o| o.as_ref().map(|x| x as &dyn Any))
            },
            set_none: |v| match v.downcast_mut::<Option<T>>() {
                Some(slot) => {
                    *slot = None;
                    true
                }
                None => false,
            },
            insert_default: |v| {
                v.downcast_mut::<Option<T>>()
                    .map(|slot| slot.insert(T::default()) as &mut dyn Any)
            },
        }
    }
}

#[derive(Clone, Copy)]
pub struct NullableShape {
    pub inner: ShapeFn,
    pub ops: OptionOps,
}

/// Discriminant conversions for unit enums.
#[derive(Clone, Copy)]
pub struct EnumOps {
    pub to_repr: fn(&dyn Any) -> Option<i64>,
    /// `false` on unknown discriminant or type mismatch.
    pub from_repr: fn(&mut dyn Any, i64) -> bool,
}

#[derive(Clone)]
pub struct EnumShape {
    pub repr: PrimitiveKind,
    pub variants: Vec<(&'static str, i64)>,
    pub ops: EnumOps,
}

impl EnumShape {
    pub fn new(repr: PrimitiveKind, variants: Vec<(&'static str, i64)>, ops: EnumOps) -> Self {
        Self {
            repr,
            variants,
            ops,
        }
    }
}

/// Callback receiving one key/value pair.
pub type PairVisitor<'v> = dyn FnMut(&dyn Any, &dyn Any) -> CodecResult<()> + 'v;

/// Map iteration and bulk construction.
#[derive(Clone, Copy)]
pub struct MapOps {
    pub len: fn(&dyn Any) -> Option<usize>,
    pub for_each: fn(&dyn Any, &mut PairVisitor<'_>) -> CodecResult<()>,
    /// Replace the map's content with the pairs drained from a `Vec<(K, V)>`.
    pub fill_from_pairs: fn(&mut dyn Any, &mut dyn Any) -> bool,
}

impl MapOps {
    pub fn hash_map<K, V>() -> Self
    where
        K: Describe + Eq + Hash,
        V: Describe,
    {
        Self {
            len: |m| m.downcast_ref::<HashMap<K, V>>().map(HashMap::len),
            for_each: |m, visit| {
                let map = m
                    .downcast_ref::<HashMap<K, V>>()
                    .ok_or_else(CodecError::mismatch::<HashMap<K, V>>)?;
                for (key, value) in map {
                    visit(key as &dyn Any, value as &dyn Any)?;
                }
                Ok(())
            },
            fill_from_pairs: |m, pairs| {
                match (
                    m.downcast_mut::<HashMap<K, V>>(),
                    pairs.downcast_mut::<Vec<(K, V)>>(),
                ) {
                    (Some(map), Some(pairs)) => {
                        map.clear();
                        map.extend(pairs.drain(..));
                        true
                    }
                    _ => false,
                }
            },
        }
    }

    pub fn btree_map<K, V>() -> Self
    where
        K: Describe + Ord,
        V: Describe,
    {
        Self {
            len: |m| m.downcast_ref::<BTreeMap<K, V>>().map(BTreeMap::len),
            for_each: |m, visit| {
                let map = m
                    .downcast_ref::<BTreeMap<K, V>>()
                    .ok_or_else(CodecError::mismatch::<BTreeMap<K, V>>)?;
                for (key, value) in map {
                    visit(key as &dyn Any, value as &dyn Any)?;
                }
                Ok(())
            },
            fill_from_pairs: |m, pairs| {
                match (
                    m.downcast_mut::<BTreeMap<K, V>>(),
                    pairs.downcast_mut::<Vec<(K, V)>>(),
                ) {
                    (Some(map), Some(pairs)) => {
                        map.clear();
                        map.extend(pairs.drain(..));
                        true
                    }
                    _ => false,
                }
            },
        }
    }
}

#[derive(Clone, Copy)]
pub struct MapShape {
    pub key: ShapeFn,
    pub value: ShapeFn,
    /// `Vec<(K, V)>`, whose procedure decodes the map payload.
    pub pairs: ShapeFn,
    pub ops: MapOps,
}

/// One serialized member of an aggregate.
#[derive(Clone, Copy)]
pub struct FieldShape {
    pub name: &'static str,
    pub shape: ShapeFn,
    /// Inherited (flattened base) member: ordered before own members.
    pub base: bool,
    pub get: fn(&dyn Any) -> Option<&dyn Any>,
    pub get_mut: fn(&mut dyn Any) -> Option<&mut dyn Any>,
}

impl FieldShape {
    pub fn new(
        name: &'static str,
        shape: ShapeFn,
        get: fn(&dyn Any) -> Option<&dyn Any>,
        get_mut: fn(&mut dyn Any) -> Option<&mut dyn Any>,
    ) -> Self {
        Self {
            name,
            shape,
            base: false,
            get,
            get_mut,
        }
    }

    #[must_use]
    pub fn base(mut self) -> Self {
        self.base = true;
        self
    }
}

impl fmt::Debug for FieldShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldShape")
            .field("name", &self.name)
            .field("base", &self.base)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Default)]
pub struct AggregateShape {
    pub fields: Vec<FieldShape>,
    pub on_deserialized: Option<HookFn>,
}

impl AggregateShape {
    pub fn new(fields: Vec<FieldShape>) -> Self {
        Self {
            fields,
            on_deserialized: None,
        }
    }

    #[must_use]
    pub fn on_deserialized(mut self, hook: HookFn) -> Self {
        self.on_deserialized = Some(hook);
        self
    }

    /// Wire order: base members in declaration order, then own members
    /// sorted by name (byte order).
    pub fn ordered_fields(&self) -> Vec<FieldShape> {
        let mut base: Vec<FieldShape> = self.fields.iter().filter(|f| f.base).copied().collect();
        let mut own: Vec<FieldShape> = self.fields.iter().filter(|f| !f.base).copied().collect();
        own.sort_by(|a, b| a.name.as_bytes().cmp(b.name.as_bytes()));
        base.append(&mut own);
        base
    }
}

#[derive(Clone, Copy)]
pub struct ReferenceShape {
    pub target: ShapeFn,
    pub ops: RefOps,
}

#[derive(Clone)]
pub struct InterfaceShape {
    pub name: &'static str,
    pub ops: InterfaceOps,
    pub implementors: Vec<Implementor>,
    /// Accepts every registered referenceable type (`Ref<dyn Object>`).
    pub open: bool,
}

#[derive(Clone)]
pub enum TypeKind {
    Primitive(PrimitiveKind),
    Array(ArrayShape),
    Nullable(NullableShape),
    Enum(EnumShape),
    Map(MapShape),
    Aggregate(AggregateShape),
    Reference(ReferenceShape),
    Interface(InterfaceShape),
    /// Known to the engine but without a serializable structure.
    Opaque,
}

impl TypeKind {
    pub fn name(&self) -> &'static str {
        match self {
            TypeKind::Primitive(_) => "primitive",
            TypeKind::Array(_) => "array",
            TypeKind::Nullable(_) => "nullable",
            TypeKind::Enum(_) => "enum",
            TypeKind::Map(_) => "map",
            TypeKind::Aggregate(_) => "aggregate",
            TypeKind::Reference(_) => "reference",
            TypeKind::Interface(_) => "interface",
            TypeKind::Opaque => "opaque",
        }
    }
}

#[derive(Clone)]
pub struct TypeShape {
    pub type_id: TypeId,
    pub name: Cow<'static, str>,
    pub kind: TypeKind,
    pub create: CreateFn,
    /// Present when the type can sit behind a shared `Ref`.
    pub reference: Option<RefOps>,
}

fn create_default<T: Describe>() -> Box<dyn Any + Send + Sync> {
    Box::new(T::default())
}

impl TypeShape {
    pub fn new<T: Describe>(kind: TypeKind) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            name: Cow::Borrowed(type_name::<T>()),
            kind,
            create: create_default::<T>,
            reference: None,
        }
    }

    /// Override the canonical name.
    #[must_use]
    pub fn named(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_reference(mut self, ops: RefOps) -> Self {
        self.reference = Some(ops);
        self
    }

    pub fn is_interface(&self) -> bool {
        matches!(self.kind, TypeKind::Interface(_))
    }
}

impl fmt::Debug for TypeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeShape")
            .field("name", &self.name)
            .field("kind", &self.kind.name())
            .field("referenceable", &self.reference.is_some())
            .finish()
    }
}
