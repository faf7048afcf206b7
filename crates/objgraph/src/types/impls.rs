// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! `Describe` implementations for primitives and standard containers.

use super::shape::{
    AggregateShape, ArrayShape, Describe, FieldShape, MapOps, MapShape, NullableShape,
    OptionOps, PrimitiveKind, SeqOps, ShapeFn, TypeKind, TypeShape,
};
use crate::wire::{Decimal, Uri};
use chrono::{DateTime, TimeDelta, Utc};
use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use uuid::Uuid;

macro_rules! impl_describe_primitive {
    ($($type:ty => $kind:ident),+ $(,)?) => {
        $(
            impl Describe for $type {
                fn shape() -> TypeShape {
                    TypeShape::new::<Self>(TypeKind::Primitive(PrimitiveKind::$kind))
                }
            }
        )+
    };
}

impl_describe_primitive!(
    bool => Bool,
    u8 => U8,
    i8 => I8,
    u16 => U16,
    i16 => I16,
    u32 => U32,
    i32 => I32,
    u64 => U64,
    i64 => I64,
    usize => Usize,
    isize => Isize,
    f32 => F32,
    f64 => F64,
    char => Char,
    String => String,
    Decimal => Decimal,
    DateTime<Utc> => DateTime,
    TimeDelta => TimeDelta,
    Uuid => Uuid,
    Uri => Uri,
);

/// The primitive set, in tag order (tags 1..=21).
pub fn builtin_shapes() -> [ShapeFn; 21] {
    [
        <bool as Describe>::shape,
        <u8 as Describe>::shape,
        <i8 as Describe>::shape,
        <u16 as Describe>::shape,
        <i16 as Describe>::shape,
        <u32 as Describe>::shape,
        <i32 as Describe>::shape,
        <u64 as Describe>::shape,
        <i64 as Describe>::shape,
        <usize as Describe>::shape,
        <isize as Describe>::shape,
        <f32 as Describe>::shape,
        <f64 as Describe>::shape,
        <char as Describe>::shape,
        <String as Describe>::shape,
        <Vec<u8> as Describe>::shape,
        <Decimal as Describe>::shape,
        <DateTime<Utc> as Describe>::shape,
        <TimeDelta as Describe>::shape,
        <Uuid as Describe>::shape,
        <Uri as Describe>::shape,
    ]
}

impl<T: Describe> Describe for Vec<T> {
    fn shape() -> TypeShape {
        TypeShape::new::<Self>(TypeKind::Array(ArrayShape {
            element: T::shape,
            fixed_len: None,
            ops: SeqOps::vec::<T>(),
        }))
    }
}

impl<T: Describe, const N: usize> Describe for [T; N]
where
    [T; N]: Default,
{
    fn shape() -> TypeShape {
        TypeShape::new::<Self>(TypeKind::Array(ArrayShape {
            element: T::shape,
            fixed_len: Some(N),
            ops: SeqOps::array::<T, N>(),
        }))
    }
}

impl<T: Describe> Describe for Option<T> {
    fn shape() -> TypeShape {
        TypeShape::new::<Self>(TypeKind::Nullable(NullableShape {
            inner: T::shape,
            ops: OptionOps::of::<T>(),
        }))
    }
}

impl<K, V> Describe for HashMap<K, V>
where
    K: Describe + Eq + Hash,
    V: Describe,
{
    fn shape() -> TypeShape {
        TypeShape::new::<Self>(TypeKind::Map(MapShape {
            key: K::shape,
            value: V::shape,
            pairs: <Vec<(K, V)> as Describe>::shape,
            ops: MapOps::hash_map::<K, V>(),
        }))
    }
}

impl<K, V> Describe for BTreeMap<K, V>
where
    K: Describe + Ord,
    V: Describe,
{
    fn shape() -> TypeShape {
        TypeShape::new::<Self>(TypeKind::Map(MapShape {
            key: K::shape,
            value: V::shape,
            pairs: <Vec<(K, V)> as Describe>::shape,
            ops: MapOps::btree_map::<K, V>(),
        }))
    }
}

/// Pairs are aggregates with members `0` and `1`; map entries use them.
impl<A: Describe, B: Describe> Describe for (A, B) {
    fn shape() -> TypeShape {
        TypeShape::new::<Self>(TypeKind::Aggregate(AggregateShape::new(vec![
            FieldShape::new(
                "0",
                A::shape,
                |v| v.downcast_ref::<(A, B)>().map(|p| &p.0 as &dyn Any),
                |v| v.downcast_mut::<(A, B)>().map(|p| &mut p.0 as &mut dyn Any),
            ),
            FieldShape::new(
                "1",
                B::shape,
                |v| v.downcast_ref::<(A, B)>().map(|p| &p.1 as &dyn Any),
                |v| v.downcast_mut::<(A, B)>().map(|p| &mut p.1 as &mut dyn Any),
            ),
        ])))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::any::TypeId;

    #[test]
    fn test_builtin_order_is_fixed() {
        let names: Vec<String> = builtin_shapes()
            .iter()
            .map(|shape| shape().name.into_owned())
            .collect();
        assert_eq!(names.len(), 21);
        assert_eq!(names[0], "bool");
        assert_eq!(names[6], "i32");
        assert_eq!(names[14], "alloc::string::String");
        assert_eq!(builtin_shapes()[15]().type_id, TypeId::of::<Vec<u8>>());
        assert_eq!(builtin_shapes()[20]().type_id, TypeId::of::<Uri>());
    }

    #[test]
    fn test_container_kinds() {
        assert_eq!(<Vec<String> as Describe>::shape().kind.name(), "array");
        assert_eq!(<[u8; 4] as Describe>::shape().kind.name(), "array");
        assert_eq!(<Option<i32> as Describe>::shape().kind.name(), "nullable");
        assert_eq!(<HashMap<String, i32> as Describe>::shape().kind.name(), "map");
        assert_eq!(<(u8, bool) as Describe>::shape().kind.name(), "aggregate");

        match <[u16; 3] as Describe>::shape().kind {
            TypeKind::Array(array) => assert_eq!(array.fixed_len, Some(3)),
            other => std::panic::panic_any(format!("unexpected kind {}", other.name())),
        }
    }

    #[test]
    fn test_pair_fields() {
        let mut pair = (7u8, String::from("x"));
        match <(u8, String) as Describe>::shape().kind {
            TypeKind::Aggregate(aggregate) => {
                let first = (aggregate.fields[0].get)(&pair).and_then(|v| v.downcast_ref::<u8>());
                assert_eq!(first, Some(&7));
                let second = (aggregate.fields[1].get_mut)(&mut pair).expect("second member");
                *second.downcast_mut::<String>().expect("string member") = "y".into();
            }
            other => std::panic::panic_any(format!("unexpected kind {}", other.name())),
        }
        assert_eq!(pair.1, "y");
    }
}
