// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type metadata consumed by the collector and the plugins.

mod impls;
mod reference;
mod shape;

pub use impls::builtin_shapes;
pub use reference::{
    Implementor, InterfaceOps, Object, Ref, RefOps, RefTarget, SlotVisitor, UpcastFn,
    ValueVisitor,
};
pub use shape::{
    AggregateShape, ArrayShape, CreateFn, Describe, EnumOps, EnumShape, FieldShape, HookFn,
    InterfaceShape, MapOps, MapShape, NullableShape, OptionOps, PairVisitor, PrimitiveKind,
    ReferenceShape, SeqOps, ShapeFn, TypeKind, TypeShape,
};
