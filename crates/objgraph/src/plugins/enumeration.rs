// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Unit enums, encoded as their integer representation.

use super::{read_integer, write_integer, Binding, CapabilityPlugin};
use crate::error::{CodecError, CodecResult};
use crate::registry::BindContext;
use crate::types::{ShapeFn, TypeKind, TypeShape};

#[derive(Debug, Default, Clone, Copy)]
pub struct EnumPlugin;

impl CapabilityPlugin for EnumPlugin {
    fn name(&self) -> &str {
        "enum"
    }

    fn handles(&self, shape: &TypeShape) -> bool {
        matches!(shape.kind, TypeKind::Enum(_))
    }

    fn required_subtypes(&self, shape: &TypeShape) -> Vec<ShapeFn> {
        match &shape.kind {
            TypeKind::Enum(enumeration) => vec![enumeration.repr.shape_fn()],
            _ => Vec::new(),
        }
    }

    fn bind(&self, shape: &TypeShape, _cx: &BindContext<'_>) -> CodecResult<Binding> {
        let TypeKind::Enum(enumeration) = &shape.kind else {
            return Err(CodecError::MissingBinding(shape.name.to_string()));
        };
        let repr = enumeration.repr;
        if !repr.is_integer() {
            return Err(CodecError::Ineligible {
                type_name: shape.name.to_string(),
                reason: format!("enum representation {:?} is not an integer", repr),
            });
        }
        let ops = enumeration.ops;
        let write_name = shape.name.clone();
        let read_name = shape.name.clone();

        Ok(Binding::synthesized(
            move |cx, value| {
                let discriminant =
                    (ops.to_repr)(value).ok_or_else(|| CodecError::mismatch_named(&write_name))?;
                write_integer(cx.wire(), repr, discriminant)
            },
            move |cx, slot| {
                let start = cx.wire().offset();
                let discriminant = read_integer(cx.wire(), repr)?;
                if !(ops.from_repr)(slot, discriminant) {
                    return Err(CodecError::InvalidData {
                        offset: start,
                        reason: format!("{} is not a discriminant of `{}`", discriminant, read_name),
                    });
                }
                Ok(true)
            },
        ))
    }
}
