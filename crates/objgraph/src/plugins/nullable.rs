// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! `Option<T>`.
//!
//! - `T` with its own null marker: `None` is the marker, `Some` is `T` as is
//! - `bool`: a single byte, 0 = absent, 1 = false, 2 = true
//! - otherwise: presence byte (0/1), then `T` when present

use super::{Binding, CapabilityPlugin};
use crate::error::{CodecError, CodecResult};
use crate::registry::BindContext;
use crate::types::{PrimitiveKind, ShapeFn, TypeKind, TypeShape};
use std::borrow::Cow;

#[derive(Debug, Default, Clone, Copy)]
pub struct NullablePlugin;

fn mismatch(name: &Cow<'static, str>) -> CodecError {
    CodecError::mismatch_named(name)
}

impl CapabilityPlugin for NullablePlugin {
    fn name(&self) -> &str {
        "nullable"
    }

    fn handles(&self, shape: &TypeShape) -> bool {
        matches!(shape.kind, TypeKind::Nullable(_))
    }

    fn required_subtypes(&self, shape: &TypeShape) -> Vec<ShapeFn> {
        match &shape.kind {
            TypeKind::Nullable(nullable) => vec![nullable.inner],
            _ => Vec::new(),
        }
    }

    fn bind(&self, shape: &TypeShape, cx: &BindContext<'_>) -> CodecResult<Binding> {
        let TypeKind::Nullable(nullable) = &shape.kind else {
            return Err(CodecError::MissingBinding(shape.name.to_string()));
        };
        let ops = nullable.ops;
        let inner_shape = (nullable.inner)();
        let write_name = shape.name.clone();
        let read_name = shape.name.clone();

        if matches!(inner_shape.kind, TypeKind::Primitive(PrimitiveKind::Bool)) {
            return Ok(Binding::synthesized(
                move |cx, value| {
                    let state = (ops.get)(value).ok_or_else(|| mismatch(&write_name))?;
                    let flag = match state {
                        Some(inner) => Some(
                            *inner
                                .downcast_ref::<bool>()
                                .ok_or_else(CodecError::mismatch::<bool>)?,
                        ),
                        None => None,
                    };
                    cx.wire().write_opt_bool(flag)
                },
                move |cx, slot| match cx.wire().read_opt_bool()? {
                    None => {
                        if !(ops.set_none)(slot) {
                            return Err(mismatch(&read_name));
                        }
                        Ok(false)
                    }
                    Some(flag) => {
                        let inner = (ops.insert_default)(slot).ok_or_else(|| mismatch(&read_name))?;
                        *inner
                            .downcast_mut::<bool>()
                            .ok_or_else(CodecError::mismatch::<bool>)? = flag;
                        Ok(true)
                    }
                },
            ));
        }

        let inner = cx.callee(&inner_shape)?;
        let read_inner = inner.clone();
        let marker = inner.nullable();

        Ok(Binding::synthesized(
            move |cx, value| {
                match (ops.get)(value).ok_or_else(|| mismatch(&write_name))? {
                    None if marker => cx.wire().write_length(None),
                    None => cx.wire().write_u8(0),
                    Some(present) => {
                        if !marker {
                            cx.wire().write_u8(1)?;
                        }
                        inner.write(cx, present)
                    }
                }
            },
            move |cx, slot| {
                if !marker {
                    let start = cx.wire().offset();
                    match cx.wire().read_u8()? {
                        0 => {
                            if !(ops.set_none)(slot) {
                                return Err(mismatch(&read_name));
                            }
                            return Ok(false);
                        }
                        1 => {}
                        other => {
                            return Err(CodecError::InvalidData {
                                offset: start,
                                reason: format!("presence byte {:#04x}", other),
                            })
                        }
                    }
                }
                let target = (ops.insert_default)(slot).ok_or_else(|| mismatch(&read_name))?;
                let present = read_inner.read(cx, target)?;
                if !present && !(ops.set_none)(slot) {
                    return Err(mismatch(&read_name));
                }
                Ok(present)
            },
        ))
    }
}
