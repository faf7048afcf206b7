// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Sequences: varint `len+1` (0 = null) followed by the elements.

use super::primitive::{read_byte_vec, write_byte_vec};
use super::{Binding, CapabilityPlugin};
use crate::config::PREALLOC_LIMIT;
use crate::error::{CodecError, CodecResult};
use crate::registry::BindContext;
use crate::types::{ShapeFn, TypeKind, TypeShape};
use std::any::TypeId;

#[derive(Debug, Default, Clone, Copy)]
pub struct ArrayPlugin;

impl CapabilityPlugin for ArrayPlugin {
    fn name(&self) -> &str {
        "array"
    }

    fn handles(&self, shape: &TypeShape) -> bool {
        matches!(shape.kind, TypeKind::Array(_))
    }

    fn required_subtypes(&self, shape: &TypeShape) -> Vec<ShapeFn> {
        match &shape.kind {
            TypeKind::Array(array) => vec![array.element],
            _ => Vec::new(),
        }
    }

    fn null_marker(&self, _shape: &TypeShape) -> bool {
        true
    }

    fn bind(&self, shape: &TypeShape, cx: &BindContext<'_>) -> CodecResult<Binding> {
        let TypeKind::Array(array) = &shape.kind else {
            return Err(CodecError::MissingBinding(shape.name.to_string()));
        };
        if shape.type_id == TypeId::of::<Vec<u8>>() {
            return Ok(Binding::Static {
                write: write_byte_vec,
                read: read_byte_vec,
            });
        }

        let element = cx.callee_of(array.element)?;
        let read_element = element.clone();
        let ops = array.ops;
        let fixed_len = array.fixed_len;
        let write_name = shape.name.clone();
        let read_name = shape.name.clone();

        Ok(Binding::synthesized(
            move |cx, value| {
                let len = (ops.len)(value).ok_or_else(|| CodecError::mismatch_named(&write_name))?;
                cx.wire().write_length(Some(len))?;
                for index in 0..len {
                    let item = (ops.item)(value, index)
                        .ok_or_else(|| CodecError::mismatch_named(&write_name))?;
                    element.write(cx, item)?;
                }
                Ok(())
            },
            move |cx, slot| {
                let start = cx.wire().offset();
                let Some(len) = cx.wire().read_length()? else {
                    return Ok(false);
                };
                if !(ops.prepare)(slot, len) {
                    return Err(match fixed_len {
                        Some(expected) => CodecError::InvalidData {
                            offset: start,
                            reason: format!(
                                "declared length {} for `{}`, expected {}",
                                len, read_name, expected
                            ),
                        },
                        None => CodecError::mismatch_named(&read_name),
                    });
                }
                let body = cx.wire().offset();
                for index in 0..len {
                    // Zero-width elements never reach end of stream, so a
                    // forged length would otherwise loop unbounded.
                    if index == PREALLOC_LIMIT && cx.wire().offset() == body {
                        return Err(CodecError::InvalidData {
                            offset: start,
                            reason: format!(
                                "declared length {} for `{}` exceeds {} zero-width elements",
                                len, read_name, PREALLOC_LIMIT
                            ),
                        });
                    }
                    let item = (ops.item_mut)(slot, index)
                        .ok_or_else(|| CodecError::mismatch_named(&read_name))?;
                    read_element.read(cx, item)?;
                }
                Ok(true)
            },
        ))
    }
}
