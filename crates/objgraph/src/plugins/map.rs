// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Maps, encoded as an array of `(key, value)` pairs.
//!
//! Decoding goes through the `Vec<(K, V)>` procedure and then moves the
//! pairs into the map, so the two encodings stay byte-identical. Iteration
//! order is whatever the map yields; it is not part of the contract.

use super::{Binding, CapabilityPlugin};
use crate::error::{CodecError, CodecResult};
use crate::registry::BindContext;
use crate::types::{ShapeFn, TypeKind, TypeShape};

#[derive(Debug, Default, Clone, Copy)]
pub struct MapPlugin;

impl CapabilityPlugin for MapPlugin {
    fn name(&self) -> &str {
        "map"
    }

    fn handles(&self, shape: &TypeShape) -> bool {
        matches!(shape.kind, TypeKind::Map(_))
    }

    fn required_subtypes(&self, shape: &TypeShape) -> Vec<ShapeFn> {
        match &shape.kind {
            TypeKind::Map(map) => vec![map.key, map.value, map.pairs],
            _ => Vec::new(),
        }
    }

    fn null_marker(&self, _shape: &TypeShape) -> bool {
        true
    }

    fn bind(&self, shape: &TypeShape, cx: &BindContext<'_>) -> CodecResult<Binding> {
        let TypeKind::Map(map) = &shape.kind else {
            return Err(CodecError::MissingBinding(shape.name.to_string()));
        };
        let key = cx.callee_of(map.key)?;
        let value = cx.callee_of(map.value)?;
        let pairs_shape = (map.pairs)();
        let pairs = cx.callee(&pairs_shape)?;
        let create_pairs = pairs_shape.create;
        let ops = map.ops;
        let write_name = shape.name.clone();
        let read_name = shape.name.clone();

        Ok(Binding::synthesized(
            move |cx, map| {
                let len = (ops.len)(map).ok_or_else(|| CodecError::mismatch_named(&write_name))?;
                cx.wire().write_length(Some(len))?;
                (ops.for_each)(map, &mut |k, v| {
                    key.write(cx, k)?;
                    value.write(cx, v)
                })
            },
            move |cx, slot| {
                let mut buffer = create_pairs();
                if !pairs.read(cx, &mut *buffer)? {
                    return Ok(false);
                }
                if !(ops.fill_from_pairs)(slot, &mut *buffer) {
                    return Err(CodecError::mismatch_named(&read_name));
                }
                Ok(true)
            },
        ))
    }
}
