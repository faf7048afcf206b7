// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Closed references (`Ref<C>` with a concrete `C`).
//!
//! A reference marker precedes the payload (see [`crate::session`]); the
//! payload itself is `C`'s procedure, run against the shared cell.

use super::{Binding, CapabilityPlugin};
use crate::error::{CodecError, CodecResult};
use crate::registry::BindContext;
use crate::session::RefMarker;
use crate::types::{ShapeFn, TypeKind, TypeShape};

#[derive(Debug, Default, Clone, Copy)]
pub struct ReferencePlugin;

impl CapabilityPlugin for ReferencePlugin {
    fn name(&self) -> &str {
        "reference"
    }

    fn handles(&self, shape: &TypeShape) -> bool {
        matches!(shape.kind, TypeKind::Reference(_))
    }

    fn required_subtypes(&self, shape: &TypeShape) -> Vec<ShapeFn> {
        match &shape.kind {
            TypeKind::Reference(reference) => vec![reference.target],
            _ => Vec::new(),
        }
    }

    fn null_marker(&self, _shape: &TypeShape) -> bool {
        true
    }

    fn bind(&self, shape: &TypeShape, cx: &BindContext<'_>) -> CodecResult<Binding> {
        let TypeKind::Reference(reference) = &shape.kind else {
            return Err(CodecError::MissingBinding(shape.name.to_string()));
        };
        let target_shape = (reference.target)();
        let target_tag = cx
            .tag_of(target_shape.type_id)
            .ok_or_else(|| CodecError::MissingBinding(target_shape.name.to_string()))?;
        let target = cx.callee(&target_shape)?;
        let read_target = target.clone();
        let ops = reference.ops;
        let write_name = shape.name.clone();
        let read_name = shape.name.clone();

        Ok(Binding::synthesized(
            move |cx, handle| {
                let identity =
                    (ops.identity)(handle).ok_or_else(|| CodecError::mismatch_named(&write_name))?;
                if !cx.begin_reference(identity, false)? {
                    return Ok(());
                }
                // The target procedure counts its own nesting level.
                (ops.visit)(handle, &mut |value| target.write(cx, value))
            },
            move |cx, slot| match cx.read_reference_marker(false)? {
                RefMarker::Null => {
                    if !(ops.set_null)(slot) {
                        return Err(CodecError::mismatch_named(&read_name));
                    }
                    Ok(false)
                }
                RefMarker::Back(index) => {
                    let (_, handle) = cx.instance(index)?;
                    if !(ops.assign)(slot, handle) {
                        return Err(cx.wire().invalid(format!(
                            "back-reference {} does not point to a `{}` target",
                            index, read_name
                        )));
                    }
                    Ok(true)
                }
                RefMarker::Payload(_) => {
                    let handle = (ops.allocate)();
                    if cx.preserve_references() {
                        let shared = (ops.clone_handle)(&*handle)
                            .ok_or_else(|| CodecError::mismatch_named(&read_name))?;
                        cx.push_instance(target_tag, shared);
                    }
                    (ops.fill)(&*handle, &mut |value| read_target.read(cx, value).map(|_| ()))?;
                    if !(ops.assign)(slot, &*handle) {
                        return Err(CodecError::mismatch_named(&read_name));
                    }
                    Ok(true)
                }
            },
        ))
    }
}
