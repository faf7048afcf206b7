// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Structs: member encodings concatenated in canonical order, no field tags.

use super::{Binding, CapabilityPlugin};
use crate::error::{CodecError, CodecResult};
use crate::registry::{BindContext, Callee};
use crate::types::{FieldShape, ShapeFn, TypeKind, TypeShape};
use std::sync::Arc;

#[derive(Debug, Default, Clone, Copy)]
pub struct AggregatePlugin;

struct BoundField {
    field: FieldShape,
    callee: Callee,
}

impl CapabilityPlugin for AggregatePlugin {
    fn name(&self) -> &str {
        "aggregate"
    }

    fn handles(&self, shape: &TypeShape) -> bool {
        matches!(shape.kind, TypeKind::Aggregate(_))
    }

    fn required_subtypes(&self, shape: &TypeShape) -> Vec<ShapeFn> {
        match &shape.kind {
            TypeKind::Aggregate(aggregate) => aggregate.fields.iter().map(|f| f.shape).collect(),
            _ => Vec::new(),
        }
    }

    fn bind(&self, shape: &TypeShape, cx: &BindContext<'_>) -> CodecResult<Binding> {
        let TypeKind::Aggregate(aggregate) = &shape.kind else {
            return Err(CodecError::MissingBinding(shape.name.to_string()));
        };
        let fields = aggregate
            .ordered_fields()
            .into_iter()
            .map(|field| {
                Ok(BoundField {
                    callee: cx.callee_of(field.shape)?,
                    field,
                })
            })
            .collect::<CodecResult<Vec<_>>>()?;
        let fields: Arc<[BoundField]> = fields.into();
        let read_fields = Arc::clone(&fields);
        let hook = aggregate.on_deserialized;
        let write_name = shape.name.clone();
        let read_name = shape.name.clone();

        log::trace!(
            "[aggregate] {} -> [{}]",
            shape.name,
            fields.iter().map(|f| f.field.name).collect::<Vec<_>>().join(", ")
        );

        Ok(Binding::synthesized(
            move |cx, value| {
                cx.nested(|cx| {
                    for bound in fields.iter() {
                        let member = (bound.field.get)(value)
                            .ok_or_else(|| CodecError::mismatch_named(&write_name))?;
                        bound.callee.write(cx, member)?;
                    }
                    Ok(())
                })
            },
            move |cx, slot| {
                cx.nested(|cx| {
                    for bound in read_fields.iter() {
                        let member = (bound.field.get_mut)(slot)
                            .ok_or_else(|| CodecError::mismatch_named(&read_name))?;
                        bound.callee.read(cx, member)?;
                    }
                    Ok(())
                })?;
                if let Some(hook) = hook {
                    if cx.run_hooks() {
                        hook(slot);
                    }
                }
                Ok(true)
            },
        ))
    }
}
