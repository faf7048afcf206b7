// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Procedure references resolved while binding.
//!
//! A synthesized procedure never holds another type's closure directly: it
//! holds a [`Callee`] naming a descriptor slot, and looks the slot up in the
//! immutable registry at call time. This is what lets recursive types bind
//! in any order.

use super::{CallConvention, TypeTag};
use crate::error::{CodecError, CodecResult};
use crate::graph::TypeGraph;
use crate::session::{ReadContext, WriteContext};
use crate::types::{InterfaceOps, ShapeFn, TypeKind, TypeShape, UpcastFn};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

/// Tag of the descriptor at `index` in graph order.
pub(crate) fn tag_for_index(index: usize) -> TypeTag {
    // The collector caps the graph at `MAX_TYPE_TAG` nodes.
    (index + 1) as TypeTag
}

/// How a procedure reaches a dependency.
#[derive(Clone)]
pub enum Callee {
    /// Statically bound: payload only.
    Direct { index: usize, nullable: bool },
    /// Dispatched through the type tag (plugin-declared indirect binding).
    Tagged { index: usize },
    /// `Ref<dyn Trait>`: reference marker, runtime tag, concrete payload.
    Interface(Arc<InterfaceBinding>),
}

impl Callee {
    /// Whether `None` of this type can be written as the zero marker.
    pub fn nullable(&self) -> bool {
        match self {
            Callee::Direct { nullable, .. } => *nullable,
            Callee::Tagged { .. } | Callee::Interface(_) => true,
        }
    }

    pub fn write(&self, cx: &mut WriteContext<'_>, value: &dyn Any) -> CodecResult<()> {
        match self {
            Callee::Direct { index, .. } => {
                let descriptor = cx.registry().entry(*index)?;
                (descriptor.write)(cx, value)
            }
            Callee::Tagged { index } => {
                let descriptor = cx.registry().entry(*index)?;
                cx.wire().write_tag(Some(descriptor.tag))?;
                (descriptor.write)(cx, value)
            }
            Callee::Interface(binding) => binding.write(cx, value),
        }
    }

    /// Decode into `slot`; `false` when a null marker left it untouched.
    pub fn read(&self, cx: &mut ReadContext<'_>, slot: &mut dyn Any) -> CodecResult<bool> {
        match self {
            Callee::Direct { index, .. } => {
                let descriptor = cx.registry().entry(*index)?;
                (descriptor.read)(cx, slot)
            }
            Callee::Tagged { index } => {
                let descriptor = cx.registry().entry(*index)?;
                let offset = cx.wire().offset();
                let Some(tag) = cx.wire().read_tag()? else {
                    return Ok(false);
                };
                if tag != descriptor.tag {
                    return Err(match cx.registry().descriptor(tag) {
                        Some(found) => CodecError::InvalidData {
                            offset,
                            reason: format!(
                                "tag {} (`{}`) where `{}` was expected",
                                tag, found.name, descriptor.name
                            ),
                        },
                        None => CodecError::UnknownTag {
                            tag: u64::from(tag),
                            offset,
                        },
                    });
                }
                (descriptor.read)(cx, slot)
            }
            Callee::Interface(binding) => binding.read(cx, slot),
        }
    }
}

/// Dispatch table for one `Ref<dyn Trait>` type.
pub struct InterfaceBinding {
    pub(crate) name: &'static str,
    pub(crate) ops: InterfaceOps,
    /// Implementor `TypeId` to `Ref<C>` -> `Ref<dyn Trait>` cast.
    pub(crate) upcasts: HashMap<TypeId, UpcastFn>,
    /// Accepts any referenceable registered type (`Ref<dyn Object>`).
    pub(crate) open: bool,
}

impl InterfaceBinding {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn implementor_count(&self) -> usize {
        self.upcasts.len()
    }
}

/// Read-only view of the graph handed to plugins while binding.
pub struct BindContext<'r> {
    graph: &'r TypeGraph,
    conventions: &'r [CallConvention],
    nullable: &'r [bool],
}

impl<'r> BindContext<'r> {
    pub(crate) fn new(
        graph: &'r TypeGraph,
        conventions: &'r [CallConvention],
        nullable: &'r [bool],
    ) -> Self {
        Self {
            graph,
            conventions,
            nullable,
        }
    }

    /// Tag that will be assigned to `type_id`, if it is in the graph.
    pub fn tag_of(&self, type_id: TypeId) -> Option<TypeTag> {
        self.graph.index_of(type_id).map(tag_for_index)
    }

    pub fn callee_of(&self, shape: ShapeFn) -> CodecResult<Callee> {
        self.callee(&shape())
    }

    /// Resolve how a procedure calls the procedure of `shape`.
    pub fn callee(&self, shape: &TypeShape) -> CodecResult<Callee> {
        if let TypeKind::Interface(interface) = &shape.kind {
            let mut upcasts = HashMap::with_capacity(interface.implementors.len());
            for implementor in &interface.implementors {
                let implementor_shape = (implementor.shape)();
                if self.graph.index_of(implementor_shape.type_id).is_none() {
                    return Err(CodecError::MissingBinding(implementor_shape.name.to_string()));
                }
                upcasts.insert(implementor_shape.type_id, implementor.upcast);
            }
            return Ok(Callee::Interface(Arc::new(InterfaceBinding {
                name: interface.name,
                ops: interface.ops,
                upcasts,
                open: interface.open,
            })));
        }

        let index = self
            .graph
            .index_of(shape.type_id)
            .ok_or_else(|| CodecError::MissingBinding(shape.name.to_string()))?;
        Ok(match self.conventions[index] {
            CallConvention::Direct => Callee::Direct {
                index,
                nullable: self.nullable[index],
            },
            CallConvention::Indirect => Callee::Tagged { index },
        })
    }
}
