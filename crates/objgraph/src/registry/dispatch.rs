// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Polymorphic dispatcher: serialize by runtime type, deserialize by tag.
//!
//! Used for top-level values and for every `Ref<dyn Trait>` member. The
//! concrete type is only known from the value (serialize) or from the wire
//! (deserialize); the declared interface decides which concrete types are
//! acceptable.

use super::callee::InterfaceBinding;
use super::descriptor::TypeDescriptor;
use crate::error::{CodecError, CodecResult};
use crate::session::{ReadContext, RefMarker, WriteContext};
use std::any::Any;

impl InterfaceBinding {
    /// Whether a value of `descriptor`'s type may populate this interface.
    pub fn accepts(&self, descriptor: &TypeDescriptor) -> bool {
        if self.open {
            descriptor.reference.is_some()
        } else {
            self.upcasts.contains_key(&descriptor.type_id)
        }
    }

    /// Re-type a boxed `Ref<C>` into a boxed `Ref<dyn Trait>`.
    pub fn upcast(
        &self,
        descriptor: &TypeDescriptor,
        handle: &dyn Any,
    ) -> Option<Box<dyn Any + Send + Sync>> {
        if self.open {
            (descriptor.reference?.erase)(handle)
        } else {
            (self.upcasts.get(&descriptor.type_id)?)(handle)
        }
    }

    pub(crate) fn write(&self, cx: &mut WriteContext<'_>, handle: &dyn Any) -> CodecResult<()> {
        let identity = (self.ops.identity)(handle)
            .ok_or_else(|| CodecError::mismatch_named(self.name))?;
        if !cx.begin_reference(identity, true)? {
            return Ok(());
        }
        let registry = cx.registry();
        (self.ops.visit)(handle, &mut |value| {
            let descriptor = registry
                .descriptor_of(value.type_id())
                .ok_or_else(|| CodecError::UnknownType(format!("implementor of {}", self.name)))?;
            if !self.accepts(descriptor) {
                return Err(CodecError::UnknownType(format!(
                    "{} as {}",
                    descriptor.name, self.name
                )));
            }
            cx.wire().write_tag(Some(descriptor.tag))?;
            // The payload procedure counts its own nesting level.
            (descriptor.write)(cx, value)
        })
    }

    pub(crate) fn read(&self, cx: &mut ReadContext<'_>, slot: &mut dyn Any) -> CodecResult<bool> {
        let registry = cx.registry();
        let offset = cx.wire().offset();
        let tag = match cx.read_reference_marker(true)? {
            RefMarker::Null => {
                if !(self.ops.set_null)(slot) {
                    return Err(CodecError::mismatch_named(self.name));
                }
                return Ok(false);
            }
            RefMarker::Back(index) => {
                let (tag, handle) = cx.instance(index)?;
                let upcast = registry
                    .descriptor(tag)
                    .and_then(|descriptor| self.upcast(descriptor, handle))
                    .ok_or_else(|| CodecError::InvalidData {
                        offset,
                        reason: format!("back-reference {} is not a {}", index, self.name),
                    })?;
                if !(self.ops.assign)(slot, upcast) {
                    return Err(CodecError::mismatch_named(self.name));
                }
                return Ok(true);
            }
            RefMarker::Payload(Some(tag)) => tag,
            RefMarker::Payload(None) => {
                let offset = cx.wire().offset();
                cx.wire().read_tag()?.ok_or_else(|| CodecError::InvalidData {
                    offset,
                    reason: format!("null tag after a new {} instance marker", self.name),
                })?
            }
        };

        let descriptor = registry.descriptor(tag).ok_or(CodecError::UnknownTag {
            tag: u64::from(tag),
            offset,
        })?;
        let ops = match descriptor.reference {
            Some(ops) if self.accepts(descriptor) => ops,
            _ => {
                return Err(CodecError::InvalidData {
                    offset,
                    reason: format!("`{}` does not implement {}", descriptor.name, self.name),
                })
            }
        };

        let handle = (ops.allocate)();
        if cx.preserve_references() {
            let shared =
                (ops.clone_handle)(&*handle).ok_or_else(|| CodecError::mismatch_named(&descriptor.name))?;
            cx.push_instance(tag, shared);
        }
        (ops.fill)(&*handle, &mut |value| (descriptor.read)(cx, value).map(|_| ()))?;

        let upcast = self
            .upcast(descriptor, &*handle)
            .ok_or_else(|| CodecError::mismatch_named(&descriptor.name))?;
        if !(self.ops.assign)(slot, upcast) {
            return Err(CodecError::mismatch_named(self.name));
        }
        Ok(true)
    }
}

/// Write a top-level value: tag of its runtime type (0 for none), then payload.
pub(crate) fn write_root(
    cx: &mut WriteContext<'_>,
    value: Option<&dyn Any>,
    type_name: &str,
) -> CodecResult<()> {
    let Some(value) = value else {
        return cx.wire().write_tag(None);
    };
    let descriptor = cx
        .registry()
        .descriptor_of(value.type_id())
        .ok_or_else(|| CodecError::UnknownType(type_name.to_string()))?;
    cx.wire().write_tag(Some(descriptor.tag))?;
    (descriptor.write)(cx, value)
}

/// Read a top-level value into a fresh instance of the tagged type.
pub(crate) fn read_root(cx: &mut ReadContext<'_>) -> CodecResult<Option<Box<dyn Any + Send + Sync>>> {
    let offset = cx.wire().offset();
    let Some(tag) = cx.wire().read_tag()? else {
        return Ok(None);
    };
    let descriptor = cx.registry().descriptor(tag).ok_or(CodecError::UnknownTag {
        tag: u64::from(tag),
        offset,
    })?;
    let mut value = (descriptor.create)();
    (descriptor.read)(cx, &mut *value)?;
    Ok(Some(value))
}
