// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-call encode/decode state.
//!
//! A context owns the wire adapter, the nesting depth, and (when reference
//! preservation is on) the shared reference table. It is created by each
//! top-level call and dropped when the call returns; nothing in it is shared
//! across calls or threads.
//!
//! # Reference markers
//!
//! | Tracking | Reference kind | Marker |
//! |---|---|---|
//! | off | closed `Ref<C>` | 0 = null, 1 = payload follows |
//! | off | interface `Ref<dyn I>` | the type tag itself, 0 = null |
//! | on | both | 0 = null, 1 = new instance, `n + 2` = back-reference to entry `n` |
//!
//! With tracking on, an interface's new instance is followed by its tag.

use crate::config::{NULL_TAG, REF_BACK_BASE, REF_NEW};
use crate::error::{CodecError, CodecResult};
use crate::registry::{Registry, TypeTag};
use crate::wire::{WireReader, WireWriter};
use std::any::Any;
use std::collections::HashMap;
use std::io::{Read, Write};

/// Decoded reference marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefMarker {
    Null,
    /// A payload follows. For untracked interfaces the tag was already read.
    Payload(Option<TypeTag>),
    /// Table index of an instance decoded earlier in this call.
    Back(u64),
}

/// Serialization state for one call.
pub struct WriteContext<'a> {
    wire: WireWriter<'a>,
    registry: &'a Registry,
    identities: Option<HashMap<usize, u32>>,
    depth: usize,
}

impl<'a> WriteContext<'a> {
    pub(crate) fn new(output: &'a mut dyn Write, registry: &'a Registry) -> Self {
        Self {
            wire: WireWriter::new(output),
            registry,
            identities: None,
            depth: 0,
        }
    }

    pub fn wire(&mut self) -> &mut WireWriter<'a> {
        &mut self.wire
    }

    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    pub fn preserve_references(&self) -> bool {
        self.registry.settings().preserve_references
    }

    /// Run `f` one nesting level deeper.
    pub fn nested<R>(&mut self, f: impl FnOnce(&mut Self) -> CodecResult<R>) -> CodecResult<R> {
        let limit = self.registry.settings().max_depth;
        if self.depth >= limit {
            return Err(CodecError::DepthExceeded(limit));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    /// Write the marker for a reference with the given identity.
    ///
    /// Returns `true` when the caller must write the payload next (for an
    /// untracked interface, starting with the concrete tag).
    pub fn begin_reference(&mut self, identity: Option<usize>, interface: bool) -> CodecResult<bool> {
        let Some(identity) = identity else {
            self.wire.write_varint(NULL_TAG)?;
            return Ok(false);
        };
        if !self.preserve_references() {
            if !interface {
                self.wire.write_varint(REF_NEW)?;
            }
            return Ok(true);
        }
        let table = self.identities.get_or_insert_with(HashMap::new);
        if let Some(&index) = table.get(&identity) {
            self.wire.write_varint(REF_BACK_BASE + u64::from(index))?;
            return Ok(false);
        }
        let index = table.len() as u32;
        table.insert(identity, index);
        self.wire.write_varint(REF_NEW)?;
        Ok(true)
    }

    /// Instances recorded so far in this call.
    pub fn tracked_instances(&self) -> usize {
        self.identities.as_ref().map_or(0, HashMap::len)
    }
}

/// Deserialization state for one call.
pub struct ReadContext<'a> {
    wire: WireReader<'a>,
    registry: &'a Registry,
    instances: Option<Vec<(TypeTag, Box<dyn Any + Send + Sync>)>>,
    depth: usize,
}

impl<'a> ReadContext<'a> {
    pub(crate) fn new(input: &'a mut dyn Read, registry: &'a Registry) -> Self {
        Self {
            wire: WireReader::new(input),
            registry,
            instances: None,
            depth: 0,
        }
    }

    pub fn wire(&mut self) -> &mut WireReader<'a> {
        &mut self.wire
    }

    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    pub fn preserve_references(&self) -> bool {
        self.registry.settings().preserve_references
    }

    pub fn run_hooks(&self) -> bool {
        self.registry.settings().run_hooks
    }

    pub fn nested<R>(&mut self, f: impl FnOnce(&mut Self) -> CodecResult<R>) -> CodecResult<R> {
        let limit = self.registry.settings().max_depth;
        if self.depth >= limit {
            return Err(CodecError::DepthExceeded(limit));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    /// Read the marker preceding a reference payload.
    pub fn read_reference_marker(&mut self, interface: bool) -> CodecResult<RefMarker> {
        if !self.preserve_references() && interface {
            return Ok(match self.wire.read_tag()? {
                None => RefMarker::Null,
                Some(tag) => RefMarker::Payload(Some(tag)),
            });
        }
        let start = self.wire.offset();
        match self.wire.read_varint()? {
            NULL_TAG => Ok(RefMarker::Null),
            REF_NEW => Ok(RefMarker::Payload(None)),
            marker if self.preserve_references() => Ok(RefMarker::Back(marker - REF_BACK_BASE)),
            marker => Err(CodecError::InvalidData {
                offset: start,
                reason: format!("reference marker {} while reference tracking is off", marker),
            }),
        }
    }

    /// Record a newly allocated instance before its payload is decoded.
    pub fn push_instance(&mut self, tag: TypeTag, handle: Box<dyn Any + Send + Sync>) {
        self.instances.get_or_insert_with(Vec::new).push((tag, handle));
    }

    /// Instance recorded at `index`, with the tag of its concrete type.
    pub fn instance(&self, index: u64) -> CodecResult<(TypeTag, &(dyn Any + Send + Sync))> {
        let table = self.instances.as_deref().unwrap_or_default();
        usize::try_from(index)
            .ok()
            .and_then(|i| table.get(i))
            .map(|(tag, handle)| (*tag, handle.as_ref()))
            .ok_or(CodecError::BadReference {
                index,
                len: table.len(),
            })
    }

    pub fn tracked_instances(&self) -> usize {
        self.instances.as_ref().map_or(0, Vec::len)
    }
}
