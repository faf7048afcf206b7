// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Codec registry: dense type tags, calling conventions, and procedures.
//!
//! Construction runs once per codec, in three steps:
//!
//! 1. assign tags in graph order (primitives 1..=21, then by name);
//! 2. bind every type through its claiming plugin;
//! 3. build the dispatcher's `TypeId -> tag` table from the descriptors.
//!
//! The finished registry is immutable and shared by all calls.

mod callee;
mod descriptor;
pub(crate) mod dispatch;

pub use callee::{BindContext, Callee, InterfaceBinding};
pub use descriptor::TypeDescriptor;

use crate::config::CodecConfig;
use crate::error::{CodecError, CodecResult};
use crate::graph::TypeGraph;
use crate::plugins::PluginSet;
use callee::tag_for_index;
use std::any::TypeId;
use std::collections::HashMap;

/// Dense numeric type identity; 0 is reserved for null.
pub type TypeTag = u16;

/// How a type's procedure is reached from a member of that type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallConvention {
    /// Payload only; the declared type is the runtime type.
    Direct,
    /// Tag then payload, resolved through the dispatcher.
    Indirect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcedureOrigin {
    /// Pre-existing primitive procedure.
    Builtin,
    /// Composed from member procedures at construction.
    Synthesized,
}

/// Per-codec settings every call reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub preserve_references: bool,
    pub run_hooks: bool,
    pub max_depth: usize,
}

impl From<&CodecConfig> for Settings {
    fn from(config: &CodecConfig) -> Self {
        Self {
            preserve_references: config.preserves_references(),
            run_hooks: config.runs_hooks(),
            max_depth: config.depth_limit(),
        }
    }
}

/// Immutable table of every registered type.
#[derive(Debug)]
pub struct Registry {
    descriptors: Vec<TypeDescriptor>,
    by_type: HashMap<TypeId, TypeTag>,
    settings: Settings,
}

impl Registry {
    pub(crate) fn build(
        graph: &TypeGraph,
        plugins: &PluginSet,
        config: &CodecConfig,
    ) -> CodecResult<Self> {
        let nodes = graph.nodes();

        let conventions: Vec<CallConvention> = nodes
            .iter()
            .map(|node| plugins.get(node.plugin).convention(&node.shape))
            .collect();
        let nullable: Vec<bool> = nodes
            .iter()
            .map(|node| plugins.get(node.plugin).null_marker(&node.shape))
            .collect();
        let cx = BindContext::new(graph, &conventions, &nullable);

        let mut descriptors = Vec::with_capacity(nodes.len());
        for (index, node) in nodes.iter().enumerate() {
            let plugin = plugins.get(node.plugin);
            let tag = tag_for_index(index);
            let (write, read, origin) = plugin.bind(&node.shape, &cx)?.into_procedures();
            log::trace!(
                "[registry] tag {} -> {} ({}, {:?})",
                tag,
                node.shape.name,
                plugin.name(),
                conventions[index]
            );
            descriptors.push(TypeDescriptor {
                tag,
                name: node.shape.name.clone(),
                type_id: node.shape.type_id,
                convention: conventions[index],
                origin,
                nullable: nullable[index],
                plugin: plugin.name().to_string(),
                write,
                read,
                create: node.shape.create,
                reference: node.shape.reference,
            });
        }

        let by_type: HashMap<TypeId, TypeTag> =
            descriptors.iter().map(|d| (d.type_id, d.tag)).collect();
        let synthesized = descriptors.iter().filter(|d| !d.is_builtin()).count();
        log::debug!(
            "[registry] {} types bound ({} synthesized, {} indirect)",
            descriptors.len(),
            synthesized,
            conventions
                .iter()
                .filter(|c| **c == CallConvention::Indirect)
                .count()
        );

        Ok(Self {
            descriptors,
            by_type,
            settings: Settings::from(config),
        })
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    /// Descriptor for `tag`; `None` for the null tag or an unknown one.
    pub fn descriptor(&self, tag: TypeTag) -> Option<&TypeDescriptor> {
        usize::from(tag)
            .checked_sub(1)
            .and_then(|index| self.descriptors.get(index))
    }

    pub fn descriptor_of(&self, type_id: TypeId) -> Option<&TypeDescriptor> {
        self.by_type
            .get(&type_id)
            .and_then(|tag| self.descriptor(*tag))
    }

    pub fn tag_of(&self, type_id: TypeId) -> Option<TypeTag> {
        self.by_type.get(&type_id).copied()
    }

    /// All descriptors in tag order.
    pub fn descriptors(&self) -> &[TypeDescriptor] {
        &self.descriptors
    }

    pub(crate) fn entry(&self, index: usize) -> CodecResult<&TypeDescriptor> {
        self.descriptors
            .get(index)
            .ok_or_else(|| CodecError::MissingBinding(format!("descriptor #{}", index)))
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
