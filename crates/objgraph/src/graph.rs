// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type graph collection.
//!
//! Starting from the declared roots, the collector walks every type a
//! claiming plugin says it depends on. The result is the ordered node list
//! the registry assigns tags from: the fixed primitive set first, then all
//! other types sorted by canonical name, so tags do not depend on root order.
//!
//! `Ref<dyn Trait>` shapes are never nodes. Their implementors are walked
//! instead and the members themselves go through the dispatcher.

use crate::config::MAX_TYPE_TAG;
use crate::error::{CodecError, CodecResult};
use crate::plugins::PluginSet;
use crate::types::{builtin_shapes, ShapeFn, TypeKind, TypeShape};
use std::any::TypeId;
use std::collections::{HashMap, HashSet};

/// Predicate every type claimed by a built-in plugin must pass.
pub trait EligibilityPolicy: Send + Sync {
    /// `Err(reason)` when the type must not be serialized.
    fn check(&self, shape: &TypeShape) -> Result<(), String>;
}

/// Rejects opaque types; everything with a described structure passes.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultEligibility;

impl EligibilityPolicy for DefaultEligibility {
    fn check(&self, shape: &TypeShape) -> Result<(), String> {
        match shape.kind {
            TypeKind::Opaque => Err("opaque type without a serializable structure".to_string()),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TypeNode {
    pub shape: TypeShape,
    /// Index of the claiming plugin in the [`PluginSet`].
    pub plugin: usize,
    /// Member of the fixed primitive set.
    pub builtin: bool,
    pub dependencies: Vec<TypeId>,
}

/// Collected types in tag order.
#[derive(Debug)]
pub struct TypeGraph {
    nodes: Vec<TypeNode>,
    index: HashMap<TypeId, usize>,
}

impl TypeGraph {
    pub fn collect(
        roots: &[ShapeFn],
        plugins: &PluginSet,
        policy: &dyn EligibilityPolicy,
    ) -> CodecResult<Self> {
        let mut seen: HashSet<TypeId> = HashSet::new();
        let mut builtin = Vec::new();
        for shape_fn in builtin_shapes() {
            let node = Self::visit(shape_fn(), plugins, policy)?;
            seen.insert(node.shape.type_id);
            builtin.push(TypeNode {
                builtin: true,
                ..node
            });
        }

        let mut collected = Vec::new();
        let mut interfaces: HashSet<TypeId> = HashSet::new();
        let mut stack: Vec<ShapeFn> = roots.iter().rev().copied().collect();
        while let Some(shape_fn) = stack.pop() {
            let shape = shape_fn();
            if seen.contains(&shape.type_id) {
                continue;
            }
            if let TypeKind::Interface(interface) = &shape.kind {
                if interfaces.insert(shape.type_id) {
                    log::trace!(
                        "[collector] interface {} -> {} implementors",
                        interface.name,
                        interface.implementors.len()
                    );
                    stack.extend(interface.implementors.iter().rev().map(|i| i.shape));
                }
                continue;
            }

            seen.insert(shape.type_id);
            let node = Self::visit(shape, plugins, policy)?;
            let subtypes = plugins.get(node.plugin).required_subtypes(&node.shape);
            stack.extend(subtypes.into_iter().rev());
            collected.push(node);
        }

        collected.sort_by(|a, b| a.shape.name.as_bytes().cmp(b.shape.name.as_bytes()));

        let mut names: HashSet<&str> = HashSet::new();
        for node in builtin.iter().chain(collected.iter()) {
            if !names.insert(node.shape.name.as_ref()) {
                return Err(CodecError::DuplicateTypeName(node.shape.name.to_string()));
            }
        }

        let total = builtin.len() + collected.len();
        if total > MAX_TYPE_TAG {
            return Err(CodecError::TooManyTypes(total));
        }

        log::debug!(
            "[collector] {} types ({} primitive, {} collected from {} roots)",
            total,
            builtin.len(),
            collected.len(),
            roots.len()
        );

        let mut nodes = builtin;
        nodes.append(&mut collected);
        let index = nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (node.shape.type_id, i))
            .collect();
        Ok(Self { nodes, index })
    }

    /// Claim `shape` and check eligibility.
    fn visit(
        shape: TypeShape,
        plugins: &PluginSet,
        policy: &dyn EligibilityPolicy,
    ) -> CodecResult<TypeNode> {
        let ineligible = |shape: &TypeShape, reason: String| CodecError::Ineligible {
            type_name: shape.name.to_string(),
            reason,
        };

        let Some(plugin) = plugins.claim(&shape)? else {
            let reason = policy
                .check(&shape)
                .err()
                .unwrap_or_else(|| format!("no plugin handles {} types", shape.kind.name()));
            return Err(ineligible(&shape, reason));
        };
        // A user plugin takes responsibility for the type.
        if !plugins.is_user(plugin) {
            policy.check(&shape).map_err(|reason| ineligible(&shape, reason))?;
        } else {
            log::debug!(
                "[collector] {} claimed by user plugin {}",
                shape.name,
                plugins.get(plugin).name()
            );
        }

        let dependencies = plugins
            .get(plugin)
            .required_subtypes(&shape)
            .into_iter()
            .map(|sub| sub().type_id)
            .collect();
        Ok(TypeNode {
            shape,
            plugin,
            builtin: false,
            dependencies,
        })
    }

    pub fn nodes(&self) -> &[TypeNode] {
        &self.nodes
    }

    pub fn index_of(&self, type_id: TypeId) -> Option<usize> {
        self.index.get(&type_id).copied()
    }

    pub fn contains(&self, type_id: TypeId) -> bool {
        self.index.contains_key(&type_id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
