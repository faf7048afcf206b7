// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Plugin that claims types and serializes nothing for them.
//!
//! Useful for members that are rebuilt after decoding (caches, handles):
//! the member writes zero bytes and decodes to its default value. Claiming
//! a type through a user plugin also bypasses the eligibility policy.

use super::{Binding, CapabilityPlugin};
use crate::error::CodecResult;
use crate::registry::BindContext;
use crate::types::{Describe, TypeShape};
use std::any::{type_name, Any, TypeId};

#[derive(Debug, Clone)]
pub struct NoopPlugin {
    name: String,
    types: Vec<TypeId>,
}

fn write_nothing(_: &mut crate::wire::WireWriter<'_>, _: &dyn Any) -> CodecResult<()> {
    Ok(())
}

fn read_nothing(_: &mut crate::wire::WireReader<'_>, _: &mut dyn Any) -> CodecResult<bool> {
    Ok(true)
}

impl NoopPlugin {
    /// Plugin named `noop<T>` claiming `T`.
    pub fn new<T: Describe>() -> Self {
        Self {
            name: format!("noop<{}>", type_name::<T>()),
            types: vec![TypeId::of::<T>()],
        }
    }

    /// Claim another type as well.
    #[must_use]
    pub fn with<T: Describe>(mut self) -> Self {
        self.types.push(TypeId::of::<T>());
        self
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl CapabilityPlugin for NoopPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn handles(&self, shape: &TypeShape) -> bool {
        self.types.contains(&shape.type_id)
    }

    fn bind(&self, _shape: &TypeShape, _cx: &BindContext<'_>) -> CodecResult<Binding> {
        Ok(Binding::Static {
            write: write_nothing,
            read: read_nothing,
        })
    }
}
