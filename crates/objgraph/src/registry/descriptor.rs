// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::{CallConvention, ProcedureOrigin, TypeTag};
use crate::plugins::{ReadFn, WriteFn};
use crate::types::{CreateFn, RefOps};
use std::any::TypeId;
use std::borrow::Cow;
use std::fmt;

/// One registered type: its tag, how it is called, and its procedures.
///
/// Immutable once the registry is published.
pub struct TypeDescriptor {
    pub tag: TypeTag,
    pub name: Cow<'static, str>,
    pub type_id: TypeId,
    pub convention: CallConvention,
    pub origin: ProcedureOrigin,
    /// The type's own encoding carries the zero null marker.
    pub nullable: bool,
    /// Name of the plugin that bound the procedures.
    pub plugin: String,
    pub write: WriteFn,
    pub read: ReadFn,
    pub create: CreateFn,
    pub reference: Option<RefOps>,
}

impl TypeDescriptor {
    pub fn is_builtin(&self) -> bool {
        self.origin == ProcedureOrigin::Builtin
    }

    /// Can be allocated behind a shared `Ref` (interface payloads).
    pub fn is_referenceable(&self) -> bool {
        self.reference.is_some()
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("tag", &self.tag)
            .field("name", &self.name)
            .field("convention", &self.convention)
            .field("origin", &self.origin)
            .field("nullable", &self.nullable)
            .field("plugin", &self.plugin)
            .finish_non_exhaustive()
    }
}
