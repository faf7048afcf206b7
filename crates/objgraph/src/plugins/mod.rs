// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Capability plugins: strategies that claim types and bind their procedures.
//!
//! The collector asks each plugin, in priority order, whether it handles a
//! shape; the first claimer wins. User plugins are consulted before the
//! built-in set:
//!
//! | Priority | Plugin | Claims |
//! |---|---|---|
//! | 1 | `primitive` | scalars, strings, composite values |
//! | 2 | `array` | `Vec<T>`, `[T; N]` |
//! | 3 | `nullable` | `Option<T>` |
//! | 4 | `enum` | unit enums |
//! | 5 | `map` | `HashMap`, `BTreeMap` |
//! | 6 | `reference` | `Ref<C>` |
//! | 7 | `aggregate` | structs, pairs |

mod aggregate;
mod array;
mod enumeration;
mod map;
mod noop;
mod nullable;
mod primitive;
mod reference;

pub use aggregate::AggregatePlugin;
pub use array::ArrayPlugin;
pub use enumeration::EnumPlugin;
pub use map::MapPlugin;
pub use noop::NoopPlugin;
pub use nullable::NullablePlugin;
pub use primitive::PrimitivePlugin;
pub use reference::ReferencePlugin;

pub(crate) use primitive::{read_integer, write_integer};

use crate::error::{CodecError, CodecResult};
use crate::registry::{BindContext, CallConvention, ProcedureOrigin};
use crate::session::{ReadContext, WriteContext};
use crate::types::{ShapeFn, TypeShape};
use crate::wire::{WireReader, WireWriter};
use std::any::Any;
use std::collections::HashSet;
use std::sync::Arc;

/// Synthesized encoder: writes the payload of one value.
pub type WriteFn =
    Arc<dyn Fn(&mut WriteContext<'_>, &dyn Any) -> CodecResult<()> + Send + Sync>;

/// Synthesized decoder: fills a default-constructed slot.
///
/// Returns `false` when a null marker was read and the slot was left as is.
pub type ReadFn =
    Arc<dyn Fn(&mut ReadContext<'_>, &mut dyn Any) -> CodecResult<bool> + Send + Sync>;

/// Static encoder working on the wire only.
pub type StaticWrite = fn(&mut WireWriter<'_>, &dyn Any) -> CodecResult<()>;

/// Static decoder working on the wire only.
pub type StaticRead = fn(&mut WireReader<'_>, &mut dyn Any) -> CodecResult<bool>;

/// How a plugin provides the procedures for one type.
pub enum Binding {
    /// Pre-existing procedures (the primitive codec).
    Static { write: StaticWrite, read: StaticRead },
    /// Procedures composed at registry construction.
    Synthesized { write: WriteFn, read: ReadFn },
}

impl Binding {
    pub fn synthesized<W, R>(write: W, read: R) -> Self
    where
        W: Fn(&mut WriteContext<'_>, &dyn Any) -> CodecResult<()> + Send + Sync + 'static,
        R: Fn(&mut ReadContext<'_>, &mut dyn Any) -> CodecResult<bool> + Send + Sync + 'static,
    {
        Binding::Synthesized {
            write: Arc::new(write),
            read: Arc::new(read),
        }
    }

    pub(crate) fn into_procedures(self) -> (WriteFn, ReadFn, ProcedureOrigin) {
        match self {
            Binding::Static { write, read } => {
                let write: WriteFn = Arc::new(move |cx: &mut WriteContext<'_>, value: &dyn Any| {
                    write(cx.wire(), value)
                });
                let read: ReadFn = Arc::new(move |cx: &mut ReadContext<'_>, slot: &mut dyn Any| {
                    read(cx.wire(), slot)
                });
                (write, read, ProcedureOrigin::Builtin)
            }
            Binding::Synthesized { write, read } => (write, read, ProcedureOrigin::Synthesized),
        }
    }
}

/// Strategy that claims a family of types.
pub trait CapabilityPlugin: Send + Sync {
    /// Unique plugin name.
    fn name(&self) -> &str;

    fn handles(&self, shape: &TypeShape) -> bool;

    /// Types that must be registered for this plugin's procedures to work.
    fn required_subtypes(&self, _shape: &TypeShape) -> Vec<ShapeFn> {
        Vec::new()
    }

    fn convention(&self, _shape: &TypeShape) -> CallConvention {
        CallConvention::Direct
    }

    /// Whether the bound encoding can itself carry the zero null marker.
    ///
    /// `Option<T>` relies on this: a nullable `T` encodes `None` as the
    /// marker instead of a presence byte.
    fn null_marker(&self, _shape: &TypeShape) -> bool {
        false
    }

    fn bind(&self, shape: &TypeShape, cx: &BindContext<'_>) -> CodecResult<Binding>;
}

/// Built-in plugins in priority order.
pub fn builtin_plugins() -> Vec<Arc<dyn CapabilityPlugin>> {
    vec![
        Arc::new(PrimitivePlugin),
        Arc::new(ArrayPlugin),
        Arc::new(NullablePlugin),
        Arc::new(EnumPlugin),
        Arc::new(MapPlugin),
        Arc::new(ReferencePlugin),
        Arc::new(AggregatePlugin),
    ]
}

/// Ordered plugin list: user plugins first, then the built-in set.
pub struct PluginSet {
    plugins: Vec<Arc<dyn CapabilityPlugin>>,
    user_count: usize,
}

impl PluginSet {
    pub fn new(user: &[Arc<dyn CapabilityPlugin>]) -> CodecResult<Self> {
        let mut plugins: Vec<Arc<dyn CapabilityPlugin>> = user.to_vec();
        plugins.extend(builtin_plugins());

        let mut names = HashSet::new();
        for plugin in &plugins {
            if !names.insert(plugin.name().to_string()) {
                return Err(CodecError::DuplicatePlugin(plugin.name().to_string()));
            }
        }
        Ok(Self {
            plugins,
            user_count: user.len(),
        })
    }

    /// Index of the plugin claiming `shape`, if any.
    ///
    /// Two user plugins claiming the same type is a configuration error;
    /// a user plugin silently shadows the built-in claimer.
    pub fn claim(&self, shape: &TypeShape) -> CodecResult<Option<usize>> {
        let mut claimed: Option<usize> = None;
        for (index, plugin) in self.plugins[..self.user_count].iter().enumerate() {
            if !plugin.handles(shape) {
                continue;
            }
            if let Some(first) = claimed {
                return Err(CodecError::ConflictingPlugins {
                    type_name: shape.name.to_string(),
                    first: self.plugins[first].name().to_string(),
                    second: plugin.name().to_string(),
                });
            }
            claimed = Some(index);
        }
        if claimed.is_some() {
            return Ok(claimed);
        }
        Ok(self.plugins[self.user_count..]
            .iter()
            .position(|plugin| plugin.handles(shape))
            .map(|position| self.user_count + position))
    }

    pub fn get(&self, index: usize) -> &dyn CapabilityPlugin {
        self.plugins[index].as_ref()
    }

    pub fn is_user(&self, index: usize) -> bool {
        index < self.user_count
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}
