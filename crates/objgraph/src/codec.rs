// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Orchestrator: one-shot initialization and the public entry points.
//!
//! ```ignore
//! let codec = ObjectCodec::builder().root::<Point>().build()?;
//! let bytes = codec.to_bytes(&Point { x: -1, y: 300 })?;
//! let point: Option<Point> = codec.from_bytes(&bytes)?;
//! ```
//!
//! The registry is built once and published through an `ArcSwapOption`;
//! every call loads the snapshot and owns its own [`WriteContext`] /
//! [`ReadContext`], so calls on independent streams may run concurrently.

use crate::config::CodecConfig;
use crate::error::{CodecError, CodecResult};
use crate::graph::TypeGraph;
use crate::plugins::{CapabilityPlugin, PluginSet};
use crate::registry::dispatch::{read_root, write_root};
use crate::registry::{Registry, TypeTag};
use crate::session::{ReadContext, WriteContext};
use crate::types::{Describe, ShapeFn};
use arc_swap::ArcSwapOption;
use std::any::{type_name, Any, TypeId};
use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Declared root types of a codec.
#[derive(Debug, Clone, Default)]
pub struct Roots {
    shapes: Vec<ShapeFn>,
}

impl Roots {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with<T: Describe>(mut self) -> Self {
        self.add::<T>();
        self
    }

    pub fn add<T: Describe>(&mut self) -> &mut Self {
        self.shapes.push(T::shape);
        self
    }

    #[must_use]
    pub fn with_shape(mut self, shape: ShapeFn) -> Self {
        self.shapes.push(shape);
        self
    }

    pub fn shapes(&self) -> &[ShapeFn] {
        &self.shapes
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

/// Binary object-graph codec.
pub struct ObjectCodec {
    config: CodecConfig,
    registry: ArcSwapOption<Registry>,
    initializing: AtomicBool,
}

impl ObjectCodec {
    pub fn new(config: CodecConfig) -> Self {
        Self {
            config,
            registry: ArcSwapOption::empty(),
            initializing: AtomicBool::new(false),
        }
    }

    pub fn builder() -> ObjectCodecBuilder {
        ObjectCodecBuilder::default()
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Collect the type graph from `roots` and publish the registry.
    ///
    /// Runs at most once: a second or concurrent attempt fails with
    /// [`CodecError::AlreadyInitialized`]. A failed build leaves the codec
    /// uninitialized so it can be retried.
    pub fn initialize(&self, roots: &Roots) -> CodecResult<()> {
        if self
            .initializing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(CodecError::AlreadyInitialized);
        }

        match self.build_registry(roots) {
            Ok(registry) => {
                log::info!(
                    "[objgraph] initialized: {} types from {} roots (preserve_references={})",
                    registry.len(),
                    roots.len(),
                    self.config.preserves_references()
                );
                self.registry.store(Some(Arc::new(registry)));
                Ok(())
            }
            Err(err) => {
                log::debug!("[objgraph] initialization failed: {}", err);
                self.initializing.store(false, Ordering::Release);
                Err(err)
            }
        }
    }

    fn build_registry(&self, roots: &Roots) -> CodecResult<Registry> {
        let plugins = PluginSet::new(self.config.plugins())?;
        let graph =
            TypeGraph::collect(roots.shapes(), &plugins, self.config.eligibility_policy())?;
        Registry::build(&graph, &plugins, &self.config)
    }

    pub fn is_initialized(&self) -> bool {
        self.registry.load().is_some()
    }

    /// Published registry snapshot.
    pub fn registry(&self) -> CodecResult<Arc<Registry>> {
        self.registry.load_full().ok_or(CodecError::NotInitialized)
    }

    pub fn tag_of<T: Describe>(&self) -> CodecResult<TypeTag> {
        self.registry()?
            .tag_of(TypeId::of::<T>())
            .ok_or_else(|| CodecError::UnknownType(type_name::<T>().to_string()))
    }

    /// Write `value` as its type tag followed by its payload.
    pub fn serialize<W: Write, T: Describe>(&self, writer: &mut W, value: &T) -> CodecResult<()> {
        self.write_with(writer, |cx| {
            write_root(cx, Some(value as &dyn Any), type_name::<T>())
        })
    }

    /// Write a type-erased value; `None` writes the null tag.
    pub fn serialize_dyn<W: Write>(
        &self,
        writer: &mut W,
        value: Option<&dyn Any>,
    ) -> CodecResult<()> {
        self.write_with(writer, |cx| write_root(cx, value, "dyn Any"))
    }

    /// Write the payload only; the reader must know the type.
    pub fn serialize_direct<W: Write, T: Describe>(
        &self,
        writer: &mut W,
        value: &T,
    ) -> CodecResult<()> {
        self.write_with(writer, |cx| {
            let descriptor = cx
                .registry()
                .descriptor_of(TypeId::of::<T>())
                .ok_or_else(|| CodecError::UnknownType(type_name::<T>().to_string()))?;
            (descriptor.write)(cx, value as &dyn Any)
        })
    }

    /// Read one tagged value; `None` for the null tag.
    pub fn deserialize<R: Read>(
        &self,
        reader: &mut R,
    ) -> CodecResult<Option<Box<dyn Any + Send + Sync>>> {
        self.read_with(reader, read_root)
    }

    /// Read one tagged value that must be a `T`.
    pub fn deserialize_as<T: Describe, R: Read>(&self, reader: &mut R) -> CodecResult<Option<T>> {
        match self.deserialize(reader)? {
            None => Ok(None),
            Some(value) => value
                .downcast::<T>()
                .map(|value| Some(*value))
                .map_err(|_| CodecError::mismatch::<T>()),
        }
    }

    /// Read a payload written by [`ObjectCodec::serialize_direct`].
    pub fn deserialize_direct<T: Describe, R: Read>(&self, reader: &mut R) -> CodecResult<T> {
        self.read_with(reader, |cx| {
            let descriptor = cx
                .registry()
                .descriptor_of(TypeId::of::<T>())
                .ok_or_else(|| CodecError::UnknownType(type_name::<T>().to_string()))?;
            let mut value = T::default();
            (descriptor.read)(cx, &mut value as &mut dyn Any)?;
            Ok(value)
        })
    }

    pub fn to_bytes<T: Describe>(&self, value: &T) -> CodecResult<Vec<u8>> {
        let mut buf = Vec::new();
        self.serialize(&mut buf, value)?;
        Ok(buf)
    }

    pub fn from_bytes<T: Describe>(&self, bytes: &[u8]) -> CodecResult<Option<T>> {
        let mut input = bytes;
        self.deserialize_as(&mut input)
    }

    fn write_with<W: Write>(
        &self,
        writer: &mut W,
        body: impl FnOnce(&mut WriteContext<'_>) -> CodecResult<()>,
    ) -> CodecResult<()> {
        let registry = self.registry()?;
        let mut cx = WriteContext::new(writer, &registry);
        let result = body(&mut cx);
        if let Err(err) = &result {
            log::debug!(
                "[objgraph] serialize failed at byte {}: {}",
                cx.wire().offset(),
                err
            );
        }
        result
    }

    fn read_with<R: Read, T>(
        &self,
        reader: &mut R,
        body: impl FnOnce(&mut ReadContext<'_>) -> CodecResult<T>,
    ) -> CodecResult<T> {
        let registry = self.registry()?;
        let mut cx = ReadContext::new(reader, &registry);
        let result = body(&mut cx);
        if let Err(err) = &result {
            if err.is_protocol() {
                log::debug!("[objgraph] deserialize failed: {}", err);
            }
        }
        result
    }
}

impl Default for ObjectCodec {
    fn default() -> Self {
        Self::new(CodecConfig::default())
    }
}

/// Builder pairing a [`CodecConfig`] with its [`Roots`].
#[derive(Default)]
pub struct ObjectCodecBuilder {
    config: CodecConfig,
    roots: Roots,
}

impl ObjectCodecBuilder {
    #[must_use]
    pub fn root<T: Describe>(mut self) -> Self {
        self.roots.add::<T>();
        self
    }

    #[must_use]
    pub fn roots(mut self, roots: Roots) -> Self {
        self.roots = roots;
        self
    }

    #[must_use]
    pub fn config(mut self, config: CodecConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn preserve_references(mut self, enabled: bool) -> Self {
        self.config = self.config.preserve_references(enabled);
        self
    }

    #[must_use]
    pub fn run_hooks(mut self, enabled: bool) -> Self {
        self.config = self.config.run_hooks(enabled);
        self
    }

    #[must_use]
    pub fn plugin<P: CapabilityPlugin + 'static>(mut self, plugin: P) -> Self {
        self.config = self.config.plugin(plugin);
        self
    }

    /// Create the codec and initialize it with the collected roots.
    pub fn build(self) -> CodecResult<ObjectCodec> {
        let codec = ObjectCodec::new(self.config);
        codec.initialize(&self.roots)?;
        Ok(codec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_use_before_init_rejected() {
        let codec = ObjectCodec::default();
        assert!(!codec.is_initialized());
        assert!(matches!(codec.to_bytes(&7i32), Err(CodecError::NotInitialized)));
        assert!(matches!(codec.tag_of::<i32>(), Err(CodecError::NotInitialized)));
    }

    #[test]
    fn test_second_init_rejected() {
        let codec = ObjectCodec::default();
        codec.initialize(&Roots::new()).expect("first init");
        assert!(matches!(
            codec.initialize(&Roots::new()),
            Err(CodecError::AlreadyInitialized)
        ));
        assert_eq!(codec.tag_of::<i32>().expect("i32 is built in"), 7);
    }

    #[test]
    fn test_concurrent_init_has_one_winner() {
        let codec = Arc::new(ObjectCodec::default());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let codec = Arc::clone(&codec);
                thread::spawn(move || codec.initialize(&Roots::new().with::<Vec<i64>>()).is_ok())
            })
            .collect();
        let winners = handles
            .into_iter()
            .map(|h| h.join().expect("init thread"))
            .filter(|ok| *ok)
            .count();
        assert_eq!(winners, 1);
        assert!(codec.is_initialized());
    }

    #[test]
    fn test_primitive_root_round_trip() {
        let codec = ObjectCodec::builder().build().expect("codec");
        let bytes = codec.to_bytes(&String::from("héllo")).expect("serialize");
        assert_eq!(bytes[0], 15);
        let back: Option<String> = codec.from_bytes(&bytes).expect("deserialize");
        assert_eq!(back.as_deref(), Some("héllo"));
    }

    #[test]
    fn test_null_root() {
        let codec = ObjectCodec::builder().build().expect("codec");
        let mut buf = Vec::new();
        codec.serialize_dyn(&mut buf, None).expect("serialize null");
        assert_eq!(buf, vec![0]);
        let mut input = buf.as_slice();
        assert!(codec.deserialize(&mut input).expect("deserialize").is_none());
    }

    #[test]
    fn test_deserialize_as_wrong_type() {
        let codec = ObjectCodec::builder().build().expect("codec");
        let bytes = codec.to_bytes(&1u64).expect("serialize");
        assert!(matches!(
            codec.from_bytes::<i64>(&bytes),
            Err(CodecError::TypeMismatch { .. })
        ));
    }
}
