// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # objgraph - binary object-graph codec
//!
//! Derives, once per codec, a dedicated encode/decode procedure for every
//! type reachable from a set of root types, then serializes values (and
//! whole object graphs, cycles included) to a compact byte stream.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use objgraph::{Codec, ObjectCodec, Result};
//!
//! #[derive(Codec, Default, Debug, PartialEq)]
//! struct Point {
//!     x: i32,
//!     y: i32,
//! }
//!
//! fn main() -> Result<()> {
//!     let codec = ObjectCodec::builder().root::<Point>().build()?;
//!
//!     let bytes = codec.to_bytes(&Point { x: -1, y: 300 })?;
//!     let point: Option<Point> = codec.from_bytes(&bytes)?;
//!     assert_eq!(point, Some(Point { x: -1, y: 300 }));
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |  ObjectCodec: initialize(roots) -> serialize / deserialize          |
//! +---------------------------------------------------------------------+
//! |  TypeGraph (collector) -> Registry (tags, procedures, dispatcher)   |
//! |                 ^ CapabilityPlugin bindings                         |
//! +---------------------------------------------------------------------+
//! |  WriteContext / ReadContext: depth, shared reference table          |
//! +---------------------------------------------------------------------+
//! |  WireWriter / WireReader: varints, zig-zag, strings, byte buffers   |
//! +---------------------------------------------------------------------+
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ObjectCodec`] | Entry point: one-shot init, serialize, deserialize |
//! | [`CodecConfig`] | Reference tracking, hooks, depth limit, plugins |
//! | [`Describe`] | Static shape of a serializable type (`#[derive(Codec)]`) |
//! | [`Ref`] | Shared, identity-bearing reference (`Ref<T>`, `Ref<dyn Trait>`) |
//! | [`CapabilityPlugin`] | Strategy claiming a family of types |
//!
//! ## Polymorphism
//!
//! ```rust,no_run
//! use objgraph::{Codec, Object, Ref};
//!
//! pub trait Shape: Object {}
//!
//! #[derive(Codec, Default)]
//! pub struct Circle { pub radius: f64 }
//! impl Shape for Circle {}
//!
//! #[derive(Codec, Default)]
//! pub struct Square { pub side: f64 }
//! impl Shape for Square {}
//!
//! objgraph::interface!(Shape: Circle, Square);
//!
//! #[derive(Codec, Default)]
//! pub struct Scene { pub shapes: Vec<Ref<dyn Shape>> }
//! ```

// Allow the derive macro to work inside this crate's tests
extern crate self as objgraph;

/// Codec settings and wire constants.
pub mod config;
/// Error type and categories.
pub mod error;
/// Type graph collection and eligibility.
pub mod graph;
/// Built-in and user capability plugins.
pub mod plugins;
/// Tag assignment, descriptors, and the polymorphic dispatcher.
pub mod registry;
/// Per-call encode/decode state.
pub mod session;
/// Static type shapes and shared references.
pub mod types;
/// Primitive wire encoding.
pub mod wire;

mod codec;

pub use codec::{ObjectCodec, ObjectCodecBuilder, Roots};
pub use config::CodecConfig;
pub use error::{CodecError, CodecResult, CodecResult as Result, ErrorCategory};
pub use graph::{DefaultEligibility, EligibilityPolicy};
pub use plugins::{Binding, CapabilityPlugin, NoopPlugin};
pub use registry::{CallConvention, ProcedureOrigin, Registry, TypeDescriptor, TypeTag};
pub use session::{ReadContext, WriteContext};
pub use types::{
    AggregateShape, Describe, EnumOps, EnumShape, FieldShape, Implementor, Object, PrimitiveKind,
    Ref, RefOps, RefTarget, TypeKind, TypeShape,
};
pub use wire::{Decimal, Uri};

// Derive macro (for #[derive(objgraph::Codec)])
pub use objgraph_codegen::Codec;

#[doc(hidden)]
pub mod __private {
    pub use parking_lot::RwLock;
}
