// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::missing_panics_doc)] // Tests panic on failure

//! Codec initialization and registry construction: one-shot init,
//! eligibility, plugin configuration, and deterministic tag assignment.

use objgraph::registry::BindContext;
use objgraph::wire::{WireReader, WireWriter};
use objgraph::{
    Binding, CallConvention, CapabilityPlugin, Codec, CodecConfig, CodecError, ErrorCategory,
    NoopPlugin, ObjectCodec, ProcedureOrigin, Ref, Roots, TypeShape,
};
use std::any::{Any, TypeId};

#[derive(Codec, Default, Debug, PartialEq)]
struct Point {
    x: i32,
    y: i32,
}

#[derive(Codec, Default, Debug)]
struct Polygon {
    name: String,
    corners: Vec<Point>,
    outline: Option<Ref<Polygon>>,
}

#[derive(Codec, Default)]
#[codec(opaque)]
struct Handle {
    _fd: i32,
}

#[derive(Codec, Default)]
struct Device {
    handle: Handle,
}

mod first {
    #[derive(objgraph::Codec, Default)]
    #[codec(name = "shared.Item")]
    pub struct Item {
        pub id: u32,
    }
}

mod second {
    #[derive(objgraph::Codec, Default)]
    #[codec(name = "shared.Item")]
    pub struct Item {
        pub label: String,
    }
}

#[derive(Codec, Default)]
struct Inventory {
    left: first::Item,
    right: second::Item,
}

#[derive(Codec, Default, Debug, PartialEq)]
#[codec(opaque)]
struct Celsius {
    tenths: i32,
}

#[derive(Codec, Default, Debug, PartialEq)]
struct Reading {
    station: u16,
    temperature: Celsius,
}

/// Claims `Celsius` and asks callers to tag every value.
struct TemperaturePlugin;

fn write_celsius(wire: &mut WireWriter<'_>, value: &dyn Any) -> objgraph::Result<()> {
    let celsius = value
        .downcast_ref::<Celsius>()
        .ok_or_else(|| CodecError::mismatch::<Celsius>())?;
    wire.write_i32(celsius.tenths)
}

fn read_celsius(wire: &mut WireReader<'_>, slot: &mut dyn Any) -> objgraph::Result<bool> {
    let tenths = wire.read_i32()?;
    let celsius = slot
        .downcast_mut::<Celsius>()
        .ok_or_else(|| CodecError::mismatch::<Celsius>())?;
    celsius.tenths = tenths;
    Ok(true)
}

impl CapabilityPlugin for TemperaturePlugin {
    fn name(&self) -> &str {
        "temperature"
    }

    fn handles(&self, shape: &TypeShape) -> bool {
        shape.type_id == TypeId::of::<Celsius>()
    }

    fn convention(&self, _shape: &TypeShape) -> CallConvention {
        CallConvention::Indirect
    }

    fn bind(&self, _shape: &TypeShape, _cx: &BindContext<'_>) -> objgraph::Result<Binding> {
        Ok(Binding::Static {
            write: write_celsius,
            read: read_celsius,
        })
    }
}

#[test]
fn test_init_is_one_shot() {
    let codec = ObjectCodec::new(CodecConfig::default());
    assert!(matches!(
        codec.to_bytes(&Point::default()),
        Err(CodecError::NotInitialized)
    ));

    codec
        .initialize(&Roots::new().with::<Point>())
        .expect("first init");
    let err = codec
        .initialize(&Roots::new().with::<Polygon>())
        .expect_err("second init must fail");
    assert!(matches!(err, CodecError::AlreadyInitialized));
    assert_eq!(err.category(), ErrorCategory::Configuration);

    // The first registry stays in place.
    assert!(codec.tag_of::<Point>().is_ok());
    assert!(matches!(
        codec.tag_of::<Polygon>(),
        Err(CodecError::UnknownType(_))
    ));
}

#[test]
fn test_failed_init_can_be_retried() {
    let codec = ObjectCodec::new(CodecConfig::default());
    let err = codec
        .initialize(&Roots::new().with::<Device>())
        .expect_err("opaque member is ineligible");
    match err {
        CodecError::Ineligible { type_name, .. } => assert!(type_name.contains("Handle")),
        other => panic!("expected Ineligible, got {other:?}"),
    }
    assert!(!codec.is_initialized());

    codec
        .initialize(&Roots::new().with::<Point>())
        .expect("retry with eligible roots");
    assert!(codec.is_initialized());
}

#[test]
fn test_plugin_configuration_errors() {
    let conflicting = CodecConfig::default()
        .plugin(NoopPlugin::new::<Handle>().named("drop-a"))
        .plugin(NoopPlugin::new::<Handle>().named("drop-b"));
    let err = ObjectCodec::builder()
        .config(conflicting)
        .root::<Device>()
        .build()
        .err()
        .expect("two plugins claim Handle");
    match err {
        CodecError::ConflictingPlugins { first, second, .. } => {
            assert_eq!((first.as_str(), second.as_str()), ("drop-a", "drop-b"));
        }
        other => panic!("expected ConflictingPlugins, got {other:?}"),
    }

    let duplicate = CodecConfig::default()
        .plugin(NoopPlugin::new::<Handle>().named("drop"))
        .plugin(NoopPlugin::new::<Point>().named("drop"));
    assert!(matches!(
        ObjectCodec::builder().config(duplicate).root::<Device>().build(),
        Err(CodecError::DuplicatePlugin(name)) if name == "drop"
    ));

    // Shadowing a built-in plugin name is also a duplicate.
    let shadow = CodecConfig::default().plugin(NoopPlugin::new::<Handle>().named("aggregate"));
    assert!(matches!(
        ObjectCodec::builder().config(shadow).root::<Device>().build(),
        Err(CodecError::DuplicatePlugin(_))
    ));
}

#[test]
fn test_duplicate_canonical_name() {
    let err = ObjectCodec::builder()
        .root::<Inventory>()
        .build()
        .err()
        .expect("two types share a name");
    assert!(matches!(err, CodecError::DuplicateTypeName(name) if name == "shared.Item"));
}

#[test]
fn test_tags_ignore_root_order() {
    let forward = ObjectCodec::builder()
        .root::<Point>()
        .root::<Polygon>()
        .build()
        .expect("codec");
    let backward = ObjectCodec::builder()
        .root::<Polygon>()
        .root::<Point>()
        .build()
        .expect("codec");

    let names = |codec: &ObjectCodec| -> Vec<(u16, String)> {
        codec
            .registry()
            .expect("initialized")
            .descriptors()
            .iter()
            .map(|d| (d.tag, d.name.to_string()))
            .collect()
    };
    assert_eq!(names(&forward), names(&backward));

    // Bytes written by one decode with the other.
    let polygon = Polygon {
        name: "tri".into(),
        corners: vec![Point { x: 0, y: 0 }, Point { x: 4, y: 0 }, Point { x: 0, y: 3 }],
        outline: None,
    };
    let bytes = forward.to_bytes(&polygon).expect("serialize");
    let back: Polygon = backward
        .from_bytes(&bytes)
        .expect("deserialize")
        .expect("non-null");
    assert_eq!(back.name, polygon.name);
    assert_eq!(back.corners, polygon.corners);
    assert!(back.outline.is_none());
}

#[test]
fn test_descriptor_introspection() {
    let codec = ObjectCodec::builder().root::<Polygon>().build().expect("codec");
    let registry = codec.registry().expect("initialized");

    // Built-in primitives keep their fixed tags; user types follow them.
    let point = registry
        .descriptor_of(TypeId::of::<Point>())
        .expect("Point reached through Vec<Point>");
    assert!(point.tag > 21);
    assert_eq!(point.plugin, "aggregate");
    assert_eq!(point.origin, ProcedureOrigin::Synthesized);
    assert!(point.is_referenceable());
    assert!(!point.nullable);

    let reference = registry
        .descriptor_of(TypeId::of::<Ref<Polygon>>())
        .expect("Ref<Polygon> registered");
    assert_eq!(reference.plugin, "reference");
    assert!(reference.nullable);

    for type_id in [TypeId::of::<Vec<Point>>(), TypeId::of::<Option<Ref<Polygon>>>()] {
        assert!(registry.tag_of(type_id).is_some());
    }

    let mut tags: Vec<u16> = registry.descriptors().iter().map(|d| d.tag).collect();
    tags.dedup();
    assert_eq!(tags, (1..=registry.len() as u16).collect::<Vec<_>>());
}

#[test]
fn test_indirect_convention_tags_member() {
    let codec = ObjectCodec::builder()
        .plugin(TemperaturePlugin)
        .root::<Reading>()
        .build()
        .expect("plugin claims the opaque member");
    let celsius_tag = codec.tag_of::<Celsius>().expect("Celsius registered");
    let registry = codec.registry().expect("initialized");
    let descriptor = registry.descriptor(celsius_tag).expect("descriptor");
    assert_eq!(descriptor.convention, CallConvention::Indirect);
    assert_eq!(descriptor.origin, ProcedureOrigin::Builtin);
    assert_eq!(descriptor.plugin, "temperature");

    let reading = Reading {
        station: 3,
        temperature: Celsius { tenths: -5 },
    };
    let mut bytes = Vec::new();
    codec
        .serialize_direct(&mut bytes, &reading)
        .expect("serialize");
    assert_eq!(bytes, vec![0x03, celsius_tag as u8, 0x09]);

    let mut input = bytes.as_slice();
    let back: Reading = codec.deserialize_direct(&mut input).expect("deserialize");
    assert_eq!(back, reading);

    // A zero tag leaves the member at its default.
    let mut input: &[u8] = &[0x03, 0x00];
    let back: Reading = codec.deserialize_direct(&mut input).expect("deserialize");
    assert_eq!(back.temperature, Celsius::default());
}
