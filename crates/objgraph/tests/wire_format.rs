// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::float_cmp)] // Bit-exact float assertions
#![allow(clippy::unreadable_literal)] // Raw bit patterns
#![allow(clippy::missing_panics_doc)] // Tests panic on failure

//! Byte-level encoding tests through the public codec API.
//!
//! Covers the wire table: aggregates without field tags, zig-zag integers,
//! bit-exact floats, length-prefixed strings/arrays, presence bytes, maps,
//! enums, and composite values, plus the protocol errors raised by
//! malformed input.

use chrono::{DateTime, TimeDelta, Utc};
use objgraph::wire::WireWriter;
use objgraph::{Codec, CodecError, Decimal, Describe, NoopPlugin, ObjectCodec, Uri};
use std::collections::{BTreeMap, HashMap};
use std::io::{BufReader, Seek, SeekFrom};
use uuid::Uuid;

#[derive(Codec, Default, Debug, Clone, PartialEq)]
struct Point {
    x: i32,
    y: i32,
}

#[derive(Codec, Default, Debug, Clone, PartialEq)]
struct Pixel {
    x: i32,
    y: u32,
}

#[derive(Codec, Default, Debug, Clone, Copy, PartialEq)]
#[repr(u8)]
enum Mode {
    #[default]
    Idle = 0,
    Run = 5,
}

#[derive(Codec, Default, Debug, Clone, Copy, PartialEq)]
enum Level {
    Low = -1,
    #[default]
    Mid,
    High,
}

#[derive(Codec, Default, Debug, Clone, PartialEq)]
struct Record {
    amount: Decimal,
    id: Uuid,
    at: DateTime<Utc>,
    took: TimeDelta,
    link: Uri,
    payload: Vec<u8>,
    note: Option<String>,
    level: Level,
}

#[derive(Codec, Default, Debug, Clone, PartialEq)]
struct Ordered {
    #[codec(base)]
    zeta: u8,
    alpha: u8,
    mid: u8,
}

#[derive(Codec, Default, Debug, Clone, PartialEq)]
struct Meters(f64);

#[derive(Codec, Default, Debug, Clone, PartialEq)]
#[codec(opaque)]
struct Session {
    id: u64,
}

fn codec_for<T: Describe>() -> ObjectCodec {
    ObjectCodec::builder()
        .root::<T>()
        .build()
        .expect("codec should initialize")
}

fn direct<T: Describe>(codec: &ObjectCodec, value: &T) -> Vec<u8> {
    let mut buf = Vec::new();
    codec
        .serialize_direct(&mut buf, value)
        .expect("serialize_direct should succeed");
    buf
}

fn read_direct<T: Describe>(codec: &ObjectCodec, bytes: &[u8]) -> Result<T, CodecError> {
    let mut input = bytes;
    codec.deserialize_direct(&mut input)
}

#[test]
fn test_point_payload_bytes() {
    let codec = codec_for::<Point>();
    let point = Point { x: -1, y: 300 };

    // Signed members are zig-zag folded: -1 -> 1, 300 -> 600.
    assert_eq!(direct(&codec, &point), vec![0x01, 0xD8, 0x04]);
    assert_eq!(read_direct::<Point>(&codec, &[0x01, 0xD8, 0x04]).expect("decode"), point);

    // Point is the only non-primitive type, so it takes the first free tag.
    assert_eq!(codec.tag_of::<Point>().expect("registered"), 22);
    let tagged = codec.to_bytes(&point).expect("serialize");
    assert_eq!(tagged, vec![22, 0x01, 0xD8, 0x04]);
    assert_eq!(codec.from_bytes::<Point>(&tagged).expect("decode"), Some(point));
}

#[test]
fn test_unsigned_member_is_plain_varint() {
    let codec = codec_for::<Pixel>();
    let pixel = Pixel { x: -1, y: 300 };
    assert_eq!(direct(&codec, &pixel), vec![0x01, 0xAC, 0x02]);
    assert_eq!(read_direct::<Pixel>(&codec, &[0x01, 0xAC, 0x02]).expect("decode"), pixel);
}

#[test]
fn test_member_order_is_base_then_name() {
    let codec = codec_for::<Ordered>();
    let value = Ordered {
        zeta: 1,
        alpha: 2,
        mid: 3,
    };
    assert_eq!(direct(&codec, &value), vec![1, 2, 3]);
}

#[test]
fn test_strings() {
    let codec = codec_for::<String>();
    assert_eq!(direct(&codec, &String::new()), vec![0x01]);
    assert_eq!(
        direct(&codec, &"héllo".to_string()),
        vec![0x07, 0x05, b'h', 0xC3, 0xA9, b'l', b'l', b'o']
    );
    assert_eq!(read_direct::<String>(&codec, &[0x01]).expect("empty"), "");
    assert_eq!(
        read_direct::<String>(&codec, &[0x07, 0x05, b'h', 0xC3, 0xA9, b'l', b'l', b'o'])
            .expect("decode"),
        "héllo"
    );

    // Declared char count disagrees with the text.
    assert!(matches!(
        read_direct::<String>(&codec, &[0x03, 0x05, b'a', b'b']),
        Err(CodecError::InvalidData { .. })
    ));
}

#[test]
fn test_null_empty_and_single_arrays_differ() {
    let codec = codec_for::<Option<Vec<i32>>>();
    let cases: [(Option<Vec<i32>>, Vec<u8>); 3] = [
        (None, vec![0x00]),
        (Some(Vec::new()), vec![0x01]),
        (Some(vec![7]), vec![0x02, 0x0E]),
    ];
    for (value, bytes) in cases {
        assert_eq!(direct(&codec, &value), bytes);
        assert_eq!(read_direct::<Option<Vec<i32>>>(&codec, &bytes).expect("decode"), value);
    }
}

#[test]
fn test_absent_and_present_zero_optional() {
    let codec = codec_for::<Option<i32>>();
    assert_eq!(direct(&codec, &None::<i32>), vec![0x00]);
    assert_eq!(direct(&codec, &Some(0i32)), vec![0x01, 0x00]);
    assert_eq!(read_direct::<Option<i32>>(&codec, &[0x00]).expect("absent"), None);
    assert_eq!(read_direct::<Option<i32>>(&codec, &[0x01, 0x00]).expect("zero"), Some(0));
    assert!(matches!(
        read_direct::<Option<i32>>(&codec, &[0x07]),
        Err(CodecError::InvalidData { .. })
    ));

    let codec = codec_for::<Option<bool>>();
    for (value, byte) in [(None, 0u8), (Some(false), 1), (Some(true), 2)] {
        assert_eq!(direct(&codec, &value), vec![byte]);
        assert_eq!(read_direct::<Option<bool>>(&codec, &[byte]).expect("decode"), value);
    }
}

#[test]
fn test_optional_string_uses_string_marker() {
    let codec = codec_for::<Option<String>>();
    assert_eq!(direct(&codec, &None::<String>), vec![0x00]);
    assert_eq!(direct(&codec, &Some(String::new())), vec![0x01]);
    assert_eq!(
        read_direct::<Option<String>>(&codec, &[0x01]).expect("decode"),
        Some(String::new())
    );
}

#[test]
fn test_bit_exact_floats() {
    let codec = codec_for::<Meters>();
    let specials = [
        f64::from_bits(0x7FF8_0000_0000_0001),
        -0.0,
        0.0,
        f64::INFINITY,
        f64::NEG_INFINITY,
        f64::MIN_POSITIVE,
        f64::EPSILON,
    ];
    for value in specials {
        let bytes = direct(&codec, &Meters(value));
        let back = read_direct::<Meters>(&codec, &bytes).expect("decode");
        assert_eq!(back.0.to_bits(), value.to_bits());
    }

    let codec = codec_for::<f32>();
    let nan = f32::from_bits(0x7FC0_0001);
    let back = read_direct::<f32>(&codec, &direct(&codec, &nan)).expect("decode");
    assert_eq!(back.to_bits(), nan.to_bits());
}

#[test]
fn test_random_integer_sweep() {
    let codec = ObjectCodec::builder().build().expect("codec");
    let mut rng = fastrand::Rng::with_seed(0x0b1e_c7);
    for _ in 0..500 {
        let signed = rng.i64(..);
        let unsigned = rng.u64(..);
        let narrow = rng.i16(..);
        let float = f64::from_bits(rng.u64(..));

        assert_eq!(read_direct::<i64>(&codec, &direct(&codec, &signed)).expect("i64"), signed);
        assert_eq!(read_direct::<u64>(&codec, &direct(&codec, &unsigned)).expect("u64"), unsigned);
        assert_eq!(read_direct::<i16>(&codec, &direct(&codec, &narrow)).expect("i16"), narrow);
        assert_eq!(
            read_direct::<f64>(&codec, &direct(&codec, &float)).expect("f64").to_bits(),
            float.to_bits()
        );
    }
    for value in [i64::MIN, i64::MAX, 0, -1] {
        assert_eq!(read_direct::<i64>(&codec, &direct(&codec, &value)).expect("i64"), value);
    }
}

#[test]
fn test_map_round_trip_ignores_order() {
    let codec = codec_for::<HashMap<String, i32>>();
    let map: HashMap<String, i32> = (0..50).map(|i| (format!("key-{}", i), i * 7 - 100)).collect();
    let bytes = codec.to_bytes(&map).expect("serialize");
    let back: HashMap<String, i32> = codec
        .from_bytes(&bytes)
        .expect("deserialize")
        .expect("non-null");
    assert_eq!(back, map);

    let codec = codec_for::<BTreeMap<u8, bool>>();
    let map = BTreeMap::from([(1u8, true), (2u8, false)]);
    assert_eq!(direct(&codec, &map), vec![0x03, 0x01, 0x01, 0x02, 0x00]);
    assert_eq!(
        read_direct::<BTreeMap<u8, bool>>(&codec, &[0x03, 0x01, 0x01, 0x02, 0x00]).expect("decode"),
        map
    );
}

#[test]
fn test_enum_discriminants() {
    let codec = codec_for::<Mode>();
    assert_eq!(direct(&codec, &Mode::Run), vec![0x05]);
    assert_eq!(read_direct::<Mode>(&codec, &[0x05]).expect("decode"), Mode::Run);
    assert_eq!(read_direct::<Mode>(&codec, &[0x00]).expect("decode"), Mode::Idle);
    assert!(matches!(
        read_direct::<Mode>(&codec, &[0x03]),
        Err(CodecError::InvalidData { .. })
    ));

    let codec = codec_for::<Level>();
    assert_eq!(direct(&codec, &Level::Low), vec![0x01]);
    assert_eq!(direct(&codec, &Level::High), vec![0x02]);
    assert_eq!(read_direct::<Level>(&codec, &[0x00]).expect("decode"), Level::Mid);
}

#[test]
fn test_composite_values_round_trip() {
    let codec = codec_for::<Record>();
    let record = Record {
        amount: Decimal::new(-123_456_789, 4).expect("valid decimal"),
        id: Uuid::new_v4(),
        at: DateTime::from_timestamp(1_700_000_000, 123_456_700).expect("valid timestamp"),
        took: TimeDelta::milliseconds(-1500),
        link: Uri::parse("https://example.org/a?b=c").expect("valid uri"),
        payload: vec![0, 1, 2, 255],
        note: Some("ok".to_string()),
        level: Level::High,
    };
    let bytes = codec.to_bytes(&record).expect("serialize");
    let back: Record = codec
        .from_bytes(&bytes)
        .expect("deserialize")
        .expect("non-null");
    assert_eq!(back, record);
}

#[test]
fn test_nanosecond_times_are_not_rounded() {
    let codec = codec_for::<Record>();
    let mut record = Record {
        amount: Decimal::ZERO,
        id: Uuid::nil(),
        at: DateTime::from_timestamp(1_700_000_000, 123_456_701).expect("valid timestamp"),
        took: TimeDelta::zero(),
        link: Uri::default(),
        payload: Vec::new(),
        note: None,
        level: Level::High,
    };
    assert!(matches!(
        codec.to_bytes(&record),
        Err(CodecError::InvalidData { .. })
    ));

    record.at = DateTime::from_timestamp(1_700_000_000, 0).expect("valid timestamp");
    record.took = TimeDelta::nanoseconds(1);
    assert!(matches!(
        codec.to_bytes(&record),
        Err(CodecError::InvalidData { .. })
    ));

    record.took = TimeDelta::nanoseconds(100);
    let bytes = codec.to_bytes(&record).expect("serialize");
    let back: Record = codec
        .from_bytes(&bytes)
        .expect("deserialize")
        .expect("non-null");
    assert_eq!(back, record);
}

#[test]
fn test_protocol_errors() {
    let codec = codec_for::<Point>();

    let truncated = [22u8, 0x01, 0xD8];
    assert!(matches!(
        codec.from_bytes::<Point>(&truncated),
        Err(CodecError::EndOfStream { .. })
    ));

    let err = codec.from_bytes::<Point>(&[200]).expect_err("tag 200 is unknown");
    assert!(matches!(err, CodecError::UnknownTag { tag: 200, offset: 0 }));
    assert!(err.is_protocol());

    // 70000 does not fit a 16-bit tag.
    assert!(matches!(
        codec.from_bytes::<Point>(&[0xF0, 0xA2, 0x04]),
        Err(CodecError::UnknownTag { tag: 70000, .. })
    ));

    assert!(matches!(
        read_direct::<char>(&codec, &[0x80, 0xB0, 0x03]),
        Err(CodecError::InvalidData { .. })
    ));
    assert!(matches!(
        read_direct::<bool>(&codec, &[0x02]),
        Err(CodecError::InvalidData { .. })
    ));
}

#[test]
fn test_forged_length_of_zero_width_elements() {
    let codec = ObjectCodec::builder()
        .plugin(NoopPlugin::new::<Session>())
        .root::<Vec<Session>>()
        .build()
        .expect("noop plugin claims Session");

    // Zero-width elements decode to defaults.
    assert_eq!(direct(&codec, &vec![Session { id: 9 }; 3]), vec![0x04]);
    let back: Vec<Session> = read_direct(&codec, &[0x04]).expect("decode");
    assert_eq!(back, vec![Session::default(); 3]);

    let mut forged = Vec::new();
    WireWriter::new(&mut forged)
        .write_length(Some(u32::MAX as usize))
        .expect("write length");
    assert!(matches!(
        read_direct::<Vec<Session>>(&codec, &forged),
        Err(CodecError::InvalidData { offset: 0, .. })
    ));
}

#[test]
fn test_unregistered_type_is_usage_error() {
    let codec = codec_for::<Point>();
    let err = codec.to_bytes(&vec![1u32]).expect_err("Vec<u32> is not registered");
    assert!(matches!(err, CodecError::UnknownType(_)));
    assert_eq!(err.category(), objgraph::ErrorCategory::Usage);
}

#[test]
fn test_file_backed_stream() {
    let codec = ObjectCodec::builder()
        .root::<Point>()
        .root::<Record>()
        .build()
        .expect("codec");
    let points: Vec<Point> = (0..20).map(|i| Point { x: -i, y: i * i }).collect();

    let mut file = tempfile::tempfile().expect("temp file");
    for point in &points {
        codec.serialize(&mut file, point).expect("serialize");
    }
    codec.serialize_dyn(&mut file, None).expect("terminator");
    file.seek(SeekFrom::Start(0)).expect("rewind");

    let mut reader = BufReader::new(file);
    let mut decoded = Vec::new();
    while let Some(point) = codec.deserialize_as::<Point, _>(&mut reader).expect("deserialize") {
        decoded.push(point);
    }
    assert_eq!(decoded, points);
}
