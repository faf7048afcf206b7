// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Static procedures for the primitive set.

use super::{Binding, CapabilityPlugin, StaticRead, StaticWrite};
use crate::error::{CodecError, CodecResult};
use crate::registry::BindContext;
use crate::types::{PrimitiveKind, TypeKind, TypeShape};
use crate::wire::{Decimal, Uri, WireReader, WireWriter};
use chrono::{DateTime, TimeDelta, Utc};
use std::any::Any;
use uuid::Uuid;

/// Generate a write/read pair for a `Copy` primitive.
macro_rules! copy_codec {
    ($write:ident, $read:ident, $type:ty, $put:ident, $get:ident) => {
        fn $write(wire: &mut WireWriter<'_>, value: &dyn Any) -> CodecResult<()> {
            let value = value
                .downcast_ref::<$type>()
                .ok_or_else(CodecError::mismatch::<$type>)?;
            wire.$put(*value)
        }

        fn $read(wire: &mut WireReader<'_>, slot: &mut dyn Any) -> CodecResult<bool> {
            let value = wire.$get()?;
            *slot
                .downcast_mut::<$type>()
                .ok_or_else(CodecError::mismatch::<$type>)? = value;
            Ok(true)
        }
    };
}

/// Generate a write/read pair for a primitive written by reference.
macro_rules! ref_codec {
    ($write:ident, $read:ident, $type:ty, $put:ident, $get:ident) => {
        fn $write(wire: &mut WireWriter<'_>, value: &dyn Any) -> CodecResult<()> {
            let value = value
                .downcast_ref::<$type>()
                .ok_or_else(CodecError::mismatch::<$type>)?;
            wire.$put(value)
        }

        fn $read(wire: &mut WireReader<'_>, slot: &mut dyn Any) -> CodecResult<bool> {
            let value = wire.$get()?;
            *slot
                .downcast_mut::<$type>()
                .ok_or_else(CodecError::mismatch::<$type>)? = value;
            Ok(true)
        }
    };
}

copy_codec!(write_bool, read_bool, bool, write_bool, read_bool);
copy_codec!(write_u8, read_u8, u8, write_u8, read_u8);
copy_codec!(write_i8, read_i8, i8, write_i8, read_i8);
copy_codec!(write_u16, read_u16, u16, write_u16, read_u16);
copy_codec!(write_i16, read_i16, i16, write_i16, read_i16);
copy_codec!(write_u32, read_u32, u32, write_u32, read_u32);
copy_codec!(write_i32, read_i32, i32, write_i32, read_i32);
copy_codec!(write_u64, read_u64, u64, write_u64, read_u64);
copy_codec!(write_i64, read_i64, i64, write_i64, read_i64);
copy_codec!(write_usize, read_usize, usize, write_usize, read_usize);
copy_codec!(write_isize, read_isize, isize, write_isize, read_isize);
copy_codec!(write_f32, read_f32, f32, write_f32, read_f32);
copy_codec!(write_f64, read_f64, f64, write_f64, read_f64);
copy_codec!(write_char, read_char, char, write_char, read_char);
ref_codec!(write_decimal, read_decimal, Decimal, write_decimal, read_decimal);
ref_codec!(write_datetime, read_datetime, DateTime<Utc>, write_datetime, read_datetime);
ref_codec!(write_timedelta, read_timedelta, TimeDelta, write_timedelta, read_timedelta);
ref_codec!(write_uuid, read_uuid, Uuid, write_uuid, read_uuid);

fn write_string(wire: &mut WireWriter<'_>, value: &dyn Any) -> CodecResult<()> {
    let value = value
        .downcast_ref::<String>()
        .ok_or_else(CodecError::mismatch::<String>)?;
    wire.write_str(value)
}

// A null string decodes as "not present": the slot keeps its default.
fn read_string(wire: &mut WireReader<'_>, slot: &mut dyn Any) -> CodecResult<bool> {
    let Some(value) = wire.read_opt_string()? else {
        return Ok(false);
    };
    *slot
        .downcast_mut::<String>()
        .ok_or_else(CodecError::mismatch::<String>)? = value;
    Ok(true)
}

fn write_uri(wire: &mut WireWriter<'_>, value: &dyn Any) -> CodecResult<()> {
    let value = value
        .downcast_ref::<Uri>()
        .ok_or_else(CodecError::mismatch::<Uri>)?;
    wire.write_uri(value)
}

fn read_uri(wire: &mut WireReader<'_>, slot: &mut dyn Any) -> CodecResult<bool> {
    let Some(value) = wire.read_opt_uri()? else {
        return Ok(false);
    };
    *slot
        .downcast_mut::<Uri>()
        .ok_or_else(CodecError::mismatch::<Uri>)? = value;
    Ok(true)
}

/// `Vec<u8>` bulk path: the byte-buffer encoding, byte-identical to the
/// generic array encoding of `u8` elements.
pub(super) fn write_byte_vec(wire: &mut WireWriter<'_>, value: &dyn Any) -> CodecResult<()> {
    let value = value
        .downcast_ref::<Vec<u8>>()
        .ok_or_else(CodecError::mismatch::<Vec<u8>>)?;
    wire.write_byte_buffer(Some(value))
}

pub(super) fn read_byte_vec(wire: &mut WireReader<'_>, slot: &mut dyn Any) -> CodecResult<bool> {
    let Some(value) = wire.read_byte_buffer()? else {
        return Ok(false);
    };
    *slot
        .downcast_mut::<Vec<u8>>()
        .ok_or_else(CodecError::mismatch::<Vec<u8>>)? = value;
    Ok(true)
}

pub fn static_procedures(kind: PrimitiveKind) -> (StaticWrite, StaticRead) {
    match kind {
        PrimitiveKind::Bool => (write_bool, read_bool),
        PrimitiveKind::U8 => (write_u8, read_u8),
        PrimitiveKind::I8 => (write_i8, read_i8),
        PrimitiveKind::U16 => (write_u16, read_u16),
        PrimitiveKind::I16 => (write_i16, read_i16),
        PrimitiveKind::U32 => (write_u32, read_u32),
        PrimitiveKind::I32 => (write_i32, read_i32),
        PrimitiveKind::U64 => (write_u64, read_u64),
        PrimitiveKind::I64 => (write_i64, read_i64),
        PrimitiveKind::Usize => (write_usize, read_usize),
        PrimitiveKind::Isize => (write_isize, read_isize),
        PrimitiveKind::F32 => (write_f32, read_f32),
        PrimitiveKind::F64 => (write_f64, read_f64),
        PrimitiveKind::Char => (write_char, read_char),
        PrimitiveKind::String => (write_string, read_string),
        PrimitiveKind::Decimal => (write_decimal, read_decimal),
        PrimitiveKind::DateTime => (write_datetime, read_datetime),
        PrimitiveKind::TimeDelta => (write_timedelta, read_timedelta),
        PrimitiveKind::Uuid => (write_uuid, read_uuid),
        PrimitiveKind::Uri => (write_uri, read_uri),
    }
}

/// Write an enum discriminant with its representation's integer encoding.
pub(crate) fn write_integer(
    wire: &mut WireWriter<'_>,
    kind: PrimitiveKind,
    value: i64,
) -> CodecResult<()> {
    match kind {
        PrimitiveKind::U8 => wire.write_u8(value as u8),
        PrimitiveKind::I8 => wire.write_i8(value as i8),
        PrimitiveKind::U16 | PrimitiveKind::U32 | PrimitiveKind::U64 | PrimitiveKind::Usize => {
            wire.write_varint(value as u64)
        }
        PrimitiveKind::I16 | PrimitiveKind::I32 | PrimitiveKind::I64 | PrimitiveKind::Isize => {
            wire.write_i64(value)
        }
        other => Err(CodecError::mismatch_named(&format!("{:?} integer", other))),
    }
}

/// Read an enum discriminant, rejecting values outside the representation.
pub(crate) fn read_integer(wire: &mut WireReader<'_>, kind: PrimitiveKind) -> CodecResult<i64> {
    Ok(match kind {
        PrimitiveKind::U8 => i64::from(wire.read_u8()?),
        PrimitiveKind::I8 => i64::from(wire.read_i8()?),
        PrimitiveKind::U16 => i64::from(wire.read_u16()?),
        PrimitiveKind::U32 => i64::from(wire.read_u32()?),
        PrimitiveKind::U64 => wire.read_u64()? as i64,
        PrimitiveKind::Usize => wire.read_usize()? as i64,
        PrimitiveKind::I16 => i64::from(wire.read_i16()?),
        PrimitiveKind::I32 => i64::from(wire.read_i32()?),
        PrimitiveKind::I64 => wire.read_i64()?,
        PrimitiveKind::Isize => wire.read_isize()? as i64,
        other => return Err(CodecError::mismatch_named(&format!("{:?} integer", other))),
    })
}

/// Claims every `TypeKind::Primitive` shape.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrimitivePlugin;

impl CapabilityPlugin for PrimitivePlugin {
    fn name(&self) -> &str {
        "primitive"
    }

    fn handles(&self, shape: &TypeShape) -> bool {
        matches!(shape.kind, TypeKind::Primitive(_))
    }

    fn null_marker(&self, shape: &TypeShape) -> bool {
        matches!(shape.kind, TypeKind::Primitive(kind) if kind.is_nullable())
    }

    fn bind(&self, shape: &TypeShape, _cx: &BindContext<'_>) -> CodecResult<Binding> {
        match shape.kind {
            TypeKind::Primitive(kind) => {
                let (write, read) = static_procedures(kind);
                Ok(Binding::Static { write, read })
            }
            _ => Err(CodecError::MissingBinding(shape.name.to_string())),
        }
    }
}
