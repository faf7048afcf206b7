// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Stream writer for the primitive wire encodings.

use super::values::{datetime_to_ticks, is_tick_aligned, timedelta_to_ticks, Decimal, Uri};
use super::varint::{
    encode_varint, zigzag_encode_i16, zigzag_encode_i32, zigzag_encode_i64, MAX_VARINT_LEN,
};
use crate::config::NULL_TAG;
use crate::error::{CodecError, CodecResult};
use chrono::{DateTime, TimeDelta, Utc};
use std::io::Write;
use uuid::Uuid;

/// Generate varint writers for unsigned widths.
macro_rules! impl_write_unsigned {
    ($name:ident, $type:ty) => {
        pub fn $name(&mut self, value: $type) -> CodecResult<()> {
            self.write_varint(value as u64)
        }
    };
}

/// Generate zig-zag varint writers for signed widths.
macro_rules! impl_write_signed {
    ($name:ident, $type:ty, $zigzag:ident) => {
        pub fn $name(&mut self, value: $type) -> CodecResult<()> {
            self.write_varint(u64::from($zigzag(value)))
        }
    };
}

/// Writer over any `io::Write`, tracking the byte offset for diagnostics.
pub struct WireWriter<'a> {
    inner: &'a mut dyn Write,
    offset: u64,
}

impl<'a> WireWriter<'a> {
    pub fn new(inner: &'a mut dyn Write) -> Self {
        Self { inner, offset: 0 }
    }

    /// Bytes written so far.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn write_bytes(&mut self, data: &[u8]) -> CodecResult<()> {
        self.inner.write_all(data)?;
        self.offset += data.len() as u64;
        Ok(())
    }

    pub fn write_u8(&mut self, value: u8) -> CodecResult<()> {
        self.write_bytes(&[value])
    }

    pub fn write_i8(&mut self, value: i8) -> CodecResult<()> {
        self.write_bytes(&value.to_le_bytes())
    }

    pub fn write_varint(&mut self, value: u64) -> CodecResult<()> {
        let mut buf = [0u8; MAX_VARINT_LEN];
        let len = encode_varint(value, &mut buf);
        self.write_bytes(&buf[..len])
    }

    impl_write_unsigned!(write_u16, u16);
    impl_write_unsigned!(write_u32, u32);
    impl_write_unsigned!(write_u64, u64);
    impl_write_unsigned!(write_usize, usize);

    impl_write_signed!(write_i16, i16, zigzag_encode_i16);
    impl_write_signed!(write_i32, i32, zigzag_encode_i32);
    impl_write_signed!(write_i64, i64, zigzag_encode_i64);

    pub fn write_isize(&mut self, value: isize) -> CodecResult<()> {
        self.write_i64(value as i64)
    }

    pub fn write_bool(&mut self, value: bool) -> CodecResult<()> {
        self.write_u8(u8::from(value))
    }

    /// 0 = absent, 1 = false, 2 = true.
    pub fn write_opt_bool(&mut self, value: Option<bool>) -> CodecResult<()> {
        self.write_u8(value.map_or(0, |v| u8::from(v) + 1))
    }

    pub fn write_f32(&mut self, value: f32) -> CodecResult<()> {
        self.write_varint(u64::from(value.to_bits()))
    }

    pub fn write_f64(&mut self, value: f64) -> CodecResult<()> {
        self.write_varint(value.to_bits())
    }

    pub fn write_char(&mut self, value: char) -> CodecResult<()> {
        self.write_u32(u32::from(value))
    }

    /// Type tag; `None` writes the null tag.
    pub fn write_tag(&mut self, tag: Option<u16>) -> CodecResult<()> {
        self.write_varint(tag.map_or(NULL_TAG, u64::from))
    }

    /// Length prefix shared by strings, byte buffers and arrays:
    /// `len + 1`, or 0 for null.
    pub fn write_length(&mut self, len: Option<usize>) -> CodecResult<()> {
        self.write_varint(len.map_or(NULL_TAG, |len| len as u64 + 1))
    }

    pub fn write_str(&mut self, value: &str) -> CodecResult<()> {
        self.write_opt_str(Some(value))
    }

    /// Byte length + 1, char count, UTF-8 bytes. `None` writes the null marker.
    pub fn write_opt_str(&mut self, value: Option<&str>) -> CodecResult<()> {
        let Some(value) = value else {
            return self.write_length(None);
        };
        self.write_length(Some(value.len()))?;
        if value.is_empty() {
            return Ok(());
        }
        self.write_usize(value.chars().count())?;
        self.write_bytes(value.as_bytes())
    }

    pub fn write_byte_buffer(&mut self, value: Option<&[u8]>) -> CodecResult<()> {
        let Some(bytes) = value else {
            return self.write_length(None);
        };
        self.write_length(Some(bytes.len()))?;
        self.write_bytes(bytes)
    }

    pub fn write_decimal(&mut self, value: &Decimal) -> CodecResult<()> {
        self.write_byte_buffer(Some(&value.to_bytes()))
    }

    pub fn write_uuid(&mut self, value: &Uuid) -> CodecResult<()> {
        self.write_byte_buffer(Some(value.as_bytes()))
    }

    /// Instants are stored as 100 ns ticks; finer instants are rejected
    /// rather than rounded.
    pub fn write_datetime(&mut self, value: &DateTime<Utc>) -> CodecResult<()> {
        if !is_tick_aligned(i64::from(value.timestamp_subsec_nanos())) {
            return Err(self.invalid(format!("{} is not a whole number of 100 ns ticks", value)));
        }
        let ticks = datetime_to_ticks(value).ok_or_else(|| {
            self.invalid(format!("{} is outside the 64-bit tick range", value))
        })?;
        self.write_i64(ticks)
    }

    pub fn write_timedelta(&mut self, value: &TimeDelta) -> CodecResult<()> {
        if !is_tick_aligned(i64::from(value.subsec_nanos())) {
            return Err(self.invalid(format!("{} is not a whole number of 100 ns ticks", value)));
        }
        let ticks = timedelta_to_ticks(value).ok_or_else(|| {
            self.invalid(format!("{} is outside the 64-bit tick range", value))
        })?;
        self.write_i64(ticks)
    }

    pub fn write_uri(&mut self, value: &Uri) -> CodecResult<()> {
        self.write_str(value.as_str())
    }

    fn invalid(&self, reason: String) -> CodecError {
        CodecError::InvalidData {
            offset: self.offset,
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn written(f: impl FnOnce(&mut WireWriter<'_>) -> CodecResult<()>) -> Vec<u8> {
        let mut out = Vec::new();
        let mut writer = WireWriter::new(&mut out);
        f(&mut writer).expect("write should succeed");
        out
    }

    #[test]
    fn test_integer_layouts() {
        assert_eq!(written(|w| w.write_i32(-1)), vec![0x01]);
        assert_eq!(written(|w| w.write_i32(300)), vec![0xD8, 0x04]);
        assert_eq!(written(|w| w.write_u32(300)), vec![0xAC, 0x02]);
        assert_eq!(written(|w| w.write_u8(0xFF)), vec![0xFF]);
        assert_eq!(written(|w| w.write_i8(-2)), vec![0xFE]);
        assert_eq!(written(|w| w.write_isize(-1)), vec![0x01]);
    }

    #[test]
    fn test_string_layouts() {
        assert_eq!(written(|w| w.write_opt_str(None)), vec![0x00]);
        assert_eq!(written(|w| w.write_str("")), vec![0x01]);
        assert_eq!(written(|w| w.write_str("hi")), vec![0x03, 0x02, b'h', b'i']);
        // Two chars, three UTF-8 bytes
        assert_eq!(
            written(|w| w.write_str("\u{e9}a")),
            vec![0x04, 0x02, 0xC3, 0xA9, b'a']
        );
    }

    #[test]
    fn test_buffer_and_bool_layouts() {
        assert_eq!(written(|w| w.write_byte_buffer(None)), vec![0x00]);
        assert_eq!(written(|w| w.write_byte_buffer(Some(&[]))), vec![0x01]);
        assert_eq!(written(|w| w.write_byte_buffer(Some(&[7, 8]))), vec![0x03, 7, 8]);
        assert_eq!(written(|w| w.write_bool(true)), vec![0x01]);
        assert_eq!(written(|w| w.write_opt_bool(None)), vec![0x00]);
        assert_eq!(written(|w| w.write_opt_bool(Some(false))), vec![0x01]);
        assert_eq!(written(|w| w.write_opt_bool(Some(true))), vec![0x02]);
    }

    #[test]
    fn test_offset_tracking() {
        let mut out = Vec::new();
        let mut writer = WireWriter::new(&mut out);
        writer.write_u64(u64::MAX).expect("write should succeed");
        assert_eq!(writer.offset(), 10);
        writer.write_tag(None).expect("write should succeed");
        assert_eq!(writer.offset(), 11);
    }

    #[test]
    fn test_decimal_and_uuid_use_byte_buffer_form() {
        let bytes = written(|w| w.write_decimal(&Decimal::ZERO));
        assert_eq!(bytes.len(), 17);
        assert_eq!(bytes[0], 17);

        let id = Uuid::from_u128(0x0011_2233_4455_6677_8899_AABB_CCDD_EEFF);
        let bytes = written(|w| w.write_uuid(&id));
        assert_eq!(bytes[0], 17);
        assert_eq!(&bytes[1..], id.as_bytes());
    }

    #[test]
    fn test_sub_tick_times_are_rejected() {
        let mut out = Vec::new();
        let mut writer = WireWriter::new(&mut out);

        let fine = DateTime::from_timestamp(1_700_000_000, 123_456_789).expect("valid instant");
        assert!(matches!(
            writer.write_datetime(&fine),
            Err(CodecError::InvalidData { offset: 0, .. })
        ));
        assert!(matches!(
            writer.write_timedelta(&TimeDelta::nanoseconds(1)),
            Err(CodecError::InvalidData { .. })
        ));
        assert!(matches!(
            writer.write_timedelta(&TimeDelta::nanoseconds(-150)),
            Err(CodecError::InvalidData { .. })
        ));
        assert_eq!(writer.offset(), 0);

        let aligned = DateTime::from_timestamp(1_700_000_000, 123_456_700).expect("valid instant");
        writer.write_datetime(&aligned).expect("tick-aligned instant");
        writer
            .write_timedelta(&TimeDelta::nanoseconds(-300))
            .expect("tick-aligned duration");
        assert!(writer.offset() > 0);
    }
}
