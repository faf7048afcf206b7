// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Stream reader for the primitive wire encodings.
//!
//! Every read either consumes exactly the bytes of one encoding or fails;
//! a short stream surfaces as `CodecError::EndOfStream` with the offset at
//! which the missing read started.

use super::values::{ticks_to_datetime, ticks_to_timedelta, Decimal, Uri};
use super::varint::{zigzag_decode_i16, zigzag_decode_i32, zigzag_decode_i64, MAX_VARINT_LEN};
use crate::config::{NULL_TAG, PREALLOC_LIMIT};
use crate::error::{CodecError, CodecResult};
use chrono::{DateTime, TimeDelta, Utc};
use std::io::{self, Read};
use uuid::Uuid;

/// Generate width-checked varint readers for unsigned widths.
macro_rules! impl_read_unsigned {
    ($name:ident, $type:ty) => {
        pub fn $name(&mut self) -> CodecResult<$type> {
            let start = self.offset;
            let value = self.read_varint()?;
            <$type>::try_from(value).map_err(|_| CodecError::InvalidData {
                offset: start,
                reason: format!("varint {} overflows {}", value, stringify!($type)),
            })
        }
    };
}

/// Generate zig-zag readers for signed widths.
macro_rules! impl_read_signed {
    ($name:ident, $type:ty, $raw:ident, $zigzag:ident) => {
        pub fn $name(&mut self) -> CodecResult<$type> {
            Ok($zigzag(self.$raw()?))
        }
    };
}

/// Reader over any `io::Read`, tracking the byte offset for diagnostics.
pub struct WireReader<'a> {
    inner: &'a mut dyn Read,
    offset: u64,
}

impl<'a> WireReader<'a> {
    pub fn new(inner: &'a mut dyn Read) -> Self {
        Self { inner, offset: 0 }
    }

    /// Bytes consumed so far.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// `InvalidData` at the current offset.
    pub fn invalid(&self, reason: impl Into<String>) -> CodecError {
        CodecError::InvalidData {
            offset: self.offset,
            reason: reason.into(),
        }
    }

    pub fn read_exact(&mut self, buf: &mut [u8]) -> CodecResult<()> {
        match self.inner.read_exact(buf) {
            Ok(()) => {
                self.offset += buf.len() as u64;
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(CodecError::EndOfStream {
                offset: self.offset,
            }),
            Err(e) => Err(CodecError::Io(e)),
        }
    }

    /// Read exactly `len` bytes without trusting `len` for the allocation.
    pub fn read_bytes(&mut self, len: usize) -> CodecResult<Vec<u8>> {
        let mut out = Vec::with_capacity(len.min(PREALLOC_LIMIT));
        let read = (&mut *self.inner)
            .take(len as u64)
            .read_to_end(&mut out)
            .map_err(CodecError::Io)?;
        if read < len {
            return Err(CodecError::EndOfStream {
                offset: self.offset + read as u64,
            });
        }
        self.offset += len as u64;
        Ok(out)
    }

    pub fn read_u8(&mut self) -> CodecResult<u8> {
        let mut buf = [0u8; 1];
        self.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    pub fn read_i8(&mut self) -> CodecResult<i8> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_varint(&mut self) -> CodecResult<u64> {
        let start = self.offset;
        let mut value = 0u64;
        for index in 0..MAX_VARINT_LEN {
            let byte = self.read_u8()?;
            let payload = u64::from(byte & 0x7F);
            if index == MAX_VARINT_LEN - 1 && payload > 1 {
                break;
            }
            value |= payload << (7 * index);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(CodecError::InvalidData {
            offset: start,
            reason: "varint overflows 64 bits".into(),
        })
    }

    impl_read_unsigned!(read_u16, u16);
    impl_read_unsigned!(read_u32, u32);
    impl_read_unsigned!(read_u64, u64);
    impl_read_unsigned!(read_usize, usize);

    impl_read_signed!(read_i16, i16, read_u16, zigzag_decode_i16);
    impl_read_signed!(read_i32, i32, read_u32, zigzag_decode_i32);
    impl_read_signed!(read_i64, i64, read_u64, zigzag_decode_i64);

    pub fn read_isize(&mut self) -> CodecResult<isize> {
        let start = self.offset;
        let value = self.read_i64()?;
        isize::try_from(value).map_err(|_| CodecError::InvalidData {
            offset: start,
            reason: format!("{} overflows isize", value),
        })
    }

    pub fn read_bool(&mut self) -> CodecResult<bool> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(CodecError::InvalidData {
                offset: self.offset - 1,
                reason: format!("boolean byte {:#04x}", other),
            }),
        }
    }

    pub fn read_opt_bool(&mut self) -> CodecResult<Option<bool>> {
        match self.read_u8()? {
            0 => Ok(None),
            1 => Ok(Some(false)),
            2 => Ok(Some(true)),
            other => Err(CodecError::InvalidData {
                offset: self.offset - 1,
                reason: format!("optional boolean byte {:#04x}", other),
            }),
        }
    }

    pub fn read_f32(&mut self) -> CodecResult<f32> {
        Ok(f32::from_bits(self.read_u32()?))
    }

    pub fn read_f64(&mut self) -> CodecResult<f64> {
        Ok(f64::from_bits(self.read_u64()?))
    }

    pub fn read_char(&mut self) -> CodecResult<char> {
        let start = self.offset;
        let scalar = self.read_u32()?;
        char::from_u32(scalar).ok_or_else(|| CodecError::InvalidData {
            offset: start,
            reason: format!("{:#x} is not a Unicode scalar value", scalar),
        })
    }

    /// Type tag; `None` for the null tag. Tags above `u16::MAX` are rejected.
    pub fn read_tag(&mut self) -> CodecResult<Option<u16>> {
        let start = self.offset;
        let raw = self.read_varint()?;
        if raw == NULL_TAG {
            return Ok(None);
        }
        u16::try_from(raw)
            .map(Some)
            .map_err(|_| CodecError::UnknownTag {
                tag: raw,
                offset: start,
            })
    }

    /// Length prefix: `None` for the null marker, otherwise the length.
    pub fn read_length(&mut self) -> CodecResult<Option<usize>> {
        let start = self.offset;
        match self.read_varint()? {
            NULL_TAG => Ok(None),
            raw => usize::try_from(raw - 1)
                .map(Some)
                .map_err(|_| CodecError::InvalidData {
                    offset: start,
                    reason: format!("length {} does not fit in memory", raw - 1),
                }),
        }
    }

    pub fn read_opt_string(&mut self) -> CodecResult<Option<String>> {
        let Some(byte_len) = self.read_length()? else {
            return Ok(None);
        };
        if byte_len == 0 {
            return Ok(Some(String::new()));
        }
        let start = self.offset;
        let char_count = self.read_usize()?;
        if char_count > byte_len {
            return Err(CodecError::InvalidData {
                offset: start,
                reason: format!("{} chars cannot fit in {} bytes", char_count, byte_len),
            });
        }
        let bytes = self.read_bytes(byte_len)?;
        let text = String::from_utf8(bytes).map_err(|e| CodecError::InvalidData {
            offset: start,
            reason: format!("string is not UTF-8: {}", e),
        })?;
        let decoded = text.chars().count();
        if decoded != char_count {
            return Err(CodecError::InvalidData {
                offset: start,
                reason: format!("declared {} chars, decoded {}", char_count, decoded),
            });
        }
        Ok(Some(text))
    }

    /// Non-optional string; the null marker decodes to the empty string.
    pub fn read_string(&mut self) -> CodecResult<String> {
        Ok(self.read_opt_string()?.unwrap_or_default())
    }

    pub fn read_byte_buffer(&mut self) -> CodecResult<Option<Vec<u8>>> {
        match self.read_length()? {
            Some(len) => self.read_bytes(len).map(Some),
            None => Ok(None),
        }
    }

    fn read_fixed16(&mut self, what: &str) -> CodecResult<[u8; 16]> {
        let start = self.offset;
        match self.read_byte_buffer()? {
            Some(bytes) => <[u8; 16]>::try_from(bytes.as_slice()).map_err(|_| {
                CodecError::InvalidData {
                    offset: start,
                    reason: format!("{} needs 16 bytes, got {}", what, bytes.len()),
                }
            }),
            None => Err(CodecError::InvalidData {
                offset: start,
                reason: format!("null {}", what),
            }),
        }
    }

    pub fn read_decimal(&mut self) -> CodecResult<Decimal> {
        let start = self.offset;
        let bytes = self.read_fixed16("decimal")?;
        Decimal::from_bytes(&bytes).ok_or_else(|| CodecError::InvalidData {
            offset: start,
            reason: "decimal flags word is malformed".into(),
        })
    }

    pub fn read_uuid(&mut self) -> CodecResult<Uuid> {
        Ok(Uuid::from_bytes(self.read_fixed16("uuid")?))
    }

    pub fn read_datetime(&mut self) -> CodecResult<DateTime<Utc>> {
        let start = self.offset;
        let ticks = self.read_i64()?;
        ticks_to_datetime(ticks).ok_or_else(|| CodecError::InvalidData {
            offset: start,
            reason: format!("{} ticks is outside the date range", ticks),
        })
    }

    pub fn read_timedelta(&mut self) -> CodecResult<TimeDelta> {
        let start = self.offset;
        let ticks = self.read_i64()?;
        ticks_to_timedelta(ticks).ok_or_else(|| CodecError::InvalidData {
            offset: start,
            reason: format!("{} ticks is outside the duration range", ticks),
        })
    }

    /// `None` for the null marker; the empty string decodes to the empty URI.
    pub fn read_opt_uri(&mut self) -> CodecResult<Option<Uri>> {
        let start = self.offset;
        match self.read_opt_string()? {
            None => Ok(None),
            Some(text) if text.is_empty() => Ok(Some(Uri::default())),
            Some(text) => Uri::parse(text)
                .map(Some)
                .map_err(|e| CodecError::InvalidData {
                    offset: start,
                    reason: e.to_string(),
                }),
        }
    }
}
