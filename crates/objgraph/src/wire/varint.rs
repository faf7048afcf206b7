// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! LEB128-style varints and zig-zag mapping.
//!
//! Seven payload bits per byte, least-significant group first; the high bit
//! of every byte except the last is set.

/// Longest encoding of a `u64` (ceil(64 / 7)).
pub const MAX_VARINT_LEN: usize = 10;

/// Encode `value` into `buf`, returning the number of bytes used.
pub fn encode_varint(mut value: u64, buf: &mut [u8; MAX_VARINT_LEN]) -> usize {
    let mut len = 0;
    while value >= 0x80 {
        buf[len] = (value as u8) | 0x80;
        value >>= 7;
        len += 1;
    }
    buf[len] = value as u8;
    len + 1
}

/// Number of bytes `encode_varint` produces for `value`.
pub fn varint_len(value: u64) -> usize {
    let bits = 64 - (value | 1).leading_zeros() as usize;
    bits.div_ceil(7)
}

/// Decode a varint from the front of `bytes`.
///
/// Returns the value and the number of bytes consumed, or `None` if the
/// input is truncated or does not fit in 64 bits.
pub fn decode_varint(bytes: &[u8]) -> Option<(u64, usize)> {
    let mut value = 0u64;
    for (index, &byte) in bytes.iter().enumerate().take(MAX_VARINT_LEN) {
        let shift = 7 * index as u32;
        let payload = u64::from(byte & 0x7F);
        if index == MAX_VARINT_LEN - 1 && payload > 1 {
            return None;
        }
        value |= payload << shift;
        if byte & 0x80 == 0 {
            return Some((value, index + 1));
        }
    }
    None
}

/// Generate zig-zag encode/decode pairs for one signed width.
macro_rules! impl_zigzag {
    ($encode:ident, $decode:ident, $signed:ty, $unsigned:ty, $bits:expr) => {
        #[inline]
        pub fn $encode(value: $signed) -> $unsigned {
            ((value << 1) ^ (value >> ($bits - 1))) as $unsigned
        }

        #[inline]
        pub fn $decode(value: $unsigned) -> $signed {
            ((value >> 1) as $signed) ^ -((value & 1) as $signed)
        }
    };
}

impl_zigzag!(zigzag_encode_i16, zigzag_decode_i16, i16, u16, 16);
impl_zigzag!(zigzag_encode_i32, zigzag_decode_i32, i32, u32, 32);
impl_zigzag!(zigzag_encode_i64, zigzag_decode_i64, i64, u64, 64);

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(value: u64) -> Vec<u8> {
        let mut buf = [0u8; MAX_VARINT_LEN];
        let len = encode_varint(value, &mut buf);
        buf[..len].to_vec()
    }

    #[test]
    fn test_varint_lengths() {
        for (value, expected) in [
            (0u64, 1usize),
            (1, 1),
            (127, 1),
            (128, 2),
            (16_383, 2),
            (16_384, 3),
            (u64::from(u32::MAX), 5),
            (u64::MAX, 10),
        ] {
            assert_eq!(encoded(value).len(), expected, "value {}", value);
            assert_eq!(varint_len(value), expected, "value {}", value);
        }
    }

    #[test]
    fn test_varint_bytes() {
        assert_eq!(encoded(0), vec![0x00]);
        assert_eq!(encoded(300), vec![0xAC, 0x02]);
        assert_eq!(encoded(16_384), vec![0x80, 0x80, 0x01]);
    }

    #[test]
    fn test_varint_decode() {
        assert_eq!(decode_varint(&[0xAC, 0x02, 0xFF]), Some((300, 2)));
        assert_eq!(decode_varint(&encoded(u64::MAX)), Some((u64::MAX, 10)));
        // Continuation bit with nothing after it
        assert_eq!(decode_varint(&[0x80]), None);
        // Eleven-byte encoding cannot fit in 64 bits
        assert_eq!(decode_varint(&[0xFF; 11]), None);
        // Tenth byte carrying more than one bit overflows
        let mut overflow = [0xFFu8; 10];
        overflow[9] = 0x02;
        assert_eq!(decode_varint(&overflow), None);
    }

    #[test]
    fn test_zigzag_table() {
        assert_eq!(zigzag_encode_i32(0), 0);
        assert_eq!(zigzag_encode_i32(-1), 1);
        assert_eq!(zigzag_encode_i32(1), 2);
        assert_eq!(zigzag_encode_i32(-2), 3);
        assert_eq!(zigzag_encode_i32(i32::MAX), u32::MAX - 1);
        assert_eq!(zigzag_encode_i32(i32::MIN), u32::MAX);
        assert_eq!(zigzag_encode_i64(i64::MIN), u64::MAX);
        assert_eq!(zigzag_encode_i16(i16::MIN), u16::MAX);
    }

    #[test]
    fn test_zigzag_inverse() {
        for value in [i64::MIN, i64::MIN + 1, -300, -1, 0, 1, 300, i64::MAX] {
            assert_eq!(zigzag_decode_i64(zigzag_encode_i64(value)), value);
        }
        for value in [i16::MIN, -1, 0, 1, i16::MAX] {
            assert_eq!(zigzag_decode_i16(zigzag_encode_i16(value)), value);
        }

        let mut rng = fastrand::Rng::with_seed(0x5EED);
        for _ in 0..10_000 {
            let value = rng.i32(..);
            assert_eq!(zigzag_decode_i32(zigzag_encode_i32(value)), value);
        }
    }

    #[test]
    fn test_zigzag_widths_agree() {
        // Narrow encodings match the i64 encoding for in-range values.
        for value in [-129i16, -1, 0, 77, i16::MAX] {
            assert_eq!(
                u64::from(zigzag_encode_i16(value)),
                zigzag_encode_i64(i64::from(value))
            );
        }
    }
}
