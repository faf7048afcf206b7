// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Primitive wire codec.
//!
//! Fixed, bit-exact encodings for every primitive and composite value type:
//!
//! | Element | Encoding |
//! |---|---|
//! | Unsigned integer | varint (`u8`: raw byte) |
//! | Signed integer | zig-zag then varint (`i8`: raw byte) |
//! | `f32` / `f64` | IEEE bits as unsigned varint |
//! | `bool` | one byte 0/1 (optional: 0/1/2) |
//! | Byte buffer | varint `len+1` (0 null, 1 empty), raw bytes |
//! | String | varint `byteLen+1` (0 null, 1 empty), varint char count, UTF-8 |
//! | `Decimal` / `Uuid` | byte buffer of 16 bytes |
//! | `DateTime<Utc>` / `TimeDelta` | zig-zag 100 ns ticks |
//! | `Uri` | string |

mod reader;
pub mod values;
pub mod varint;
mod writer;

pub use reader::WireReader;
pub use values::{Decimal, InvalidUri, Uri};
pub use writer::WireWriter;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeDelta};
    use uuid::Uuid;

    fn round_trip<T: PartialEq + std::fmt::Debug>(
        value: T,
        write: impl FnOnce(&mut WireWriter<'_>, &T) -> crate::CodecResult<()>,
        read: impl FnOnce(&mut WireReader<'_>) -> crate::CodecResult<T>,
    ) {
        let mut out = Vec::new();
        write(&mut WireWriter::new(&mut out), &value).expect("write should succeed");
        let mut input = out.as_slice();
        let mut reader = WireReader::new(&mut input);
        let decoded = read(&mut reader).expect("read should succeed");
        assert_eq!(decoded, value);
        assert!(input.is_empty(), "every written byte must be consumed");
    }

    #[test]
    fn test_float_bits_survive() {
        let specials = [
            0.0f64,
            -0.0,
            f64::INFINITY,
            f64::NEG_INFINITY,
            f64::MIN_POSITIVE,
            f64::from_bits(0x7FF8_0000_0000_1234),
        ];
        for value in specials {
            let mut out = Vec::new();
            WireWriter::new(&mut out)
                .write_f64(value)
                .expect("write should succeed");
            let mut input = out.as_slice();
            let decoded = WireReader::new(&mut input)
                .read_f64()
                .expect("read should succeed");
            assert_eq!(decoded.to_bits(), value.to_bits());
        }

        let nan = f32::from_bits(0x7FC0_0ABC);
        let mut out = Vec::new();
        WireWriter::new(&mut out)
            .write_f32(nan)
            .expect("write should succeed");
        let mut input = out.as_slice();
        let decoded = WireReader::new(&mut input)
            .read_f32()
            .expect("read should succeed");
        assert_eq!(decoded.to_bits(), nan.to_bits());
    }

    #[test]
    fn test_random_integer_sweep() {
        let mut rng = fastrand::Rng::with_seed(42);
        for _ in 0..2_000 {
            round_trip(rng.i64(..), |w, v| w.write_i64(*v), |r| r.read_i64());
            round_trip(rng.u64(..), |w, v| w.write_u64(*v), |r| r.read_u64());
            round_trip(rng.i16(..), |w, v| w.write_i16(*v), |r| r.read_i16());
            round_trip(rng.char(..), |w, v| w.write_char(*v), |r| r.read_char());
        }
        for value in [i64::MIN, i64::MAX] {
            round_trip(value, |w, v| w.write_i64(*v), |r| r.read_i64());
        }
    }

    #[test]
    fn test_composite_values() {
        let decimal = Decimal::new(-79_228_162_514_264_337_593_543_950_335, 28)
            .expect("max magnitude decimal");
        round_trip(decimal, |w, v| w.write_decimal(v), |r| r.read_decimal());

        round_trip(Uuid::new_v4(), |w, v| w.write_uuid(v), |r| r.read_uuid());

        let instant = DateTime::from_timestamp(-62_135_596_800, 0).expect("year 1");
        round_trip(instant, |w, v| w.write_datetime(v), |r| r.read_datetime());

        let span = TimeDelta::days(-3) + TimeDelta::microseconds(7);
        round_trip(span, |w, v| w.write_timedelta(v), |r| r.read_timedelta());

        let uri = Uri::parse("mailto:ops@example.org").expect("valid uri");
        round_trip(
            Some(uri),
            |w, v| w.write_uri(v.as_ref().unwrap_or(&Uri::default())),
            |r| r.read_opt_uri(),
        );
    }

    #[test]
    fn test_strings_sweep() {
        let mut rng = fastrand::Rng::with_seed(7);
        for len in [0usize, 1, 2, 63, 64, 200] {
            let text: String = (0..len).map(|_| rng.char(..)).collect();
            round_trip(
                Some(text),
                |w, v| w.write_opt_str(v.as_deref()),
                |r| r.read_opt_string(),
            );
        }
        round_trip(None, |w, v: &Option<String>| w.write_opt_str(v.as_deref()), |r| {
            r.read_opt_string()
        });
    }
}
