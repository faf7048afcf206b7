// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Composite value types carried by the primitive codec.
//!
//! - [`Decimal`]: 96-bit scaled integer in the 16-byte lo/mid/hi/flags layout
//! - [`Uri`]: absolute URI, validated on construction, encoded as its text
//! - tick conversions for `chrono` date/time values (100 ns resolution)

use crate::config::{NANOS_PER_TICK, TICKS_PER_SECOND};
use chrono::{DateTime, TimeDelta, Utc};
use std::fmt;
use std::str::FromStr;

const DECIMAL_SCALE_SHIFT: u32 = 16;
const DECIMAL_SIGN_BIT: u32 = 1 << 31;
const DECIMAL_SCALE_MASK: u32 = 0x00FF_0000;

/// Largest scale a [`Decimal`] may carry.
pub const DECIMAL_MAX_SCALE: u8 = 28;

/// Fixed-point decimal: a 96-bit magnitude, a sign, and a power-of-ten scale.
///
/// Value = `(-1)^sign * mantissa / 10^scale`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Decimal {
    lo: u32,
    mid: u32,
    hi: u32,
    flags: u32,
}

impl Decimal {
    /// Encoded size in bytes.
    pub const SIZE: usize = 16;

    pub const ZERO: Decimal = Decimal {
        lo: 0,
        mid: 0,
        hi: 0,
        flags: 0,
    };

    /// Build from a signed mantissa and scale.
    ///
    /// Returns `None` if the magnitude exceeds 96 bits or the scale exceeds
    /// [`DECIMAL_MAX_SCALE`].
    pub fn new(mantissa: i128, scale: u8) -> Option<Self> {
        if scale > DECIMAL_MAX_SCALE {
            return None;
        }
        let magnitude = mantissa.unsigned_abs();
        if magnitude >> 96 != 0 {
            return None;
        }
        let mut flags = u32::from(scale) << DECIMAL_SCALE_SHIFT;
        if mantissa < 0 {
            flags |= DECIMAL_SIGN_BIT;
        }
        Some(Self {
            lo: magnitude as u32,
            mid: (magnitude >> 32) as u32,
            hi: (magnitude >> 64) as u32,
            flags,
        })
    }

    /// Build from the raw layout, validating the flags word.
    pub fn from_parts(lo: u32, mid: u32, hi: u32, flags: u32) -> Option<Self> {
        let reserved = flags & !(DECIMAL_SIGN_BIT | DECIMAL_SCALE_MASK);
        let scale = (flags & DECIMAL_SCALE_MASK) >> DECIMAL_SCALE_SHIFT;
        if reserved != 0 || scale > u32::from(DECIMAL_MAX_SCALE) {
            return None;
        }
        Some(Self { lo, mid, hi, flags })
    }

    pub fn scale(&self) -> u8 {
        ((self.flags & DECIMAL_SCALE_MASK) >> DECIMAL_SCALE_SHIFT) as u8
    }

    pub fn is_negative(&self) -> bool {
        self.flags & DECIMAL_SIGN_BIT != 0
    }

    /// Unsigned 96-bit magnitude.
    pub fn magnitude(&self) -> u128 {
        u128::from(self.lo) | (u128::from(self.mid) << 32) | (u128::from(self.hi) << 64)
    }

    /// Signed mantissa (sign applied, scale not applied).
    pub fn mantissa(&self) -> i128 {
        let magnitude = self.magnitude() as i128;
        if self.is_negative() {
            -magnitude
        } else {
            magnitude
        }
    }

    /// Little-endian lo, mid, hi, flags.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[0..4].copy_from_slice(&self.lo.to_le_bytes());
        out[4..8].copy_from_slice(&self.mid.to_le_bytes());
        out[8..12].copy_from_slice(&self.hi.to_le_bytes());
        out[12..16].copy_from_slice(&self.flags.to_le_bytes());
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != Self::SIZE {
            return None;
        }
        let word = |at: usize| {
            u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
        };
        Self::from_parts(word(0), word(4), word(8), word(12))
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.magnitude().to_string();
        let scale = usize::from(self.scale());
        let sign = if self.is_negative() { "-" } else { "" };
        if scale == 0 {
            return write!(f, "{}{}", sign, digits);
        }
        let padded = format!("{:0>width$}", digits, width = scale + 1);
        let (int_part, frac_part) = padded.split_at(padded.len() - scale);
        write!(f, "{}{}.{}", sign, int_part, frac_part)
    }
}

/// Absolute URI (`scheme:rest`), kept in its textual form.
///
/// The default value is the empty URI, which is what an absent string
/// decodes to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Uri(String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidUri(pub String);

impl fmt::Display for InvalidUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid URI {:?}", self.0)
    }
}

impl std::error::Error for InvalidUri {}

impl Uri {
    /// Validate an absolute URI. The scheme must match
    /// `ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )` and be followed by `:`.
    pub fn parse(text: impl Into<String>) -> Result<Self, InvalidUri> {
        let text = text.into();
        let valid = match text.split_once(':') {
            Some((scheme, _)) => {
                let mut chars = scheme.chars();
                chars.next().is_some_and(|c| c.is_ascii_alphabetic())
                    && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
                    && !text.chars().any(char::is_whitespace)
            }
            None => false,
        };
        if valid {
            Ok(Self(text))
        } else {
            Err(InvalidUri(text))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Scheme without the trailing `:`, or `None` for the empty URI.
    pub fn scheme(&self) -> Option<&str> {
        self.0.split_once(':').map(|(scheme, _)| scheme)
    }
}

impl FromStr for Uri {
    type Err = InvalidUri;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 100 ns ticks since the Unix epoch; `None` if the instant is out of range.
///
/// Sub-tick nanoseconds are dropped here; the writer rejects such instants
/// before converting (see [`is_tick_aligned`]).
pub fn datetime_to_ticks(value: &DateTime<Utc>) -> Option<i64> {
    let nanos = i64::from(value.timestamp_subsec_nanos());
    if nanos >= 1_000_000_000 {
        return None;
    }
    value
        .timestamp()
        .checked_mul(TICKS_PER_SECOND)?
        .checked_add(nanos / NANOS_PER_TICK)
}

pub fn ticks_to_datetime(ticks: i64) -> Option<DateTime<Utc>> {
    let secs = ticks.div_euclid(TICKS_PER_SECOND);
    let nanos = ticks.rem_euclid(TICKS_PER_SECOND) * NANOS_PER_TICK;
    DateTime::from_timestamp(secs, nanos as u32)
}

/// Signed 100 ns ticks; sub-tick nanoseconds are truncated toward zero.
pub fn timedelta_to_ticks(value: &TimeDelta) -> Option<i64> {
    value
        .num_seconds()
        .checked_mul(TICKS_PER_SECOND)?
        .checked_add(i64::from(value.subsec_nanos()) / NANOS_PER_TICK)
}

/// Whether a sub-second nanosecond count is a whole number of ticks.
///
/// Leap-second nanos (>= 1e9) have no tick representation.
pub fn is_tick_aligned(subsec_nanos: i64) -> bool {
    subsec_nanos.abs() < 1_000_000_000 && subsec_nanos % NANOS_PER_TICK == 0
}

pub fn ticks_to_timedelta(ticks: i64) -> Option<TimeDelta> {
    let secs = ticks.div_euclid(TICKS_PER_SECOND);
    let nanos = ticks.rem_euclid(TICKS_PER_SECOND) * NANOS_PER_TICK;
    TimeDelta::new(secs, nanos as u32)
}
