//! Arbitrary-precision keyspace quantities.
//!
//! Coordinators report keyspaces as decimal strings because they routinely
//! exceed 2^64 once a task modifier (rule expansion etc.) is applied. All
//! keyspace math in the reducer and ETA estimator goes through
//! [`KeyspaceValue`] so nothing is truncated on the way.

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use std::fmt;
use std::ops::{Add, AddAssign};
use thiserror::Error;

/// Bits kept when converting a ratio of two huge values to `f64`.
const RATIO_PRECISION_BITS: u64 = 1000;

/// A keyspace string that is not a non-negative base-10 integer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed keyspace value {input:?}")]
pub struct KeyspaceParseError {
    pub input: String,
}

/// Non-negative arbitrary-precision integer used for every keyspace quantity.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KeyspaceValue(BigUint);

impl KeyspaceValue {
    pub fn zero() -> Self {
        Self(BigUint::zero())
    }

    /// Parse a decimal string. The empty string is zero; anything other than
    /// ASCII digits (signs, whitespace, separators) is rejected.
    pub fn parse(s: &str) -> Result<Self, KeyspaceParseError> {
        if s.is_empty() {
            return Ok(Self::zero());
        }
        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(KeyspaceParseError {
                input: s.to_string(),
            });
        }
        BigUint::parse_bytes(s.as_bytes(), 10)
            .map(Self)
            .ok_or_else(|| KeyspaceParseError {
                input: s.to_string(),
            })
    }

    /// Multiply by a task modifier. A zero modifier yields zero.
    pub fn scaled_by(&self, modifier: &KeyspaceValue) -> Self {
        Self(&self.0 * &modifier.0)
    }

    /// Subtract, clamping at zero instead of underflowing.
    pub fn saturating_sub(&self, other: &KeyspaceValue) -> Self {
        if other.0 >= self.0 {
            Self::zero()
        } else {
            Self(&self.0 - &other.0)
        }
    }

    /// Floor division; `None` when `divisor` is zero.
    pub fn checked_div(&self, divisor: &KeyspaceValue) -> Option<Self> {
        if divisor.is_zero() {
            return None;
        }
        Some(Self(&self.0 / &divisor.0))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Value as `u64`, saturating at `u64::MAX`.
    pub fn to_u64_saturating(&self) -> u64 {
        self.0.to_u64().unwrap_or(u64::MAX)
    }

    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or(f64::INFINITY)
    }
}

impl From<u64> for KeyspaceValue {
    fn from(n: u64) -> Self {
        Self(BigUint::from(n))
    }
}

impl Add<&KeyspaceValue> for &KeyspaceValue {
    type Output = KeyspaceValue;

    fn add(self, rhs: &KeyspaceValue) -> KeyspaceValue {
        KeyspaceValue(&self.0 + &rhs.0)
    }
}

impl AddAssign<&KeyspaceValue> for KeyspaceValue {
    fn add_assign(&mut self, rhs: &KeyspaceValue) {
        self.0 += &rhs.0;
    }
}

impl fmt::Display for KeyspaceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// `(numerator / denominator) * 100` in double precision; 0 when the
/// denominator is zero.
///
/// Both operands are shifted down by the same amount before conversion when
/// the denominator would not fit an `f64`, so the ratio stays finite.
pub fn ratio_percent(numerator: &KeyspaceValue, denominator: &KeyspaceValue) -> f64 {
    if denominator.is_zero() {
        return 0.0;
    }
    let shift = denominator.0.bits().saturating_sub(RATIO_PRECISION_BITS);
    let n = (&numerator.0 >> shift).to_f64().unwrap_or(f64::INFINITY);
    let d = (&denominator.0 >> shift).to_f64().unwrap_or(f64::INFINITY);
    if d == 0.0 {
        return 0.0;
    }
    (n / d) * 100.0
}
