//! Curve position arithmetic.
//!
//! A [`CurvePosition`] locates a point on the sphere-covering, locality
//! preserving space-filling curve. Positions are 64-bit signed integers; all
//! derived arithmetic stays in 64-bit integers because the values exceed what
//! double-precision floats can represent exactly.
//!
//! Partition keys are derived by truncating the decimal form to a configured
//! number of leading digits. Truncating integer division rounds toward zero,
//! so the negative half of the curve needs one extra string position (the sign
//! character) to keep the truncation point numerically aligned with the
//! positive half.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A position on the space-filling curve, in two's-complement 64-bit form.
///
/// The decimal string form (with sign) is what gets stored in the indexed
/// `geohash` field; the numeric form is what range arithmetic operates on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct CurvePosition(pub i64);

impl CurvePosition {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(self) -> i64 {
        self.0
    }

    /// Length of the decimal form, sign character included when negative.
    pub fn digit_count(self) -> usize {
        decimal_len(self.0)
    }

    /// Derive the partition key for this position.
    ///
    /// Keeps the leading `length` decimal digits (one extra string position is
    /// consumed by the sign for negative values). Division truncates toward
    /// zero, so `9` and `-9` both map toward `0`.
    ///
    /// `length` must not exceed the decimal digit count of the position;
    /// the result is unspecified otherwise.
    pub fn hash_key(self, length: usize) -> i64 {
        let effective = if self.0 < 0 { length + 1 } else { length };
        let exponent = decimal_len(self.0).saturating_sub(effective) as u32;
        self.0 / 10_i64.pow(exponent)
    }
}

impl fmt::Display for CurvePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<i64> for CurvePosition {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// Length of `value`'s decimal form, sign character included.
pub(crate) fn decimal_len(value: i64) -> usize {
    let mut len = if value < 0 { 1 } else { 0 };
    let mut rest = value;
    loop {
        len += 1;
        rest /= 10;
        if rest == 0 {
            return len;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_len() {
        assert_eq!(decimal_len(0), 1);
        assert_eq!(decimal_len(7), 1);
        assert_eq!(decimal_len(-7), 2);
        assert_eq!(decimal_len(4_416_340_092_237_875_681), 19);
        assert_eq!(decimal_len(i64::MAX), 19);
        assert_eq!(decimal_len(i64::MIN), 20);
        assert_eq!(decimal_len(1_000), 4);
        assert_eq!(decimal_len(-1_000), 5);
    }

    #[test]
    fn test_display_includes_sign() {
        assert_eq!(CurvePosition(4_416_340_092_237_875_681).to_string(), "4416340092237875681");
        assert_eq!(CurvePosition(-42).to_string(), "-42");
        assert_eq!(
            CurvePosition(4_416_340_092_237_875_681).digit_count(),
            "4416340092237875681".len()
        );
        assert_eq!(CurvePosition(-42).digit_count(), 3);
    }

    #[test]
    fn test_hash_key_leading_digits() {
        // Leaf cell position for (1, 50): 19 digits, two leading digits 44.
        let position = CurvePosition(4_416_340_092_237_875_681);
        assert_eq!(position.hash_key(2), 44);
        assert_eq!(position.hash_key(1), 4);
        assert_eq!(position.hash_key(4), 4416);
    }

    #[test]
    fn test_hash_key_negative_alignment() {
        // The sign consumes one string position, so the same magnitude must
        // produce a mirrored key, not one digit fewer.
        let positive = CurvePosition(5_158_803_897_761_923_073);
        let negative = CurvePosition(-5_158_803_897_761_923_073);
        assert_eq!(positive.hash_key(2), 51);
        assert_eq!(negative.hash_key(2), -51);
    }

    #[test]
    fn test_hash_key_truncates_toward_zero() {
        assert_eq!(CurvePosition(1_999).hash_key(1), 1);
        assert_eq!(CurvePosition(-1_999).hash_key(1), -1);
        assert_eq!(CurvePosition(9).hash_key(1), 9);
        assert_eq!(CurvePosition(-9).hash_key(1), -9);
    }

    #[test]
    fn test_hash_key_deterministic() {
        let position = CurvePosition(5_158_810_975_868_026_879);
        assert_eq!(position.hash_key(2), position.hash_key(2));
    }
}
