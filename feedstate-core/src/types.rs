//! Value primitives for market state.
//!
//! Every value type carries a `NULL` constant that stands in for "never set",
//! so readers can always get a value back without branching on `Option`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed-point price in instrument units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Price(pub i64);

impl Price {
    /// Sentinel for "no price".
    pub const NULL: Self = Self(i64::MIN);

    /// Zero price.
    pub const ZERO: Self = Self(0);

    /// Creates a price from its raw fixed-point value.
    #[inline]
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Returns the raw fixed-point value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> i64 {
        self.0
    }

    /// Returns true if this is the null sentinel.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == i64::MIN
    }

    /// Converts the price to a whole number of ticks.
    ///
    /// Returns `None` for the null price, a non-positive tick size, or a
    /// price that is not a multiple of the tick size.
    #[inline]
    #[must_use]
    pub const fn to_ticks(self, tick_size: i64) -> Option<i64> {
        if self.is_null() || tick_size <= 0 || self.0.rem_euclid(tick_size) != 0 {
            return None;
        }
        Some(self.0.div_euclid(tick_size))
    }

    /// Builds a price from a tick count.
    #[inline]
    #[must_use]
    pub const fn from_ticks(ticks: i64, tick_size: i64) -> Self {
        Self(ticks * tick_size)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "NULL")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Size(pub u64);

impl Size {
    /// Sentinel for "no size".
    pub const NULL: Self = Self(u64::MAX);

    /// Zero quantity.
    pub const ZERO: Self = Self(0);

    /// Creates a size.
    #[inline]
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw quantity.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Returns true if this is the null sentinel.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == u64::MAX
    }

    /// Returns true for the null sentinel or a zero quantity.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.is_null() || self.0 == 0
    }

    /// Adds two sizes, treating null as zero and saturating below the sentinel.
    #[must_use]
    pub const fn accumulate(self, other: Self) -> Self {
        let lhs = if self.is_null() { 0 } else { self.0 };
        let rhs = if other.is_null() { 0 } else { other.0 };
        let sum = lhs.saturating_add(rhs);
        if sum == u64::MAX {
            Self(u64::MAX - 1)
        } else {
            Self(sum)
        }
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "NULL")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Timestamp in nanoseconds since the Unix epoch.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// Sentinel for "never".
    pub const NULL: Self = Self(0);

    /// Creates a timestamp from nanoseconds.
    #[inline]
    #[must_use]
    pub const fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    /// Returns the nanosecond value.
    #[inline]
    #[must_use]
    pub const fn as_nanos(self) -> u64 {
        self.0
    }

    /// Returns true if this is the null sentinel.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

/// Display fraction of an instrument's prices, `1 / base^exponent`.
///
/// Decimal instruments use base 10 (`1/100` is base 10, exponent 2);
/// fractional futures use base 2 (`1/8` is base 2, exponent 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fraction {
    /// Radix of the denominator.
    pub base: u32,
    /// Power applied to the base.
    pub exponent: u32,
}

impl Fraction {
    /// Creates a display fraction.
    #[must_use]
    pub const fn new(base: u32, exponent: u32) -> Self {
        Self { base, exponent }
    }

    /// Decimal fraction with the given number of places.
    #[must_use]
    pub const fn decimal(places: u32) -> Self {
        Self::new(10, places)
    }

    /// Returns true if the fraction can be used for display.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.base >= 2 && self.denominator().is_some()
    }

    /// Returns `base^exponent`, or `None` on overflow.
    #[must_use]
    pub const fn denominator(&self) -> Option<u64> {
        (self.base as u64).checked_pow(self.exponent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_null() {
        assert!(Price::NULL.is_null());
        assert!(!Price::ZERO.is_null());
        assert_eq!(Price::NULL.to_string(), "NULL");
        assert_eq!(Price::new(1250).to_string(), "1250");
    }

    #[test]
    fn test_price_ticks() {
        assert_eq!(Price::new(1250).to_ticks(25), Some(50));
        assert_eq!(Price::new(-50).to_ticks(25), Some(-2));
        assert_eq!(Price::new(1251).to_ticks(25), None);
        assert_eq!(Price::new(1250).to_ticks(0), None);
        assert_eq!(Price::NULL.to_ticks(25), None);
        assert_eq!(Price::from_ticks(50, 25), Price::new(1250));
    }

    #[test]
    fn test_size_accumulate() {
        assert_eq!(Size::new(5).accumulate(Size::new(7)), Size::new(12));
        assert_eq!(Size::NULL.accumulate(Size::new(7)), Size::new(7));
        assert!(!Size::new(u64::MAX - 1).accumulate(Size::new(9)).is_null());
        assert!(Size::ZERO.is_empty());
        assert!(Size::NULL.is_empty());
        assert!(!Size::new(1).is_empty());
    }

    #[test]
    fn test_timestamp_null() {
        assert!(Timestamp::NULL.is_null());
        assert!(!Timestamp::from_nanos(1).is_null());
        assert_eq!(Timestamp::default(), Timestamp::NULL);
    }

    #[test]
    fn test_fraction_validity() {
        assert!(Fraction::decimal(2).is_valid());
        assert_eq!(Fraction::decimal(2).denominator(), Some(100));
        assert!(Fraction::new(2, 3).is_valid());
        assert!(!Fraction::new(1, 3).is_valid());
        assert!(!Fraction::new(10, 40).is_valid());
    }
}
