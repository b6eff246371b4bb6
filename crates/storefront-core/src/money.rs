//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Coupon records and the `subtotal` query parameter arrive as floats:   │
//! │    0.1 + 0.2 = 0.30000000000000004                                      │
//! │                                                                         │
//! │  OUR SOLUTION: convert once, at the edge, into integer cents           │
//! │    Money::from_units(19.99) == Money::from_cents(1999)                 │
//! │    All comparisons and caps happen on cents from then on               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rounding
//! Conversions from a fractional amount round **half-up** on the cent
//! boundary: 0.125 → 0.13, 0.124 → 0.12.
//!
//! ## Usage
//! ```rust
//! use storefront_core::money::Money;
//!
//! let subtotal = Money::from_units(15.99);
//! assert_eq!(subtotal, Money::from_cents(1599));
//! assert_eq!(subtotal.to_string(), "$15.99");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::validation::ValidationResult;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in cents.
///
/// ## Design Decisions
/// - **i64 (signed)**: a negative discount is representable, then clamped
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Float only at the edges**: `from_units` / `to_units` exist for the
///   document store and JSON payloads, nothing else
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from an amount in currency units.
    ///
    /// Rounds half-up to the nearest cent. NaN and infinities become zero.
    ///
    /// ## Example
    /// ```rust
    /// use storefront_core::money::Money;
    ///
    /// assert_eq!(Money::from_units(12.5).cents(), 1250);
    /// assert_eq!(Money::from_units(0.125).cents(), 13);
    /// assert_eq!(Money::from_units(f64::NAN).cents(), 0);
    /// ```
    pub fn from_units(units: f64) -> Self {
        Money(round_half_up(units * 100.0))
    }

    /// Parses an amount in currency units, e.g. the `subtotal` query parameter.
    ///
    /// ## Rules
    /// - Surrounding whitespace is ignored
    /// - Must be a finite decimal number
    /// - Must not be negative
    ///
    /// ## Example
    /// ```rust
    /// use storefront_core::money::Money;
    ///
    /// assert_eq!(Money::parse_units(" 49.90 ").unwrap().cents(), 4990);
    /// assert!(Money::parse_units("-1").is_err());
    /// assert!(Money::parse_units("ten").is_err());
    /// ```
    pub fn parse_units(input: &str) -> ValidationResult<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Required {
                field: "amount".to_string(),
            });
        }

        let units: f64 = trimmed.parse().map_err(|_| ValidationError::InvalidFormat {
            field: "amount".to_string(),
            reason: "must be a decimal number".to_string(),
        })?;

        if !units.is_finite() {
            return Err(ValidationError::InvalidFormat {
                field: "amount".to_string(),
                reason: "must be a finite number".to_string(),
            });
        }

        if units < 0.0 {
            return Err(ValidationError::MustBeNonNegative {
                field: "amount".to_string(),
            });
        }

        Ok(Money::from_units(units))
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the value in currency units, for JSON payloads.
    #[inline]
    pub fn to_units(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Returns the major unit (dollars) portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (cents) portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }
}

/// Rounds a fractional cent amount half-up to a whole cent.
///
/// Matches the rounding the storefront frontend performs on display, so a
/// discount shown in the cart equals the discount charged at checkout.
pub(crate) fn round_half_up(cents: f64) -> i64 {
    if !cents.is_finite() {
        return 0;
    }
    (cents + 0.5).floor() as i64
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
        )
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.dollars(), 10);
        assert_eq!(money.cents_part(), 99);
    }

    #[test]
    fn test_from_units_rounds_half_up() {
        assert_eq!(Money::from_units(10.0).cents(), 1000);
        assert_eq!(Money::from_units(0.125).cents(), 13);
        assert_eq!(Money::from_units(0.124).cents(), 12);
        assert_eq!(Money::from_units(33.335).cents(), 3334);
    }

    #[test]
    fn test_from_units_non_finite_is_zero() {
        assert_eq!(Money::from_units(f64::INFINITY), Money::zero());
        assert_eq!(Money::from_units(f64::NEG_INFINITY), Money::zero());
        assert_eq!(Money::from_units(f64::NAN), Money::zero());
    }

    #[test]
    fn test_min_max_for_caps() {
        let discount = Money::from_cents(2000);
        let subtotal = Money::from_cents(1500);
        assert_eq!(discount.min(subtotal), subtotal);
        assert_eq!(Money::from_cents(-1).max(Money::zero()), Money::zero());
    }

    #[test]
    fn test_to_units() {
        assert_eq!(Money::from_cents(1999).to_units(), 19.99);
        assert_eq!(Money::zero().to_units(), 0.0);
    }

    #[test]
    fn test_parse_units() {
        assert_eq!(Money::parse_units("100").unwrap().cents(), 10_000);
        assert_eq!(Money::parse_units("0").unwrap().cents(), 0);
        assert!(matches!(
            Money::parse_units(""),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            Money::parse_units("-5"),
            Err(ValidationError::MustBeNonNegative { .. })
        ));
        assert!(matches!(
            Money::parse_units("inf"),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(matches!(
            Money::parse_units("abc"),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "$10.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "$5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-$5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "$0.00");
    }
}
