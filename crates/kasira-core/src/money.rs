//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Rupiah                                           │
//! │    The rupiah has no minor unit in everyday retail, so every amount     │
//! │    in the system is a whole i64. The database, calculations, and API    │
//! │    all use the same integer representation.                             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use kasira_core::money::Money;
//!
//! // Create from a whole amount (preferred)
//! let price = Money::new(10_000); // Rp 10.000
//!
//! // Arithmetic operations
//! let doubled = price * 2;                  // Rp 20.000
//! let total = price + Money::new(5_000);    // Rp 15.000
//!
//! // Parse messy user input (digit extraction)
//! assert_eq!(Money::parse_amount("Rp 10.000"), Money::new(10_000));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in whole rupiah.
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for refunds and cash shortages
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support for JSON serialization
///
/// ## Where Money Flows
/// ```text
/// Product.price ──► CartItem unit price ──► line total ──► Cart total
///                                                              │
/// Shift.opening_cash + cash sales − cash refunds ──► expected cash
///                                                              │
///                               actual cash − expected ──► difference
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from a whole rupiah amount.
    ///
    /// ## Example
    /// ```rust
    /// use kasira_core::money::Money;
    ///
    /// let price = Money::new(10_000); // Rp 10.000
    /// assert_eq!(price.amount(), 10_000);
    /// ```
    #[inline]
    pub const fn new(amount: i64) -> Self {
        Money(amount)
    }

    /// Returns the raw integer amount.
    #[inline]
    pub const fn amount(&self) -> i64 {
        self.0
    }

    /// Zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    ///
    /// ## Example
    /// ```rust
    /// use kasira_core::money::Money;
    ///
    /// let shortage = Money::new(-2_000);
    /// assert_eq!(shortage.abs().amount(), 2_000);
    /// ```
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Clamps negative values to zero.
    ///
    /// Cart totals and line contributions are never allowed to go negative;
    /// discounts larger than the amount they apply to simply zero it out.
    ///
    /// ## Example
    /// ```rust
    /// use kasira_core::money::Money;
    ///
    /// assert_eq!(Money::new(-500).clamp_non_negative(), Money::zero());
    /// assert_eq!(Money::new(500).clamp_non_negative(), Money::new(500));
    /// ```
    #[inline]
    pub const fn clamp_non_negative(&self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            *self
        }
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use kasira_core::money::Money;
    ///
    /// let unit_price = Money::new(5_000);
    /// assert_eq!(unit_price.multiply_quantity(3).amount(), 15_000);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Converts a percentage in basis points to an absolute amount.
    ///
    /// ## Arguments
    /// * `bps` - Basis points (1000 = 10%)
    ///
    /// ## Rounding
    /// Integer math with half-up rounding: `(amount * bps + 5000) / 10000`.
    /// i128 intermediate prevents overflow on large amounts.
    ///
    /// ## Example
    /// ```rust
    /// use kasira_core::money::Money;
    ///
    /// let price = Money::new(95_000);
    /// assert_eq!(price.percentage(1000).amount(), 9_500); // 10%
    /// ```
    pub fn percentage(&self, bps: u32) -> Money {
        let amount = (self.0 as i128 * bps as i128 + 5000) / 10000;
        Money(amount as i64)
    }

    /// Extracts an amount from arbitrary user input by keeping only digits.
    ///
    /// Cashiers type amounts with grouping separators, currency prefixes, or
    /// stray whitespace; all of it is ignored. No digits at all yields zero.
    ///
    /// ## Example
    /// ```rust
    /// use kasira_core::money::Money;
    ///
    /// assert_eq!(Money::parse_amount("Rp 10.000"), Money::new(10_000));
    /// assert_eq!(Money::parse_amount("95,000"), Money::new(95_000));
    /// assert_eq!(Money::parse_amount("abc"), Money::zero());
    /// ```
    pub fn parse_amount(input: &str) -> Money {
        let digits: String = input.chars().filter(|c| c.is_ascii_digit()).collect();
        // Saturate instead of failing: a pasted blob of digits should not panic
        let amount = digits.parse::<i64>().unwrap_or(if digits.is_empty() {
            0
        } else {
            i64::MAX
        });
        Money(amount)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money as `Rp 10.000` with dot grouping.
///
/// ## Note
/// This is for receipts and debugging. The frontend formats amounts itself
/// to handle localization.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}Rp {}", sign, group_thousands(self.0.unsigned_abs()))
    }
}

/// Groups digits in threes with `.` separators: 1234567 → "1.234.567".
fn group_thousands(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut groups = Vec::new();
    while value > 0 {
        groups.push((value % 1000) as u16);
        value /= 1000;
    }
    let mut out = String::new();
    for (i, group) in groups.iter().rev().enumerate() {
        if i == 0 {
            out.push_str(&group.to_string());
        } else {
            out.push_str(&format!(".{:03}", group));
        }
    }
    out
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by integer (for quantity calculations).
impl Mul<i32> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i32) -> Self {
        Money(self.0 * qty as i64)
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_and_amount() {
        let money = Money::new(10_000);
        assert_eq!(money.amount(), 10_000);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::new(10_000)), "Rp 10.000");
        assert_eq!(format!("{}", Money::new(95_000)), "Rp 95.000");
        assert_eq!(format!("{}", Money::new(1_234_567)), "Rp 1.234.567");
        assert_eq!(format!("{}", Money::new(500)), "Rp 500");
        assert_eq!(format!("{}", Money::new(-2_000)), "-Rp 2.000");
        assert_eq!(format!("{}", Money::zero()), "Rp 0");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::new(10_000);
        let b = Money::new(5_000);

        assert_eq!((a + b).amount(), 15_000);
        assert_eq!((a - b).amount(), 5_000);
        let result: Money = a * 3;
        assert_eq!(result.amount(), 30_000);
    }

    #[test]
    fn test_clamp_non_negative() {
        assert_eq!(Money::new(-1).clamp_non_negative(), Money::zero());
        assert_eq!(Money::new(-99_999).clamp_non_negative(), Money::zero());
        assert_eq!(Money::new(0).clamp_non_negative(), Money::zero());
        assert_eq!(Money::new(42).clamp_non_negative(), Money::new(42));
    }

    #[test]
    fn test_percentage() {
        // 10% of Rp 95.000 = Rp 9.500
        assert_eq!(Money::new(95_000).percentage(1000).amount(), 9_500);
        // 5% of Rp 10.000 = Rp 500
        assert_eq!(Money::new(10_000).percentage(500).amount(), 500);
        // Rounding: 2.5% of 999 = 24.975 → 25
        assert_eq!(Money::new(999).percentage(250).amount(), 25);
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(Money::parse_amount("Rp 10.000"), Money::new(10_000));
        assert_eq!(Money::parse_amount("95,000"), Money::new(95_000));
        assert_eq!(Money::parse_amount("  2500 "), Money::new(2_500));
        assert_eq!(Money::parse_amount(""), Money::zero());
        assert_eq!(Money::parse_amount("no digits here"), Money::zero());
    }

    #[test]
    fn test_parse_amount_overflow_saturates() {
        let huge = "9".repeat(40);
        assert_eq!(Money::parse_amount(&huge), Money::new(i64::MAX));
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        let positive = Money::new(100);
        assert!(positive.is_positive());

        let negative = Money::new(-100);
        assert!(negative.is_negative());
    }

    #[test]
    fn test_multiply_quantity() {
        assert_eq!(Money::new(5_000).multiply_quantity(2).amount(), 10_000);
    }
}
