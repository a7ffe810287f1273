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
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    Sale totals, line prices, bank balances and transaction amounts     │
//! │    are all i64 cents. Intermediate cost math runs in Decimal and is    │
//! │    rounded to cents exactly once, when it is persisted.                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use hearth_core::money::Money;
//!
//! let price = Money::from_cents(350); // 3.50
//! let total = price + Money::from_cents(150);
//! assert_eq!(total.cents(), 500);
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::quantity::Quantity;

/// Basis points in 100%.
pub const BPS_PER_WHOLE: i64 = 10_000;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for balance adjustments
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **sqlx transparent**: Stored as a plain INTEGER column
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Product.price ──► SaleLine.unit_price ──► subtotal ──► Sale.total     │
/// │                                                             │           │
/// │                                 BankTransaction.amount ◄────┘           │
/// │                                          │                              │
/// │                                          ▼                              │
/// │                                 BankAccount.balance                     │
/// │                                                                         │
/// │  CostRecord.price ──► unit cost (Decimal) ──► Sale.approximate_cost    │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
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

    /// Returns the larger of `self` and zero.
    ///
    /// Used for sale totals, which never go below zero after a discount.
    #[inline]
    pub const fn clamp_non_negative(self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            self
        }
    }

    /// Multiplies a unit price by a quantity.
    ///
    /// Quantities are thousandths of a unit, so the product is rounded half
    /// away from zero to the nearest cent.
    ///
    /// ## Example
    /// ```rust
    /// use hearth_core::money::Money;
    /// use hearth_core::quantity::Quantity;
    ///
    /// let unit_price = Money::from_cents(299);
    /// assert_eq!(unit_price.times(Quantity::from_units(3)).cents(), 897);
    /// assert_eq!(unit_price.times(Quantity::from_milli(500)).cents(), 150);
    /// ```
    pub fn times(&self, qty: Quantity) -> Money {
        let raw = self.0 as i128 * qty.milli() as i128;
        Money(round_div(raw, 1000) as i64)
    }

    /// Returns `bps` basis points of this amount, rounded to the nearest cent.
    ///
    /// ## Example
    /// ```rust
    /// use hearth_core::money::Money;
    ///
    /// let subtotal = Money::from_cents(10000); // 100.00
    /// assert_eq!(subtotal.percentage(1000).cents(), 1000); // 10%
    /// ```
    pub fn percentage(&self, bps: i64) -> Money {
        let raw = self.0 as i128 * bps as i128;
        Money(round_div(raw, BPS_PER_WHOLE as i128) as i64)
    }

    /// Returns the exact decimal value in major units.
    #[inline]
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// Rounds a decimal amount in major units to cents (half away from zero).
    ///
    /// This is the single point where full-precision cost math becomes money.
    ///
    /// ## Example
    /// ```rust
    /// use hearth_core::money::Money;
    /// use rust_decimal::Decimal;
    ///
    /// let exact = Decimal::new(12345, 3); // 12.345
    /// assert_eq!(Money::from_decimal(exact).unwrap().cents(), 1235);
    /// ```
    pub fn from_decimal(amount: Decimal) -> CoreResult<Money> {
        let cents = amount
            .checked_mul(Decimal::ONE_HUNDRED)
            .map(|c| c.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
            .and_then(|c| c.to_i64())
            .ok_or_else(|| CoreError::InvalidAmount {
                reason: format!("{} does not fit in cents", amount),
            })?;
        Ok(Money(cents))
    }
}

/// Integer division rounding half away from zero.
pub(crate) fn round_div(numerator: i128, denominator: i128) -> i128 {
    let half = denominator / 2;
    if numerator >= 0 {
        (numerator + half) / denominator
    } else {
        (numerator - half) / denominator
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows money as `major.minor` for logs and tests.
/// Currency formatting belongs to the presentation layer.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
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

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.major(), 10);
        assert_eq!(money.minor(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "10.99");
        assert_eq!(Money::from_cents(500).to_string(), "5.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((-a).cents(), -1000);
        let total: Money = vec![a, b, b].into_iter().sum();
        assert_eq!(total.cents(), 2000);
    }

    #[test]
    fn test_times_fractional_quantity() {
        // 2.99 × 0.333 = 0.99567 → 1.00
        let price = Money::from_cents(299);
        assert_eq!(price.times(Quantity::from_milli(333)).cents(), 100);
        assert_eq!(price.times(Quantity::zero()).cents(), 0);
    }

    #[test]
    fn test_percentage_rounds_half_away() {
        // 0.05 × 50% = 0.025 → 0.03
        assert_eq!(Money::from_cents(5).percentage(5000).cents(), 3);
        assert_eq!(Money::from_cents(-5).percentage(5000).cents(), -3);
    }

    #[test]
    fn test_clamp_non_negative() {
        assert_eq!(Money::from_cents(-1).clamp_non_negative(), Money::zero());
        assert_eq!(Money::from_cents(7).clamp_non_negative().cents(), 7);
    }

    #[test]
    fn test_decimal_round_trip_rounding() {
        assert_eq!(Money::from_decimal(dec!(1.005)).unwrap().cents(), 101);
        assert_eq!(Money::from_decimal(dec!(-1.005)).unwrap().cents(), -101);
        assert_eq!(Money::from_decimal(dec!(0.004)).unwrap().cents(), 0);
        assert_eq!(Money::from_cents(1234).to_decimal(), dec!(12.34));
    }

    #[test]
    fn test_from_decimal_overflow() {
        assert!(Money::from_decimal(Decimal::MAX).is_err());
    }
}
