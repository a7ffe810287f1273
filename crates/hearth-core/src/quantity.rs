//! # Quantity Module
//!
//! Stock levels, line quantities and composition ratios as integer
//! thousandths of a unit.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1 croissant         = Quantity(1000)                                   │
//! │  0.250 kg of flour   = Quantity(250)                                    │
//! │  stock of -3 boxes   = Quantity(-3000)   (only reachable with force)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Same reasoning as [`crate::money::Money`]: no floats in stock math, so
//! `stock + delta` stored by the database is exactly what the engine computed.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use ts_rs::TS;

use crate::money::round_div;

/// Thousandths per whole unit.
pub const MILLI_PER_UNIT: i64 = 1000;

/// A signed quantity in thousandths of a unit.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[ts(export)]
pub struct Quantity(i64);

impl Quantity {
    /// Creates a quantity from thousandths of a unit.
    #[inline]
    pub const fn from_milli(milli: i64) -> Self {
        Quantity(milli)
    }

    /// Creates a quantity of whole units.
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Quantity(units * MILLI_PER_UNIT)
    }

    /// Returns the raw thousandths.
    #[inline]
    pub const fn milli(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Quantity(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub const fn abs(&self) -> Self {
        Quantity(self.0.abs())
    }

    /// Multiplies two quantities (e.g. ratio per unit × units requested).
    ///
    /// ## Example
    /// ```rust
    /// use hearth_core::quantity::Quantity;
    ///
    /// let flour_per_loaf = Quantity::from_milli(250); // 0.250 kg
    /// let loaves = Quantity::from_units(6);
    /// assert_eq!(flour_per_loaf.scale(loaves), Quantity::from_milli(1500));
    /// ```
    pub fn scale(&self, by: Quantity) -> Quantity {
        let raw = self.0 as i128 * by.0 as i128;
        Quantity(round_div(raw, MILLI_PER_UNIT as i128) as i64)
    }

    /// Returns the exact decimal value in units.
    #[inline]
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0, 3)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        let whole = abs / MILLI_PER_UNIT;
        let frac = abs % MILLI_PER_UNIT;
        if frac == 0 {
            write!(f, "{}{}", sign, whole)
        } else {
            let frac = format!("{:03}", frac);
            write!(f, "{}{}.{}", sign, whole, frac.trim_end_matches('0'))
        }
    }
}

impl Add for Quantity {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Quantity(self.0 + other.0)
    }
}

impl AddAssign for Quantity {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Quantity {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Quantity(self.0 - other.0)
    }
}

impl SubAssign for Quantity {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Quantity {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Quantity(-self.0)
    }
}

impl std::iter::Sum for Quantity {
    fn sum<I: Iterator<Item = Quantity>>(iter: I) -> Self {
        iter.fold(Quantity::zero(), |acc, q| acc + q)
    }
}
