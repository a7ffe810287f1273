//! # Pricing
//!
//! Line price snapshots, price-change detection and the discount policy.
//!
//! ## Snapshot Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Product.price (mutable, changes over time)                            │
//! │        │                                                                │
//! │        │ copied when the line is written                               │
//! │        ▼                                                                │
//! │  SaleLine.unit_price (frozen)                                          │
//! │                                                                         │
//! │  On update:                                                             │
//! │    stored ≠ current  ──► PriceChangeWarning (caller decides)           │
//! │    updatePrices=false ──► keep stored prices, keep supplied total      │
//! │    updatePrices=true  ──► current prices, total re-derived below       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Discount Policy
//! ```text
//!   discount = subtotal × percent     if a percentage is set
//!            = fixed value            else if a fixed value is set
//!            = 0                      otherwise
//!   total    = max(0, subtotal − discount)
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::quantity::Quantity;
use crate::types::{Product, SaleLine, StockKind};
use crate::warnings::PriceChangeWarning;

// =============================================================================
// Discount Policy
// =============================================================================

/// How a sale's discount is derived from its subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DiscountPolicy {
    pub percent_bps: Option<i64>,
    pub value: Option<Money>,
}

impl DiscountPolicy {
    pub fn new(percent_bps: Option<i64>, value: Option<Money>) -> Self {
        DiscountPolicy { percent_bps, value }
    }

    pub fn is_none(&self) -> bool {
        self.percent_bps.is_none() && self.value.is_none()
    }

    /// Discount for `subtotal`. Percentage takes priority over a fixed value.
    pub fn discount(&self, subtotal: Money) -> Money {
        match (self.percent_bps, self.value) {
            (Some(bps), _) => subtotal.percentage(bps),
            (None, Some(value)) => value,
            (None, None) => Money::zero(),
        }
    }
}

/// A subtotal with its discount applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Repricing {
    pub subtotal: Money,
    pub discount: Money,
    pub total: Money,
}

/// Sums `quantity × unit_price` per line and applies `policy`.
///
/// ## Example
/// ```rust
/// use hearth_core::money::Money;
/// use hearth_core::pricing::{reprice, DiscountPolicy};
/// use hearth_core::quantity::Quantity;
///
/// let lines = [(Quantity::from_units(4), Money::from_cents(250))];
/// let r = reprice(lines, DiscountPolicy::new(Some(1000), None));
/// assert_eq!(r.subtotal.cents(), 1000);
/// assert_eq!(r.discount.cents(), 100);
/// assert_eq!(r.total.cents(), 900);
/// ```
pub fn reprice<I>(lines: I, policy: DiscountPolicy) -> Repricing
where
    I: IntoIterator<Item = (Quantity, Money)>,
{
    let subtotal: Money = lines
        .into_iter()
        .map(|(quantity, unit_price)| unit_price.times(quantity))
        .sum();
    let discount = policy.discount(subtotal);
    Repricing {
        subtotal,
        discount,
        total: (subtotal - discount).clamp_non_negative(),
    }
}

// =============================================================================
// Price Book
// =============================================================================

/// Decides which unit price each product line is written with.
#[derive(Debug)]
pub struct PriceBook<'a> {
    current: &'a HashMap<String, Product>,
    stored: HashMap<String, Money>,
    refresh: bool,
}

impl<'a> PriceBook<'a> {
    /// New lines: every product at its current price.
    pub fn current(current: &'a HashMap<String, Product>) -> Self {
        PriceBook {
            current,
            stored: HashMap::new(),
            refresh: true,
        }
    }

    /// Replacement lines for an existing sale.
    ///
    /// With `refresh` off, products already on the sale keep the price
    /// stored on their first existing line.
    pub fn for_update(
        current: &'a HashMap<String, Product>,
        existing: &[SaleLine],
        refresh: bool,
    ) -> Self {
        let mut stored = HashMap::new();
        for line in existing {
            stored
                .entry(line.product_id.clone())
                .or_insert(line.unit_price);
        }
        PriceBook {
            current,
            stored,
            refresh,
        }
    }

    pub fn unit_price(&self, product_id: &str) -> CoreResult<Money> {
        if !self.refresh {
            if let Some(price) = self.stored.get(product_id) {
                return Ok(*price);
            }
        }
        self.current
            .get(product_id)
            .map(|p| p.price)
            .ok_or_else(|| CoreError::entity_not_found(StockKind::Product, product_id))
    }
}

/// One warning per product that is still on the sale and whose stored line
/// price differs from its current price.
///
/// Products added by the update have nothing stored and never warn.
pub fn price_changes<'s, I>(
    existing: &[SaleLine],
    requested: I,
    current: &HashMap<String, Product>,
) -> Vec<PriceChangeWarning>
where
    I: IntoIterator<Item = &'s str>,
{
    let requested: BTreeSet<&str> = requested.into_iter().collect();
    let mut seen = BTreeSet::new();
    let mut warnings = Vec::new();

    for line in existing {
        if !requested.contains(line.product_id.as_str()) || !seen.insert(line.product_id.as_str())
        {
            continue;
        }
        let Some(product) = current.get(&line.product_id) else {
            continue;
        };
        if product.price != line.unit_price {
            warnings.push(PriceChangeWarning {
                product_id: product.id.clone(),
                product_name: product.name.clone(),
                stored_price: line.unit_price,
                current_price: product.price,
            });
        }
    }

    warnings
}

// =============================================================================
// Unit Tests
// =============================================================================
