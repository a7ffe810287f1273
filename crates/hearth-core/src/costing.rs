//! # Cost Estimator
//!
//! Approximate cost of goods for a set of requested products and packages.
//!
//! ## Resolution
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Croissant × 10                                                         │
//! │   ├── flour  0.050 kg/unit × unit cost 1.20/kg  → 10 × 0.060 = 0.60    │
//! │   ├── butter 0.020 kg/unit × unit cost 9.00/kg  → 10 × 0.180 = 1.80    │
//! │   └── bag    1 /unit       × unit cost 0.05     → 10 × 0.050 = 0.50    │
//! │  Gift box × 1 (sold directly)                   →  1 × 0.75  = 0.75    │
//! │                                                         total  3.65    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - unit cost = price ÷ quantity of the most recent cost record with a
//!   positive price
//! - components without any cost history contribute zero (not an error)
//! - accumulation is exact (`Decimal`); rounding to cents happens once, in
//!   [`crate::money::Money::from_decimal`], when the result is persisted

use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};

use crate::quantity::Quantity;
use crate::stock::LineTotals;
use crate::types::{CompositionLink, CostRecord, StockKey, StockKind};

// =============================================================================
// Lookups
// =============================================================================

/// Composition links grouped by product.
#[derive(Debug, Clone, Default)]
pub struct Compositions {
    by_product: HashMap<String, Vec<CompositionLink>>,
}

impl Compositions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, link: CompositionLink) {
        self.by_product
            .entry(link.product_id.clone())
            .or_default()
            .push(link);
    }

    /// Links for one product; empty if the product has no composition.
    pub fn of(&self, product_id: &str) -> &[CompositionLink] {
        self.by_product
            .get(product_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every distinct component referenced by any product.
    pub fn component_keys(&self) -> Vec<StockKey> {
        let mut keys: Vec<StockKey> = self
            .by_product
            .values()
            .flatten()
            .map(CompositionLink::component_key)
            .collect();
        keys.sort();
        keys.dedup();
        keys
    }
}

impl FromIterator<CompositionLink> for Compositions {
    fn from_iter<I: IntoIterator<Item = CompositionLink>>(iter: I) -> Self {
        let mut compositions = Compositions::new();
        for link in iter {
            compositions.insert(link);
        }
        compositions
    }
}

/// Current unit cost per ingredient/package.
pub type UnitCosts = HashMap<StockKey, Decimal>;

/// Derives the current unit cost from a cost history.
///
/// Picks the most recent record (by `recorded_at`) whose price and quantity
/// are both positive. Returns `None` if there is no such record.
pub fn unit_cost(records: &[CostRecord]) -> Option<Decimal> {
    records
        .iter()
        .filter(|r| r.price.is_positive() && r.quantity.is_positive())
        .max_by_key(|r| r.recorded_at)
        .map(|r| r.price.to_decimal() / r.quantity.to_decimal())
}

// =============================================================================
// Estimation
// =============================================================================

/// Estimates the cost of the requested products and directly sold packages.
///
/// Returns full precision; callers round when persisting.
pub fn estimate_cost(
    products: &LineTotals,
    packages: &LineTotals,
    compositions: &Compositions,
    unit_costs: &UnitCosts,
) -> Decimal {
    let mut total = Decimal::ZERO;

    for (product_id, requested) in products {
        for link in compositions.of(product_id) {
            let Some(cost) = unit_costs.get(&link.component_key()) else {
                continue;
            };
            total += cost * link.quantity_per_unit.to_decimal() * requested.to_decimal();
        }
    }

    for (package_id, requested) in packages {
        if let Some(cost) = unit_costs.get(&StockKey::package(package_id.clone())) {
            total += cost * requested.to_decimal();
        }
    }

    total
}

/// Ingredient/package consumption implied by producing `products`.
///
/// Same resolution as [`estimate_cost`] without prices. Components of a kind
/// whose flag is off are skipped.
pub fn required_components(
    products: &LineTotals,
    compositions: &Compositions,
    include_ingredients: bool,
    include_packages: bool,
) -> BTreeMap<StockKey, Quantity> {
    let mut required: BTreeMap<StockKey, Quantity> = BTreeMap::new();

    for (product_id, produced) in products {
        for link in compositions.of(product_id) {
            let wanted = match link.component_kind {
                StockKind::Ingredient => include_ingredients,
                StockKind::Package => include_packages,
                StockKind::Product => false,
            };
            if !wanted {
                continue;
            }
            *required.entry(link.component_key()).or_default() +=
                link.quantity_per_unit.scale(*produced);
        }
    }

    required
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::stock::aggregate;
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn link(product: &str, kind: StockKind, component: &str, milli: i64) -> CompositionLink {
        CompositionLink {
            product_id: product.into(),
            component_kind: kind,
            component_id: component.into(),
            component_name: component.into(),
            quantity_per_unit: Quantity::from_milli(milli),
        }
    }

    fn record(minutes: i64, qty_milli: i64, price_cents: i64) -> CostRecord {
        CostRecord {
            id: format!("r{}", minutes),
            tenant_id: "t".into(),
            entity_kind: StockKind::Ingredient,
            entity_id: "flour".into(),
            quantity: Quantity::from_milli(qty_milli),
            price: Money::from_cents(price_cents),
            recorded_at: Utc.with_ymd_and_hms(2026, 1, 1, 8, 0, 0).unwrap()
                + Duration::minutes(minutes),
        }
    }

    fn bakery() -> (Compositions, UnitCosts) {
        let compositions: Compositions = vec![
            link("croissant", StockKind::Ingredient, "flour", 50),
            link("croissant", StockKind::Ingredient, "butter", 20),
            link("croissant", StockKind::Package, "bag", 1000),
        ]
        .into_iter()
        .collect();

        let mut costs = UnitCosts::new();
        costs.insert(StockKey::ingredient("flour"), dec!(1.20));
        costs.insert(StockKey::ingredient("butter"), dec!(9.00));
        costs.insert(StockKey::package("bag"), dec!(0.05));
        costs.insert(StockKey::package("gift-box"), dec!(0.75));
        (compositions, costs)
    }

    #[test]
    fn test_unit_cost_uses_latest_positive_record() {
        let records = vec![
            record(0, 1000, 100),
            record(10, 25_000, 3000), // 30.00 / 25 kg = 1.20
            record(20, 1000, 0),      // free sample, ignored
        ];
        assert_eq!(unit_cost(&records), Some(dec!(1.2)));
        assert_eq!(unit_cost(&[record(0, 1000, 0)]), None);
        assert_eq!(unit_cost(&[]), None);
    }

    #[test]
    fn test_estimate_resolves_composition_and_direct_packages() {
        let (compositions, costs) = bakery();
        let products = aggregate([("croissant", Quantity::from_units(10))]);
        let packages = aggregate([("gift-box", Quantity::from_units(1))]);

        let cost = estimate_cost(&products, &packages, &compositions, &costs);
        assert_eq!(cost, dec!(3.65));
    }

    #[test]
    fn test_missing_cost_history_contributes_zero() {
        let (compositions, mut costs) = bakery();
        costs.remove(&StockKey::ingredient("butter"));
        let products = aggregate([("croissant", Quantity::from_units(10))]);

        let cost = estimate_cost(&products, &LineTotals::new(), &compositions, &costs);
        assert_eq!(cost, dec!(1.10));
    }

    #[test]
    fn test_accumulates_without_intermediate_rounding() {
        // 1/3 per unit, three products of one unit each: exact sum is 1.00,
        // rounding each term to cents first would give 0.99.
        let compositions: Compositions = vec![
            link("a", StockKind::Ingredient, "x", 1000),
            link("b", StockKind::Ingredient, "x", 1000),
            link("c", StockKind::Ingredient, "x", 1000),
        ]
        .into_iter()
        .collect();
        let mut costs = UnitCosts::new();
        costs.insert(StockKey::ingredient("x"), Decimal::ONE / Decimal::from(3));
        let products = aggregate([
            ("a", Quantity::from_units(1)),
            ("b", Quantity::from_units(1)),
            ("c", Quantity::from_units(1)),
        ]);

        let cost = estimate_cost(&products, &LineTotals::new(), &compositions, &costs);
        assert_eq!(Money::from_decimal(cost).unwrap().cents(), 100);
    }

    #[test]
    fn test_required_components_respects_flags() {
        let (compositions, _) = bakery();
        let products = aggregate([("croissant", Quantity::from_units(4))]);

        let all = required_components(&products, &compositions, true, true);
        assert_eq!(all[&StockKey::ingredient("flour")], Quantity::from_milli(200));
        assert_eq!(all[&StockKey::package("bag")], Quantity::from_units(4));

        let only_packages = required_components(&products, &compositions, false, true);
        assert_eq!(only_packages.len(), 1);
        assert!(required_components(&products, &compositions, false, false).is_empty());
    }

    #[test]
    fn test_component_keys_are_distinct() {
        let (compositions, _) = bakery();
        assert_eq!(compositions.component_keys().len(), 3);
        assert!(compositions.of("baguette").is_empty());
    }
}
