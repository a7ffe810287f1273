//! # Domain Types
//!
//! Entities touched by the sale lifecycle and stock consistency engine.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Stocked entities (StockKind)          Composition                      │
//! │  ┌───────────┐ ┌───────────┐ ┌────────────┐   ┌──────────────────────┐ │
//! │  │  Product  │ │  Package  │ │ Ingredient │   │ CompositionLink      │ │
//! │  │  price    │ │  stock    │ │  stock     │   │ product → component  │ │
//! │  │  stock    │ │  min_stock│ │  min_stock │   │ quantity_per_unit    │ │
//! │  └───────────┘ └───────────┘ └────────────┘   └──────────────────────┘ │
//! │                                                                         │
//! │  ┌───────────────────┐   ┌───────────────┐   ┌────────────────────────┐│
//! │  │ Sale              │   │ PaymentMethod │   │ BankAccount            ││
//! │  │  lines[]          │──►│  bank_account?│──►│  balance               ││
//! │  │  packages[]       │   └───────────────┘   └───────────▲────────────┘│
//! │  │  is_quote         │                                   │             │
//! │  └─────────┬─────────┘        ┌──────────────────────────┴───────────┐ │
//! │            └─────────────────►│ BankTransaction (≤ 1 per sale)       │ │
//! │                               └──────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;
use crate::quantity::Quantity;

// =============================================================================
// Stock Kind
// =============================================================================

/// The three kinds of stocked entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum StockKind {
    Product,
    Package,
    Ingredient,
}

impl StockKind {
    /// Name of the table holding this kind's stock column.
    pub const fn table(&self) -> &'static str {
        match self {
            StockKind::Product => "products",
            StockKind::Package => "packages",
            StockKind::Ingredient => "ingredients",
        }
    }

    /// Lowercase label, matching the stored representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            StockKind::Product => "product",
            StockKind::Package => "package",
            StockKind::Ingredient => "ingredient",
        }
    }
}

impl fmt::Display for StockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of one stocked entity.
///
/// Product and ingredient ids could collide in principle, so every delta
/// and snapshot is keyed by kind AND id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StockKey {
    pub kind: StockKind,
    pub id: String,
}

impl StockKey {
    pub fn new(kind: StockKind, id: impl Into<String>) -> Self {
        StockKey {
            kind,
            id: id.into(),
        }
    }

    pub fn product(id: impl Into<String>) -> Self {
        StockKey::new(StockKind::Product, id)
    }

    pub fn package(id: impl Into<String>) -> Self {
        StockKey::new(StockKind::Package, id)
    }

    pub fn ingredient(id: impl Into<String>) -> Self {
        StockKey::new(StockKind::Ingredient, id)
    }
}

impl fmt::Display for StockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

// =============================================================================
// Stocked Entities
// =============================================================================

/// A product sold to customers.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    /// Current selling price. Sale lines snapshot it.
    pub price: Money,
    pub stock: Quantity,
    pub min_stock: Quantity,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Packaging (boxes, bags) consumed by products or sold directly.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub stock: Quantity,
    pub min_stock: Quantity,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// A raw ingredient consumed when products are baked.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub stock: Quantity,
    pub min_stock: Quantity,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// How much of one ingredient or package a single unit of product consumes.
///
/// Read-only for the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CompositionLink {
    pub product_id: String,
    /// `Ingredient` or `Package`.
    pub component_kind: StockKind,
    pub component_id: String,
    pub component_name: String,
    pub quantity_per_unit: Quantity,
}

impl CompositionLink {
    pub fn component_key(&self) -> StockKey {
        StockKey::new(self.component_kind, self.component_id.clone())
    }
}

/// One purchase observation for an ingredient or package.
///
/// Append-only; the latest record with a positive price defines unit cost.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CostRecord {
    pub id: String,
    pub tenant_id: String,
    pub entity_kind: StockKind,
    pub entity_id: String,
    pub quantity: Quantity,
    pub price: Money,
    #[ts(as = "String")]
    pub recorded_at: DateTime<Utc>,
}

// =============================================================================
// Finance
// =============================================================================

/// A way of paying. Optionally linked to a bank account.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethod {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub bank_account_id: Option<String>,
}

/// A bank account with a denormalized running balance.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BankAccount {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub balance: Money,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// The ledger entry recording a sale's payment into a bank account.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BankTransaction {
    pub id: String,
    pub tenant_id: String,
    pub bank_account_id: String,
    pub sale_id: String,
    pub amount: Money,
    pub description: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Sale
// =============================================================================

/// A finalized sale or a quote.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: String,
    pub tenant_id: String,
    pub payment_method_id: String,
    pub client_id: Option<String>,
    pub total: Money,
    /// Estimated cost of goods, rounded to cents when written.
    pub approximate_cost: Money,
    /// Quotes never touch stock or the ledger.
    pub is_quote: bool,
    /// Percentage discount in basis points. Takes priority over `discount_value`.
    pub discount_percent_bps: Option<i64>,
    pub discount_value: Option<Money>,
    pub discount_computed: Option<Money>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    pub lines: Vec<SaleLine>,
    pub packages: Vec<SalePackageLine>,
}

/// A product line. Snapshot pattern: `unit_price` is frozen when written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleLine {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    pub quantity: Quantity,
    pub unit_price: Money,
}

impl SaleLine {
    pub fn line_total(&self) -> Money {
        self.unit_price.times(self.quantity)
    }
}

/// A package sold directly (not as part of a product).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SalePackageLine {
    pub id: String,
    pub sale_id: String,
    pub package_id: String,
    pub quantity: Quantity,
}

// =============================================================================
// Stock Movements
// =============================================================================

/// Why a stock delta was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MovementReason {
    /// A sale was created as finalized.
    Sale,
    /// A finalized sale's lines were replaced.
    SaleUpdate,
    /// A quote was converted into a sale.
    QuoteConversion,
    /// Products were added to stock.
    Restock,
    /// Ingredients/packages consumed by a restock.
    RestockConsumption,
}

/// Journal row written next to every applied stock delta.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StockMovement {
    pub id: String,
    pub tenant_id: String,
    pub entity_kind: StockKind,
    pub entity_id: String,
    pub delta: Quantity,
    pub reason: MovementReason,
    pub reference_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Engine Inputs
// =============================================================================

/// Requested product quantity on a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductLineInput {
    pub product_id: String,
    pub quantity: Quantity,
}

/// Requested package quantity on a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PackageLineInput {
    pub package_id: String,
    pub quantity: Quantity,
}

/// Payload for creating a sale or a quote.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CreateSaleInput {
    pub payment_method_id: String,
    pub total: Option<Money>,
    #[serde(default)]
    pub items: Vec<ProductLineInput>,
    #[serde(default)]
    pub packages: Vec<PackageLineInput>,
    #[serde(default)]
    pub is_quote: bool,
    pub client_id: Option<String>,
    pub discount_percent_bps: Option<i64>,
    pub discount_value: Option<Money>,
    pub discount_computed: Option<Money>,
    /// Waives the stock warning gate.
    #[serde(default)]
    pub force: bool,
}

/// Payload for replacing a sale's line sets.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSaleInput {
    pub payment_method_id: String,
    pub total: Option<Money>,
    #[serde(default)]
    pub items: Vec<ProductLineInput>,
    #[serde(default)]
    pub packages: Vec<PackageLineInput>,
    pub client_id: Option<String>,
    pub discount_percent_bps: Option<i64>,
    pub discount_value: Option<Money>,
    pub discount_computed: Option<Money>,
    #[serde(default)]
    pub force: bool,
    /// `None` means the caller has not decided yet; changed prices stop
    /// the update with a confirmation payload.
    pub update_prices: Option<bool>,
}

/// Payload for converting a quote into a sale.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ConvertQuoteInput {
    #[serde(default)]
    pub force: bool,
}

/// One product to add to stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AddStockItem {
    pub product_id: String,
    pub quantity: Quantity,
}

/// Payload for restocking products.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AddStockInput {
    pub items: Vec<AddStockItem>,
    #[serde(default)]
    pub deduct_ingredients: bool,
    #[serde(default)]
    pub deduct_packages: bool,
    #[serde(default)]
    pub force: bool,
}

/// Result of a committed restock: every delta that was applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StockReceipt {
    /// Groups this restock's movement journal rows.
    pub reference_id: String,
    pub applied: Vec<crate::stock::StockDelta>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_kind_labels() {
        assert_eq!(StockKind::Product.table(), "products");
        assert_eq!(StockKind::Ingredient.to_string(), "ingredient");
        assert_eq!(
            serde_json::to_string(&StockKind::Package).unwrap(),
            "\"package\""
        );
    }

    #[test]
    fn test_stock_key_ordering_groups_by_kind() {
        let mut keys = vec![
            StockKey::ingredient("a"),
            StockKey::product("z"),
            StockKey::package("m"),
            StockKey::product("b"),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                StockKey::product("b"),
                StockKey::product("z"),
                StockKey::package("m"),
                StockKey::ingredient("a"),
            ]
        );
    }

    #[test]
    fn test_line_total_uses_snapshot_price() {
        let line = SaleLine {
            id: "l1".into(),
            sale_id: "s1".into(),
            product_id: "p1".into(),
            quantity: Quantity::from_units(4),
            unit_price: Money::from_cents(125),
        };
        assert_eq!(line.line_total().cents(), 500);
    }

    #[test]
    fn test_update_input_defaults_to_undecided_prices() {
        let input: UpdateSaleInput = serde_json::from_str(
            r#"{"paymentMethodId":"pm","total":1000,"items":[{"productId":"p","quantity":2000}]}"#,
        )
        .unwrap();
        assert_eq!(input.update_prices, None);
        assert!(!input.force);
        assert_eq!(input.items[0].quantity, Quantity::from_units(2));
    }
}
