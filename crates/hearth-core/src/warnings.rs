//! # Stock Warning Evaluator
//!
//! Read-only checks that decide whether an operation may commit.
//!
//! ## Two-Phase Confirmation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Caller submits                                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Price warnings?  (update only, updatePrices undecided)                │
//! │       ├── yes ──► NeedsConfirmation(PriceChanges)   stock not checked  │
//! │       ▼                                                                 │
//! │  Stock warnings?  (only decrementing deltas)                           │
//! │       ├── yes, force = false ──► NeedsConfirmation(InsufficientStock)  │
//! │       ▼                                                                 │
//! │  Open transaction, apply, commit ──► Committed(result)                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::quantity::Quantity;
use crate::stock::StockDelta;
use crate::types::{StockKey, StockKind};

// =============================================================================
// Snapshot
// =============================================================================

/// Stock of one entity as read before any transaction opens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StockLevel {
    pub key: StockKey,
    pub name: String,
    pub stock: Quantity,
    pub min_stock: Quantity,
}

impl StockLevel {
    pub fn is_below_minimum(&self) -> bool {
        self.stock < self.min_stock
    }
}

/// Stock levels keyed by entity.
pub type StockSnapshot = HashMap<StockKey, StockLevel>;

// =============================================================================
// Warning Payloads
// =============================================================================

/// The operation would drive an entity's stock below zero.
///
/// `resulting_stock` is negative and purely informational.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StockWarning {
    pub entity_kind: StockKind,
    pub entity_id: String,
    pub entity_name: String,
    pub current_stock: Quantity,
    pub requested_quantity: Quantity,
    pub resulting_stock: Quantity,
}

/// A stored line price no longer matches the product's current price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PriceChangeWarning {
    pub product_id: String,
    pub product_name: String,
    pub stored_price: Money,
    pub current_price: Money,
}

/// Why an operation was not committed yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", content = "warnings", rename_all = "snake_case")]
pub enum Confirmation {
    /// Resubmit with `updatePrices` set.
    PriceChanges(Vec<PriceChangeWarning>),
    /// Resubmit with `force`.
    InsufficientStock(Vec<StockWarning>),
}

/// Result of an engine operation: committed, or stopped before any write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum Outcome<T> {
    Committed(T),
    NeedsConfirmation(Confirmation),
}

impl<T> Outcome<T> {
    pub fn is_committed(&self) -> bool {
        matches!(self, Outcome::Committed(_))
    }

    /// Returns the committed value, if any.
    pub fn committed(self) -> Option<T> {
        match self {
            Outcome::Committed(value) => Some(value),
            Outcome::NeedsConfirmation(_) => None,
        }
    }

    /// Returns the confirmation payload, if any.
    pub fn confirmation(&self) -> Option<&Confirmation> {
        match self {
            Outcome::Committed(_) => None,
            Outcome::NeedsConfirmation(c) => Some(c),
        }
    }
}

// =============================================================================
// Evaluation
// =============================================================================

/// Checks a single decrement against the current stock.
///
/// ## Example
/// ```rust
/// use hearth_core::quantity::Quantity;
/// use hearth_core::types::StockKey;
/// use hearth_core::warnings::{evaluate, StockLevel};
///
/// let level = StockLevel {
///     key: StockKey::product("p"),
///     name: "Croissant".into(),
///     stock: Quantity::from_units(10),
///     min_stock: Quantity::zero(),
/// };
/// let warning = evaluate(&level, Quantity::from_units(15)).unwrap();
/// assert_eq!(warning.resulting_stock, Quantity::from_units(-5));
/// assert!(evaluate(&level, Quantity::from_units(10)).is_none());
/// ```
pub fn evaluate(level: &StockLevel, decrement: Quantity) -> Option<StockWarning> {
    let requested = decrement.abs();
    let resulting = level.stock - requested;
    if !resulting.is_negative() {
        return None;
    }

    Some(StockWarning {
        entity_kind: level.key.kind,
        entity_id: level.key.id.clone(),
        entity_name: level.name.clone(),
        current_stock: level.stock,
        requested_quantity: requested,
        resulting_stock: resulting,
    })
}

/// Evaluates every decrementing delta against the snapshot.
///
/// Increments and zero deltas never warn. Every key with a decrement must be
/// present in `snapshot`.
pub fn evaluate_deltas(
    deltas: &[StockDelta],
    snapshot: &StockSnapshot,
) -> CoreResult<Vec<StockWarning>> {
    let mut warnings = Vec::new();
    for delta in deltas {
        let Some(decrement) = delta.decrement() else {
            continue;
        };
        let level = snapshot
            .get(&delta.key)
            .ok_or_else(|| CoreError::entity_not_found(delta.key.kind, delta.key.id.clone()))?;
        if let Some(warning) = evaluate(level, decrement) {
            warnings.push(warning);
        }
    }
    Ok(warnings)
}

/// Maps non-empty stock warnings to a confirmation unless `force` is set.
pub fn stock_gate(warnings: Vec<StockWarning>, force: bool) -> Option<Confirmation> {
    if warnings.is_empty() || force {
        None
    } else {
        Some(Confirmation::InsufficientStock(warnings))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
