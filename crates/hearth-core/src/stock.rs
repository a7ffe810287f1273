//! # Stock Requirement Diff
//!
//! Turns line sets into signed per-entity stock deltas.
//!
//! ## Sign Convention
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  delta > 0  → stock goes UP    (fewer units consumed than before)      │
//! │  delta < 0  → stock goes DOWN  (more units consumed than before)       │
//! │  delta = 0  → nothing to write (kept so callers can observe it)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Update Diff
//! ```text
//!   old lines                 new lines
//!   P1 × 3                    P1 × 5        → P1: 3 − 5 = −2
//!   P2 × 1                    P3 × 4        → P3: 0 − 4 = −4
//!                                           → P2: +1 (removed, full restock)
//! ```
//!
//! Lines are aggregated per entity first, so a product appearing on two
//! lines yields exactly one delta.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

use crate::quantity::Quantity;
use crate::types::{StockKey, StockKind};

/// Quantities per entity id, duplicates collapsed.
pub type LineTotals = BTreeMap<String, Quantity>;

/// A signed stock change for one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StockDelta {
    pub key: StockKey,
    pub delta: Quantity,
}

impl StockDelta {
    pub fn new(key: StockKey, delta: Quantity) -> Self {
        StockDelta { key, delta }
    }

    /// The amount that must be available for this delta, if it decrements.
    pub fn decrement(&self) -> Option<Quantity> {
        if self.delta.is_negative() {
            Some(self.delta.abs())
        } else {
            None
        }
    }
}

/// Sums quantities per entity id.
///
/// ## Example
/// ```rust
/// use hearth_core::quantity::Quantity;
/// use hearth_core::stock::aggregate;
///
/// let totals = aggregate([
///     ("croissant", Quantity::from_units(2)),
///     ("baguette", Quantity::from_units(1)),
///     ("croissant", Quantity::from_units(3)),
/// ]);
/// assert_eq!(totals["croissant"], Quantity::from_units(5));
/// assert_eq!(totals.len(), 2);
/// ```
pub fn aggregate<I, S>(lines: I) -> LineTotals
where
    I: IntoIterator<Item = (S, Quantity)>,
    S: AsRef<str>,
{
    let mut totals = LineTotals::new();
    for (id, qty) in lines {
        *totals.entry(id.as_ref().to_string()).or_default() += qty;
    }
    totals
}

/// Computes one delta per distinct entity between two aggregated line sets.
///
/// 1. every entity in `new` gets `old − new` (old defaults to zero)
/// 2. every entity only in `old` gets `+old` (fully restocked)
///
/// Zero deltas are included.
pub fn diff(kind: StockKind, old: &LineTotals, new: &LineTotals) -> Vec<StockDelta> {
    let mut remaining = old.clone();
    let mut deltas = Vec::with_capacity(old.len() + new.len());

    for (id, new_qty) in new {
        let old_qty = remaining.remove(id).unwrap_or_default();
        deltas.push(StockDelta::new(StockKey::new(kind, id.clone()), old_qty - *new_qty));
    }

    for (id, old_qty) in remaining {
        deltas.push(StockDelta::new(StockKey::new(kind, id), old_qty));
    }

    deltas
}

/// Full decrement for every requested entity.
///
/// Used by create and convert-quote, which never diff.
pub fn consume(kind: StockKind, requested: &LineTotals) -> Vec<StockDelta> {
    requested_as(kind, requested, |q| -q)
}

/// Full increment for every entity.
pub fn replenish(kind: StockKind, added: &LineTotals) -> Vec<StockDelta> {
    requested_as(kind, added, |q| q)
}

fn requested_as(
    kind: StockKind,
    totals: &LineTotals,
    sign: impl Fn(Quantity) -> Quantity,
) -> Vec<StockDelta> {
    totals
        .iter()
        .map(|(id, qty)| StockDelta::new(StockKey::new(kind, id.clone()), sign(*qty)))
        .collect()
}

/// Deltas that actually change stock.
pub fn non_zero(deltas: &[StockDelta]) -> impl Iterator<Item = &StockDelta> {
    deltas.iter().filter(|d| !d.delta.is_zero())
}

// =============================================================================
// Unit Tests
// =============================================================================
