//! # hearth-core: Pure Business Logic for Hearth
//!
//! This crate is the **heart** of the sale lifecycle and stock consistency
//! engine. It contains every decision the engine makes as pure functions with
//! zero I/O dependencies; `hearth-db` reads state, calls into this crate, and
//! writes the result inside one transaction.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Hearth Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              CRUD handlers (outside this workspace)             │   │
//! │  │    createSale, updateSale, convertQuote, addProductStock        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │        hearth-db: SalesEngine (read → decide → write)           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ decide                                 │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ hearth-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐          │   │
//! │  │   │ costing  │ │  stock   │ │ warnings │ │  ledger  │          │   │
//! │  │   │ estimate │ │  diff    │ │ evaluate │ │  plan    │          │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────┘          │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐          │   │
//! │  │   │  money   │ │ quantity │ │ pricing  │ │validation│          │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────┘          │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Sale, BankTransaction, inputs)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`quantity`] - Quantities in thousandths of a unit
//! - [`costing`] - Cost Estimator and composition resolution
//! - [`stock`] - Stock Requirement Diff
//! - [`warnings`] - Stock Warning Evaluator and the `Outcome` sum type
//! - [`pricing`] - Price snapshots and the discount policy
//! - [`ledger`] - Ledger Synchronizer planning
//! - [`validation`] - Input validation
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Warnings Are Values**: Insufficient stock is an `Outcome`, not an error
//!
//! ## Example Usage
//!
//! ```rust
//! use hearth_core::quantity::Quantity;
//! use hearth_core::stock::{aggregate, diff};
//! use hearth_core::StockKind;
//!
//! // Sale had 3 croissants, now has 5: two more leave stock.
//! let old = aggregate([("croissant", Quantity::from_units(3))]);
//! let new = aggregate([("croissant", Quantity::from_units(5))]);
//! let deltas = diff(StockKind::Product, &old, &new);
//!
//! assert_eq!(deltas[0].delta, Quantity::from_units(-2));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod costing;
pub mod error;
pub mod ledger;
pub mod money;
pub mod pricing;
pub mod quantity;
pub mod stock;
pub mod types;
pub mod validation;
pub mod warnings;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use hearth_core::Money` instead of
// `use hearth_core::money::Money`

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use quantity::Quantity;
pub use stock::StockDelta;
pub use types::*;
pub use warnings::{Confirmation, Outcome, PriceChangeWarning, StockLevel, StockWarning};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Tenant used by tooling when none is configured.
pub const DEFAULT_TENANT_ID: &str = "00000000-0000-0000-0000-000000000001";

/// Maximum product + package lines on one sale (or items in one restock).
pub const MAX_SALE_LINES: usize = 200;

/// Largest quantity accepted on a single line.
///
/// Catches typos like 10000 instead of 10 before they hit stock.
pub const MAX_LINE_QUANTITY: Quantity = Quantity::from_units(100_000);
