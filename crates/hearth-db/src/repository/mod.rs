//! # Repository Module
//!
//! Database repository implementations.
//!
//! ## Two Entry Points per Repository
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  db.stock().below_minimum(tenant)        &self methods                 │
//! │       │                                  own a pooled connection       │
//! │       ▼                                  (tooling, tests, reports)     │
//! │  StockRepository                                                       │
//! │       ▲                                                                 │
//! │       │                                  associated fns taking         │
//! │  StockRepository::apply(&mut tx, ..)     &mut SqliteConnection         │
//! │                                          (engine read phase and        │
//! │                                           transactional write phase)   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Inside an engine transaction only the transaction's connection is used,
//! never the pool.
//!
//! ## Available Repositories
//!
//! - [`catalog::CatalogRepository`] - Products, packages, ingredients, composition
//! - [`stock::StockRepository`] - Stock levels, deltas, movement journal
//! - [`cost::CostRepository`] - Cost history and unit costs
//! - [`sale::SaleRepository`] - Sales and their line sets
//! - [`ledger::LedgerRepository`] - Payment methods, bank accounts, transactions

pub mod catalog;
pub mod cost;
pub mod ledger;
pub mod sale;
pub mod stock;

use sqlx::{QueryBuilder, Sqlite};

/// Appends ` IN (?, ?, ...)` with one bind per id.
pub(crate) fn push_in_list(qb: &mut QueryBuilder<'_, Sqlite>, ids: &[String]) {
    qb.push(" IN (");
    let mut separated = qb.separated(", ");
    for id in ids {
        separated.push_bind(id.clone());
    }
    separated.push_unseparated(")");
}
