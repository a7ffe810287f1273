//! # Sales Engine
//!
//! Sale lifecycle and stock consistency: create, update, quote conversion
//! and restocking, each committing as a single transaction.
//!
//! ## Operation Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  1. validate(input)                     ValidationError, nothing read  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  2. read phase (pooled connection)      payment method, sale, products │
//! │       │   diff ─► deltas                stock levels, costs            │
//! │       │   evaluate ─► warnings                                          │
//! │       │                                                                 │
//! │       ├── price changed / stock short ─► Outcome::NeedsConfirmation    │
//! │       │                                  (nothing written)             │
//! │       ▼                                                                 │
//! │  3. write phase (one transaction)       sale rows, stock deltas,       │
//! │       │                                  movement journal, ledger      │
//! │       ├── any failure ─► rollback, EngineError::TransactionFailed      │
//! │       ▼                                                                 │
//! │  4. commit ─► Outcome::Committed                                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The read connection is released before the transaction begins, so a
//! single-connection pool cannot deadlock.
//!
//! ## Concurrency
//! Warnings are computed from a snapshot taken before the transaction.
//! Stock writes are relative (`stock = stock + delta`) and SQLite serializes
//! writers, so concurrent sales never lose each other's updates. A
//! concurrent sale can still drive stock below zero between the snapshot
//! and the commit; no re-check happens inside the transaction.

mod ledger;
mod sale;
mod stock;

use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use std::collections::HashMap;
use tracing::{error, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult, EngineError, EngineResult};
use crate::repository::catalog::CatalogRepository;
use crate::repository::cost::CostRepository;
use crate::repository::ledger::LedgerRepository;
use crate::repository::stock::StockRepository;
use hearth_core::costing::estimate_cost;
use hearth_core::pricing::PriceBook;
use hearth_core::stock::LineTotals;
use hearth_core::warnings::StockSnapshot;
use hearth_core::{
    Confirmation, Money, PackageLineInput, PaymentMethod, Product, ProductLineInput, SaleLine,
    SalePackageLine, StockKey, StockKind, StockLevel,
};

/// Runs sale lifecycle operations against a pool.
///
/// ## Usage
/// ```rust,ignore
/// let engine = db.engine();
///
/// match engine.create_sale(tenant, input).await? {
///     Outcome::Committed(sale) => println!("sale {}", sale.id),
///     Outcome::NeedsConfirmation(c) => ask_user(c),
/// }
/// ```
#[derive(Debug, Clone)]
pub struct SalesEngine {
    pool: SqlitePool,
}

/// Result of a read phase.
enum Decision<P> {
    Proceed(P),
    Confirm(Confirmation),
}

impl SalesEngine {
    pub fn new(pool: SqlitePool) -> Self {
        SalesEngine { pool }
    }

    async fn begin(
        &self,
        operation: &'static str,
        tenant_id: &str,
    ) -> EngineResult<Transaction<'static, Sqlite>> {
        self.pool.begin().await.map_err(|e| {
            error!(operation, tenant_id, error = %e, "Could not begin transaction");
            EngineError::TransactionFailed {
                operation: operation.to_string(),
            }
        })
    }
}

/// Commits if the write phase succeeded, otherwise rolls back.
///
/// The underlying cause is logged; callers only see `TransactionFailed`.
async fn finish<T>(
    operation: &'static str,
    tenant_id: &str,
    tx: Transaction<'static, Sqlite>,
    written: DbResult<T>,
) -> EngineResult<T> {
    let result = match written {
        Ok(value) => tx.commit().await.map(|_| value).map_err(DbError::from),
        Err(e) => {
            if let Err(rollback) = tx.rollback().await {
                warn!(operation, error = %rollback, "Rollback failed");
            }
            Err(e)
        }
    };

    result.map_err(|e| {
        error!(operation, tenant_id, error = %e, "Transaction rolled back");
        EngineError::TransactionFailed {
            operation: operation.to_string(),
        }
    })
}

fn log_confirmation(operation: &'static str, tenant_id: &str, confirmation: &Confirmation) {
    match confirmation {
        Confirmation::PriceChanges(changes) => warn!(
            operation,
            tenant_id,
            count = changes.len(),
            "Stopped: product prices changed"
        ),
        Confirmation::InsufficientStock(warnings) => warn!(
            operation,
            tenant_id,
            count = warnings.len(),
            "Stopped: insufficient stock"
        ),
    }
}

// =============================================================================
// Read-phase helpers
// =============================================================================

async fn load_payment_method(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    id: &str,
) -> EngineResult<PaymentMethod> {
    LedgerRepository::payment_method(conn, tenant_id, id)
        .await?
        .ok_or_else(|| EngineError::not_found("Payment method", id))
}

/// Products for every requested id. Any id missing from the tenant is an error.
async fn load_products(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    requested: &LineTotals,
) -> EngineResult<HashMap<String, Product>> {
    let ids: Vec<String> = requested.keys().cloned().collect();
    let products = CatalogRepository::products_by_ids(conn, tenant_id, &ids).await?;
    if let Some(missing) = ids.iter().find(|id| !products.contains_key(*id)) {
        return Err(EngineError::not_found("Product", missing.clone()));
    }
    Ok(products)
}

/// Stock levels for every requested id of one kind. Any id missing is an error.
async fn load_levels(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    kind: StockKind,
    requested: &LineTotals,
) -> EngineResult<Vec<StockLevel>> {
    let ids: Vec<String> = requested.keys().cloned().collect();
    let levels = StockRepository::levels(conn, tenant_id, kind, &ids).await?;
    if levels.len() != ids.len() {
        let missing = ids
            .iter()
            .find(|id| !levels.iter().any(|l| &l.key.id == *id))
            .cloned()
            .unwrap_or_default();
        return Err(EngineError::not_found(capitalized(kind), missing));
    }
    Ok(levels)
}

fn capitalized(kind: StockKind) -> &'static str {
    match kind {
        StockKind::Product => "Product",
        StockKind::Package => "Package",
        StockKind::Ingredient => "Ingredient",
    }
}

fn product_level(product: &Product) -> StockLevel {
    StockLevel {
        key: StockKey::product(product.id.clone()),
        name: product.name.clone(),
        stock: product.stock,
        min_stock: product.min_stock,
    }
}

/// Snapshot built from already-loaded products and package levels.
fn snapshot_of<'a>(
    products: impl IntoIterator<Item = &'a Product>,
    packages: Vec<StockLevel>,
) -> StockSnapshot {
    products
        .into_iter()
        .map(product_level)
        .chain(packages)
        .map(|level| (level.key.clone(), level))
        .collect()
}

/// Approximate cost of goods, rounded to cents.
async fn approximate_cost(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    products: &LineTotals,
    packages: &LineTotals,
) -> EngineResult<Money> {
    let product_ids: Vec<String> = products.keys().cloned().collect();
    let compositions = CatalogRepository::compositions(conn, tenant_id, &product_ids).await?;

    let mut keys = compositions.component_keys();
    keys.extend(packages.keys().map(|id| StockKey::package(id.clone())));
    let unit_costs = CostRepository::unit_costs(conn, tenant_id, &keys).await?;

    let exact = estimate_cost(products, packages, &compositions, &unit_costs);
    Ok(Money::from_decimal(exact)?)
}

// =============================================================================
// Line building
// =============================================================================

fn product_lines(
    sale_id: &str,
    items: &[ProductLineInput],
    prices: &PriceBook<'_>,
) -> EngineResult<Vec<SaleLine>> {
    items
        .iter()
        .map(|item| {
            Ok(SaleLine {
                id: Uuid::new_v4().to_string(),
                sale_id: sale_id.to_string(),
                product_id: item.product_id.clone(),
                quantity: item.quantity,
                unit_price: prices.unit_price(&item.product_id)?,
            })
        })
        .collect()
}

fn package_lines(sale_id: &str, packages: &[PackageLineInput]) -> Vec<SalePackageLine> {
    packages
        .iter()
        .map(|p| SalePackageLine {
            id: Uuid::new_v4().to_string(),
            sale_id: sale_id.to_string(),
            package_id: p.package_id.clone(),
            quantity: p.quantity,
        })
        .collect()
}
