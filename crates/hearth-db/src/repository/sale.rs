//! # Sale Repository
//!
//! Sale headers and their product/package line sets.
//!
//! ## Line Replacement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  update_sale                                                            │
//! │       │                                                                 │
//! │       ├── update_header(sale)          totals, discount, client, ...   │
//! │       └── replace_lines(sale)                                           │
//! │              ├── DELETE FROM sale_lines    WHERE sale_id = ?           │
//! │              ├── DELETE FROM sale_packages WHERE sale_id = ?           │
//! │              └── INSERT the new sets (position = input order)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Unit prices are written as given; deciding them is the engine's job.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use hearth_core::{Money, Sale, SaleLine, SalePackageLine};

/// Header row; lines are loaded separately.
#[derive(Debug, sqlx::FromRow)]
struct SaleRow {
    id: String,
    tenant_id: String,
    payment_method_id: String,
    client_id: Option<String>,
    total: Money,
    approximate_cost: Money,
    is_quote: bool,
    discount_percent_bps: Option<i64>,
    discount_value: Option<Money>,
    discount_computed: Option<Money>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SaleRow {
    fn into_sale(self, lines: Vec<SaleLine>, packages: Vec<SalePackageLine>) -> Sale {
        Sale {
            id: self.id,
            tenant_id: self.tenant_id,
            payment_method_id: self.payment_method_id,
            client_id: self.client_id,
            total: self.total,
            approximate_cost: self.approximate_cost,
            is_quote: self.is_quote,
            discount_percent_bps: self.discount_percent_bps,
            discount_value: self.discount_value,
            discount_computed: self.discount_computed,
            created_at: self.created_at,
            updated_at: self.updated_at,
            lines,
            packages,
        }
    }
}

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale with its lines.
    ///
    /// ## Returns
    /// * `Ok(Some(Sale))` - Sale found
    /// * `Ok(None)` - No such sale in this tenant
    pub async fn get(&self, tenant_id: &str, id: &str) -> DbResult<Option<Sale>> {
        let mut conn = self.pool.acquire().await?;
        Self::fetch(&mut conn, tenant_id, id).await
    }

    /// Number of sales (quotes included) in the tenant.
    pub async fn count(&self, tenant_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales WHERE tenant_id = ?1")
            .bind(tenant_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    // =========================================================================
    // Connection-level (engine)
    // =========================================================================

    pub(crate) async fn fetch(
        conn: &mut SqliteConnection,
        tenant_id: &str,
        id: &str,
    ) -> DbResult<Option<Sale>> {
        let row = sqlx::query_as::<_, SaleRow>(
            r#"
            SELECT
                id,
                tenant_id,
                payment_method_id,
                client_id,
                total_cents AS total,
                approximate_cost_cents AS approximate_cost,
                is_quote,
                discount_percent_bps,
                discount_value_cents AS discount_value,
                discount_computed_cents AS discount_computed,
                created_at,
                updated_at
            FROM sales
            WHERE tenant_id = ?1 AND id = ?2
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let lines = sqlx::query_as::<_, SaleLine>(
            r#"
            SELECT id, sale_id, product_id, quantity, unit_price_cents AS unit_price
            FROM sale_lines
            WHERE sale_id = ?1
            ORDER BY position
            "#,
        )
        .bind(id)
        .fetch_all(&mut *conn)
        .await?;

        let packages = sqlx::query_as::<_, SalePackageLine>(
            r#"
            SELECT id, sale_id, package_id, quantity
            FROM sale_packages
            WHERE sale_id = ?1
            ORDER BY position
            "#,
        )
        .bind(id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(Some(row.into_sale(lines, packages)))
    }

    /// Inserts the header and both line sets.
    pub(crate) async fn insert(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sales (
                id, tenant_id, payment_method_id, client_id,
                total_cents, approximate_cost_cents, is_quote,
                discount_percent_bps, discount_value_cents, discount_computed_cents,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.tenant_id)
        .bind(&sale.payment_method_id)
        .bind(&sale.client_id)
        .bind(sale.total)
        .bind(sale.approximate_cost)
        .bind(sale.is_quote)
        .bind(sale.discount_percent_bps)
        .bind(sale.discount_value)
        .bind(sale.discount_computed)
        .bind(sale.created_at)
        .bind(sale.updated_at)
        .execute(&mut *conn)
        .await?;

        Self::insert_lines(conn, sale).await?;

        debug!(
            sale_id = %sale.id,
            lines = sale.lines.len(),
            packages = sale.packages.len(),
            "Sale inserted"
        );
        Ok(())
    }

    /// Rewrites the mutable header fields. `is_quote` and `created_at` are untouched.
    ///
    /// Only matches while the stored `is_quote` still equals `sale.is_quote`,
    /// the state the caller planned stock and ledger changes against.
    ///
    /// ## Errors
    /// `DbError::NotFound` if the sale is missing or its quote state changed.
    pub(crate) async fn update_header(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE sales SET
                payment_method_id = ?1,
                client_id = ?2,
                total_cents = ?3,
                approximate_cost_cents = ?4,
                discount_percent_bps = ?5,
                discount_value_cents = ?6,
                discount_computed_cents = ?7,
                updated_at = ?8
            WHERE tenant_id = ?9 AND id = ?10 AND is_quote = ?11
            "#,
        )
        .bind(&sale.payment_method_id)
        .bind(&sale.client_id)
        .bind(sale.total)
        .bind(sale.approximate_cost)
        .bind(sale.discount_percent_bps)
        .bind(sale.discount_value)
        .bind(sale.discount_computed)
        .bind(sale.updated_at)
        .bind(&sale.tenant_id)
        .bind(&sale.id)
        .bind(sale.is_quote)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale", sale.id.clone()));
        }
        Ok(())
    }

    /// Deletes and reinserts both line sets.
    pub(crate) async fn replace_lines(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
        sqlx::query("DELETE FROM sale_lines WHERE sale_id = ?1")
            .bind(&sale.id)
            .execute(&mut *conn)
            .await?;
        sqlx::query("DELETE FROM sale_packages WHERE sale_id = ?1")
            .bind(&sale.id)
            .execute(&mut *conn)
            .await?;

        Self::insert_lines(conn, sale).await
    }

    /// Flips a quote to a finalized sale.
    ///
    /// ## Errors
    /// `DbError::NotFound` if the sale is missing or already finalized.
    pub(crate) async fn mark_converted(
        conn: &mut SqliteConnection,
        tenant_id: &str,
        id: &str,
        at: DateTime<Utc>,
    ) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE sales SET is_quote = 0, updated_at = ?1 WHERE tenant_id = ?2 AND id = ?3 AND is_quote = 1",
        )
        .bind(at)
        .bind(tenant_id)
        .bind(id)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Quote", id));
        }
        Ok(())
    }

    async fn insert_lines(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
        for (position, line) in sale.lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO sale_lines (id, sale_id, product_id, quantity, unit_price_cents, position)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(&line.id)
            .bind(&sale.id)
            .bind(&line.product_id)
            .bind(line.quantity)
            .bind(line.unit_price)
            .bind(position as i64)
            .execute(&mut *conn)
            .await?;
        }

        for (position, line) in sale.packages.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO sale_packages (id, sale_id, package_id, quantity, position)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(&line.id)
            .bind(&sale.id)
            .bind(&line.package_id)
            .bind(line.quantity)
            .bind(position as i64)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }
}
