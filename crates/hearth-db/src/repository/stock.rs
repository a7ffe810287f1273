//! # Stock Repository
//!
//! Stock levels and the movement journal.
//!
//! ## Relative Writes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  StockDelta { product:croissant, -3 }                                  │
//! │       │                                                                 │
//! │       ├── UPDATE products SET stock = stock + (-3) WHERE id = ...      │
//! │       │        (never "SET stock = <value read earlier>")              │
//! │       │                                                                 │
//! │       └── INSERT INTO stock_movements (delta = -3, reason, reference)  │
//! │                                                                         │
//! │  Both statements run on the caller's transaction connection.           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Zero deltas are skipped: they neither touch the row nor write a movement.

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use std::collections::BTreeMap;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::push_in_list;
use hearth_core::stock::non_zero;
use hearth_core::warnings::StockSnapshot;
use hearth_core::{MovementReason, Quantity, StockDelta, StockKey, StockKind, StockLevel, StockMovement};

const MOVEMENT_COLUMNS: &str =
    "id, tenant_id, entity_kind, entity_id, delta, reason, reference_id, created_at";

#[derive(Debug, sqlx::FromRow)]
struct LevelRow {
    id: String,
    name: String,
    stock: Quantity,
    min_stock: Quantity,
}

impl LevelRow {
    fn into_level(self, kind: StockKind) -> StockLevel {
        StockLevel {
            key: StockKey::new(kind, self.id),
            name: self.name,
            stock: self.stock,
            min_stock: self.min_stock,
        }
    }
}

/// Repository for stock levels and movements.
#[derive(Debug, Clone)]
pub struct StockRepository {
    pool: SqlitePool,
}

impl StockRepository {
    /// Creates a new StockRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StockRepository { pool }
    }

    /// Current level of one entity, if it exists in the tenant.
    pub async fn level(&self, tenant_id: &str, key: &StockKey) -> DbResult<Option<StockLevel>> {
        let mut conn = self.pool.acquire().await?;
        let levels = Self::levels(&mut conn, tenant_id, key.kind, &[key.id.clone()]).await?;
        Ok(levels.into_iter().next())
    }

    /// Current stock of one entity.
    ///
    /// ## Errors
    /// `DbError::NotFound` if the entity is not in the tenant.
    pub async fn stock_of(&self, tenant_id: &str, key: &StockKey) -> DbResult<Quantity> {
        self.level(tenant_id, key)
            .await?
            .map(|level| level.stock)
            .ok_or_else(|| DbError::not_found(key.kind.as_str(), key.id.clone()))
    }

    /// Every entity whose stock is below its configured minimum.
    ///
    /// Products first, then packages, then ingredients; by name within a kind.
    pub async fn below_minimum(&self, tenant_id: &str) -> DbResult<Vec<StockLevel>> {
        let mut result = Vec::new();
        for kind in [StockKind::Product, StockKind::Package, StockKind::Ingredient] {
            let sql = format!(
                "SELECT id, name, stock, min_stock FROM {} \
                 WHERE tenant_id = ?1 AND stock < min_stock ORDER BY name",
                kind.table()
            );
            let rows = sqlx::query_as::<_, LevelRow>(&sql)
                .bind(tenant_id)
                .fetch_all(&self.pool)
                .await?;
            result.extend(rows.into_iter().map(|row| row.into_level(kind)));
        }

        debug!(count = result.len(), "Entities below minimum stock");
        Ok(result)
    }

    /// Movements written by one operation (a sale id or a restock reference).
    pub async fn movements_for(
        &self,
        tenant_id: &str,
        reference_id: &str,
    ) -> DbResult<Vec<StockMovement>> {
        let sql = format!(
            "SELECT {MOVEMENT_COLUMNS} FROM stock_movements \
             WHERE tenant_id = ?1 AND reference_id = ?2 ORDER BY created_at, entity_kind, entity_id"
        );
        let movements = sqlx::query_as::<_, StockMovement>(&sql)
            .bind(tenant_id)
            .bind(reference_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(movements)
    }

    /// Full journal of one entity, oldest first.
    pub async fn movements_of(
        &self,
        tenant_id: &str,
        key: &StockKey,
    ) -> DbResult<Vec<StockMovement>> {
        let sql = format!(
            "SELECT {MOVEMENT_COLUMNS} FROM stock_movements \
             WHERE tenant_id = ?1 AND entity_kind = ?2 AND entity_id = ?3 ORDER BY created_at"
        );
        let movements = sqlx::query_as::<_, StockMovement>(&sql)
            .bind(tenant_id)
            .bind(key.kind)
            .bind(&key.id)
            .fetch_all(&self.pool)
            .await?;
        Ok(movements)
    }

    // =========================================================================
    // Connection-level (engine)
    // =========================================================================

    /// Levels of the given entities of one kind. Ids not in the tenant are absent.
    pub(crate) async fn levels(
        conn: &mut SqliteConnection,
        tenant_id: &str,
        kind: StockKind,
        ids: &[String],
    ) -> DbResult<Vec<StockLevel>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT id, name, stock, min_stock FROM {} WHERE tenant_id = ",
            kind.table()
        ));
        qb.push_bind(tenant_id.to_string());
        qb.push(" AND id");
        push_in_list(&mut qb, ids);

        let rows = qb.build_query_as::<LevelRow>().fetch_all(&mut *conn).await?;
        Ok(rows.into_iter().map(|row| row.into_level(kind)).collect())
    }

    /// Snapshot of every given key, across kinds.
    pub(crate) async fn snapshot<'k, I>(
        conn: &mut SqliteConnection,
        tenant_id: &str,
        keys: I,
    ) -> DbResult<StockSnapshot>
    where
        I: IntoIterator<Item = &'k StockKey>,
    {
        let mut by_kind: BTreeMap<StockKind, Vec<String>> = BTreeMap::new();
        for key in keys {
            by_kind.entry(key.kind).or_default().push(key.id.clone());
        }

        let mut snapshot = StockSnapshot::new();
        for (kind, mut ids) in by_kind {
            ids.sort();
            ids.dedup();
            for level in Self::levels(conn, tenant_id, kind, &ids).await? {
                snapshot.insert(level.key.clone(), level);
            }
        }
        Ok(snapshot)
    }

    /// Applies one delta relative to the stored stock and journals it.
    ///
    /// ## Errors
    /// `DbError::NotFound` if no row in the tenant matched.
    pub(crate) async fn apply(
        conn: &mut SqliteConnection,
        tenant_id: &str,
        delta: &StockDelta,
        reason: MovementReason,
        reference_id: Option<&str>,
    ) -> DbResult<()> {
        let now = Utc::now();

        let sql = format!(
            "UPDATE {} SET stock = stock + ?1, updated_at = ?2 WHERE tenant_id = ?3 AND id = ?4",
            delta.key.kind.table()
        );
        let result = sqlx::query(&sql)
            .bind(delta.delta)
            .bind(now)
            .bind(tenant_id)
            .bind(&delta.key.id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(delta.key.kind.as_str(), delta.key.id.clone()));
        }

        sqlx::query(
            r#"
            INSERT INTO stock_movements (id, tenant_id, entity_kind, entity_id, delta, reason, reference_id, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(tenant_id)
        .bind(delta.key.kind)
        .bind(&delta.key.id)
        .bind(delta.delta)
        .bind(reason)
        .bind(reference_id)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        debug!(key = %delta.key, delta = %delta.delta, ?reason, "Stock delta applied");
        Ok(())
    }

    /// Applies every non-zero delta. Returns how many were applied.
    pub(crate) async fn apply_all(
        conn: &mut SqliteConnection,
        tenant_id: &str,
        deltas: &[StockDelta],
        reason: MovementReason,
        reference_id: Option<&str>,
    ) -> DbResult<usize> {
        let mut applied = 0;
        for delta in non_zero(deltas) {
            Self::apply(conn, tenant_id, delta, reason, reference_id).await?;
            applied += 1;
        }
        Ok(applied)
    }
}
