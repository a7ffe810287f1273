//! # Cost Repository
//!
//! Append-only purchase history for ingredients and packages.
//!
//! The latest record with a positive price and quantity defines an entity's
//! unit cost (see [`hearth_core::costing::unit_cost`]).

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::push_in_list;
use hearth_core::costing::{unit_cost, UnitCosts};
use hearth_core::{CostRecord, Money, Quantity, StockKey, StockKind};

const COST_COLUMNS: &str =
    "id, tenant_id, entity_kind, entity_id, quantity, price_cents AS price, recorded_at";

/// Repository for cost history.
#[derive(Debug, Clone)]
pub struct CostRepository {
    pool: SqlitePool,
}

impl CostRepository {
    /// Creates a new CostRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CostRepository { pool }
    }

    /// Records that `quantity` of an ingredient or package was bought for `price`.
    ///
    /// ## Errors
    /// `DbError::QueryFailed` for product keys; products have no cost history.
    pub async fn record(
        &self,
        tenant_id: &str,
        key: &StockKey,
        quantity: Quantity,
        price: Money,
        recorded_at: DateTime<Utc>,
    ) -> DbResult<CostRecord> {
        if key.kind == StockKind::Product {
            return Err(DbError::QueryFailed(format!(
                "cost history is kept for ingredients and packages, not {key}"
            )));
        }

        let record = CostRecord {
            id: Uuid::new_v4().to_string(),
            tenant_id: tenant_id.to_string(),
            entity_kind: key.kind,
            entity_id: key.id.clone(),
            quantity,
            price,
            recorded_at,
        };

        sqlx::query(
            r#"
            INSERT INTO cost_records (id, tenant_id, entity_kind, entity_id, quantity, price_cents, recorded_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&record.id)
        .bind(&record.tenant_id)
        .bind(record.entity_kind)
        .bind(&record.entity_id)
        .bind(record.quantity)
        .bind(record.price)
        .bind(record.recorded_at)
        .execute(&self.pool)
        .await?;

        debug!(key = %key, price = %price, "Cost recorded");
        Ok(record)
    }

    /// Cost history of one entity, newest first.
    pub async fn history(&self, tenant_id: &str, key: &StockKey) -> DbResult<Vec<CostRecord>> {
        let sql = format!(
            "SELECT {COST_COLUMNS} FROM cost_records \
             WHERE tenant_id = ?1 AND entity_kind = ?2 AND entity_id = ?3 \
             ORDER BY recorded_at DESC"
        );
        let records = sqlx::query_as::<_, CostRecord>(&sql)
            .bind(tenant_id)
            .bind(key.kind)
            .bind(&key.id)
            .fetch_all(&self.pool)
            .await?;
        Ok(records)
    }

    /// Unit cost of one entity, if any usable record exists.
    pub async fn current_unit_cost(
        &self,
        tenant_id: &str,
        key: &StockKey,
    ) -> DbResult<Option<rust_decimal::Decimal>> {
        let mut conn = self.pool.acquire().await?;
        let costs = Self::unit_costs(&mut conn, tenant_id, std::slice::from_ref(key)).await?;
        Ok(costs.get(key).copied())
    }

    /// Unit costs for the given keys. Keys without a usable record are absent.
    pub(crate) async fn unit_costs(
        conn: &mut SqliteConnection,
        tenant_id: &str,
        keys: &[StockKey],
    ) -> DbResult<UnitCosts> {
        let mut by_kind: BTreeMap<StockKind, Vec<String>> = BTreeMap::new();
        for key in keys.iter().filter(|k| k.kind != StockKind::Product) {
            by_kind.entry(key.kind).or_default().push(key.id.clone());
        }

        let mut costs = UnitCosts::new();
        for (kind, ids) in by_kind {
            let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
                "SELECT {COST_COLUMNS} FROM cost_records WHERE tenant_id = "
            ));
            qb.push_bind(tenant_id.to_string());
            qb.push(" AND entity_kind = ");
            qb.push_bind(kind);
            qb.push(" AND entity_id");
            push_in_list(&mut qb, &ids);

            let records = qb.build_query_as::<CostRecord>().fetch_all(&mut *conn).await?;

            let mut grouped: HashMap<String, Vec<CostRecord>> = HashMap::new();
            for record in records {
                grouped.entry(record.entity_id.clone()).or_default().push(record);
            }
            for (id, records) in grouped {
                if let Some(cost) = unit_cost(&records) {
                    costs.insert(StockKey::new(kind, id), cost);
                }
            }
        }

        debug!(requested = keys.len(), priced = costs.len(), "Loaded unit costs");
        Ok(costs)
    }
}
