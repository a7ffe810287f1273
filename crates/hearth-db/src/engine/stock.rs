//! Restocking products, optionally consuming their ingredients and packaging.

use sqlx::SqliteConnection;
use tracing::info;
use uuid::Uuid;

use super::{finish, load_levels, log_confirmation, Decision, SalesEngine};
use crate::error::{DbResult, EngineResult};
use crate::repository::catalog::CatalogRepository;
use crate::repository::stock::StockRepository;
use hearth_core::costing::required_components;
use hearth_core::stock::{aggregate, non_zero, replenish};
use hearth_core::validation::validate_add_stock;
use hearth_core::warnings::{evaluate_deltas, stock_gate};
use hearth_core::{AddStockInput, MovementReason, Outcome, StockDelta, StockKind, StockReceipt};

struct RestockWrite {
    tenant_id: String,
    reference_id: String,
    products: Vec<StockDelta>,
    components: Vec<StockDelta>,
}

impl SalesEngine {
    /// Adds finished products to stock.
    ///
    /// With `deduct_ingredients` / `deduct_packages` set, the components the
    /// products are made of are consumed in the same transaction; shortfalls
    /// on those components stop with stock warnings unless `force`. With
    /// neither flag, only product stock is incremented and nothing can warn.
    ///
    /// ## Returns
    /// * `Outcome::Committed(StockReceipt)` - Every non-zero delta applied
    /// * `Outcome::NeedsConfirmation(InsufficientStock)` - Nothing written
    pub async fn add_product_stock(
        &self,
        tenant_id: &str,
        input: AddStockInput,
    ) -> EngineResult<Outcome<StockReceipt>> {
        const OPERATION: &str = "add_product_stock";
        validate_add_stock(&input)?;

        let write = match self.prepare_restock(tenant_id, &input).await? {
            Decision::Proceed(write) => write,
            Decision::Confirm(confirmation) => {
                log_confirmation(OPERATION, tenant_id, &confirmation);
                return Ok(Outcome::NeedsConfirmation(confirmation));
            }
        };

        let mut tx = self.begin(OPERATION, tenant_id).await?;
        let written = write_restock(&mut tx, &write).await;
        finish(OPERATION, tenant_id, tx, written).await?;

        let applied: Vec<StockDelta> = non_zero(&write.products)
            .chain(non_zero(&write.components))
            .cloned()
            .collect();

        info!(
            tenant_id,
            reference_id = %write.reference_id,
            products = write.products.len(),
            components = write.components.len(),
            "Products restocked"
        );
        Ok(Outcome::Committed(StockReceipt {
            reference_id: write.reference_id,
            applied,
        }))
    }

    async fn prepare_restock(
        &self,
        tenant_id: &str,
        input: &AddStockInput,
    ) -> EngineResult<Decision<RestockWrite>> {
        let added = aggregate(input.items.iter().map(|i| (&i.product_id, i.quantity)));

        let mut conn = self.pool.acquire().await?;
        load_levels(&mut conn, tenant_id, StockKind::Product, &added).await?;

        let mut components = Vec::new();
        if input.deduct_ingredients || input.deduct_packages {
            let product_ids: Vec<String> = added.keys().cloned().collect();
            let compositions =
                CatalogRepository::compositions(&mut conn, tenant_id, &product_ids).await?;

            components = required_components(
                &added,
                &compositions,
                input.deduct_ingredients,
                input.deduct_packages,
            )
            .into_iter()
            .map(|(key, quantity)| StockDelta::new(key, -quantity))
            .collect();

            let snapshot = StockRepository::snapshot(
                &mut conn,
                tenant_id,
                components.iter().map(|d| &d.key),
            )
            .await?;
            let warnings = evaluate_deltas(&components, &snapshot)?;
            if let Some(confirmation) = stock_gate(warnings, input.force) {
                return Ok(Decision::Confirm(confirmation));
            }
        }

        Ok(Decision::Proceed(RestockWrite {
            tenant_id: tenant_id.to_string(),
            reference_id: Uuid::new_v4().to_string(),
            products: replenish(StockKind::Product, &added),
            components,
        }))
    }
}

async fn write_restock(conn: &mut SqliteConnection, write: &RestockWrite) -> DbResult<()> {
    let reference = Some(write.reference_id.as_str());
    StockRepository::apply_all(
        conn,
        &write.tenant_id,
        &write.products,
        MovementReason::Restock,
        reference,
    )
    .await?;
    StockRepository::apply_all(
        conn,
        &write.tenant_id,
        &write.components,
        MovementReason::RestockConsumption,
        reference,
    )
    .await?;
    Ok(())
}
