//! Create, update and quote conversion.

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::info;
use uuid::Uuid;

use super::{
    approximate_cost, finish, ledger, load_levels, load_payment_method, load_products,
    log_confirmation, package_lines, product_lines, snapshot_of, Decision, SalesEngine,
};
use crate::error::{DbResult, EngineError, EngineResult};
use crate::repository::ledger::LedgerRepository;
use crate::repository::sale::SaleRepository;
use crate::repository::stock::StockRepository;
use hearth_core::ledger::{plan, LedgerPlan, LinkedTransaction};
use hearth_core::pricing::{price_changes, reprice, DiscountPolicy, PriceBook};
use hearth_core::stock::{aggregate, consume, diff, LineTotals};
use hearth_core::validation::{validate_create_sale, validate_update_sale};
use hearth_core::warnings::{evaluate_deltas, stock_gate, StockSnapshot};
use hearth_core::{
    Confirmation, ConvertQuoteInput, CreateSaleInput, MovementReason, Outcome, Sale, StockDelta,
    StockKind, UpdateSaleInput, ValidationError,
};

/// Everything the write phase of a sale operation needs.
struct SaleWrite {
    sale: Sale,
    deltas: Vec<StockDelta>,
    ledger: LedgerPlan,
}

fn product_totals(sale: &Sale) -> LineTotals {
    aggregate(sale.lines.iter().map(|l| (&l.product_id, l.quantity)))
}

fn package_totals(sale: &Sale) -> LineTotals {
    aggregate(sale.packages.iter().map(|p| (&p.package_id, p.quantity)))
}

impl SalesEngine {
    // =========================================================================
    // Create
    // =========================================================================

    /// Creates a finalized sale or a quote.
    ///
    /// ## Flow
    /// 1. Validate input
    /// 2. Resolve payment method, products and packages
    /// 3. Finalized sales only: stop with stock warnings unless `force`
    /// 4. Estimate cost, snapshot current prices onto the lines
    /// 5. One transaction: sale rows, stock decrements, bank transaction
    ///
    /// ## Returns
    /// * `Outcome::Committed(Sale)` - Written
    /// * `Outcome::NeedsConfirmation(InsufficientStock)` - Nothing written
    pub async fn create_sale(
        &self,
        tenant_id: &str,
        input: CreateSaleInput,
    ) -> EngineResult<Outcome<Sale>> {
        const OPERATION: &str = "create_sale";
        validate_create_sale(&input)?;

        let write = match self.prepare_create(tenant_id, &input).await? {
            Decision::Proceed(write) => write,
            Decision::Confirm(confirmation) => {
                log_confirmation(OPERATION, tenant_id, &confirmation);
                return Ok(Outcome::NeedsConfirmation(confirmation));
            }
        };

        let mut tx = self.begin(OPERATION, tenant_id).await?;
        let written = write_created(&mut tx, &write).await;
        finish(OPERATION, tenant_id, tx, written).await?;

        info!(
            tenant_id,
            sale_id = %write.sale.id,
            is_quote = write.sale.is_quote,
            lines = write.sale.lines.len(),
            packages = write.sale.packages.len(),
            total = %write.sale.total,
            "Sale created"
        );
        Ok(Outcome::Committed(write.sale))
    }

    async fn prepare_create(
        &self,
        tenant_id: &str,
        input: &CreateSaleInput,
    ) -> EngineResult<Decision<SaleWrite>> {
        let Some(total) = input.total else {
            return Err(ValidationError::required("total").into());
        };

        let mut conn = self.pool.acquire().await?;
        let method = load_payment_method(&mut conn, tenant_id, &input.payment_method_id).await?;

        let products_requested = aggregate(input.items.iter().map(|i| (&i.product_id, i.quantity)));
        let packages_requested =
            aggregate(input.packages.iter().map(|p| (&p.package_id, p.quantity)));

        let products = load_products(&mut conn, tenant_id, &products_requested).await?;
        let package_levels =
            load_levels(&mut conn, tenant_id, StockKind::Package, &packages_requested).await?;

        let deltas = if input.is_quote {
            Vec::new()
        } else {
            let mut deltas = consume(StockKind::Product, &products_requested);
            deltas.extend(consume(StockKind::Package, &packages_requested));

            let snapshot = snapshot_of(products.values(), package_levels);
            let warnings = evaluate_deltas(&deltas, &snapshot)?;
            if let Some(confirmation) = stock_gate(warnings, input.force) {
                return Ok(Decision::Confirm(confirmation));
            }
            deltas
        };

        let approximate_cost =
            approximate_cost(&mut conn, tenant_id, &products_requested, &packages_requested)
                .await?;
        drop(conn);

        let sale_id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let lines = product_lines(&sale_id, &input.items, &PriceBook::current(&products))?;
        let packages = package_lines(&sale_id, &input.packages);

        let ledger = if input.is_quote {
            LedgerPlan::Noop
        } else {
            plan(None, method.bank_account_id.as_deref(), total)
        };

        let sale = Sale {
            id: sale_id,
            tenant_id: tenant_id.to_string(),
            payment_method_id: method.id,
            client_id: input.client_id.clone(),
            total,
            approximate_cost,
            is_quote: input.is_quote,
            discount_percent_bps: input.discount_percent_bps,
            discount_value: input.discount_value,
            discount_computed: input.discount_computed,
            created_at: now,
            updated_at: now,
            lines,
            packages,
        };

        Ok(Decision::Proceed(SaleWrite {
            sale,
            deltas,
            ledger,
        }))
    }

    // =========================================================================
    // Update
    // =========================================================================

    /// Replaces a sale's line sets, header fields and ledger entry.
    ///
    /// ## Flow
    /// 1. Validate input
    /// 2. Load payment method, the existing sale and its bank transaction
    /// 3. Stop with price warnings if stored line prices changed and
    ///    `update_prices` is unset (stock is not checked yet)
    /// 4. Finalized sales only: diff old vs new lines, stop with stock
    ///    warnings on shortfalls unless `force`
    /// 5. Price the new lines; `update_prices = Some(true)` reprices
    ///    everything and recomputes the total
    /// 6. One transaction: header, lines, stock deltas, ledger move/adjust
    ///
    /// Quotes stay quotes: no stock deltas and no bank transaction.
    pub async fn update_sale(
        &self,
        tenant_id: &str,
        sale_id: &str,
        input: UpdateSaleInput,
    ) -> EngineResult<Outcome<Sale>> {
        const OPERATION: &str = "update_sale";
        validate_update_sale(&input)?;

        let write = match self.prepare_update(tenant_id, sale_id, &input).await? {
            Decision::Proceed(write) => write,
            Decision::Confirm(confirmation) => {
                log_confirmation(OPERATION, tenant_id, &confirmation);
                return Ok(Outcome::NeedsConfirmation(confirmation));
            }
        };

        let mut tx = self.begin(OPERATION, tenant_id).await?;
        let written = write_updated(&mut tx, &write).await;
        let applied = finish(OPERATION, tenant_id, tx, written).await?;

        info!(
            tenant_id,
            sale_id = %write.sale.id,
            stock_deltas = applied,
            ledger = ?write.ledger,
            total = %write.sale.total,
            "Sale updated"
        );
        Ok(Outcome::Committed(write.sale))
    }

    async fn prepare_update(
        &self,
        tenant_id: &str,
        sale_id: &str,
        input: &UpdateSaleInput,
    ) -> EngineResult<Decision<SaleWrite>> {
        let Some(requested_total) = input.total else {
            return Err(ValidationError::required("total").into());
        };

        let mut conn = self.pool.acquire().await?;
        let method = load_payment_method(&mut conn, tenant_id, &input.payment_method_id).await?;
        let existing = SaleRepository::fetch(&mut conn, tenant_id, sale_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Sale", sale_id))?;
        let previous = LedgerRepository::transaction_for_sale(&mut conn, tenant_id, sale_id).await?;

        let products_requested = aggregate(input.items.iter().map(|i| (&i.product_id, i.quantity)));
        let packages_requested =
            aggregate(input.packages.iter().map(|p| (&p.package_id, p.quantity)));

        let products = load_products(&mut conn, tenant_id, &products_requested).await?;
        let package_levels =
            load_levels(&mut conn, tenant_id, StockKind::Package, &packages_requested).await?;

        if !input.items.is_empty() && input.update_prices.is_none() {
            let changes = price_changes(
                &existing.lines,
                products_requested.keys().map(String::as_str),
                &products,
            );
            if !changes.is_empty() {
                return Ok(Decision::Confirm(Confirmation::PriceChanges(changes)));
            }
        }

        let deltas = if existing.is_quote {
            Vec::new()
        } else {
            let mut deltas = diff(
                StockKind::Product,
                &product_totals(&existing),
                &products_requested,
            );
            deltas.extend(diff(
                StockKind::Package,
                &package_totals(&existing),
                &packages_requested,
            ));

            // Removed entities only ever increment, so they need no snapshot entry.
            let snapshot = snapshot_of(products.values(), package_levels);
            let warnings = evaluate_deltas(&deltas, &snapshot)?;
            if let Some(confirmation) = stock_gate(warnings, input.force) {
                return Ok(Decision::Confirm(confirmation));
            }
            deltas
        };

        let approximate_cost =
            approximate_cost(&mut conn, tenant_id, &products_requested, &packages_requested)
                .await?;
        drop(conn);

        let refresh = input.update_prices == Some(true);
        let prices = PriceBook::for_update(&products, &existing.lines, refresh);
        let lines = product_lines(&existing.id, &input.items, &prices)?;
        let packages = package_lines(&existing.id, &input.packages);

        let requested_policy = DiscountPolicy::new(input.discount_percent_bps, input.discount_value);
        let policy = if requested_policy.is_none() {
            DiscountPolicy::new(existing.discount_percent_bps, existing.discount_value)
        } else {
            requested_policy
        };

        let (total, discount_computed) = if refresh {
            let repriced = reprice(lines.iter().map(|l| (l.quantity, l.unit_price)), policy);
            let computed = (!policy.is_none()).then_some(repriced.discount);
            (repriced.total, computed)
        } else {
            (
                requested_total,
                input.discount_computed.or(existing.discount_computed),
            )
        };

        let target_account = if existing.is_quote {
            None
        } else {
            method.bank_account_id.as_deref()
        };
        let linked = previous.as_ref().map(LinkedTransaction::from);
        let ledger = plan(linked.as_ref(), target_account, total);

        let sale = Sale {
            payment_method_id: method.id,
            client_id: input.client_id.clone(),
            total,
            approximate_cost,
            discount_percent_bps: policy.percent_bps,
            discount_value: policy.value,
            discount_computed,
            updated_at: Utc::now(),
            lines,
            packages,
            ..existing
        };

        Ok(Decision::Proceed(SaleWrite {
            sale,
            deltas,
            ledger,
        }))
    }

    // =========================================================================
    // Convert quote
    // =========================================================================

    /// Turns a quote into a finalized sale.
    ///
    /// Consumes stock for the quote's lines (warning unless `force`) and posts
    /// the total to the payment method's bank account.
    ///
    /// ## Errors
    /// * `EngineError::NotFound` - No such sale
    /// * `EngineError::InvalidState` - The sale is already finalized
    pub async fn convert_quote(
        &self,
        tenant_id: &str,
        sale_id: &str,
        input: ConvertQuoteInput,
    ) -> EngineResult<Outcome<Sale>> {
        const OPERATION: &str = "convert_quote";

        let write = match self.prepare_conversion(tenant_id, sale_id, input).await? {
            Decision::Proceed(write) => write,
            Decision::Confirm(confirmation) => {
                log_confirmation(OPERATION, tenant_id, &confirmation);
                return Ok(Outcome::NeedsConfirmation(confirmation));
            }
        };

        let mut tx = self.begin(OPERATION, tenant_id).await?;
        let written = write_converted(&mut tx, &write).await;
        finish(OPERATION, tenant_id, tx, written).await?;

        info!(
            tenant_id,
            sale_id = %write.sale.id,
            total = %write.sale.total,
            "Quote converted to sale"
        );
        Ok(Outcome::Committed(write.sale))
    }

    async fn prepare_conversion(
        &self,
        tenant_id: &str,
        sale_id: &str,
        input: ConvertQuoteInput,
    ) -> EngineResult<Decision<SaleWrite>> {
        let mut conn = self.pool.acquire().await?;
        let quote = SaleRepository::fetch(&mut conn, tenant_id, sale_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Sale", sale_id))?;
        if !quote.is_quote {
            return Err(EngineError::InvalidState(format!(
                "sale {sale_id} is not a quote"
            )));
        }

        let method = load_payment_method(&mut conn, tenant_id, &quote.payment_method_id).await?;
        let previous = LedgerRepository::transaction_for_sale(&mut conn, tenant_id, sale_id).await?;

        let products_requested = product_totals(&quote);
        let packages_requested = package_totals(&quote);
        let product_levels =
            load_levels(&mut conn, tenant_id, StockKind::Product, &products_requested).await?;
        let package_levels =
            load_levels(&mut conn, tenant_id, StockKind::Package, &packages_requested).await?;
        drop(conn);

        let mut deltas = consume(StockKind::Product, &products_requested);
        deltas.extend(consume(StockKind::Package, &packages_requested));

        let snapshot: StockSnapshot = product_levels
            .into_iter()
            .chain(package_levels)
            .map(|level| (level.key.clone(), level))
            .collect();
        let warnings = evaluate_deltas(&deltas, &snapshot)?;
        if let Some(confirmation) = stock_gate(warnings, input.force) {
            return Ok(Decision::Confirm(confirmation));
        }

        let linked = previous.as_ref().map(LinkedTransaction::from);
        let ledger = plan(
            linked.as_ref(),
            method.bank_account_id.as_deref(),
            quote.total,
        );

        let sale = Sale {
            is_quote: false,
            updated_at: Utc::now(),
            ..quote
        };

        Ok(Decision::Proceed(SaleWrite {
            sale,
            deltas,
            ledger,
        }))
    }
}

// =============================================================================
// Write phases
// =============================================================================

async fn write_created(conn: &mut SqliteConnection, write: &SaleWrite) -> DbResult<usize> {
    let sale = &write.sale;
    SaleRepository::insert(conn, sale).await?;
    let applied = StockRepository::apply_all(
        conn,
        &sale.tenant_id,
        &write.deltas,
        MovementReason::Sale,
        Some(&sale.id),
    )
    .await?;
    ledger::apply(conn, &sale.tenant_id, &sale.id, &write.ledger, sale.updated_at).await?;
    Ok(applied)
}

async fn write_updated(conn: &mut SqliteConnection, write: &SaleWrite) -> DbResult<usize> {
    let sale = &write.sale;
    SaleRepository::update_header(conn, sale).await?;
    SaleRepository::replace_lines(conn, sale).await?;
    let applied = StockRepository::apply_all(
        conn,
        &sale.tenant_id,
        &write.deltas,
        MovementReason::SaleUpdate,
        Some(&sale.id),
    )
    .await?;
    ledger::apply(conn, &sale.tenant_id, &sale.id, &write.ledger, sale.updated_at).await?;
    Ok(applied)
}

async fn write_converted(conn: &mut SqliteConnection, write: &SaleWrite) -> DbResult<usize> {
    let sale = &write.sale;
    SaleRepository::mark_converted(conn, &sale.tenant_id, &sale.id, sale.updated_at).await?;
    let applied = StockRepository::apply_all(
        conn,
        &sale.tenant_id,
        &write.deltas,
        MovementReason::QuoteConversion,
        Some(&sale.id),
    )
    .await?;
    ledger::apply(conn, &sale.tenant_id, &sale.id, &write.ledger, sale.updated_at).await?;
    Ok(applied)
}
