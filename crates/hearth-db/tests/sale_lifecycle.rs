//! Create, update and quote conversion against a real SQLite database.

mod common;

use common::{cents, committed, confirmation, item, units, Bakery, TENANT};
use hearth_core::{
    Confirmation, ConvertQuoteInput, CreateSaleInput, MovementReason, PackageLineInput,
    ProductLineInput, Quantity, StockKey, StockKind, UpdateSaleInput,
};
use hearth_db::EngineError;

fn sale_of(bakery: &Bakery, items: Vec<ProductLineInput>, total: i64) -> CreateSaleInput {
    CreateSaleInput {
        payment_method_id: bakery.card_a.id.clone(),
        total: Some(cents(total)),
        items,
        ..Default::default()
    }
}

fn bags(bakery: &Bakery, n: i64) -> Vec<PackageLineInput> {
    vec![PackageLineInput {
        package_id: bakery.bag.id.clone(),
        quantity: units(n),
    }]
}

fn update_of(payment_method_id: &str, items: Vec<ProductLineInput>, total: i64) -> UpdateSaleInput {
    UpdateSaleInput {
        payment_method_id: payment_method_id.to_string(),
        total: Some(cents(total)),
        items,
        ..Default::default()
    }
}

// =============================================================================
// Create
// =============================================================================

#[tokio::test]
async fn test_insufficient_stock_stops_create_without_writing() {
    let bakery = Bakery::open().await;
    let engine = bakery.db.engine();

    let outcome = engine
        .create_sale(TENANT, sale_of(&bakery, vec![item(&bakery.croissant, 15)], 2700))
        .await
        .unwrap();

    let Confirmation::InsufficientStock(warnings) = confirmation(outcome) else {
        panic!("expected a stock warning");
    };
    assert_eq!(warnings.len(), 1);
    let warning = &warnings[0];
    assert_eq!(warning.entity_kind, StockKind::Product);
    assert_eq!(warning.entity_id, bakery.croissant.id);
    assert_eq!(warning.entity_name, "Croissant");
    assert_eq!(warning.current_stock, units(10));
    assert_eq!(warning.requested_quantity, units(15));
    assert_eq!(warning.resulting_stock, units(-5));

    assert_eq!(bakery.croissants().await, units(10));
    assert_eq!(bakery.sale_count().await, 0);
    assert_eq!(bakery.balance(&bakery.account_a).await, cents(0));
}

#[tokio::test]
async fn test_forced_create_applies_decrement_below_zero() {
    let bakery = Bakery::open().await;
    let engine = bakery.db.engine();

    let mut input = sale_of(&bakery, vec![item(&bakery.croissant, 15)], 2700);
    input.force = true;
    let sale = committed(engine.create_sale(TENANT, input).await.unwrap());

    assert!(!sale.is_quote);
    assert_eq!(sale.lines.len(), 1);
    assert_eq!(sale.lines[0].unit_price, cents(180));
    assert_eq!(bakery.croissants().await, units(-5));

    let tx = bakery
        .db
        .ledger()
        .sale_transaction(TENANT, &sale.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(tx.bank_account_id, bakery.account_a.id);
    assert_eq!(tx.amount, cents(2700));
    assert_eq!(bakery.balance(&bakery.account_a).await, cents(2700));

    let movements = bakery.db.stock().movements_for(TENANT, &sale.id).await.unwrap();
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].delta, units(-15));
    assert_eq!(movements[0].reason, MovementReason::Sale);
}

#[tokio::test]
async fn test_create_estimates_cost_from_composition_and_packages() {
    let bakery = Bakery::open().await;
    let engine = bakery.db.engine();

    let mut input = sale_of(&bakery, vec![item(&bakery.croissant, 2)], 360);
    input.packages = vec![PackageLineInput {
        package_id: bakery.bag.id.clone(),
        quantity: units(3),
    }];
    let sale = committed(engine.create_sale(TENANT, input).await.unwrap());

    // 2 × (2 × 0.50 + 1 × 0.10) + 3 × 0.10
    assert_eq!(sale.approximate_cost, cents(250));

    // Selling a product consumes the product, not its components.
    assert_eq!(bakery.croissants().await, units(8));
    assert_eq!(bakery.flour_stock().await, units(1));
    assert_eq!(
        bakery.stock(StockKey::package(bakery.bag.id.clone())).await,
        units(97)
    );

    let stored = bakery.db.sales().get(TENANT, &sale.id).await.unwrap().unwrap();
    assert_eq!(stored.approximate_cost, cents(250));
    assert_eq!(stored.packages.len(), 1);
}

#[tokio::test]
async fn test_duplicate_lines_are_checked_as_one_total() {
    let bakery = Bakery::open().await;
    let engine = bakery.db.engine();

    let outcome = engine
        .create_sale(
            TENANT,
            sale_of(
                &bakery,
                vec![item(&bakery.croissant, 6), item(&bakery.croissant, 6)],
                2160,
            ),
        )
        .await
        .unwrap();

    let Confirmation::InsufficientStock(warnings) = confirmation(outcome) else {
        panic!("expected a stock warning");
    };
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].requested_quantity, units(12));
}

#[tokio::test]
async fn test_quote_touches_neither_stock_nor_ledger() {
    let bakery = Bakery::open().await;
    let engine = bakery.db.engine();

    let mut input = sale_of(&bakery, vec![item(&bakery.croissant, 15)], 2700);
    input.is_quote = true;
    let quote = committed(engine.create_sale(TENANT, input).await.unwrap());

    assert!(quote.is_quote);
    assert_eq!(bakery.croissants().await, units(10));
    assert_eq!(bakery.balance(&bakery.account_a).await, cents(0));
    assert!(bakery
        .db
        .ledger()
        .sale_transaction(TENANT, &quote.id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_cash_sale_posts_no_bank_transaction() {
    let bakery = Bakery::open().await;
    let engine = bakery.db.engine();

    let mut input = sale_of(&bakery, vec![item(&bakery.baguette, 2)], 260);
    input.payment_method_id = bakery.cash.id.clone();
    let sale = committed(engine.create_sale(TENANT, input).await.unwrap());

    assert!(bakery
        .db
        .ledger()
        .sale_transaction(TENANT, &sale.id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_create_rejects_bad_input_before_reading() {
    let bakery = Bakery::open().await;
    let engine = bakery.db.engine();

    let empty = sale_of(&bakery, Vec::new(), 0);
    assert!(matches!(
        engine.create_sale(TENANT, empty).await,
        Err(EngineError::Validation(_))
    ));

    let mut no_total = sale_of(&bakery, vec![item(&bakery.croissant, 1)], 0);
    no_total.total = None;
    assert!(matches!(
        engine.create_sale(TENANT, no_total).await,
        Err(EngineError::Validation(_))
    ));

    let mut zero_qty = sale_of(&bakery, vec![item(&bakery.croissant, 1)], 180);
    zero_qty.items[0].quantity = Quantity::zero();
    assert!(matches!(
        engine.create_sale(TENANT, zero_qty).await,
        Err(EngineError::Validation(_))
    ));

    assert_eq!(bakery.sale_count().await, 0);
}

#[tokio::test]
async fn test_create_unknown_references_are_not_found() {
    let bakery = Bakery::open().await;
    let engine = bakery.db.engine();

    let mut unknown_method = sale_of(&bakery, vec![item(&bakery.croissant, 1)], 180);
    unknown_method.payment_method_id = "nope".into();
    assert!(matches!(
        engine.create_sale(TENANT, unknown_method).await,
        Err(EngineError::NotFound { .. })
    ));

    let unknown_product = sale_of(
        &bakery,
        vec![ProductLineInput {
            product_id: "ghost".into(),
            quantity: units(1),
        }],
        180,
    );
    assert!(matches!(
        engine.create_sale(TENANT, unknown_product).await,
        Err(EngineError::NotFound { .. })
    ));

    // Another tenant cannot see this bakery's payment methods.
    let foreign = sale_of(&bakery, vec![item(&bakery.croissant, 1)], 180);
    assert!(matches!(
        engine.create_sale("bakery-2", foreign).await,
        Err(EngineError::NotFound { .. })
    ));

    assert_eq!(bakery.croissants().await, units(10));
}

// =============================================================================
// Update
// =============================================================================

#[tokio::test]
async fn test_update_applies_only_the_difference() {
    let bakery = Bakery::open().await;
    let engine = bakery.db.engine();

    let sale = committed(
        engine
            .create_sale(TENANT, sale_of(&bakery, vec![item(&bakery.croissant, 3)], 540))
            .await
            .unwrap(),
    );
    assert_eq!(bakery.croissants().await, units(7));

    let updated = committed(
        engine
            .update_sale(
                TENANT,
                &sale.id,
                update_of(&bakery.card_a.id, vec![item(&bakery.croissant, 5)], 900),
            )
            .await
            .unwrap(),
    );

    assert_eq!(updated.lines[0].quantity, units(5));
    assert_eq!(bakery.croissants().await, units(5));

    let movements = bakery.db.stock().movements_for(TENANT, &sale.id).await.unwrap();
    let update = movements
        .iter()
        .find(|m| m.reason == MovementReason::SaleUpdate)
        .unwrap();
    assert_eq!(update.delta, units(-2));
    assert_eq!(movements.len(), 2);
}

#[tokio::test]
async fn test_update_returns_removed_lines_to_stock() {
    let bakery = Bakery::open().await;
    let engine = bakery.db.engine();

    let sale = committed(
        engine
            .create_sale(
                TENANT,
                sale_of(
                    &bakery,
                    vec![item(&bakery.croissant, 3), item(&bakery.baguette, 4)],
                    1060,
                ),
            )
            .await
            .unwrap(),
    );

    committed(
        engine
            .update_sale(
                TENANT,
                &sale.id,
                update_of(&bakery.card_a.id, vec![item(&bakery.baguette, 4)], 520),
            )
            .await
            .unwrap(),
    );

    assert_eq!(bakery.croissants().await, units(10));
    assert_eq!(
        bakery.stock(StockKey::product(bakery.baguette.id.clone())).await,
        units(16)
    );
}

#[tokio::test]
async fn test_identical_update_changes_nothing() {
    let bakery = Bakery::open().await;
    let engine = bakery.db.engine();

    let sale = committed(
        engine
            .create_sale(
                TENANT,
                sale_of(
                    &bakery,
                    vec![item(&bakery.croissant, 3), item(&bakery.baguette, 2)],
                    800,
                ),
            )
            .await
            .unwrap(),
    );
    let tx_before = bakery
        .db
        .ledger()
        .sale_transaction(TENANT, &sale.id)
        .await
        .unwrap()
        .unwrap();

    // Same lines, different order.
    committed(
        engine
            .update_sale(
                TENANT,
                &sale.id,
                update_of(
                    &bakery.card_a.id,
                    vec![item(&bakery.baguette, 2), item(&bakery.croissant, 3)],
                    800,
                ),
            )
            .await
            .unwrap(),
    );

    assert_eq!(bakery.croissants().await, units(7));
    assert_eq!(
        bakery.stock(StockKey::product(bakery.baguette.id.clone())).await,
        units(18)
    );
    assert_eq!(bakery.balance(&bakery.account_a).await, cents(800));

    let tx_after = bakery
        .db
        .ledger()
        .sale_transaction(TENANT, &sale.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(tx_after.id, tx_before.id);
    assert_eq!(tx_after.amount, tx_before.amount);

    let movements = bakery.db.stock().movements_for(TENANT, &sale.id).await.unwrap();
    assert_eq!(movements.len(), 2);
    assert!(movements.iter().all(|m| m.reason == MovementReason::Sale));
}

#[tokio::test]
async fn test_update_moves_transaction_between_accounts() {
    let bakery = Bakery::open().await;
    let engine = bakery.db.engine();

    let sale = committed(
        engine
            .create_sale(TENANT, sale_of(&bakery, vec![item(&bakery.baguette, 1)], 10_000))
            .await
            .unwrap(),
    );
    assert_eq!(bakery.balance(&bakery.account_a).await, cents(10_000));

    committed(
        engine
            .update_sale(
                TENANT,
                &sale.id,
                update_of(&bakery.card_b.id, vec![item(&bakery.baguette, 1)], 15_000),
            )
            .await
            .unwrap(),
    );

    assert_eq!(bakery.balance(&bakery.account_a).await, cents(0));
    assert_eq!(bakery.balance(&bakery.account_b).await, cents(15_000));

    let ledger = bakery.db.ledger();
    assert!(ledger
        .transactions(TENANT, &bakery.account_a.id)
        .await
        .unwrap()
        .is_empty());
    let on_b = ledger.transactions(TENANT, &bakery.account_b.id).await.unwrap();
    assert_eq!(on_b.len(), 1);
    assert_eq!(on_b[0].sale_id, sale.id);
    assert_eq!(on_b[0].amount, cents(15_000));
}

#[tokio::test]
async fn test_update_same_account_adjusts_in_place() {
    let bakery = Bakery::open().await;
    let engine = bakery.db.engine();

    let sale = committed(
        engine
            .create_sale(TENANT, sale_of(&bakery, vec![item(&bakery.baguette, 1)], 10_000))
            .await
            .unwrap(),
    );
    let before = bakery
        .db
        .ledger()
        .sale_transaction(TENANT, &sale.id)
        .await
        .unwrap()
        .unwrap();

    committed(
        engine
            .update_sale(
                TENANT,
                &sale.id,
                update_of(&bakery.card_a.id, vec![item(&bakery.baguette, 1)], 12_000),
            )
            .await
            .unwrap(),
    );

    let after = bakery
        .db
        .ledger()
        .sale_transaction(TENANT, &sale.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.id, before.id);
    assert_eq!(after.amount, cents(12_000));
    assert_eq!(bakery.balance(&bakery.account_a).await, cents(12_000));
}

#[tokio::test]
async fn test_update_to_unlinked_method_removes_transaction() {
    let bakery = Bakery::open().await;
    let engine = bakery.db.engine();

    let sale = committed(
        engine
            .create_sale(TENANT, sale_of(&bakery, vec![item(&bakery.baguette, 1)], 130))
            .await
            .unwrap(),
    );

    committed(
        engine
            .update_sale(
                TENANT,
                &sale.id,
                update_of(&bakery.cash.id, vec![item(&bakery.baguette, 1)], 130),
            )
            .await
            .unwrap(),
    );

    assert_eq!(bakery.balance(&bakery.account_a).await, cents(0));
    assert!(bakery
        .db
        .ledger()
        .sale_transaction(TENANT, &sale.id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_price_warnings_come_before_stock_warnings() {
    let bakery = Bakery::open().await;
    let engine = bakery.db.engine();

    let sale = committed(
        engine
            .create_sale(TENANT, sale_of(&bakery, vec![item(&bakery.croissant, 3)], 540))
            .await
            .unwrap(),
    );
    bakery
        .db
        .catalog()
        .set_product_price(TENANT, &bakery.croissant.id, cents(200))
        .await
        .unwrap();

    // 50 croissants would also be a stock shortfall; prices are reported first.
    let input = update_of(&bakery.card_a.id, vec![item(&bakery.croissant, 50)], 9000);
    let outcome = engine.update_sale(TENANT, &sale.id, input.clone()).await.unwrap();
    let Confirmation::PriceChanges(changes) = confirmation(outcome) else {
        panic!("expected price warnings first");
    };
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].product_id, bakery.croissant.id);
    assert_eq!(changes[0].stored_price, cents(180));
    assert_eq!(changes[0].current_price, cents(200));

    let keep_prices = UpdateSaleInput {
        update_prices: Some(false),
        ..input.clone()
    };
    let outcome = engine
        .update_sale(TENANT, &sale.id, keep_prices.clone())
        .await
        .unwrap();
    assert!(matches!(
        confirmation(outcome),
        Confirmation::InsufficientStock(_)
    ));
    assert_eq!(bakery.croissants().await, units(7));

    let forced = UpdateSaleInput {
        force: true,
        ..keep_prices
    };
    let updated = committed(engine.update_sale(TENANT, &sale.id, forced).await.unwrap());
    assert_eq!(updated.lines[0].unit_price, cents(180));
    assert_eq!(updated.total, cents(9000));
    assert_eq!(bakery.croissants().await, units(-40));
}

#[tokio::test]
async fn test_products_added_by_update_never_warn_about_price() {
    let bakery = Bakery::open().await;
    let engine = bakery.db.engine();

    let sale = committed(
        engine
            .create_sale(TENANT, sale_of(&bakery, vec![item(&bakery.croissant, 1)], 180))
            .await
            .unwrap(),
    );
    bakery
        .db
        .catalog()
        .set_product_price(TENANT, &bakery.baguette.id, cents(150))
        .await
        .unwrap();

    let updated = committed(
        engine
            .update_sale(
                TENANT,
                &sale.id,
                update_of(
                    &bakery.card_a.id,
                    vec![item(&bakery.croissant, 1), item(&bakery.baguette, 1)],
                    330,
                ),
            )
            .await
            .unwrap(),
    );

    let baguette_line = updated
        .lines
        .iter()
        .find(|l| l.product_id == bakery.baguette.id)
        .unwrap();
    assert_eq!(baguette_line.unit_price, cents(150));
}

#[tokio::test]
async fn test_update_prices_reprices_with_stored_discount() {
    let bakery = Bakery::open().await;
    let engine = bakery.db.engine();

    let mut input = sale_of(&bakery, vec![item(&bakery.croissant, 4)], 648);
    input.discount_percent_bps = Some(1000);
    input.discount_computed = Some(cents(72));
    let sale = committed(engine.create_sale(TENANT, input).await.unwrap());

    bakery
        .db
        .catalog()
        .set_product_price(TENANT, &bakery.croissant.id, cents(200))
        .await
        .unwrap();

    let refresh = UpdateSaleInput {
        update_prices: Some(true),
        ..update_of(&bakery.card_a.id, vec![item(&bakery.croissant, 4)], 1)
    };
    let updated = committed(engine.update_sale(TENANT, &sale.id, refresh).await.unwrap());

    // 4 × 2.00 = 8.00, 10% off = 7.20; the supplied total is ignored.
    assert_eq!(updated.lines[0].unit_price, cents(200));
    assert_eq!(updated.total, cents(720));
    assert_eq!(updated.discount_percent_bps, Some(1000));
    assert_eq!(updated.discount_computed, Some(cents(80)));
    assert_eq!(bakery.balance(&bakery.account_a).await, cents(720));
}

#[tokio::test]
async fn test_update_of_quote_stays_off_stock_and_ledger() {
    let bakery = Bakery::open().await;
    let engine = bakery.db.engine();

    let mut input = sale_of(&bakery, vec![item(&bakery.croissant, 2)], 360);
    input.is_quote = true;
    let quote = committed(engine.create_sale(TENANT, input).await.unwrap());

    let updated = committed(
        engine
            .update_sale(
                TENANT,
                &quote.id,
                update_of(&bakery.card_b.id, vec![item(&bakery.croissant, 30)], 5400),
            )
            .await
            .unwrap(),
    );

    assert!(updated.is_quote);
    assert_eq!(bakery.croissants().await, units(10));
    assert_eq!(bakery.balance(&bakery.account_b).await, cents(0));
}

#[tokio::test]
async fn test_update_unknown_sale_is_not_found() {
    let bakery = Bakery::open().await;
    let engine = bakery.db.engine();

    let result = engine
        .update_sale(
            TENANT,
            "missing",
            update_of(&bakery.card_a.id, vec![item(&bakery.croissant, 1)], 180),
        )
        .await;
    assert!(matches!(result, Err(EngineError::NotFound { .. })));
}

#[tokio::test]
async fn test_update_diffs_package_lines() {
    let bakery = Bakery::open().await;
    let engine = bakery.db.engine();
    let bag = StockKey::package(bakery.bag.id.clone());

    let mut input = sale_of(&bakery, vec![item(&bakery.croissant, 2)], 360);
    input.packages = bags(&bakery, 10);
    let sale = committed(engine.create_sale(TENANT, input).await.unwrap());
    assert_eq!(bakery.stock(bag.clone()).await, units(90));

    let mut grow = update_of(&bakery.card_a.id, vec![item(&bakery.croissant, 2)], 360);
    grow.packages = bags(&bakery, 95);
    committed(engine.update_sale(TENANT, &sale.id, grow).await.unwrap());
    assert_eq!(bakery.stock(bag.clone()).await, units(5));

    let mut short = update_of(&bakery.card_a.id, vec![item(&bakery.croissant, 2)], 360);
    short.packages = bags(&bakery, 200);
    let outcome = engine.update_sale(TENANT, &sale.id, short).await.unwrap();
    let Confirmation::InsufficientStock(warnings) = confirmation(outcome) else {
        panic!("expected a stock warning");
    };
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].entity_kind, StockKind::Package);
    assert_eq!(warnings[0].entity_name, "Paper bag");
    assert_eq!(warnings[0].current_stock, units(5));
    assert_eq!(warnings[0].requested_quantity, units(105));
    assert_eq!(warnings[0].resulting_stock, units(-100));
    assert_eq!(bakery.stock(bag.clone()).await, units(5));

    // Dropping the package line returns all of it.
    let removed = committed(
        engine
            .update_sale(
                TENANT,
                &sale.id,
                update_of(&bakery.card_a.id, vec![item(&bakery.croissant, 2)], 360),
            )
            .await
            .unwrap(),
    );
    assert!(removed.packages.is_empty());
    assert_eq!(bakery.stock(bag).await, units(100));
    assert_eq!(bakery.croissants().await, units(8));

    let stored = bakery.db.sales().get(TENANT, &sale.id).await.unwrap().unwrap();
    assert!(stored.packages.is_empty());
}

// =============================================================================
// Convert quote
// =============================================================================

#[tokio::test]
async fn test_convert_quote_consumes_stock_and_posts_total() {
    let bakery = Bakery::open().await;
    let engine = bakery.db.engine();

    let mut input = sale_of(&bakery, vec![item(&bakery.croissant, 3)], 540);
    input.is_quote = true;
    let quote = committed(engine.create_sale(TENANT, input).await.unwrap());

    let sale = committed(
        engine
            .convert_quote(TENANT, &quote.id, ConvertQuoteInput::default())
            .await
            .unwrap(),
    );

    assert!(!sale.is_quote);
    assert_eq!(bakery.croissants().await, units(7));
    assert_eq!(bakery.balance(&bakery.account_a).await, cents(540));

    let stored = bakery.db.sales().get(TENANT, &quote.id).await.unwrap().unwrap();
    assert!(!stored.is_quote);

    let movements = bakery.db.stock().movements_for(TENANT, &quote.id).await.unwrap();
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].reason, MovementReason::QuoteConversion);

    let again = engine
        .convert_quote(TENANT, &quote.id, ConvertQuoteInput::default())
        .await;
    assert!(matches!(again, Err(EngineError::InvalidState(_))));
}

#[tokio::test]
async fn test_convert_quote_warns_on_shortfall() {
    let bakery = Bakery::open().await;
    let engine = bakery.db.engine();

    let mut input = sale_of(&bakery, vec![item(&bakery.croissant, 15)], 2700);
    input.is_quote = true;
    let quote = committed(engine.create_sale(TENANT, input).await.unwrap());

    let outcome = engine
        .convert_quote(TENANT, &quote.id, ConvertQuoteInput::default())
        .await
        .unwrap();
    assert!(matches!(
        confirmation(outcome),
        Confirmation::InsufficientStock(_)
    ));

    let stored = bakery.db.sales().get(TENANT, &quote.id).await.unwrap().unwrap();
    assert!(stored.is_quote);
    assert_eq!(bakery.croissants().await, units(10));
    assert_eq!(bakery.balance(&bakery.account_a).await, cents(0));

    let forced = committed(
        engine
            .convert_quote(TENANT, &quote.id, ConvertQuoteInput { force: true })
            .await
            .unwrap(),
    );
    assert!(!forced.is_quote);
    assert_eq!(bakery.croissants().await, units(-5));
}

#[tokio::test]
async fn test_convert_quote_consumes_package_lines() {
    let bakery = Bakery::open().await;
    let engine = bakery.db.engine();
    let bag = StockKey::package(bakery.bag.id.clone());

    let mut input = sale_of(&bakery, vec![item(&bakery.croissant, 2)], 360);
    input.packages = bags(&bakery, 150);
    input.is_quote = true;
    let quote = committed(engine.create_sale(TENANT, input).await.unwrap());
    assert_eq!(bakery.stock(bag.clone()).await, units(100));

    let outcome = engine
        .convert_quote(TENANT, &quote.id, ConvertQuoteInput::default())
        .await
        .unwrap();
    let Confirmation::InsufficientStock(warnings) = confirmation(outcome) else {
        panic!("expected a stock warning");
    };
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].entity_kind, StockKind::Package);
    assert_eq!(warnings[0].resulting_stock, units(-50));
    assert_eq!(bakery.stock(bag.clone()).await, units(100));

    committed(
        engine
            .convert_quote(TENANT, &quote.id, ConvertQuoteInput { force: true })
            .await
            .unwrap(),
    );
    assert_eq!(bakery.stock(bag).await, units(-50));
    assert_eq!(bakery.croissants().await, units(8));
    assert_eq!(bakery.balance(&bakery.account_a).await, cents(360));

    let movements = bakery.db.stock().movements_for(TENANT, &quote.id).await.unwrap();
    assert_eq!(movements.len(), 2);
    assert!(movements
        .iter()
        .all(|m| m.reason == MovementReason::QuoteConversion));
    let bag_movement = movements
        .iter()
        .find(|m| m.entity_id == bakery.bag.id)
        .unwrap();
    assert_eq!(bag_movement.delta, units(-150));
}
