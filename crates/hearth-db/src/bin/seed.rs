//! # Seed Data Generator
//!
//! Populates a database with a small bakery for development.
//!
//! ## Usage
//! ```bash
//! # Seed the configured database (hearth.toml / HEARTH_* variables)
//! cargo run -p hearth-db --bin seed
//!
//! # Specify database path
//! cargo run -p hearth-db --bin seed -- --db ./data/hearth.db
//! ```
//!
//! ## Generated Data
//! - Ingredients with purchase history (flour, butter, sugar, ...)
//! - Packaging (bags, boxes) with purchase history
//! - Products with their composition and opening stock
//! - A bank account, a card method settling into it, and cash
//! - One finalized sale and one open quote

use chrono::{Duration, Utc};
use std::env;
use std::path::PathBuf;

use hearth_core::{
    CreateSaleInput, Money, Outcome, ProductLineInput, Quantity, StockKey,
};
use hearth_db::{init_tracing, Database, HearthConfig};

/// (name, opening stock in milli-units, minimum, price paid in cents, quantity bought in milli-units)
const INGREDIENTS: &[(&str, i64, i64, i64, i64)] = &[
    ("Flour", 50_000, 10_000, 4_500, 25_000),
    ("Butter", 8_000, 2_000, 9_600, 4_000),
    ("Sugar", 12_000, 3_000, 2_400, 10_000),
    ("Eggs", 120_000, 30_000, 1_800, 60_000),
    ("Dark chocolate", 3_000, 1_000, 7_500, 2_500),
];

/// (name, opening stock in milli-units, minimum, price paid in cents, quantity bought in milli-units)
const PACKAGES: &[(&str, i64, i64, i64, i64)] = &[
    ("Paper bag", 500_000, 100_000, 2_000, 500_000),
    ("Cake box", 60_000, 20_000, 3_000, 50_000),
];

/// (name, price in cents, opening stock in units, [(ingredient, milli per unit)], [(package, milli per unit)])
type Recipe = (
    &'static str,
    i64,
    i64,
    &'static [(&'static str, i64)],
    &'static [(&'static str, i64)],
);

const PRODUCTS: &[Recipe] = &[
    (
        "Croissant",
        180,
        40,
        &[("Flour", 60), ("Butter", 35), ("Sugar", 5)],
        &[("Paper bag", 1_000)],
    ),
    (
        "Pain au chocolat",
        210,
        30,
        &[("Flour", 60), ("Butter", 35), ("Dark chocolate", 15)],
        &[("Paper bag", 1_000)],
    ),
    (
        "Baguette",
        130,
        60,
        &[("Flour", 250)],
        &[],
    ),
    (
        "Chocolate cake",
        2_400,
        4,
        &[("Flour", 300), ("Butter", 200), ("Sugar", 250), ("Eggs", 4_000), ("Dark chocolate", 200)],
        &[("Cake box", 1_000)],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Hearth Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>       Database file path (overrides config)");
                println!("  -c, --config <PATH>   Config file path");
                println!("  -h, --help            Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let mut config = HearthConfig::load(config_path)?;
    if let Some(path) = db_path {
        config.database.path = path;
    }
    init_tracing(&config.logging.filter);

    let tenant = config.tenant_id().to_string();

    println!("🌱 Hearth Seed Data Generator");
    println!("=============================");
    println!("Database: {}", config.database.path.display());
    println!("Tenant:   {}", tenant);
    println!();

    let db = Database::new(config.db_config()).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.sales().count(&tenant).await?;
    if existing > 0 {
        println!("⚠ Tenant already has {} sales", existing);
        println!("  Skipping seed to avoid duplicates.");
        return Ok(());
    }

    let catalog = db.catalog();
    let costs = db.costs();
    let bought_at = Utc::now() - Duration::days(3);

    let mut ingredient_ids = std::collections::HashMap::new();
    for (name, stock, min, price, bought) in INGREDIENTS {
        let ingredient = catalog
            .create_ingredient(&tenant, name, Quantity::from_milli(*stock), Quantity::from_milli(*min))
            .await?;
        costs
            .record(
                &tenant,
                &StockKey::ingredient(ingredient.id.clone()),
                Quantity::from_milli(*bought),
                Money::from_cents(*price),
                bought_at,
            )
            .await?;
        ingredient_ids.insert(*name, ingredient.id);
    }
    println!("✓ {} ingredients", INGREDIENTS.len());

    let mut package_ids = std::collections::HashMap::new();
    for (name, stock, min, price, bought) in PACKAGES {
        let package = catalog
            .create_package(&tenant, name, Quantity::from_milli(*stock), Quantity::from_milli(*min))
            .await?;
        costs
            .record(
                &tenant,
                &StockKey::package(package.id.clone()),
                Quantity::from_milli(*bought),
                Money::from_cents(*price),
                bought_at,
            )
            .await?;
        package_ids.insert(*name, package.id);
    }
    println!("✓ {} packages", PACKAGES.len());

    let mut product_ids = Vec::new();
    for (name, price, stock, ingredients, packages) in PRODUCTS {
        let product = catalog
            .create_product(
                &tenant,
                name,
                Money::from_cents(*price),
                Quantity::from_units(*stock),
                Quantity::from_units(5),
            )
            .await?;

        for (ingredient, per_unit) in ingredients.iter() {
            if let Some(id) = ingredient_ids.get(ingredient) {
                catalog
                    .link_ingredient(&tenant, &product.id, id, Quantity::from_milli(*per_unit))
                    .await?;
            }
        }
        for (package, per_unit) in packages.iter() {
            if let Some(id) = package_ids.get(package) {
                catalog
                    .link_package(&tenant, &product.id, id, Quantity::from_milli(*per_unit))
                    .await?;
            }
        }
        product_ids.push(product.id);
    }
    println!("✓ {} products with composition", PRODUCTS.len());

    let ledger = db.ledger();
    let account = ledger
        .create_account(&tenant, "Main account", Money::zero())
        .await?;
    let card = ledger
        .create_payment_method(&tenant, "Card", Some(&account.id))
        .await?;
    ledger.create_payment_method(&tenant, "Cash", None).await?;
    println!("✓ Bank account and payment methods");

    let engine = db.engine();
    let line = |idx: usize, units: i64| ProductLineInput {
        product_id: product_ids[idx].clone(),
        quantity: Quantity::from_units(units),
    };

    let sale = engine
        .create_sale(
            &tenant,
            CreateSaleInput {
                payment_method_id: card.id.clone(),
                total: Some(Money::from_cents(3 * 180 + 2 * 130)),
                items: vec![line(0, 3), line(2, 2)],
                ..Default::default()
            },
        )
        .await?;
    if let Outcome::Committed(sale) = &sale {
        println!("✓ Sale {} (approx. cost {})", sale.id, sale.approximate_cost);
    }

    let quote = engine
        .create_sale(
            &tenant,
            CreateSaleInput {
                payment_method_id: card.id.clone(),
                total: Some(Money::from_cents(2_400)),
                items: vec![line(3, 1)],
                is_quote: true,
                ..Default::default()
            },
        )
        .await?;
    if let Outcome::Committed(quote) = &quote {
        println!("✓ Quote {}", quote.id);
    }

    println!();
    println!("Balance: {}", ledger.balance(&tenant, &account.id).await?);
    let low = db.stock().below_minimum(&tenant).await?;
    println!("Below minimum: {}", low.len());

    Ok(())
}
