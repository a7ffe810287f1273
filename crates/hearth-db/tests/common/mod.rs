//! Shared fixture: a small bakery in an in-memory database.

#![allow(dead_code)]

use chrono::Utc;
use hearth_core::{
    BankAccount, Confirmation, Ingredient, Money, Outcome, Package, PaymentMethod, Product,
    ProductLineInput, Quantity, StockKey,
};
use hearth_db::{Database, DbConfig};

pub const TENANT: &str = "bakery-1";

pub struct Bakery {
    pub db: Database,
    /// 10 in stock, 1.80. Made of 2 flour and 1 paper bag.
    pub croissant: Product,
    /// 20 in stock, 1.30. No composition.
    pub baguette: Product,
    /// 1 in stock. Unit cost 0.50.
    pub flour: Ingredient,
    /// 100 in stock. Unit cost 0.10.
    pub bag: Package,
    pub account_a: BankAccount,
    pub account_b: BankAccount,
    pub card_a: PaymentMethod,
    pub card_b: PaymentMethod,
    pub cash: PaymentMethod,
}

impl Bakery {
    pub async fn open() -> Bakery {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let catalog = db.catalog();

        let croissant = catalog
            .create_product(TENANT, "Croissant", cents(180), units(10), Quantity::zero())
            .await
            .unwrap();
        let baguette = catalog
            .create_product(TENANT, "Baguette", cents(130), units(20), units(5))
            .await
            .unwrap();
        let flour = catalog
            .create_ingredient(TENANT, "Flour", units(1), Quantity::zero())
            .await
            .unwrap();
        let bag = catalog
            .create_package(TENANT, "Paper bag", units(100), units(10))
            .await
            .unwrap();

        catalog
            .link_ingredient(TENANT, &croissant.id, &flour.id, units(2))
            .await
            .unwrap();
        catalog
            .link_package(TENANT, &croissant.id, &bag.id, units(1))
            .await
            .unwrap();

        let costs = db.costs();
        costs
            .record(TENANT, &StockKey::ingredient(flour.id.clone()), units(10), cents(500), Utc::now())
            .await
            .unwrap();
        costs
            .record(TENANT, &StockKey::package(bag.id.clone()), units(100), cents(1000), Utc::now())
            .await
            .unwrap();

        let ledger = db.ledger();
        let account_a = ledger.create_account(TENANT, "A", Money::zero()).await.unwrap();
        let account_b = ledger.create_account(TENANT, "B", Money::zero()).await.unwrap();
        let card_a = ledger
            .create_payment_method(TENANT, "Card A", Some(&account_a.id))
            .await
            .unwrap();
        let card_b = ledger
            .create_payment_method(TENANT, "Card B", Some(&account_b.id))
            .await
            .unwrap();
        let cash = ledger.create_payment_method(TENANT, "Cash", None).await.unwrap();

        Bakery {
            db,
            croissant,
            baguette,
            flour,
            bag,
            account_a,
            account_b,
            card_a,
            card_b,
            cash,
        }
    }

    pub async fn stock(&self, key: StockKey) -> Quantity {
        self.db.stock().stock_of(TENANT, &key).await.unwrap()
    }

    pub async fn croissants(&self) -> Quantity {
        self.stock(StockKey::product(self.croissant.id.clone())).await
    }

    pub async fn flour_stock(&self) -> Quantity {
        self.stock(StockKey::ingredient(self.flour.id.clone())).await
    }

    pub async fn balance(&self, account: &BankAccount) -> Money {
        self.db.ledger().balance(TENANT, &account.id).await.unwrap()
    }

    pub async fn sale_count(&self) -> i64 {
        self.db.sales().count(TENANT).await.unwrap()
    }
}

pub fn units(n: i64) -> Quantity {
    Quantity::from_units(n)
}

pub fn cents(n: i64) -> Money {
    Money::from_cents(n)
}

pub fn item(product: &Product, n: i64) -> ProductLineInput {
    ProductLineInput {
        product_id: product.id.clone(),
        quantity: units(n),
    }
}

pub fn committed<T>(outcome: Outcome<T>) -> T {
    match outcome {
        Outcome::Committed(value) => value,
        Outcome::NeedsConfirmation(c) => panic!("expected a commit, got {c:?}"),
    }
}

pub fn confirmation<T: std::fmt::Debug>(outcome: Outcome<T>) -> Confirmation {
    match outcome {
        Outcome::NeedsConfirmation(c) => c,
        Outcome::Committed(value) => panic!("expected a confirmation, got {value:?}"),
    }
}
