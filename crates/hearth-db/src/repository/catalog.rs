//! # Catalog Repository
//!
//! Products, packages, ingredients and the composition links between them.
//!
//! ## Composition
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Croissant ──┬── product_ingredients ──► Flour   0.080 / unit          │
//! │              ├── product_ingredients ──► Butter  0.040 / unit          │
//! │              └── product_packages    ──► Paper bag 1.000 / unit        │
//! │                                                                         │
//! │  compositions(conn, tenant, [croissant, ...]) → Compositions           │
//! │  (both link tables, joined to the component for its name)              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine only reads composition. Links are written here by tooling.

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::push_in_list;
use hearth_core::costing::Compositions;
use hearth_core::{CompositionLink, Ingredient, Money, Package, Product, Quantity, StockKind};

const PRODUCT_COLUMNS: &str =
    "id, tenant_id, name, price_cents AS price, stock, min_stock, created_at, updated_at";

const COMPONENT_COLUMNS: &str = "id, tenant_id, name, stock, min_stock, created_at, updated_at";

/// Link row before the component kind is attached.
#[derive(Debug, sqlx::FromRow)]
struct LinkRow {
    product_id: String,
    component_id: String,
    component_name: String,
    quantity_per_unit: Quantity,
}

/// Repository for catalog database operations.
///
/// ## Usage
/// ```rust,ignore
/// let catalog = db.catalog();
/// let flour = catalog.create_ingredient(tenant, "Flour", qty, min).await?;
/// let croissant = catalog.create_product(tenant, "Croissant", price, qty, min).await?;
/// catalog.link_ingredient(tenant, &croissant.id, &flour.id, per_unit).await?;
/// ```
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    // =========================================================================
    // Writes (tooling)
    // =========================================================================

    /// Inserts a product.
    pub async fn create_product(
        &self,
        tenant_id: &str,
        name: &str,
        price: Money,
        stock: Quantity,
        min_stock: Quantity,
    ) -> DbResult<Product> {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            tenant_id: tenant_id.to_string(),
            name: name.to_string(),
            price,
            stock,
            min_stock,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO products (id, tenant_id, name, price_cents, stock, min_stock, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&product.id)
        .bind(&product.tenant_id)
        .bind(&product.name)
        .bind(product.price)
        .bind(product.stock)
        .bind(product.min_stock)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        debug!(id = %product.id, name = %product.name, "Product created");
        Ok(product)
    }

    /// Inserts a package.
    pub async fn create_package(
        &self,
        tenant_id: &str,
        name: &str,
        stock: Quantity,
        min_stock: Quantity,
    ) -> DbResult<Package> {
        let (id, now) = self
            .insert_component(StockKind::Package, tenant_id, name, stock, min_stock)
            .await?;
        Ok(Package {
            id,
            tenant_id: tenant_id.to_string(),
            name: name.to_string(),
            stock,
            min_stock,
            created_at: now,
            updated_at: now,
        })
    }

    /// Inserts an ingredient.
    pub async fn create_ingredient(
        &self,
        tenant_id: &str,
        name: &str,
        stock: Quantity,
        min_stock: Quantity,
    ) -> DbResult<Ingredient> {
        let (id, now) = self
            .insert_component(StockKind::Ingredient, tenant_id, name, stock, min_stock)
            .await?;
        Ok(Ingredient {
            id,
            tenant_id: tenant_id.to_string(),
            name: name.to_string(),
            stock,
            min_stock,
            created_at: now,
            updated_at: now,
        })
    }

    /// Packages and ingredients share a table shape.
    async fn insert_component(
        &self,
        kind: StockKind,
        tenant_id: &str,
        name: &str,
        stock: Quantity,
        min_stock: Quantity,
    ) -> DbResult<(String, chrono::DateTime<Utc>)> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let sql = format!(
            "INSERT INTO {} (id, tenant_id, name, stock, min_stock, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            kind.table()
        );
        sqlx::query(&sql)
            .bind(&id)
            .bind(tenant_id)
            .bind(name)
            .bind(stock)
            .bind(min_stock)
            .bind(now)
            .bind(now)
            .execute(&self.pool)
            .await?;

        debug!(kind = %kind, id = %id, name = %name, "Component created");
        Ok((id, now))
    }

    /// Updates a product's current selling price.
    ///
    /// Existing sale lines keep the price they were written with.
    pub async fn set_product_price(&self, tenant_id: &str, id: &str, price: Money) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE products SET price_cents = ?1, updated_at = ?2 WHERE tenant_id = ?3 AND id = ?4",
        )
        .bind(price)
        .bind(Utc::now())
        .bind(tenant_id)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }
        Ok(())
    }

    /// Declares that one unit of `product_id` consumes `per_unit` of an ingredient.
    pub async fn link_ingredient(
        &self,
        tenant_id: &str,
        product_id: &str,
        ingredient_id: &str,
        per_unit: Quantity,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO product_ingredients (tenant_id, product_id, ingredient_id, quantity_per_unit)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(tenant_id)
        .bind(product_id)
        .bind(ingredient_id)
        .bind(per_unit)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Declares that one unit of `product_id` consumes `per_unit` of a package.
    pub async fn link_package(
        &self,
        tenant_id: &str,
        product_id: &str,
        package_id: &str,
        per_unit: Quantity,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO product_packages (tenant_id, product_id, package_id, quantity_per_unit)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(tenant_id)
        .bind(product_id)
        .bind(package_id)
        .bind(per_unit)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found in this tenant
    pub async fn get_product(&self, tenant_id: &str, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE tenant_id = ?1 AND id = ?2");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    pub async fn get_package(&self, tenant_id: &str, id: &str) -> DbResult<Option<Package>> {
        let sql = format!("SELECT {COMPONENT_COLUMNS} FROM packages WHERE tenant_id = ?1 AND id = ?2");
        let package = sqlx::query_as::<_, Package>(&sql)
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(package)
    }

    pub async fn get_ingredient(&self, tenant_id: &str, id: &str) -> DbResult<Option<Ingredient>> {
        let sql =
            format!("SELECT {COMPONENT_COLUMNS} FROM ingredients WHERE tenant_id = ?1 AND id = ?2");
        let ingredient = sqlx::query_as::<_, Ingredient>(&sql)
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(ingredient)
    }

    /// Composition of a single product.
    pub async fn composition_of(
        &self,
        tenant_id: &str,
        product_id: &str,
    ) -> DbResult<Vec<CompositionLink>> {
        let mut conn = self.pool.acquire().await?;
        let compositions =
            Self::compositions(&mut conn, tenant_id, &[product_id.to_string()]).await?;
        Ok(compositions.of(product_id).to_vec())
    }

    // =========================================================================
    // Connection-level (engine)
    // =========================================================================

    /// Loads products by id, keyed by id. Ids not in the tenant are absent.
    pub(crate) async fn products_by_ids(
        conn: &mut SqliteConnection,
        tenant_id: &str,
        ids: &[String],
    ) -> DbResult<HashMap<String, Product>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE tenant_id = "
        ));
        qb.push_bind(tenant_id.to_string());
        qb.push(" AND id");
        push_in_list(&mut qb, ids);

        let products = qb.build_query_as::<Product>().fetch_all(&mut *conn).await?;

        debug!(requested = ids.len(), found = products.len(), "Loaded products");
        Ok(products.into_iter().map(|p| (p.id.clone(), p)).collect())
    }

    /// Loads ingredient and package links for the given products.
    pub(crate) async fn compositions(
        conn: &mut SqliteConnection,
        tenant_id: &str,
        product_ids: &[String],
    ) -> DbResult<Compositions> {
        let mut compositions = Compositions::new();
        if product_ids.is_empty() {
            return Ok(compositions);
        }

        for kind in [StockKind::Ingredient, StockKind::Package] {
            for link in Self::links(conn, tenant_id, kind, product_ids).await? {
                compositions.insert(link);
            }
        }
        Ok(compositions)
    }

    async fn links(
        conn: &mut SqliteConnection,
        tenant_id: &str,
        kind: StockKind,
        product_ids: &[String],
    ) -> DbResult<Vec<CompositionLink>> {
        let (link_table, column) = match kind {
            StockKind::Ingredient => ("product_ingredients", "ingredient_id"),
            StockKind::Package => ("product_packages", "package_id"),
            StockKind::Product => return Ok(Vec::new()),
        };

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT l.product_id, l.{column} AS component_id, c.name AS component_name, \
             l.quantity_per_unit \
             FROM {link_table} l JOIN {table} c ON c.id = l.{column} \
             WHERE l.tenant_id = ",
            table = kind.table()
        ));
        qb.push_bind(tenant_id.to_string());
        qb.push(" AND l.product_id");
        push_in_list(&mut qb, product_ids);
        qb.push(" ORDER BY l.product_id, c.name");

        let rows = qb.build_query_as::<LinkRow>().fetch_all(&mut *conn).await?;

        Ok(rows
            .into_iter()
            .map(|row| CompositionLink {
                product_id: row.product_id,
                component_kind: kind,
                component_id: row.component_id,
                component_name: row.component_name,
                quantity_per_unit: row.quantity_per_unit,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    const TENANT: &str = "tenant-a";

    #[tokio::test]
    async fn test_product_round_trip_and_price_update() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let catalog = db.catalog();

        let p = catalog
            .create_product(
                TENANT,
                "Baguette",
                Money::from_cents(250),
                Quantity::from_units(40),
                Quantity::from_units(5),
            )
            .await
            .unwrap();

        catalog
            .set_product_price(TENANT, &p.id, Money::from_cents(275))
            .await
            .unwrap();

        let loaded = catalog.get_product(TENANT, &p.id).await.unwrap().unwrap();
        assert_eq!(loaded.price, Money::from_cents(275));
        assert_eq!(loaded.stock, Quantity::from_units(40));

        assert!(catalog.get_product("other", &p.id).await.unwrap().is_none());
        assert!(matches!(
            catalog
                .set_product_price("other", &p.id, Money::from_cents(1))
                .await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_composition_of_lists_both_kinds() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let catalog = db.catalog();

        let croissant = catalog
            .create_product(TENANT, "Croissant", Money::from_cents(180), Quantity::zero(), Quantity::zero())
            .await
            .unwrap();
        let flour = catalog
            .create_ingredient(TENANT, "Flour", Quantity::from_units(10), Quantity::zero())
            .await
            .unwrap();
        let bag = catalog
            .create_package(TENANT, "Paper bag", Quantity::from_units(100), Quantity::zero())
            .await
            .unwrap();

        catalog
            .link_ingredient(TENANT, &croissant.id, &flour.id, Quantity::from_milli(80))
            .await
            .unwrap();
        catalog
            .link_package(TENANT, &croissant.id, &bag.id, Quantity::from_units(1))
            .await
            .unwrap();

        let links = catalog.composition_of(TENANT, &croissant.id).await.unwrap();
        assert_eq!(links.len(), 2);

        let flour_link = links
            .iter()
            .find(|l| l.component_kind == StockKind::Ingredient)
            .unwrap();
        assert_eq!(flour_link.component_name, "Flour");
        assert_eq!(flour_link.quantity_per_unit, Quantity::from_milli(80));

        assert!(links.iter().any(|l| l.component_kind == StockKind::Package
            && l.component_id == bag.id));
    }
}
