//! # Product Repository
//!
//! Catalog operations for rice products.
//!
//! ## Key Operations
//! - Create with opening stock
//! - Lookup by id or code, list, search
//! - Detail edits and soft deactivation
//!
//! On-hand quantity is written here exactly once: the opening stock of a new
//! product, recorded together with its `restock` movement. Every later change
//! goes through the ledger.

use chrono::{DateTime, Utc};
use sqlx::{SqliteExecutor, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::like_pattern;
use crate::repository::movement::insert_movement;
use ricemill_core::validation::{
    validate_new_product, validate_product_update, validate_search_query,
};
use ricemill_core::{
    ContainerSpec, Money, MovementReason, NewProduct, Product, ProductUpdate, Quality,
    StockMovement, Weight,
};

/// Column list shared by every product SELECT.
pub(crate) const PRODUCT_COLUMNS: &str = "id, code, name, quality, price_per_kg_cents, \
     container_weight_grams, container_price_cents, on_hand_grams, min_stock_grams, \
     description, is_active, created_at, updated_at";

/// Flat row shape of the `products` table.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ProductRow {
    id: String,
    code: String,
    name: String,
    quality: Quality,
    price_per_kg_cents: Money,
    container_weight_grams: Option<Weight>,
    container_price_cents: Option<Money>,
    on_hand_grams: Weight,
    min_stock_grams: Weight,
    description: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        let container = match (row.container_weight_grams, row.container_price_cents) {
            (Some(weight), Some(price)) => Some(ContainerSpec { weight, price }),
            _ => None,
        };

        Product {
            id: row.id,
            code: row.code,
            name: row.name,
            quality: row.quality,
            price_per_kg: row.price_per_kg_cents,
            container,
            on_hand: row.on_hand_grams,
            min_stock: row.min_stock_grams,
            description: row.description,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Loads one product through any executor (pool or open transaction).
pub(crate) async fn fetch_product<'e, E>(executor: E, id: &str) -> DbResult<Option<Product>>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!("SELECT {} FROM products WHERE id = ?", PRODUCT_COLUMNS);
    let row = sqlx::query_as::<_, ProductRow>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?;

    Ok(row.map(Product::from))
}

/// Repository for catalog operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let basmati = repo.get_by_code("RICE001").await?;
/// let matches = repo.search("masoori", 20).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Adds a product to the catalog.
    ///
    /// A non-zero `opening_stock` is written as on-hand together with a
    /// `restock` movement attributed to `created_by`, in one transaction, so
    /// `on_hand == Σ movements` holds from the start.
    pub async fn insert(&self, new: &NewProduct, created_by: &str) -> DbResult<Product> {
        validate_new_product(new)?;

        let code = new.code.trim().to_string();
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            code: code.clone(),
            name: new.name.trim().to_string(),
            quality: new.quality,
            price_per_kg: new.price_per_kg,
            container: new.container,
            on_hand: new.opening_stock,
            min_stock: new.min_stock,
            description: new.description.clone(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %product.id, code = %product.code, "Inserting product");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO products (
                id, code, name, quality, price_per_kg_cents,
                container_weight_grams, container_price_cents,
                on_hand_grams, min_stock_grams, description, is_active,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1, ?, ?)
            "#,
        )
        .bind(&product.id)
        .bind(&product.code)
        .bind(&product.name)
        .bind(product.quality)
        .bind(product.price_per_kg)
        .bind(product.container.map(|c| c.weight))
        .bind(product.container.map(|c| c.price))
        .bind(product.on_hand)
        .bind(product.min_stock)
        .bind(&product.description)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("code", code.clone()),
            other => other,
        })?;

        if !product.on_hand.is_zero() {
            let movement = StockMovement {
                id: Uuid::new_v4().to_string(),
                product_id: product.id.clone(),
                delta: product.on_hand,
                reason: MovementReason::Restock,
                reference_id: None,
                note: Some("opening stock".to_string()),
                actor_id: created_by.to_string(),
                created_at: now,
            };
            insert_movement(&mut *tx, &movement).await?;
        }

        tx.commit().await?;

        info!(
            id = %product.id,
            code = %product.code,
            opening_stock = %product.on_hand,
            "Product created"
        );
        Ok(product)
    }

    /// Gets a product by its ID, active or not.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        fetch_product(&self.pool, id).await
    }

    /// Gets a product by its business code, active or not.
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {} FROM products WHERE code = ?", PRODUCT_COLUMNS);
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(code.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Product::from))
    }

    /// Lists products ordered by code.
    pub async fn list(&self, active_only: bool) -> DbResult<Vec<Product>> {
        let sql = if active_only {
            format!(
                "SELECT {} FROM products WHERE is_active = 1 ORDER BY code",
                PRODUCT_COLUMNS
            )
        } else {
            format!("SELECT {} FROM products ORDER BY code", PRODUCT_COLUMNS)
        };

        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Searches active products by code or name (case-insensitive substring).
    ///
    /// An empty query lists active products.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Product>> {
        let query = validate_search_query(query)?;

        debug!(query = %query, limit = %limit, "Searching products");

        let pattern = like_pattern(&query);

        let sql = format!(
            "SELECT {} FROM products \
             WHERE is_active = 1 \
             AND (code LIKE ?1 ESCAPE '\\' OR name LIKE ?1 ESCAPE '\\') \
             ORDER BY code LIMIT ?2",
            PRODUCT_COLUMNS
        );

        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(pattern)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rows.len(), "Search returned products");
        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Edits catalog details. On-hand quantity is never touched.
    pub async fn update_details(&self, id: &str, update: &ProductUpdate) -> DbResult<Product> {
        validate_product_update(update)?;

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?,
                quality = ?,
                price_per_kg_cents = ?,
                container_weight_grams = ?,
                container_price_cents = ?,
                min_stock_grams = ?,
                description = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(update.name.trim())
        .bind(update.quality)
        .bind(update.price_per_kg)
        .bind(update.container.map(|c| c.weight))
        .bind(update.container.map(|c| c.price))
        .bind(update.min_stock)
        .bind(&update.description)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        debug!(id = %id, "Product details updated");

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Activates or deactivates a product. Products are never deleted.
    pub async fn set_active(&self, id: &str, active: bool) -> DbResult<()> {
        let result = sqlx::query("UPDATE products SET is_active = ?, updated_at = ? WHERE id = ?")
            .bind(active)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        info!(id = %id, active, "Product activation changed");
        Ok(())
    }

    /// Counts all products, active or not.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{basmati, test_db, ADMIN_ID};

    #[tokio::test]
    async fn test_insert_records_opening_stock_movement() {
        let db = test_db().await;
        let product = db.products().insert(&basmati(), ADMIN_ID).await.unwrap();

        assert_eq!(product.on_hand, Weight::from_kg(500));

        let movements = db.movements().for_product(&product.id).await.unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].delta, Weight::from_kg(500));
        assert_eq!(movements[0].reason, MovementReason::Restock);
        assert_eq!(movements[0].actor_id, ADMIN_ID);
    }

    #[tokio::test]
    async fn test_zero_opening_stock_has_no_movement() {
        let db = test_db().await;
        let mut new = basmati();
        new.opening_stock = Weight::zero();
        let product = db.products().insert(&new, ADMIN_ID).await.unwrap();

        let movements = db.movements().for_product(&product.id).await.unwrap();
        assert!(movements.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_code_rejected() {
        let db = test_db().await;
        db.products().insert(&basmati(), ADMIN_ID).await.unwrap();

        let err = db.products().insert(&basmati(), ADMIN_ID).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "code"));
        assert_eq!(db.products().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_invalid_product_rejected() {
        let db = test_db().await;
        let mut new = basmati();
        new.code = "BAD CODE".to_string();

        let err = db.products().insert(&new, ADMIN_ID).await.unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
    }

    #[tokio::test]
    async fn test_lookup_and_search() {
        let db = test_db().await;
        let product = db.products().insert(&basmati(), ADMIN_ID).await.unwrap();

        let by_id = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(by_id.code, "RICE001");
        assert_eq!(by_id.container, product.container);

        let by_code = db.products().get_by_code("RICE001").await.unwrap().unwrap();
        assert_eq!(by_code.id, product.id);

        assert_eq!(db.products().search("basm", 10).await.unwrap().len(), 1);
        assert_eq!(db.products().search("rice001", 10).await.unwrap().len(), 1);
        assert!(db.products().search("ponni", 10).await.unwrap().is_empty());
        assert!(db.products().search("%", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_details_keeps_on_hand() {
        let db = test_db().await;
        let product = db.products().insert(&basmati(), ADMIN_ID).await.unwrap();

        let update = ProductUpdate {
            name: "Basmati Rice (Aged)".to_string(),
            quality: Quality::Premium,
            price_per_kg: Money::from_cents(7000),
            container: None,
            min_stock: Weight::from_kg(50),
            description: Some("aged one year".to_string()),
        };
        let updated = db.products().update_details(&product.id, &update).await.unwrap();

        assert_eq!(updated.name, "Basmati Rice (Aged)");
        assert_eq!(updated.price_per_kg.cents(), 7000);
        assert!(updated.container.is_none());
        assert_eq!(updated.on_hand, product.on_hand);

        let missing = db.products().update_details("nope", &update).await;
        assert!(matches!(missing, Err(DbError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_deactivated_products_hidden_from_active_lists() {
        let db = test_db().await;
        let product = db.products().insert(&basmati(), ADMIN_ID).await.unwrap();

        db.products().set_active(&product.id, false).await.unwrap();

        assert!(db.products().list(true).await.unwrap().is_empty());
        assert_eq!(db.products().list(false).await.unwrap().len(), 1);
        assert!(db.products().search("basmati", 10).await.unwrap().is_empty());

        let fetched = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert!(!fetched.is_active);
    }
}
