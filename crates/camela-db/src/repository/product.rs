//! # Product Repository
//!
//! Catalog operations for products.
//!
//! ## The Stock Column Is Off Limits
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Catalog path (this file):   name, buy_price, sell_price               │
//! │  Ledger path (ledger.rs):    stock (+ the matching Sale/Expense rows)  │
//! │                                                                         │
//! │  update() deliberately has no stock parameter. A stock level with no   │
//! │  matching ledger entry would silently break the inflow/outflow         │
//! │  invariant, so the column is only writable inside LedgerWriter         │
//! │  transactions.                                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use camela_core::validation::{validate_price, validate_product_name, validate_search_query};
use camela_core::{Money, Product};

use crate::error::{DbError, DbResult, LedgerResult};
use crate::repository::generate_id;

const PRODUCT_COLUMNS: &str = "id, name, buy_price, sell_price, stock, created_at, updated_at";

/// Repository for product catalog operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
/// let product = repo.create("Kaos Polos", Money::new(50_000), Money::new(80_000)).await?;
/// let hits = repo.search("kaos").await?;
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

    /// Registers a new product with zero stock.
    ///
    /// Stock always starts at 0; units arrive through
    /// `LedgerWriter::replenish_stock` so the purchase expense is recorded
    /// alongside.
    ///
    /// ## Errors
    /// * `LedgerError::Core` - empty name or negative price
    pub async fn create(
        &self,
        name: &str,
        buy_price: Money,
        sell_price: Money,
    ) -> LedgerResult<Product> {
        validate_product_name(name).map_err(camela_core::CoreError::from)?;
        validate_price("buy_price", buy_price).map_err(camela_core::CoreError::from)?;
        validate_price("sell_price", sell_price).map_err(camela_core::CoreError::from)?;

        let now = Utc::now();
        let product = Product {
            id: generate_id(),
            name: name.trim().to_string(),
            buy_price,
            sell_price,
            stock: 0,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO products (id, name, buy_price, sell_price, stock, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.buy_price)
        .bind(product.sell_price)
        .bind(product.stock)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        info!(id = %product.id, name = %product.name, "Product registered");
        Ok(product)
    }

    /// Updates a product's name and prices. Stock is not writable here.
    ///
    /// Price changes only affect future checkouts and replenishments;
    /// existing sale items and expenses keep their snapshots.
    ///
    /// ## Errors
    /// * `LedgerError::Core` - validation failure or unknown id
    pub async fn update(
        &self,
        id: &str,
        name: &str,
        buy_price: Money,
        sell_price: Money,
    ) -> LedgerResult<Product> {
        validate_product_name(name).map_err(camela_core::CoreError::from)?;
        validate_price("buy_price", buy_price).map_err(camela_core::CoreError::from)?;
        validate_price("sell_price", sell_price).map_err(camela_core::CoreError::from)?;

        debug!(id = %id, "Updating product");

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE products
            SET name = ?2, buy_price = ?3, sell_price = ?4, updated_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(name.trim())
        .bind(buy_price)
        .bind(sell_price)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            return Err(camela_core::CoreError::ProductNotFound(id.to_string()).into());
        }

        let updated = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| camela_core::CoreError::ProductNotFound(id.to_string()))?;
        Ok(updated)
    }

    /// Physically deletes a product.
    ///
    /// Sales history and expense entries are untouched: sale items carry
    /// snapshots and the expense product_id tag is allowed to dangle.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        info!(id = %id, "Product deleted");
        Ok(())
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists all products, newest first.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Searches products by case-insensitive name substring, newest first.
    /// An empty query lists everything.
    pub async fn search(&self, query: &str) -> LedgerResult<Vec<Product>> {
        let query = validate_search_query(query).map_err(camela_core::CoreError::from)?;

        debug!(query = %query, "Searching products");

        if query.is_empty() {
            return Ok(self.list().await?);
        }

        let products = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS} FROM products
            WHERE name LIKE '%' || ?1 || '%' COLLATE NOCASE
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(&query)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;

        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    /// Counts total products (for diagnostics).
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
