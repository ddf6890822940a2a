//! # Ledger Writer
//!
//! The only component allowed to mutate stock. Every stock movement is
//! written in the same transaction as its financial counterpart, which is
//! what keeps inventory, sales and the expense journal mutually consistent.
//!
//! ## Operation Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Every Writer Operation                              │
//! │                                                                         │
//! │  validate input (camela-core rules)                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  acquire per-product locks (sorted ids, bounded wait)                  │
//! │       │                                 ──► Contention (retryable)     │
//! │       ▼                                                                 │
//! │  BEGIN transaction                                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  read products ──► check rules ──► write Sale/Expense + stock delta    │
//! │       │                  │                                              │
//! │       │                  └──► rule violation: tx drops, ROLLBACK       │
//! │       ▼                                                                 │
//! │  COMMIT ──► release locks                                              │
//! │                                                                         │
//! │  Nothing persists unless everything does.                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Stock Movement Map
//! ```text
//! checkout        stock -= qty   + Sale + SaleItems        (outflow)
//! replenish_stock stock += qty   + Expense (+buy_price*qty) (only inflow)
//! correct_stock   stock -= qty   + Expense (-buy_price*qty) (reversal)
//! delete_sale     stock untouched, Sale + items removed
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info};

use camela_core::validation::{normalize_customer_name, validate_discount, validate_quantity};
use camela_core::{
    CartLine, CoreError, Expense, ExpenseCategory, Money, Product, Sale, SaleItem, MAX_CART_LINES,
};

use crate::error::{DbError, LedgerResult};
use crate::locks::ProductLocks;
use crate::repository::generate_id;

// =============================================================================
// Ledger Writer
// =============================================================================

/// Atomic writer for all stock-affecting operations.
///
/// Obtained via `Database::ledger()`; all writers from one `Database` share
/// the same lock registry, so concurrent operations on the same product
/// serialize correctly.
#[derive(Debug, Clone)]
pub struct LedgerWriter {
    pool: SqlitePool,
    locks: Arc<ProductLocks>,
    lock_timeout: Duration,
}

impl LedgerWriter {
    pub(crate) fn new(pool: SqlitePool, locks: Arc<ProductLocks>, lock_timeout: Duration) -> Self {
        LedgerWriter {
            pool,
            locks,
            lock_timeout,
        }
    }

    /// Overrides the bounded lock wait for this writer instance.
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Completes a point-of-sale checkout.
    ///
    /// ## What Happens
    /// 1. Validates the cart (non-empty, qty/discount rules per line)
    /// 2. Locks every product in the cart
    /// 3. Checks each line against a running remaining counter per product,
    ///    so a second line for the same product sees the stock the first
    ///    line already claimed
    /// 4. Writes one Sale, one SaleItem per line, and decrements each
    ///    product's stock by its summed quantity - all in one transaction
    ///
    /// Line prices: `effective = max(0, sell_price - discount)`; the item
    /// stores the effective price, not the discount.
    ///
    /// ## Errors
    /// * `CoreError::EmptyCart` - no lines
    /// * `CoreError::ProductNotFound` - a line references an unknown product
    /// * `CoreError::InsufficientStock` - attributed to the first line that
    ///   exceeds what is left
    /// * `LedgerError::Contention` - locks not acquired in time (retryable)
    pub async fn checkout(
        &self,
        customer_name: &str,
        lines: &[CartLine],
    ) -> LedgerResult<(Sale, Vec<SaleItem>)> {
        if lines.is_empty() {
            return Err(CoreError::EmptyCart.into());
        }
        if lines.len() > MAX_CART_LINES {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_LINES,
            }
            .into());
        }
        for line in lines {
            validate_quantity(line.qty).map_err(CoreError::from)?;
            validate_discount(line.discount).map_err(CoreError::from)?;
        }

        let customer_name = normalize_customer_name(customer_name);
        let product_ids: Vec<String> = lines.iter().map(|l| l.product_id.clone()).collect();

        debug!(
            customer = %customer_name,
            lines = lines.len(),
            "Starting checkout"
        );

        let _locks = self.locks.acquire(&product_ids, self.lock_timeout).await?;
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        // Locked read of each distinct product; the map doubles as the
        // running remaining counter.
        let mut products: HashMap<String, Product> = HashMap::new();
        let mut remaining: HashMap<String, i64> = HashMap::new();
        for line in lines {
            if !products.contains_key(&line.product_id) {
                let product = fetch_product(&mut tx, &line.product_id).await?;
                remaining.insert(product.id.clone(), product.stock);
                products.insert(product.id.clone(), product);
            }
        }

        // Per-line stock check + item construction.
        let sale_id = generate_id();
        let now = Utc::now();
        let mut items = Vec::with_capacity(lines.len());
        let mut total = Money::zero();
        let mut cost = Money::zero();
        let mut consumed: HashMap<String, i64> = HashMap::new();

        for line in lines {
            let product = &products[&line.product_id];
            let left = remaining
                .get_mut(&line.product_id)
                .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;

            if line.qty > *left {
                return Err(CoreError::InsufficientStock {
                    product: product.name.clone(),
                    available: *left,
                    requested: line.qty,
                }
                .into());
            }
            *left -= line.qty;
            *consumed.entry(line.product_id.clone()).or_insert(0) += line.qty;

            let effective = product.sell_price.discounted(line.discount);
            let subtotal = effective * line.qty;
            total += subtotal;
            cost += product.buy_price * line.qty;

            items.push(SaleItem {
                id: generate_id(),
                sale_id: sale_id.clone(),
                product_id: product.id.clone(),
                product_name: product.name.clone(),
                qty: line.qty,
                buy_price: product.buy_price,
                sell_price: effective,
                subtotal,
            });
        }

        let sale = Sale {
            id: sale_id,
            customer_name,
            total,
            cost,
            profit: total - cost,
            created_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO sales (id, customer_name, total, cost, profit, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.customer_name)
        .bind(sale.total)
        .bind(sale.cost)
        .bind(sale.profit)
        .bind(sale.created_at)
        .execute(&mut *tx)
        .await
        .map_err(DbError::from)?;

        for item in &items {
            sqlx::query(
                r#"
                INSERT INTO sale_items
                    (id, sale_id, product_id, product_name, qty, buy_price, sell_price, subtotal)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(&item.id)
            .bind(&item.sale_id)
            .bind(&item.product_id)
            .bind(&item.product_name)
            .bind(item.qty)
            .bind(item.buy_price)
            .bind(item.sell_price)
            .bind(item.subtotal)
            .execute(&mut *tx)
            .await
            .map_err(DbError::from)?;
        }

        for (product_id, qty) in &consumed {
            apply_stock_delta(&mut tx, product_id, -qty, now).await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            sale_id = %sale.id,
            total = %sale.total,
            profit = %sale.profit,
            "Checkout completed"
        );
        Ok((sale, items))
    }

    // =========================================================================
    // Replenish Stock
    // =========================================================================

    /// Adds purchased units to stock and records the matching purchase
    /// expense. This is the only stock-growth path.
    ///
    /// The auto expense: ProductPurchase, `amount = buy_price * qty`, named
    /// after the product, tagged with its id, dated `date` or today.
    pub async fn replenish_stock(
        &self,
        product_id: &str,
        qty: i64,
        date: Option<NaiveDate>,
    ) -> LedgerResult<(Product, Expense)> {
        validate_quantity(qty).map_err(CoreError::from)?;

        let _locks = self
            .locks
            .acquire(&[product_id.to_string()], self.lock_timeout)
            .await?;
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let mut product = fetch_product(&mut tx, product_id).await?;
        let now = Utc::now();

        apply_stock_delta(&mut tx, product_id, qty, now).await?;
        product.stock += qty;
        product.updated_at = now;

        let expense = Expense {
            id: generate_id(),
            name: format!("Purchase: {}", product.name),
            amount: product.buy_price * qty,
            category: ExpenseCategory::ProductPurchase,
            note: Some(format!("Added {qty} units")),
            product_id: Some(product.id.clone()),
            expense_date: date.unwrap_or_else(|| now.date_naive()),
            created_at: now,
        };
        insert_expense(&mut tx, &expense).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            product_id = %product.id,
            qty,
            stock = product.stock,
            expense = %expense.amount,
            "Stock replenished"
        );
        Ok((product, expense))
    }

    // =========================================================================
    // Correct Stock
    // =========================================================================

    /// Removes erroneously added units and reverses their purchase expense.
    ///
    /// The reversing entry mirrors the replenishment: ProductPurchase with
    /// `amount = -(buy_price * qty)` at the current buy price, the
    /// operator's reason in the note. No Sale is involved.
    ///
    /// ## Errors
    /// * `CoreError::OverCorrection` - qty exceeds current stock; a
    ///   correction can only take back what is on hand
    pub async fn correct_stock(
        &self,
        product_id: &str,
        qty: i64,
        reason: &str,
    ) -> LedgerResult<(Product, Expense)> {
        validate_quantity(qty).map_err(CoreError::from)?;

        let _locks = self
            .locks
            .acquire(&[product_id.to_string()], self.lock_timeout)
            .await?;
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let mut product = fetch_product(&mut tx, product_id).await?;
        if qty > product.stock {
            return Err(CoreError::OverCorrection {
                product: product.name,
                stock: product.stock,
                requested: qty,
            }
            .into());
        }

        let now = Utc::now();
        apply_stock_delta(&mut tx, product_id, -qty, now).await?;
        product.stock -= qty;
        product.updated_at = now;

        let reason = reason.trim();
        let expense = Expense {
            id: generate_id(),
            name: format!("Stock correction: {}", product.name),
            amount: -(product.buy_price * qty),
            category: ExpenseCategory::ProductPurchase,
            note: (!reason.is_empty()).then(|| reason.to_string()),
            product_id: Some(product.id.clone()),
            expense_date: now.date_naive(),
            created_at: now,
        };
        insert_expense(&mut tx, &expense).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            product_id = %product.id,
            qty,
            stock = product.stock,
            reversal = %expense.amount,
            "Stock corrected"
        );
        Ok((product, expense))
    }

    // =========================================================================
    // Delete Sale
    // =========================================================================

    /// Removes a sale and its line items.
    ///
    /// Stock is NOT restored: the units left the shelf when the sale
    /// happened, and deleting the record does not put them back. An operator
    /// who needs the units back replenishes explicitly.
    pub async fn delete_sale(&self, sale_id: &str) -> LedgerResult<()> {
        debug!(sale_id = %sale_id, "Deleting sale");

        // Items go via ON DELETE CASCADE; no product locks needed since
        // stock is untouched.
        let result = sqlx::query("DELETE FROM sales WHERE id = ?1")
            .bind(sale_id)
            .execute(&self.pool)
            .await
            .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            return Err(CoreError::SaleNotFound(sale_id.to_string()).into());
        }

        info!(sale_id = %sale_id, "Sale deleted (stock unchanged)");
        Ok(())
    }

    // =========================================================================
    // Update Sale
    // =========================================================================

    /// Corrects a sale's customer name. Financial fields are immutable;
    /// this is the only post-creation edit a sale accepts.
    pub async fn update_sale_customer(
        &self,
        sale_id: &str,
        customer_name: &str,
    ) -> LedgerResult<Sale> {
        let customer_name = normalize_customer_name(customer_name);

        let result = sqlx::query("UPDATE sales SET customer_name = ?2 WHERE id = ?1")
            .bind(sale_id)
            .bind(&customer_name)
            .execute(&self.pool)
            .await
            .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            return Err(CoreError::SaleNotFound(sale_id.to_string()).into());
        }

        let sale = sqlx::query_as::<_, Sale>(
            "SELECT id, customer_name, total, cost, profit, created_at FROM sales WHERE id = ?1",
        )
        .bind(sale_id)
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::from)?;

        info!(sale_id = %sale_id, customer = %sale.customer_name, "Sale customer updated");
        Ok(sale)
    }
}

// =============================================================================
// Transaction Helpers
// =============================================================================

/// Reads a product inside the transaction. Unknown id is a business error,
/// not a DbError: the caller named a product that does not exist.
async fn fetch_product(
    tx: &mut Transaction<'_, Sqlite>,
    product_id: &str,
) -> LedgerResult<Product> {
    let product = sqlx::query_as::<_, Product>(
        r#"
        SELECT id, name, buy_price, sell_price, stock, created_at, updated_at
        FROM products WHERE id = ?1
        "#,
    )
    .bind(product_id)
    .fetch_optional(&mut **tx)
    .await
    .map_err(DbError::from)?;

    product.ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()).into())
}

/// Applies a stock delta inside the transaction. The `CHECK (stock >= 0)`
/// constraint backs up the in-process validation.
async fn apply_stock_delta(
    tx: &mut Transaction<'_, Sqlite>,
    product_id: &str,
    delta: i64,
    now: chrono::DateTime<Utc>,
) -> LedgerResult<()> {
    let result = sqlx::query(
        "UPDATE products SET stock = stock + ?2, updated_at = ?3 WHERE id = ?1",
    )
    .bind(product_id)
    .bind(delta)
    .bind(now)
    .execute(&mut **tx)
    .await
    .map_err(DbError::from)?;

    if result.rows_affected() == 0 {
        return Err(CoreError::ProductNotFound(product_id.to_string()).into());
    }

    Ok(())
}

async fn insert_expense(tx: &mut Transaction<'_, Sqlite>, expense: &Expense) -> LedgerResult<()> {
    sqlx::query(
        r#"
        INSERT INTO expenses (id, name, amount, category, note, product_id, expense_date, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&expense.id)
    .bind(&expense.name)
    .bind(expense.amount)
    .bind(expense.category)
    .bind(&expense.note)
    .bind(&expense.product_id)
    .bind(expense.expense_date)
    .bind(expense.created_at)
    .execute(&mut **tx)
    .await
    .map_err(DbError::from)?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
