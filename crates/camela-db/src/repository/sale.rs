//! # Sale Repository
//!
//! Read access to sales and their line items.
//!
//! ## Why No Insert/Delete Here
//! Sales only come into existence through `LedgerWriter::checkout` and only
//! leave through `LedgerWriter::delete_sale` - both need the stock columns
//! and the sale rows in one transaction. This repository is the query
//! surface for listings, detail views and exports.

use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::debug;

use camela_core::validation::validate_search_query;
use camela_core::{Sale, SaleItem};

use crate::error::{DbError, DbResult, LedgerResult};

const SALE_COLUMNS: &str = "id, customer_name, total, cost, profit, created_at";
const ITEM_COLUMNS: &str =
    "id, sale_id, product_id, product_name, qty, buy_price, sell_price, subtotal";

/// Repository for sale queries.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Gets a sale together with its line items.
    pub async fn get_with_items(&self, id: &str) -> DbResult<Option<(Sale, Vec<SaleItem>)>> {
        let Some(sale) = self.get_by_id(id).await? else {
            return Ok(None);
        };

        let items = self.items_for_sale(id).await?;
        Ok(Some((sale, items)))
    }

    /// Lists the line items of one sale, in insertion order.
    pub async fn items_for_sale(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM sale_items WHERE sale_id = ?1 ORDER BY rowid"
        ))
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Lists all sales, newest first.
    pub async fn list(&self) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Lists sales whose calendar day falls inside the inclusive range.
    /// Either bound may be `None` for an open end.
    pub async fn list_in_range(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> DbResult<Vec<Sale>> {
        debug!(?from, ?to, "Listing sales in range");

        // created_at is RFC 3339 UTC text; date() extracts the calendar day,
        // the same boundary sale_date() uses in-process.
        let sales = sqlx::query_as::<_, Sale>(&format!(
            r#"
            SELECT {SALE_COLUMNS} FROM sales
            WHERE (?1 IS NULL OR date(created_at) >= ?1)
              AND (?2 IS NULL OR date(created_at) <= ?2)
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Lists the line items of every sale in the range, for product
    /// rankings. Items carry no date; the join supplies the parent's day.
    pub async fn list_items_in_range(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(&format!(
            r#"
            SELECT si.id, si.sale_id, si.product_id, si.product_name,
                   si.qty, si.buy_price, si.sell_price, si.subtotal
            FROM sale_items si
            INNER JOIN sales s ON s.id = si.sale_id
            WHERE (?1 IS NULL OR date(s.created_at) >= ?1)
              AND (?2 IS NULL OR date(s.created_at) <= ?2)
            ORDER BY s.created_at, si.rowid
            "#
        ))
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Searches sales by case-insensitive customer name substring,
    /// newest first.
    pub async fn search_by_customer(&self, query: &str) -> LedgerResult<Vec<Sale>> {
        let query = validate_search_query(query).map_err(camela_core::CoreError::from)?;

        if query.is_empty() {
            return Ok(self.list().await?);
        }

        let sales = sqlx::query_as::<_, Sale>(&format!(
            r#"
            SELECT {SALE_COLUMNS} FROM sales
            WHERE customer_name LIKE '%' || ?1 || '%' COLLATE NOCASE
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(&query)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;

        Ok(sales)
    }

    /// Counts total sales (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
// Write-path coverage lives in ledger.rs tests; here we only exercise the
// query surface against sales created through the writer.

#[cfg(test)]
mod tests {
    use camela_core::{CartLine, Money};

    use crate::pool::{Database, DbConfig};

    async fn db_with_sale() -> (Database, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let product = db
            .products()
            .create("Kaos Polos", Money::new(50_000), Money::new(80_000))
            .await
            .unwrap();
        db.ledger()
            .replenish_stock(&product.id, 10, None)
            .await
            .unwrap();
        let (sale, _) = db
            .ledger()
            .checkout("Budi", &[CartLine::new(&product.id, 3)])
            .await
            .unwrap();

        (db, sale.id)
    }

    #[tokio::test]
    async fn test_get_with_items() {
        let (db, sale_id) = db_with_sale().await;

        let (sale, items) = db.sales().get_with_items(&sale_id).await.unwrap().unwrap();
        assert_eq!(sale.customer_name, "Budi");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].qty, 3);
        assert_eq!(items[0].product_name, "Kaos Polos");

        assert!(db.sales().get_with_items("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_and_range() {
        let (db, _) = db_with_sale().await;
        let repo = db.sales();

        let all = repo.list().await.unwrap();
        assert_eq!(all.len(), 1);

        let today = all[0].sale_date();
        let in_range = repo.list_in_range(Some(today), Some(today)).await.unwrap();
        assert_eq!(in_range.len(), 1);

        let before = today.pred_opt().unwrap();
        let empty = repo.list_in_range(None, Some(before)).await.unwrap();
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn test_items_in_range_join() {
        let (db, _) = db_with_sale().await;

        let items = db.sales().list_items_in_range(None, None).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].subtotal.amount(), 240_000);
    }

    #[tokio::test]
    async fn test_search_by_customer() {
        let (db, _) = db_with_sale().await;
        let repo = db.sales();

        let hits = repo.search_by_customer("bud").await.unwrap();
        assert_eq!(hits.len(), 1);

        let none = repo.search_by_customer("siti").await.unwrap();
        assert!(none.is_empty());
    }
}
