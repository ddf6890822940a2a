//! # Expense Repository
//!
//! Manual expense journal entries.
//!
//! ## Two Kinds of Entries
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Manual (this file)                Auto-generated (ledger.rs)           │
//! │  ──────────────────────────        ──────────────────────────────       │
//! │  Rent, wages, electricity,         "Purchase: {product}" on replenish,  │
//! │  ad-hoc purchases                  reversal entries on correction       │
//! │  Caller picks expense_date         product_id tag set automatically     │
//! │  Freely editable and deletable     Same table, same shape               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Amounts are signed: the journal accepts negative manual entries as
//! reversals of earlier mistakes.

use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};

use camela_core::validation::{validate_expense_amount, validate_expense_name, validate_search_query};
use camela_core::{Expense, ExpenseCategory, Money};

use crate::error::{DbError, DbResult, LedgerResult};
use crate::repository::generate_id;

const EXPENSE_COLUMNS: &str =
    "id, name, amount, category, note, product_id, expense_date, created_at";

/// Repository for expense journal operations.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    pool: SqlitePool,
}

impl ExpenseRepository {
    /// Creates a new ExpenseRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ExpenseRepository { pool }
    }

    /// Records a manual expense entry.
    ///
    /// The caller picks the `expense_date` (backdating is allowed) and the
    /// category; a manual ProductPurchase entry is legitimate for stock
    /// bought outside the replenishment flow.
    ///
    /// ## Errors
    /// * `LedgerError::Core` - empty name or zero amount
    pub async fn create(
        &self,
        name: &str,
        amount: Money,
        category: ExpenseCategory,
        note: Option<&str>,
        expense_date: NaiveDate,
    ) -> LedgerResult<Expense> {
        validate_expense_name(name).map_err(camela_core::CoreError::from)?;
        validate_expense_amount(amount).map_err(camela_core::CoreError::from)?;

        let expense = Expense {
            id: generate_id(),
            name: name.trim().to_string(),
            amount,
            category,
            note: note.map(str::to_string),
            product_id: None,
            expense_date,
            created_at: Utc::now(),
        };

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
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        info!(id = %expense.id, amount = %expense.amount, "Expense recorded");
        Ok(expense)
    }

    /// Updates an expense entry.
    ///
    /// The product_id tag is preserved as-is; editing an auto-generated
    /// entry keeps its link to the product.
    pub async fn update(
        &self,
        id: &str,
        name: &str,
        amount: Money,
        category: ExpenseCategory,
        note: Option<&str>,
        expense_date: NaiveDate,
    ) -> LedgerResult<Expense> {
        validate_expense_name(name).map_err(camela_core::CoreError::from)?;
        validate_expense_amount(amount).map_err(camela_core::CoreError::from)?;

        debug!(id = %id, "Updating expense");

        let result = sqlx::query(
            r#"
            UPDATE expenses
            SET name = ?2, amount = ?3, category = ?4, note = ?5, expense_date = ?6
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(name.trim())
        .bind(amount)
        .bind(category)
        .bind(note)
        .bind(expense_date)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            return Err(camela_core::CoreError::ExpenseNotFound(id.to_string()).into());
        }

        let updated = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| camela_core::CoreError::ExpenseNotFound(id.to_string()))?;
        Ok(updated)
    }

    /// Deletes an expense entry.
    ///
    /// Deleting an auto-generated entry does not touch stock; the journal
    /// and the stock level are reconciled by construction, not by trigger.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting expense");

        let result = sqlx::query("DELETE FROM expenses WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Expense", id));
        }

        Ok(())
    }

    /// Gets an expense by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Expense>> {
        let expense = sqlx::query_as::<_, Expense>(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(expense)
    }

    /// Lists all expenses, newest journal day first.
    pub async fn list(&self) -> DbResult<Vec<Expense>> {
        let expenses = sqlx::query_as::<_, Expense>(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses ORDER BY expense_date DESC, created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(expenses)
    }

    /// Lists expenses whose `expense_date` falls inside the inclusive range.
    pub async fn list_in_range(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> DbResult<Vec<Expense>> {
        debug!(?from, ?to, "Listing expenses in range");

        let expenses = sqlx::query_as::<_, Expense>(&format!(
            r#"
            SELECT {EXPENSE_COLUMNS} FROM expenses
            WHERE (?1 IS NULL OR expense_date >= ?1)
              AND (?2 IS NULL OR expense_date <= ?2)
            ORDER BY expense_date DESC, created_at DESC, id DESC
            "#
        ))
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(expenses)
    }

    /// Searches expenses by case-insensitive name substring.
    pub async fn search(&self, query: &str) -> LedgerResult<Vec<Expense>> {
        let query = validate_search_query(query).map_err(camela_core::CoreError::from)?;

        if query.is_empty() {
            return Ok(self.list().await?);
        }

        let expenses = sqlx::query_as::<_, Expense>(&format!(
            r#"
            SELECT {EXPENSE_COLUMNS} FROM expenses
            WHERE name LIKE '%' || ?1 || '%' COLLATE NOCASE
            ORDER BY expense_date DESC, created_at DESC, id DESC
            "#
        ))
        .bind(&query)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;

        Ok(expenses)
    }

    /// Counts total expense entries (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM expenses")
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
    use crate::pool::{Database, DbConfig};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, d).unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let db = test_db().await;
        let repo = db.expenses();

        let expense = repo
            .create(
                "Store rent",
                Money::new(2_000_000),
                ExpenseCategory::Operational,
                Some("August"),
                day(1),
            )
            .await
            .unwrap();

        let loaded = repo.get_by_id(&expense.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Store rent");
        assert_eq!(loaded.amount.amount(), 2_000_000);
        assert_eq!(loaded.category, ExpenseCategory::Operational);
        assert_eq!(loaded.note.as_deref(), Some("August"));
        assert_eq!(loaded.expense_date, day(1));
        assert!(loaded.product_id.is_none());
    }

    #[tokio::test]
    async fn test_create_rejects_zero_amount_and_blank_name() {
        let db = test_db().await;
        let repo = db.expenses();

        assert!(repo
            .create("Rent", Money::zero(), ExpenseCategory::Operational, None, day(1))
            .await
            .is_err());
        assert!(repo
            .create("  ", Money::new(1_000), ExpenseCategory::Operational, None, day(1))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_negative_manual_entry_allowed() {
        let db = test_db().await;

        let reversal = db
            .expenses()
            .create(
                "Rent overcharge refund",
                Money::new(-150_000),
                ExpenseCategory::Operational,
                None,
                day(3),
            )
            .await
            .unwrap();

        assert!(reversal.amount.is_negative());
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let db = test_db().await;
        let repo = db.expenses();

        let expense = repo
            .create("Rent", Money::new(2_000_000), ExpenseCategory::Operational, None, day(1))
            .await
            .unwrap();

        let updated = repo
            .update(
                &expense.id,
                "Rent (corrected)",
                Money::new(1_800_000),
                ExpenseCategory::Operational,
                Some("renegotiated"),
                day(2),
            )
            .await
            .unwrap();
        assert_eq!(updated.amount.amount(), 1_800_000);
        assert_eq!(updated.expense_date, day(2));

        repo.delete(&expense.id).await.unwrap();
        assert!(repo.get_by_id(&expense.id).await.unwrap().is_none());
        assert!(matches!(
            repo.delete(&expense.id).await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_range_filter_on_expense_date() {
        let db = test_db().await;
        let repo = db.expenses();

        repo.create("Rent", Money::new(2_000_000), ExpenseCategory::Operational, None, day(1))
            .await
            .unwrap();
        repo.create("Wages", Money::new(3_000_000), ExpenseCategory::Operational, None, day(15))
            .await
            .unwrap();

        let first_half = repo.list_in_range(Some(day(1)), Some(day(10))).await.unwrap();
        assert_eq!(first_half.len(), 1);
        assert_eq!(first_half[0].name, "Rent");

        let open_ended = repo.list_in_range(Some(day(10)), None).await.unwrap();
        assert_eq!(open_ended.len(), 1);
        assert_eq!(open_ended[0].name, "Wages");
    }

    #[tokio::test]
    async fn test_search_by_name() {
        let db = test_db().await;
        let repo = db.expenses();

        repo.create("Electricity bill", Money::new(450_000), ExpenseCategory::Operational, None, day(5))
            .await
            .unwrap();

        let hits = repo.search("electric").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert!(repo.search("water").await.unwrap().is_empty());
    }
}
