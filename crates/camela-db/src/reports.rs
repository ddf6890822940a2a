//! # Report Service
//!
//! Read-only reporting over the ledger. Loads snapshot rows and delegates
//! the arithmetic to the pure functions in `camela_core::aggregator`.
//!
//! ## Read Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ReportService                                                          │
//! │       │                                                                 │
//! │       ├── SELECT sales / expenses / items in range  (read-committed,   │
//! │       │       no product locks - reads never block writers)            │
//! │       ▼                                                                 │
//! │  camela_core::aggregator::*  (pure, deterministic)                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  FinancialSummary / rankings / trend / valuation                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A report is a snapshot: a checkout committing mid-report lands in the
//! next report, never in a torn half of this one, because each aggregate
//! derives from a single query's rows.

use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::debug;

use camela_core::aggregator::{
    self, DailySales, DateRange, ExpenseComposition, FinancialSummary, ProductSales,
    StockValuation,
};
use camela_core::{Expense, Sale};

use crate::error::DbResult;
use crate::repository::expense::ExpenseRepository;
use crate::repository::product::ProductRepository;
use crate::repository::sale::SaleRepository;

/// Read-only reporting facade.
#[derive(Debug, Clone)]
pub struct ReportService {
    sales: SaleRepository,
    expenses: ExpenseRepository,
    products: ProductRepository,
}

impl ReportService {
    /// Creates a new ReportService.
    pub fn new(pool: SqlitePool) -> Self {
        ReportService {
            sales: SaleRepository::new(pool.clone()),
            expenses: ExpenseRepository::new(pool.clone()),
            products: ProductRepository::new(pool),
        }
    }

    /// Financial summary (revenue, expenses, profit figures) for the range.
    pub async fn financial_summary(&self, range: DateRange) -> DbResult<FinancialSummary> {
        debug!(?range, "Computing financial summary");

        let sales = self.sales.list_in_range(range.from, range.to).await?;
        let expenses = self.expenses.list_in_range(range.from, range.to).await?;

        Ok(aggregator::financial_summary(&sales, &expenses, &range))
    }

    /// The `n` best-selling products in the range, by units sold.
    pub async fn top_products(&self, range: DateRange, n: usize) -> DbResult<Vec<ProductSales>> {
        let sales = self.sales.list_in_range(range.from, range.to).await?;
        let items = self.sales.list_items_in_range(range.from, range.to).await?;

        Ok(aggregator::top_products(&items, &sales, &range, n))
    }

    /// Daily revenue for the 7 days ending at `end_date` inclusive.
    pub async fn weekly_trend(&self, end_date: NaiveDate) -> DbResult<Vec<DailySales>> {
        let from = end_date - chrono::Duration::days(6);
        let sales = self.sales.list_in_range(Some(from), Some(end_date)).await?;

        Ok(aggregator::weekly_trend(&sales, end_date))
    }

    /// Expense totals per category for the range.
    pub async fn expense_composition(&self, range: DateRange) -> DbResult<ExpenseComposition> {
        let expenses = self.expenses.list_in_range(range.from, range.to).await?;

        Ok(aggregator::expense_composition(&expenses, &range))
    }

    /// Point-in-time inventory valuation over the whole catalog.
    pub async fn stock_valuation(&self) -> DbResult<StockValuation> {
        let products = self.products.list().await?;

        Ok(aggregator::stock_valuation(&products))
    }

    /// Raw range-filtered sales for tabular display and export, newest
    /// first. The export collaborator renders these; the engine only
    /// selects and orders.
    pub async fn sales_in_range(&self, range: DateRange) -> DbResult<Vec<Sale>> {
        self.sales.list_in_range(range.from, range.to).await
    }

    /// Raw range-filtered expenses for tabular display and export.
    pub async fn expenses_in_range(&self, range: DateRange) -> DbResult<Vec<Expense>> {
        self.expenses.list_in_range(range.from, range.to).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use camela_core::{CartLine, ExpenseCategory, Money};
    use chrono::Utc;

    use crate::pool::{Database, DbConfig};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    /// The end-to-end ledger walk: replenish, sell, correct, report.
    #[tokio::test]
    async fn test_scenario_shirt_ledger_walk() {
        let db = test_db().await;
        let ledger = db.ledger();

        let shirt = db
            .products()
            .create("Shirt", Money::new(50_000), Money::new(80_000))
            .await
            .unwrap();

        // Replenish 10: stock 10, expense +500_000.
        let (product, expense) = ledger.replenish_stock(&shirt.id, 10, None).await.unwrap();
        assert_eq!(product.stock, 10);
        assert_eq!(expense.amount.amount(), 500_000);

        // Checkout 3 at no discount: total 240_000, cost 150_000,
        // profit 90_000, stock 7.
        let (sale, _) = ledger
            .checkout("Umum", &[CartLine::new(&shirt.id, 3)])
            .await
            .unwrap();
        assert_eq!(sale.total.amount(), 240_000);
        assert_eq!(sale.cost.amount(), 150_000);
        assert_eq!(sale.profit.amount(), 90_000);
        let after_sale = db.products().get_by_id(&shirt.id).await.unwrap().unwrap();
        assert_eq!(after_sale.stock, 7);

        // Correct 2: stock 5, expense -100_000.
        let (product, reversal) = ledger
            .correct_stock(&shirt.id, 2, "overcounted")
            .await
            .unwrap();
        assert_eq!(product.stock, 5);
        assert_eq!(reversal.amount.amount(), -100_000);

        // All-time summary.
        let summary = db
            .reports()
            .financial_summary(DateRange::all_time())
            .await
            .unwrap();
        assert_eq!(summary.revenue.amount(), 240_000);
        assert_eq!(summary.gross_profit.amount(), 90_000);
        assert_eq!(summary.purchase_expense.amount(), 400_000);
        assert_eq!(summary.total_expense.amount(), 400_000);
        assert_eq!(summary.net_profit.amount(), -160_000);
        assert_eq!(summary.sale_count, 1);
        assert_eq!(summary.expense_count, 2);
    }

    #[tokio::test]
    async fn test_summary_includes_manual_operational_expense() {
        let db = test_db().await;
        let today = Utc::now().date_naive();

        db.expenses()
            .create(
                "Rent",
                Money::new(2_000_000),
                ExpenseCategory::Operational,
                None,
                today,
            )
            .await
            .unwrap();

        let summary = db
            .reports()
            .financial_summary(DateRange::all_time())
            .await
            .unwrap();
        assert_eq!(summary.opex.amount(), 2_000_000);
        assert_eq!(summary.net_profit.amount(), -2_000_000);

        let composition = db
            .reports()
            .expense_composition(DateRange::all_time())
            .await
            .unwrap();
        assert_eq!(composition.operational.amount(), 2_000_000);
        assert!(composition.product_purchase.is_zero());
    }

    #[tokio::test]
    async fn test_empty_ledger_reports_zeros() {
        let db = test_db().await;
        let reports = db.reports();

        let summary = reports
            .financial_summary(DateRange::all_time())
            .await
            .unwrap();
        assert_eq!(summary, FinancialSummary::default());

        assert!(reports
            .top_products(DateRange::all_time(), 5)
            .await
            .unwrap()
            .is_empty());

        let valuation = reports.stock_valuation().await.unwrap();
        assert!(valuation.total_cost_value.is_zero());
    }

    #[tokio::test]
    async fn test_top_products_through_service() {
        let db = test_db().await;
        let ledger = db.ledger();

        let shirt = db
            .products()
            .create("Shirt", Money::new(50_000), Money::new(80_000))
            .await
            .unwrap();
        let jeans = db
            .products()
            .create("Jeans", Money::new(120_000), Money::new(200_000))
            .await
            .unwrap();
        ledger.replenish_stock(&shirt.id, 10, None).await.unwrap();
        ledger.replenish_stock(&jeans.id, 10, None).await.unwrap();

        ledger
            .checkout(
                "Budi",
                &[CartLine::new(&shirt.id, 5), CartLine::new(&jeans.id, 2)],
            )
            .await
            .unwrap();

        let ranked = db
            .reports()
            .top_products(DateRange::all_time(), 10)
            .await
            .unwrap();
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].product_name, "Shirt");
        assert_eq!(ranked[0].qty, 5);
        assert_eq!(ranked[1].product_name, "Jeans");
    }

    #[tokio::test]
    async fn test_weekly_trend_through_service() {
        let db = test_db().await;
        let ledger = db.ledger();

        let shirt = db
            .products()
            .create("Shirt", Money::new(50_000), Money::new(80_000))
            .await
            .unwrap();
        ledger.replenish_stock(&shirt.id, 10, None).await.unwrap();
        ledger
            .checkout("Budi", &[CartLine::new(&shirt.id, 2)])
            .await
            .unwrap();

        let today = Utc::now().date_naive();
        let trend = db.reports().weekly_trend(today).await.unwrap();

        assert_eq!(trend.len(), 7);
        assert_eq!(trend[6].date, today);
        assert_eq!(trend[6].total.amount(), 160_000);
        assert!(trend[..6].iter().all(|d| d.total.is_zero()));
    }

    #[tokio::test]
    async fn test_stock_valuation_through_service() {
        let db = test_db().await;
        let shirt = db
            .products()
            .create("Shirt", Money::new(50_000), Money::new(80_000))
            .await
            .unwrap();
        db.ledger().replenish_stock(&shirt.id, 5, None).await.unwrap();

        let valuation = db.reports().stock_valuation().await.unwrap();
        assert_eq!(valuation.total_cost_value.amount(), 250_000);
        assert_eq!(valuation.total_sell_value.amount(), 400_000);
        assert_eq!(valuation.estimated_profit_if_sold.amount(), 150_000);
    }
}
