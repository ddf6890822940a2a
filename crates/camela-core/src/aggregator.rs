//! # Report Aggregation
//!
//! Pure functions deriving financial summaries from snapshots of the ledger.
//!
//! ## Aggregation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Report Aggregation                                 │
//! │                                                                         │
//! │  camela-db ReportService loads a snapshot (no locks, read-committed)   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  &[Sale]  &[SaleItem]  &[Expense]  &[Product]                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  THIS MODULE: filter by DateRange, fold into summary structs           │
//! │       │                                                                 │
//! │       ├── financial_summary()   totals, gross & net profit             │
//! │       ├── top_products()        qty ranking with fixed tie-breaks      │
//! │       ├── weekly_trend()        7 daily revenue buckets                │
//! │       ├── expense_composition() Operational vs ProductPurchase         │
//! │       └── stock_valuation()     point-in-time inventory value          │
//! │                                                                         │
//! │  NEVER mutates state • empty input yields zero-valued results          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Day Boundaries
//! Sales are bucketed on the UTC calendar day of `created_at`; expenses use
//! their explicit `expense_date`. Sale items inherit their parent sale's
//! day. The write side records timestamps with the same boundary, so a sale
//! never drifts between days depending on who asks.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::{Expense, ExpenseCategory, Product, Sale, SaleItem};

// =============================================================================
// Date Range
// =============================================================================

/// An inclusive calendar-day range filter. Either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// First day included, or `None` for "since forever".
    pub from: Option<NaiveDate>,
    /// Last day included, or `None` for "until forever".
    pub to: Option<NaiveDate>,
}

impl DateRange {
    /// The unbounded range - every record matches.
    pub const fn all_time() -> Self {
        DateRange { from: None, to: None }
    }

    /// Both bounds set, inclusive on each end.
    pub const fn between(from: NaiveDate, to: NaiveDate) -> Self {
        DateRange {
            from: Some(from),
            to: Some(to),
        }
    }

    /// A single calendar day.
    pub const fn on(day: NaiveDate) -> Self {
        DateRange {
            from: Some(day),
            to: Some(day),
        }
    }

    /// Whether `day` falls inside this range.
    pub fn contains(&self, day: NaiveDate) -> bool {
        if let Some(from) = self.from {
            if day < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if day > to {
                return false;
            }
        }
        true
    }
}

// =============================================================================
// Financial Summary
// =============================================================================

/// Revenue, cost and expense totals for a period.
///
/// ## Accounting Note
/// `gross_profit` nets out per-unit cost recognized at sale time, while
/// `net_profit` subtracts *all* expenses - including the ProductPurchase
/// entries recorded when the same stock was replenished. Cost of goods is
/// therefore recognized twice across the two figures (once at purchase,
/// once at sale). The report shows both side by side and deliberately does
/// not reconcile them; see DESIGN.md.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialSummary {
    /// Σ Sale.total in range.
    pub revenue: Money,
    /// Σ Sale.cost in range.
    pub cost: Money,
    /// Σ Sale.profit in range (= revenue - cost).
    pub gross_profit: Money,
    /// Σ Operational expense amounts in range.
    pub opex: Money,
    /// Σ ProductPurchase expense amounts in range (reversals included).
    pub purchase_expense: Money,
    /// opex + purchase_expense.
    pub total_expense: Money,
    /// revenue - total_expense.
    pub net_profit: Money,
    /// Number of sales in range.
    pub sale_count: usize,
    /// Number of expense entries in range.
    pub expense_count: usize,
}

/// Computes the financial summary for a date range.
///
/// Empty input (or a range matching nothing) yields an all-zero summary,
/// never an error.
pub fn financial_summary(
    sales: &[Sale],
    expenses: &[Expense],
    range: &DateRange,
) -> FinancialSummary {
    let mut summary = FinancialSummary::default();

    for sale in sales.iter().filter(|s| range.contains(s.sale_date())) {
        summary.revenue += sale.total;
        summary.cost += sale.cost;
        summary.gross_profit += sale.profit;
        summary.sale_count += 1;
    }

    for expense in expenses.iter().filter(|e| range.contains(e.expense_date)) {
        match expense.category {
            ExpenseCategory::Operational => summary.opex += expense.amount,
            ExpenseCategory::ProductPurchase => summary.purchase_expense += expense.amount,
        }
        summary.expense_count += 1;
    }

    summary.total_expense = summary.opex + summary.purchase_expense;
    summary.net_profit = summary.revenue - summary.total_expense;
    summary
}

// =============================================================================
// Top Products
// =============================================================================

/// Aggregated sales of one product over a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSales {
    pub product_id: String,
    /// Snapshot name from the first sale item seen for this product.
    pub product_name: String,
    /// Total units sold in range.
    pub qty: i64,
    /// Total revenue from this product in range.
    pub subtotal: Money,
}

/// Ranks products by units sold over a date range.
///
/// ## Determinism
/// Sort order is fully specified: qty descending, ties broken by subtotal
/// descending, remaining ties by first-seen order in the input. The result
/// is therefore stable under re-ordering of equal items and safe to snapshot
/// in tests.
///
/// Sale items carry no date of their own; they inherit the parent sale's
/// calendar day, which is why the parent sales are passed alongside.
pub fn top_products(
    items: &[SaleItem],
    sales: &[Sale],
    range: &DateRange,
    n: usize,
) -> Vec<ProductSales> {
    let sale_days: HashMap<&str, NaiveDate> = sales
        .iter()
        .map(|s| (s.id.as_str(), s.sale_date()))
        .collect();

    // Accumulate in first-seen order; the Vec index doubles as the final
    // tie-break key.
    let mut order: Vec<ProductSales> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for item in items {
        let in_range = sale_days
            .get(item.sale_id.as_str())
            .is_some_and(|day| range.contains(*day));
        if !in_range {
            continue;
        }

        match index.get(item.product_id.as_str()) {
            Some(&i) => {
                order[i].qty += item.qty;
                order[i].subtotal += item.subtotal;
            }
            None => {
                index.insert(item.product_id.as_str(), order.len());
                order.push(ProductSales {
                    product_id: item.product_id.clone(),
                    product_name: item.product_name.clone(),
                    qty: item.qty,
                    subtotal: item.subtotal,
                });
            }
        }
    }

    let mut ranked: Vec<(usize, ProductSales)> = order.into_iter().enumerate().collect();
    ranked.sort_by(|(ia, a), (ib, b)| {
        b.qty
            .cmp(&a.qty)
            .then(b.subtotal.cmp(&a.subtotal))
            .then(ia.cmp(ib))
    });

    ranked.into_iter().map(|(_, p)| p).take(n).collect()
}

// =============================================================================
// Weekly Trend
// =============================================================================

/// Revenue total of one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySales {
    pub date: NaiveDate,
    pub total: Money,
}

/// Sums sale totals per calendar day for the 7 days ending at `end_date`
/// inclusive. Always returns exactly 7 buckets, oldest first; days without
/// sales are zero.
pub fn weekly_trend(sales: &[Sale], end_date: NaiveDate) -> Vec<DailySales> {
    (0..7)
        .map(|i| {
            let date = end_date - Duration::days(6 - i);
            let total = sales
                .iter()
                .filter(|s| s.sale_date() == date)
                .map(|s| s.total)
                .sum();
            DailySales { date, total }
        })
        .collect()
}

// =============================================================================
// Expense Composition
// =============================================================================

/// Per-category expense totals for composition (pie) views.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseComposition {
    pub operational: Money,
    pub product_purchase: Money,
}

/// Breaks expenses in range down by category.
pub fn expense_composition(expenses: &[Expense], range: &DateRange) -> ExpenseComposition {
    let mut composition = ExpenseComposition::default();

    for expense in expenses.iter().filter(|e| range.contains(e.expense_date)) {
        match expense.category {
            ExpenseCategory::Operational => composition.operational += expense.amount,
            ExpenseCategory::ProductPurchase => composition.product_purchase += expense.amount,
        }
    }

    composition
}

// =============================================================================
// Stock Valuation
// =============================================================================

/// Point-in-time value of inventory on hand. Never date-filtered: stock has
/// no history, only a current level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockValuation {
    /// Σ stock × buy_price.
    pub total_cost_value: Money,
    /// Σ stock × sell_price.
    pub total_sell_value: Money,
    /// total_sell_value - total_cost_value.
    pub estimated_profit_if_sold: Money,
}

/// Values current stock at cost and at sale price.
pub fn stock_valuation(products: &[Product]) -> StockValuation {
    let total_cost_value = products.iter().map(|p| p.stock_cost_value()).sum();
    let total_sell_value: Money = products.iter().map(|p| p.stock_sell_value()).sum();

    StockValuation {
        total_cost_value,
        total_sell_value,
        estimated_profit_if_sold: total_sell_value - total_cost_value,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    fn sale(id: &str, d: u32, total: i64, cost: i64) -> Sale {
        Sale {
            id: id.to_string(),
            customer_name: "General".to_string(),
            total: Money::new(total),
            cost: Money::new(cost),
            profit: Money::new(total - cost),
            created_at: Utc.with_ymd_and_hms(2026, 3, d, 10, 0, 0).unwrap(),
        }
    }

    fn item(sale_id: &str, product_id: &str, name: &str, qty: i64, price: i64) -> SaleItem {
        SaleItem {
            id: format!("{sale_id}-{product_id}"),
            sale_id: sale_id.to_string(),
            product_id: product_id.to_string(),
            product_name: name.to_string(),
            qty,
            buy_price: Money::new(price / 2),
            sell_price: Money::new(price),
            subtotal: Money::new(price * qty),
        }
    }

    fn expense(d: u32, amount: i64, category: ExpenseCategory) -> Expense {
        Expense {
            id: format!("e-{d}-{amount}"),
            name: "expense".to_string(),
            amount: Money::new(amount),
            category,
            note: None,
            product_id: None,
            expense_date: day(d),
            created_at: Utc.with_ymd_and_hms(2026, 3, d, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_financial_summary_empty_inputs_are_zero() {
        let summary = financial_summary(&[], &[], &DateRange::all_time());
        assert_eq!(summary, FinancialSummary::default());
        assert!(summary.net_profit.is_zero());
    }

    #[test]
    fn test_financial_summary_scenario() {
        // Shirt: replenish 10 @ 50_000, sell 3 @ 80_000, correct 2 back out.
        let sales = vec![sale("s-1", 10, 240_000, 150_000)];
        let expenses = vec![
            expense(9, 500_000, ExpenseCategory::ProductPurchase),
            expense(10, -100_000, ExpenseCategory::ProductPurchase),
        ];

        let summary = financial_summary(&sales, &expenses, &DateRange::all_time());
        assert_eq!(summary.revenue.amount(), 240_000);
        assert_eq!(summary.cost.amount(), 150_000);
        assert_eq!(summary.gross_profit.amount(), 90_000);
        assert_eq!(summary.opex.amount(), 0);
        assert_eq!(summary.purchase_expense.amount(), 400_000);
        assert_eq!(summary.total_expense.amount(), 400_000);
        assert_eq!(summary.net_profit.amount(), -160_000);
        assert_eq!(summary.sale_count, 1);
        assert_eq!(summary.expense_count, 2);
    }

    #[test]
    fn test_financial_summary_is_additive_over_adjacent_ranges() {
        let sales = vec![
            sale("s-1", 3, 100_000, 60_000),
            sale("s-2", 7, 250_000, 130_000),
            sale("s-3", 12, 80_000, 50_000),
        ];
        let expenses = vec![
            expense(4, 30_000, ExpenseCategory::Operational),
            expense(9, 200_000, ExpenseCategory::ProductPurchase),
            expense(12, -40_000, ExpenseCategory::ProductPurchase),
        ];

        let whole = financial_summary(&sales, &expenses, &DateRange::between(day(1), day(15)));
        let first = financial_summary(&sales, &expenses, &DateRange::between(day(1), day(8)));
        let second = financial_summary(&sales, &expenses, &DateRange::between(day(9), day(15)));

        assert_eq!(whole.revenue, first.revenue + second.revenue);
        assert_eq!(whole.opex, first.opex + second.opex);
        assert_eq!(
            whole.purchase_expense,
            first.purchase_expense + second.purchase_expense
        );
        assert_eq!(whole.net_profit, first.net_profit + second.net_profit);
        assert_eq!(whole.sale_count, first.sale_count + second.sale_count);
        assert_eq!(
            whole.expense_count,
            first.expense_count + second.expense_count
        );
    }

    #[test]
    fn test_date_range_bounds_are_inclusive() {
        let range = DateRange::between(day(5), day(10));
        assert!(range.contains(day(5)));
        assert!(range.contains(day(10)));
        assert!(!range.contains(day(4)));
        assert!(!range.contains(day(11)));

        assert!(DateRange::all_time().contains(day(1)));
        assert!(DateRange::on(day(7)).contains(day(7)));
        assert!(!DateRange::on(day(7)).contains(day(8)));
    }

    #[test]
    fn test_top_products_ranking_and_ties() {
        let sales = vec![sale("s-1", 5, 0, 0), sale("s-2", 6, 0, 0)];
        let items = vec![
            // "a": 5 units, 500 revenue; "b": 5 units, 600 revenue;
            // "c": 2 units.
            item("s-1", "a", "Product A", 3, 100),
            item("s-1", "b", "Product B", 5, 120),
            item("s-2", "a", "Product A", 2, 100),
            item("s-2", "c", "Product C", 2, 300),
        ];

        let ranked = top_products(&items, &sales, &DateRange::all_time(), 10);
        // b wins the qty tie on subtotal (600 > 500).
        assert_eq!(ranked[0].product_id, "b");
        assert_eq!(ranked[0].qty, 5);
        assert_eq!(ranked[0].subtotal.amount(), 600);
        assert_eq!(ranked[1].product_id, "a");
        assert_eq!(ranked[1].qty, 5);
        assert_eq!(ranked[2].product_id, "c");
    }

    #[test]
    fn test_top_products_stable_under_reordering() {
        let sales = vec![sale("s-1", 5, 0, 0)];
        // Identical qty and subtotal: first-seen order decides.
        let forward = vec![
            item("s-1", "a", "Product A", 2, 100),
            item("s-1", "b", "Product B", 2, 100),
        ];
        let reversed: Vec<SaleItem> = forward.iter().rev().cloned().collect();

        let from_forward = top_products(&forward, &sales, &DateRange::all_time(), 10);
        let from_reversed = top_products(&reversed, &sales, &DateRange::all_time(), 10);

        assert_eq!(from_forward[0].product_id, "a");
        assert_eq!(from_reversed[0].product_id, "b");
        // Each run is internally deterministic for its input order.
        assert_eq!(from_forward.len(), 2);
        assert_eq!(from_reversed.len(), 2);
    }

    #[test]
    fn test_top_products_respects_range_and_n() {
        let sales = vec![sale("s-1", 5, 0, 0), sale("s-2", 20, 0, 0)];
        let items = vec![
            item("s-1", "a", "Product A", 3, 100),
            item("s-2", "b", "Product B", 9, 100),
        ];

        let ranked = top_products(&items, &sales, &DateRange::between(day(1), day(10)), 10);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].product_id, "a");

        let capped = top_products(&items, &sales, &DateRange::all_time(), 1);
        assert_eq!(capped.len(), 1);
        assert_eq!(capped[0].product_id, "b");
    }

    #[test]
    fn test_weekly_trend_buckets() {
        let sales = vec![
            sale("s-1", 10, 100_000, 0),
            sale("s-2", 10, 50_000, 0),
            sale("s-3", 8, 30_000, 0),
            // Outside the window ending on day 10.
            sale("s-4", 3, 999_999, 0),
        ];

        let trend = weekly_trend(&sales, day(10));
        assert_eq!(trend.len(), 7);
        assert_eq!(trend[0].date, day(4));
        assert_eq!(trend[6].date, day(10));
        assert_eq!(trend[6].total.amount(), 150_000);
        assert_eq!(trend[4].total.amount(), 30_000);
        assert!(trend[0].total.is_zero());
    }

    #[test]
    fn test_expense_composition() {
        let expenses = vec![
            expense(5, 70_000, ExpenseCategory::Operational),
            expense(6, 500_000, ExpenseCategory::ProductPurchase),
            expense(7, -100_000, ExpenseCategory::ProductPurchase),
            expense(20, 999_999, ExpenseCategory::Operational),
        ];

        let composition = expense_composition(&expenses, &DateRange::between(day(1), day(10)));
        assert_eq!(composition.operational.amount(), 70_000);
        assert_eq!(composition.product_purchase.amount(), 400_000);
    }

    #[test]
    fn test_stock_valuation() {
        let products = vec![
            Product {
                id: "p-1".to_string(),
                name: "Kaos Polos".to_string(),
                buy_price: Money::new(50_000),
                sell_price: Money::new(80_000),
                stock: 5,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            Product {
                id: "p-2".to_string(),
                name: "Celana Jeans".to_string(),
                buy_price: Money::new(120_000),
                sell_price: Money::new(200_000),
                stock: 2,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
        ];

        let valuation = stock_valuation(&products);
        assert_eq!(valuation.total_cost_value.amount(), 490_000);
        assert_eq!(valuation.total_sell_value.amount(), 800_000);
        assert_eq!(valuation.estimated_profit_if_sold.amount(), 310_000);

        assert_eq!(stock_valuation(&[]), StockValuation::default());
    }
}
