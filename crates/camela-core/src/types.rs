//! # Domain Types
//!
//! Core domain types of the Camela store ledger.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │    Expense      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  name           │   │  customer_name  │   │  name           │       │
//! │  │  buy_price      │   │  total/cost/    │   │  amount (signed)│       │
//! │  │  sell_price     │   │  profit         │   │  category       │       │
//! │  │  stock (>= 0)   │   └────────┬────────┘   │  expense_date   │       │
//! │  └─────────────────┘            │            └─────────────────┘       │
//! │                        ┌────────┴────────┐                             │
//! │                        │    SaleItem     │  snapshot of product data   │
//! │                        │  product_name,  │  at sale time - survives    │
//! │                        │  prices, qty    │  product deletion           │
//! │                        └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! SaleItem copies `product_name`, `buy_price` and `sell_price` from the
//! Product at checkout time. The `product_id` is a plain reference, not an
//! enforced foreign key: deleting a product never rewrites sales history.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A catalog product with its current stock level.
///
/// `stock` is never mutated directly: every change routes through one of the
/// three LedgerWriter operations (checkout, replenish, correct) so the
/// matching Sale/Expense rows are written in the same transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name, unique enough for the cashier; not a system key.
    pub name: String,

    /// Unit acquisition cost.
    pub buy_price: Money,

    /// Unit sale price before any per-line discount.
    pub sell_price: Money,

    /// Units on hand. Invariant: never negative.
    pub stock: i64,

    /// When the product was registered.
    pub created_at: DateTime<Utc>,

    /// When name/prices were last updated or stock last moved.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Current stock valued at acquisition cost.
    #[inline]
    pub fn stock_cost_value(&self) -> Money {
        self.buy_price.multiply_quantity(self.stock)
    }

    /// Current stock valued at sale price.
    #[inline]
    pub fn stock_sell_value(&self) -> Money {
        self.sell_price.multiply_quantity(self.stock)
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A completed point-of-sale transaction.
///
/// Financial fields are immutable once written. Corrections happen by
/// reversing entries (or deleting the sale), never by editing `total`,
/// `cost` or `profit` in place. Only `customer_name` may be amended.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,

    /// Customer display name; `"General"` for walk-in customers.
    pub customer_name: String,

    /// Sum of line subtotals (effective price × qty).
    pub total: Money,

    /// Sum of line buy-cost (buy price × qty).
    pub cost: Money,

    /// `total - cost`, denormalized at write time.
    pub profit: Money,

    pub created_at: DateTime<Utc>,
}

impl Sale {
    /// The calendar day this sale belongs to for reporting (UTC day, the
    /// same boundary used when the sale was recorded).
    #[inline]
    pub fn sale_date(&self) -> NaiveDate {
        self.created_at.date_naive()
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item of a sale.
/// Uses the snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleItem {
    pub id: String,

    /// Owning sale; items are created and deleted only with their parent.
    pub sale_id: String,

    /// Reference to the product (may dangle after product deletion).
    pub product_id: String,

    /// Product name at time of sale (frozen).
    pub product_name: String,

    /// Quantity sold, always > 0.
    pub qty: i64,

    /// Unit cost at time of sale (frozen).
    pub buy_price: Money,

    /// Effective unit price after the per-line discount was absorbed.
    /// The discount is not stored separately.
    pub sell_price: Money,

    /// `sell_price * qty`, denormalized at write time.
    pub subtotal: Money,
}

// =============================================================================
// Expense Category
// =============================================================================

/// The two expense journal categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum ExpenseCategory {
    /// Rent, electricity, wages - anything not tied to stock movement.
    Operational,
    /// Stock acquisition cost. Written automatically by the LedgerWriter on
    /// replenishment (positive) and correction (negative), or entered
    /// manually.
    ProductPurchase,
}

impl fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpenseCategory::Operational => write!(f, "Operational"),
            ExpenseCategory::ProductPurchase => write!(f, "Product Purchase"),
        }
    }
}

// =============================================================================
// Expense
// =============================================================================

/// An expense journal entry.
///
/// `amount` is signed: positive records an outflow, negative reverses a
/// previously recorded outflow (stock corrections write negative
/// ProductPurchase entries).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Expense {
    pub id: String,

    pub name: String,

    /// Signed amount: positive = outflow, negative = reversal.
    pub amount: Money,

    pub category: ExpenseCategory,

    /// Free-form note; stock corrections store the operator's reason here.
    pub note: Option<String>,

    /// For auto-generated ProductPurchase entries, the product whose stock
    /// moved. No enforced foreign key - the product may be deleted later.
    pub product_id: Option<String>,

    /// The day the expense belongs to for reporting. User-entered expenses
    /// may be backdated; auto-generated ones default to the current day.
    pub expense_date: NaiveDate,

    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Cart Line
// =============================================================================

/// One requested line of a checkout cart, as submitted by the UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: String,

    /// Units requested, must be > 0.
    pub qty: i64,

    /// Absolute per-unit discount, must be >= 0. The effective price is
    /// `max(0, sell_price - discount)`.
    pub discount: Money,
}

impl CartLine {
    /// A plain line with no discount.
    pub fn new(product_id: impl Into<String>, qty: i64) -> Self {
        CartLine {
            product_id: product_id.into(),
            qty,
            discount: Money::zero(),
        }
    }

    /// A line with an absolute per-unit discount.
    pub fn with_discount(product_id: impl Into<String>, qty: i64, discount: Money) -> Self {
        CartLine {
            product_id: product_id.into(),
            qty,
            discount,
        }
    }
}

// =============================================================================
// Store Profile
// =============================================================================

/// Read-only store identity handed to the export collaborator for document
/// headers (receipts, PDF reports). Not part of the ledger: the engine never
/// reads it, only passes it through.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreProfile {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub logo_url: Option<String>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(stock: i64) -> Product {
        Product {
            id: "p-1".to_string(),
            name: "Kaos Polos".to_string(),
            buy_price: Money::new(50_000),
            sell_price: Money::new(80_000),
            stock,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_stock_valuation_helpers() {
        let p = product(10);
        assert_eq!(p.stock_cost_value().amount(), 500_000);
        assert_eq!(p.stock_sell_value().amount(), 800_000);

        let empty = product(0);
        assert!(empty.stock_cost_value().is_zero());
    }

    #[test]
    fn test_sale_date_is_utc_day() {
        let sale = Sale {
            id: "s-1".to_string(),
            customer_name: "General".to_string(),
            total: Money::new(240_000),
            cost: Money::new(150_000),
            profit: Money::new(90_000),
            created_at: "2026-03-05T23:30:00Z".parse().unwrap(),
        };
        assert_eq!(sale.sale_date(), NaiveDate::from_ymd_opt(2026, 3, 5).unwrap());
    }

    #[test]
    fn test_expense_category_serde_names() {
        let json = serde_json::to_string(&ExpenseCategory::ProductPurchase).unwrap();
        assert_eq!(json, "\"product_purchase\"");
        let back: ExpenseCategory = serde_json::from_str("\"operational\"").unwrap();
        assert_eq!(back, ExpenseCategory::Operational);
    }

    #[test]
    fn test_store_profile_round_trips_for_export() {
        let profile = StoreProfile {
            name: "Camela Store".to_string(),
            address: "Jl. Merdeka 12".to_string(),
            phone: "0812-0000-0000".to_string(),
            logo_url: None,
        };
        let json = serde_json::to_string(&profile).unwrap();
        let back: StoreProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(back.name, "Camela Store");
        assert!(back.logo_url.is_none());
    }

    #[test]
    fn test_cart_line_constructors() {
        let plain = CartLine::new("p-1", 3);
        assert!(plain.discount.is_zero());

        let discounted = CartLine::with_discount("p-1", 2, Money::new(5_000));
        assert_eq!(discounted.discount.amount(), 5_000);
    }
}
