//! # Repository Layer
//!
//! One repository per entity, each owning the SQL for that table.
//!
//! ## Write Discipline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ProductRepository  - catalog CRUD; NEVER touches the stock column      │
//! │  SaleRepository     - reads only; sales are written and deleted by      │
//! │                       the LedgerWriter inside its transactions          │
//! │  ExpenseRepository  - manual journal entries (auto entries come from    │
//! │                       the LedgerWriter)                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod expense;
pub mod product;
pub mod sale;

use uuid::Uuid;

/// Generates a new entity id (UUID v4).
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}
