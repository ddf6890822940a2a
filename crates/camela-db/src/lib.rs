//! # camela-db: Ledger Persistence for the Camela Engine
//!
//! SQLite persistence for the Camela store ledger: catalog, sales, the
//! expense journal, and the consistency machinery tying them together.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Camela Ledger Data Flow                           │
//! │                                                                         │
//! │  UI / Export collaborator                                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    camela-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌───────────────┐   ┌────────────────┐   │   │
//! │  │   │   Database    │   │ Repositories  │   │  LedgerWriter  │   │   │
//! │  │   │   (pool.rs)   │◄──│ product/sale/ │   │  + ProductLocks│   │   │
//! │  │   │  + migrations │   │ expense       │   │  (stock paths) │   │   │
//! │  │   └───────────────┘   └───────────────┘   └────────────────┘   │   │
//! │  │                             ▲                                   │   │
//! │  │                      ┌──────┴───────┐                           │   │
//! │  │                      │ReportService │──► camela-core aggregator │   │
//! │  │                      └──────────────┘                           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (WAL mode, embedded migrations)                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool, configuration, the `Database` handle
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - `DbError` and `LedgerError`
//! - [`locks`] - Per-product lock registry
//! - [`repository`] - Repositories (product, sale, expense)
//! - [`ledger`] - The `LedgerWriter`, sole owner of stock mutation
//! - [`reports`] - Read-only `ReportService`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use camela_db::{Database, DbConfig};
//! use camela_core::{CartLine, Money};
//!
//! let db = Database::new(DbConfig::new("camela.db")).await?;
//!
//! let shirt = db.products()
//!     .create("Shirt", Money::new(50_000), Money::new(80_000))
//!     .await?;
//! db.ledger().replenish_stock(&shirt.id, 10, None).await?;
//! let (sale, _items) = db.ledger()
//!     .checkout("Umum", &[CartLine::new(&shirt.id, 3)])
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod ledger;
pub mod locks;
pub mod migrations;
pub mod pool;
pub mod reports;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, LedgerError};
pub use ledger::LedgerWriter;
pub use pool::{Database, DbConfig};
pub use reports::ReportService;

// Repository re-exports for convenience
pub use repository::expense::ExpenseRepository;
pub use repository::product::ProductRepository;
pub use repository::sale::SaleRepository;
