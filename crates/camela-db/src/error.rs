//! # Database Error Types
//!
//! Error types for the persistence layer and the ledger writer.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← Adds context and categorization               │
//! │       │                                                                 │
//! │       ▼                                      CoreError (camela-core)   │
//! │  LedgerError ◄───────────────────────────────────┘                     │
//! │       │        also carries Contention from the lock registry          │
//! │       ▼                                                                 │
//! │  UI collaborator checks is_retryable() and renders the message         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use camela_core::CoreError;
use thiserror::Error;

// =============================================================================
// DbError
// =============================================================================

/// Database operation errors.
///
/// These errors wrap sqlx errors and provide additional context
/// for debugging and user feedback.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Database connection failed.
    ///
    /// ## When This Occurs
    /// - Database file doesn't exist and can't be created
    /// - File permissions issue
    /// - Disk full
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    ///
    /// Includes CHECK constraint violations, which should never be reached:
    /// the LedgerWriter validates before writing and the constraint is the
    /// last line of defense.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Transaction failed to commit.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLite error messages for constraints:
                // "UNIQUE constraint failed: <table>.<column>"
                // "FOREIGN KEY constraint failed"
                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// LedgerError
// =============================================================================

/// Errors surfaced by LedgerWriter operations.
///
/// The writer can fail three ways: a business rule said no (Core), another
/// writer held the product locks too long (Contention), or the database
/// itself failed (Db). Whatever the cause, the ledger is unchanged - every
/// operation runs in a single transaction that rolls back on drop.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Business rule violation from camela-core.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Could not acquire the per-product locks within the bounded wait.
    ///
    /// Retryable: the competing operation will finish and release the locks.
    #[error("Ledger contention on {products:?} after {waited:?}")]
    Contention {
        products: Vec<String>,
        waited: Duration,
    },

    /// Persistence failure.
    #[error(transparent)]
    Db(#[from] DbError),
}

impl LedgerError {
    /// Whether the caller may simply retry the same operation.
    ///
    /// True only for transient conditions (lock contention, pool
    /// exhaustion). Business rule violations and real database failures
    /// need intervention, not a retry loop.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LedgerError::Contention { .. } | LedgerError::Db(DbError::PoolExhausted)
        )
    }
}

/// Result type for ledger writer operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        let contention = LedgerError::Contention {
            products: vec!["p-1".to_string()],
            waited: Duration::from_secs(5),
        };
        assert!(contention.is_retryable());

        assert!(LedgerError::Db(DbError::PoolExhausted).is_retryable());

        let insufficient = LedgerError::Core(CoreError::InsufficientStock {
            product: "Kaos Polos".to_string(),
            available: 3,
            requested: 5,
        });
        assert!(!insufficient.is_retryable());

        let query = LedgerError::Db(DbError::QueryFailed("disk I/O error".to_string()));
        assert!(!query.is_retryable());
    }

    #[test]
    fn test_core_error_passes_through_transparent() {
        let err: LedgerError = CoreError::EmptyCart.into();
        assert_eq!(err.to_string(), "Cart is empty");
    }

    #[test]
    fn test_not_found_helper() {
        let err = DbError::not_found("Product", "abc-123");
        assert_eq!(err.to_string(), "Product not found: abc-123");
    }
}
