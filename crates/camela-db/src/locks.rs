//! # Per-Product Lock Registry
//!
//! Exclusive async locks keyed by product id, used by the LedgerWriter to
//! serialize stock mutations per product.
//!
//! ## Why Application-Level Locks?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Stock Mutation Serialization                         │
//! │                                                                         │
//! │  Two checkouts for the same product must not interleave between the    │
//! │  stock read and the stock write:                                       │
//! │                                                                         │
//! │  Writer A: read stock=5 ──► validate qty=3 ──► write stock=2           │
//! │  Writer B:      read stock=5 ──► validate qty=4 ──► write stock=1 ❌   │
//! │                                                                         │
//! │  With per-product locks:                                               │
//! │  Writer A: ▓▓▓▓ read 5, write 2 ▓▓▓▓                                   │
//! │  Writer B:                        ▓▓▓▓ read 2, reject qty=4 ▓▓▓▓       │
//! │                                                                         │
//! │  Deadlock avoidance: every operation locks its product ids in sorted,  │
//! │  deduplicated order, so two writers can never hold-and-wait in a cycle │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Waits are bounded: a writer that cannot get its locks within the timeout
//! gets a retryable `LedgerError::Contention` instead of queueing forever.

use std::collections::HashMap;
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time::{timeout, Instant};
use tracing::debug;

use crate::error::{LedgerError, LedgerResult};

// =============================================================================
// Lock Registry
// =============================================================================

/// Registry of one async mutex per product id.
///
/// Entries are created lazily on first lock and never removed; a store's
/// catalog is small enough that the registry never needs eviction.
#[derive(Debug, Default)]
pub struct ProductLocks {
    locks: StdMutex<HashMap<String, Arc<Mutex<()>>>>,
}

/// The acquired locks of one ledger operation. Dropping releases them all.
#[derive(Debug)]
pub struct LockSet {
    guards: Vec<OwnedMutexGuard<()>>,
}

impl LockSet {
    /// Number of product locks held.
    pub fn len(&self) -> usize {
        self.guards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }
}

impl ProductLocks {
    pub fn new() -> Self {
        ProductLocks {
            locks: StdMutex::new(HashMap::new()),
        }
    }

    /// Fetches or creates the mutex for one product id.
    fn entry(&self, product_id: &str) -> Arc<Mutex<()>> {
        let mut map = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(
            map.entry(product_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }

    /// Acquires exclusive locks for a set of product ids.
    ///
    /// Ids are sorted and deduplicated before locking, which is what makes
    /// concurrent multi-product operations deadlock-free. The whole
    /// acquisition shares one deadline; exceeding it returns
    /// `LedgerError::Contention` with every id the operation wanted.
    pub async fn acquire(
        &self,
        product_ids: &[String],
        wait: Duration,
    ) -> LedgerResult<LockSet> {
        let mut ids: Vec<&str> = product_ids.iter().map(String::as_str).collect();
        ids.sort_unstable();
        ids.dedup();

        debug!(count = ids.len(), "Acquiring product locks");

        let deadline = Instant::now() + wait;
        let mut guards = Vec::with_capacity(ids.len());

        for id in &ids {
            let mutex = self.entry(id);
            let remaining = deadline.saturating_duration_since(Instant::now());

            match timeout(remaining, mutex.lock_owned()).await {
                Ok(guard) => guards.push(guard),
                Err(_) => {
                    // Guards acquired so far drop here, releasing them.
                    return Err(LedgerError::Contention {
                        products: ids.iter().map(|s| s.to_string()).collect(),
                        waited: wait,
                    });
                }
            }
        }

        Ok(LockSet { guards })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_acquire_and_release() {
        let locks = ProductLocks::new();

        let set = locks
            .acquire(&["p-1".to_string()], Duration::from_millis(100))
            .await
            .unwrap();
        assert_eq!(set.len(), 1);
        drop(set);

        // Released: a second acquisition succeeds immediately.
        let set = locks
            .acquire(&["p-1".to_string()], Duration::from_millis(100))
            .await
            .unwrap();
        assert_eq!(set.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_ids_lock_once() {
        let locks = ProductLocks::new();

        // Two cart lines for the same product must not self-deadlock.
        let set = locks
            .acquire(
                &["p-1".to_string(), "p-1".to_string()],
                Duration::from_millis(100),
            )
            .await
            .unwrap();
        assert_eq!(set.len(), 1);
    }

    #[tokio::test]
    async fn test_contention_times_out_retryable() {
        let locks = ProductLocks::new();

        let held = locks
            .acquire(&["p-1".to_string()], Duration::from_millis(100))
            .await
            .unwrap();

        let err = locks
            .acquire(
                &["p-1".to_string(), "p-2".to_string()],
                Duration::from_millis(50),
            )
            .await
            .unwrap_err();

        assert!(err.is_retryable());
        match err {
            LedgerError::Contention { products, .. } => {
                assert_eq!(products, vec!["p-1".to_string(), "p-2".to_string()]);
            }
            other => panic!("expected Contention, got {other:?}"),
        }

        drop(held);
    }

    #[tokio::test]
    async fn test_disjoint_products_do_not_block() {
        let locks = ProductLocks::new();

        let _a = locks
            .acquire(&["p-1".to_string()], Duration::from_millis(50))
            .await
            .unwrap();
        // Different product: no contention even while p-1 is held.
        let _b = locks
            .acquire(&["p-2".to_string()], Duration::from_millis(50))
            .await
            .unwrap();
    }
}
