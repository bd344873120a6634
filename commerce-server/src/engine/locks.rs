//! Keyed async locks
//!
//! Stock mutation and order-state transitions are read-modify-write
//! sequences against the record store, so the engine serializes them per
//! key: one registry keyed by product id guards stock, one keyed by order
//! id guards transition checks. Multi-key acquisition locks in sorted order
//! so two multi-product operations can never deadlock each other.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Registry of per-key mutexes
#[derive(Debug, Default)]
pub struct LockRegistry {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, key: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Acquire the lock for a single key
    pub async fn acquire_one(&self, key: &str) -> OwnedMutexGuard<()> {
        self.lock_for(key).lock_owned().await
    }

    /// Acquire the locks for a set of keys
    ///
    /// Keys are deduplicated and locked in sorted order. The returned guards
    /// release on drop.
    pub async fn acquire(&self, keys: &[&str]) -> Vec<OwnedMutexGuard<()>> {
        let mut keys: Vec<&str> = keys.to_vec();
        keys.sort_unstable();
        keys.dedup();

        let mut guards = Vec::with_capacity(keys.len());
        for key in keys {
            guards.push(self.lock_for(key).lock_owned().await);
        }
        guards
    }
}
