#[cfg(feature = "couch-store")]
pub mod couchdb;
pub mod file;
pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use dashmap::DashMap;
use futures::future::BoxFuture;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::dao::storage::StorageResult;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Abstraction over a persistent string-keyed store holding JSON values.
///
/// Calls against the same key are applied in call order: a `set` issued later
/// always wins over one issued earlier, even when the returned futures are
/// polled out of order. No ordering is promised across different keys.
pub trait KeyValueStore: Send + Sync {
    /// Fetch the value stored under `key`, if any.
    fn get(&self, key: &str) -> BoxFuture<'static, StorageResult<Option<Value>>>;
    /// Replace the value stored under `key`.
    fn set(&self, key: &str, value: Value) -> BoxFuture<'static, StorageResult<()>>;
    /// Check that the backend is reachable.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Re-establish the backend connection after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}

/// Hands out per-call tickets and applies same-key writes newest-first.
///
/// A ticket is taken synchronously when `set` is called; the write itself runs
/// under a per-key lock and is dropped when a newer ticket already landed.
#[derive(Debug, Default)]
pub(crate) struct WriteSequencer {
    next: AtomicU64,
    applied: DashMap<String, Arc<Mutex<u64>>>,
}

impl WriteSequencer {
    pub(crate) fn ticket(&self) -> u64 {
        self.next.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn slot(&self, key: &str) -> Arc<Mutex<u64>> {
        self.applied
            .entry(key.to_owned())
            .or_insert_with(|| Arc::new(Mutex::new(0)))
            .clone()
    }

    /// Run `write` for `key` unless a newer ticket was already applied.
    ///
    /// Returns `Ok(false)` when the write was superseded and skipped.
    pub(crate) async fn apply<F, Fut>(&self, key: &str, ticket: u64, write: F) -> StorageResult<bool>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = StorageResult<()>>,
    {
        let slot = self.slot(key);
        let mut last = slot.lock().await;
        if *last > ticket {
            return Ok(false);
        }
        write().await?;
        *last = ticket;
        Ok(true)
    }
}
