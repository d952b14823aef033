use std::sync::Arc;

use dashmap::DashMap;
use futures::future::BoxFuture;
use serde_json::Value;

use super::{KeyValueStore, WriteSequencer};
use crate::dao::storage::StorageResult;

/// Process-local store, used by tests and by the `memory` backend.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    values: DashMap<String, Value>,
    sequencer: WriteSequencer,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `entries`.
    pub fn with_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let store = Self::new();
        for (key, value) in entries {
            store.inner.values.insert(key.into(), value);
        }
        store
    }

    /// Synchronous peek used by tests and diagnostics.
    pub fn snapshot(&self, key: &str) -> Option<Value> {
        self.inner.values.get(key).map(|entry| entry.value().clone())
    }

    /// Number of keys currently held.
    pub fn len(&self) -> usize {
        self.inner.values.len()
    }

    /// Whether the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.inner.values.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> BoxFuture<'static, StorageResult<Option<Value>>> {
        let value = self.snapshot(key);
        Box::pin(async move { Ok(value) })
    }

    fn set(&self, key: &str, value: Value) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        let key = key.to_owned();
        let ticket = inner.sequencer.ticket();
        Box::pin(async move {
            inner
                .sequencer
                .apply(&key, ticket, || async {
                    inner.values.insert(key.clone(), value);
                    Ok(())
                })
                .await?;
            Ok(())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn missing_key_reads_as_none() {
        let store = MemoryStore::new();
        assert_eq!(store.get("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn set_then_get_returns_latest_value() {
        let store = MemoryStore::new();
        store.set("k", json!({"a": 1})).await.unwrap();
        store.set("k", json!({"a": 2})).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(json!({"a": 2})));
    }

    #[tokio::test]
    async fn later_call_wins_even_when_polled_first() {
        let store = MemoryStore::new();
        let older = store.set("k", json!("older"));
        let newer = store.set("k", json!("newer"));

        newer.await.unwrap();
        older.await.unwrap();

        assert_eq!(store.snapshot("k"), Some(json!("newer")));
    }
}
