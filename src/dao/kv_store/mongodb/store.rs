use std::sync::Arc;

use futures::future::BoxFuture;
use mongodb::{Collection, Database, bson::doc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::warn;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
};
use crate::dao::{
    kv_store::{KeyValueStore, WriteSequencer},
    storage::StorageResult,
};

const KV_COLLECTION_NAME: &str = "kv";

/// Stored shape of one key. The value is kept as JSON text so arbitrary
/// save documents round-trip without BSON type coercion.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct MongoKvDocument {
    #[serde(rename = "_id")]
    key: String,
    value: String,
}

impl MongoKvDocument {
    fn encode(key: &str, value: &Value) -> MongoResult<Self> {
        let text = serde_json::to_string(value).map_err(|source| MongoDaoError::Encode {
            key: key.to_owned(),
            source,
        })?;
        Ok(Self {
            key: key.to_owned(),
            value: text,
        })
    }

    /// Parse the stored text; unparseable text reads as absent.
    fn decode(&self) -> Option<Value> {
        match serde_json::from_str::<Value>(&self.value) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(key = %self.key, error = %err, "unparseable stored value; treating as absent");
                None
            }
        }
    }
}

/// Key-value store keeping one MongoDB document per key.
#[derive(Clone)]
pub struct MongoKvStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
    sequencer: WriteSequencer,
}

struct MongoState {
    database: Database,
}

impl MongoInner {
    async fn collection(&self) -> Collection<MongoKvDocument> {
        let guard = self.state.read().await;
        guard.database.collection::<MongoKvDocument>(KV_COLLECTION_NAME)
    }

    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let database =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.database = database;
        Ok(())
    }

    async fn load(&self, key: &str) -> MongoResult<Option<Value>> {
        let found = self
            .collection()
            .await
            .find_one(doc! { "_id": key })
            .await
            .map_err(|source| MongoDaoError::Load {
                key: key.to_owned(),
                source,
            })?;

        Ok(found.and_then(|document| document.decode()))
    }

    async fn store(&self, key: &str, value: &Value) -> MongoResult<()> {
        let document = MongoKvDocument::encode(key, value)?;

        self.collection()
            .await
            .replace_one(doc! { "_id": key }, &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::Store {
                key: key.to_owned(),
                source,
            })?;
        Ok(())
    }
}

impl MongoKvStore {
    /// Establish a connection to MongoDB.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let database = establish_connection(&config.options, &config.database_name).await?;

        Ok(Self {
            inner: Arc::new(MongoInner {
                state: RwLock::new(MongoState { database }),
                config,
                sequencer: WriteSequencer::default(),
            }),
        })
    }
}

impl KeyValueStore for MongoKvStore {
    fn get(&self, key: &str) -> BoxFuture<'static, StorageResult<Option<Value>>> {
        let inner = self.inner.clone();
        let key = key.to_owned();
        Box::pin(async move { inner.load(&key).await.map_err(Into::into) })
    }

    fn set(&self, key: &str, value: Value) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        let key = key.to_owned();
        let ticket = inner.sequencer.ticket();
        Box::pin(async move {
            inner
                .sequencer
                .apply(&key, ticket, || async {
                    inner.store(&key, &value).await.map_err(Into::into)
                })
                .await?;
            Ok(())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move { inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move { inner.reconnect().await.map_err(Into::into) })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn values_are_kept_as_json_text_under_the_key() {
        let value = json!({"version": 1, "games": {"game-3": {"highScore": 12}}});
        let document = MongoKvDocument::encode("arcade_save_v1", &value).unwrap();

        let stored = serde_json::to_value(&document).unwrap();
        assert_eq!(stored["_id"], json!("arcade_save_v1"));
        assert!(stored["value"].as_str().unwrap().contains("\"highScore\":12"));
        assert_eq!(document.decode(), Some(value));
    }

    #[test]
    fn unparseable_text_reads_as_absent() {
        let document = MongoKvDocument {
            key: "arcade_save_v1".to_owned(),
            value: "{not json".to_owned(),
        };
        assert_eq!(document.decode(), None);
    }
}
