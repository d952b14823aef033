use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    config::{AppConfig, StoreBackend},
    dao::{
        kv_store::{FileStore, KeyValueStore, MemoryStore},
        save_repository::SaveRepository,
        storage::{StorageError, StorageResult},
    },
    error::ServiceError,
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const MAX_ATTEMPTS: u32 = 3;

/// Exponential backoff used while connecting and reconnecting.
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    /// Delay after the first failure.
    pub initial: Duration,
    /// Upper bound of the doubling delay.
    pub max: Duration,
    /// Attempts before giving up.
    pub attempts: u32,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            initial: INITIAL_DELAY,
            max: MAX_DELAY,
            attempts: MAX_ATTEMPTS,
        }
    }
}

/// Open the configured backend and build the save repository over it.
pub async fn connect(config: &AppConfig) -> Result<SaveRepository, ServiceError> {
    let backoff = Backoff::default();
    let primary = connect_with_retry(backoff, || open_backend(config)).await?;
    ensure_healthy(primary.as_ref(), backoff).await?;
    info!(backend = %config.backend, key = %config.save_key, "save store ready");

    let legacy = open_legacy(config).await;
    Ok(SaveRepository::new(primary, legacy, config.save_key.clone()))
}

/// Call `connect` until it succeeds or the attempts run out.
pub async fn connect_with_retry<F, Fut>(
    backoff: Backoff,
    mut connect: F,
) -> Result<Arc<dyn KeyValueStore>, ServiceError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Arc<dyn KeyValueStore>, ServiceError>>,
{
    let mut delay = backoff.initial;
    let mut attempt = 1;

    loop {
        match connect().await {
            Ok(store) => return Ok(store),
            Err(err @ ServiceError::BackendDisabled(_)) => return Err(err),
            Err(err) if attempt >= backoff.attempts => {
                warn!(attempt, error = %err, "exhausted storage connection attempts");
                return Err(err);
            }
            Err(err) => {
                warn!(attempt, error = %err, "storage connection attempt failed");
                attempt += 1;
                sleep(delay).await;
                delay = (delay * 2).min(backoff.max);
            }
        }
    }
}

/// Check the store and try to reconnect it when the check fails.
pub async fn ensure_healthy(store: &dyn KeyValueStore, backoff: Backoff) -> StorageResult<()> {
    let Err(health_err) = store.health_check().await else {
        return Ok(());
    };
    warn!(error = %health_err, "storage health check failed; reconnecting");

    let mut delay = backoff.initial;
    let mut last_err = health_err;
    for attempt in 0..backoff.attempts {
        match store.try_reconnect().await {
            Ok(()) => {
                info!(attempt, "storage reconnection succeeded after health check failure");
                return store.health_check().await;
            }
            Err(err) => {
                warn!(attempt, error = %err, "storage reconnect attempt failed");
                last_err = err;
                sleep(delay).await;
                delay = (delay * 2).min(backoff.max);
            }
        }
    }

    warn!("exhausted storage reconnect attempts");
    Err(last_err)
}

async fn open_backend(config: &AppConfig) -> Result<Arc<dyn KeyValueStore>, ServiceError> {
    match config.backend {
        StoreBackend::Memory => Ok(Arc::new(MemoryStore::new())),
        StoreBackend::File => {
            let store = FileStore::open(&config.data_dir)
                .await
                .map_err(StorageError::from)?;
            Ok(Arc::new(store))
        }
        StoreBackend::Couch => open_couch().await,
        StoreBackend::Mongo => open_mongo().await,
    }
}

#[cfg(feature = "couch-store")]
async fn open_couch() -> Result<Arc<dyn KeyValueStore>, ServiceError> {
    use crate::dao::kv_store::couchdb::{CouchConfig, CouchKvStore};

    let config = CouchConfig::from_env().map_err(StorageError::from)?;
    let store = CouchKvStore::connect(config)
        .await
        .map_err(StorageError::from)?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "couch-store"))]
async fn open_couch() -> Result<Arc<dyn KeyValueStore>, ServiceError> {
    Err(ServiceError::BackendDisabled(StoreBackend::Couch))
}

#[cfg(feature = "mongo-store")]
async fn open_mongo() -> Result<Arc<dyn KeyValueStore>, ServiceError> {
    use crate::dao::kv_store::mongodb::{MongoConfig, MongoKvStore};

    let config = MongoConfig::from_env().await.map_err(StorageError::from)?;
    let store = MongoKvStore::connect(config)
        .await
        .map_err(StorageError::from)?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "mongo-store"))]
async fn open_mongo() -> Result<Arc<dyn KeyValueStore>, ServiceError> {
    Err(ServiceError::BackendDisabled(StoreBackend::Mongo))
}

/// The flat store of older builds lives in its own directory; it is only read.
async fn open_legacy(config: &AppConfig) -> Option<Arc<dyn KeyValueStore>> {
    let dir = config.legacy_dir.as_ref()?;
    match FileStore::open(dir).await {
        Ok(store) => Some(Arc::new(store)),
        Err(err) => {
            warn!(path = %dir.display(), error = %err, "legacy store unavailable; skipping migration");
            None
        }
    }
}
