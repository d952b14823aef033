use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::dao::{
    kv_store::KeyValueStore,
    models::{GameSave, SaveDocument, parse_document, parse_slice},
    storage::{StorageError, StorageResult},
};

/// Key under which the unified save document is stored.
pub const DEFAULT_SAVE_KEY: &str = "arcade_save_v1";

/// Data Access Object owning the unified save document.
///
/// Every read-modify-write of one repository runs behind an in-process write
/// gate, so concurrent patches issued through the same repository never drop
/// each other's fields. Separate processes sharing one backend are not
/// coordinated: their writes can still overwrite each other.
#[derive(Clone)]
pub struct SaveRepository {
    primary: Arc<dyn KeyValueStore>,
    legacy: Option<Arc<dyn KeyValueStore>>,
    key: Arc<str>,
    write_gate: Arc<Mutex<()>>,
}

impl SaveRepository {
    /// Build a repository over `primary`, consulting `legacy` once for migration.
    pub fn new(
        primary: Arc<dyn KeyValueStore>,
        legacy: Option<Arc<dyn KeyValueStore>>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            primary,
            legacy,
            key: Arc::from(key.into()),
            write_gate: Arc::new(Mutex::new(())),
        }
    }

    /// Key of the unified document in the primary store.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Load the save document, migrating it from the legacy store on first use.
    ///
    /// Malformed stored data is treated as absent; only store failures are errors.
    pub async fn load_save(&self) -> StorageResult<SaveDocument> {
        if let Some(doc) = self.read_primary().await? {
            return Ok(doc);
        }
        if self.legacy.is_none() {
            debug!(key = %self.key, "no stored save; using defaults");
            return Ok(SaveDocument::default());
        }

        // migration writes the document, so it runs behind the gate
        let _gate = self.write_gate.lock().await;
        self.load_gated().await
    }

    /// Load path for callers already holding `write_gate`.
    async fn load_gated(&self) -> StorageResult<SaveDocument> {
        if let Some(doc) = self.read_primary().await? {
            return Ok(doc);
        }

        if let Some(doc) = self.migrate_from_legacy().await? {
            return Ok(doc);
        }

        debug!(key = %self.key, "no stored save; using defaults");
        Ok(SaveDocument::default())
    }

    async fn read_primary(&self) -> StorageResult<Option<SaveDocument>> {
        let Some(raw) = self.primary.get(&self.key).await? else {
            return Ok(None);
        };
        match parse_document(raw) {
            Ok(doc) => Ok(Some(doc)),
            Err(err) => {
                warn!(key = %self.key, error = %err, "stored save is malformed; ignoring it");
                Ok(None)
            }
        }
    }

    async fn migrate_from_legacy(&self) -> StorageResult<Option<SaveDocument>> {
        let Some(legacy) = &self.legacy else {
            return Ok(None);
        };

        let raw = match legacy.get(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Ok(None),
            Err(err) => {
                warn!(key = %self.key, error = %err, "legacy store unreadable; skipping migration");
                return Ok(None);
            }
        };

        match parse_document(raw) {
            Ok(doc) => {
                self.write_save(&doc).await?;
                info!(key = %self.key, "migrated save document from legacy store");
                Ok(Some(doc))
            }
            Err(err) => {
                warn!(key = %self.key, error = %err, "legacy save is malformed; ignoring it");
                Ok(None)
            }
        }
    }

    /// Persist the full document, replacing any previous value.
    pub async fn write_save(&self, doc: &SaveDocument) -> StorageResult<()> {
        let value = serde_json::to_value(doc).map_err(|source| StorageError::Encoding {
            key: self.key.to_string(),
            source,
        })?;
        self.primary.set(&self.key, value).await
    }

    /// Read one game's slice; an unset slice reads as empty.
    pub async fn get_game_save(&self, game_id: &str) -> StorageResult<GameSave> {
        Ok(self.load_save().await?.game(game_id))
    }

    /// Shallow-merge `patch` into one game's slice and persist the document.
    pub async fn set_game_save(&self, game_id: &str, patch: GameSave) -> StorageResult<()> {
        self.update(|doc| doc.merge_game(game_id, patch)).await
    }

    /// Overwrite one game's slice with `slice`, dropping every other field.
    pub async fn replace_game_save(&self, game_id: &str, slice: GameSave) -> StorageResult<()> {
        self.update(|doc| doc.replace_game(game_id, slice)).await
    }

    /// Increment the site-load counter.
    pub async fn bump_site_loads(&self) -> StorageResult<u64> {
        let mut loads = 0;
        self.update(|doc| {
            doc.global.total_site_loads = doc.global.total_site_loads.saturating_add(1);
            loads = doc.global.total_site_loads;
        })
        .await?;
        Ok(loads)
    }

    /// Overwrite the whole document with defaults.
    ///
    /// The record of finished legacy imports is kept, so cleared progress is not
    /// brought back from the old flat keys.
    pub async fn reset_all(&self) -> StorageResult<()> {
        let _gate = self.write_gate.lock().await;
        let previous = self.load_gated().await?;
        let mut doc = SaveDocument::default();
        doc.global.legacy_imported = previous.global.legacy_imported;
        self.write_save(&doc).await
    }

    /// Copy a pre-unification per-game value stored under `legacy_key` into the
    /// slice of `game_id`, unless that slice already holds data.
    ///
    /// The flat key is looked up in the primary store, then in the legacy
    /// store, and is never deleted. Once a value was found under it the key is
    /// recorded in the document and not consulted again. Returns whether
    /// anything was imported.
    pub async fn import_legacy_slice(&self, game_id: &str, legacy_key: &str) -> StorageResult<bool> {
        let _gate = self.write_gate.lock().await;
        let mut doc = self.load_gated().await?;
        if doc.global.legacy_imported.contains(legacy_key) {
            return Ok(false);
        }

        let Some(slice) = self.find_legacy_slice(legacy_key).await? else {
            return Ok(false);
        };
        if slice.is_empty() {
            return Ok(false);
        }

        let imported = doc.game(game_id).is_empty();
        if imported {
            doc.replace_game(game_id, slice);
        } else {
            debug!(game_id, legacy_key, "slice already holds progress; legacy value superseded");
        }
        doc.global.legacy_imported.insert(legacy_key.to_owned());
        self.write_save(&doc).await?;
        if imported {
            info!(game_id, legacy_key, "imported legacy per-game save");
        }
        Ok(imported)
    }

    async fn find_legacy_slice(&self, legacy_key: &str) -> StorageResult<Option<GameSave>> {
        if let Some(raw) = self.primary.get(legacy_key).await? {
            if let Some(slice) = parse_slice(raw) {
                return Ok(Some(slice));
            }
            warn!(legacy_key, "legacy per-game value is malformed; ignoring it");
        }

        let Some(legacy) = &self.legacy else {
            return Ok(None);
        };
        match legacy.get(legacy_key).await {
            Ok(Some(raw)) => {
                let slice = parse_slice(raw);
                if slice.is_none() {
                    warn!(legacy_key, "legacy per-game value is malformed; ignoring it");
                }
                Ok(slice)
            }
            Ok(None) => Ok(None),
            Err(err) => {
                warn!(legacy_key, error = %err, "legacy store unreadable; skipping import");
                Ok(None)
            }
        }
    }

    async fn update<F>(&self, mutate: F) -> StorageResult<()>
    where
        F: FnOnce(&mut SaveDocument),
    {
        let _gate = self.write_gate.lock().await;
        let mut doc = self.load_gated().await?;
        mutate(&mut doc);
        self.write_save(&doc).await
    }
}
