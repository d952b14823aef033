//! Directory-backed key-value store: one JSON file per key.

use std::{
    fmt::Write as _,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use futures::future::BoxFuture;
use serde_json::Value;
use thiserror::Error;
use tokio::fs;
use tracing::{debug, warn};

use super::{KeyValueStore, WriteSequencer};
use crate::dao::storage::{StorageError, StorageResult};

/// Failures that can occur while reading or writing the store directory.
#[derive(Debug, Error)]
pub enum FileStoreError {
    /// The data directory could not be created.
    #[error("failed to create data directory `{path}`")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A value file exists but could not be read.
    #[error("failed to read `{path}`")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Writing the temporary file or moving it into place failed.
    #[error("failed to write `{path}`")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The data directory is not accessible.
    #[error("data directory `{path}` is not accessible")]
    Health {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<FileStoreError> for StorageError {
    fn from(err: FileStoreError) -> Self {
        let full = match &err {
            FileStoreError::Write { path, source } if source.kind() == ErrorKind::StorageFull => {
                Some(path.display().to_string())
            }
            _ => None,
        };
        match full {
            Some(key) => StorageError::QuotaExceeded { key },
            None => StorageError::unavailable(err.to_string(), err),
        }
    }
}

/// Store persisting each key as `<escaped key>.json` inside a directory.
///
/// Writes land in a temporary file that is renamed over the target, so a
/// reader never observes a half-written value.
#[derive(Clone)]
pub struct FileStore {
    inner: Arc<FileInner>,
}

struct FileInner {
    root: PathBuf,
    sequencer: WriteSequencer,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `root`.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, FileStoreError> {
        let root = root.into();
        fs::create_dir_all(&root)
            .await
            .map_err(|source| FileStoreError::CreateDir {
                path: root.clone(),
                source,
            })?;
        debug!(path = %root.display(), "opened file store");
        Ok(Self {
            inner: Arc::new(FileInner {
                root,
                sequencer: WriteSequencer::default(),
            }),
        })
    }

    /// Directory holding the value files.
    pub fn root(&self) -> &Path {
        &self.inner.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.inner.root.join(format!("{}.json", escape_key(key)))
    }
}

impl FileInner {
    async fn read(&self, path: PathBuf) -> StorageResult<Option<Value>> {
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(FileStoreError::Read { path, source }.into()),
        };

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "unparseable value file; treating as absent");
                Ok(None)
            }
        }
    }

    async fn write(&self, path: &Path, ticket: u64, bytes: Vec<u8>) -> StorageResult<()> {
        let tmp = path.with_extension(format!("{ticket}.tmp"));
        fs::write(&tmp, &bytes)
            .await
            .map_err(|source| FileStoreError::Write {
                path: tmp.clone(),
                source,
            })?;
        if let Err(source) = fs::rename(&tmp, path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(FileStoreError::Write {
                path: path.to_path_buf(),
                source,
            }
            .into());
        }
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> BoxFuture<'static, StorageResult<Option<Value>>> {
        let inner = self.inner.clone();
        let path = self.path_for(key);
        Box::pin(async move { inner.read(path).await })
    }

    fn set(&self, key: &str, value: Value) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        let path = self.path_for(key);
        let key = key.to_owned();
        let ticket = inner.sequencer.ticket();
        Box::pin(async move {
            let bytes = serde_json::to_vec(&value).map_err(|source| StorageError::Encoding {
                key: key.clone(),
                source,
            })?;
            let applied = inner
                .sequencer
                .apply(&key, ticket, || inner.write(&path, ticket, bytes))
                .await?;
            if !applied {
                debug!(%key, ticket, "dropped superseded write");
            }
            Ok(())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            fs::metadata(&inner.root)
                .await
                .map(|_| ())
                .map_err(|source| {
                    FileStoreError::Health {
                        path: inner.root.clone(),
                        source,
                    }
                    .into()
                })
        })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            fs::create_dir_all(&inner.root).await.map_err(|source| {
                FileStoreError::CreateDir {
                    path: inner.root.clone(),
                    source,
                }
                .into()
            })
        })
    }
}

/// Map a key onto a portable file name: `[A-Za-z0-9_-]` pass through, every
/// other byte becomes `%XX`.
fn escape_key(key: &str) -> String {
    let mut escaped = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            escaped.push(byte as char);
        } else {
            let _ = write!(escaped, "%{byte:02X}");
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use uuid::Uuid;

    use super::*;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("arcade-save-test-{}", Uuid::new_v4()))
    }

    #[test]
    fn keys_are_escaped_into_file_names() {
        assert_eq!(escape_key("arcade_save_v1"), "arcade_save_v1");
        assert_eq!(
            escape_key("flappy-bird:highscore:v1"),
            "flappy-bird%3Ahighscore%3Av1"
        );
        assert_eq!(escape_key("../x"), "%2E%2E%2Fx");
    }

    #[tokio::test]
    async fn values_survive_reopening_the_directory() {
        let dir = scratch_dir();
        let store = FileStore::open(&dir).await.unwrap();
        store.set("save", json!({"version": 1})).await.unwrap();
        drop(store);

        let reopened = FileStore::open(&dir).await.unwrap();
        assert_eq!(reopened.get("save").await.unwrap(), Some(json!({"version": 1})));
        assert_eq!(reopened.get("other").await.unwrap(), None);

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn garbage_file_reads_as_absent() {
        let dir = scratch_dir();
        let store = FileStore::open(&dir).await.unwrap();
        std::fs::write(store.path_for("save"), b"{not json").unwrap();

        assert_eq!(store.get("save").await.unwrap(), None);

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn no_temporary_files_are_left_behind() {
        let dir = scratch_dir();
        let store = FileStore::open(&dir).await.unwrap();
        store.set("a", json!(1)).await.unwrap();
        store.set("a", json!(2)).await.unwrap();

        let names: Vec<String> = std::fs::read_dir(&dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.json".to_string()]);
        store.health_check().await.unwrap();

        let _ = std::fs::remove_dir_all(dir);
    }
}
