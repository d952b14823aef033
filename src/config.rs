//! Application-level configuration loading: which store backs the save
//! document, where its files live, and which key it is stored under.

use std::{env, fmt, fs, io::ErrorKind, path::PathBuf, str::FromStr};

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::dao::save_repository::DEFAULT_SAVE_KEY;

/// Default location on disk where the binary looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "ARCADE_SAVE_CONFIG_PATH";
/// Environment variable that overrides the configured backend.
const STORE_ENV: &str = "ARCADE_STORE";
/// Directory used by the file backend when none is configured.
const DEFAULT_DATA_DIR: &str = "data";

/// Storage medium holding the save document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process-local map; nothing survives a restart.
    Memory,
    /// One JSON file per key under the data directory.
    #[default]
    File,
    /// CouchDB, configured through `COUCH_*` variables.
    Couch,
    /// MongoDB, configured through `MONGO_*` variables.
    Mongo,
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StoreBackend::Memory => "memory",
            StoreBackend::File => "file",
            StoreBackend::Couch => "couch",
            StoreBackend::Mongo => "mongo",
        };
        f.write_str(name)
    }
}

/// Backend name that matches no [`StoreBackend`].
#[derive(Debug, Error)]
#[error("unknown store backend `{0}` (expected memory, file, couch or mongo)")]
pub struct UnknownBackend(String);

impl FromStr for StoreBackend {
    type Err = UnknownBackend;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "file" => Ok(StoreBackend::File),
            "couch" | "couchdb" => Ok(StoreBackend::Couch),
            "mongo" | "mongodb" => Ok(StoreBackend::Mongo),
            _ => Err(UnknownBackend(value.to_owned())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Immutable runtime configuration.
pub struct AppConfig {
    /// Backend holding the unified save document.
    pub backend: StoreBackend,
    /// Root directory of the file backend.
    pub data_dir: PathBuf,
    /// Key of the unified save document.
    pub save_key: String,
    /// Directory of the pre-unification flat store, consulted for migration.
    pub legacy_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Load the configuration from disk, falling back to built-in defaults.
    ///
    /// `ARCADE_STORE` takes precedence over the backend named in the file.
    pub fn load() -> Self {
        let mut config = Self::load_file();
        if let Some(value) = env::var_os(STORE_ENV) {
            let value = value.to_string_lossy();
            match value.parse::<StoreBackend>() {
                Ok(backend) => config.backend = backend,
                Err(err) => warn!(error = %err, "ignoring {STORE_ENV} override"),
            }
        }
        config
    }

    fn load_file() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        backend = %app_config.backend,
                        "loaded store settings from config"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    store: StoreBackend,
    data_dir: Option<PathBuf>,
    save_key: Option<String>,
    legacy_dir: Option<PathBuf>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        Self {
            backend: value.store,
            data_dir: value
                .data_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            save_key: value
                .save_key
                .filter(|key| !key.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_SAVE_KEY.to_owned()),
            legacy_dir: value.legacy_dir,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
