use std::error::Error;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying medium.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be reached or refused the operation.
    #[error("storage unavailable: {message}")]
    Unavailable {
        /// Human readable description of the failed operation.
        message: String,
        /// Backend failure that caused the error.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The backend accepted the request but has no room left for the value.
    #[error("storage quota exceeded for `{key}`")]
    QuotaExceeded {
        /// Key whose write was rejected.
        key: String,
    },
    /// A value could not be converted to or from its stored representation.
    #[error("failed to encode value for `{key}`")]
    Encoding {
        /// Key whose value failed to encode.
        key: String,
        /// Serializer failure.
        #[source]
        source: serde_json::Error,
    },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }
}
