use thiserror::Error;

use crate::{config::StoreBackend, dao::storage::StorageError};

/// Errors that can occur while bringing the save subsystem up.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend is unavailable.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// The configured backend was left out of this build.
    #[error("store backend `{0}` is not compiled in")]
    BackendDisabled(StoreBackend),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Unavailable(err)
    }
}
