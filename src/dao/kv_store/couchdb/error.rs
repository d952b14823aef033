//! Error types for the CouchDB key-value backend.

use reqwest::StatusCode;
use thiserror::Error;

/// Convenient result alias returning [`CouchDaoError`] failures.
pub type CouchResult<T> = Result<T, CouchDaoError>;

/// Failures that can occur while talking to CouchDB.
#[derive(Debug, Error)]
pub enum CouchDaoError {
    /// Required environment variable is missing.
    #[error("missing CouchDB environment variable `{var}`")]
    MissingEnvVar { var: &'static str },
    /// The HTTP client could not be built.
    #[error("failed to build CouchDB client")]
    Client(#[source] reqwest::Error),
    /// The request never got a response.
    #[error("CouchDB {operation} of `{target}` failed")]
    Transport {
        operation: &'static str,
        target: String,
        #[source]
        source: reqwest::Error,
    },
    /// CouchDB answered with a status the operation does not accept.
    #[error("CouchDB {operation} of `{target}` answered {status}")]
    Status {
        operation: &'static str,
        target: String,
        status: StatusCode,
    },
    /// A stored document did not have the key-value layout.
    #[error("CouchDB document `{target}` is not a key-value document")]
    Decode {
        target: String,
        #[source]
        source: reqwest::Error,
    },
}
