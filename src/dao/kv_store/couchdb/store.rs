use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use tracing::{debug, info};

use crate::dao::{
    kv_store::{KeyValueStore, WriteSequencer},
    storage::StorageResult,
};

use super::{
    config::CouchConfig,
    error::{CouchDaoError, CouchResult},
    models::{CouchKvDocument, encode_path_segment, kv_doc_id},
};

/// Revision conflicts tolerated per write before giving up.
const CONFLICT_RETRIES: u32 = 2;

/// Key-value store keeping one CouchDB document per key.
#[derive(Clone)]
pub struct CouchKvStore {
    inner: Arc<CouchInner>,
}

struct CouchInner {
    client: Client,
    config: CouchConfig,
    sequencer: WriteSequencer,
}

impl CouchKvStore {
    /// Build the HTTP client and make sure the database exists.
    pub async fn connect(config: CouchConfig) -> CouchResult<Self> {
        let client = Client::builder().build().map_err(CouchDaoError::Client)?;
        let inner = CouchInner {
            client,
            config,
            sequencer: WriteSequencer::default(),
        };
        inner.ensure_database().await?;
        Ok(Self {
            inner: Arc::new(inner),
        })
    }
}

impl CouchInner {
    fn request(&self, method: Method, url: String) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.config.credentials {
            Some((user, password)) => builder.basic_auth(user, Some(password)),
            None => builder,
        }
    }

    fn document_url(&self, doc_id: &str) -> String {
        format!(
            "{}/{}",
            self.config.database_url(),
            encode_path_segment(doc_id)
        )
    }

    async fn send(
        &self,
        operation: &'static str,
        target: &str,
        request: RequestBuilder,
    ) -> CouchResult<Response> {
        request
            .send()
            .await
            .map_err(|source| CouchDaoError::Transport {
                operation,
                target: target.to_owned(),
                source,
            })
    }

    async fn ensure_database(&self) -> CouchResult<()> {
        let database = self.config.database.as_str();
        let url = self.config.database_url();
        let lookup = self
            .send("lookup", database, self.request(Method::HEAD, url.clone()))
            .await?;

        match lookup.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => {
                let created = self
                    .send("creation", database, self.request(Method::PUT, url))
                    .await?;
                match created.status() {
                    status if status.is_success() => {
                        info!(database, "created CouchDB database");
                        Ok(())
                    }
                    // created by someone else in the meantime
                    StatusCode::PRECONDITION_FAILED => Ok(()),
                    status => Err(CouchDaoError::Status {
                        operation: "creation",
                        target: database.to_owned(),
                        status,
                    }),
                }
            }
            status => Err(CouchDaoError::Status {
                operation: "lookup",
                target: database.to_owned(),
                status,
            }),
        }
    }

    async fn fetch(&self, doc_id: &str) -> CouchResult<Option<CouchKvDocument>> {
        let response = self
            .send("read", doc_id, self.request(Method::GET, self.document_url(doc_id)))
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => response
                .json::<CouchKvDocument>()
                .await
                .map(Some)
                .map_err(|source| CouchDaoError::Decode {
                    target: doc_id.to_owned(),
                    source,
                }),
            status => Err(CouchDaoError::Status {
                operation: "read",
                target: doc_id.to_owned(),
                status,
            }),
        }
    }

    /// Write `value` under the latest revision, refetching it on conflict.
    async fn upsert(&self, key: &str, value: Value) -> CouchResult<()> {
        let doc_id = kv_doc_id(key);
        let mut conflicts = 0;

        loop {
            let rev = self.fetch(&doc_id).await?.and_then(|doc| doc.rev);
            let document = CouchKvDocument {
                id: doc_id.clone(),
                rev,
                value: value.clone(),
            };
            let request = self
                .request(Method::PUT, self.document_url(&doc_id))
                .json(&document);
            let response = self.send("write", &doc_id, request).await?;

            match response.status() {
                status if status.is_success() => return Ok(()),
                StatusCode::CONFLICT if conflicts < CONFLICT_RETRIES => {
                    conflicts += 1;
                    debug!(%doc_id, conflicts, "revision conflict; refetching");
                }
                status => {
                    return Err(CouchDaoError::Status {
                        operation: "write",
                        target: doc_id,
                        status,
                    });
                }
            }
        }
    }
}

impl KeyValueStore for CouchKvStore {
    fn get(&self, key: &str) -> BoxFuture<'static, StorageResult<Option<Value>>> {
        let inner = self.inner.clone();
        let doc_id = kv_doc_id(key);
        Box::pin(async move {
            let document = inner.fetch(&doc_id).await?;
            Ok(document.map(|doc| doc.value))
        })
    }

    fn set(&self, key: &str, value: Value) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        let key = key.to_owned();
        let ticket = inner.sequencer.ticket();
        Box::pin(async move {
            inner
                .sequencer
                .apply(&key, ticket, || async {
                    inner.upsert(&key, value).await.map_err(Into::into)
                })
                .await?;
            Ok(())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let database = inner.config.database.clone();
            let request = inner.request(Method::HEAD, inner.config.database_url());
            let response = inner.send("health check", &database, request).await?;
            if response.status().is_success() {
                Ok(())
            } else {
                Err(CouchDaoError::Status {
                    operation: "health check",
                    target: database,
                    status: response.status(),
                }
                .into())
            }
        })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move { inner.ensure_database().await.map_err(Into::into) })
    }
}
