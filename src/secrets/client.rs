//! Secret store boundary and the JSON-decoding client built on it.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use super::error::{Result, SecretsError, StoreError};
use super::path::SecretKind;
use crate::observability::metrics::{record_secret_fetch, FetchOutcome};

/// Metric and log label for reads made without a [`SecretKind`].
const UNTYPED_KIND: &str = "untyped";

/// A backend that can read one secret string by path.
///
/// Implementations perform exactly one remote call per `get_secret` and never
/// retry; retry decisions belong to the caller.
///
/// # Security Considerations
///
/// - Implementations MUST NOT log secret values
/// - Error messages MUST NOT contain secret values
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Returns the raw secret string stored at `path`.
    async fn get_secret(&self, path: &str) -> std::result::Result<String, StoreError>;

    /// Short backend name used in logs.
    fn backend_name(&self) -> &'static str;
}

/// Fetches secrets and decodes them as JSON.
///
/// Wraps any [`SecretStore`] failure as [`SecretsError::Fetch`] and any
/// payload that does not decode as [`SecretsError::Decode`], both tagged with
/// the path that was read.
#[derive(Clone)]
pub struct SecretStoreClient {
    store: Arc<dyn SecretStore>,
}

impl std::fmt::Debug for SecretStoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretStoreClient").field("backend", &self.store.backend_name()).finish()
    }
}

impl SecretStoreClient {
    pub fn new(store: Arc<dyn SecretStore>) -> Self {
        Self { store }
    }

    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }

    /// Reads `path` and returns the decoded JSON document.
    pub async fn fetch(&self, path: &str) -> Result<serde_json::Value> {
        self.read(UNTYPED_KIND, path).await
    }

    /// Reads `path` and decodes it into `T`.
    ///
    /// A value that is valid JSON but has the wrong shape is a decode error too.
    pub async fn fetch_as<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.read(UNTYPED_KIND, path).await
    }

    /// Like [`fetch_as`](Self::fetch_as), labelling logs and metrics with `kind`.
    pub async fn fetch_kind<T: DeserializeOwned>(
        &self,
        kind: SecretKind,
        path: &str,
    ) -> Result<T> {
        self.read(kind.as_str(), path).await
    }

    async fn read<T: DeserializeOwned>(&self, kind: &'static str, path: &str) -> Result<T> {
        let raw = match self.store.get_secret(path).await {
            Ok(raw) => raw,
            Err(e) => {
                record_secret_fetch(kind, FetchOutcome::StoreError);
                tracing::warn!(
                    backend = self.store.backend_name(),
                    kind,
                    path = %path,
                    error = %e,
                    "Secret store read failed"
                );
                return Err(SecretsError::fetch(path, e));
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => {
                record_secret_fetch(kind, FetchOutcome::Ok);
                tracing::debug!(
                    backend = self.store.backend_name(),
                    kind,
                    path = %path,
                    "Fetched secret"
                );
                Ok(value)
            }
            Err(e) => {
                record_secret_fetch(kind, FetchOutcome::DecodeError);
                // the serde_json message may quote the payload; log the redacted error only
                let error = SecretsError::decode(path, e);
                tracing::warn!(
                    backend = self.store.backend_name(),
                    kind,
                    path = %path,
                    error = %error,
                    "Secret payload is not the expected JSON document"
                );
                Err(error)
            }
        }
    }
}
