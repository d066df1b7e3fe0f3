//! HashiCorp Vault secret store (KV v2).
//!
//! The secret at each path is stored as a flat JSON object in the KV v2
//! engine, for example `vault kv put secret/mysql/dev/user-one proxyHost=...
//! username=... password=...`. Reads return that object re-serialised as a
//! JSON string so every backend hands the same raw document to
//! [`SecretStoreClient`](super::SecretStoreClient).
//!
//! # Configuration
//!
//! - `VAULT_ADDR`: Vault server address
//! - `VAULT_TOKEN`: Authentication token
//! - `VAULT_NAMESPACE`: Optional namespace
//! - `VAULT_MOUNT_PATH`: KV v2 mount path (default: "secret")

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use vaultrs::client::{VaultClient, VaultClientSettingsBuilder};
use vaultrs::error::ClientError;
use vaultrs::kv2;

use super::client::SecretStore;
use super::error::StoreError;

/// Configuration for the Vault backend.
#[derive(Clone, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Vault server address (e.g., "https://vault.example.com:8200")
    pub address: String,

    /// Vault authentication token
    pub token: Option<String>,

    /// Vault namespace (Enterprise)
    pub namespace: Option<String>,

    /// KV v2 mount path
    #[serde(default = "default_mount_path")]
    pub mount_path: String,
}

impl std::fmt::Debug for VaultConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultConfig")
            .field("address", &self.address)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("namespace", &self.namespace)
            .field("mount_path", &self.mount_path)
            .finish()
    }
}

fn default_mount_path() -> String {
    "secret".to_string()
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            address: "http://127.0.0.1:8200".to_string(),
            token: None,
            namespace: None,
            mount_path: default_mount_path(),
        }
    }
}

impl VaultConfig {
    /// Reads the Vault settings from the standard Vault environment variables.
    pub fn from_env() -> Result<Self, StoreError> {
        let address = std::env::var("VAULT_ADDR")
            .map_err(|_| StoreError::backend("VAULT_ADDR environment variable not set"))?;

        Ok(Self {
            address,
            token: std::env::var("VAULT_TOKEN").ok(),
            namespace: std::env::var("VAULT_NAMESPACE").ok(),
            mount_path: std::env::var("VAULT_MOUNT_PATH").unwrap_or_else(|_| default_mount_path()),
        })
    }
}

/// Read-only Vault KV v2 secret store.
pub struct VaultSecretStore {
    client: VaultClient,
    mount_path: String,
}

impl VaultSecretStore {
    /// Builds the client. No request is sent until the first read.
    pub fn new(config: VaultConfig) -> Result<Self, StoreError> {
        if config.address.is_empty() {
            return Err(StoreError::backend("Vault address cannot be empty"));
        }

        let mut settings_builder = VaultClientSettingsBuilder::default();
        settings_builder.address(&config.address);

        if let Some(ref token) = config.token {
            settings_builder.token(token);
        }

        if let Some(namespace) = config.namespace {
            settings_builder.namespace(Some(namespace));
        }

        let settings = settings_builder
            .build()
            .map_err(|e| StoreError::backend(format!("Invalid Vault configuration: {}", e)))?;

        let client = VaultClient::new(settings)
            .map_err(|e| StoreError::unavailable(format!("Failed to create Vault client: {}", e)))?;

        tracing::info!(
            address = %config.address,
            mount_path = %config.mount_path,
            "Vault secret store configured"
        );

        Ok(Self { client, mount_path: config.mount_path })
    }

    pub fn from_env() -> Result<Self, StoreError> {
        Self::new(VaultConfig::from_env()?)
    }
}

/// Maps a vaultrs failure onto the store error categories.
fn classify(error: ClientError) -> StoreError {
    match error {
        ClientError::APIError { code: 404, .. } => StoreError::NotFound,
        ClientError::APIError { code: 401 | 403, .. } => {
            StoreError::access_denied(format!("Vault denied the read: {}", error))
        }
        ClientError::APIError { code: 429, .. } => StoreError::throttled(error.to_string()),
        ClientError::APIError { code, .. } if code >= 500 => {
            StoreError::unavailable(error.to_string())
        }
        ClientError::RestClientError { .. } => StoreError::unavailable(error.to_string()),
        other => StoreError::backend(other.to_string()),
    }
}

#[async_trait]
impl SecretStore for VaultSecretStore {
    async fn get_secret(&self, path: &str) -> Result<String, StoreError> {
        let data: serde_json::Value =
            kv2::read(&self.client, &self.mount_path, path).await.map_err(|e| {
                tracing::error!(error = %e, path = %path, "Failed to read secret from Vault");
                classify(e)
            })?;

        serde_json::to_string(&data)
            .map_err(|e| StoreError::backend(format!("Failed to re-encode Vault secret: {}", e)))
    }

    fn backend_name(&self) -> &'static str {
        "vault"
    }
}
