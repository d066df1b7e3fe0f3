//! Environment variable secret store.
//!
//! Intended for **local development and tests only**. Each secret path maps
//! to one variable holding the raw JSON document:
//!
//! ```bash
//! export SLOTDB_SECRET_MYSQL_DEV_ACTIVE_USER='{"activeSlot":"one","timestamp":0}'
//! export SLOTDB_SECRET_MYSQL_DEV_USER_ONE='{"proxyHost":"db","username":"app","password":"pw"}'
//! ```
//!
//! Path characters other than ASCII letters and digits become `_`, and the
//! result is upper-cased.

use async_trait::async_trait;
use std::env;

use super::client::SecretStore;
use super::error::StoreError;

/// Environment variable prefix for secrets.
const SECRET_PREFIX: &str = "SLOTDB_SECRET_";

/// Read-only secret store backed by process environment variables.
#[derive(Debug, Clone, Default)]
pub struct EnvVarSecretStore {}

impl EnvVarSecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Variable name holding the secret at `path`.
    pub fn path_to_env_var(path: &str) -> String {
        let suffix: String = path
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
            .collect();
        format!("{}{}", SECRET_PREFIX, suffix)
    }
}

#[async_trait]
impl SecretStore for EnvVarSecretStore {
    async fn get_secret(&self, path: &str) -> Result<String, StoreError> {
        let var = Self::path_to_env_var(path);

        match env::var(&var) {
            Ok(value) => Ok(value),
            Err(env::VarError::NotPresent) => Err(StoreError::NotFound),
            Err(env::VarError::NotUnicode(_)) => {
                Err(StoreError::backend(format!("{} is not valid UTF-8", var)))
            }
        }
    }

    fn backend_name(&self) -> &'static str {
        "env"
    }
}
