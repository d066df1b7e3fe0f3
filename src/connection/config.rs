//! Connection settings assembled from a credential secret.

use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::mysql::MySqlConnectOptions;

use crate::secrets::SecretString;

/// Base database name used when none is configured.
pub const DEFAULT_BASE_DATABASE: &str = "core";

/// MySQL port; the credential secret names the proxy host only.
pub const MYSQL_PORT: u16 = 3306;

/// Environment whose database name carries no prefix.
pub const PRODUCTION_ENV: &str = "prod";

/// Contents of one slot's credential secret.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseCredentialSecret {
    /// Database proxy endpoint for this slot.
    #[serde(alias = "proxy")]
    pub proxy_host: String,

    pub username: String,

    pub password: SecretString,
}

/// Everything a connection pool needs to open MySQL connections.
///
/// Built per resolution and never persisted. The password is a
/// [`SecretString`], so `Debug`, `Display` and `Serialize` are safe to log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionConfig {
    pub host: String,
    pub user: String,
    pub password: SecretString,
    pub database: String,
    pub port: u16,
}

impl ConnectionConfig {
    /// sqlx connect options for these settings.
    pub fn connect_options(&self) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(self.password.expose_secret())
            .database(&self.database)
    }
}

impl fmt::Display for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "mysql://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.database
        )
    }
}

/// Builds [`ConnectionConfig`] values from credential secrets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigAssembler {
    base_database: String,
    port: u16,
}

impl Default for ConfigAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_DATABASE)
    }
}

impl ConfigAssembler {
    pub fn new(base_database: impl Into<String>) -> Self {
        Self { base_database: base_database.into(), port: MYSQL_PORT }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn base_database(&self) -> &str {
        &self.base_database
    }

    /// Database name for `env`: the base name in production, `{env}-{base}` elsewhere.
    pub fn database_name(&self, env: &str) -> String {
        if env == PRODUCTION_ENV {
            self.base_database.clone()
        } else {
            format!("{}-{}", env, self.base_database)
        }
    }

    /// Combines a credential secret with the environment. Does not touch the network.
    pub fn assemble(&self, cred: &DatabaseCredentialSecret, env: &str) -> ConnectionConfig {
        ConnectionConfig {
            host: cred.proxy_host.clone(),
            user: cred.username.clone(),
            password: cred.password.clone(),
            database: self.database_name(env),
            port: self.port,
        }
    }
}
