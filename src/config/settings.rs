//! # Resolver Settings
//!
//! Defines the settings for connection resolution and the shared pool.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::ConfigError;
use crate::connection::{ConfigAssembler, RetryPolicy, DEFAULT_BASE_DATABASE, MYSQL_PORT};
use crate::rotation::{RotationWindow, DEFAULT_ROTATION_WINDOW_MINUTES};
use crate::secrets::path::{DEFAULT_CREDENTIAL_TEMPLATE, DEFAULT_INDICATOR_TEMPLATE};
use crate::secrets::PathTemplates;

/// Environment used when neither `SLOTDB_ENV` nor `ENV` is set.
pub const DEFAULT_ENV: &str = "dev";

/// Everything needed to resolve and pool a connection.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ResolverSettings {
    /// Environment name ("dev", "staging", "prod", ...)
    #[validate(length(min = 1, max = 64, message = "Environment name must be 1-64 characters"))]
    pub env: String,

    /// Database name before the environment prefix is applied
    #[validate(length(min = 1, max = 64, message = "Base database name must be 1-64 characters"))]
    pub base_database: String,

    /// MySQL port
    #[validate(range(min = 1, message = "Port must be between 1 and 65535"))]
    pub port: u16,

    /// Probe attempts per resolution
    #[validate(range(min = 1, max = 20, message = "Max attempts must be between 1 and 20"))]
    pub max_attempts: u32,

    /// Backoff base in milliseconds; the sleep after attempt n is base * 2^n
    #[validate(range(max = 60000, message = "Backoff base must be at most 60000ms"))]
    pub backoff_base_ms: u64,

    /// Minutes after a promotion during which the promoted slot is avoided
    #[validate(range(min = 0, max = 1440, message = "Rotation window must be 0-1440 minutes"))]
    pub rotation_window_minutes: i64,

    /// Probe connect timeout in seconds
    #[validate(range(
        min = 1,
        max = 60,
        message = "Connect timeout must be between 1 and 60 seconds"
    ))]
    pub connect_timeout_seconds: u64,

    /// Indicator secret path template
    #[validate(length(min = 1, message = "Indicator path template cannot be empty"))]
    pub indicator_path_template: String,

    /// Credential secret path template
    #[validate(length(min = 1, message = "Credential path template cannot be empty"))]
    pub credential_path_template: String,

    /// Maximum number of connections in the shared pool
    #[validate(range(min = 1, max = 100, message = "Max connections must be between 1 and 100"))]
    pub pool_max_connections: u32,

    /// Minimum number of connections in the shared pool
    #[validate(range(max = 50, message = "Min connections must be between 0 and 50"))]
    pub pool_min_connections: u32,

    /// AWS region for the Secrets Manager backend
    pub aws_region: String,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            env: DEFAULT_ENV.to_string(),
            base_database: DEFAULT_BASE_DATABASE.to_string(),
            port: MYSQL_PORT,
            max_attempts: crate::connection::retry::DEFAULT_MAX_ATTEMPTS,
            backoff_base_ms: 1000,
            rotation_window_minutes: DEFAULT_ROTATION_WINDOW_MINUTES,
            connect_timeout_seconds: 10,
            indicator_path_template: DEFAULT_INDICATOR_TEMPLATE.to_string(),
            credential_path_template: DEFAULT_CREDENTIAL_TEMPLATE.to_string(),
            pool_max_connections: 10,
            pool_min_connections: 0,
            aws_region: "eu-west-2".to_string(),
        }
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env_string(name) {
        Some(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::InvalidVariable {
            name: name.to_string(),
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

impl ResolverSettings {
    /// Loads settings from `SLOTDB_*` environment variables and validates them.
    ///
    /// The environment name falls back to `ENV` when `SLOTDB_ENV` is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let settings = Self {
            env: env_string("SLOTDB_ENV").or_else(|| env_string("ENV")).unwrap_or(defaults.env),
            base_database: env_string("SLOTDB_BASE_DATABASE").unwrap_or(defaults.base_database),
            port: env_parse("SLOTDB_DB_PORT", defaults.port)?,
            max_attempts: env_parse("SLOTDB_MAX_ATTEMPTS", defaults.max_attempts)?,
            backoff_base_ms: env_parse("SLOTDB_BACKOFF_BASE_MS", defaults.backoff_base_ms)?,
            rotation_window_minutes: env_parse(
                "SLOTDB_ROTATION_WINDOW_MINUTES",
                defaults.rotation_window_minutes,
            )?,
            connect_timeout_seconds: env_parse(
                "SLOTDB_CONNECT_TIMEOUT_SECONDS",
                defaults.connect_timeout_seconds,
            )?,
            indicator_path_template: env_string("SLOTDB_INDICATOR_PATH_TEMPLATE")
                .unwrap_or(defaults.indicator_path_template),
            credential_path_template: env_string("SLOTDB_CREDENTIAL_PATH_TEMPLATE")
                .unwrap_or(defaults.credential_path_template),
            pool_max_connections: env_parse(
                "SLOTDB_POOL_MAX_CONNECTIONS",
                defaults.pool_max_connections,
            )?,
            pool_min_connections: env_parse(
                "SLOTDB_POOL_MIN_CONNECTIONS",
                defaults.pool_min_connections,
            )?,
            aws_region: env_string("SLOTDB_AWS_REGION").unwrap_or(defaults.aws_region),
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Validate all fields, including the checks `validator` cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Validate::validate(self)?;

        if self.pool_min_connections > self.pool_max_connections {
            return Err(ConfigError::invalid(
                "pool_min_connections",
                "cannot be greater than pool_max_connections",
            ));
        }

        self.path_templates()?;
        Ok(())
    }

    pub fn path_templates(&self) -> Result<PathTemplates, ConfigError> {
        PathTemplates::new(&self.indicator_path_template, &self.credential_path_template)
            .map_err(ConfigError::from)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.backoff_base_ms))
    }

    pub fn rotation_window(&self) -> RotationWindow {
        RotationWindow::from_minutes(self.rotation_window_minutes)
    }

    pub fn assembler(&self) -> ConfigAssembler {
        ConfigAssembler::new(&self.base_database).with_port(self.port)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }
}
