//! # Configuration Management
//!
//! Settings are read from `SLOTDB_*` environment variables (optionally via a
//! `.env` file loaded by the binary) and validated before use.

pub mod settings;

pub use settings::{ResolverSettings, DEFAULT_ENV};

use crate::secrets::SecretsError;

/// Errors raised while loading or validating settings.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// An environment variable is set but cannot be parsed
    #[error("Invalid value for {name}: {reason}")]
    InvalidVariable { name: String, reason: String },

    /// Field-level validation failed
    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// A cross-field rule failed
    #[error("Invalid setting '{field}': {reason}")]
    Invalid { field: String, reason: String },

    /// A secret path template is malformed
    #[error("Invalid path template: {0}")]
    Template(#[from] SecretsError),
}

impl ConfigError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid { field: field.into(), reason: reason.into() }
    }
}
