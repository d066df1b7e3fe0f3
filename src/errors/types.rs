//! # Error Types
//!
//! [`ResolutionError`] is the only error a caller of
//! [`ConnectionResolver`](crate::connection::ConnectionResolver) ever sees.
//! [`Error`] is the crate-wide error for everything around it (settings,
//! the shared pool).

use crate::config::ConfigError;
use crate::connection::ProbeError;
use crate::rotation::Slot;
use crate::secrets::SecretsError;

/// Custom result type for slotdb operations
pub type Result<T> = std::result::Result<T, Error>;

/// Why a connection config could not be resolved.
#[derive(thiserror::Error, Debug)]
pub enum ResolutionError {
    /// The indicator or credential secret could not be read or decoded.
    ///
    /// Never retried. `slot` is `None` when the indicator read failed.
    #[error("secrets unavailable for env '{env}'{}: {source}", slot_suffix(.slot))]
    SecretsUnavailable {
        env: String,
        slot: Option<Slot>,
        #[source]
        source: SecretsError,
    },

    /// Every probe attempt failed.
    #[error("database unreachable after {attempts} attempt(s): {last_cause}")]
    ConnectionUnreachable {
        attempts: u32,
        #[source]
        last_cause: ProbeError,
    },

    /// The caller cancelled the resolution between attempts.
    #[error("resolution cancelled after {attempts} attempt(s)")]
    Cancelled { attempts: u32 },
}

fn slot_suffix(slot: &Option<Slot>) -> String {
    slot.map(|s| format!(" (slot {})", s)).unwrap_or_default()
}

impl ResolutionError {
    /// Number of probe attempts made before the failure.
    pub fn attempts(&self) -> u32 {
        match self {
            Self::SecretsUnavailable { .. } => 0,
            Self::ConnectionUnreachable { attempts, .. } | Self::Cancelled { attempts } => {
                *attempts
            }
        }
    }

    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SecretsUnavailable { .. } => "secrets_unavailable",
            Self::ConnectionUnreachable { .. } => "connection_unreachable",
            Self::Cancelled { .. } => "cancelled",
        }
    }
}

/// Main error type for slotdb
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Settings could not be loaded or failed validation
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Connection resolution failed
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// Database pool errors
    #[error("Database error: {context}")]
    Database {
        #[source]
        source: sqlx::Error,
        context: String,
    },

    /// The shared pool was used after `shutdown`
    #[error("Connection pool has been shut down")]
    PoolShutDown,
}

impl Error {
    pub fn database<S: Into<String>>(source: sqlx::Error, context: S) -> Self {
        Self::Database { source, context: context.into() }
    }
}
