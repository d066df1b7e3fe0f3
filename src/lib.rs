//! # slotdb
//!
//! Resolves a live MySQL connection configuration from rotating credentials
//! held in a managed secret store.
//!
//! The database password rotates between two parallel identities ("slots").
//! An indicator secret records which slot was promoted last and when. For
//! every resolution slotdb reads the indicator, picks the slot that is safe to
//! use right now, reads that slot's credentials, assembles the connection
//! settings and proves them with a throwaway connection before handing them
//! out.
//!
//! ## Architecture
//!
//! ```text
//! ConnectionResolver
//!     → PathTemplates + SecretStoreClient   (indicator secret)
//!     → RotationSelector                    (slot one / two)
//!     → PathTemplates + SecretStoreClient   (credential secret)
//!     → ConfigAssembler                     (host, user, password, database, port)
//!     → ConnectivityProbe × RetryPolicy     (SELECT 1+1, 2^n s backoff)
//!     → ConnectionConfig  ──►  SharedPool
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use slotdb::{ConnectionResolver, EnvVarSecretStore, MySqlProbe, ResolverSettings, SharedPool};
//!
//! #[tokio::main]
//! async fn main() -> slotdb::Result<()> {
//!     let settings = ResolverSettings::from_env()?;
//!     let resolver = ConnectionResolver::from_settings(
//!         &settings,
//!         Arc::new(EnvVarSecretStore::new()),
//!         Arc::new(MySqlProbe::mysql(settings.connect_timeout())),
//!     )?;
//!
//!     let pool = SharedPool::from_settings(&settings, resolver);
//!     let _conn = pool.get().await?.acquire().await;
//!     pool.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod connection;
pub mod errors;
pub mod observability;
pub mod rotation;
pub mod secrets;
pub mod storage;

// Re-export commonly used types and traits
pub use config::{ConfigError, ResolverSettings};
pub use connection::{
    ConfigAssembler, ConnectionConfig, ConnectionResolver, ConnectivityProbe, MySqlProbe,
    ProbeError, RetryPolicy,
};
pub use errors::{Error, ResolutionError, Result};
pub use rotation::{ActiveSlotSecret, RotationSelector, RotationWindow, Slot};
pub use secrets::{EnvVarSecretStore, SecretStore, SecretStoreClient, SecretsError, StoreError};
pub use storage::SharedPool;

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
