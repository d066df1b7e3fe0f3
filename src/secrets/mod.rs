//! Secret store access.
//!
//! Two secrets are read per resolution, both addressed by templated paths
//! (see [`path`]):
//!
//! - the **indicator** secret, naming the active slot and its promotion time
//! - the **credential** secret for the selected slot
//!
//! # Architecture
//!
//! [`SecretStore`] is the backend boundary: one `get_secret(path)` call that
//! returns the raw secret string. [`SecretStoreClient`] sits on top of it and
//! decodes JSON, turning backend failures into [`SecretsError::Fetch`] and bad
//! payloads into [`SecretsError::Decode`]. Neither layer retries.
//!
//! # Supported Backends
//!
//! - **AWS Secrets Manager**: `AwsSecretStore` (cargo feature `aws`)
//! - **HashiCorp Vault**: KV v2 engine
//! - **Environment Variables**: development fallback using the `SLOTDB_SECRET_*` prefix
//!
//! # Security Considerations
//!
//! - Secret values are never logged or included in error messages
//! - Passwords are held in [`SecretString`], which redacts itself

#[cfg(feature = "aws")]
pub mod aws;
pub mod client;
pub mod env;
pub mod error;
pub mod path;
pub mod types;
pub mod vault;

#[cfg(feature = "aws")]
pub use aws::{AwsConfig, AwsSecretStore};
pub use client::{SecretStore, SecretStoreClient};
pub use env::EnvVarSecretStore;
pub use error::{Result, SecretsError, StoreError};
pub use path::{PathTemplates, SecretKind, SecretPath};
pub use types::SecretString;
pub use vault::{VaultConfig, VaultSecretStore};
