//! # Error Handling
//!
//! Each layer has its own `thiserror` enum (`StoreError`, `SecretsError`,
//! `ProbeError`, `ConfigError`). Only [`ResolutionError`] crosses the
//! consumer boundary; [`Error`] wraps it together with setup failures.

pub mod types;

pub use types::{Error, ResolutionError, Result};
