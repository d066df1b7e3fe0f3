//! # Storage
//!
//! The long-lived pool that consumes resolved connection settings.

pub mod pool;

pub use pool::{PoolSizing, SharedPool};
