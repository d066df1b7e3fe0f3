//! # Shared Connection Pool
//!
//! Process-wide MySQL pool built from a resolved [`ConnectionConfig`].
//!
//! - `get()` initialises the pool on first use. The state lock is held while
//!   resolving, so concurrent first callers wait for one resolution and share
//!   its pool instead of each resolving their own.
//! - `refresh()` re-resolves (e.g. after the credentials expired) and swaps
//!   the pool in; the old pool drains and closes in the background.
//! - `shutdown()` closes the pool for good; later calls fail with
//!   [`Error::PoolShutDown`].

use std::time::Duration;

use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use tokio::sync::Mutex;

use crate::config::ResolverSettings;
use crate::connection::{ConnectionConfig, ConnectionResolver};
use crate::errors::{Error, Result};

/// Pool sizing, mirroring the settings fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSizing {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
}

impl Default for PoolSizing {
    fn default() -> Self {
        Self { max_connections: 10, min_connections: 0, acquire_timeout: Duration::from_secs(10) }
    }
}

impl PoolSizing {
    pub fn from_settings(settings: &ResolverSettings) -> Self {
        Self {
            max_connections: settings.pool_max_connections,
            min_connections: settings.pool_min_connections,
            acquire_timeout: settings.connect_timeout(),
        }
    }
}

#[derive(Debug)]
enum PoolState {
    Uninitialized,
    Ready(MySqlPool),
    ShutDown,
}

/// Lazily resolved, explicitly torn down connection pool.
#[derive(Debug)]
pub struct SharedPool {
    resolver: ConnectionResolver,
    env: String,
    sizing: PoolSizing,
    state: Mutex<PoolState>,
}

impl SharedPool {
    pub fn new(resolver: ConnectionResolver, env: impl Into<String>, sizing: PoolSizing) -> Self {
        Self { resolver, env: env.into(), sizing, state: Mutex::new(PoolState::Uninitialized) }
    }

    pub fn from_settings(settings: &ResolverSettings, resolver: ConnectionResolver) -> Self {
        Self::new(resolver, settings.env.clone(), PoolSizing::from_settings(settings))
    }

    pub fn env(&self) -> &str {
        &self.env
    }

    /// Returns the pool, resolving credentials on first use.
    pub async fn get(&self) -> Result<MySqlPool> {
        let mut state = self.state.lock().await;

        match &*state {
            PoolState::Ready(pool) => Ok(pool.clone()),
            PoolState::ShutDown => Err(Error::PoolShutDown),
            PoolState::Uninitialized => {
                let pool = self.build().await?;
                *state = PoolState::Ready(pool.clone());
                Ok(pool)
            }
        }
    }

    /// Re-resolves credentials and replaces the pool.
    ///
    /// On failure the current pool (if any) is kept.
    pub async fn refresh(&self) -> Result<MySqlPool> {
        let mut state = self.state.lock().await;

        if matches!(*state, PoolState::ShutDown) {
            return Err(Error::PoolShutDown);
        }

        let pool = self.build().await?;
        let previous = std::mem::replace(&mut *state, PoolState::Ready(pool.clone()));

        if let PoolState::Ready(old) = previous {
            tracing::info!(env = %self.env, "Replacing connection pool after credential refresh");
            // close waits for checked-out connections; do not hold the lock for it
            tokio::spawn(async move { old.close().await });
        }

        Ok(pool)
    }

    /// Closes the pool. Idempotent.
    pub async fn shutdown(&self) {
        let mut state = self.state.lock().await;

        if let PoolState::Ready(pool) = std::mem::replace(&mut *state, PoolState::ShutDown) {
            pool.close().await;
            tracing::info!(env = %self.env, "Connection pool shut down");
        }
    }

    pub async fn is_initialized(&self) -> bool {
        matches!(*self.state.lock().await, PoolState::Ready(_))
    }

    /// Runs a liveness query through the pool.
    pub async fn check_connection(&self) -> Result<()> {
        let pool = self.get().await?;
        sqlx::query("SELECT 1")
            .execute(&pool)
            .await
            .map_err(|e| Error::database(e, "Pool connectivity check failed"))?;
        Ok(())
    }

    async fn build(&self) -> Result<MySqlPool> {
        let config = self.resolver.resolve_connection(&self.env).await?;
        Ok(self.pool_for(&config))
    }

    /// The probe has already proven the credentials, so the pool connects lazily.
    fn pool_for(&self, config: &ConnectionConfig) -> MySqlPool {
        let pool = MySqlPoolOptions::new()
            .max_connections(self.sizing.max_connections)
            .min_connections(self.sizing.min_connections)
            .acquire_timeout(self.sizing.acquire_timeout)
            .connect_lazy_with(config.connect_options());

        tracing::info!(
            env = %self.env,
            host = %config.host,
            database = %config.database,
            max_connections = self.sizing.max_connections,
            min_connections = self.sizing.min_connections,
            "Database connection pool created"
        );

        pool
    }
}
