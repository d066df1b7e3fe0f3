//! Connectivity probe.
//!
//! A probe opens one throwaway connection with the assembled settings, runs
//! `SELECT 1+1` and closes the connection again. The close happens on every
//! path: after a successful query, after a failed query, and (through `Drop`)
//! when the probe future is cancelled mid-flight.
//!
//! The probe is split into a [`ProbeConnector`] that opens a
//! [`ProbeSession`], and [`SessionProbe`] which owns the open/ping/close
//! sequence. Production code uses [`MySqlProbe`].

use std::time::Duration;

use async_trait::async_trait;
use sqlx::mysql::MySqlConnection;
use sqlx::Connection;
use thiserror::Error;

use super::config::ConnectionConfig;

/// Liveness statement sent on every probe connection.
pub const LIVENESS_QUERY: &str = "SELECT 1+1 AS result";

/// Default timeout for opening a probe connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from a single probe.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// The connection could not be opened.
    #[error("failed to connect to {target}: {source}")]
    Connect {
        target: String,
        #[source]
        source: sqlx::Error,
    },

    /// Opening the connection took longer than the connect timeout.
    #[error("connecting to {target} timed out after {timeout_ms}ms")]
    ConnectTimeout { target: String, timeout_ms: u64 },

    /// The liveness statement failed on an open connection.
    #[error("liveness query failed: {source}")]
    Query {
        #[source]
        source: sqlx::Error,
    },

    /// The liveness statement answered, but not with 2.
    #[error("liveness query returned {value}, expected 2")]
    UnexpectedResult { value: i64 },
}

impl ProbeError {
    pub fn connect(config: &ConnectionConfig, source: sqlx::Error) -> Self {
        Self::Connect { target: target(config), source }
    }

    pub fn query(source: sqlx::Error) -> Self {
        Self::Query { source }
    }
}

fn target(config: &ConnectionConfig) -> String {
    format!("{}:{}/{}", config.host, config.port, config.database)
}

/// Checks that a [`ConnectionConfig`] can currently reach the database.
///
/// Implementations never retry; the resolver owns the retry loop.
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    async fn probe(&self, config: &ConnectionConfig) -> Result<(), ProbeError>;
}

/// An open probe connection.
#[async_trait]
pub trait ProbeSession: Send {
    /// Runs the liveness statement.
    async fn ping(&mut self) -> Result<(), ProbeError>;

    /// Closes the connection.
    async fn close(self: Box<Self>) -> Result<(), ProbeError>;
}

/// Opens probe connections.
#[async_trait]
pub trait ProbeConnector: Send + Sync {
    async fn open(&self, config: &ConnectionConfig) -> Result<Box<dyn ProbeSession>, ProbeError>;
}

/// [`ConnectivityProbe`] that opens a session, pings it and always closes it.
#[derive(Debug, Clone)]
pub struct SessionProbe<C> {
    connector: C,
}

impl<C: ProbeConnector> SessionProbe<C> {
    pub fn new(connector: C) -> Self {
        Self { connector }
    }
}

#[async_trait]
impl<C: ProbeConnector> ConnectivityProbe for SessionProbe<C> {
    async fn probe(&self, config: &ConnectionConfig) -> Result<(), ProbeError> {
        let mut session = self.connector.open(config).await?;

        let outcome = session.ping().await;

        // closed unconditionally; a close failure only matters if the ping succeeded
        match (outcome, session.close().await) {
            (Ok(()), Ok(())) => Ok(()),
            (Ok(()), Err(close_error)) => {
                tracing::warn!(
                    endpoint = %target(config),
                    error = %close_error,
                    "Probe connection did not close cleanly"
                );
                Ok(())
            }
            (Err(ping_error), _) => Err(ping_error),
        }
    }
}

/// Opens plain MySQL connections with a connect timeout.
#[derive(Debug, Clone)]
pub struct MySqlConnector {
    connect_timeout: Duration,
}

impl Default for MySqlConnector {
    fn default() -> Self {
        Self { connect_timeout: DEFAULT_CONNECT_TIMEOUT }
    }
}

impl MySqlConnector {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

/// Dropping the session drops the connection, which closes its socket.
struct MySqlSession {
    conn: MySqlConnection,
}

#[async_trait]
impl ProbeSession for MySqlSession {
    async fn ping(&mut self) -> Result<(), ProbeError> {
        let value: i64 = sqlx::query_scalar(LIVENESS_QUERY)
            .fetch_one(&mut self.conn)
            .await
            .map_err(ProbeError::query)?;

        if value == 2 {
            Ok(())
        } else {
            Err(ProbeError::UnexpectedResult { value })
        }
    }

    async fn close(self: Box<Self>) -> Result<(), ProbeError> {
        self.conn.close().await.map_err(ProbeError::query)
    }
}

#[async_trait]
impl ProbeConnector for MySqlConnector {
    async fn open(&self, config: &ConnectionConfig) -> Result<Box<dyn ProbeSession>, ProbeError> {
        let options = config.connect_options();

        let connect = MySqlConnection::connect_with(&options);
        let conn = tokio::time::timeout(self.connect_timeout, connect)
            .await
            .map_err(|_| ProbeError::ConnectTimeout {
                target: target(config),
                timeout_ms: self.connect_timeout.as_millis() as u64,
            })?
            .map_err(|e| ProbeError::connect(config, e))?;

        Ok(Box::new(MySqlSession { conn }))
    }
}

/// The production probe.
pub type MySqlProbe = SessionProbe<MySqlConnector>;

impl MySqlProbe {
    pub fn mysql(connect_timeout: Duration) -> Self {
        SessionProbe::new(MySqlConnector::new(connect_timeout))
    }
}
