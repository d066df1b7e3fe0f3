//! # Connection Resolution
//!
//! Turns the current slot's credentials into a [`ConnectionConfig`] that has
//! been proven to connect.

pub mod config;
pub mod probe;
pub mod resolver;
pub mod retry;

pub use config::{
    ConfigAssembler, ConnectionConfig, DatabaseCredentialSecret, DEFAULT_BASE_DATABASE, MYSQL_PORT,
};
pub use probe::{
    ConnectivityProbe, MySqlConnector, MySqlProbe, ProbeConnector, ProbeError, ProbeSession,
    SessionProbe,
};
pub use resolver::ConnectionResolver;
pub use retry::RetryPolicy;
