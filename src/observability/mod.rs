//! # Observability
//!
//! Structured logging via `tracing` and counters via `metrics`.

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, log_settings_info};
pub use metrics::describe_metrics;
