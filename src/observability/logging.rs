//! # Structured Logging
//!
//! Subscriber setup and span helpers built on the tracing ecosystem.
//!
//! Every resolution runs inside a `resolution` span carrying the environment
//! and a fresh `resolution_id`, so the fetch, selection and probe events of
//! concurrent resolutions can be told apart.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Create a tracing span for one connection resolution.
///
/// ```rust,ignore
/// let span = resolution_span!("staging");
/// let span = resolution_span!("staging", caller = "pool_refresh");
/// ```
#[macro_export]
macro_rules! resolution_span {
    ($env:expr) => {
        tracing::info_span!(
            "resolution",
            env = %$env,
            resolution_id = %uuid::Uuid::new_v4()
        )
    };
    ($env:expr, $($field:tt)*) => {
        tracing::info_span!(
            "resolution",
            env = %$env,
            resolution_id = %uuid::Uuid::new_v4(),
            $($field)*
        )
    };
}

/// Installs the global subscriber.
///
/// `RUST_LOG` wins over `default_level` when set. Returns `false` if a
/// subscriber was already installed (tests, embedding applications).
pub fn init_logging(default_level: &str, json: bool) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let registry = tracing_subscriber::registry().with(filter);

    let installed = if json {
        registry.with(tracing_subscriber::fmt::layer().json()).try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };

    installed.is_ok()
}

/// Log the effective settings at startup. Never includes secret values.
pub fn log_settings_info(settings: &crate::config::ResolverSettings) {
    tracing::info!(
        env = %settings.env,
        base_database = %settings.base_database,
        port = settings.port,
        max_attempts = settings.max_attempts,
        backoff_base_ms = settings.backoff_base_ms,
        rotation_window_minutes = settings.rotation_window_minutes,
        indicator_template = %settings.indicator_path_template,
        credential_template = %settings.credential_path_template,
        "slotdb resolver settings"
    );
}
