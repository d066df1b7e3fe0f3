//! End-to-end connection resolution.
//!
//! # Data Flow
//! ```text
//! resolve_connection(env)
//!     → indicator secret      (PathTemplates + SecretStoreClient, no retry)
//!     → RotationSelector      (pick slot)
//!     → credential secret     (no retry)
//!     → ConfigAssembler       (pure)
//!     → ConnectivityProbe     (retried: sleep base * 2^attempt between attempts)
//!     → ConnectionConfig
//! ```
//!
//! Secrets are read exactly once per call. Retries re-probe with the same
//! credentials: the store is rate limited and billed per call, and it is not
//! the component expected to flap once it has answered.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use super::config::{ConfigAssembler, ConnectionConfig, DatabaseCredentialSecret};
use super::probe::ConnectivityProbe;
use super::retry::RetryPolicy;
use crate::config::ResolverSettings;
use crate::errors::ResolutionError;
use crate::observability::metrics::{record_probe_attempt, record_resolution};
use crate::rotation::{ActiveSlotSecret, RotationSelector, Slot};
use crate::secrets::{PathTemplates, SecretKind, SecretStore, SecretStoreClient};

/// Resolves validated [`ConnectionConfig`]s for an environment.
///
/// Holds no mutable state, so one resolver can serve any number of
/// concurrent callers; each call reads its own secrets and opens its own
/// probe connections.
#[derive(Clone)]
pub struct ConnectionResolver {
    secrets: SecretStoreClient,
    templates: PathTemplates,
    selector: RotationSelector,
    assembler: ConfigAssembler,
    probe: Arc<dyn ConnectivityProbe>,
    retry: RetryPolicy,
}

impl std::fmt::Debug for ConnectionResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionResolver")
            .field("secrets", &self.secrets)
            .field("templates", &self.templates)
            .field("selector", &self.selector)
            .field("assembler", &self.assembler)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl ConnectionResolver {
    /// Resolver with default templates, window, database name and retry policy.
    pub fn new(store: Arc<dyn SecretStore>, probe: Arc<dyn ConnectivityProbe>) -> Self {
        Self {
            secrets: SecretStoreClient::new(store),
            templates: PathTemplates::default(),
            selector: RotationSelector::default(),
            assembler: ConfigAssembler::default(),
            probe,
            retry: RetryPolicy::default(),
        }
    }

    /// Resolver configured from validated settings.
    pub fn from_settings(
        settings: &ResolverSettings,
        store: Arc<dyn SecretStore>,
        probe: Arc<dyn ConnectivityProbe>,
    ) -> crate::Result<Self> {
        Ok(Self {
            secrets: SecretStoreClient::new(store),
            templates: settings.path_templates()?,
            selector: RotationSelector::new(settings.rotation_window()),
            assembler: settings.assembler(),
            probe,
            retry: settings.retry_policy(),
        })
    }

    pub fn with_templates(mut self, templates: PathTemplates) -> Self {
        self.templates = templates;
        self
    }

    pub fn with_selector(mut self, selector: RotationSelector) -> Self {
        self.selector = selector;
        self
    }

    pub fn with_assembler(mut self, assembler: ConfigAssembler) -> Self {
        self.assembler = assembler;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub fn templates(&self) -> &PathTemplates {
        &self.templates
    }

    /// Resolves with the configured attempt count and no cancellation.
    pub async fn resolve_connection(&self, env: &str) -> Result<ConnectionConfig, ResolutionError> {
        self.resolve_connection_with(env, self.retry.max_attempts(), &CancellationToken::new())
            .await
    }

    /// Resolves with an explicit attempt count and cancellation token.
    ///
    /// The token is checked before every probe and raced against every
    /// backoff sleep. A probe already in progress runs to completion so its
    /// connection is closed normally.
    pub async fn resolve_connection_with(
        &self,
        env: &str,
        max_attempts: u32,
        cancel: &CancellationToken,
    ) -> Result<ConnectionConfig, ResolutionError> {
        let span = crate::resolution_span!(env);

        async {
            let policy = self.retry.with_max_attempts(max_attempts);

            let result = match self.fetch_credentials(env, Utc::now()).await {
                Ok((slot, cred)) => {
                    let config = self.assembler.assemble(&cred, env);
                    tracing::debug!(
                        slot = %slot,
                        host = %config.host,
                        database = %config.database,
                        "Assembled connection config"
                    );
                    let probed = self.probe_with_retry(&config, policy, cancel).await;
                    probed.map(|()| config)
                }
                Err(e) => Err(e),
            };

            match &result {
                Ok(config) => {
                    record_resolution("ok");
                    tracing::info!(database = %config.database, "Database connection resolved");
                }
                Err(e) => {
                    record_resolution(e.kind());
                    tracing::error!(error = %e, "Database connection resolution failed");
                }
            }
            result
        }
        .instrument(span)
        .await
    }

    /// Reads the indicator, picks a slot and reads that slot's credentials.
    async fn fetch_credentials(
        &self,
        env: &str,
        now: DateTime<Utc>,
    ) -> Result<(Slot, DatabaseCredentialSecret), ResolutionError> {
        let indicator_path = self.templates.indicator_path(env);
        let indicator: ActiveSlotSecret = self
            .secrets
            .fetch_kind(SecretKind::Indicator, &indicator_path)
            .await
            .map_err(|source| ResolutionError::SecretsUnavailable {
                env: env.to_string(),
                slot: None,
                source,
            })?;

        let slot = self.selector.select_slot(&indicator, now);
        tracing::debug!(
            active_slot = %indicator.active_slot,
            promoted_at_ms = indicator.timestamp,
            selected_slot = %slot,
            recently_rotated = slot != indicator.active_slot,
            "Selected credential slot"
        );

        let credential_path = self.templates.credential_path(env, slot);
        let cred = self
            .secrets
            .fetch_kind(SecretKind::Credential, &credential_path)
            .await
            .map_err(|source| ResolutionError::SecretsUnavailable {
                env: env.to_string(),
                slot: Some(slot),
                source,
            })?;

        Ok((slot, cred))
    }

    async fn probe_with_retry(
        &self,
        config: &ConnectionConfig,
        policy: RetryPolicy,
        cancel: &CancellationToken,
    ) -> Result<(), ResolutionError> {
        let mut attempt: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(ResolutionError::Cancelled { attempts: attempt });
            }
            attempt += 1;

            let error = match self.probe.probe(config).await {
                Ok(()) => {
                    record_probe_attempt("ok");
                    tracing::debug!(attempt, "Connectivity probe succeeded");
                    return Ok(());
                }
                Err(error) => error,
            };
            record_probe_attempt("error");

            if policy.is_final(attempt) {
                tracing::warn!(
                    attempt,
                    error = %error,
                    "Connectivity probe failed on final attempt"
                );
                return Err(ResolutionError::ConnectionUnreachable {
                    attempts: attempt,
                    last_cause: error,
                });
            }

            let delay = policy.delay_after(attempt);
            tracing::warn!(
                attempt,
                max_attempts = policy.max_attempts(),
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Connectivity probe failed, backing off"
            );

            tokio::select! {
                _ = cancel.cancelled() => {
                    return Err(ResolutionError::Cancelled { attempts: attempt });
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}
