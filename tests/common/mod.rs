//! Common test utilities for all integration tests.
//!
//! In-memory secret store and scripted probes, so resolution can be exercised
//! without a secret backend or a MySQL server.

#![allow(dead_code)]
#![allow(clippy::duplicate_mod)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::json;
use slotdb::connection::{ConnectionConfig, ConnectivityProbe, ProbeError};
use slotdb::secrets::{SecretStore, StoreError};
use slotdb::{ConnectionResolver, RetryPolicy};

pub const PASSWORD_ONE: &str = "pw-one-s3cret";
pub const PASSWORD_TWO: &str = "pw-two-s3cret";

/// Secret store backed by a map, counting reads per path.
#[derive(Default)]
pub struct MemorySecretStore {
    secrets: Mutex<HashMap<String, String>>,
    throttled: Mutex<HashSet<String>>,
    reads: Mutex<HashMap<String, usize>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(self, path: &str, value: impl Into<String>) -> Self {
        self.secrets.lock().unwrap().insert(path.to_string(), value.into());
        self
    }

    pub fn with_json(self, path: &str, value: serde_json::Value) -> Self {
        self.with_secret(path, value.to_string())
    }

    /// Reads of `path` fail with a throttling error.
    pub fn throttle(self, path: &str) -> Self {
        self.throttled.lock().unwrap().insert(path.to_string());
        self
    }

    /// Starts throttling `path` on an already shared store.
    pub fn start_throttling(&self, path: &str) {
        self.throttled.lock().unwrap().insert(path.to_string());
    }

    pub fn reads(&self, path: &str) -> usize {
        self.reads.lock().unwrap().get(path).copied().unwrap_or(0)
    }

    pub fn total_reads(&self) -> usize {
        self.reads.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn get_secret(&self, path: &str) -> Result<String, StoreError> {
        *self.reads.lock().unwrap().entry(path.to_string()).or_default() += 1;

        if self.throttled.lock().unwrap().contains(path) {
            return Err(StoreError::throttled("Rate exceeded"));
        }

        self.secrets.lock().unwrap().get(path).cloned().ok_or(StoreError::NotFound)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

/// Probe that fails a fixed number of times, then succeeds.
pub struct ScriptedProbe {
    failures: Option<u32>,
    calls: AtomicU32,
    seen: Mutex<Vec<ConnectionConfig>>,
}

impl ScriptedProbe {
    pub fn succeeding() -> Self {
        Self::failing_times(0)
    }

    pub fn failing_times(failures: u32) -> Self {
        Self { failures: Some(failures), calls: AtomicU32::new(0), seen: Mutex::new(Vec::new()) }
    }

    pub fn always_failing() -> Self {
        Self { failures: None, calls: AtomicU32::new(0), seen: Mutex::new(Vec::new()) }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<ConnectionConfig> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConnectivityProbe for ScriptedProbe {
    async fn probe(&self, config: &ConnectionConfig) -> Result<(), ProbeError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.seen.lock().unwrap().push(config.clone());

        match self.failures {
            Some(failures) if call > failures => Ok(()),
            _ => Err(ProbeError::ConnectTimeout {
                target: format!("{}:{}/{}", config.host, config.port, config.database),
                timeout_ms: 10_000,
            }),
        }
    }
}

/// Indicator secret JSON promoting `slot` `minutes_ago` minutes before now.
pub fn indicator(slot: &str, minutes_ago: i64) -> serde_json::Value {
    let promoted = Utc::now() - Duration::minutes(minutes_ago);
    json!({ "activeSlot": slot, "timestamp": promoted.timestamp_millis() })
}

pub fn credential(host: &str, user: &str, password: &str) -> serde_json::Value {
    json!({ "proxyHost": host, "username": user, "password": password })
}

/// Store with both slots populated for `env` and the given indicator.
pub fn rotated_store(env: &str, active: &str, minutes_ago: i64) -> MemorySecretStore {
    MemorySecretStore::new()
        .with_json(&format!("mysql/{env}/active-user"), indicator(active, minutes_ago))
        .with_json(
            &format!("mysql/{env}/user-one"),
            credential("proxy-one.internal", "app_one", PASSWORD_ONE),
        )
        .with_json(
            &format!("mysql/{env}/user-two"),
            credential("proxy-two.internal", "app_two", PASSWORD_TWO),
        )
}

pub fn resolver(store: &Arc<MemorySecretStore>, probe: &Arc<ScriptedProbe>) -> ConnectionResolver {
    ConnectionResolver::new(store.clone(), probe.clone())
}

/// Resolver whose backoff is short enough to run in real time.
pub fn fast_resolver(
    store: &Arc<MemorySecretStore>,
    probe: &Arc<ScriptedProbe>,
) -> ConnectionResolver {
    resolver(store, probe)
        .with_retry_policy(RetryPolicy::new(5, std::time::Duration::from_millis(1)))
}
