//! # Metrics
//!
//! Counters emitted through the `metrics` facade. The library installs no
//! recorder; without one the calls are no-ops.

use metrics::{counter, describe_counter};

pub const SECRET_FETCHES_TOTAL: &str = "slotdb_secret_fetches_total";
pub const PROBE_ATTEMPTS_TOTAL: &str = "slotdb_probe_attempts_total";
pub const RESOLUTIONS_TOTAL: &str = "slotdb_resolutions_total";

/// Outcome label for a secret read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Ok,
    StoreError,
    DecodeError,
}

impl FetchOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            FetchOutcome::Ok => "ok",
            FetchOutcome::StoreError => "store_error",
            FetchOutcome::DecodeError => "decode_error",
        }
    }
}

/// Registers metric descriptions with the installed recorder.
pub fn describe_metrics() {
    describe_counter!(SECRET_FETCHES_TOTAL, "Secret store reads by secret kind and outcome");
    describe_counter!(PROBE_ATTEMPTS_TOTAL, "Connectivity probe attempts by outcome");
    describe_counter!(RESOLUTIONS_TOTAL, "Connection resolutions by outcome");
}

fn secret_fetch_labels(kind: &'static str, outcome: FetchOutcome) -> [(&'static str, String); 2] {
    [("kind", kind.to_string()), ("outcome", outcome.as_str().to_string())]
}

/// Counts one secret read, labelled by secret kind and outcome.
pub fn record_secret_fetch(kind: &'static str, outcome: FetchOutcome) {
    let labels = secret_fetch_labels(kind, outcome);
    counter!(SECRET_FETCHES_TOTAL, &labels).increment(1);
}

pub fn record_probe_attempt(outcome: &'static str) {
    let labels = [("outcome", outcome.to_string())];
    counter!(PROBE_ATTEMPTS_TOTAL, &labels).increment(1);
}

pub fn record_resolution(outcome: &'static str) {
    let labels = [("outcome", outcome.to_string())];
    counter!(RESOLUTIONS_TOTAL, &labels).increment(1);
}
