//! Integration tests for end-to-end connection resolution.
//!
//! These tests drive `ConnectionResolver` against an in-memory secret store
//! and scripted probes, covering slot selection, database naming, the retry
//! schedule, the no-refetch rule and cancellation.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{
    credential, fast_resolver, indicator, resolver, rotated_store, MemorySecretStore,
    ScriptedProbe, PASSWORD_ONE, PASSWORD_TWO,
};
use slotdb::secrets::{SecretsError, StoreError};
use slotdb::{ConfigAssembler, ProbeError, ResolutionError, RetryPolicy, Slot};
use tokio::time::Instant;
use tokio_test::{assert_err, assert_ok};
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_inside_window_selects_other_slot() {
    // Scenario A: slot one promoted ten minutes ago
    let store = Arc::new(rotated_store("dev", "one", 10));
    let probe = Arc::new(ScriptedProbe::succeeding());

    let config = resolver(&store, &probe).resolve_connection("dev").await.unwrap();

    assert_eq!(config.host, "proxy-two.internal");
    assert_eq!(config.user, "app_two");
    assert_eq!(config.password.expose_secret(), PASSWORD_TWO);
    assert_eq!(store.reads("mysql/dev/user-two"), 1);
    assert_eq!(store.reads("mysql/dev/user-one"), 0);
}

#[tokio::test]
async fn test_outside_window_keeps_indicated_slot() {
    // Scenario B: slot two promoted three hours ago
    let store = Arc::new(rotated_store("dev", "two", 180));
    let probe = Arc::new(ScriptedProbe::succeeding());

    let config = resolver(&store, &probe).resolve_connection("dev").await.unwrap();

    assert_eq!(config.user, "app_two");
    assert_eq!(store.reads("mysql/dev/user-two"), 1);
    assert_eq!(store.reads("mysql/dev/user-one"), 0);
}

#[tokio::test]
async fn test_prod_uses_base_database_name() {
    // Scenario C
    let store = Arc::new(rotated_store("prod", "one", 600));
    let probe = Arc::new(ScriptedProbe::succeeding());

    let config = resolver(&store, &probe).resolve_connection("prod").await.unwrap();

    assert_eq!(config.database, "core");
    assert_eq!(config.port, 3306);
    assert_eq!(config.password.expose_secret(), PASSWORD_ONE);
}

#[tokio::test]
async fn test_non_prod_prefixes_database_name() {
    // Scenario D
    let store = Arc::new(rotated_store("staging", "one", 600));
    let probe = Arc::new(ScriptedProbe::succeeding());

    let config = resolver(&store, &probe).resolve_connection("staging").await.unwrap();

    assert_eq!(config.database, "staging-core");
}

#[tokio::test]
async fn test_custom_base_database() {
    let store = Arc::new(rotated_store("qa", "one", 600));
    let probe = Arc::new(ScriptedProbe::succeeding());

    let result = resolver(&store, &probe)
        .with_assembler(ConfigAssembler::new("ledger"))
        .resolve_connection("qa")
        .await;
    let config = assert_ok!(result);

    assert_eq!(config.database, "qa-ledger");
}

#[tokio::test(start_paused = true)]
async fn test_succeeds_on_fifth_attempt_after_exponential_backoff() {
    // Scenario E: attempts 1-4 fail, attempt 5 succeeds after 2+4+8+16 seconds
    let store = Arc::new(rotated_store("dev", "one", 600));
    let probe = Arc::new(ScriptedProbe::failing_times(4));

    let start = Instant::now();
    let config = resolver(&store, &probe).resolve_connection("dev").await.unwrap();
    let elapsed = start.elapsed();

    assert_eq!(config.user, "app_one");
    assert_eq!(probe.calls(), 5);
    assert!(elapsed >= Duration::from_secs(30), "slept {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(31), "slept {:?}", elapsed);
}

#[tokio::test(start_paused = true)]
async fn test_success_stops_retrying() {
    let store = Arc::new(rotated_store("dev", "one", 600));
    let probe = Arc::new(ScriptedProbe::failing_times(1));

    let start = Instant::now();
    resolver(&store, &probe).resolve_connection("dev").await.unwrap();

    assert_eq!(probe.calls(), 2);
    assert!(start.elapsed() < Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_attempts_report_max_attempts() {
    let store = Arc::new(rotated_store("dev", "one", 600));
    let probe = Arc::new(ScriptedProbe::always_failing());

    let err = resolver(&store, &probe).resolve_connection("dev").await.unwrap_err();

    match err {
        ResolutionError::ConnectionUnreachable { attempts, last_cause } => {
            assert_eq!(attempts, 5);
            assert!(matches!(last_cause, ProbeError::ConnectTimeout { .. }));
        }
        other => panic!("expected ConnectionUnreachable, got {:?}", other),
    }
    assert_eq!(probe.calls(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_secrets_fetched_once_regardless_of_retries() {
    let store = Arc::new(rotated_store("dev", "one", 600));
    let probe = Arc::new(ScriptedProbe::failing_times(3));

    resolver(&store, &probe).resolve_connection("dev").await.unwrap();

    assert_eq!(probe.calls(), 4);
    assert_eq!(store.reads("mysql/dev/active-user"), 1);
    assert_eq!(store.reads("mysql/dev/user-one"), 1);
    assert_eq!(store.total_reads(), 2);

    // every attempt probes the same credentials
    let seen = probe.seen();
    assert!(seen.windows(2).all(|pair| pair[0] == pair[1]));
}

#[tokio::test]
async fn test_explicit_max_attempts_overrides_policy() {
    let store = Arc::new(rotated_store("dev", "one", 600));
    let probe = Arc::new(ScriptedProbe::always_failing());

    let err = fast_resolver(&store, &probe)
        .resolve_connection_with("dev", 2, &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.attempts(), 2);
    assert_eq!(probe.calls(), 2);
}

#[tokio::test]
async fn test_zero_max_attempts_still_probes_once() {
    let store = Arc::new(rotated_store("dev", "one", 600));
    let probe = Arc::new(ScriptedProbe::always_failing());

    let err = fast_resolver(&store, &probe)
        .resolve_connection_with("dev", 0, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ResolutionError::ConnectionUnreachable { attempts: 1, .. }));
}

#[tokio::test]
async fn test_missing_indicator_is_not_retried() {
    let store = Arc::new(MemorySecretStore::new());
    let probe = Arc::new(ScriptedProbe::succeeding());

    let err = resolver(&store, &probe).resolve_connection("dev").await.unwrap_err();

    match err {
        ResolutionError::SecretsUnavailable { env, slot, source } => {
            assert_eq!(env, "dev");
            assert_eq!(slot, None);
            assert!(matches!(source, SecretsError::Fetch { source: StoreError::NotFound, .. }));
            assert_eq!(source.path(), Some("mysql/dev/active-user"));
        }
        other => panic!("expected SecretsUnavailable, got {:?}", other),
    }
    assert_eq!(store.reads("mysql/dev/active-user"), 1);
    assert_eq!(probe.calls(), 0);
}

#[tokio::test]
async fn test_throttled_credential_reports_slot() {
    let store = Arc::new(rotated_store("dev", "one", 600).throttle("mysql/dev/user-one"));
    let probe = Arc::new(ScriptedProbe::succeeding());

    let err = resolver(&store, &probe).resolve_connection("dev").await.unwrap_err();

    assert!(matches!(
        err,
        ResolutionError::SecretsUnavailable {
            slot: Some(Slot::One),
            source: SecretsError::Fetch { source: StoreError::Throttled { .. }, .. },
            ..
        }
    ));
    assert_eq!(store.reads("mysql/dev/user-one"), 1);
    assert_eq!(probe.calls(), 0);
}

#[tokio::test]
async fn test_malformed_credential_is_decode_error() {
    let store = Arc::new(
        MemorySecretStore::new()
            .with_json("mysql/dev/active-user", indicator("two", 600))
            .with_secret("mysql/dev/user-two", "{not json"),
    );
    let probe = Arc::new(ScriptedProbe::succeeding());

    let err = resolver(&store, &probe).resolve_connection("dev").await.unwrap_err();

    match err {
        ResolutionError::SecretsUnavailable { slot, source, .. } => {
            assert_eq!(slot, Some(Slot::Two));
            assert!(matches!(source, SecretsError::Decode { .. }));
        }
        other => panic!("expected SecretsUnavailable, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unknown_slot_value_is_decode_error() {
    let store = Arc::new(MemorySecretStore::new().with_json(
        "mysql/dev/active-user",
        serde_json::json!({ "activeSlot": "three", "timestamp": 0 }),
    ));
    let probe = Arc::new(ScriptedProbe::succeeding());

    let err = resolver(&store, &probe).resolve_connection("dev").await.unwrap_err();

    assert!(matches!(
        err,
        ResolutionError::SecretsUnavailable { slot: None, source: SecretsError::Decode { .. }, .. }
    ));
}

#[tokio::test]
async fn test_legacy_field_names_accepted() {
    let promoted = chrono::Utc::now() - chrono::Duration::hours(5);
    let store = Arc::new(
        MemorySecretStore::new()
            .with_json(
                "mysql/dev/active-user",
                serde_json::json!({
                    "activeUser": "one",
                    "timestamp": promoted.timestamp_millis(),
                }),
            )
            .with_json(
                "mysql/dev/user-one",
                serde_json::json!({ "proxy": "legacy.internal", "username": "u", "password": "p" }),
            ),
    );
    let probe = Arc::new(ScriptedProbe::succeeding());

    let config = resolver(&store, &probe).resolve_connection("dev").await.unwrap();

    assert_eq!(config.host, "legacy.internal");
}

#[tokio::test]
async fn test_cancelled_before_first_probe() {
    let store = Arc::new(rotated_store("dev", "one", 600));
    let probe = Arc::new(ScriptedProbe::succeeding());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = resolver(&store, &probe)
        .resolve_connection_with("dev", 5, &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, ResolutionError::Cancelled { attempts: 0 }));
    assert_eq!(probe.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_during_backoff() {
    let store = Arc::new(rotated_store("dev", "one", 600));
    let probe = Arc::new(ScriptedProbe::always_failing());
    let cancel = CancellationToken::new();

    let task = {
        let resolver = resolver(&store, &probe);
        let cancel = cancel.clone();
        tokio::spawn(async move { resolver.resolve_connection_with("dev", 5, &cancel).await })
    };

    // first backoff is 2s; cancel half way through it
    tokio::time::sleep(Duration::from_millis(500)).await;
    cancel.cancel();

    let err = task.await.unwrap().unwrap_err();
    assert!(matches!(err, ResolutionError::Cancelled { attempts: 1 }));
    assert_eq!(probe.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_resolutions_are_independent() {
    let store = Arc::new(rotated_store("dev", "one", 600));
    let probe = Arc::new(ScriptedProbe::failing_times(2));
    let resolver = resolver(&store, &probe);

    let start = Instant::now();
    let (a, b, c) = tokio::join!(
        resolver.resolve_connection("dev"),
        resolver.resolve_connection("dev"),
        resolver.resolve_connection("dev"),
    );

    assert!(a.is_ok() && b.is_ok() && c.is_ok());
    // each call read its own secrets
    assert_eq!(store.reads("mysql/dev/active-user"), 3);
    assert_eq!(store.reads("mysql/dev/user-one"), 3);
    // sleeping callers did not serialise each other
    assert!(start.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn test_custom_retry_policy_used_by_default_call() {
    let store = Arc::new(rotated_store("dev", "one", 600));
    let probe = Arc::new(ScriptedProbe::always_failing());

    let result = resolver(&store, &probe)
        .with_retry_policy(RetryPolicy::new(3, Duration::from_millis(1)))
        .resolve_connection("dev")
        .await;
    let err = assert_err!(result);

    assert_eq!(err.attempts(), 3);
}

#[tokio::test]
async fn test_resolved_config_never_prints_password() {
    let store = Arc::new(
        MemorySecretStore::new()
            .with_json("mysql/dev/active-user", indicator("one", 600))
            .with_json("mysql/dev/user-one", credential("db.internal", "svc", "hunter2")),
    );
    let probe = Arc::new(ScriptedProbe::succeeding());

    let config = resolver(&store, &probe).resolve_connection("dev").await.unwrap();

    assert!(!format!("{}", config).contains("hunter2"));
    assert!(!format!("{:?}", config).contains("hunter2"));
    assert!(!serde_json::to_string(&config).unwrap().contains("hunter2"));
}
