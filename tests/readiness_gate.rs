//! Readiness Gate Tests
//!
//! Connection establishment must:
//! - succeed as soon as a poll reports `Snapshot Status = Completed`
//! - fail with one terminal NotReady error once the budget is spent
//! - never loop past its deadline

use std::sync::Arc;
use std::time::{Duration, Instant};

use readyset_gate::error::LastObservation;
use readyset_gate::status::STATUS_STATEMENT;
use readyset_gate::transport::status_rows;
use readyset_gate::{
    BackoffPolicy, CacheConfig, GateConfig, GateError, MemoryExecutor, ReadinessConfig,
    ReadySetClient, TransportError, UnreachablePolicy,
};

fn fast_readiness(max_attempts: u32) -> ReadinessConfig {
    ReadinessConfig {
        max_attempts,
        deadline: Duration::from_secs(5),
        backoff: BackoffPolicy::Fixed(Duration::from_millis(2)),
        jitter: false,
        unreachable: UnreachablePolicy::Retry,
    }
}

fn client(executor: &Arc<MemoryExecutor>, readiness: ReadinessConfig) -> ReadySetClient {
    ReadySetClient::new(executor.clone(), readiness, CacheConfig::default())
}

// =============================================================================
// Success Paths
// =============================================================================

/// A completed snapshot on the first poll establishes immediately.
#[tokio::test]
async fn test_establish_when_database_ready() {
    let executor = Arc::new(MemoryExecutor::new());
    executor.respond(STATUS_STATEMENT, status_rows(&[("Snapshot Status", Some("Completed"))]));

    let snapshot = client(&executor, fast_readiness(3)).establish().await.unwrap();

    assert!(snapshot.snapshotting_completed());
    assert_eq!(executor.calls(STATUS_STATEMENT), 1);
}

/// Polling continues through "In Progress" and outages until completion.
#[tokio::test]
async fn test_establish_waits_for_snapshot() {
    let executor = Arc::new(MemoryExecutor::new());
    executor.enqueue(STATUS_STATEMENT, Err(TransportError::connection("connection refused")));
    executor.enqueue(STATUS_STATEMENT, Ok(status_rows(&[("Snapshot Status", Some("In Progress"))])));
    executor.enqueue(STATUS_STATEMENT, Ok(status_rows(&[("Snapshot Status", Some("Snapshotting"))])));
    executor.respond(
        STATUS_STATEMENT,
        status_rows(&[
            ("Snapshot Status", Some("Completed")),
            ("Database Connection", Some("Connected")),
            ("Connection Count", Some("4")),
        ]),
    );

    let snapshot = client(&executor, fast_readiness(10)).establish().await.unwrap();

    assert!(snapshot.connected_to_database());
    assert_eq!(snapshot.connection_count(), 4);
    assert_eq!(executor.calls(STATUS_STATEMENT), 4);
}

// =============================================================================
// Failure Paths
// =============================================================================

/// Every poll reporting "In Progress" ends in NotReady.
#[tokio::test]
async fn test_establish_when_database_not_ready() {
    let executor = Arc::new(MemoryExecutor::new());
    executor.respond(STATUS_STATEMENT, status_rows(&[("Snapshot Status", Some("In Progress"))]));

    let err = client(&executor, fast_readiness(5)).establish().await.unwrap_err();

    assert_eq!(err.code(), "READYSET_NOT_READY");
    assert!(err.to_string().starts_with("ReadySet database is not ready for service!"));
    assert!(matches!(
        err,
        GateError::NotReady {
            attempts: 5,
            last: LastObservation::NotSnapshotted { .. },
            ..
        }
    ));
    assert_eq!(executor.calls(STATUS_STATEMENT), 5);
}

/// An accelerator that never answers ends in NotReady naming the outage.
#[tokio::test]
async fn test_establish_when_accelerator_unreachable() {
    let executor = Arc::new(MemoryExecutor::new());
    executor.fail(STATUS_STATEMENT, TransportError::connection("connection refused"));

    let err = client(&executor, fast_readiness(3)).establish().await.unwrap_err();

    match err {
        GateError::NotReady { last: LastObservation::Unreachable(reason), .. } => {
            assert!(reason.contains("connection refused"));
        }
        other => panic!("expected NotReady, got {other}"),
    }
}

/// FailFast surfaces the first transport failure unchanged.
#[tokio::test]
async fn test_fail_fast_policy() {
    let executor = Arc::new(MemoryExecutor::new());
    executor.fail(STATUS_STATEMENT, TransportError::connection("connection refused"));

    let readiness = ReadinessConfig {
        unreachable: UnreachablePolicy::FailFast,
        ..fast_readiness(10)
    };
    let err = client(&executor, readiness).establish().await.unwrap_err();

    assert!(matches!(err, GateError::Transport(_)));
    assert_eq!(executor.calls(STATUS_STATEMENT), 1);
}

/// The deadline bounds establish even with a large attempt budget.
#[tokio::test]
async fn test_deadline_terminates_establish() {
    let executor = Arc::new(MemoryExecutor::new());
    executor.respond(STATUS_STATEMENT, status_rows(&[("Snapshot Status", Some("Snapshotting"))]));

    let readiness = ReadinessConfig {
        max_attempts: u32::MAX,
        deadline: Duration::from_millis(80),
        backoff: BackoffPolicy::Fixed(Duration::from_millis(20)),
        jitter: true,
        unreachable: UnreachablePolicy::Retry,
    };

    let started = Instant::now();
    let err = client(&executor, readiness).establish().await.unwrap_err();

    assert!(matches!(err, GateError::NotReady { .. }));
    assert!(started.elapsed() < Duration::from_secs(2));
}

// =============================================================================
// Configuration
// =============================================================================

/// A client built from JSON config honours its attempt budget.
#[tokio::test]
async fn test_establish_from_config() {
    let config = GateConfig::from_json(
        r#"{
            "connection_url": "postgres://readyset:5433/app",
            "readiness": {"max_attempts": 2, "backoff": "fixed", "initial_backoff_ms": 1, "jitter": false},
            "log_level": "error"
        }"#,
    )
    .unwrap();

    let executor = Arc::new(MemoryExecutor::new());
    executor.respond(STATUS_STATEMENT, status_rows(&[("Snapshot Status", Some("In Progress"))]));

    let client = ReadySetClient::from_config(config, executor.clone()).unwrap();
    let err = client.establish().await.unwrap_err();

    assert!(matches!(err, GateError::NotReady { attempts: 2, .. }));
    assert_eq!(executor.calls(STATUS_STATEMENT), 2);
}
