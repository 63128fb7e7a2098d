//! Readiness polling loop

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::{sleep, timeout, Instant};

use crate::error::{GateError, GateResult, LastObservation};
use crate::observability::{log_event, Event};
use crate::status::{StatusSnapshot, StatusSource};

use super::backoff::{with_jitter, BackoffPolicy};

/// What to do when a status poll cannot reach the accelerator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnreachablePolicy {
    /// Treat it as "not ready yet" and keep polling until the budget runs out
    #[default]
    Retry,
    /// Return the transport error immediately
    FailFast,
}

/// Polling budget and pacing
#[derive(Debug, Clone)]
pub struct ReadinessConfig {
    /// Upper bound on status polls
    pub max_attempts: u32,
    /// Wall-clock bound for the whole establish call
    pub deadline: Duration,
    pub backoff: BackoffPolicy,
    /// Randomize each delay by up to 25%
    pub jitter: bool,
    pub unreachable: UnreachablePolicy,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            deadline: Duration::from_secs(30),
            backoff: BackoffPolicy::default(),
            jitter: true,
            unreachable: UnreachablePolicy::Retry,
        }
    }
}

/// Blocks connection establishment until snapshotting has completed
#[derive(Debug, Clone)]
pub struct ReadinessGate {
    source: StatusSource,
    config: ReadinessConfig,
}

impl ReadinessGate {
    /// Gate polling `source` with the given budget
    pub fn new(source: StatusSource, config: ReadinessConfig) -> Self {
        Self { source, config }
    }

    /// Polling budget and pacing in effect
    pub fn config(&self) -> &ReadinessConfig {
        &self.config
    }

    /// Poll until ready, returning the snapshot that proved readiness.
    ///
    /// Fails with `GateError::NotReady` once `max_attempts` polls have been
    /// made or the deadline has passed, whichever comes first. No sleep
    /// extends past the deadline, and each poll is cut off at the deadline.
    pub async fn establish(&self) -> GateResult<StatusSnapshot> {
        let started = Instant::now();
        let deadline = started + self.config.deadline;
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            let attempt_str = attempt.to_string();
            log_event(Event::ReadinessPoll, &[("attempt", attempt_str.as_str())]);

            let remaining = deadline.saturating_duration_since(Instant::now());
            let last = match timeout(remaining, self.source.fetch_status()).await {
                Ok(Ok(snapshot)) if snapshot.snapshotting_completed() => {
                    let elapsed = started.elapsed().as_millis().to_string();
                    log_event(
                        Event::ReadinessReady,
                        &[("attempts", attempt_str.as_str()), ("elapsed_ms", elapsed.as_str())],
                    );
                    return Ok(snapshot);
                }
                Ok(Ok(snapshot)) => LastObservation::NotSnapshotted {
                    snapshot_status: snapshot.snapshot_status().map(str::to_string),
                },
                Ok(Err(GateError::Transport(err))) => {
                    let reason = err.to_string();
                    log_event(
                        Event::ReadinessUnreachable,
                        &[("attempt", attempt_str.as_str()), ("error", reason.as_str())],
                    );
                    if self.config.unreachable == UnreachablePolicy::FailFast {
                        return Err(GateError::Transport(err));
                    }
                    LastObservation::Unreachable(reason)
                }
                Ok(Err(other)) => return Err(other),
                Err(_) => LastObservation::Unreachable(format!(
                    "status query still pending at the {}ms deadline",
                    self.config.deadline.as_millis()
                )),
            };

            let now = Instant::now();
            if attempt >= max_attempts || now >= deadline {
                return Err(self.fail(attempt, started, last));
            }

            let mut delay = self.config.backoff.delay_for(attempt);
            if self.config.jitter {
                delay = with_jitter(delay);
            }
            sleep(delay.min(deadline - now)).await;
        }
    }

    fn fail(&self, attempts: u32, started: Instant, last: LastObservation) -> GateError {
        let elapsed_ms = started.elapsed().as_millis() as u64;
        let last_str = last.to_string();
        let attempts_str = attempts.to_string();
        let elapsed_str = elapsed_ms.to_string();
        log_event(
            Event::ReadinessFailed,
            &[
                ("attempts", attempts_str.as_str()),
                ("elapsed_ms", elapsed_str.as_str()),
                ("last", last_str.as_str()),
            ],
        );
        GateError::NotReady {
            attempts,
            elapsed_ms,
            last,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::status::STATUS_STATEMENT;
    use crate::transport::{status_rows, Accelerator, MemoryExecutor, TransportError};

    fn quick_config(max_attempts: u32) -> ReadinessConfig {
        ReadinessConfig {
            max_attempts,
            deadline: Duration::from_secs(5),
            backoff: BackoffPolicy::Fixed(Duration::from_millis(1)),
            jitter: false,
            unreachable: UnreachablePolicy::Retry,
        }
    }

    fn gate(executor: &Arc<MemoryExecutor>, config: ReadinessConfig) -> ReadinessGate {
        ReadinessGate::new(StatusSource::new(Accelerator::new(executor.clone())), config)
    }

    fn snapshot_status(value: &str) -> Vec<crate::transport::Row> {
        status_rows(&[("Snapshot Status", Some(value))])
    }

    #[tokio::test]
    async fn test_ready_on_first_poll() {
        let executor = Arc::new(MemoryExecutor::new());
        executor.respond(STATUS_STATEMENT, snapshot_status("Completed"));

        let snapshot = gate(&executor, quick_config(5)).establish().await.unwrap();
        assert!(snapshot.snapshotting_completed());
        assert_eq!(executor.calls(STATUS_STATEMENT), 1);
    }

    #[tokio::test]
    async fn test_not_ready_exhausts_attempts() {
        let executor = Arc::new(MemoryExecutor::new());
        executor.respond(STATUS_STATEMENT, snapshot_status("In Progress"));

        let err = gate(&executor, quick_config(4)).establish().await.unwrap_err();
        match err {
            GateError::NotReady { attempts, last, .. } => {
                assert_eq!(attempts, 4);
                assert_eq!(
                    last,
                    LastObservation::NotSnapshotted {
                        snapshot_status: Some("In Progress".to_string())
                    }
                );
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(executor.calls(STATUS_STATEMENT), 4);
    }

    #[tokio::test]
    async fn test_becomes_ready_after_retries() {
        let executor = Arc::new(MemoryExecutor::new());
        executor.enqueue(STATUS_STATEMENT, Ok(snapshot_status("Snapshotting")));
        executor.enqueue(STATUS_STATEMENT, Err(TransportError::connection("refused")));
        executor.respond(STATUS_STATEMENT, snapshot_status("Completed"));

        let snapshot = gate(&executor, quick_config(5)).establish().await.unwrap();
        assert!(snapshot.snapshotting_completed());
        assert_eq!(executor.calls(STATUS_STATEMENT), 3);
    }

    #[tokio::test]
    async fn test_unreachable_is_retried_by_default() {
        let executor = Arc::new(MemoryExecutor::new());
        executor.fail(STATUS_STATEMENT, TransportError::connection("refused"));

        let err = gate(&executor, quick_config(3)).establish().await.unwrap_err();
        match err {
            GateError::NotReady { attempts, last, .. } => {
                assert_eq!(attempts, 3);
                assert!(matches!(last, LastObservation::Unreachable(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_fail_fast_on_unreachable() {
        let executor = Arc::new(MemoryExecutor::new());
        executor.fail(STATUS_STATEMENT, TransportError::connection("refused"));

        let config = ReadinessConfig {
            unreachable: UnreachablePolicy::FailFast,
            ..quick_config(10)
        };
        let err = gate(&executor, config).establish().await.unwrap_err();
        assert!(matches!(err, GateError::Transport(TransportError::Connection(_))));
        assert_eq!(executor.calls(STATUS_STATEMENT), 1);
    }

    #[tokio::test]
    async fn test_deadline_bounds_establish() {
        let executor = Arc::new(MemoryExecutor::new().with_latency(Duration::from_millis(30)));
        executor.respond(STATUS_STATEMENT, snapshot_status("Snapshotting"));

        let config = ReadinessConfig {
            max_attempts: 1_000,
            deadline: Duration::from_millis(100),
            backoff: BackoffPolicy::Fixed(Duration::from_millis(10)),
            jitter: false,
            unreachable: UnreachablePolicy::Retry,
        };

        let started = std::time::Instant::now();
        let err = gate(&executor, config).establish().await.unwrap_err();
        assert!(matches!(err, GateError::NotReady { .. }));
        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(executor.calls(STATUS_STATEMENT) < 1_000);
    }

    #[tokio::test]
    async fn test_hung_status_query_is_cut_off() {
        let executor = Arc::new(MemoryExecutor::new().with_latency(Duration::from_secs(30)));
        executor.respond(STATUS_STATEMENT, snapshot_status("Completed"));

        let config = ReadinessConfig {
            deadline: Duration::from_millis(50),
            ..quick_config(3)
        };
        let started = std::time::Instant::now();
        let err = gate(&executor, config).establish().await.unwrap_err();
        assert!(matches!(
            err,
            GateError::NotReady {
                last: LastObservation::Unreachable(_),
                ..
            }
        ));
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
