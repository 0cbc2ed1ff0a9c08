//! Completion polling for submitted executions.
//!
//! [`watch`] fetches the execution status on each tick and decides between
//! returning, failing, and sleeping. Pacing is controlled by [`PollPolicy`]:
//! exponential backoff with jitter and an optional total wait budget.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use tracing::{debug, error, warn};

use crate::error::QueryError;
use crate::service::ExecutionService;
use crate::types::{ExecutionHandle, QueryState};

/// Controls how completion polling paces itself.
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    /// Delay before the second status fetch.
    pub initial_interval: Duration,
    /// Ceiling for the backoff delay.
    pub max_interval: Duration,
    /// Multiplier applied to the delay after each fetch.
    pub backoff: f64,
    /// Upper bound on random jitter added to each sleep, in milliseconds.
    pub jitter_ms: u64,
    /// Total wait budget. `None` polls until a terminal state.
    pub max_wait: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(200),
            max_interval: Duration::from_millis(2000),
            backoff: 1.5,
            jitter_ms: 100,
            max_wait: Some(Duration::from_secs(300)),
        }
    }
}

impl PollPolicy {
    /// Fixed-interval polling with no backoff and no jitter.
    pub fn fixed(interval: Duration) -> Self {
        Self {
            initial_interval: interval,
            max_interval: interval,
            backoff: 1.0,
            jitter_ms: 0,
            ..Self::default()
        }
    }

    /// Default pacing with no wait deadline, polling until a terminal state.
    pub fn unbounded() -> Self {
        Self {
            max_wait: None,
            ..Self::default()
        }
    }

    /// Replace the wait deadline.
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }
}

/// Poll `service` until `handle` reaches a terminal state.
///
/// Returns the same handle on SUCCEEDED. FAILED and CANCELLED become
/// [`QueryError::ExecutionFailed`] quoting the query text and the service's
/// state-change reason. When the policy's wait budget runs out, a
/// best-effort cancel is issued and [`QueryError::Timeout`] is returned.
pub async fn watch(
    service: &dyn ExecutionService,
    handle: &ExecutionHandle,
    policy: &PollPolicy,
) -> Result<ExecutionHandle, QueryError> {
    let started = Instant::now();
    let mut delay = policy.initial_interval;

    loop {
        let snapshot = service.status(&handle.execution_id).await?;

        debug!(
            execution_id = %handle.execution_id,
            state = %snapshot.state,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Polling execution status"
        );

        match snapshot.state {
            QueryState::Succeeded => return Ok(handle.clone()),

            QueryState::Failed | QueryState::Cancelled => {
                let reason = snapshot
                    .reason
                    .unwrap_or_else(|| "unknown".to_string());

                error!(
                    execution_id = %handle.execution_id,
                    state = %snapshot.state,
                    reason = %reason,
                    "Execution stopped"
                );
                return Err(QueryError::ExecutionFailed {
                    query: handle.query.clone(),
                    state: snapshot.state,
                    reason,
                });
            }

            QueryState::Queued | QueryState::Running => {}
        }

        if let Some(max_wait) = policy.max_wait {
            if started.elapsed() > max_wait {
                warn!(
                    execution_id = %handle.execution_id,
                    waited_seconds = max_wait.as_secs(),
                    "Wait budget exceeded, cancelling"
                );
                // Best-effort cancel.
                let _ = service.cancel(&handle.execution_id).await;
                return Err(QueryError::Timeout {
                    execution_id: handle.execution_id.clone(),
                    waited_seconds: max_wait.as_secs(),
                });
            }
        }

        let sleep_ms = delay.as_millis() as u64 + jitter_ms(policy.jitter_ms);
        tokio::time::sleep(Duration::from_millis(sleep_ms)).await;

        delay = next_delay(delay, policy);
    }
}

fn next_delay(current: Duration, policy: &PollPolicy) -> Duration {
    let scaled = (current.as_millis() as f64 * policy.backoff) as u64;
    Duration::from_millis(scaled.min(policy.max_interval.as_millis() as u64))
}

/// Jitter without rand: nanosecond fraction of current time, modulo the bound.
fn jitter_ms(bound: u64) -> u64 {
    if bound == 0 {
        return 0;
    }
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos() as u64;
    nanos % bound
}
