//! Waiting for a launched execution to reach a terminal state.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use tracing::{debug, warn};

use crate::client::{AthenaError, ExecutionState, QueryService};

/// Backoff schedule for status polling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollSettings {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_factor: f64,
    /// Upper bound (exclusive) on the random extra delay per poll, in ms.
    pub max_jitter_ms: u64,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_millis(2000),
            backoff_factor: 1.5,
            max_jitter_ms: 100,
        }
    }
}

impl PollSettings {
    fn next_delay(&self, current: Duration) -> Duration {
        let next_ms = (current.as_millis() as f64 * self.backoff_factor) as u64;
        Duration::from_millis(next_ms).min(self.max_delay)
    }

    // Jitter without rand: nanosecond fraction of the current time.
    fn jitter(&self) -> Duration {
        if self.max_jitter_ms == 0 {
            return Duration::ZERO;
        }
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .subsec_nanos() as u64;
        Duration::from_millis(nanos % self.max_jitter_ms)
    }
}

/// Poll `execution_id` with exponential backoff until it is terminal.
///
/// Returns the terminal state (including `Failed` and `Cancelled`; deciding
/// what those mean is up to the caller) or [`AthenaError::ExecutionTimeout`] once
/// `timeout` has elapsed.
pub async fn wait_for_terminal(
    service: &dyn QueryService,
    execution_id: &str,
    timeout: Duration,
    settings: &PollSettings,
) -> Result<ExecutionState, AthenaError> {
    let start = Instant::now();
    let mut delay = settings.initial_delay;

    loop {
        let state = service.get_execution_state(execution_id).await?;

        debug!(
            execution_id,
            state = ?state,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Polling query status"
        );

        if state.is_terminal() {
            return Ok(state);
        }

        if start.elapsed() > timeout {
            warn!(execution_id, timeout_seconds = timeout.as_secs(), "Query did not finish in time");
            return Err(AthenaError::ExecutionTimeout {
                execution_id: execution_id.to_string(),
                seconds: timeout.as_secs(),
            });
        }

        tokio::time::sleep(delay + settings.jitter()).await;
        delay = settings.next_delay(delay);
    }
}
