//! Bounded exponential backoff for readiness polling.

use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::trace;

use crate::error::{ContainerError, DevcellError};

/// Delay schedule and overall budget for readiness probes.
///
/// The first retry waits `initial_delay`; each later retry doubles the
/// previous delay up to `max_delay`. Probing stops with
/// `ContainerError::ReadinessTimeout` once `timeout` has elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessPolicy {
    initial_delay: Duration,
    max_delay: Duration,
    timeout: Duration,
}

impl ReadinessPolicy {
    /// Create a policy.
    #[must_use]
    pub const fn new(initial_delay: Duration, max_delay: Duration, timeout: Duration) -> Self {
        Self {
            initial_delay,
            max_delay,
            timeout,
        }
    }

    /// Return the overall budget.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Return the delay following `current`.
    #[must_use]
    pub fn next_delay(&self, current: Duration) -> Duration {
        current.saturating_mul(2).min(self.max_delay)
    }

    /// Probe until it yields a value or the budget runs out.
    ///
    /// The probe runs once immediately. A probe error ends the wait at once.
    ///
    /// # Errors
    ///
    /// Returns the probe's error, or `ContainerError::ReadinessTimeout`
    /// naming `waiting_for`.
    pub async fn wait_until<T, F, Fut>(
        &self,
        container_id: &str,
        waiting_for: &str,
        mut probe: F,
    ) -> Result<T, DevcellError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<T>, DevcellError>>,
    {
        let started = Instant::now();
        let mut delay = self.initial_delay;

        loop {
            if let Some(value) = probe().await? {
                return Ok(value);
            }

            let remaining = self.timeout.saturating_sub(started.elapsed());
            if remaining.is_zero() {
                return Err(DevcellError::from(ContainerError::ReadinessTimeout {
                    container_id: String::from(container_id),
                    waiting_for: String::from(waiting_for),
                    millis: self.timeout.as_millis(),
                }));
            }

            trace!(container = container_id, waiting_for, ?delay, "not ready yet");
            sleep(delay.min(remaining)).await;
            delay = self.next_delay(delay);
        }
    }
}
