//! Timeouts and bounded retries around backend calls.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::warn;

use crate::error::{RagError, Result};

/// Bounded exponential-backoff retry policy.
///
/// Only errors for which [`RagError::is_retryable`] holds are retried, so an
/// authentication failure or a malformed body is surfaced on the first attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt. Zero disables retrying.
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each later retry.
    pub initial_backoff: Duration,
    /// Upper bound on any single delay.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self { max_retries: 0, ..Self::default() }
    }

    /// A policy with `max_retries` retries and the default backoff.
    pub fn new(max_retries: u32) -> Self {
        Self { max_retries, ..Self::default() }
    }

    /// Set the initial and maximum backoff delays.
    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max;
        self
    }

    /// Delay before retry number `retry` (0-based).
    pub fn backoff_for(&self, retry: u32) -> Duration {
        self.initial_backoff.saturating_mul(2u32.saturating_pow(retry)).min(self.max_backoff)
    }

    /// Run `operation` until it succeeds, fails fatally, or retries run out.
    ///
    /// `label` names the operation in log output.
    pub async fn run<F, Fut, T>(&self, label: &str, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut retry = 0;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && retry < self.max_retries => {
                    let delay = self.backoff_for(retry);
                    warn!(
                        operation = label,
                        attempt = retry + 1,
                        max_attempts = self.max_retries + 1,
                        ?delay,
                        error = %e,
                        "transient failure, retrying"
                    );
                    sleep(delay).await;
                    retry += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Await `future` for at most `limit`, mapping an elapsed timer to `on_elapsed()`.
pub async fn with_timeout<T, Fut>(
    limit: Duration,
    future: Fut,
    on_elapsed: impl FnOnce() -> RagError,
) -> Result<T>
where
    Fut: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, future).await {
        Ok(result) => result,
        Err(_) => Err(on_elapsed()),
    }
}
