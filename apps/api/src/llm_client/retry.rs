//! Retry policy for generation calls.
//!
//! The decision of whether a failed attempt is retried lives in `decide`, a pure
//! function over the error and attempt number. `run_with_retry` is the loop that
//! consumes it; nothing in here inspects HTTP responses directly.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use super::LlmError;

/// Attempt budget and backoff base for one generation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Delay after the first failed attempt; doubles after each further failure.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Backoff to wait after the given (1-based) failed attempt: 1s, 2s, 4s, ...
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

/// Outcome of a failed attempt.
#[derive(Debug)]
pub enum RetryDecision {
    Retry(Duration),
    Fail(LlmError),
}

/// Decides what happens after `attempt` (1-based) failed with `error`.
///
/// Only transient failures are retried, and only while attempts remain. The last
/// attempt never waits.
pub fn decide(error: LlmError, attempt: u32, policy: &RetryPolicy) -> RetryDecision {
    if error.is_transient() && attempt < policy.max_attempts {
        RetryDecision::Retry(policy.delay_after(attempt))
    } else {
        RetryDecision::Fail(error)
    }
}

/// Runs `operation` until it succeeds or `decide` says to stop.
///
/// `operation` receives the 1-based attempt number.
pub async fn run_with_retry<T, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T, LlmError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, LlmError>>,
{
    let mut attempt = 1;
    loop {
        let error = match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };

        let message = error.to_string();
        match decide(error, attempt, policy) {
            RetryDecision::Retry(delay) => {
                warn!(
                    "LLM call attempt {}/{} failed ({}), retrying after {}ms...",
                    attempt,
                    policy.max_attempts,
                    message,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            RetryDecision::Fail(error) => return Err(error),
        }
    }
}
