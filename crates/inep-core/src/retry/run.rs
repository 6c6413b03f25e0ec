//! Retry loop: run a closure until success or policy says stop.

use std::fmt::Display;

use super::classify::Retryable;
use super::policy::{RetryDecision, RetryPolicy};

/// Runs `op` until it succeeds or the retry policy says to stop.
/// `op` receives the 1-based attempt number. On retryable failure, logs the
/// attempt, sleeps for the policy delay, then tries again. The last error is
/// returned when attempts are exhausted.
pub fn run_with_retry<T, E, F>(policy: &RetryPolicy, mut op: F) -> Result<T, E>
where
    E: Retryable + Display,
    F: FnMut(u32) -> Result<T, E>,
{
    let mut attempt = 1u32;
    loop {
        match op(attempt) {
            Ok(value) => return Ok(value),
            Err(e) => {
                tracing::warn!(
                    "attempt {}/{} failed: {}",
                    attempt,
                    policy.max_attempts,
                    e
                );
                match policy.decide(attempt, e.error_kind()) {
                    RetryDecision::NoRetry => return Err(e),
                    RetryDecision::RetryAfter(d) => {
                        if !d.is_zero() {
                            std::thread::sleep(d);
                        }
                        attempt += 1;
                    }
                }
            }
        }
    }
}
