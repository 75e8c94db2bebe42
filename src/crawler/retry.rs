//! Bounded retry with a fixed delay
//!
//! Every failure of a region fetch is treated as transient: the source is a
//! single site whose failures are almost always brief overloads. The attempt
//! budget and delay come from configuration.

use crate::config::FetcherConfig;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// How many times to try an operation and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first (at least 1)
    pub max_attempts: u32,

    /// Pause between consecutive attempts
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    pub fn from_config(config: &FetcherConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.retry_delay_ms),
        )
    }
}

/// Executes `operation` until it succeeds or the attempt budget is spent
///
/// Sleeps `policy.delay` between attempts; no sleep follows the final
/// attempt. Returns the last error when every attempt fails.
///
/// With `max_attempts = 3` the operation runs at most 3 times.
pub async fn retry_fixed<T, E, F, Fut>(policy: RetryPolicy, mut operation: F) -> Result<T, E>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 1u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt >= policy.max_attempts => return Err(err),
            Err(err) => {
                tracing::warn!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    delay_ms = policy.delay.as_millis() as u64,
                    error = %err,
                    "Fetch failed, retrying"
                );
            }
        }

        tokio::time::sleep(policy.delay).await;
        attempt += 1;
    }
}
