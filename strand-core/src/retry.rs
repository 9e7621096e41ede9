//! Retry and Error Recovery
//!
//! Wraps provider calls with exponential backoff. Transport-level failures
//! (429, 5xx, timeouts) are worth retrying; after exhaustion the caller sees
//! a single [`RetryExhaustedError`].

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::RetryExhaustedError;

// ---------------------------------------------------------------------------
// Retry configuration
// ---------------------------------------------------------------------------

/// Configuration for retry behavior. Delays are in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// When false, the first failure is rethrown unchanged.
    pub enabled: bool,
    /// Maximum number of retry attempts after the initial call (default 3).
    pub max_retries: u32,
    /// Base delay before the first retry (default 1.0).
    pub initial_delay: f64,
    /// Ceiling on any single delay (default 30.0).
    pub max_delay: f64,
    /// Backoff multiplier per attempt (default 2.0).
    pub exponential_base: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_retries: 3,
            initial_delay: 1.0,
            max_delay: 30.0,
            exponential_base: 2.0,
        }
    }
}

impl RetryConfig {
    /// Delay before retrying a given 0-indexed attempt.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let secs = self.initial_delay * self.exponential_base.powi(attempt as i32);
        Duration::from_secs_f64(secs.min(self.max_delay))
    }
}

/// Observer invoked on each retry with the 1-based attempt number and the
/// error that triggered it.
pub type RetryCallback = Arc<dyn Fn(u32, &anyhow::Error) + Send + Sync>;

// ---------------------------------------------------------------------------
// Retry executor
// ---------------------------------------------------------------------------

/// Execute an async operation with exponential backoff.
///
/// With retries disabled the original error propagates on the first failure.
/// Once `max_retries` extra attempts are spent, fails with
/// [`RetryExhaustedError`] carrying the attempt count and the last error.
pub async fn retry_async<F, Fut, T>(
    config: &RetryConfig,
    operation_name: &str,
    on_retry: Option<&RetryCallback>,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut attempt: u32 = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(err) if !config.enabled => return Err(err),
            Err(err) => {
                if attempt >= config.max_retries {
                    warn!(
                        operation = operation_name,
                        attempts = attempt + 1,
                        "max retries exceeded"
                    );
                    return Err(RetryExhaustedError {
                        attempts: attempt + 1,
                        last_error: err.to_string(),
                    }
                    .into());
                }

                let delay = config.delay_for_attempt(attempt);
                attempt += 1;
                warn!(
                    operation = operation_name,
                    attempt,
                    max = config.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    err = %err,
                    "retrying after error"
                );
                if let Some(cb) = on_retry {
                    cb(attempt, &err);
                }

                tokio::time::sleep(delay).await;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
