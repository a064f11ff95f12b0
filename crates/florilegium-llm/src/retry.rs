//! Bounded retry with exponential backoff for capability calls

use crate::LlmError;
use florilegium_domain::CapabilityError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// Errors that know whether another attempt could help
pub trait Retryable {
    /// True if the same call may succeed later
    fn is_retryable(&self) -> bool;
}

impl Retryable for CapabilityError {
    fn is_retryable(&self) -> bool {
        self.is_transient()
    }
}

impl Retryable for LlmError {
    fn is_retryable(&self) -> bool {
        !matches!(self, LlmError::ModelNotAvailable(_))
    }
}

/// Retry settings shared by the extractor and curator configs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per call, the first one included (>= 1)
    pub max_attempts: u32,

    /// Delay before the first retry, in milliseconds
    pub initial_backoff_ms: u64,

    /// Upper bound for any single delay, in milliseconds
    pub max_backoff_ms: u64,

    /// Factor applied to the delay after every failed retry (>= 1.0)
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 1_000,
            max_backoff_ms: 30_000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// More attempts, shorter waits
    pub fn aggressive() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff_ms: 250,
            max_backoff_ms: 10_000,
            backoff_multiplier: 2.0,
        }
    }

    /// One retry with a long pause
    pub fn lenient() -> Self {
        Self {
            max_attempts: 2,
            initial_backoff_ms: 5_000,
            max_backoff_ms: 60_000,
            backoff_multiplier: 2.0,
        }
    }

    /// Check the settings for consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("retry.max_attempts must be at least 1".to_string());
        }
        if self.initial_backoff_ms > self.max_backoff_ms {
            return Err(format!(
                "retry.initial_backoff_ms ({}) exceeds retry.max_backoff_ms ({})",
                self.initial_backoff_ms, self.max_backoff_ms
            ));
        }
        if !(self.backoff_multiplier >= 1.0 && self.backoff_multiplier.is_finite()) {
            return Err(format!(
                "retry.backoff_multiplier must be a finite number >= 1.0, got {}",
                self.backoff_multiplier
            ));
        }
        Ok(())
    }
}

/// Executes an async operation up to `max_attempts` times
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_backoff: Duration,
    max_backoff: Duration,
    multiplier: f64,
}

impl RetryPolicy {
    /// Policy with a doubling backoff
    pub fn new(max_attempts: u32, initial_backoff_ms: u64, max_backoff_ms: u64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff: Duration::from_millis(initial_backoff_ms),
            max_backoff: Duration::from_millis(max_backoff_ms),
            multiplier: 2.0,
        }
    }

    /// Single attempt, no retries
    pub fn none() -> Self {
        Self::new(1, 0, 0)
    }

    /// Total attempts per call
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before retry number `retry` (1-based)
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let factor = self.multiplier.powi(retry.saturating_sub(1) as i32);
        let delay_ms = self.initial_backoff.as_millis() as f64 * factor;
        let cap_ms = self.max_backoff.as_millis() as f64;
        Duration::from_millis(delay_ms.min(cap_ms).round() as u64)
    }

    /// Run `f` until it succeeds, fails with a non-retryable error, or the
    /// attempts are used up. The last error is returned.
    pub async fn retry<F, Fut, T, E>(&self, operation_name: &str, mut f: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
        E: std::fmt::Display + Retryable,
    {
        let mut attempt = 0;

        loop {
            attempt += 1;
            match f().await {
                Ok(result) => {
                    if attempt > 1 {
                        info!(
                            operation = operation_name,
                            attempts = attempt,
                            "Operation succeeded after retries"
                        );
                    }
                    return Ok(result);
                }
                Err(e) if !e.is_retryable() => {
                    warn!(
                        operation = operation_name,
                        attempt,
                        error = %e,
                        "Operation failed with a non-retryable error"
                    );
                    return Err(e);
                }
                Err(e) => {
                    if attempt >= self.max_attempts {
                        warn!(
                            operation = operation_name,
                            attempts = attempt,
                            error = %e,
                            "Operation failed after max attempts"
                        );
                        return Err(e);
                    }

                    let backoff = self.backoff_for(attempt);
                    warn!(
                        operation = operation_name,
                        attempt,
                        max_attempts = self.max_attempts,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %e,
                        "Operation failed, retrying"
                    );
                    sleep(backoff).await;
                }
            }
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            max_backoff: Duration::from_millis(config.max_backoff_ms),
            multiplier: config.backoff_multiplier.max(1.0),
        }
    }
}
