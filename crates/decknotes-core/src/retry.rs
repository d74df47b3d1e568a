//! Bounded retry for backend calls.

use std::future::Future;
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{NotesError, NotesResult};

/// Retry configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Extra attempts after the first; zero surfaces errors immediately.
    pub max_retries: usize,
    /// Delay before the first retry, in milliseconds.
    pub min_delay_ms: u64,
    /// Upper bound on any single delay, in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            min_delay_ms: 500,
            max_delay_ms: 8_000,
        }
    }
}

/// Exponential backoff over retryable backend errors.
#[derive(Debug, Clone, Default)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    /// Create a policy from configuration.
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Policy that never retries.
    pub fn none() -> Self {
        Self::default()
    }

    /// Configured retry count.
    pub fn max_retries(&self) -> usize {
        self.config.max_retries
    }

    /// Run `operation`, retrying while it fails with a retryable error.
    pub async fn run<T, F, Fut>(&self, operation: F) -> NotesResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = NotesResult<T>>,
    {
        if self.config.max_retries == 0 {
            let mut operation = operation;
            return operation().await;
        }

        let backoff = ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(self.config.min_delay_ms))
            .with_max_delay(Duration::from_millis(self.config.max_delay_ms))
            .with_max_times(self.config.max_retries)
            .with_jitter();

        operation
            .retry(backoff)
            .when(|e: &NotesError| e.is_retryable())
            .notify(|err: &NotesError, delay: Duration| {
                warn!(
                    error = %err,
                    delay_ms = delay.as_millis() as u64,
                    "Backend call failed, retrying"
                );
            })
            .await
    }
}
