//! Retry policy for rate-limited handling
//!
//! Re-runs a whole unit of work when the transport reports a rate limit:
//! - Waits exactly as long as the server asked (`retry_after`)
//! - Gives up after `max_attempts` runs, or never when unlimited
//! - Any other error ends the run immediately
//!
//! The wait is a plain `tokio::time::sleep` inside the caller's task, so other
//! events keep being handled while one is backing off.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use crate::domain::config::RetryConfig;
use crate::domain::error::GateError;
use crate::domain::types::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of runs, first one included. `None` means unlimited.
    max_attempts: Option<usize>,
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_attempts)
    }

    pub fn new(max_attempts: Option<usize>) -> Self {
        Self {
            max_attempts: max_attempts.map(|n| n.max(1)),
        }
    }

    #[cfg(test)]
    pub fn unlimited() -> Self {
        Self { max_attempts: None }
    }

    /// Delay before the next run, or `None` when the error must not be retried
    /// (not a rate limit, or attempts exhausted).
    pub fn next_delay(&self, attempt: usize, error: &GateError) -> Option<Duration> {
        let delay = error.retry_after()?;
        match self.max_attempts {
            Some(max) if attempt >= max => None,
            _ => Some(delay),
        }
    }

    /// Execute an operation, re-running it after every rate-limit error.
    ///
    /// # Arguments
    /// * `operation` - Produces a fresh future for each run
    /// * `user` - User the work belongs to, for log correlation
    pub async fn execute_with_retry<F, Fut, T>(
        &self,
        operation: F,
        user: UserId,
    ) -> Result<T, GateError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, GateError>>,
    {
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::info!(user_id = %user, attempt, "Handling succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(error) => {
                    let Some(delay) = self.next_delay(attempt, &error) else {
                        return Err(error);
                    };
                    tracing::error!(
                        user_id = %user,
                        attempt,
                        retry_after_secs = delay.as_secs(),
                        error = %error,
                        "Rate limited, rescheduling handling"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    #[cfg(test)]
    pub fn max_attempts(&self) -> Option<usize> {
        self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}
