use std::{future::Future, time::Duration};

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::config::DbConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    Fixed(Duration),
    /// Doubles after every failed attempt, never exceeding `max`.
    Exponential { initial: Duration, max: Duration },
}

#[derive(Debug, Error)]
pub enum RetryError {
    #[error("cancelled after {attempts} attempt(s)")]
    Cancelled { attempts: u32 },
    #[error("gave up after {attempts} attempt(s): {last:#}")]
    Exhausted { attempts: u32, last: anyhow::Error },
}

/// How often and how patiently an operation is retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: Option<u32>,
    pub backoff: Backoff,
}

impl RetryPolicy {
    /// Retry forever with the same pause between attempts.
    pub fn fixed(delay: Duration) -> Self {
        Self {
            max_attempts: None,
            backoff: Backoff::Fixed(delay),
        }
    }

    pub fn exponential(initial: Duration, max: Duration) -> Self {
        Self {
            max_attempts: None,
            backoff: Backoff::Exponential { initial, max },
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts.max(1));
        self
    }

    /// Pause after the `attempt`-th failure (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed(delay) => delay,
            Backoff::Exponential { initial, max } => {
                let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
                initial.saturating_mul(factor).min(max)
            }
        }
    }

    /// Run `op` until it succeeds, the attempts run out, or `cancel` fires.
    ///
    /// `op` receives the 1-based attempt number.
    pub async fn run<T, F, Fut>(&self, cancel: &CancellationToken, mut op: F) -> Result<T, RetryError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let mut attempt = 0;
        loop {
            if cancel.is_cancelled() {
                return Err(RetryError::Cancelled { attempts: attempt });
            }
            attempt += 1;

            let err = match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if self.max_attempts.is_some_and(|max| attempt >= max) {
                return Err(RetryError::Exhausted { attempts: attempt, last: err });
            }

            let delay = self.delay_for(attempt);
            warn!(attempt, error = %err, delay_ms = delay.as_millis() as u64, "attempt failed, retrying");
            tokio::select! {
                _ = cancel.cancelled() => return Err(RetryError::Cancelled { attempts: attempt }),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}

impl From<&DbConfig> for RetryPolicy {
    fn from(cfg: &DbConfig) -> Self {
        let policy = RetryPolicy::fixed(cfg.retry_delay);
        match cfg.retry_max_attempts {
            Some(max) => policy.with_max_attempts(max),
            None => policy,
        }
    }
}
