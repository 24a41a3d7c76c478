//! Bounded retry with permanent/transient failure classification.
//!
//! Operations report failures as [`Failure`]. Permanent failures return
//! immediately. Transient failures are retried with doubling backoff until
//! the attempt bound is reached, then the last error is surfaced.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use envelope_shared::config::LedgerConfig;
use serde::Serialize;
use tracing::warn;

/// A classified failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure<E> {
    /// Retrying cannot help (not found, invalid input).
    Permanent(E),
    /// May succeed on another attempt (contention, I/O).
    Transient(E),
}

impl<E> Failure<E> {
    /// Unwraps the underlying error.
    pub fn into_inner(self) -> E {
        match self {
            Self::Permanent(e) | Self::Transient(e) => e,
        }
    }

    /// True for transient failures.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// Attempt bound and backoff schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Upper bound on attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub initial_backoff: Duration,
    /// Cap on any single delay.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(2),
        }
    }
}

impl From<&LedgerConfig> for RetryPolicy {
    fn from(config: &LedgerConfig) -> Self {
        Self {
            max_attempts: config.retry_max_attempts,
            initial_backoff: Duration::from_millis(config.retry_initial_backoff_ms),
            max_backoff: Duration::from_millis(config.retry_max_backoff_ms),
        }
    }
}

impl RetryPolicy {
    /// Retries without sleeping. Used by tests.
    #[must_use]
    pub const fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    /// Effective bound; zero is treated as one attempt.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Delay after the given failed attempt (1-based).
    #[must_use]
    pub fn backoff(&self, failed_attempt: u32) -> Duration {
        let doublings = failed_attempt.saturating_sub(1).min(31);
        self.initial_backoff
            .saturating_mul(1u32 << doublings)
            .min(self.max_backoff)
    }
}

/// Counters exposed for instrumentation.
#[derive(Debug, Default)]
pub struct RetryMetrics {
    attempts: AtomicU64,
    transient_failures: AtomicU64,
    exhausted: AtomicU64,
}

/// Point-in-time copy of [`RetryMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RetrySnapshot {
    /// Attempts started.
    pub attempts: u64,
    /// Attempts that failed transiently.
    pub transient_failures: u64,
    /// Runs that hit the attempt bound.
    pub exhausted: u64,
}

impl RetryMetrics {
    /// Reads all counters.
    pub fn snapshot(&self) -> RetrySnapshot {
        RetrySnapshot {
            attempts: self.attempts.load(Ordering::Relaxed),
            transient_failures: self.transient_failures.load(Ordering::Relaxed),
            exhausted: self.exhausted.load(Ordering::Relaxed),
        }
    }
}

/// Runs operations under a [`RetryPolicy`], recording [`RetryMetrics`].
#[derive(Debug, Clone, Default)]
pub struct Retrier {
    policy: RetryPolicy,
    metrics: Arc<RetryMetrics>,
}

impl Retrier {
    /// Creates a retrier with fresh metrics.
    #[must_use]
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            metrics: Arc::default(),
        }
    }

    /// The active policy.
    #[must_use]
    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Shared counters.
    #[must_use]
    pub fn metrics(&self) -> &RetryMetrics {
        &self.metrics
    }

    /// Runs `op` until it succeeds, fails permanently, or the bound is hit.
    ///
    /// `op` builds a fresh future per attempt so every retry re-executes the
    /// whole unit of work.
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Failure<E>>>,
        E: Display,
    {
        let max_attempts = self.policy.attempts();
        let mut attempt = 1;

        loop {
            self.metrics.attempts.fetch_add(1, Ordering::Relaxed);

            match op().await {
                Ok(value) => return Ok(value),
                Err(Failure::Permanent(err)) => return Err(err),
                Err(Failure::Transient(err)) => {
                    self.metrics.transient_failures.fetch_add(1, Ordering::Relaxed);

                    if attempt >= max_attempts {
                        self.metrics.exhausted.fetch_add(1, Ordering::Relaxed);
                        warn!(attempt, max_attempts, error = %err, "retries exhausted");
                        return Err(err);
                    }

                    let delay = self.policy.backoff(attempt);
                    warn!(
                        attempt,
                        max_attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %err,
                        "transient failure, retrying"
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
            }
        }
    }
}
