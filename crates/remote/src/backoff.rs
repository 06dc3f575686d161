//! Exponential-backoff retry for single asynchronous operations.
//!
//! [`BackoffExecutor::execute`] runs an operation, hands every raw
//! result to a caller-supplied classifier, and re-runs the operation
//! while the classifier reports an error and the retry budget lasts.
//! The final raw result is returned untouched, so each endpoint decides
//! for itself what success means.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

/// Tunable parameters for the backoff strategy.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    /// Re-invocations allowed after the first attempt.
    pub retries: u32,
    /// Factor by which the delay grows after each failure.
    pub factor: f64,
    /// Delay before the first retry (before jitter).
    pub min_delay: Duration,
    /// Upper bound on the delay between attempts.
    pub max_delay: Duration,
    /// Multiply each delay by a random factor in `[1, 2)`.
    pub randomize: bool,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            retries: 5,
            factor: 2.0,
            min_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(2000),
            randomize: true,
        }
    }
}

impl BackoffPolicy {
    /// Same retry budget, no waiting between attempts.
    pub fn without_delay(retries: u32) -> Self {
        Self {
            retries,
            min_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            randomize: false,
            ..Default::default()
        }
    }

    /// Delay before retry number `attempt + 1` (`attempt` is zero-based).
    ///
    /// `min_delay * jitter * factor^attempt`, clamped to
    /// [`max_delay`](Self::max_delay).
    pub fn delay_for(&self, attempt: u32, jitter: f64) -> Duration {
        let base_ms = self.min_delay.as_millis() as f64;
        let scaled = (base_ms * jitter * self.factor.powi(attempt as i32)).round() as u64;
        Duration::from_millis(scaled).min(self.max_delay)
    }

    fn jitter(&self) -> f64 {
        if self.randomize {
            rand::rng().random_range(1.0..2.0)
        } else {
            1.0
        }
    }
}

/// Runs operations under a [`BackoffPolicy`].
///
/// Attempt state lives inside each [`execute`](Self::execute) call, so
/// one executor can be shared by concurrent callers.
#[derive(Debug, Clone, Default)]
pub struct BackoffExecutor {
    policy: BackoffPolicy,
}

impl BackoffExecutor {
    pub fn new(policy: BackoffPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &BackoffPolicy {
        &self.policy
    }

    /// Invoke `op` until `is_error` returns `None` or the retry budget
    /// is spent, then return the last raw result.
    ///
    /// `op` runs at most `retries + 1` times. No idempotency is
    /// enforced: a retried create may be applied more than once.
    pub async fn execute<T, F, Fut, C>(&self, mut op: F, is_error: C) -> T
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = T>,
        C: Fn(&T) -> Option<String>,
    {
        let mut attempt = 0u32;

        loop {
            let result = op().await;

            let Some(error) = is_error(&result) else {
                return result;
            };

            if attempt >= self.policy.retries {
                tracing::warn!(
                    attempts = attempt + 1,
                    error = %error,
                    "Retries exhausted",
                );
                return result;
            }

            let delay = self.policy.delay_for(attempt, self.policy.jitter());
            attempt += 1;
            tracing::debug!(
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Attempt failed, backing off",
            );
            tokio::time::sleep(delay).await;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
