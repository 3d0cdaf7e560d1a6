//! Deadline and retry policy for oracle calls.
//!
//! [`RetryPolicy`] decides how often and how long to wait; [`OracleGuard`] runs one
//! call under a per-attempt deadline, retries it under the policy, and aborts the wait
//! between attempts when the search's cancellation token fires.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::OracleError;

/// Retry policy for failed oracle calls.
#[derive(Debug, Clone, Default)]
pub enum RetryPolicy {
    /// Fail on the first error.
    #[default]
    None,
    /// Constant delay between attempts.
    Fixed {
        /// Maximum number of retries.
        max_attempts: usize,
        interval: Duration,
    },
    /// Exponentially increasing delay, capped at `max_interval`.
    Exponential {
        /// Maximum number of retries.
        max_attempts: usize,
        initial_interval: Duration,
        max_interval: Duration,
        multiplier: f64,
    },
}

impl RetryPolicy {
    pub fn none() -> Self {
        RetryPolicy::None
    }

    pub fn fixed(max_attempts: usize, interval: Duration) -> Self {
        RetryPolicy::Fixed {
            max_attempts,
            interval,
        }
    }

    pub fn exponential(
        max_attempts: usize,
        initial_interval: Duration,
        max_interval: Duration,
        multiplier: f64,
    ) -> Self {
        RetryPolicy::Exponential {
            max_attempts,
            initial_interval,
            max_interval,
            multiplier,
        }
    }

    /// `true` while `attempt` (0-based retry count) is below the maximum.
    pub fn should_retry(&self, attempt: usize) -> bool {
        attempt < self.max_attempts()
    }

    /// Delay before retry number `attempt`. Exponential delays that overflow or are not a
    /// valid duration are capped at `max_interval`.
    pub fn delay(&self, attempt: usize) -> Duration {
        match self {
            RetryPolicy::None => Duration::ZERO,
            RetryPolicy::Fixed { interval, .. } => *interval,
            RetryPolicy::Exponential {
                initial_interval,
                max_interval,
                multiplier,
                ..
            } => {
                let exp = i32::try_from(attempt).unwrap_or(i32::MAX);
                let secs = initial_interval.as_secs_f64() * multiplier.powi(exp);
                Duration::try_from_secs_f64(secs).map_or(*max_interval, |d| d.min(*max_interval))
            }
        }
    }

    pub fn max_attempts(&self) -> usize {
        match self {
            RetryPolicy::None => 0,
            RetryPolicy::Fixed { max_attempts, .. } => *max_attempts,
            RetryPolicy::Exponential { max_attempts, .. } => *max_attempts,
        }
    }
}

/// Runs oracle calls under a deadline and a retry policy.
#[derive(Debug, Clone)]
pub struct OracleGuard {
    timeout: Option<Duration>,
    retry: RetryPolicy,
    cancel: Option<CancellationToken>,
}

impl Default for OracleGuard {
    fn default() -> Self {
        Self::unguarded()
    }
}

impl OracleGuard {
    /// No deadline, no retries.
    pub fn unguarded() -> Self {
        Self {
            timeout: None,
            retry: RetryPolicy::None,
            cancel: None,
        }
    }

    pub fn new(timeout: Duration, retry: RetryPolicy) -> Self {
        Self {
            timeout: Some(timeout),
            retry,
            cancel: None,
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Calls `op` until it succeeds or the policy gives up; returns the last error.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, OracleError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, OracleError>>,
    {
        let mut attempt = 0;
        loop {
            let result = match self.timeout {
                Some(limit) => match tokio::time::timeout(limit, op()).await {
                    Ok(r) => r,
                    Err(_) => Err(OracleError::Timeout(limit)),
                },
                None => op().await,
            };
            let err = match result {
                Ok(v) => return Ok(v),
                Err(OracleError::Cancelled) => return Err(OracleError::Cancelled),
                Err(e) => e,
            };
            if !self.retry.should_retry(attempt) {
                return Err(err);
            }
            let delay = self.retry.delay(attempt);
            attempt += 1;
            warn!(
                oracle = label,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "oracle call failed, retrying"
            );
            match &self.cancel {
                Some(token) => {
                    tokio::select! {
                        _ = token.cancelled() => return Err(OracleError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                None => tokio::time::sleep(delay).await,
            }
        }
    }
}
