//! Exponential backoff for I/O calls.
//!
//! Every call to the relational store and the search index goes through
//! [`BackoffPolicy::retry`]. The policy itself is stateless between calls:
//! each invocation starts again from the first attempt.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio_retry::Retry;
use tracing::{error, warn};

use crate::errors::IngestError;

/// Default delay before the first retry.
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(100);

/// Default multiplier applied to the delay after each failure.
pub const DEFAULT_FACTOR: f64 = 2.0;

/// Default upper bound for a single delay.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(10);

/// Default total number of attempts, including the first.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Retry parameters.
///
/// The delay before retry `n` (counting from zero) is
/// `min(max_delay, initial_delay * factor^n)`. `max_attempts` bounds the
/// total number of attempts including the first one, so `1` disables
/// retries.
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    pub initial_delay: Duration,
    pub factor: f64,
    pub max_delay: Duration,
    pub max_attempts: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial_delay: DEFAULT_INITIAL_DELAY,
            factor: DEFAULT_FACTOR,
            max_delay: DEFAULT_MAX_DELAY,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl BackoffPolicy {
    /// A policy that tries exactly once.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Check that the parameters describe a usable policy.
    pub fn validate(&self) -> Result<(), IngestError> {
        if !self.factor.is_finite() || self.factor < 1.0 {
            return Err(IngestError::config(format!(
                "backoff factor must be a finite number >= 1, got {}",
                self.factor
            )));
        }
        if self.initial_delay > self.max_delay {
            return Err(IngestError::config(format!(
                "backoff initial delay {:?} exceeds max delay {:?}",
                self.initial_delay, self.max_delay
            )));
        }
        Ok(())
    }

    /// Delay before the retry following failure number `attempt` (zero-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let scaled = self.initial_delay.as_secs_f64() * self.factor.powi(exponent);
        let capped = scaled.min(self.max_delay.as_secs_f64());
        if capped.is_finite() && capped >= 0.0 {
            Duration::from_secs_f64(capped)
        } else {
            self.max_delay
        }
    }

    /// The sequence of delays between attempts, one fewer than `max_attempts`.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        let retries = self.max_attempts.max(1) - 1;
        (0..retries).map(move |attempt| self.delay_for(attempt))
    }

    /// Run `action` until it succeeds or the attempts are exhausted.
    ///
    /// Each failed attempt is logged with `operation`; after the last attempt
    /// the final error is returned to the caller.
    pub async fn retry<T, E, F, Fut>(&self, operation: &str, mut action: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let delays: Vec<Duration> = self.delays().collect();
        let mut attempt = 0u32;

        let result = Retry::spawn(delays, || {
            attempt += 1;
            let current = attempt;
            let pending = action();
            async move {
                pending.await.inspect_err(|e| {
                    warn!(
                        operation,
                        attempt = current,
                        max_attempts,
                        error = %e,
                        "Attempt failed"
                    );
                })
            }
        })
        .await;

        if let Err(ref e) = result {
            error!(
                operation,
                attempts = max_attempts,
                error = %e,
                "Retries exhausted"
            );
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    fn policy(max_attempts: u32) -> BackoffPolicy {
        BackoffPolicy {
            initial_delay: Duration::from_millis(100),
            factor: 2.0,
            max_delay: Duration::from_millis(500),
            max_attempts,
        }
    }

    #[test]
    fn test_delays_grow_and_cap() {
        let delays: Vec<_> = policy(6).delays().collect();
        assert_eq!(
            delays,
            vec![
                Duration::from_millis(100),
                Duration::from_millis(200),
                Duration::from_millis(400),
                Duration::from_millis(500),
                Duration::from_millis(500),
            ]
        );
    }

    #[test]
    fn test_single_attempt_has_no_delays() {
        assert_eq!(policy(1).delays().count(), 0);
        assert_eq!(policy(0).delays().count(), 0);
    }

    #[test]
    fn test_huge_exponent_is_capped() {
        assert_eq!(policy(2).delay_for(u32::MAX), Duration::from_millis(500));
    }

    #[test]
    fn test_validate() {
        assert!(BackoffPolicy::default().validate().is_ok());
        assert!(BackoffPolicy { factor: 0.5, ..BackoffPolicy::default() }.validate().is_err());
        assert!(BackoffPolicy { factor: f64::NAN, ..BackoffPolicy::default() }.validate().is_err());
        assert!(BackoffPolicy {
            initial_delay: Duration::from_secs(20),
            ..BackoffPolicy::default()
        }
        .validate()
        .is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_succeeds_after_failures() {
        let calls = AtomicU32::new(0);
        let started = Instant::now();

        let result: Result<u32, String> = policy(5)
            .retry("flaky", || async {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    Err(format!("failure {}", n))
                } else {
                    Ok(n)
                }
            })
            .await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 100ms + 200ms of backoff before the third attempt
        assert!(started.elapsed() >= Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_returns_last_error_after_max_attempts() {
        let calls = AtomicU32::new(0);

        let result: Result<(), String> = policy(3)
            .retry("always-failing", || async {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                Err(format!("failure {}", n))
            })
            .await;

        assert_eq!(result, Err("failure 3".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_each_call_starts_from_first_attempt() {
        let calls = AtomicU32::new(0);
        let backoff = policy(2);

        for _ in 0..2 {
            let _: Result<(), &str> = backoff
                .retry("fails", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err("nope")
                })
                .await;
        }

        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_max_attempts_one_means_no_retry() {
        let calls = AtomicU32::new(0);

        let result: Result<(), &str> = BackoffPolicy::no_retry()
            .retry("once", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("nope")
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
