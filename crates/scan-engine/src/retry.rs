//! Retry policy for service calls.

use scan_core::types::{FailureKind, ServiceKind, ServiceOutcome, Ticker};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Bounded retry with linear backoff.
///
/// Attempt `n` (1-based) that fails with a retryable kind is followed by a
/// pause of `backoff * n`, up to `max_retries` extra attempts.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    backoff: Duration,
    retryable: fn(FailureKind) -> bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(2, Duration::from_millis(500))
    }
}

impl RetryPolicy {
    /// Retry transient failures (timeouts and unreachable services).
    pub fn new(max_retries: u32, backoff: Duration) -> Self {
        Self {
            max_retries,
            backoff,
            retryable: transient,
        }
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Replace the retryable-failure predicate.
    pub fn with_predicate(mut self, retryable: fn(FailureKind) -> bool) -> Self {
        self.retryable = retryable;
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Total calls a persistently failing request will receive.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Pause after the given failed attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff * attempt
    }

    /// Whether a failure on the given attempt should be retried.
    pub fn should_retry(&self, kind: FailureKind, attempt: u32) -> bool {
        attempt <= self.max_retries && (self.retryable)(kind)
    }

    /// Drive `op` until it succeeds, fails permanently, or retries run out.
    ///
    /// The returned outcome carries the number of attempts made.
    pub async fn run<F, Fut>(&self, service: ServiceKind, ticker: &Ticker, mut op: F) -> ServiceOutcome
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ServiceOutcome>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let outcome = op().await;

            match outcome.failure_kind() {
                Some(kind) if self.should_retry(kind, attempt) => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        "{} {} attempt {}/{} failed ({}), retrying in {:?}",
                        service,
                        ticker,
                        attempt,
                        self.max_attempts(),
                        kind,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Some(kind) => {
                    debug!("{} {} failed after {} attempt(s): {}", service, ticker, attempt, kind);
                    return outcome.with_attempts(attempt);
                }
                None => return outcome,
            }
        }
    }
}

fn transient(kind: FailureKind) -> bool {
    kind.is_transient()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn ticker() -> Ticker {
        Ticker::parse("AAPL").unwrap()
    }

    #[test]
    fn test_linear_backoff() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(300));
    }

    #[test]
    fn test_only_transient_failures_retry() {
        let policy = RetryPolicy::default();
        assert!(policy.should_retry(FailureKind::Timeout, 1));
        assert!(policy.should_retry(FailureKind::Unreachable, 2));
        assert!(!policy.should_retry(FailureKind::Timeout, 3));
        assert!(!policy.should_retry(FailureKind::BadResponse, 1));
        assert!(!policy.should_retry(FailureKind::ServiceError, 1));
    }

    #[tokio::test]
    async fn test_exhausts_exact_bound() {
        let policy = RetryPolicy::new(2, Duration::from_millis(1));
        let calls = Cell::new(0);

        let outcome = policy
            .run(ServiceKind::MarketData, &ticker(), || {
                calls.set(calls.get() + 1);
                async { ServiceOutcome::failure(FailureKind::Timeout, "deadline elapsed") }
            })
            .await;

        assert_eq!(calls.get(), 3);
        match outcome {
            ServiceOutcome::Failure(f) => {
                assert_eq!(f.kind, FailureKind::Timeout);
                assert_eq!(f.attempts, 3);
            }
            ServiceOutcome::Success(_) => panic!("expected failure"),
        }
    }

    #[tokio::test]
    async fn test_permanent_failure_not_retried() {
        let policy = RetryPolicy::new(2, Duration::from_millis(1));
        let calls = Cell::new(0);

        let outcome = policy
            .run(ServiceKind::Options, &ticker(), || {
                calls.set(calls.get() + 1);
                async { ServiceOutcome::failure(FailureKind::ServiceError, "no options data") }
            })
            .await;

        assert_eq!(calls.get(), 1);
        assert_eq!(outcome.failure_kind(), Some(FailureKind::ServiceError));
    }

    #[tokio::test]
    async fn test_custom_predicate() {
        let policy = RetryPolicy::new(1, Duration::ZERO).with_predicate(|k| k == FailureKind::BadResponse);
        let calls = Cell::new(0);

        policy
            .run(ServiceKind::Technical, &ticker(), || {
                calls.set(calls.get() + 1);
                async { ServiceOutcome::failure(FailureKind::BadResponse, "truncated") }
            })
            .await;

        assert_eq!(calls.get(), 2);
    }
}
