//! Batch-wide concurrency limiter.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Default number of service calls allowed in flight at once.
pub const DEFAULT_CEILING: usize = 8;

/// The limiter was closed while a caller waited for a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimiterClosed;

impl fmt::Display for LimiterClosed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("rate limiter closed")
    }
}

impl std::error::Error for LimiterClosed {}

struct Inner {
    semaphore: Arc<Semaphore>,
    ceiling: usize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

/// Shared slot pool capping in-flight service calls across a whole batch.
///
/// Created once per batch run and cloned into every call site. There are
/// no per-service limits: every call draws from the same pool.
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<Inner>,
}

impl RateLimiter {
    /// Create a limiter. A ceiling of zero is raised to one.
    pub fn new(ceiling: usize) -> Self {
        let ceiling = ceiling.max(1);
        Self {
            inner: Arc::new(Inner {
                semaphore: Arc::new(Semaphore::new(ceiling)),
                ceiling,
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }),
        }
    }

    /// Wait for a free slot. The slot is returned to the pool when dropped.
    pub async fn acquire(&self) -> Result<Slot, LimiterClosed> {
        let permit = Arc::clone(&self.inner.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| LimiterClosed)?;

        let now = self.inner.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.peak.fetch_max(now, Ordering::SeqCst);

        Ok(Slot {
            _permit: permit,
            inner: Arc::clone(&self.inner),
        })
    }

    /// Refuse all further acquisitions and wake current waiters.
    pub fn close(&self) {
        self.inner.semaphore.close();
    }

    pub fn ceiling(&self) -> usize {
        self.inner.ceiling
    }

    /// Slots currently held.
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.load(Ordering::SeqCst)
    }

    /// Most slots ever held at once.
    pub fn peak(&self) -> usize {
        self.inner.peak.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("ceiling", &self.ceiling())
            .field("in_flight", &self.in_flight())
            .field("peak", &self.peak())
            .finish()
    }
}

/// One held unit of the limiter's budget.
pub struct Slot {
    _permit: OwnedSemaphorePermit,
    inner: Arc<Inner>,
}

impl Drop for Slot {
    fn drop(&mut self) {
        self.inner.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_slots_released_on_drop() {
        let limiter = RateLimiter::new(2);
        let a = limiter.acquire().await.unwrap();
        let b = limiter.acquire().await.unwrap();
        assert_eq!(limiter.in_flight(), 2);

        drop(a);
        assert_eq!(limiter.in_flight(), 1);
        drop(b);
        assert_eq!(limiter.in_flight(), 0);
        assert_eq!(limiter.peak(), 2);
    }

    #[tokio::test]
    async fn test_never_exceeds_ceiling() {
        let limiter = RateLimiter::new(3);
        let mut handles = Vec::new();
        for _ in 0..20 {
            let limiter = limiter.clone();
            handles.push(tokio::spawn(async move {
                let _slot = limiter.acquire().await.unwrap();
                assert!(limiter.in_flight() <= 3);
                tokio::time::sleep(Duration::from_millis(5)).await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(limiter.peak(), 3);
        assert_eq!(limiter.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_waiter_blocks_until_release() {
        let limiter = RateLimiter::new(1);
        let held = limiter.acquire().await.unwrap();

        let waiting = tokio::time::timeout(Duration::from_millis(20), limiter.acquire()).await;
        assert!(waiting.is_err());

        drop(held);
        let granted = tokio::time::timeout(Duration::from_millis(20), limiter.acquire()).await;
        assert!(granted.is_ok());
    }

    #[tokio::test]
    async fn test_closed_limiter_rejects() {
        let limiter = RateLimiter::new(1);
        limiter.close();
        assert_eq!(limiter.acquire().await.err(), Some(LimiterClosed));
    }

    #[test]
    fn test_zero_ceiling_is_raised() {
        assert_eq!(RateLimiter::new(0).ceiling(), 1);
    }
}
