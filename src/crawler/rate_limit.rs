//! Per-host request pacing
//!
//! A [`RateLimiter`] spaces requests to a single host at least `1 / rps`
//! seconds apart. The [`Fetcher`](super::Fetcher) keeps one limiter per
//! host and calls [`RateLimiter::acquire`] before every request attempt.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Interval gate for requests to one host
#[derive(Debug)]
pub struct RateLimiter {
    /// Minimum spacing between requests, `None` when throttling is disabled
    interval: Option<Duration>,

    /// Earliest instant at which the next request may be issued
    next_allowed: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Creates a limiter for the given requests-per-second ceiling
    ///
    /// A ceiling that is zero, negative or not finite disables throttling.
    ///
    /// # Example
    ///
    /// ```
    /// use seed_collector::RateLimiter;
    ///
    /// let limiter = RateLimiter::new(2.0);
    /// assert!(limiter.is_enabled());
    /// assert!(!RateLimiter::new(0.0).is_enabled());
    /// ```
    pub fn new(rps: f64) -> Self {
        let interval = (rps.is_finite() && rps > 0.0).then(|| Duration::from_secs_f64(1.0 / rps));

        Self {
            interval,
            next_allowed: Mutex::new(None),
        }
    }

    /// Returns true if this limiter actually throttles
    pub fn is_enabled(&self) -> bool {
        self.interval.is_some()
    }

    /// Waits until one more request may be issued to this host
    ///
    /// The lock is held across the wait, so concurrent callers are released
    /// one interval apart. The order among waiters follows the lock's queue
    /// and is not otherwise guaranteed.
    pub async fn acquire(&self) {
        let Some(interval) = self.interval else {
            return;
        };

        let mut next_allowed = self.next_allowed.lock().await;

        let now = Instant::now();
        if let Some(at) = *next_allowed {
            if now < at {
                tokio::time::sleep_until(at).await;
            }
        }

        let base = match *next_allowed {
            Some(at) if at > now => at,
            _ => now,
        };
        *next_allowed = Some(base + interval);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_disabled_limiter_never_waits() {
        let limiter = RateLimiter::new(0.0);
        let start = std::time::Instant::now();
        for _ in 0..50 {
            limiter.acquire().await;
        }
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[test]
    fn test_negative_and_nan_rates_disable() {
        assert!(!RateLimiter::new(-1.0).is_enabled());
        assert!(!RateLimiter::new(f64::NAN).is_enabled());
        assert!(!RateLimiter::new(f64::INFINITY).is_enabled());
    }

    #[tokio::test]
    async fn test_sequential_acquires_respect_rate() {
        let limiter = RateLimiter::new(10.0);
        let start = std::time::Instant::now();
        for _ in 0..4 {
            limiter.acquire().await;
        }
        // 4 acquires at 10 rps: at least 3 intervals of 100ms
        assert!(start.elapsed() >= Duration::from_millis(300));
    }

    #[tokio::test]
    async fn test_first_acquire_is_immediate() {
        let limiter = RateLimiter::new(1.0);
        let start = std::time::Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() < Duration::from_millis(200));
    }

    #[tokio::test]
    async fn test_concurrent_acquires_respect_rate() {
        let limiter = Arc::new(RateLimiter::new(20.0));
        let start = std::time::Instant::now();

        let mut handles = Vec::new();
        for _ in 0..5 {
            let limiter = Arc::clone(&limiter);
            handles.push(tokio::spawn(async move { limiter.acquire().await }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // 5 acquires at 20 rps: at least 4 intervals of 50ms
        assert!(start.elapsed() >= Duration::from_millis(200));
    }
}
