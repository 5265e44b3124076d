//! Minimum-interval rate limiter shared by all callers of one service

use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

/// Spaces requests at least `min_interval` apart
///
/// The last request time is the only mutable state; callers queue on the
/// mutex and sleep while holding it, so concurrent callers are serialized.
#[derive(Debug)]
pub struct RateLimiter {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    /// Create a limiter with a minimum interval between requests
    pub fn new(min_interval: Duration) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_interval,
        }
    }

    /// Limiter allowing `per_second` requests per second
    pub fn per_second(per_second: u32) -> Self {
        Self::new(Duration::from_secs(1) / per_second.max(1))
    }

    /// Configured minimum interval
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Hold the caller until its request slot opens; returns the delay
    pub async fn wait(&self) -> Duration {
        let mut slot = self.last_request.lock().await;

        let delay = slot
            .map(|previous| self.min_interval.saturating_sub(previous.elapsed()))
            .unwrap_or_default();
        if !delay.is_zero() {
            debug!("Chemical database request held back {} ms", delay.as_millis());
            tokio::time::sleep(delay).await;
        }

        *slot = Some(Instant::now());
        delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_first_call_does_not_wait() {
        let limiter = RateLimiter::new(Duration::from_secs(5));
        let start = Instant::now();
        assert_eq!(limiter.wait().await, Duration::ZERO);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_spacing_between_calls() {
        let limiter = RateLimiter::new(Duration::from_millis(50));
        let start = Instant::now();
        for _ in 0..3 {
            limiter.wait().await;
        }
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_shared_between_tasks() {
        let limiter = Arc::new(RateLimiter::new(Duration::from_millis(40)));
        let start = Instant::now();

        let mut handles = Vec::new();
        for _ in 0..3 {
            let limiter = Arc::clone(&limiter);
            handles.push(tokio::spawn(async move { limiter.wait().await }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert!(start.elapsed() >= Duration::from_millis(80));
    }

    #[test]
    fn test_per_second() {
        assert_eq!(RateLimiter::per_second(5).min_interval(), Duration::from_millis(200));
        assert_eq!(RateLimiter::per_second(0).min_interval(), Duration::from_secs(1));
    }
}
