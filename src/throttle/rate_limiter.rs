use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::{DefaultDirectRateLimiter, Quota};
use parking_lot::Mutex;
use tracing::debug;

struct Installed {
    per_second: u32,
    limiter: Arc<DefaultDirectRateLimiter>,
}

/// A reconfigurable, cooperative throttle.
///
/// Holders call [`RateLimiter::acquire`] wherever work should be paced. The limiter
/// has no burst slack: after the first permit, each further permit is granted no
/// sooner than `1 / per_second` after the previous one.
pub struct RateLimiter {
    current: Mutex<Option<Installed>>,
}

impl RateLimiter {
    /// Create a limiter; `0` leaves it disabled.
    pub fn new(per_second: u32) -> Self {
        let limiter = Self {
            current: Mutex::new(None),
        };
        limiter.set_rate(per_second);
        limiter
    }

    pub fn disabled() -> Self {
        Self::new(0)
    }

    /// Replace the active limiter. Acquisitions issued after this returns use the
    /// new rate; `0` disables throttling.
    pub fn set_rate(&self, per_second: u32) {
        let next = NonZeroU32::new(per_second).map(|rate| Installed {
            per_second,
            limiter: Arc::new(governor::RateLimiter::direct(quota_without_slack(rate))),
        });

        *self.current.lock() = next;
        debug!("Rate limit set to {} permits/sec", per_second);
    }

    /// Wait until a permit is available. Returns immediately when disabled.
    pub async fn acquire(&self) {
        // Never hold the lock across the wait.
        let limiter = self.current.lock().as_ref().map(|i| i.limiter.clone());

        if let Some(limiter) = limiter {
            limiter.until_ready().await;
        }
    }

    /// Permits per second currently configured, `None` when disabled.
    pub fn rate(&self) -> Option<u32> {
        self.current.lock().as_ref().map(|i| i.per_second)
    }

    pub fn is_enabled(&self) -> bool {
        self.current.lock().is_some()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::disabled()
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("per_second", &self.rate())
            .finish()
    }
}

/// One cell replenished every `1/rate` seconds with a burst of one.
fn quota_without_slack(rate: NonZeroU32) -> Quota {
    let period = Duration::from_secs(1) / rate.get();
    Quota::with_period(period)
        .unwrap_or_else(|| Quota::per_second(rate).allow_burst(NonZeroU32::MIN))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_rate_limiter_disabled() {
        let limiter = RateLimiter::disabled();
        assert!(!limiter.is_enabled());
        assert!(limiter.rate().is_none());
    }

    #[test]
    fn test_rate_limiter_reconfigure() {
        let limiter = RateLimiter::new(10);
        assert_eq!(limiter.rate(), Some(10));

        limiter.set_rate(3);
        assert_eq!(limiter.rate(), Some(3));

        limiter.set_rate(0);
        assert!(!limiter.is_enabled());
    }

    #[test]
    fn test_rate_limiter_debug() {
        let limiter = RateLimiter::new(5);
        let debug = format!("{:?}", limiter);
        assert!(debug.contains("RateLimiter"));
        assert!(debug.contains('5'));
    }

    #[test]
    fn test_quota_huge_rate() {
        // Periods below one nanosecond fall back to a per-second quota.
        let quota = quota_without_slack(NonZeroU32::MAX);
        assert_eq!(quota.burst_size(), NonZeroU32::MIN);
    }

    #[tokio::test]
    async fn test_acquire_disabled_is_immediate() {
        let limiter = RateLimiter::disabled();
        let start = Instant::now();
        for _ in 0..100 {
            limiter.acquire().await;
        }
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_acquire_spaces_permits() {
        let limiter = RateLimiter::new(10);

        // The first permit is free.
        limiter.acquire().await;
        let start = Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;

        assert!(start.elapsed() >= Duration::from_millis(180));
    }

    #[tokio::test]
    async fn test_disable_releases_throttle() {
        let limiter = RateLimiter::new(1);
        limiter.acquire().await;

        limiter.set_rate(0);
        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() < Duration::from_millis(500));
    }
}
