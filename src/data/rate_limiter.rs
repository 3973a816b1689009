use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Shared request budget: at most `limit` weight per rolling `window`.
/// Cloning shares the budget.
#[derive(Clone)]
pub struct GlobalRateLimiter {
    inner: Arc<Mutex<InnerLimiter>>,
}

struct InnerLimiter {
    used_weight: u32,
    window_started: Instant,
    window: Duration,
    limit: u32,
}

impl GlobalRateLimiter {
    pub fn per_minute(limit: u32) -> Self {
        Self::new(limit, Duration::from_secs(60))
    }

    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(InnerLimiter {
                used_weight: 0,
                window_started: Instant::now(),
                window,
                limit: limit.max(1),
            })),
        }
    }

    /// Waits until `cost` weight fits in the current window, then spends it.
    pub async fn acquire(&self, cost: u32, context: &str) {
        loop {
            let (wait_duration, stats) = {
                let mut guard = self.inner.lock().await;
                let now = Instant::now();

                if now.duration_since(guard.window_started) >= guard.window {
                    guard.used_weight = 0;
                    guard.window_started = now;
                }

                // A single oversized request still goes through once the window is fresh.
                if guard.used_weight + cost <= guard.limit || guard.used_weight == 0 {
                    guard.used_weight += cost;
                    return;
                }

                let wait = (guard.window_started + guard.window).saturating_duration_since(now)
                    + Duration::from_millis(10);
                (wait, (guard.used_weight, guard.limit))
            };

            log::debug!(
                "Request budget saturated for [{}]. Used: {}/{}. Waiting {:.1}s...",
                context,
                stats.0,
                stats.1,
                wait_duration.as_secs_f64()
            );

            tokio::time::sleep(wait_duration).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_acquire_within_budget_does_not_wait() {
        let limiter = GlobalRateLimiter::new(3, Duration::from_secs(60));
        let start = Instant::now();
        for _ in 0..3 {
            limiter.acquire(1, "test").await;
        }
        assert!(start.elapsed() < Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_acquire_waits_for_next_window() {
        let limiter = GlobalRateLimiter::new(1, Duration::from_millis(50));
        let start = Instant::now();
        limiter.acquire(1, "test").await;
        limiter.acquire(1, "test").await;
        assert!(start.elapsed() >= Duration::from_millis(50));
    }
}
