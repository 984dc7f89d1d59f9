//! Token-bucket rate limiter for the shared generation backend.

use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::time::{sleep, Instant};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimiterConfig {
    /// Bucket capacity; also the initial fill.
    pub burst: u32,
    /// Tokens replenished per second.
    pub refill_per_s: f64,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self { burst: 10, refill_per_s: 5.0 }
    }
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

/// Token bucket. `acquire` suspends until a token is available, so callers
/// never busy-wait on the backend.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimiterConfig,
    state: Mutex<BucketState>,
}

impl RateLimiter {
    pub fn new(config: RateLimiterConfig) -> Self {
        let state = BucketState { tokens: config.burst as f64, last_refill: Instant::now() };
        Self { config, state: Mutex::new(state) }
    }

    /// Take one token, waiting for refill if the bucket is empty.
    pub async fn acquire(&self) {
        loop {
            match self.try_take() {
                Ok(()) => return,
                Err(wait) => sleep(wait).await,
            }
        }
    }

    /// Take one token without waiting.
    pub fn try_acquire(&self) -> bool {
        self.try_take().is_ok()
    }

    fn try_take(&self) -> Result<(), Duration> {
        let mut state = self.state.lock();
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.tokens =
            (state.tokens + elapsed * self.config.refill_per_s).min(self.config.burst as f64);
        state.last_refill = now;
        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            Ok(())
        } else {
            let deficit = 1.0 - state.tokens;
            Err(Duration::from_secs_f64(deficit / self.config.refill_per_s.max(0.001)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn burst_is_available_immediately() {
        let limiter = RateLimiter::new(RateLimiterConfig { burst: 3, refill_per_s: 1.0 });
        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
    }

    #[tokio::test]
    async fn tokens_refill_over_time() {
        tokio::time::pause();
        let limiter = RateLimiter::new(RateLimiterConfig { burst: 1, refill_per_s: 10.0 });
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
        tokio::time::advance(Duration::from_millis(150)).await;
        assert!(limiter.try_acquire());
    }
}
