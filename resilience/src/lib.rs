//! Resilience primitives shared by everything that talks to the
//! generation backend: classified retry with exponential backoff, and a
//! token-bucket rate limiter.

pub mod limiter;
pub mod retry;

pub use limiter::{RateLimiter, RateLimiterConfig};
pub use retry::{retry_classified, RetryConfig, RetryOutcome};
