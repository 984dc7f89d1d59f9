//! Classified retry with exponential backoff and jitter.
//!
//! Only failures classified as transient are retried; a permanent failure
//! aborts immediately and is returned to the caller untouched.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use scriptorium_contracts::FailureClass;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{debug, warn};

/// Retry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry (ms).
    pub initial_delay_ms: u64,
    /// Ceiling on any single delay (ms).
    pub max_delay_ms: u64,
    /// Exponential backoff multiplier.
    pub backoff_multiplier: f64,
    /// Jitter fraction applied symmetrically (0.25 = +/-25%).
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 1_000,
            max_delay_ms: 30_000,
            backoff_multiplier: 2.0,
            jitter_factor: 0.25,
        }
    }
}

impl RetryConfig {
    /// Backoff delay before retry number `retry` (1-based), jittered.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1);
        let base = self.initial_delay_ms as f64 * self.backoff_multiplier.powi(exponent as i32);
        let capped = base.min(self.max_delay_ms as f64);
        let jittered = if self.jitter_factor > 0.0 {
            let spread = capped * self.jitter_factor;
            let offset = rand::thread_rng().gen_range(-spread..=spread);
            (capped + offset).max(0.0)
        } else {
            capped
        };
        Duration::from_millis(jittered as u64)
    }
}

/// How a retried operation concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryOutcome {
    /// Attempts actually made.
    pub attempts: u32,
}

/// Run `operation` until it succeeds, fails permanently, or exhausts
/// `config.max_attempts`. `classify` decides which errors are transient.
pub async fn retry_classified<F, Fut, T, E>(
    config: &RetryConfig,
    mut classify: impl FnMut(&E) -> FailureClass,
    mut operation: F,
) -> (Result<T, E>, RetryOutcome)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(attempt, "operation succeeded after retry");
                }
                return (Ok(value), RetryOutcome { attempts: attempt });
            }
            Err(err) => {
                let transient = classify(&err) == FailureClass::Transient;
                if !transient || attempt >= config.max_attempts {
                    if transient {
                        warn!(attempt, error = %err, "retries exhausted");
                    }
                    return (Err(err), RetryOutcome { attempts: attempt });
                }
                let delay = config.delay_for(attempt);
                debug!(attempt, delay_ms = delay.as_millis() as u64, error = %err, "transient failure, backing off");
                sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_config() -> RetryConfig {
        RetryConfig { initial_delay_ms: 1, max_delay_ms: 5, ..RetryConfig::default() }
    }

    #[derive(Debug)]
    struct Transient;
    impl std::fmt::Display for Transient {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "transient")
        }
    }

    #[tokio::test]
    async fn transient_failures_are_retried_to_success() {
        let counter = AtomicU32::new(0);
        let (result, outcome) = retry_classified(
            &fast_config(),
            |_: &Transient| FailureClass::Transient,
            || async {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(Transient)
                } else {
                    Ok(42)
                }
            },
        )
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(outcome.attempts, 3);
    }

    #[tokio::test]
    async fn permanent_failures_abort_on_first_attempt() {
        let counter = AtomicU32::new(0);
        let (result, outcome) = retry_classified(
            &fast_config(),
            |_: &Transient| FailureClass::Permanent,
            || async {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(Transient)
            },
        )
        .await;
        assert!(result.is_err());
        assert_eq!(outcome.attempts, 1);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn attempts_are_capped() {
        let (result, outcome) = retry_classified(
            &fast_config(),
            |_: &Transient| FailureClass::Transient,
            || async { Err::<u32, _>(Transient) },
        )
        .await;
        assert!(result.is_err());
        assert_eq!(outcome.attempts, 3);
    }

    #[test]
    fn delay_grows_exponentially_within_jitter() {
        let config = RetryConfig { jitter_factor: 0.0, ..RetryConfig::default() };
        assert_eq!(config.delay_for(1), Duration::from_millis(1_000));
        assert_eq!(config.delay_for(2), Duration::from_millis(2_000));
        assert_eq!(config.delay_for(3), Duration::from_millis(4_000));
    }

    #[test]
    fn delay_respects_ceiling() {
        let config = RetryConfig { jitter_factor: 0.0, ..RetryConfig::default() };
        assert_eq!(config.delay_for(10), Duration::from_millis(30_000));
    }
}
