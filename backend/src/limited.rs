//! Token-bucket wrapper around a generation backend.
//!
//! The backend is a shared, rate-limited resource; wrapping it once at
//! wiring time means every caller (workers, router analysis, guardrail
//! verification) acquires a token before generating.

use std::sync::Arc;

use async_trait::async_trait;
use scriptorium_resilience::{RateLimiter, RateLimiterConfig};

use crate::error::BackendError;
use crate::types::{GenerationRequest, GenerationResponse};
use crate::GenerationBackend;

pub struct RateLimitedBackend {
    inner: Arc<dyn GenerationBackend>,
    limiter: RateLimiter,
}

impl RateLimitedBackend {
    pub fn new(inner: Arc<dyn GenerationBackend>, config: RateLimiterConfig) -> Self {
        Self { inner, limiter: RateLimiter::new(config) }
    }
}

#[async_trait]
impl GenerationBackend for RateLimitedBackend {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, BackendError> {
        self.limiter.acquire().await;
        self.inner.generate(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ScriptedBackend;

    #[tokio::test]
    async fn calls_pass_through_within_burst() {
        let backend = RateLimitedBackend::new(
            Arc::new(ScriptedBackend::new().with_default("ok")),
            RateLimiterConfig { burst: 2, refill_per_s: 100.0 },
        );
        let r = backend.generate(GenerationRequest::new("hi")).await.unwrap();
        assert_eq!(r.content, "ok");
    }
}
