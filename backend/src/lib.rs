//! Generation backend abstraction.
//!
//! Every component that needs text generation (workers, router analysis,
//! guardrail verification) goes through the single [`GenerationBackend`]
//! trait. The real model provider lives outside this workspace; what ships
//! here are the contract, the failure classification rules, and two offline
//! implementations used by the CLI and the test suites.

pub mod error;
pub mod limited;
pub mod scripted;
pub mod statics;
pub mod types;

pub use error::BackendError;
pub use limited::RateLimitedBackend;
pub use scripted::ScriptedBackend;
pub use statics::StaticBackend;
pub use types::{FinishReason, GenerationRequest, GenerationResponse, TokenUsage};

use async_trait::async_trait;

/// Single request/response surface for text generation.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Human-readable backend name for logs and metrics.
    fn name(&self) -> &str;

    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, BackendError>;
}
