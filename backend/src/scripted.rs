//! Scripted backend for tests.
//!
//! Responses are served from substring-matched rules first, then a FIFO
//! queue, then a default. Every call is recorded so tests can assert on
//! call counts and prompt contents.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::BackendError;
use crate::types::{GenerationRequest, GenerationResponse};
use crate::GenerationBackend;

type Scripted = Result<String, BackendError>;

#[derive(Default)]
struct Script {
    rules: Vec<(String, Scripted)>,
    queue: VecDeque<Scripted>,
    default_response: Option<String>,
}

/// Test backend with scripted responses and call accounting.
#[derive(Default)]
pub struct ScriptedBackend {
    script: Mutex<Script>,
    calls: AtomicU64,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `response` whenever the prompt contains `needle`. Rules are
    /// checked in insertion order before the queue.
    pub fn rule(self, needle: impl Into<String>, response: impl Into<String>) -> Self {
        self.script
            .lock()
            .rules
            .push((needle.into(), Ok(response.into())));
        self
    }

    /// Fail with `error` whenever the prompt contains `needle`.
    pub fn rule_error(self, needle: impl Into<String>, error: BackendError) -> Self {
        self.script.lock().rules.push((needle.into(), Err(error)));
        self
    }

    /// Queue a one-shot response served after all rules miss.
    pub fn push(self, response: impl Into<String>) -> Self {
        self.script.lock().queue.push_back(Ok(response.into()));
        self
    }

    /// Queue a one-shot error.
    pub fn push_error(self, error: BackendError) -> Self {
        self.script.lock().queue.push_back(Err(error));
        self
    }

    /// Response served when rules miss and the queue is empty.
    pub fn with_default(self, response: impl Into<String>) -> Self {
        self.script.lock().default_response = Some(response.into());
        self
    }

    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    /// Number of recorded prompts containing `needle`.
    pub fn calls_matching(&self, needle: &str) -> usize {
        self.prompts.lock().iter().filter(|p| p.contains(needle)).count()
    }
}

#[async_trait]
impl GenerationBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().push(request.prompt.clone());

        let mut script = self.script.lock();
        for (needle, scripted) in &script.rules {
            if request.prompt.contains(needle.as_str()) {
                return scripted.clone().map(GenerationResponse::stopped);
            }
        }
        if let Some(scripted) = script.queue.pop_front() {
            return scripted.map(GenerationResponse::stopped);
        }
        match &script.default_response {
            Some(text) => Ok(GenerationResponse::stopped(text.clone())),
            None => Err(BackendError::Network("scripted backend exhausted".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rules_take_precedence_over_queue() {
        let backend = ScriptedBackend::new()
            .rule("fact-check", "verified")
            .push("queued");
        let r = backend
            .generate(GenerationRequest::new("please fact-check this claim"))
            .await
            .unwrap();
        assert_eq!(r.content, "verified");
        let r = backend
            .generate(GenerationRequest::new("anything else"))
            .await
            .unwrap();
        assert_eq!(r.content, "queued");
        assert_eq!(backend.call_count(), 2);
    }

    #[tokio::test]
    async fn exhausted_backend_errors() {
        let backend = ScriptedBackend::new();
        let err = backend
            .generate(GenerationRequest::new("hello"))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Network(_)));
    }
}
