//! Shared execution core for the built-in workers.
//!
//! Handles the common lifecycle: timing, the single backend call with
//! cancellation honored at the suspension point, confidence scoring, and
//! performance-counter updates.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use scriptorium_backend::{FinishReason, GenerationBackend, GenerationRequest};
use scriptorium_config::BackendConfig;
use scriptorium_contracts::{OutputKind, TaskResult};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::confidence::{self, ConfidenceSignals};
use crate::error::WorkerError;
use crate::stats::WorkerTracker;
use crate::traits::{WorkerHealth, WorkerMetadata};

/// Execution core embedded by every built-in worker.
pub struct WorkerEngine {
    pub metadata: WorkerMetadata,
    backend: Arc<dyn GenerationBackend>,
    backend_config: BackendConfig,
    tracker: WorkerTracker,
}

impl WorkerEngine {
    pub fn new(
        metadata: WorkerMetadata,
        backend: Arc<dyn GenerationBackend>,
        backend_config: BackendConfig,
    ) -> Self {
        Self { metadata, backend, backend_config, tracker: WorkerTracker::new() }
    }

    pub fn tracker(&self) -> &WorkerTracker {
        &self.tracker
    }

    pub fn health(&self) -> WorkerHealth {
        let rate = self.tracker.recent_success_rate();
        let mut issues = Vec::new();
        if rate < 0.5 {
            issues.push(format!("recent success rate {rate:.2} below 0.5"));
        }
        WorkerHealth { healthy: issues.is_empty(), issues, recent_success_rate: rate }
    }

    /// Make the single generation call and assemble a task result.
    ///
    /// `expected_words` anchors the length signal of the confidence score;
    /// `coverage_keywords` are instruction terms the output should reflect.
    pub async fn run_prompt(
        &self,
        prompt: String,
        expected_words: usize,
        output_kind: OutputKind,
        coverage_keywords: &[&str],
        cancel: CancellationToken,
    ) -> Result<TaskResult, WorkerError> {
        let started = Instant::now();
        let request = GenerationRequest::new(prompt)
            .with_max_tokens(self.backend_config.max_tokens)
            .with_temperature(self.backend_config.temperature)
            .with_timeout(Duration::from_secs(self.backend_config.timeout_s));

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(worker = %self.metadata.id, "cancelled before generation finished");
                return Err(WorkerError::Cancelled);
            }
            result = self.backend.generate(request) => {
                match result {
                    Ok(response) => response,
                    Err(err) => {
                        self.tracker.record_failure(started.elapsed().as_secs_f64());
                        return Err(WorkerError::Backend(err));
                    }
                }
            }
        };

        let elapsed = started.elapsed().as_secs_f64();
        let word_count = response.content.split_whitespace().count();
        let signals = ConfidenceSignals {
            finished_cleanly: response.finish_reason == FinishReason::Stop,
            length_ratio: word_count as f64 / expected_words.max(1) as f64,
            keyword_coverage: confidence::keyword_coverage(&response.content, coverage_keywords),
        };
        let confidence = confidence::score(signals);
        self.tracker.record_success(elapsed, confidence);

        let mut metadata = HashMap::new();
        metadata.insert("word_count".to_string(), serde_json::json!(word_count));
        metadata.insert("worker".to_string(), serde_json::json!(self.metadata.id.as_str()));

        Ok(TaskResult {
            content: response.content,
            output_kind,
            metadata,
            confidence,
            processing_time_s: elapsed,
        })
    }
}
