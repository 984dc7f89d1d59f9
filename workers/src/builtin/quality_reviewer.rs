//! Quality reviewer: the final-pass review task appended to risky
//! workflows. Produces an assessment, never a rewrite.

use std::sync::Arc;

use async_trait::async_trait;
use scriptorium_backend::GenerationBackend;
use scriptorium_config::BackendConfig;
use scriptorium_contracts::{OutputKind, TaskInput, TaskKind, TaskResult, WorkerId};
use tokio_util::sync::CancellationToken;

use crate::builtin::working_text;
use crate::engine::WorkerEngine;
use crate::error::WorkerError;
use crate::traits::{Worker, WorkerCapabilities, WorkerHealth, WorkerMetadata};

pub struct QualityReviewer {
    engine: WorkerEngine,
}

impl QualityReviewer {
    pub fn new(backend: Arc<dyn GenerationBackend>, config: BackendConfig) -> Self {
        let metadata = WorkerMetadata {
            id: WorkerId::QualityReviewer,
            name: "Quality Reviewer".into(),
            keywords: ["review", "verify", "assess", "evaluate", "quality"]
                .map(String::from)
                .to_vec(),
            supported_task_kinds: vec![],
            max_input_chars: 120_000,
            delegable: true,
            timeout_s: 30,
        };
        Self { engine: WorkerEngine::new(metadata, backend, config) }
    }

    fn build_prompt(input: &TaskInput) -> String {
        format!(
            "You are a quality reviewer performing a final pass. Assess the \
             following text for correctness, completeness against the assignment, \
             and consistency. List concrete findings, most important first, and \
             end with an overall verdict line.\n\nAssignment: {}\n\nText under \
             review:\n{}",
            input.description,
            working_text(input)
        )
    }
}

#[async_trait]
impl Worker for QualityReviewer {
    fn metadata(&self) -> &WorkerMetadata {
        &self.engine.metadata
    }

    fn capabilities(&self) -> WorkerCapabilities {
        WorkerCapabilities {
            confidence_by_kind: [(TaskKind::Review, 0.9)].into_iter().collect(),
            audiences: vec!["general".into()],
            languages: vec!["en".into()],
            collaboration_ready: true,
        }
    }

    async fn execute(
        &self,
        input: &TaskInput,
        cancel: CancellationToken,
    ) -> Result<TaskResult, WorkerError> {
        self.can_handle(input)?;
        let prompt = Self::build_prompt(input);
        self.engine
            .run_prompt(prompt, 150, OutputKind::Report, &["verdict"], cancel)
            .await
    }

    fn health(&self) -> WorkerHealth {
        self.engine.health()
    }
}
