//! Technical writer: documentation, manuals, and instructional text.

use std::sync::Arc;

use async_trait::async_trait;
use scriptorium_backend::GenerationBackend;
use scriptorium_config::BackendConfig;
use scriptorium_contracts::{OutputKind, TaskInput, TaskKind, TaskResult, WorkerId};
use tokio_util::sync::CancellationToken;

use crate::builtin::{audience_clause, expected_words};
use crate::engine::WorkerEngine;
use crate::error::WorkerError;
use crate::traits::{Worker, WorkerCapabilities, WorkerHealth, WorkerMetadata};

pub struct TechnicalWriter {
    engine: WorkerEngine,
}

impl TechnicalWriter {
    pub fn new(backend: Arc<dyn GenerationBackend>, config: BackendConfig) -> Self {
        let metadata = WorkerMetadata {
            id: WorkerId::TechnicalWriter,
            name: "Technical Writer".into(),
            keywords: ["technical", "documentation", "manual", "guide", "instructions"]
                .map(String::from)
                .to_vec(),
            supported_task_kinds: vec![TaskKind::Create, TaskKind::Edit, TaskKind::Format],
            max_input_chars: 100_000,
            delegable: true,
            timeout_s: 45,
        };
        Self { engine: WorkerEngine::new(metadata, backend, config) }
    }

    fn build_prompt(input: &TaskInput) -> String {
        let mut prompt = format!(
            "You are a technical writer. {}\n\nAssignment: {}\n\nWrite precise, \
             well-organized technical prose: define terms on first use, prefer \
             numbered steps for procedures, and keep one idea per paragraph.",
            audience_clause(input),
            input.description
        );
        if let Some(context) = &input.context {
            prompt.push_str(&format!("\n\nSource material:\n{context}"));
        }
        for upstream in &input.upstream {
            prompt.push_str(&format!(
                "\n\nDraft from {}:\n{}",
                upstream.worker, upstream.content
            ));
        }
        prompt.push_str("\n\nReturn only the finished document.");
        prompt
    }
}

#[async_trait]
impl Worker for TechnicalWriter {
    fn metadata(&self) -> &WorkerMetadata {
        &self.engine.metadata
    }

    fn capabilities(&self) -> WorkerCapabilities {
        WorkerCapabilities {
            confidence_by_kind: [
                (TaskKind::Create, 0.85),
                (TaskKind::Edit, 0.7),
                (TaskKind::Format, 0.7),
            ]
            .into_iter()
            .collect(),
            audiences: vec!["professional".into(), "expert".into()],
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
            .run_prompt(prompt, expected_words(input), OutputKind::Revision, &[], cancel)
            .await
    }

    fn health(&self) -> WorkerHealth {
        self.engine.health()
    }
}
