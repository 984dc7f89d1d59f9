//! Creative enhancer: imagery, variety, and narrative energy.

use std::sync::Arc;

use async_trait::async_trait;
use scriptorium_backend::GenerationBackend;
use scriptorium_config::BackendConfig;
use scriptorium_contracts::{OutputKind, TaskInput, TaskKind, TaskResult, WorkerId};
use tokio_util::sync::CancellationToken;

use crate::builtin::{audience_clause, working_text};
use crate::engine::WorkerEngine;
use crate::error::WorkerError;
use crate::traits::{Worker, WorkerCapabilities, WorkerHealth, WorkerMetadata};

pub struct CreativeEnhancer {
    engine: WorkerEngine,
}

impl CreativeEnhancer {
    pub fn new(backend: Arc<dyn GenerationBackend>, config: BackendConfig) -> Self {
        let metadata = WorkerMetadata {
            id: WorkerId::CreativeEnhancer,
            name: "Creative Enhancer".into(),
            keywords: ["creative", "imagination", "innovative", "unique", "original"]
                .map(String::from)
                .to_vec(),
            supported_task_kinds: vec![TaskKind::Create, TaskKind::Edit],
            max_input_chars: 80_000,
            delegable: true,
            timeout_s: 30,
        };
        Self { engine: WorkerEngine::new(metadata, backend, config) }
    }

    fn build_prompt(input: &TaskInput) -> String {
        format!(
            "You are a creative editor. {}\n\nHeighten the following text: sharpen \
             imagery, vary sentence rhythm, and strengthen openings and closings \
             while keeping every fact intact. Return the complete revised \
             text.\n\n{}",
            audience_clause(input),
            working_text(input)
        )
    }
}

#[async_trait]
impl Worker for CreativeEnhancer {
    fn metadata(&self) -> &WorkerMetadata {
        &self.engine.metadata
    }

    fn capabilities(&self) -> WorkerCapabilities {
        WorkerCapabilities {
            confidence_by_kind: [(TaskKind::Create, 0.8), (TaskKind::Edit, 0.7)]
                .into_iter()
                .collect(),
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
        let expected = working_text(input).split_whitespace().count().max(50);
        let prompt = Self::build_prompt(input);
        self.engine
            .run_prompt(prompt, expected, OutputKind::Revision, &[], cancel)
            .await
    }

    fn health(&self) -> WorkerHealth {
        self.engine.health()
    }
}
