//! Structure architect: organization, outlines, headings, and flow.

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

pub struct StructureArchitect {
    engine: WorkerEngine,
}

impl StructureArchitect {
    pub fn new(backend: Arc<dyn GenerationBackend>, config: BackendConfig) -> Self {
        let metadata = WorkerMetadata {
            id: WorkerId::StructureArchitect,
            name: "Structure Architect".into(),
            keywords: ["structure", "organize", "outline", "format", "layout"]
                .map(String::from)
                .to_vec(),
            supported_task_kinds: vec![TaskKind::Format, TaskKind::Edit, TaskKind::Create],
            max_input_chars: 100_000,
            delegable: true,
            timeout_s: 30,
        };
        Self { engine: WorkerEngine::new(metadata, backend, config) }
    }

    fn build_prompt(input: &TaskInput) -> String {
        format!(
            "You are a document architect. {}\n\nReorganize the following text for \
             logical flow: group related material, add headings where the length \
             warrants them, and balance paragraph sizes. Return the complete \
             restructured text.\n\n{}",
            audience_clause(input),
            working_text(input)
        )
    }
}

#[async_trait]
impl Worker for StructureArchitect {
    fn metadata(&self) -> &WorkerMetadata {
        &self.engine.metadata
    }

    fn capabilities(&self) -> WorkerCapabilities {
        WorkerCapabilities {
            confidence_by_kind: [(TaskKind::Format, 0.9), (TaskKind::Edit, 0.6)]
                .into_iter()
                .collect(),
            audiences: vec!["general".into(), "professional".into()],
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
