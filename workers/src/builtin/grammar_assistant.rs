//! Grammar assistant: mechanical correctness in spelling, punctuation,
//! and agreement. It does not rewrite for style.

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

pub struct GrammarAssistant {
    engine: WorkerEngine,
}

impl GrammarAssistant {
    pub fn new(backend: Arc<dyn GenerationBackend>, config: BackendConfig) -> Self {
        let metadata = WorkerMetadata {
            id: WorkerId::GrammarAssistant,
            name: "Grammar Assistant".into(),
            keywords: ["grammar", "spelling", "punctuation", "correct", "proofread"]
                .map(String::from)
                .to_vec(),
            supported_task_kinds: vec![TaskKind::Edit, TaskKind::Review],
            max_input_chars: 80_000,
            delegable: true,
            timeout_s: 30,
        };
        Self { engine: WorkerEngine::new(metadata, backend, config) }
    }

    fn build_prompt(input: &TaskInput) -> String {
        format!(
            "You are a proofreader. Correct grammar, spelling, and punctuation in \
             the following text. Do not alter style, structure, or meaning. Return \
             the complete corrected text.\n\n{}",
            working_text(input)
        )
    }
}

#[async_trait]
impl Worker for GrammarAssistant {
    fn metadata(&self) -> &WorkerMetadata {
        &self.engine.metadata
    }

    fn capabilities(&self) -> WorkerCapabilities {
        WorkerCapabilities {
            confidence_by_kind: [(TaskKind::Edit, 0.85), (TaskKind::Review, 0.8)]
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
        let expected = working_text(input).split_whitespace().count().max(20);
        let prompt = Self::build_prompt(input);
        self.engine
            .run_prompt(prompt, expected, OutputKind::Revision, &[], cancel)
            .await
    }

    fn health(&self) -> WorkerHealth {
        self.engine.health()
    }
}
