//! Research assistant: gathers supporting facts and sources. Its output is
//! attached as notes rather than replacing the draft.

use std::sync::Arc;

use async_trait::async_trait;
use scriptorium_backend::GenerationBackend;
use scriptorium_config::BackendConfig;
use scriptorium_contracts::{OutputKind, TaskInput, TaskKind, TaskResult, WorkerId};
use tokio_util::sync::CancellationToken;

use crate::engine::WorkerEngine;
use crate::error::WorkerError;
use crate::traits::{Worker, WorkerCapabilities, WorkerHealth, WorkerMetadata};

pub struct ResearchAssistant {
    engine: WorkerEngine,
}

impl ResearchAssistant {
    pub fn new(backend: Arc<dyn GenerationBackend>, config: BackendConfig) -> Self {
        let metadata = WorkerMetadata {
            id: WorkerId::ResearchAssistant,
            name: "Research Assistant".into(),
            keywords: ["research", "find", "investigate", "fact-check", "sources"]
                .map(String::from)
                .to_vec(),
            supported_task_kinds: vec![TaskKind::Research, TaskKind::Review],
            max_input_chars: 60_000,
            delegable: true,
            timeout_s: 45,
        };
        Self { engine: WorkerEngine::new(metadata, backend, config) }
    }

    fn build_prompt(input: &TaskInput) -> String {
        let mut prompt = format!(
            "You are a research assistant. Gather verifiable facts, figures, and \
             sources relevant to the assignment below. Present findings as concise \
             notes with one claim per line and a source attribution where known.\n\n\
             Assignment: {}\n",
            input.description
        );
        if let Some(context) = &input.context {
            prompt.push_str(&format!("\nContext:\n{context}\n"));
        }
        prompt
    }
}

#[async_trait]
impl Worker for ResearchAssistant {
    fn metadata(&self) -> &WorkerMetadata {
        &self.engine.metadata
    }

    fn capabilities(&self) -> WorkerCapabilities {
        WorkerCapabilities {
            confidence_by_kind: [(TaskKind::Research, 0.9), (TaskKind::Review, 0.6)]
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
        let prompt = Self::build_prompt(input);
        self.engine
            .run_prompt(prompt, 200, OutputKind::Notes, &["source"], cancel)
            .await
    }

    fn health(&self) -> WorkerHealth {
        self.engine.health()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scriptorium_backend::ScriptedBackend;

    #[tokio::test]
    async fn research_output_is_notes() {
        let worker = ResearchAssistant::new(
            Arc::new(ScriptedBackend::new().with_default("CRISPR was adapted in 2012. source: Doudna")),
            BackendConfig::default(),
        );
        let input = TaskInput {
            description: "Research CRISPR base editing".into(),
            request_content: "Summarize the latest research".into(),
            ..TaskInput::default()
        };
        let result = worker.execute(&input, CancellationToken::new()).await.unwrap();
        assert_eq!(result.output_kind, OutputKind::Notes);
    }
}
