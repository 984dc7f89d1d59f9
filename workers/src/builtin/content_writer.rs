//! Content writer: drafts original text. The platform's generalist; every
//! routing decision can fall back to it.

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

pub struct ContentWriter {
    engine: WorkerEngine,
}

impl ContentWriter {
    pub fn new(backend: Arc<dyn GenerationBackend>, config: BackendConfig) -> Self {
        let metadata = WorkerMetadata {
            id: WorkerId::ContentWriter,
            name: "Content Writer".into(),
            keywords: ["write", "create", "draft", "compose", "story", "article"]
                .map(String::from)
                .to_vec(),
            supported_task_kinds: vec![],
            max_input_chars: 60_000,
            delegable: true,
            timeout_s: 30,
        };
        Self { engine: WorkerEngine::new(metadata, backend, config) }
    }

    fn build_prompt(input: &TaskInput) -> String {
        let mut prompt = format!(
            "You are a professional writer. {}\n\nAssignment: {}\n",
            audience_clause(input),
            input.description
        );
        if let Some(context) = &input.context {
            prompt.push_str(&format!("\nBackground context:\n{context}\n"));
        }
        for upstream in &input.upstream {
            prompt.push_str(&format!(
                "\nMaterial from {}:\n{}\n",
                upstream.worker, upstream.content
            ));
        }
        prompt.push_str(&format!(
            "\nProduce approximately {} words. Return only the finished text.",
            expected_words(input)
        ));
        prompt
    }
}

#[async_trait]
impl Worker for ContentWriter {
    fn metadata(&self) -> &WorkerMetadata {
        &self.engine.metadata
    }

    fn capabilities(&self) -> WorkerCapabilities {
        WorkerCapabilities {
            confidence_by_kind: [
                (TaskKind::Create, 0.9),
                (TaskKind::Edit, 0.6),
                (TaskKind::Replace, 0.7),
            ]
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
        let prompt = Self::build_prompt(input);
        self.engine
            .run_prompt(prompt, expected_words(input), OutputKind::Revision, &[], cancel)
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
    use scriptorium_contracts::ContentType;

    fn input() -> TaskInput {
        TaskInput {
            description: "Write a 900-word article on urban beekeeping".into(),
            request_content: "Write a 900-word article on urban beekeeping".into(),
            content_type: ContentType::Article,
            ..TaskInput::default()
        }
    }

    #[test]
    fn prompt_carries_assignment_and_length() {
        let prompt = ContentWriter::build_prompt(&input());
        assert!(prompt.contains("urban beekeeping"));
        assert!(prompt.contains("approximately 900 words"));
        assert!(prompt.contains("Content type: article"));
    }

    #[tokio::test]
    async fn produces_a_revision() {
        let writer = ContentWriter::new(
            Arc::new(ScriptedBackend::new().with_default("A fine article about bees.")),
            BackendConfig::default(),
        );
        let result = writer.execute(&input(), CancellationToken::new()).await.unwrap();
        assert_eq!(result.output_kind, OutputKind::Revision);
        assert!(result.confidence > 0.0);
    }
}
