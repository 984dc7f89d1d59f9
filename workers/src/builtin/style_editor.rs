//! Style editor: reworks tone, voice, and flow without changing meaning.

use std::sync::Arc;

use async_trait::async_trait;
use scriptorium_backend::GenerationBackend;
use scriptorium_config::BackendConfig;
use scriptorium_contracts::{
    CorrectionLevel, OutputKind, TaskInput, TaskKind, TaskResult, WorkerId,
};
use tokio_util::sync::CancellationToken;

use crate::builtin::{audience_clause, working_text};
use crate::engine::WorkerEngine;
use crate::error::WorkerError;
use crate::traits::{Worker, WorkerCapabilities, WorkerHealth, WorkerMetadata};

pub struct StyleEditor {
    engine: WorkerEngine,
}

impl StyleEditor {
    pub fn new(backend: Arc<dyn GenerationBackend>, config: BackendConfig) -> Self {
        let metadata = WorkerMetadata {
            id: WorkerId::StyleEditor,
            name: "Style Editor".into(),
            keywords: ["edit", "style", "tone", "voice", "improve", "polish"]
                .map(String::from)
                .to_vec(),
            supported_task_kinds: vec![TaskKind::Edit, TaskKind::Review, TaskKind::Format],
            max_input_chars: 80_000,
            delegable: true,
            timeout_s: 30,
        };
        Self { engine: WorkerEngine::new(metadata, backend, config) }
    }

    fn correction_clause(level: CorrectionLevel) -> &'static str {
        match level {
            CorrectionLevel::Conservative => {
                "Make only changes that are clearly improvements; when in doubt, leave the text as written."
            }
            CorrectionLevel::Moderate => "Apply reasonable stylistic improvements throughout.",
            CorrectionLevel::Aggressive => {
                "Rework freely for maximum clarity and polish, restructuring sentences where helpful."
            }
        }
    }

    fn build_prompt(input: &TaskInput) -> String {
        format!(
            "You are a style editor. {} {}\n\nEdit the following text for tone, \
             rhythm, and word choice. Return the complete revised text.\n\n{}",
            audience_clause(input),
            Self::correction_clause(input.correction_level),
            working_text(input)
        )
    }
}

#[async_trait]
impl Worker for StyleEditor {
    fn metadata(&self) -> &WorkerMetadata {
        &self.engine.metadata
    }

    fn capabilities(&self) -> WorkerCapabilities {
        WorkerCapabilities {
            confidence_by_kind: [(TaskKind::Edit, 0.9), (TaskKind::Format, 0.6)]
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conservative_edits_are_requested_verbatim() {
        let input = TaskInput {
            description: "polish".into(),
            request_content: "Some draft text to polish.".into(),
            correction_level: CorrectionLevel::Conservative,
            ..TaskInput::default()
        };
        let prompt = StyleEditor::build_prompt(&input);
        assert!(prompt.contains("when in doubt, leave the text as written"));
        assert!(prompt.contains("Some draft text to polish."));
    }

    #[test]
    fn latest_upstream_revision_is_preferred_over_request() {
        use scriptorium_contracts::UpstreamOutput;

        let mut input = TaskInput {
            description: "polish".into(),
            request_content: "original".into(),
            ..TaskInput::default()
        };
        input.upstream.push(UpstreamOutput {
            worker: WorkerId::ContentWriter,
            output_kind: OutputKind::Revision,
            content: "first draft".into(),
        });
        input.upstream.push(UpstreamOutput {
            worker: WorkerId::StructureArchitect,
            output_kind: OutputKind::Revision,
            content: "restructured draft".into(),
        });
        // notes after the last revision must not displace it
        input.upstream.push(UpstreamOutput {
            worker: WorkerId::ResearchAssistant,
            output_kind: OutputKind::Notes,
            content: "supporting notes".into(),
        });
        let prompt = StyleEditor::build_prompt(&input);
        assert!(prompt.contains("restructured draft"));
        assert!(!prompt.contains("first draft"));
    }
}
