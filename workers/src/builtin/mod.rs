//! Built-in writing workers.

pub mod content_writer;
pub mod creative_enhancer;
pub mod grammar_assistant;
pub mod quality_reviewer;
pub mod research_assistant;
pub mod structure_architect;
pub mod style_editor;
pub mod technical_writer;

pub use content_writer::ContentWriter;
pub use creative_enhancer::CreativeEnhancer;
pub use grammar_assistant::GrammarAssistant;
pub use quality_reviewer::QualityReviewer;
pub use research_assistant::ResearchAssistant;
pub use structure_architect::StructureArchitect;
pub use style_editor::StyleEditor;
pub use technical_writer::TechnicalWriter;

use scriptorium_contracts::{OutputKind, TaskInput};

/// The text a downstream worker should operate on: the most recent
/// upstream revision in breakdown order, otherwise the original request
/// content. Mirrors how the orchestrator folds the final content, so a
/// reviewer always sees the text the workflow would deliver.
pub(crate) fn working_text(input: &TaskInput) -> &str {
    input
        .upstream
        .iter()
        .rev()
        .find(|u| u.output_kind == OutputKind::Revision && !u.content.is_empty())
        .map(|u| u.content.as_str())
        .unwrap_or(&input.request_content)
}

/// Expected output size in words: an explicit "N-word"/"N words" request
/// wins, otherwise the lower bound typical for the content type.
pub(crate) fn expected_words(input: &TaskInput) -> usize {
    let text = input.description.to_lowercase();
    let mut tokens = text
        .split(|c: char| c.is_whitespace() || c == '-')
        .peekable();
    while let Some(token) = tokens.next() {
        if let Ok(n) = token.replace(',', "").parse::<usize>() {
            if tokens.peek().is_some_and(|next| next.starts_with("word")) {
                return n.clamp(10, 20_000);
            }
        }
    }
    use scriptorium_contracts::ContentType::*;
    match input.content_type {
        Article => 800,
        BlogPost => 500,
        AcademicPaper => 3_000,
        BusinessDocument => 500,
        CreativeWriting => 1_000,
        TechnicalDocumentation => 1_000,
        LegalDocument => 1_000,
        MedicalDocument => 1_000,
        Email => 50,
        SocialMedia => 10,
    }
}

/// Shared prompt preamble: audience and voice handling.
pub(crate) fn audience_clause(input: &TaskInput) -> String {
    let mut clause = format!("Content type: {}.", input.content_type.as_str());
    if let Some(audience) = &input.audience {
        clause.push_str(&format!(" Audience: {audience}."));
    }
    if input.preserve_voice {
        clause.push_str(" Preserve the author's existing voice.");
    }
    clause
}
