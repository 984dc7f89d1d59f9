//! Shared helpers for the end-to-end scenario tests.

use std::sync::Arc;

use scriptorium_backend::ScriptedBackend;

/// An article-length body with headings, varied sentences, and no
/// verifiable claims (no numbers, dates, or quotes), so quality rules pass
/// and the hallucination checker stays quiet.
pub fn clean_article(target_words: usize) -> String {
    let paragraphs = [
        "Urban beekeeping has moved from a niche hobby to a fixture of city \
         rooftops. Keepers tend their hives between water tanks and vents. The \
         bees forage across parks, balconies, and street trees with ease.",
        "A rooftop colony behaves differently from its rural cousins. Forage \
         arrives in short bursts from flowering streets. Keepers learn to read \
         the rhythm of their own neighborhood and adjust inspections to match.",
        "Good hive placement matters more than most newcomers expect. A hive \
         should face away from prevailing wind and sit level on its stand. \
         Neighbors appreciate a flight path aimed above head height.",
        "Seasonal care follows a steady loop. Spring asks for space and \
         patience. Summer rewards light inspections. Autumn is for feeding and \
         tightening entrances, and winter is for leaving the colony alone.",
    ];
    let headings = ["## Getting started", "## Reading the colony", "## Placement", "## The seasonal loop"];

    let mut body = String::new();
    let mut words = 0usize;
    let mut i = 0usize;
    while words < target_words {
        body.push_str(headings[i % headings.len()]);
        body.push_str("\n\n");
        let paragraph = paragraphs[i % paragraphs.len()];
        body.push_str(paragraph);
        body.push_str("\n\n");
        words += paragraph.split_whitespace().count() + 2;
        i += 1;
    }
    body
}

/// High AI quality scores for the dimensions rules cannot judge.
pub const HIGH_QUALITY_DIMENSIONS: &str = r#"[
    {"dimension": "clarity", "score": 4.6, "explanation": "clear", "suggestions": [], "confidence": 0.9},
    {"dimension": "coherence", "score": 4.4, "explanation": "flows", "suggestions": [], "confidence": 0.9},
    {"dimension": "style", "score": 4.3, "explanation": "fits", "suggestions": [], "confidence": 0.9},
    {"dimension": "accuracy", "score": 4.5, "explanation": "sound", "suggestions": [], "confidence": 0.9},
    {"dimension": "engagement", "score": 4.2, "explanation": "holds", "suggestions": [], "confidence": 0.9},
    {"dimension": "tone", "score": 4.4, "explanation": "even", "suggestions": [], "confidence": 0.9}
]"#;

/// A scripted backend wired for a clean end-to-end run: the content writer
/// produces an article, every analysis pass returns benign JSON.
pub fn clean_run_backend(article: String) -> Arc<ScriptedBackend> {
    Arc::new(
        ScriptedBackend::new()
            .rule("Analyze the following writing task", "a straightforward task, low risk")
            .rule("You are a professional writer", article)
            .rule("Assess the quality", HIGH_QUALITY_DIMENSIONS)
            .rule("Identify specific quality issues", "[]")
            .rule("Extract the verifiable factual claims", "[]")
            .rule("Analyze the following content for deviations", "[]")
            .rule(
                "Check whether the content complies",
                r#"{"compliant": true, "compliance_score": 0.92}"#,
            )
            .rule(
                "Fact-check the following claim",
                r#"{"result": "VERIFIED", "confidence": 0.9, "explanation": "documented"}"#,
            )
            .with_default("[]"),
    )
}
