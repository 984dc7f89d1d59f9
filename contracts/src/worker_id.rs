//! Worker identities.

use serde::{Deserialize, Serialize};

/// Identity of a specialized worker.
///
/// A closed enum rather than a free-form string: the router hands variants
/// to the orchestrator, and the registry is keyed by variant, so a typo in
/// a worker name is a compile error instead of a runtime lookup miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerId {
    ContentWriter,
    ResearchAssistant,
    StyleEditor,
    GrammarAssistant,
    StructureArchitect,
    CreativeEnhancer,
    TechnicalWriter,
    QualityReviewer,
}

impl WorkerId {
    /// Stable snake_case name used in snapshots and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ContentWriter => "content_writer",
            Self::ResearchAssistant => "research_assistant",
            Self::StyleEditor => "style_editor",
            Self::GrammarAssistant => "grammar_assistant",
            Self::StructureArchitect => "structure_architect",
            Self::CreativeEnhancer => "creative_enhancer",
            Self::TechnicalWriter => "technical_writer",
            Self::QualityReviewer => "quality_reviewer",
        }
    }

    /// All known worker identities, in registry order.
    pub fn all() -> &'static [WorkerId] {
        &[
            Self::ContentWriter,
            Self::ResearchAssistant,
            Self::StyleEditor,
            Self::GrammarAssistant,
            Self::StructureArchitect,
            Self::CreativeEnhancer,
            Self::TechnicalWriter,
            Self::QualityReviewer,
        ]
    }

    /// The generalist every routing decision can fall back to.
    pub fn generalist() -> Self {
        Self::ContentWriter
    }
}

impl std::fmt::Display for WorkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_serde_name() {
        for id in WorkerId::all() {
            let json = serde_json::to_string(id).unwrap();
            assert_eq!(json.trim_matches('"'), id.as_str());
        }
    }
}
