//! Keyword analysis of a request: complexity, risk, and feature flags.

use scriptorium_contracts::{Complexity, RiskLevel, TaskKind};
use serde::{Deserialize, Serialize};

const HIGH_COMPLEXITY: &[&str] = &["comprehensive", "detailed", "complex", "multi-chapter"];
const LOW_COMPLEXITY: &[&str] = &["fix", "correct", "simple", "quick"];

const HIGH_RISK: &[&str] = &["delete", "replace all", "overwrite"];
const MEDIUM_RISK: &[&str] = &["edit", "modify", "change", "update"];
const LOW_RISK: &[&str] = &["suggest", "recommend", "highlight", "comment"];

const RESEARCH_CUES: &[&str] = &["research", "find", "investigate", "fact-check", "sources"];
const CREATIVITY_CUES: &[&str] = &["creative", "story", "novel", "fiction", "imaginative"];
const TECHNICAL_CUES: &[&str] = &["technical", "documentation", "manual", "api"];
const CURRENT_DATA_CUES: &[&str] = &["latest", "current", "recent", "up-to-date"];
const EXPERT_CUES: &[&str] = &["expert", "peer-reviewed", "authoritative", "scholarly"];

/// Outcome of analyzing a request's text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskAnalysis {
    pub complexity: Complexity,
    pub risk: RiskLevel,
    pub requires_research: bool,
    pub requires_creativity: bool,
    pub requires_technical: bool,
    pub requires_current_data: bool,
    pub requires_expert_sources: bool,
}

impl TaskAnalysis {
    /// Escalate classification by another reading of the same request.
    /// Escalation is monotone: the blend never lowers complexity or risk.
    pub fn escalate(&mut self, other_complexity: Complexity, other_risk: RiskLevel) {
        self.complexity = self.complexity.max(other_complexity);
        self.risk = self.risk.max(other_risk);
    }
}

fn contains_any(text: &str, cues: &[&str]) -> bool {
    cues.iter().any(|cue| text.contains(cue))
}

/// Pure keyword classification of a request.
pub fn analyze_text(text: &str, kind: TaskKind) -> TaskAnalysis {
    let lowered = text.to_lowercase();

    let complexity = if contains_any(&lowered, HIGH_COMPLEXITY) {
        Complexity::High
    } else if contains_any(&lowered, LOW_COMPLEXITY) {
        Complexity::Low
    } else {
        Complexity::Medium
    };

    let mut risk = if contains_any(&lowered, HIGH_RISK) {
        RiskLevel::High
    } else if contains_any(&lowered, MEDIUM_RISK) {
        RiskLevel::Medium
    } else if contains_any(&lowered, LOW_RISK) {
        RiskLevel::Low
    } else {
        RiskLevel::Low
    };
    if kind.is_destructive() {
        risk = RiskLevel::High;
    }

    TaskAnalysis {
        complexity,
        risk,
        requires_research: contains_any(&lowered, RESEARCH_CUES),
        requires_creativity: contains_any(&lowered, CREATIVITY_CUES),
        requires_technical: contains_any(&lowered, TECHNICAL_CUES),
        requires_current_data: contains_any(&lowered, CURRENT_DATA_CUES),
        requires_expert_sources: contains_any(&lowered, EXPERT_CUES),
    }
}

/// Extract complexity/risk cues from a free-text backend analysis, the same
/// way the keyword pass reads the request itself.
pub fn parse_backend_analysis(response: &str) -> (Complexity, RiskLevel) {
    let lowered = response.to_lowercase();
    let complexity = if contains_any(&lowered, &["complex", "difficult", "challenging", "comprehensive"])
    {
        Complexity::High
    } else if contains_any(&lowered, &["simple", "easy", "basic", "straightforward"]) {
        Complexity::Low
    } else {
        Complexity::Medium
    };
    let risk = if contains_any(&lowered, &["high risk", "dangerous", "destructive"]) {
        RiskLevel::High
    } else if contains_any(&lowered, &["medium risk", "moderate risk"]) {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };
    (complexity, risk)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_article_request_is_medium_low() {
        let a = analyze_text("Write a 900-word article on urban beekeeping", TaskKind::Create);
        assert_eq!(a.complexity, Complexity::Medium);
        assert_eq!(a.risk, RiskLevel::Low);
        assert!(!a.requires_research);
    }

    #[test]
    fn research_summary_sets_research_and_current_data_flags() {
        let a = analyze_text(
            "Summarize the latest research on CRISPR base editing",
            TaskKind::Create,
        );
        assert!(a.requires_research);
        assert!(a.requires_current_data);
    }

    #[test]
    fn comprehensive_requests_are_high_complexity() {
        let a = analyze_text("Produce a comprehensive guide to tax law", TaskKind::Create);
        assert_eq!(a.complexity, Complexity::High);
    }

    #[test]
    fn quick_fixes_are_low_complexity() {
        let a = analyze_text("quick fix of this paragraph", TaskKind::Edit);
        assert_eq!(a.complexity, Complexity::Low);
    }

    #[test]
    fn destructive_kind_forces_high_risk() {
        let a = analyze_text("tidy the summary", TaskKind::Replace);
        assert_eq!(a.risk, RiskLevel::High);
    }

    #[test]
    fn overwrite_language_is_high_risk() {
        let a = analyze_text("overwrite the introduction entirely", TaskKind::Edit);
        assert_eq!(a.risk, RiskLevel::High);
    }

    #[test]
    fn escalation_never_downgrades() {
        let mut a = analyze_text("Produce a comprehensive guide", TaskKind::Create);
        a.escalate(Complexity::Low, RiskLevel::Low);
        assert_eq!(a.complexity, Complexity::High);
    }
}
