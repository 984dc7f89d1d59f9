//! Pattern-based deviation detection.

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;

use super::types::{
    alert_level_for, severity_for, DeviationAlert, DeviationType,
};

static SCOPE_CREEP: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"\b(?:also|additionally|furthermore|moreover)\s+(?:we|I)\s+(?:should|could|might|will)\b")
            .unwrap(),
        Regex::new(r"\b(?:expanding|broadening|extending)\s+(?:the|our)\s+(?:scope|focus|coverage)\b")
            .unwrap(),
        Regex::new(r"\b(?:new|additional|extra)\s+(?:features?|requirements?|objectives?)\b").unwrap(),
    ]
});

static GOAL_MISALIGNMENT: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"\b(?:instead|rather|alternatively)\s+(?:of|than)\b").unwrap(),
        Regex::new(r"\b(?:different|alternative|opposite)\s+(?:approach|direction|goal)\b").unwrap(),
        Regex::new(r"\b(?:changing|shifting|modifying)\s+(?:the|our)\s+(?:goal|objective|focus)\b")
            .unwrap(),
    ]
});

static TONE_DEVIATION: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"\b(?:suddenly|abruptly|unexpectedly)\s+(?:formal|informal|casual|serious)\b")
            .unwrap(),
        Regex::new(r"\b(?:tone|style|voice)\s+(?:changes?|shifts?|becomes?)\b").unwrap(),
        Regex::new(r"\b(?:inconsistent|conflicting|mixed)\s+(?:tone|style|voice)\b").unwrap(),
    ]
});

fn label(deviation_type: DeviationType) -> &'static str {
    match deviation_type {
        DeviationType::ScopeCreep => "scope creep",
        DeviationType::GoalMisalignment => "goal misalignment",
        DeviationType::ToneDeviation => "tone deviation",
        DeviationType::StyleInconsistency => "style inconsistency",
        DeviationType::ContentDrift => "content drift",
        DeviationType::StructuralDeviation => "structural deviation",
        DeviationType::RequirementViolation => "requirement violation",
        DeviationType::PermissionOverreach => "permission overreach",
    }
}

fn correction_for(deviation_type: DeviationType) -> &'static str {
    match deviation_type {
        DeviationType::ScopeCreep => "Trim additions that fall outside the agreed scope",
        DeviationType::GoalMisalignment => "Refocus the passage on the stated objectives",
        DeviationType::ToneDeviation => "Align the tone with the surrounding text",
        _ => "Review the passage against the registered objectives",
    }
}

fn tracked_families() -> [(DeviationType, &'static [Regex]); 3] {
    [
        (DeviationType::ScopeCreep, SCOPE_CREEP.as_slice()),
        (DeviationType::GoalMisalignment, GOAL_MISALIGNMENT.as_slice()),
        (DeviationType::ToneDeviation, TONE_DEVIATION.as_slice()),
    ]
}

/// Scan content with the tracked deviation families. Each match becomes an
/// alert with the family's fixed severity.
pub fn scan(content: &str) -> Vec<DeviationAlert> {
    let mut alerts = Vec::new();
    for (deviation_type, patterns) in tracked_families() {
        for pattern in patterns {
            for m in pattern.find_iter(content) {
                let severity = severity_for(deviation_type);
                let counter = alerts.len() + 1;
                alerts.push(DeviationAlert {
                    id: format!("pattern_alert_{counter}"),
                    deviation_type,
                    severity,
                    alert_level: alert_level_for(severity),
                    description: format!("Potential {} detected", label(deviation_type)),
                    affected_objective_id: "general".to_string(),
                    evidence: vec![m.as_str().to_string()],
                    suggested_correction: correction_for(deviation_type).to_string(),
                    confidence: 0.6,
                    created_at: Utc::now(),
                    resolved: false,
                });
            }
        }
    }
    alerts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deviation::types::DeviationSeverity;

    #[test]
    fn scope_creep_language_is_flagged_moderate() {
        let alerts = scan("Additionally we should add extra features to the appendix.");
        assert!(alerts
            .iter()
            .any(|a| a.deviation_type == DeviationType::ScopeCreep
                && a.severity == DeviationSeverity::Moderate));
    }

    #[test]
    fn goal_misalignment_is_major() {
        let alerts = scan("We took a different approach than the brief called for.");
        let alert = alerts
            .iter()
            .find(|a| a.deviation_type == DeviationType::GoalMisalignment)
            .unwrap();
        assert_eq!(alert.severity, DeviationSeverity::Major);
        assert!(!alert.evidence.is_empty());
        assert!(!alert.resolved);
    }

    #[test]
    fn clean_content_raises_nothing() {
        assert!(scan("The hive produced honey all summer long.").is_empty());
    }
}
