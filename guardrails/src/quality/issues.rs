//! Quality issue identification: deterministic rules plus a capped AI
//! pass.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use scriptorium_backend::{GenerationBackend, GenerationRequest};
use scriptorium_contracts::ContentType;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::util;

/// Cap on AI-identified issues per assessment.
const AI_ISSUE_LIMIT: usize = 10;
/// Cap on the combined issue list.
pub const TOTAL_ISSUE_LIMIT: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    Low,
    Medium,
    High,
    Critical,
}

/// A specific, located problem in the content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityIssue {
    pub id: String,
    pub issue_type: String,
    pub severity: IssueSeverity,
    pub description: String,
    /// Character span; (0, 0) for content-wide issues.
    pub location: (usize, usize),
    pub suggestion: String,
    pub example: Option<String>,
    pub confidence: f64,
}

static DOUBLE_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"  +").unwrap());
static PASSIVE_VOICE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:was|were|is|are|been|being)\s+\w+(?:ed|en)\b").unwrap());
static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w+\b").unwrap());

/// Deterministic issue scan.
pub fn find_rule_issues(content: &str) -> Vec<QualityIssue> {
    let mut issues: Vec<QualityIssue> = Vec::new();

    for m in DOUBLE_SPACE.find_iter(content) {
        let counter = issues.len() + 1;
        issues.push(QualityIssue {
            id: format!("rule_issue_{counter}"),
            issue_type: "formatting".into(),
            severity: IssueSeverity::Low,
            description: "Multiple consecutive spaces".into(),
            location: (m.start(), m.end()),
            suggestion: "Replace with a single space".into(),
            example: None,
            confidence: 0.9,
        });
    }

    let mut pos = 0usize;
    for sentence in content.split(['.', '!', '?']) {
        if sentence.split_whitespace().count() > 35 {
            let counter = issues.len() + 1;
            issues.push(QualityIssue {
                id: format!("rule_issue_{counter}"),
                issue_type: "readability".into(),
                severity: IssueSeverity::Medium,
                description: "Very long sentence (>35 words)".into(),
                location: (pos, pos + sentence.len()),
                suggestion: "Consider breaking into shorter sentences".into(),
                example: None,
                confidence: 0.8,
            });
        }
        pos += sentence.len() + 1;
    }

    for m in PASSIVE_VOICE.find_iter(content) {
        let counter = issues.len() + 1;
        issues.push(QualityIssue {
            id: format!("rule_issue_{counter}"),
            issue_type: "style".into(),
            severity: IssueSeverity::Low,
            description: "Possible passive voice".into(),
            location: (m.start(), m.end()),
            suggestion: "Consider using active voice".into(),
            example: Some(m.as_str().to_string()),
            confidence: 0.6,
        });
    }

    let mut occurrences: HashMap<String, usize> = HashMap::new();
    for m in WORD.find_iter(content) {
        let word = m.as_str().to_lowercase();
        if word.chars().count() > 4 {
            *occurrences.entry(word).or_default() += 1;
        }
    }
    let mut repeated: Vec<(String, usize)> =
        occurrences.into_iter().filter(|(_, n)| *n > 10).collect();
    repeated.sort();
    for (word, n) in repeated {
        let counter = issues.len() + 1;
        issues.push(QualityIssue {
            id: format!("rule_issue_{counter}"),
            issue_type: "style".into(),
            severity: IssueSeverity::Low,
            description: format!("Word '{word}' used {n} times"),
            location: (0, 0),
            suggestion: "Consider using synonyms for variety".into(),
            example: None,
            confidence: 0.7,
        });
    }

    issues
}

#[derive(Debug, Deserialize)]
struct AiIssue {
    #[serde(rename = "type")]
    issue_type: Option<String>,
    severity: Option<String>,
    description: String,
    #[serde(default)]
    suggestion: Option<String>,
    #[serde(default)]
    example: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
}

fn parse_severity(raw: Option<&str>) -> IssueSeverity {
    match raw.map(str::to_lowercase).as_deref() {
        Some("low") => IssueSeverity::Low,
        Some("high") => IssueSeverity::High,
        Some("critical") => IssueSeverity::Critical,
        _ => IssueSeverity::Medium,
    }
}

/// AI issue scan, capped at ten. Failure yields an empty list.
pub async fn find_ai_issues(
    backend: &dyn GenerationBackend,
    content: &str,
    content_type: ContentType,
) -> Vec<QualityIssue> {
    let prompt = format!(
        "Identify specific quality issues in the following {} content: grammar \
         errors, unclear sentences, inconsistent tone, missing transitions, weak \
         language, structural problems. Return a JSON array of at most \
         {AI_ISSUE_LIMIT} objects shaped as {{\"type\": \"clarity\", \"severity\": \
         \"low|medium|high|critical\", \"description\": \"...\", \"suggestion\": \
         \"...\", \"example\": \"...\", \"confidence\": 0.8}}.\n\nContent:\n{}",
        content_type.as_str(),
        util::prefix(content, 1_000)
    );
    let response = match backend
        .generate(GenerationRequest::new(prompt).with_max_tokens(1_000))
        .await
    {
        Ok(response) => response,
        Err(err) => {
            warn!(error = %err, "AI issue identification failed");
            return Vec::new();
        }
    };
    let parsed: Vec<AiIssue> = match serde_json::from_str(&response.content) {
        Ok(parsed) => parsed,
        Err(err) => {
            warn!(error = %err, "AI issue identification returned unparseable JSON");
            return Vec::new();
        }
    };
    parsed
        .into_iter()
        .take(AI_ISSUE_LIMIT)
        .enumerate()
        .map(|(i, issue)| {
            let location = issue
                .example
                .as_deref()
                .and_then(|example| content.find(example).map(|s| (s, s + example.len())))
                .unwrap_or((0, 0));
            QualityIssue {
                id: format!("ai_issue_{}", i + 1),
                issue_type: issue.issue_type.unwrap_or_else(|| "general".into()),
                severity: parse_severity(issue.severity.as_deref()),
                description: issue.description,
                location,
                suggestion: issue.suggestion.unwrap_or_default(),
                example: issue.example,
                confidence: issue.confidence.unwrap_or(0.7).clamp(0.0, 1.0),
            }
        })
        .collect()
}

/// Merge issue lists, deduplicating by normalized description, capped.
pub fn dedup_issues(issues: Vec<QualityIssue>) -> Vec<QualityIssue> {
    let mut seen = std::collections::HashSet::new();
    issues
        .into_iter()
        .filter(|issue| seen.insert(issue.description.trim().to_lowercase()))
        .take(TOTAL_ISSUE_LIMIT)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn double_spaces_and_passive_voice_are_flagged() {
        let issues = find_rule_issues("The hive  was moved by the keeper.");
        assert!(issues.iter().any(|i| i.issue_type == "formatting"));
        assert!(issues.iter().any(|i| i.description.contains("passive voice")));
    }

    #[test]
    fn long_sentences_are_flagged() {
        let long = format!("{} end.", "word ".repeat(40));
        let issues = find_rule_issues(&long);
        assert!(issues.iter().any(|i| i.description.contains(">35 words")));
    }

    #[test]
    fn heavy_repetition_is_flagged() {
        let text = "keeper ".repeat(12);
        let issues = find_rule_issues(&text);
        assert!(issues.iter().any(|i| i.description.contains("'keeper'")));
    }

    #[test]
    fn short_words_are_never_counted_as_repetition() {
        let text = "bee ".repeat(30);
        let issues = find_rule_issues(&text);
        assert!(!issues.iter().any(|i| i.description.contains("'bee'")));
    }

    #[test]
    fn dedup_drops_repeated_descriptions() {
        let text = "a  b  c"; // two double-space issues, same description
        let issues = dedup_issues(find_rule_issues(text));
        let formatting: Vec<_> =
            issues.iter().filter(|i| i.issue_type == "formatting").collect();
        assert_eq!(formatting.len(), 1);
    }
}
