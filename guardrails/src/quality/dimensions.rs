//! Quality dimensions: AI pass, rule scorers, and fusion.

use once_cell::sync::Lazy;
use regex::Regex;
use scriptorium_backend::{GenerationBackend, GenerationRequest};
use scriptorium_contracts::ContentType;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::text_stats::{self, BasicMetrics};
use crate::util;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityDimension {
    Clarity,
    Coherence,
    Grammar,
    Style,
    Accuracy,
    Completeness,
    Engagement,
    Structure,
    Tone,
    Readability,
}

impl QualityDimension {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clarity => "clarity",
            Self::Coherence => "coherence",
            Self::Grammar => "grammar",
            Self::Style => "style",
            Self::Accuracy => "accuracy",
            Self::Completeness => "completeness",
            Self::Engagement => "engagement",
            Self::Structure => "structure",
            Self::Tone => "tone",
            Self::Readability => "readability",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityLevel {
    Unacceptable,
    Poor,
    Acceptable,
    Good,
    Excellent,
}

/// Score-to-level mapping; monotone by construction.
pub fn score_to_level(score: f64) -> QualityLevel {
    if score >= 4.5 {
        QualityLevel::Excellent
    } else if score >= 3.5 {
        QualityLevel::Good
    } else if score >= 2.5 {
        QualityLevel::Acceptable
    } else if score >= 1.5 {
        QualityLevel::Poor
    } else {
        QualityLevel::Unacceptable
    }
}

/// One assessed quality dimension.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityMetric {
    pub dimension: QualityDimension,
    /// 0.0 - 5.0.
    pub score: f64,
    pub level: QualityLevel,
    pub explanation: String,
    pub suggestions: Vec<String>,
    pub confidence: f64,
}

/// Expected word-count range per content type, for completeness scoring.
pub fn expected_word_range(content_type: ContentType) -> (usize, usize) {
    match content_type {
        ContentType::Article => (800, 2_000),
        ContentType::BlogPost => (500, 1_500),
        ContentType::AcademicPaper => (3_000, 8_000),
        ContentType::BusinessDocument => (500, 2_000),
        ContentType::TechnicalDocumentation => (1_000, 3_000),
        ContentType::LegalDocument => (1_000, 5_000),
        ContentType::MedicalDocument => (1_000, 3_000),
        ContentType::CreativeWriting => (1_000, 5_000),
        ContentType::Email => (50, 300),
        ContentType::SocialMedia => (10, 280),
    }
}

/// Minimum overall quality score for the acceptance flag.
pub fn acceptance_threshold(content_type: ContentType) -> f64 {
    match content_type {
        ContentType::AcademicPaper | ContentType::LegalDocument | ContentType::MedicalDocument => {
            4.5
        }
        ContentType::BusinessDocument | ContentType::TechnicalDocumentation => 4.0,
        ContentType::Article | ContentType::CreativeWriting => 3.5,
        ContentType::BlogPost | ContentType::Email => 3.0,
        ContentType::SocialMedia => 2.5,
    }
}

static HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^(?:#{1,6}\s+|\d+\.\s+|[A-Z][^.\n]*:$)").unwrap());

fn grammar_score(content: &str) -> f64 {
    let sentence_list = text_stats::sentences(content);
    if sentence_list.is_empty() {
        return 3.0;
    }
    let mut issues = 0.0f64;
    for sentence in &sentence_list {
        if sentence.contains("  ") {
            issues += 0.1;
        }
        if let Some(first) = sentence.chars().next() {
            if first.is_alphabetic() && !first.is_uppercase() {
                issues += 0.2;
            }
        }
        let words = sentence.split_whitespace().count();
        if words > 30 {
            issues += 0.1;
        }
        if words < 3 {
            issues += 0.1;
        }
    }
    let error_rate = issues / sentence_list.len() as f64;
    (5.0 - error_rate * 10.0).clamp(1.0, 5.0)
}

fn structure_score(content: &str, metrics: &BasicMetrics) -> f64 {
    let mut score = 5.0f64;
    let paragraph_list = text_stats::paragraphs(content);
    if !paragraph_list.is_empty() {
        let avg_len = paragraph_list
            .iter()
            .map(|p| p.split_whitespace().count())
            .sum::<usize>() as f64
            / paragraph_list.len() as f64;
        if avg_len > 150.0 {
            score -= 0.5;
        } else if avg_len < 30.0 {
            score -= 0.3;
        }
    }
    if metrics.word_count > 500 && !HEADING.is_match(content) {
        score -= 0.5;
    }
    let sentence_lengths: Vec<usize> = text_stats::sentences(content)
        .iter()
        .map(|s| s.split_whitespace().count())
        .collect();
    if !sentence_lengths.is_empty() {
        let distinct: std::collections::HashSet<usize> =
            sentence_lengths.iter().copied().collect();
        if (distinct.len() as f64) < sentence_lengths.len() as f64 * 0.3 {
            score -= 0.3;
        }
    }
    score.max(1.0)
}

fn completeness_score(metrics: &BasicMetrics, content_type: ContentType) -> f64 {
    let (min_words, max_words) = expected_word_range(content_type);
    let count = metrics.word_count;
    if count < min_words / 2 {
        1.0
    } else if count < min_words {
        2.5
    } else if count <= max_words {
        5.0
    } else if count <= max_words + max_words / 2 {
        4.0
    } else {
        3.0
    }
}

fn grammar_suggestions(content: &str) -> Vec<String> {
    let mut suggestions = Vec::new();
    if content.contains("  ") {
        suggestions.push("Remove extra spaces".to_string());
    }
    if text_stats::sentences(content)
        .iter()
        .any(|s| s.split_whitespace().count() > 25)
    {
        suggestions.push("Break down long sentences for clarity".to_string());
    }
    suggestions
}

fn readability_suggestions(score: f64) -> Vec<String> {
    if score < 3.0 {
        vec![
            "Use shorter sentences".to_string(),
            "Choose simpler words where possible".to_string(),
            "Break up long paragraphs".to_string(),
        ]
    } else if score < 4.0 {
        vec!["Consider simplifying complex sentences".to_string()]
    } else {
        Vec::new()
    }
}

/// Deterministic rule-based scorers for the four dimensions rules can
/// judge.
pub fn assess_rules(content: &str, content_type: ContentType) -> Vec<QualityMetric> {
    let metrics = text_stats::basic_metrics(content);

    let grammar = grammar_score(content);
    let readability = text_stats::readability_score(content);
    let structure = structure_score(content, &metrics);
    let completeness = completeness_score(&metrics, content_type);

    vec![
        QualityMetric {
            dimension: QualityDimension::Grammar,
            score: grammar,
            level: score_to_level(grammar),
            explanation: format!("Grammar score from error detection: {grammar:.1}/5.0"),
            suggestions: grammar_suggestions(content),
            confidence: 0.7,
        },
        QualityMetric {
            dimension: QualityDimension::Readability,
            score: readability,
            level: score_to_level(readability),
            explanation: format!("Readability score: {readability:.1}/5.0"),
            suggestions: readability_suggestions(readability),
            confidence: 0.9,
        },
        QualityMetric {
            dimension: QualityDimension::Structure,
            score: structure,
            level: score_to_level(structure),
            explanation: format!("Structure score from organization: {structure:.1}/5.0"),
            suggestions: if structure < 4.0 {
                vec!["Add headings and balance paragraph lengths".to_string()]
            } else {
                Vec::new()
            },
            confidence: 0.8,
        },
        QualityMetric {
            dimension: QualityDimension::Completeness,
            score: completeness,
            level: score_to_level(completeness),
            explanation: format!("Completeness score: {completeness:.1}/5.0"),
            suggestions: if completeness < 4.0 {
                vec![format!(
                    "Adjust length toward the typical range for {}",
                    content_type.as_str()
                )]
            } else {
                Vec::new()
            },
            confidence: 0.6,
        },
    ]
}

#[derive(Debug, Deserialize)]
struct AiMetric {
    dimension: String,
    score: f64,
    #[serde(default)]
    explanation: Option<String>,
    #[serde(default)]
    suggestions: Vec<String>,
    #[serde(default)]
    confidence: Option<f64>,
}

fn parse_dimension(raw: &str) -> Option<QualityDimension> {
    match raw.to_lowercase().as_str() {
        "clarity" => Some(QualityDimension::Clarity),
        "coherence" => Some(QualityDimension::Coherence),
        "grammar" => Some(QualityDimension::Grammar),
        "style" => Some(QualityDimension::Style),
        "accuracy" => Some(QualityDimension::Accuracy),
        "completeness" => Some(QualityDimension::Completeness),
        "engagement" => Some(QualityDimension::Engagement),
        "structure" => Some(QualityDimension::Structure),
        "tone" => Some(QualityDimension::Tone),
        "readability" => Some(QualityDimension::Readability),
        _ => None,
    }
}

/// Single backend call scoring all ten dimensions. Any failure yields an
/// empty set; the rule pass stands on its own.
pub async fn assess_ai(
    backend: &dyn GenerationBackend,
    content: &str,
    content_type: ContentType,
) -> Vec<QualityMetric> {
    let prompt = format!(
        "Assess the quality of the following {} content across these ten \
         dimensions: clarity, coherence, grammar, style, accuracy, completeness, \
         engagement, structure, tone, readability. Score each 0.0-5.0. Return a \
         JSON array of objects shaped as {{\"dimension\": \"clarity\", \"score\": 4.2, \
         \"explanation\": \"...\", \"suggestions\": [\"...\"], \"confidence\": 0.9}}.\n\n\
         Content:\n{}",
        content_type.as_str(),
        util::prefix(content, 1_500)
    );
    let response = match backend
        .generate(GenerationRequest::new(prompt).with_max_tokens(2_000))
        .await
    {
        Ok(response) => response,
        Err(err) => {
            warn!(error = %err, "AI quality assessment failed");
            return Vec::new();
        }
    };
    let parsed: Vec<AiMetric> = match serde_json::from_str(&response.content) {
        Ok(parsed) => parsed,
        Err(err) => {
            warn!(error = %err, "AI quality assessment returned unparseable JSON");
            return Vec::new();
        }
    };
    parsed
        .into_iter()
        .filter_map(|m| {
            let dimension = parse_dimension(&m.dimension)?;
            let score = m.score.clamp(0.0, 5.0);
            Some(QualityMetric {
                dimension,
                score,
                level: score_to_level(score),
                explanation: m.explanation.unwrap_or_default(),
                suggestions: m.suggestions.into_iter().take(3).collect(),
                confidence: m.confidence.unwrap_or(0.8).clamp(0.0, 1.0),
            })
        })
        .collect()
}

/// Fuse AI and rule assessments: 0.7 AI + 0.3 rules where both scored a
/// dimension, otherwise whichever pass produced it.
pub fn fuse(ai: Vec<QualityMetric>, rules: Vec<QualityMetric>) -> Vec<QualityMetric> {
    let mut combined: std::collections::BTreeMap<QualityDimension, QualityMetric> =
        ai.into_iter().map(|m| (m.dimension, m)).collect();
    for rule_metric in rules {
        match combined.remove(&rule_metric.dimension) {
            Some(ai_metric) => {
                let score = ai_metric.score * 0.7 + rule_metric.score * 0.3;
                let confidence = ai_metric.confidence * 0.7 + rule_metric.confidence * 0.3;
                let mut suggestions = ai_metric.suggestions.clone();
                suggestions.extend(rule_metric.suggestions.clone());
                combined.insert(rule_metric.dimension, QualityMetric {
                    dimension: rule_metric.dimension,
                    score,
                    level: score_to_level(score),
                    explanation: format!("Combined assessment: {}", ai_metric.explanation),
                    suggestions,
                    confidence,
                });
            }
            None => {
                combined.insert(rule_metric.dimension, rule_metric);
            }
        }
    }
    combined.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scriptorium_backend::ScriptedBackend;

    #[test]
    fn level_mapping_is_monotone() {
        let scores = [0.0, 1.0, 1.5, 2.0, 2.5, 3.0, 3.5, 4.0, 4.5, 5.0];
        for pair in scores.windows(2) {
            assert!(score_to_level(pair[0]) <= score_to_level(pair[1]));
        }
        assert_eq!(score_to_level(4.5), QualityLevel::Excellent);
        assert_eq!(score_to_level(3.5), QualityLevel::Good);
        assert_eq!(score_to_level(2.5), QualityLevel::Acceptable);
        assert_eq!(score_to_level(1.5), QualityLevel::Poor);
        assert_eq!(score_to_level(1.0), QualityLevel::Unacceptable);
    }

    #[test]
    fn rule_pass_scores_all_four_dimensions() {
        let metrics = assess_rules("A clean sentence here. Another follows it.", ContentType::Email);
        let dims: Vec<QualityDimension> = metrics.iter().map(|m| m.dimension).collect();
        assert!(dims.contains(&QualityDimension::Grammar));
        assert!(dims.contains(&QualityDimension::Readability));
        assert!(dims.contains(&QualityDimension::Structure));
        assert!(dims.contains(&QualityDimension::Completeness));
    }

    #[test]
    fn short_article_is_incomplete() {
        let metrics = assess_rules("Too short.", ContentType::Article);
        let completeness = metrics
            .iter()
            .find(|m| m.dimension == QualityDimension::Completeness)
            .unwrap();
        assert!(completeness.score <= 1.0 + f64::EPSILON);
    }

    #[test]
    fn fusion_weights_ai_seventy_thirty() {
        let ai = vec![QualityMetric {
            dimension: QualityDimension::Grammar,
            score: 4.0,
            level: score_to_level(4.0),
            explanation: "solid".into(),
            suggestions: vec![],
            confidence: 1.0,
        }];
        let rules = vec![QualityMetric {
            dimension: QualityDimension::Grammar,
            score: 2.0,
            level: score_to_level(2.0),
            explanation: "rule".into(),
            suggestions: vec![],
            confidence: 0.5,
        }];
        let fused = fuse(ai, rules);
        assert_eq!(fused.len(), 1);
        assert!((fused[0].score - 3.4).abs() < 1e-9);
        assert!((fused[0].confidence - 0.85).abs() < 1e-9);
    }

    #[test]
    fn fusion_keeps_unmatched_dimensions() {
        let ai = vec![QualityMetric {
            dimension: QualityDimension::Engagement,
            score: 4.0,
            level: score_to_level(4.0),
            explanation: String::new(),
            suggestions: vec![],
            confidence: 0.8,
        }];
        let rules = vec![QualityMetric {
            dimension: QualityDimension::Grammar,
            score: 3.0,
            level: score_to_level(3.0),
            explanation: String::new(),
            suggestions: vec![],
            confidence: 0.7,
        }];
        assert_eq!(fuse(ai, rules).len(), 2);
    }

    #[tokio::test]
    async fn ai_pass_parses_scored_dimensions() {
        let backend = ScriptedBackend::new().with_default(
            r#"[{"dimension": "clarity", "score": 4.2, "explanation": "clear", "suggestions": ["a", "b", "c", "d"], "confidence": 0.9}]"#,
        );
        let metrics = assess_ai(&backend, "text", ContentType::Article).await;
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0].dimension, QualityDimension::Clarity);
        // suggestions capped at three
        assert_eq!(metrics[0].suggestions.len(), 3);
    }

    #[tokio::test]
    async fn ai_pass_failure_is_empty_not_fatal() {
        let backend = ScriptedBackend::new();
        assert!(assess_ai(&backend, "text", ContentType::Article).await.is_empty());
    }

    #[test]
    fn thresholds_follow_the_content_type_table() {
        assert_eq!(acceptance_threshold(ContentType::AcademicPaper), 4.5);
        assert_eq!(acceptance_threshold(ContentType::Article), 3.5);
        assert_eq!(acceptance_threshold(ContentType::SocialMedia), 2.5);
    }
}
