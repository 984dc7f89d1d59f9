//! Quality report synthesis.

use chrono::{DateTime, Utc};
use scriptorium_contracts::{ContentType, WorkerId};
use serde::{Deserialize, Serialize};

use super::dimensions::{
    acceptance_threshold, score_to_level, QualityLevel, QualityMetric,
};
use super::issues::{IssueSeverity, QualityIssue};
use super::text_stats::BasicMetrics;
use crate::util;

/// Immutable quality report for one piece of content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityReport {
    pub content_id: String,
    pub content_type: ContentType,
    /// Mean of fused dimension scores, 0.0 - 5.0.
    pub overall_score: f64,
    pub overall_level: QualityLevel,
    pub word_count: usize,
    pub readability_score: f64,
    pub metrics: Vec<QualityMetric>,
    pub issues: Vec<QualityIssue>,
    pub strengths: Vec<String>,
    pub recommendations: Vec<String>,
    /// The three lowest-scoring dimensions, weakest first.
    pub improvement_priority: Vec<String>,
    pub processing_time_s: f64,
    pub worker_id: Option<WorkerId>,
    pub created_at: DateTime<Utc>,
}

/// Assemble the report from the fused metrics and the issue list.
#[allow(clippy::too_many_arguments)]
pub fn synthesize(
    content_id: String,
    content_type: ContentType,
    worker_id: Option<WorkerId>,
    basic: &BasicMetrics,
    readability_score: f64,
    metrics: Vec<QualityMetric>,
    issues: Vec<QualityIssue>,
    processing_time_s: f64,
) -> QualityReport {
    let overall_score = if metrics.is_empty() {
        3.0
    } else {
        metrics.iter().map(|m| m.score).sum::<f64>() / metrics.len() as f64
    };
    let overall_level = score_to_level(overall_score);

    let strengths: Vec<String> = metrics
        .iter()
        .filter(|m| m.score >= 4.0)
        .map(|m| format!("Strong {}: {}", m.dimension.as_str(), m.explanation))
        .collect();

    let mut recommendations = Vec::new();
    if issues.iter().any(|i| i.severity == IssueSeverity::Critical) {
        recommendations.push("Address critical issues immediately".to_string());
    }
    if issues.iter().any(|i| i.severity == IssueSeverity::High) {
        recommendations.push("Focus on high-severity issues first".to_string());
    }
    for metric in metrics.iter().filter(|m| m.score < 3.0) {
        recommendations.extend(metric.suggestions.iter().take(2).cloned());
    }
    if overall_score < acceptance_threshold(content_type) {
        recommendations.push(format!(
            "Content quality below {} standards",
            content_type.as_str()
        ));
    }
    let recommendations = util::dedup_preserving_order(recommendations);

    let mut ranked = metrics.clone();
    ranked.sort_by(|a, b| a.score.partial_cmp(&b.score).unwrap_or(std::cmp::Ordering::Equal));
    let improvement_priority = ranked
        .iter()
        .take(3)
        .map(|m| m.dimension.as_str().to_string())
        .collect();

    QualityReport {
        content_id,
        content_type,
        overall_score,
        overall_level,
        word_count: basic.word_count,
        readability_score,
        metrics,
        issues,
        strengths,
        recommendations,
        improvement_priority,
        processing_time_s,
        worker_id,
        created_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::dimensions::QualityDimension;

    fn metric(dimension: QualityDimension, score: f64) -> QualityMetric {
        QualityMetric {
            dimension,
            score,
            level: score_to_level(score),
            explanation: "test".into(),
            suggestions: vec!["improve it".into()],
            confidence: 0.8,
        }
    }

    #[test]
    fn empty_metrics_default_to_three() {
        let report = synthesize(
            "q1".into(),
            ContentType::Article,
            None,
            &BasicMetrics::default(),
            2.5,
            vec![],
            vec![],
            0.0,
        );
        assert!((report.overall_score - 3.0).abs() < 1e-9);
        assert_eq!(report.overall_level, QualityLevel::Acceptable);
    }

    #[test]
    fn weakest_dimensions_lead_the_improvement_priority() {
        let report = synthesize(
            "q2".into(),
            ContentType::Article,
            None,
            &BasicMetrics::default(),
            4.0,
            vec![
                metric(QualityDimension::Clarity, 4.5),
                metric(QualityDimension::Grammar, 2.0),
                metric(QualityDimension::Tone, 3.0),
                metric(QualityDimension::Style, 4.8),
            ],
            vec![],
            0.0,
        );
        assert_eq!(report.improvement_priority, vec!["grammar", "tone", "clarity"]);
        assert!(report.strengths.iter().any(|s| s.contains("clarity")));
    }

    #[test]
    fn below_threshold_adds_a_standards_recommendation() {
        let report = synthesize(
            "q3".into(),
            ContentType::AcademicPaper,
            None,
            &BasicMetrics::default(),
            4.0,
            vec![metric(QualityDimension::Accuracy, 4.0)],
            vec![],
            0.0,
        );
        assert!(report
            .recommendations
            .iter()
            .any(|r| r.contains("below academic_paper standards")));
    }
}
