//! The guardrail pipeline: all three checkers, run concurrently, and the
//! acceptance flag.

use std::sync::Arc;

use scriptorium_backend::GenerationBackend;
use scriptorium_config::GuardrailsConfig;
use scriptorium_contracts::{ContentType, VerificationLevel, WorkerId};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::deviation::{DeviationMonitor, DeviationReport, DeviationRiskLevel};
use crate::hallucination::{HallucinationChecker, HallucinationReport};
use crate::quality::{acceptance_threshold, QualityAssessor, QualityReport};

/// The three per-workflow reports plus the derived acceptance flag.
/// Immutable once emitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardrailReports {
    pub hallucination: HallucinationReport,
    pub quality: QualityReport,
    pub deviation: DeviationReport,
    pub accepted: bool,
}

/// Runs the three checkers over final content. The checkers share no
/// mutable state with one another; each owns its own caches and counters.
pub struct GuardrailPipeline {
    hallucination: HallucinationChecker,
    quality: QualityAssessor,
    deviation: Arc<DeviationMonitor>,
    config: GuardrailsConfig,
}

impl GuardrailPipeline {
    pub fn new(backend: Arc<dyn GenerationBackend>, config: GuardrailsConfig) -> Self {
        Self {
            hallucination: HallucinationChecker::new(
                backend.clone(),
                config.verification_cache_capacity,
            ),
            quality: QualityAssessor::new(backend.clone()),
            deviation: Arc::new(DeviationMonitor::new(backend, config.semantic_scan_chars)),
            config,
        }
    }

    /// The deviation monitor, for objective registration and in-flight
    /// marking.
    pub fn deviation(&self) -> &Arc<DeviationMonitor> {
        &self.deviation
    }

    pub fn hallucination(&self) -> &HallucinationChecker {
        &self.hallucination
    }

    pub fn quality(&self) -> &QualityAssessor {
        &self.quality
    }

    /// Run all three checkers concurrently and derive the acceptance flag.
    pub async fn run(
        &self,
        content: &str,
        content_type: ContentType,
        verification_level: VerificationLevel,
        project_id: &str,
        worker_id: Option<WorkerId>,
    ) -> GuardrailReports {
        let (hallucination, quality, deviation) = tokio::join!(
            self.hallucination.check(content, verification_level, content_type),
            self.quality.assess(content, content_type, worker_id),
            self.deviation.check(content, project_id, content_type),
        );

        let accepted = Self::acceptance(
            &hallucination,
            &quality,
            &deviation,
            verification_level,
            self.config.hallucination_risk_threshold,
        );
        info!(
            accepted,
            risk_score = hallucination.risk_score,
            quality_score = quality.overall_score,
            deviation_risk = ?deviation.risk_assessment.overall_risk_level,
            "guardrail pipeline complete"
        );

        GuardrailReports { hallucination, quality, deviation, accepted }
    }

    /// Acceptance = low hallucination risk, quality at or above the
    /// content-type threshold, and tolerable deviation risk. A critical
    /// verification level with unresolved needs-review claims always fails.
    fn acceptance(
        hallucination: &HallucinationReport,
        quality: &QualityReport,
        deviation: &DeviationReport,
        verification_level: VerificationLevel,
        risk_threshold: f64,
    ) -> bool {
        if verification_level == VerificationLevel::Critical
            && hallucination.needs_review_claims > 0
        {
            return false;
        }
        hallucination.risk_score < risk_threshold
            && quality.overall_score >= acceptance_threshold(quality.content_type)
            && matches!(
                deviation.risk_assessment.overall_risk_level,
                DeviationRiskLevel::Low | DeviationRiskLevel::Medium
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scriptorium_backend::ScriptedBackend;

    fn clean_backend() -> Arc<ScriptedBackend> {
        Arc::new(
            ScriptedBackend::new()
                .rule(
                    "Assess the quality",
                    r#"[
                        {"dimension": "clarity", "score": 4.6, "explanation": "clear", "suggestions": [], "confidence": 0.9},
                        {"dimension": "engagement", "score": 4.4, "explanation": "lively", "suggestions": [], "confidence": 0.9},
                        {"dimension": "accuracy", "score": 4.5, "explanation": "sound", "suggestions": [], "confidence": 0.9}
                    ]"#,
                )
                .rule("Check whether the content complies", r#"{"compliant": true, "compliance_score": 0.95}"#)
                .rule("Fact-check the following claim", r#"{"result": "VERIFIED", "confidence": 0.9, "explanation": "ok"}"#)
                .with_default("[]"),
        )
    }

    fn social_post() -> &'static str {
        "Bees keep cities green. Rooftop hives are thriving this spring."
    }

    #[tokio::test]
    async fn clean_content_is_accepted() {
        let pipeline = GuardrailPipeline::new(clean_backend(), GuardrailsConfig::default());
        let reports = pipeline
            .run(
                social_post(),
                ContentType::SocialMedia,
                VerificationLevel::Standard,
                "p1",
                None,
            )
            .await;
        assert!(reports.accepted, "risk {} quality {}", reports.hallucination.risk_score, reports.quality.overall_score);
    }

    #[tokio::test]
    async fn critical_level_with_unreviewed_claims_blocks_acceptance() {
        let pipeline = GuardrailPipeline::new(clean_backend(), GuardrailsConfig::default());
        let reports = pipeline
            .run(
                "Honey output rose by 40% in 2021.",
                ContentType::SocialMedia,
                VerificationLevel::Critical,
                "p1",
                None,
            )
            .await;
        assert!(reports.hallucination.needs_review_claims > 0);
        assert!(!reports.accepted);
    }

    #[tokio::test]
    async fn checkers_each_emit_exactly_one_report() {
        let pipeline = GuardrailPipeline::new(clean_backend(), GuardrailsConfig::default());
        let reports = pipeline
            .run(social_post(), ContentType::SocialMedia, VerificationLevel::Basic, "p1", None)
            .await;
        assert_eq!(pipeline.hallucination().stats().total_runs, 1);
        assert_eq!(pipeline.quality().stats().total_assessments, 1);
        assert_eq!(pipeline.deviation().stats().total_checks, 1);
        assert_eq!(reports.deviation.project_id, "p1");
    }
}
