//! Hallucination checking: claim extraction, verification, and risk
//! scoring.

pub mod extraction;
pub mod patterns;
pub mod types;
pub mod verification;

pub use types::{
    CheckerStats, Claim, ClaimCategory, HallucinationReport, VerificationResult, Verdict,
};
pub use verification::VerificationCache;

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use parking_lot::Mutex;
use scriptorium_backend::GenerationBackend;
use scriptorium_contracts::{ContentType, VerificationLevel};
use sha2::{Digest, Sha256};
use tracing::info;

/// Fact-checks produced content and scores its hallucination risk.
pub struct HallucinationChecker {
    backend: Arc<dyn GenerationBackend>,
    cache: VerificationCache,
    stats: Mutex<CheckerStats>,
}

impl HallucinationChecker {
    pub fn new(backend: Arc<dyn GenerationBackend>, cache_capacity: usize) -> Self {
        Self {
            backend,
            cache: VerificationCache::new(cache_capacity),
            stats: Mutex::new(CheckerStats::default()),
        }
    }

    /// Run the full check: extract claims (pattern pass always, semantic
    /// pass at standard level and above, the two running concurrently with
    /// isolated failures), deduplicate, verify at the requested depth,
    /// aggregate.
    pub async fn check(
        &self,
        content: &str,
        level: VerificationLevel,
        content_type: ContentType,
    ) -> HallucinationReport {
        let started = Instant::now();
        let content_id = Self::content_id(content);

        let semantic_pass = async {
            if level >= VerificationLevel::Standard {
                extraction::extract_semantic(
                    self.backend.as_ref(),
                    content,
                    content_type.as_str(),
                )
                .await
            } else {
                Vec::new()
            }
        };
        let (mut claims, semantic) =
            tokio::join!(async { patterns::extract(content) }, semantic_pass);
        claims.extend(semantic);
        let claims = extraction::dedup_and_cap(claims);

        let verifications =
            verification::verify_all(self.backend.as_ref(), &self.cache, &claims, level).await;

        let report = self.build_report(content_id, level, claims, verifications, started);
        self.record_run(report.processing_time_s);
        info!(
            content_id = %report.content_id,
            claims = report.total_claims,
            risk_score = report.risk_score,
            "hallucination check complete"
        );
        report
    }

    fn content_id(content: &str) -> String {
        let digest = Sha256::digest(content.as_bytes());
        format!("{digest:x}")[..12].to_string()
    }

    fn build_report(
        &self,
        content_id: String,
        level: VerificationLevel,
        claims: Vec<Claim>,
        verifications: Vec<VerificationResult>,
        started: Instant,
    ) -> HallucinationReport {
        let count = |verdict: Verdict| {
            verifications.iter().filter(|v| v.verdict == verdict).count()
        };
        let verified = count(Verdict::Verified);
        let disputed = count(Verdict::Disputed);
        let false_claims = count(Verdict::FalseClaim);
        let unverifiable = count(Verdict::Unverifiable);
        let needs_review = count(Verdict::NeedsReview);

        let overall_confidence = if verifications.is_empty() {
            1.0
        } else {
            verifications.iter().map(|v| v.confidence).sum::<f64>() / verifications.len() as f64
        };

        let total_claims = claims.len();
        let risk_score = if total_claims == 0 {
            0.0
        } else {
            (false_claims as f64 * 1.0 + disputed as f64 * 0.7 + needs_review as f64 * 0.5)
                / total_claims as f64
        };

        let mut recommendations = Vec::new();
        if false_claims > 0 {
            recommendations
                .push("Content contains false information that should be corrected".to_string());
        }
        if disputed > 0 {
            recommendations.push("Some claims are disputed and require verification".to_string());
        }
        if needs_review > 0 {
            recommendations.push("Manual review recommended for unverified claims".to_string());
        }
        if risk_score > 0.3 {
            recommendations
                .push("High risk score; comprehensive fact-checking recommended".to_string());
        }
        if overall_confidence < 0.6 {
            recommendations
                .push("Low overall confidence; additional verification needed".to_string());
        }

        HallucinationReport {
            content_id,
            verification_level: level,
            total_claims,
            verified_claims: verified,
            disputed_claims: disputed,
            false_claims,
            unverifiable_claims: unverifiable,
            needs_review_claims: needs_review,
            overall_confidence,
            risk_score,
            claims,
            verifications,
            recommendations,
            processing_time_s: started.elapsed().as_secs_f64(),
            created_at: Utc::now(),
        }
    }

    fn record_run(&self, processing_time_s: f64) {
        let mut stats = self.stats.lock();
        stats.total_runs += 1;
        stats.cache_hits = self.cache.hits();
        let n = stats.total_runs as f64;
        stats.average_processing_time_s +=
            (processing_time_s - stats.average_processing_time_s) / n;
    }

    pub fn stats(&self) -> CheckerStats {
        *self.stats.lock()
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scriptorium_backend::ScriptedBackend;

    #[tokio::test]
    async fn no_claims_means_zero_risk() {
        let backend = Arc::new(ScriptedBackend::new().with_default("[]"));
        let checker = HallucinationChecker::new(backend, 64);
        let report = checker
            .check("Plain prose with nothing to verify here", VerificationLevel::Standard, ContentType::Article)
            .await;
        assert_eq!(report.total_claims, 0);
        assert_eq!(report.risk_score, 0.0);
        assert_eq!(report.overall_confidence, 1.0);
    }

    #[tokio::test]
    async fn basic_level_never_calls_the_backend() {
        let backend = Arc::new(ScriptedBackend::new());
        let checker = HallucinationChecker::new(backend.clone(), 64);
        let report = checker
            .check(
                "Output rose by 40% in 2021.",
                VerificationLevel::Basic,
                ContentType::Article,
            )
            .await;
        assert!(report.total_claims > 0);
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn false_claims_raise_risk_and_recommendations() {
        let backend = Arc::new(ScriptedBackend::new());
        let checker = HallucinationChecker::new(backend, 64);
        // future-dated claim trips the basic heuristic as false
        let report = checker
            .check("The bridge opened in 3024.", VerificationLevel::Basic, ContentType::Article)
            .await;
        assert!(report.false_claims > 0);
        assert!(report.risk_score > 0.0);
        assert!(report
            .recommendations
            .iter()
            .any(|r| r.contains("false information")));
    }

    #[tokio::test]
    async fn stats_roll_across_runs() {
        let backend = Arc::new(ScriptedBackend::new().with_default("[]"));
        let checker = HallucinationChecker::new(backend, 64);
        checker
            .check("nothing here", VerificationLevel::Basic, ContentType::Article)
            .await;
        checker
            .check("still nothing", VerificationLevel::Basic, ContentType::Article)
            .await;
        assert_eq!(checker.stats().total_runs, 2);
    }
}
