//! Quality assessment across the ten named dimensions.

pub mod dimensions;
pub mod issues;
pub mod report;
pub mod text_stats;

pub use dimensions::{
    acceptance_threshold, expected_word_range, QualityDimension, QualityLevel, QualityMetric,
};
pub use issues::{IssueSeverity, QualityIssue};
pub use report::QualityReport;
pub use text_stats::BasicMetrics;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use scriptorium_backend::GenerationBackend;
use scriptorium_contracts::{ContentType, WorkerId};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;

/// Assessor-level counters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssessorStats {
    pub total_assessments: u64,
    pub average_overall_score: f64,
    pub level_distribution: BTreeMap<QualityLevel, u64>,
}

/// Scores content across quality dimensions and identifies issues.
pub struct QualityAssessor {
    backend: Arc<dyn GenerationBackend>,
    stats: Mutex<AssessorStats>,
}

impl QualityAssessor {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self { backend, stats: Mutex::new(AssessorStats::default()) }
    }

    /// Full assessment pipeline: basic metrics, readability, AI and rule
    /// dimension passes fused 0.7/0.3, issue identification, synthesis.
    pub async fn assess(
        &self,
        content: &str,
        content_type: ContentType,
        worker_id: Option<WorkerId>,
    ) -> QualityReport {
        let started = Instant::now();
        let content_id = {
            let digest = Sha256::digest(content.as_bytes());
            format!("qa_{}", &format!("{digest:x}")[..12])
        };

        let basic = text_stats::basic_metrics(content);
        let readability = text_stats::readability_score(content);

        let ai_metrics = dimensions::assess_ai(self.backend.as_ref(), content, content_type).await;
        let rule_metrics = dimensions::assess_rules(content, content_type);
        let fused = dimensions::fuse(ai_metrics, rule_metrics);

        let mut all_issues = issues::find_rule_issues(content);
        all_issues
            .extend(issues::find_ai_issues(self.backend.as_ref(), content, content_type).await);
        let deduped = issues::dedup_issues(all_issues);

        let report = report::synthesize(
            content_id,
            content_type,
            worker_id,
            &basic,
            readability,
            fused,
            deduped,
            started.elapsed().as_secs_f64(),
        );
        self.record(&report);
        info!(
            content_id = %report.content_id,
            overall_score = report.overall_score,
            issues = report.issues.len(),
            "quality assessment complete"
        );
        report
    }

    fn record(&self, report: &QualityReport) {
        let mut stats = self.stats.lock();
        stats.total_assessments += 1;
        let n = stats.total_assessments as f64;
        stats.average_overall_score += (report.overall_score - stats.average_overall_score) / n;
        *stats.level_distribution.entry(report.overall_level).or_default() += 1;
    }

    pub fn stats(&self) -> AssessorStats {
        self.stats.lock().clone()
    }
}
