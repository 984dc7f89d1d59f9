//! Claims, verdicts, and the hallucination report.

use chrono::{DateTime, Utc};
use scriptorium_contracts::VerificationLevel;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimCategory {
    Statistic,
    Date,
    Quote,
    Fact,
    Other,
}

/// A factual claim extracted from reviewed content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claim {
    pub id: String,
    pub text: String,
    pub category: ClaimCategory,
    /// Extraction confidence, not verification confidence.
    pub confidence: f64,
    /// The sentence the claim appears in.
    pub sentence: String,
    /// Character span within the reviewed content.
    pub span: (usize, usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Verified,
    Disputed,
    Unverifiable,
    #[serde(rename = "false")]
    FalseClaim,
    NeedsReview,
}

/// Outcome of verifying one claim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationResult {
    pub claim_id: String,
    pub verdict: Verdict,
    pub confidence: f64,
    pub explanation: String,
    pub suggested_correction: Option<String>,
    #[serde(default)]
    pub sources: Vec<String>,
}

/// Immutable hallucination report for one piece of content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HallucinationReport {
    pub content_id: String,
    pub verification_level: VerificationLevel,
    pub total_claims: usize,
    pub verified_claims: usize,
    pub disputed_claims: usize,
    pub false_claims: usize,
    pub unverifiable_claims: usize,
    pub needs_review_claims: usize,
    /// Mean per-claim verification confidence.
    pub overall_confidence: f64,
    /// Weighted share of problematic claims; 0 exactly when no claims.
    pub risk_score: f64,
    pub claims: Vec<Claim>,
    pub verifications: Vec<VerificationResult>,
    pub recommendations: Vec<String>,
    pub processing_time_s: f64,
    pub created_at: DateTime<Utc>,
}

/// Checker-level counters.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CheckerStats {
    pub total_runs: u64,
    pub cache_hits: u64,
    pub average_processing_time_s: f64,
}

impl CheckerStats {
    pub fn cache_hit_rate(&self, lookups: u64) -> f64 {
        if lookups == 0 {
            return 0.0;
        }
        self.cache_hits as f64 / lookups as f64
    }
}
