//! Objectives, alerts, and the deviation report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveCategory {
    Content,
    Style,
    Structure,
    Tone,
    Accuracy,
    Clarity,
    Engagement,
    Completeness,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectivePriority {
    Low,
    Medium,
    High,
    Critical,
}

/// A registered project objective the monitor checks content against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectObjective {
    pub id: String,
    pub description: String,
    pub category: ObjectiveCategory,
    pub priority: ObjectivePriority,
    #[serde(default)]
    pub measurable_criteria: Vec<String>,
    #[serde(default)]
    pub constraints: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviationType {
    ScopeCreep,
    GoalMisalignment,
    ToneDeviation,
    StyleInconsistency,
    ContentDrift,
    StructuralDeviation,
    RequirementViolation,
    PermissionOverreach,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviationSeverity {
    Minor,
    Moderate,
    Major,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    Info,
    Warning,
    Error,
    Critical,
}

/// Severity for a deviation family, per the fixed table.
pub fn severity_for(deviation_type: DeviationType) -> DeviationSeverity {
    match deviation_type {
        DeviationType::ScopeCreep => DeviationSeverity::Moderate,
        DeviationType::GoalMisalignment => DeviationSeverity::Major,
        DeviationType::ToneDeviation => DeviationSeverity::Moderate,
        DeviationType::StyleInconsistency => DeviationSeverity::Minor,
        DeviationType::ContentDrift => DeviationSeverity::Moderate,
        DeviationType::StructuralDeviation => DeviationSeverity::Major,
        DeviationType::RequirementViolation => DeviationSeverity::Critical,
        DeviationType::PermissionOverreach => DeviationSeverity::Critical,
    }
}

pub fn alert_level_for(severity: DeviationSeverity) -> AlertLevel {
    match severity {
        DeviationSeverity::Minor => AlertLevel::Info,
        DeviationSeverity::Moderate => AlertLevel::Warning,
        DeviationSeverity::Major => AlertLevel::Error,
        DeviationSeverity::Critical => AlertLevel::Critical,
    }
}

/// An alert raised for a detected deviation. Created unresolved; resolution
/// is driven externally, never by the monitor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviationAlert {
    pub id: String,
    pub deviation_type: DeviationType,
    pub severity: DeviationSeverity,
    pub alert_level: AlertLevel,
    pub description: String,
    pub affected_objective_id: String,
    /// Extracted substrings supporting the alert.
    pub evidence: Vec<String>,
    pub suggested_correction: String,
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
    pub resolved: bool,
}

/// Result of checking content against one objective.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceCheck {
    pub objective_id: String,
    pub compliant: bool,
    pub compliance_score: f64,
    #[serde(default)]
    pub violations: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub evidence: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviationRiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

/// Aggregate risk picture over all alerts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub overall_risk_level: DeviationRiskLevel,
    /// Severity-weighted score normalized by alert count.
    pub risk_score: f64,
    pub critical_alerts: usize,
    pub major_alerts: usize,
    pub risk_factors: Vec<String>,
    pub mitigation_priority: Vec<String>,
}

/// Immutable deviation report for one piece of content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviationReport {
    pub content_id: String,
    pub project_id: String,
    pub overall_compliance_score: f64,
    pub total_objectives: usize,
    pub compliant_objectives: usize,
    pub alerts: Vec<DeviationAlert>,
    pub compliance_checks: Vec<ComplianceCheck>,
    pub risk_assessment: RiskAssessment,
    pub corrective_actions: Vec<String>,
    pub processing_time_s: f64,
    pub created_at: DateTime<Utc>,
}
