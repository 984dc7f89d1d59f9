//! Deviation monitoring: plan adherence and goal alignment.

pub mod patterns;
pub mod risk;
pub mod types;

pub use types::{
    AlertLevel, ComplianceCheck, DeviationAlert, DeviationReport, DeviationRiskLevel,
    DeviationSeverity, DeviationType, ObjectiveCategory, ObjectivePriority, ProjectObjective,
    RiskAssessment,
};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use scriptorium_backend::{GenerationBackend, GenerationRequest};
use scriptorium_contracts::ContentType;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::error::GuardrailError;
use crate::util;

/// Cap on semantic-scan findings per check.
const SEMANTIC_DEVIATION_LIMIT: usize = 8;

/// Monitor-level counters.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MonitorStats {
    pub total_checks: u64,
    pub alerts_raised: u64,
    pub average_compliance_score: f64,
}

/// Watches produced content for deviations from registered project
/// objectives.
pub struct DeviationMonitor {
    backend: Arc<dyn GenerationBackend>,
    projects: RwLock<HashMap<String, Vec<ProjectObjective>>>,
    /// Refcount of in-flight workflows per project; objective replacement
    /// is rejected while non-zero.
    active: Mutex<HashMap<String, usize>>,
    stats: Mutex<MonitorStats>,
    semantic_scan_chars: usize,
}

/// RAII marker that a workflow for a project is in flight.
pub struct ProjectGuard {
    monitor: Arc<DeviationMonitor>,
    project_id: String,
}

impl Drop for ProjectGuard {
    fn drop(&mut self) {
        let mut active = self.monitor.active.lock();
        if let Some(count) = active.get_mut(&self.project_id) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                active.remove(&self.project_id);
            }
        }
    }
}

impl DeviationMonitor {
    pub fn new(backend: Arc<dyn GenerationBackend>, semantic_scan_chars: usize) -> Self {
        Self {
            backend,
            projects: RwLock::new(HashMap::new()),
            active: Mutex::new(HashMap::new()),
            stats: Mutex::new(MonitorStats::default()),
            semantic_scan_chars,
        }
    }

    /// Replace a project's objectives atomically. Rejected while any
    /// workflow for the project is in flight.
    pub fn register_objectives(
        &self,
        project_id: &str,
        objectives: Vec<ProjectObjective>,
    ) -> Result<(), GuardrailError> {
        if self.active.lock().get(project_id).copied().unwrap_or(0) > 0 {
            return Err(GuardrailError::ObjectivesLocked { project_id: project_id.to_string() });
        }
        info!(project_id, objectives = objectives.len(), "registered project objectives");
        self.projects.write().insert(project_id.to_string(), objectives);
        Ok(())
    }

    pub fn objectives(&self, project_id: &str) -> Option<Vec<ProjectObjective>> {
        self.projects.read().get(project_id).cloned()
    }

    /// Mark a workflow for `project_id` as in flight for the guard's
    /// lifetime.
    pub fn activate(self: &Arc<Self>, project_id: &str) -> ProjectGuard {
        *self.active.lock().entry(project_id.to_string()).or_insert(0) += 1;
        ProjectGuard { monitor: Arc::clone(self), project_id: project_id.to_string() }
    }

    /// Objectives assumed for a content type when a project has none
    /// registered.
    pub fn default_objectives(content_type: ContentType) -> Vec<ProjectObjective> {
        let objective = |id: &str, description: &str, category, priority, criteria: &[&str]| {
            ProjectObjective {
                id: id.to_string(),
                description: description.to_string(),
                category,
                priority,
                measurable_criteria: criteria.iter().map(|c| c.to_string()).collect(),
                constraints: vec![],
            }
        };
        match content_type {
            ContentType::BusinessDocument => vec![
                objective(
                    "business_professionalism",
                    "Maintain a professional tone throughout",
                    ObjectiveCategory::Tone,
                    ObjectivePriority::High,
                    &["formal language", "no casual expressions"],
                ),
                objective(
                    "business_structure",
                    "Follow standard business document structure",
                    ObjectiveCategory::Structure,
                    ObjectivePriority::High,
                    &["clear sections", "logical flow"],
                ),
            ],
            ContentType::AcademicPaper => vec![
                objective(
                    "academic_rigor",
                    "Maintain academic standards and rigor",
                    ObjectiveCategory::Accuracy,
                    ObjectivePriority::Critical,
                    &["proper citations", "evidence-based claims"],
                ),
                objective(
                    "academic_structure",
                    "Follow academic paper structure",
                    ObjectiveCategory::Structure,
                    ObjectivePriority::High,
                    &["abstract", "introduction", "methodology", "conclusion"],
                ),
            ],
            _ => vec![
                objective(
                    "content_clarity",
                    "Content should be clear and easy to understand",
                    ObjectiveCategory::Clarity,
                    ObjectivePriority::High,
                    &["readable prose", "no ambiguous statements"],
                ),
                objective(
                    "content_engagement",
                    "Content should be engaging and interesting",
                    ObjectiveCategory::Engagement,
                    ObjectivePriority::Medium,
                    &["engaging introduction", "compelling examples"],
                ),
            ],
        }
    }

    /// Run the full deviation check against the project's objectives (or
    /// content-type defaults when none are registered).
    pub async fn check(
        &self,
        content: &str,
        project_id: &str,
        content_type: ContentType,
    ) -> DeviationReport {
        let started = Instant::now();
        let content_id = {
            let digest = Sha256::digest(content.as_bytes());
            format!("dev_{}", &format!("{digest:x}")[..12])
        };
        let objectives = self
            .objectives(project_id)
            .unwrap_or_else(|| Self::default_objectives(content_type));

        let mut alerts = patterns::scan(content);
        alerts.extend(self.scan_semantic(content, &objectives).await);

        let mut checks = Vec::with_capacity(objectives.len());
        for objective in &objectives {
            checks.push(self.check_compliance(content, objective).await);
        }

        let risk_assessment = risk::assess(&alerts, &checks);
        let report = Self::build_report(
            content_id,
            project_id,
            alerts,
            checks,
            risk_assessment,
            started,
        );
        self.record(&report);
        info!(
            content_id = %report.content_id,
            alerts = report.alerts.len(),
            compliance = report.overall_compliance_score,
            "deviation check complete"
        );
        report
    }

    async fn scan_semantic(
        &self,
        content: &str,
        objectives: &[ProjectObjective],
    ) -> Vec<DeviationAlert> {
        #[derive(Debug, Deserialize)]
        struct SemanticDeviation {
            deviation_type: Option<String>,
            severity: Option<String>,
            description: String,
            #[serde(default)]
            affected_objective: Option<String>,
            #[serde(default)]
            evidence: Option<String>,
            #[serde(default)]
            suggested_correction: Option<String>,
            #[serde(default)]
            confidence: Option<f64>,
        }

        let objective_summary = objectives
            .iter()
            .map(|o| format!("- {} ({:?}): {}", o.id, o.priority, o.description))
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = format!(
            "Analyze the following content for deviations from these project \
             objectives.\n\nObjectives:\n{objective_summary}\n\nDeviation kinds: \
             scope_creep, goal_misalignment, tone_deviation, style_inconsistency, \
             content_drift, structural_deviation, requirement_violation. Return a \
             JSON array of at most {SEMANTIC_DEVIATION_LIMIT} objects shaped as \
             {{\"deviation_type\": \"content_drift\", \"severity\": \
             \"minor|moderate|major|critical\", \"description\": \"...\", \
             \"affected_objective\": \"id\", \"evidence\": \"text\", \
             \"suggested_correction\": \"...\", \"confidence\": 0.8}}.\n\n\
             Content:\n{}",
            util::prefix(content, self.semantic_scan_chars)
        );

        let response = match self
            .backend
            .generate(GenerationRequest::new(prompt).with_max_tokens(1_500))
            .await
        {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "semantic deviation scan failed");
                return Vec::new();
            }
        };
        let parsed: Vec<SemanticDeviation> = match serde_json::from_str(&response.content) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(error = %err, "semantic deviation scan returned unparseable JSON");
                return Vec::new();
            }
        };

        parsed
            .into_iter()
            .take(SEMANTIC_DEVIATION_LIMIT)
            .enumerate()
            .map(|(i, d)| {
                let deviation_type = match d.deviation_type.as_deref() {
                    Some("scope_creep") => DeviationType::ScopeCreep,
                    Some("goal_misalignment") => DeviationType::GoalMisalignment,
                    Some("tone_deviation") => DeviationType::ToneDeviation,
                    Some("style_inconsistency") => DeviationType::StyleInconsistency,
                    Some("structural_deviation") => DeviationType::StructuralDeviation,
                    Some("requirement_violation") => DeviationType::RequirementViolation,
                    Some("permission_overreach") => DeviationType::PermissionOverreach,
                    _ => DeviationType::ContentDrift,
                };
                let severity = match d.severity.as_deref() {
                    Some("minor") => DeviationSeverity::Minor,
                    Some("major") => DeviationSeverity::Major,
                    Some("critical") => DeviationSeverity::Critical,
                    _ => DeviationSeverity::Moderate,
                };
                DeviationAlert {
                    id: format!("ai_alert_{}", i + 1),
                    deviation_type,
                    severity,
                    alert_level: types::alert_level_for(severity),
                    description: d.description,
                    affected_objective_id: d
                        .affected_objective
                        .unwrap_or_else(|| "general".to_string()),
                    evidence: d.evidence.into_iter().collect(),
                    suggested_correction: d.suggested_correction.unwrap_or_default(),
                    confidence: d.confidence.unwrap_or(0.7).clamp(0.0, 1.0),
                    created_at: Utc::now(),
                    resolved: false,
                }
            })
            .collect()
    }

    async fn check_compliance(
        &self,
        content: &str,
        objective: &ProjectObjective,
    ) -> ComplianceCheck {
        #[derive(Debug, Deserialize)]
        struct BackendCompliance {
            compliant: bool,
            compliance_score: f64,
            #[serde(default)]
            violations: Vec<String>,
            #[serde(default)]
            recommendations: Vec<String>,
            #[serde(default)]
            evidence: Vec<String>,
        }

        let prompt = format!(
            "Check whether the content complies with this objective.\n\n\
             Objective {}: {}\nCategory: {:?}\nCriteria: {}\nConstraints: {}\n\n\
             Return JSON: {{\"compliant\": true, \"compliance_score\": 0.85, \
             \"violations\": [], \"recommendations\": [], \"evidence\": []}}\n\n\
             Content:\n{}",
            objective.id,
            objective.description,
            objective.category,
            objective.measurable_criteria.join("; "),
            objective.constraints.join("; "),
            util::prefix(content, 1_500)
        );

        let fallback = |cause: &str| ComplianceCheck {
            objective_id: objective.id.clone(),
            compliant: true,
            compliance_score: 0.5,
            violations: vec![format!("Unable to verify compliance: {cause}")],
            recommendations: vec!["Manual review recommended".to_string()],
            evidence: vec![],
        };

        match self
            .backend
            .generate(GenerationRequest::new(prompt).with_max_tokens(800))
            .await
        {
            Ok(response) => match serde_json::from_str::<BackendCompliance>(&response.content) {
                Ok(parsed) => ComplianceCheck {
                    objective_id: objective.id.clone(),
                    compliant: parsed.compliant,
                    compliance_score: parsed.compliance_score.clamp(0.0, 1.0),
                    violations: parsed.violations,
                    recommendations: parsed.recommendations,
                    evidence: parsed.evidence,
                },
                Err(_) => fallback("unparseable compliance response"),
            },
            Err(err) => {
                warn!(objective = %objective.id, error = %err, "compliance check failed");
                fallback(&err.to_string())
            }
        }
    }

    fn build_report(
        content_id: String,
        project_id: &str,
        alerts: Vec<DeviationAlert>,
        checks: Vec<ComplianceCheck>,
        risk_assessment: RiskAssessment,
        started: Instant,
    ) -> DeviationReport {
        let overall_compliance_score = if checks.is_empty() {
            1.0
        } else {
            checks.iter().map(|c| c.compliance_score).sum::<f64>() / checks.len() as f64
        };
        let compliant_objectives = checks.iter().filter(|c| c.compliant).count();

        let mut corrective_actions = Vec::new();
        for alert in alerts.iter().filter(|a| a.severity == DeviationSeverity::Critical) {
            if !alert.suggested_correction.is_empty() {
                corrective_actions.push(format!("CRITICAL: {}", alert.suggested_correction));
            }
        }
        for check in checks.iter().filter(|c| !c.compliant) {
            corrective_actions.extend(check.recommendations.iter().take(2).cloned());
        }
        corrective_actions.extend(risk_assessment.mitigation_priority.iter().cloned());
        let corrective_actions = util::dedup_preserving_order(corrective_actions);

        DeviationReport {
            content_id,
            project_id: project_id.to_string(),
            overall_compliance_score,
            total_objectives: checks.len(),
            compliant_objectives,
            alerts,
            compliance_checks: checks,
            risk_assessment,
            corrective_actions,
            processing_time_s: started.elapsed().as_secs_f64(),
            created_at: Utc::now(),
        }
    }

    fn record(&self, report: &DeviationReport) {
        let mut stats = self.stats.lock();
        stats.total_checks += 1;
        stats.alerts_raised += report.alerts.len() as u64;
        let n = stats.total_checks as f64;
        stats.average_compliance_score +=
            (report.overall_compliance_score - stats.average_compliance_score) / n;
    }

    pub fn stats(&self) -> MonitorStats {
        *self.stats.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scriptorium_backend::ScriptedBackend;

    fn objective() -> ProjectObjective {
        ProjectObjective {
            id: "obj_1".into(),
            description: "Stay on topic".into(),
            category: ObjectiveCategory::Content,
            priority: ObjectivePriority::High,
            measurable_criteria: vec![],
            constraints: vec![],
        }
    }

    fn compliant_backend() -> Arc<ScriptedBackend> {
        Arc::new(
            ScriptedBackend::new()
                .rule("Check whether the content complies", r#"{"compliant": true, "compliance_score": 0.9}"#)
                .with_default("[]"),
        )
    }

    #[tokio::test]
    async fn check_uses_registered_objectives() {
        let monitor = DeviationMonitor::new(compliant_backend(), 2_000);
        monitor.register_objectives("p1", vec![objective()]).unwrap();
        let report = monitor.check("On-topic text.", "p1", ContentType::Article).await;
        assert_eq!(report.total_objectives, 1);
        assert_eq!(report.compliant_objectives, 1);
        assert!((report.overall_compliance_score - 0.9).abs() < 1e-9);
    }

    #[tokio::test]
    async fn unregistered_project_falls_back_to_defaults() {
        let monitor = DeviationMonitor::new(compliant_backend(), 2_000);
        let report = monitor.check("text", "unknown", ContentType::AcademicPaper).await;
        assert_eq!(report.total_objectives, 2);
    }

    #[tokio::test]
    async fn compliance_failure_defaults_conservatively() {
        // backend errors on every call
        let monitor = DeviationMonitor::new(Arc::new(ScriptedBackend::new()), 2_000);
        let report = monitor.check("text", "unknown", ContentType::Article).await;
        assert!(report.compliance_checks.iter().all(|c| c.compliant));
        assert!(report
            .compliance_checks
            .iter()
            .all(|c| (c.compliance_score - 0.5).abs() < 1e-9));
    }

    #[tokio::test]
    async fn objective_replacement_is_rejected_while_in_flight() {
        let monitor = Arc::new(DeviationMonitor::new(compliant_backend(), 2_000));
        monitor.register_objectives("p1", vec![objective()]).unwrap();
        let guard = monitor.activate("p1");
        let err = monitor.register_objectives("p1", vec![]).unwrap_err();
        assert!(matches!(err, GuardrailError::ObjectivesLocked { .. }));
        drop(guard);
        assert!(monitor.register_objectives("p1", vec![]).is_ok());
    }
}
