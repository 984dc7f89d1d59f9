//! Risk aggregation over deviation alerts and compliance checks.

use super::types::{
    ComplianceCheck, DeviationAlert, DeviationRiskLevel, DeviationSeverity, RiskAssessment,
};

fn severity_weight(severity: DeviationSeverity) -> f64 {
    match severity {
        DeviationSeverity::Critical => 1.0,
        DeviationSeverity::Major => 0.7,
        DeviationSeverity::Moderate => 0.4,
        DeviationSeverity::Minor => 0.1,
    }
}

/// Aggregate alerts and compliance outcomes into one risk picture.
pub fn assess(alerts: &[DeviationAlert], checks: &[ComplianceCheck]) -> RiskAssessment {
    let count = |severity: DeviationSeverity| {
        alerts.iter().filter(|a| a.severity == severity).count()
    };
    let critical = count(DeviationSeverity::Critical);
    let major = count(DeviationSeverity::Major);
    let moderate = count(DeviationSeverity::Moderate);

    let overall_risk_level = if critical > 0 {
        DeviationRiskLevel::Critical
    } else if major > 0 {
        DeviationRiskLevel::High
    } else if moderate >= 3 {
        DeviationRiskLevel::Medium
    } else {
        DeviationRiskLevel::Low
    };

    let risk_score = if alerts.is_empty() {
        0.0
    } else {
        let weighted: f64 = alerts.iter().map(|a| severity_weight(a.severity)).sum();
        (weighted / alerts.len() as f64).min(1.0)
    };

    let compliance_rate = if checks.is_empty() {
        1.0
    } else {
        checks.iter().filter(|c| c.compliant).count() as f64 / checks.len() as f64
    };

    let mut risk_factors = Vec::new();
    if critical > 0 {
        risk_factors.push("Critical deviations detected".to_string());
    }
    if compliance_rate < 0.8 {
        risk_factors.push("Low compliance rate".to_string());
    }
    if alerts.len() > 5 {
        risk_factors.push("High number of deviation alerts".to_string());
    }

    let mut mitigation_priority = Vec::new();
    if critical > 0 {
        mitigation_priority.push("Address critical deviations immediately".to_string());
    }
    if major > 0 {
        mitigation_priority.push("Resolve major deviations".to_string());
    }
    if compliance_rate < 0.7 {
        mitigation_priority.push("Improve objective compliance".to_string());
    }

    RiskAssessment {
        overall_risk_level,
        risk_score,
        critical_alerts: critical,
        major_alerts: major,
        risk_factors,
        mitigation_priority,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deviation::types::{alert_level_for, severity_for, DeviationType};
    use chrono::Utc;

    fn alert(deviation_type: DeviationType) -> DeviationAlert {
        let severity = severity_for(deviation_type);
        DeviationAlert {
            id: "a".into(),
            deviation_type,
            severity,
            alert_level: alert_level_for(severity),
            description: String::new(),
            affected_objective_id: "general".into(),
            evidence: vec![],
            suggested_correction: String::new(),
            confidence: 0.6,
            created_at: Utc::now(),
            resolved: false,
        }
    }

    #[test]
    fn no_alerts_is_low_risk_zero_score() {
        let assessment = assess(&[], &[]);
        assert_eq!(assessment.overall_risk_level, DeviationRiskLevel::Low);
        assert_eq!(assessment.risk_score, 0.0);
    }

    #[test]
    fn any_critical_alert_is_critical_risk() {
        let assessment = assess(&[alert(DeviationType::RequirementViolation)], &[]);
        assert_eq!(assessment.overall_risk_level, DeviationRiskLevel::Critical);
        assert!(assessment
            .mitigation_priority
            .iter()
            .any(|m| m.contains("critical")));
    }

    #[test]
    fn major_without_critical_is_high() {
        let assessment = assess(&[alert(DeviationType::GoalMisalignment)], &[]);
        assert_eq!(assessment.overall_risk_level, DeviationRiskLevel::High);
    }

    #[test]
    fn three_moderates_make_medium() {
        let alerts = vec![
            alert(DeviationType::ScopeCreep),
            alert(DeviationType::ToneDeviation),
            alert(DeviationType::ContentDrift),
        ];
        let assessment = assess(&alerts, &[]);
        assert_eq!(assessment.overall_risk_level, DeviationRiskLevel::Medium);
        assert!((assessment.risk_score - 0.4).abs() < 1e-9);
    }

    #[test]
    fn two_moderates_stay_low() {
        let alerts = vec![alert(DeviationType::ScopeCreep), alert(DeviationType::ToneDeviation)];
        assert_eq!(assess(&alerts, &[]).overall_risk_level, DeviationRiskLevel::Low);
    }
}
