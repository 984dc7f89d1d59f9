//! Configuration validation.

use crate::settings::AppConfig;
use crate::ConfigError;

/// Reject configurations that would misbehave at runtime.
pub fn validate(config: &AppConfig) -> Result<(), ConfigError> {
    if config.orchestrator.parallelism == 0 {
        return Err(invalid("orchestrator.parallelism must be at least 1"));
    }
    if config.orchestrator.task_timeout_s == 0 {
        return Err(invalid("orchestrator.task_timeout_s must be at least 1"));
    }
    if config.orchestrator.retry.max_attempts == 0 {
        return Err(invalid("orchestrator.retry.max_attempts must be at least 1"));
    }
    let jitter = config.orchestrator.retry.jitter_factor;
    if !(0.0..=1.0).contains(&jitter) {
        return Err(invalid("orchestrator.retry.jitter_factor must be in [0, 1]"));
    }
    if config.router.max_supporting_workers > 3 {
        return Err(invalid("router.max_supporting_workers is capped at 3"));
    }
    if config.backend.max_tokens == 0 {
        return Err(invalid("backend.max_tokens must be at least 1"));
    }
    if !(0.0..=2.0).contains(&config.backend.temperature) {
        return Err(invalid("backend.temperature must be in [0, 2]"));
    }
    if config.guardrails.verification_cache_capacity == 0 {
        return Err(invalid("guardrails.verification_cache_capacity must be at least 1"));
    }
    let threshold = config.guardrails.hallucination_risk_threshold;
    if !(0.0..=1.0).contains(&threshold) {
        return Err(invalid("guardrails.hallucination_risk_threshold must be in [0, 1]"));
    }
    Ok(())
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::Invalid(message.to_string())
}
