//! Configuration structures and loading.

use std::path::Path;

use scriptorium_resilience::{RateLimiterConfig, RetryConfig};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{validation, ConfigError};

/// Router policy knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Hard cap on supporting workers per decision.
    pub max_supporting_workers: usize,
    /// Base duration estimate in seconds, before complexity multipliers.
    pub base_duration_s: u64,
    /// Added estimate per supporting worker.
    pub supporting_duration_s: u64,
    /// Force the `assistant` permission level for destructive task kinds.
    pub force_assistant_for_destructive: bool,
    /// Make the single analysis call to the generation backend; the keyword
    /// path still runs either way.
    pub use_backend_analysis: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            max_supporting_workers: 3,
            base_duration_s: 60,
            supporting_duration_s: 30,
            force_assistant_for_destructive: true,
            use_backend_analysis: true,
        }
    }
}

/// Orchestrator and scheduler knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Per-workflow parallelism cap.
    pub parallelism: usize,
    pub retry: RetryConfig,
    /// Default per-task timeout in seconds; workers may declare their own.
    pub task_timeout_s: u64,
    /// Grace period granted to running tasks after cancellation.
    pub cancellation_grace_s: u64,
    /// Optional wall-clock deadline for a whole workflow.
    pub workflow_deadline_s: Option<u64>,
    /// How long terminal workflows are retained before reaping.
    pub retention_s: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            parallelism: 3,
            retry: RetryConfig::default(),
            task_timeout_s: 30,
            cancellation_grace_s: 5,
            workflow_deadline_s: None,
            retention_s: 3_600,
        }
    }
}

/// Generation backend call defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub max_tokens: u32,
    pub temperature: f64,
    pub timeout_s: u64,
    pub rate_limit: RateLimiterConfig,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            max_tokens: 1_024,
            temperature: 0.1,
            timeout_s: 30,
            rate_limit: RateLimiterConfig::default(),
        }
    }
}

/// Guardrail pipeline knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardrailsConfig {
    /// Capacity of the claim-verification LRU cache.
    pub verification_cache_capacity: usize,
    /// Acceptance gate on the hallucination risk score.
    pub hallucination_risk_threshold: f64,
    /// Content prefix length passed to semantic deviation scans.
    pub semantic_scan_chars: usize,
}

impl Default for GuardrailsConfig {
    fn default() -> Self {
        Self {
            verification_cache_capacity: 10_000,
            hallucination_risk_threshold: 0.3,
            semantic_scan_chars: 2_000,
        }
    }
}

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub router: RouterConfig,
    pub orchestrator: OrchestratorConfig,
    pub backend: BackendConfig,
    pub guardrails: GuardrailsConfig,
}

impl AppConfig {
    /// Parse from TOML text, validate, apply env overrides.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let mut config: AppConfig = toml::from_str(text)?;
        config.apply_env_overrides();
        validation::validate(&config)?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Defaults plus env overrides, no file.
    pub fn load_default() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env_overrides();
        validation::validate(&config)?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Some(v) = env_parse::<usize>("SCRIPTORIUM_PARALLELISM") {
            self.orchestrator.parallelism = v;
        }
        if let Some(v) = env_parse::<u64>("SCRIPTORIUM_TASK_TIMEOUT_S") {
            self.orchestrator.task_timeout_s = v;
        }
        if let Some(v) = env_parse::<u64>("SCRIPTORIUM_CANCELLATION_GRACE_S") {
            self.orchestrator.cancellation_grace_s = v;
        }
        if let Some(v) = env_parse::<u32>("SCRIPTORIUM_MAX_TOKENS") {
            self.backend.max_tokens = v;
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            debug!(key, raw, "ignoring unparseable env override");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        assert!(validation::validate(&config).is_ok());
        assert_eq!(config.orchestrator.parallelism, 3);
        assert_eq!(config.orchestrator.cancellation_grace_s, 5);
        assert_eq!(config.guardrails.verification_cache_capacity, 10_000);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [orchestrator]
            parallelism = 5

            [router]
            force_assistant_for_destructive = false
            "#,
        )
        .unwrap();
        assert_eq!(config.orchestrator.parallelism, 5);
        assert!(!config.router.force_assistant_for_destructive);
        assert_eq!(config.orchestrator.task_timeout_s, 30);
    }

    #[test]
    fn bad_toml_is_rejected() {
        assert!(AppConfig::from_toml("orchestrator = 3").is_err());
    }
}
