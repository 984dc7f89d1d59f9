//! Typed configuration for the Scriptorium platform.
//!
//! One `AppConfig` covers the router, orchestrator, backend, and guardrail
//! components. Values come from defaults, an optional TOML file, and a
//! small set of environment overrides, in that order.

pub mod settings;
pub mod validation;

pub use settings::{
    AppConfig, BackendConfig, GuardrailsConfig, OrchestratorConfig, RouterConfig,
};
pub use validation::validate;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
