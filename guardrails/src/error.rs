//! Guardrail error taxonomy.
//!
//! Backend failures inside the checkers are recovered locally with
//! conservative defaults and never surface here; what remains are misuse
//! errors around the objective registry.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GuardrailError {
    #[error("objectives for project {project_id} are locked by an in-flight workflow")]
    ObjectivesLocked { project_id: String },

    #[error("no objectives registered for project {project_id}")]
    UnknownProject { project_id: String },
}
