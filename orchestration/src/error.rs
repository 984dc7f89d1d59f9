//! Orchestration error taxonomy.

use scriptorium_contracts::{ErrorKind, TaskId, WorkflowId};
use scriptorium_router::RouterError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrchestrationError {
    #[error("workflow {0} not found")]
    WorkflowNotFound(WorkflowId),

    #[error("workflow {workflow_id} was already executed")]
    AlreadyExecuted { workflow_id: WorkflowId },

    #[error("workflow {workflow_id} was cancelled before execution")]
    CancelledBeforeExecution { workflow_id: WorkflowId },

    /// Construction-time rejection; the workflow never exists and never
    /// counts toward metrics.
    #[error("workflow rejected ({kind}): {message}")]
    Rejected {
        kind: ErrorKind,
        message: String,
        /// Task ids involved, e.g. the members of a dependency cycle.
        evidence: Vec<TaskId>,
    },

    #[error(transparent)]
    Router(#[from] RouterError),
}

impl OrchestrationError {
    pub fn rejected(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Rejected { kind, message: message.into(), evidence: Vec::new() }
    }
}
