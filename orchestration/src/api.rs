//! JSON submission surface.
//!
//! The transport itself lives outside this workspace; these are the
//! JSON-shaped types callers exchange with it.

use scriptorium_contracts::{
    PermissionLevel, Request, RequestOptions, TaskKind, TaskStatus, WorkflowId,
};
use scriptorium_guardrails::GuardrailReports;
use serde::{Deserialize, Serialize};

use crate::orchestrator::WorkflowResult;
use crate::workflow::WorkflowFailure;

/// An incoming submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionRequest {
    pub task_kind: TaskKind,
    pub content: String,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub user_preferences: Option<RequestOptions>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub document_id: Option<String>,
    /// Top-level permission grant; wins over the one in preferences.
    #[serde(default)]
    pub permission_level: Option<PermissionLevel>,
    #[serde(default)]
    pub user_id: Option<String>,
}

impl SubmissionRequest {
    pub fn into_request(self) -> Request {
        let mut options = self.user_preferences.unwrap_or_default();
        if self.permission_level.is_some() {
            options.permission_level = self.permission_level;
        }
        Request {
            task_kind: self.task_kind,
            content: self.content,
            context: self.context,
            options,
            project_id: self.project_id,
            document_id: self.document_id,
            user_id: self.user_id,
        }
    }
}

/// Terminal response for a workflow: exactly one of completed, failed, or
/// cancelled.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WorkflowOutcome {
    Completed {
        workflow_id: WorkflowId,
        content: String,
        reports: Box<GuardrailReports>,
        accepted: bool,
    },
    Failed {
        workflow_id: WorkflowId,
        error: WorkflowFailure,
        /// Whatever partial guardrail data exists.
        reports: Option<Box<GuardrailReports>>,
    },
    Cancelled {
        workflow_id: WorkflowId,
    },
}

impl WorkflowOutcome {
    pub fn from_result(result: &WorkflowResult) -> Self {
        match (result.status, result.reports.clone()) {
            (TaskStatus::Completed, Some(reports)) => Self::Completed {
                workflow_id: result.workflow_id,
                content: result.final_content.clone().unwrap_or_default(),
                accepted: reports.accepted,
                reports: Box::new(reports),
            },
            (TaskStatus::Cancelled, _) => Self::Cancelled { workflow_id: result.workflow_id },
            (_, reports) => Self::Failed {
                workflow_id: result.workflow_id,
                error: result.failure.clone().unwrap_or(WorkflowFailure {
                    kind: scriptorium_contracts::ErrorKind::BackendFailure,
                    message: "workflow failed".to_string(),
                    failing_task_id: None,
                    evidence: Vec::new(),
                }),
                reports: reports.map(Box::new),
            },
        }
    }
}
