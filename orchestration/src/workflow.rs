//! Workflows: construction from a routing decision, validation, and
//! status derivation.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use scriptorium_contracts::{
    ContentType, ErrorKind, PermissionLevel, Request, RoutingDecision, Task, TaskId, TaskInput,
    TaskStatus, VerificationLevel, WorkflowId,
};
use scriptorium_guardrails::GuardrailReports;
use serde::{Deserialize, Serialize};

use crate::error::OrchestrationError;

/// Structured failure attached to a workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowFailure {
    pub kind: ErrorKind,
    pub message: String,
    pub failing_task_id: Option<TaskId>,
    #[serde(default)]
    pub evidence: Vec<String>,
}

/// A DAG of tasks produced from a single request.
#[derive(Debug, Clone)]
pub struct Workflow {
    pub id: WorkflowId,
    pub name: String,
    pub description: String,
    pub tasks: Vec<Task>,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub total_processing_time_s: Option<f64>,
    /// Permission level granted by the request.
    pub permission_level: PermissionLevel,
    pub content_type: ContentType,
    pub verification_level: VerificationLevel,
    pub user_id: Option<String>,
    pub document_id: Option<String>,
    pub project_id: Option<String>,
    pub final_content: Option<String>,
    pub reports: Option<GuardrailReports>,
    pub failure: Option<WorkflowFailure>,
}

impl Workflow {
    /// Build a workflow from a routing decision. Subtask ids are mapped to
    /// task ids in breakdown order; the primary subtask becomes `task-1`.
    pub fn from_decision(request: &Request, decision: &RoutingDecision) -> Self {
        let id_map: HashMap<&str, TaskId> = decision
            .task_breakdown
            .iter()
            .enumerate()
            .map(|(i, subtask)| (subtask.id.as_str(), TaskId::numbered(i + 1)))
            .collect();

        let tasks = decision
            .task_breakdown
            .iter()
            .enumerate()
            .map(|(i, subtask)| {
                let input = TaskInput {
                    description: subtask.description.clone(),
                    request_content: request.content.clone(),
                    context: request.context.clone(),
                    // supporting passes are role-driven, not kind-driven
                    task_kind: (i == 0).then_some(request.task_kind),
                    content_type: request.options.content_type,
                    audience: request.options.audience.clone(),
                    preserve_voice: request.options.preserve_voice,
                    correction_level: request.options.correction_level,
                    upstream: Vec::new(),
                };
                let dependencies = subtask
                    .depends_on
                    .iter()
                    .filter_map(|dep| id_map.get(dep.as_str()).cloned())
                    .collect();
                Task::new(
                    TaskId::numbered(i + 1),
                    subtask.worker,
                    input,
                    dependencies,
                    subtask.priority,
                )
            })
            .collect();

        Self::from_tasks(request, tasks)
    }

    /// Build a workflow from pre-planned tasks. Used for workflows that do
    /// not come out of the router.
    pub fn from_tasks(request: &Request, tasks: Vec<Task>) -> Self {
        let mut name = request.content.chars().take(60).collect::<String>();
        if name.is_empty() {
            name = "untitled workflow".to_string();
        }
        Self {
            id: WorkflowId::new(),
            name,
            description: request.content.clone(),
            tasks,
            status: TaskStatus::Pending,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            total_processing_time_s: None,
            permission_level: request.granted_permission(),
            content_type: request.options.content_type,
            verification_level: request.options.verification_level,
            user_id: request.user_id.clone(),
            document_id: request.document_id.clone(),
            project_id: request.project_id.clone(),
            final_content: None,
            reports: None,
            failure: None,
        }
    }

    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    pub fn task_mut(&mut self, id: &TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| &t.id == id)
    }

    /// Ids of every task transitively depending on `root`.
    pub fn transitive_dependents(&self, root: &TaskId) -> HashSet<TaskId> {
        let mut dependents = HashSet::new();
        let mut frontier = vec![root.clone()];
        while let Some(current) = frontier.pop() {
            for task in &self.tasks {
                if task.dependencies.contains(&current) && dependents.insert(task.id.clone()) {
                    frontier.push(task.id.clone());
                }
            }
        }
        dependents
    }

    /// Derive the workflow status once every task is terminal.
    pub fn derive_terminal_status(&self, cancellation_requested: bool) -> TaskStatus {
        if self.tasks.iter().all(|t| t.status == TaskStatus::Completed) {
            TaskStatus::Completed
        } else if self.failure.is_some() {
            // the scheduler already diagnosed this workflow (e.g. stuck)
            TaskStatus::Failed
        } else if cancellation_requested {
            TaskStatus::Cancelled
        } else if self.tasks.iter().any(|t| t.status == TaskStatus::Failed) {
            TaskStatus::Failed
        } else {
            TaskStatus::Cancelled
        }
    }

    /// Final content: the primary result folded forward through completed
    /// revision passes that consumed it, in breakdown order.
    pub fn fold_final_content(&self) -> Option<String> {
        use scriptorium_contracts::OutputKind;

        let primary_id = self.tasks.first()?.id.clone();
        let primary = self.task(&primary_id)?;
        let mut content = primary.result.as_ref()?.content.clone();
        let downstream = self.transitive_dependents(&primary_id);
        for task in self.tasks.iter().skip(1) {
            if task.status != TaskStatus::Completed || !downstream.contains(&task.id) {
                continue;
            }
            if let Some(result) = &task.result {
                if result.output_kind == OutputKind::Revision && !result.content.is_empty() {
                    content = result.content.clone();
                }
            }
        }
        Some(content)
    }
}

/// Construction-time validation: dependency existence, acyclicity, and the
/// permission gate. Rejected workflows never run and never count in
/// metrics.
pub fn validate(
    workflow: &Workflow,
    required_permission: PermissionLevel,
) -> Result<(), OrchestrationError> {
    let known: HashSet<&TaskId> = workflow.tasks.iter().map(|t| &t.id).collect();
    for task in &workflow.tasks {
        for dep in &task.dependencies {
            if !known.contains(dep) {
                return Err(OrchestrationError::Rejected {
                    kind: ErrorKind::InvalidRequest,
                    message: format!("task {} references unknown dependency {dep}", task.id),
                    evidence: vec![task.id.clone()],
                });
            }
        }
    }

    if let Some(cycle) = find_cycle(workflow) {
        return Err(OrchestrationError::Rejected {
            kind: ErrorKind::CyclicDependency,
            message: "workflow dependency graph contains a cycle".to_string(),
            evidence: cycle,
        });
    }

    if required_permission > workflow.permission_level {
        return Err(OrchestrationError::Rejected {
            kind: ErrorKind::PermissionOverreach,
            message: format!(
                "workflow requires {required_permission:?} but request granted {:?}",
                workflow.permission_level
            ),
            evidence: Vec::new(),
        });
    }

    Ok(())
}

/// DFS with temporary/permanent marks; returns the tasks on a back edge's
/// stack when a cycle exists.
fn find_cycle(workflow: &Workflow) -> Option<Vec<TaskId>> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unvisited,
        Temporary,
        Permanent,
    }

    fn visit(
        id: &TaskId,
        workflow: &Workflow,
        marks: &mut HashMap<TaskId, Mark>,
        stack: &mut Vec<TaskId>,
    ) -> bool {
        match marks.get(id).copied().unwrap_or(Mark::Unvisited) {
            Mark::Permanent => return false,
            Mark::Temporary => return true,
            Mark::Unvisited => {}
        }
        marks.insert(id.clone(), Mark::Temporary);
        stack.push(id.clone());
        if let Some(task) = workflow.task(id) {
            for dep in &task.dependencies {
                if visit(dep, workflow, marks, stack) {
                    return true;
                }
            }
        }
        stack.pop();
        marks.insert(id.clone(), Mark::Permanent);
        false
    }

    let mut marks = HashMap::new();
    for task in &workflow.tasks {
        let mut stack = Vec::new();
        if visit(&task.id, workflow, &mut marks, &mut stack) {
            return Some(stack);
        }
    }
    None
}

/// Point-in-time view of one task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub id: TaskId,
    pub worker_id: scriptorium_contracts::WorkerId,
    pub status: TaskStatus,
    pub processing_time_s: f64,
    pub attempts: u32,
    pub error: Option<String>,
}

/// Point-in-time view of a workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub workflow_id: WorkflowId,
    pub name: String,
    pub status: TaskStatus,
    pub tasks: Vec<TaskSnapshot>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub elapsed_s: f64,
    /// Present once the workflow completed and the guardrails ran.
    pub reports: Option<GuardrailReports>,
}

impl Snapshot {
    pub fn of(workflow: &Workflow) -> Self {
        let elapsed_s = match (workflow.started_at, workflow.completed_at) {
            (Some(start), Some(end)) => (end - start).num_milliseconds() as f64 / 1_000.0,
            (Some(start), None) => (Utc::now() - start).num_milliseconds() as f64 / 1_000.0,
            _ => 0.0,
        };
        Self {
            workflow_id: workflow.id,
            name: workflow.name.clone(),
            status: workflow.status,
            tasks: workflow
                .tasks
                .iter()
                .map(|t| TaskSnapshot {
                    id: t.id.clone(),
                    worker_id: t.worker_id,
                    status: t.status,
                    processing_time_s: t.processing_time_s,
                    attempts: t.attempts,
                    error: t.error.as_ref().map(|e| format!("{}: {}", e.kind, e.message)),
                })
                .collect(),
            created_at: workflow.created_at,
            started_at: workflow.started_at,
            completed_at: workflow.completed_at,
            elapsed_s,
            reports: workflow.reports.clone(),
        }
    }
}
