//! The orchestrator: owns workflows and couples router, scheduler, and
//! guardrails.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use scriptorium_backend::GenerationBackend;
use scriptorium_config::AppConfig;
use scriptorium_contracts::{
    ErrorKind, PermissionLevel, Request, Task, TaskStatus, WorkflowId,
};
use scriptorium_guardrails::{GuardrailPipeline, GuardrailReports};
use scriptorium_router::Router;
use scriptorium_workers::WorkerRegistry;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::OrchestrationError;
use crate::metrics::{GlobalMetrics, MetricsCollector};
use crate::scheduler;
use crate::workflow::{self, Snapshot, Workflow, WorkflowFailure};

/// Terminal outcome of a workflow execution.
#[derive(Debug, Clone)]
pub struct WorkflowResult {
    pub workflow_id: WorkflowId,
    pub status: TaskStatus,
    pub final_content: Option<String>,
    pub reports: Option<GuardrailReports>,
    pub failure: Option<WorkflowFailure>,
    pub completed_tasks: usize,
    pub total_tasks: usize,
    pub total_processing_time_s: f64,
}

struct WorkflowEntry {
    workflow: Arc<Mutex<Workflow>>,
    cancel: CancellationToken,
}

/// Owns workflows and their lifecycle.
pub struct Orchestrator {
    router: Router,
    registry: Arc<WorkerRegistry>,
    guardrails: GuardrailPipeline,
    config: AppConfig,
    workflows: RwLock<HashMap<WorkflowId, WorkflowEntry>>,
    metrics: MetricsCollector,
}

impl Orchestrator {
    /// Orchestrator over the built-in worker set.
    pub fn new(backend: Arc<dyn GenerationBackend>, config: AppConfig) -> Self {
        let registry =
            Arc::new(WorkerRegistry::with_builtin(backend.clone(), &config.backend));
        Self::with_registry(backend, registry, config)
    }

    /// Orchestrator over a caller-supplied registry.
    pub fn with_registry(
        backend: Arc<dyn GenerationBackend>,
        registry: Arc<WorkerRegistry>,
        config: AppConfig,
    ) -> Self {
        let router = Router::new(registry.clone(), backend.clone(), config.router.clone());
        let guardrails = GuardrailPipeline::new(backend, config.guardrails.clone());
        Self {
            router,
            registry,
            guardrails,
            config,
            workflows: RwLock::new(HashMap::new()),
            metrics: MetricsCollector::new(),
        }
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn guardrails(&self) -> &GuardrailPipeline {
        &self.guardrails
    }

    /// Route a request and construct a validated workflow. Rejected
    /// workflows are never stored and never count in metrics.
    pub async fn create_workflow(
        &self,
        request: &Request,
    ) -> Result<WorkflowId, OrchestrationError> {
        let decision = self.router.route(request).await?;
        let wf = Workflow::from_decision(request, &decision);
        workflow::validate(&wf, decision.required_permission)?;
        Ok(self.store(wf))
    }

    /// Construct a workflow from pre-planned tasks, bypassing the router.
    /// The same validation applies.
    pub fn create_workflow_from_tasks(
        &self,
        request: &Request,
        tasks: Vec<Task>,
    ) -> Result<WorkflowId, OrchestrationError> {
        let wf = Workflow::from_tasks(request, tasks);
        workflow::validate(&wf, wf.permission_level)?;
        Ok(self.store(wf))
    }

    fn store(&self, wf: Workflow) -> WorkflowId {
        let id = wf.id;
        info!(workflow = %id, tasks = wf.tasks.len(), "workflow created");
        self.workflows.write().insert(id, WorkflowEntry {
            workflow: Arc::new(Mutex::new(wf)),
            cancel: CancellationToken::new(),
        });
        id
    }

    /// Execute a workflow to its terminal state, run the guardrails, and
    /// return the outcome. Blocks until terminal; cancellation arrives via
    /// [`Orchestrator::cancel`].
    pub async fn execute_workflow(
        &self,
        workflow_id: WorkflowId,
    ) -> Result<WorkflowResult, OrchestrationError> {
        let (wf_arc, cancel) = {
            let workflows = self.workflows.read();
            let entry = workflows
                .get(&workflow_id)
                .ok_or(OrchestrationError::WorkflowNotFound(workflow_id))?;
            (entry.workflow.clone(), entry.cancel.clone())
        };

        let (project_id, content_type, verification_level, permission_level) = {
            let mut wf = wf_arc.lock();
            // a pending workflow cancelled in place never executed at all
            if wf.status == TaskStatus::Cancelled && wf.started_at.is_none() {
                return Err(OrchestrationError::CancelledBeforeExecution { workflow_id });
            }
            if wf.status != TaskStatus::Pending {
                return Err(OrchestrationError::AlreadyExecuted { workflow_id });
            }
            wf.status = TaskStatus::Running;
            wf.started_at = Some(Utc::now());
            (
                wf.project_id.clone(),
                wf.content_type,
                wf.verification_level,
                wf.permission_level,
            )
        };

        // objectives for this project are locked while we run
        let _project_guard = project_id
            .as_deref()
            .map(|project| self.guardrails.deviation().activate(project));

        self.metrics.workflow_started(workflow_id);
        info!(workflow = %workflow_id, "workflow execution started");

        let cancelled = scheduler::execute(
            &wf_arc,
            &self.registry,
            &self.config.orchestrator,
            &self.metrics,
            &cancel,
        )
        .await;

        let (status, final_content) = {
            let mut wf = wf_arc.lock();
            let status = wf.derive_terminal_status(cancelled);
            wf.status = status;
            wf.completed_at = Some(Utc::now());
            wf.total_processing_time_s = wf
                .started_at
                .zip(wf.completed_at)
                .map(|(start, end)| (end - start).num_milliseconds() as f64 / 1_000.0);
            if wf.failure.is_none() {
                wf.failure = Self::failure_from_tasks(&wf, status, cancelled);
            }
            let final_content =
                (status == TaskStatus::Completed).then(|| wf.fold_final_content()).flatten();
            wf.final_content = final_content.clone();
            (status, final_content)
        };

        // guardrails run once, after every task is terminal
        let mut reports = None;
        let mut status = status;
        if status == TaskStatus::Completed {
            if let Some(content) = &final_content {
                let project = project_id.as_deref().unwrap_or("default");
                let produced = self
                    .guardrails
                    .run(content, content_type, verification_level, project, None)
                    .await;
                if !produced.accepted && permission_level == PermissionLevel::Assistant {
                    status = TaskStatus::Failed;
                    let mut wf = wf_arc.lock();
                    wf.status = status;
                    wf.failure = Some(WorkflowFailure {
                        kind: ErrorKind::GuardrailBlocked,
                        message: "guardrails rejected the content at assistant permission level"
                            .to_string(),
                        failing_task_id: None,
                        evidence: Vec::new(),
                    });
                }
                wf_arc.lock().reports = Some(produced.clone());
                reports = Some(produced);
            }
        }

        let result = {
            let wf = wf_arc.lock();
            WorkflowResult {
                workflow_id,
                status,
                final_content: wf.final_content.clone(),
                reports: reports.clone(),
                failure: wf.failure.clone(),
                completed_tasks: wf
                    .tasks
                    .iter()
                    .filter(|t| t.status == TaskStatus::Completed)
                    .count(),
                total_tasks: wf.tasks.len(),
                total_processing_time_s: wf.total_processing_time_s.unwrap_or(0.0),
            }
        };

        self.metrics.workflow_finished(status, result.total_processing_time_s);
        info!(workflow = %workflow_id, status = ?status, "workflow finished");
        Ok(result)
    }

    fn failure_from_tasks(
        wf: &Workflow,
        status: TaskStatus,
        cancelled: bool,
    ) -> Option<WorkflowFailure> {
        if status != TaskStatus::Failed || cancelled {
            return None;
        }
        let failed = wf.tasks.iter().find(|t| t.status == TaskStatus::Failed)?;
        let error = failed.error.as_ref();
        Some(WorkflowFailure {
            kind: error.map(|e| e.kind).unwrap_or(ErrorKind::BackendFailure),
            message: error.map(|e| e.message.clone()).unwrap_or_default(),
            failing_task_id: Some(failed.id.clone()),
            evidence: Vec::new(),
        })
    }

    pub fn status(&self, workflow_id: WorkflowId) -> Result<Snapshot, OrchestrationError> {
        let workflows = self.workflows.read();
        let entry = workflows
            .get(&workflow_id)
            .ok_or(OrchestrationError::WorkflowNotFound(workflow_id))?;
        let guard = entry.workflow.lock();
        Ok(Snapshot::of(&guard))
    }

    /// Request cancellation. Idempotent: true only on the call that moves
    /// the workflow out of a non-terminal state.
    pub fn cancel(&self, workflow_id: WorkflowId) -> bool {
        let workflows = self.workflows.read();
        let Some(entry) = workflows.get(&workflow_id) else {
            return false;
        };
        let mut wf = entry.workflow.lock();
        if wf.status.is_terminal() || entry.cancel.is_cancelled() {
            return false;
        }
        if wf.status == TaskStatus::Pending {
            // never dispatched; cancel in place
            wf.status = TaskStatus::Cancelled;
            wf.completed_at = Some(Utc::now());
            for task in wf.tasks.iter_mut() {
                task.status = TaskStatus::Cancelled;
            }
        }
        entry.cancel.cancel();
        info!(workflow = %workflow_id, "cancellation requested");
        true
    }

    pub fn metrics(&self) -> GlobalMetrics {
        self.metrics.snapshot()
    }

    /// Drop terminal workflows whose reports were emitted and whose
    /// completion is older than the retention period.
    pub fn reap_finished(&self, retention: Duration) {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(retention).unwrap_or_else(|_| chrono::Duration::zero());
        self.workflows.write().retain(|_, entry| {
            let wf = entry.workflow.lock();
            let expired = wf.status.is_terminal()
                && wf.completed_at.is_some_and(|done| done < cutoff);
            !expired
        });
    }

    /// Number of workflows currently retained, terminal or not.
    pub fn retained_workflows(&self) -> usize {
        self.workflows.read().len()
    }
}
