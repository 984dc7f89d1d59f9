//! The DAG scheduler: ready-set computation, parallelism-bounded dispatch,
//! retry, failure cascade, stuck detection, and cooperative cancellation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use scriptorium_config::OrchestratorConfig;
use scriptorium_contracts::{
    ErrorKind, FailureClass, TaskError, TaskId, TaskInput, TaskResult, TaskStatus,
    UpstreamOutput, WorkerId,
};
use scriptorium_resilience::retry_classified;
use scriptorium_workers::{Worker, WorkerRegistry};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::metrics::MetricsCollector;
use crate::workflow::{Workflow, WorkflowFailure};

/// Message sent by an execution unit when its task terminates.
struct TaskOutcome {
    task_id: TaskId,
    worker_id: WorkerId,
    outcome: Result<TaskResult, TaskError>,
    /// The worker observed the cancellation signal and returned cleanly.
    cancelled_by_worker: bool,
    processing_time_s: f64,
    attempts: u32,
}

/// A task prepared for dispatch while the workflow lock was held.
struct Dispatch {
    task_id: TaskId,
    worker: Arc<dyn Worker>,
    input: TaskInput,
    timeout: Duration,
}

/// Failure of a single execution attempt, classified for retry.
enum AttemptError {
    Worker(scriptorium_workers::WorkerError),
    Timeout(u64),
}

impl AttemptError {
    fn classification(&self) -> FailureClass {
        match self {
            Self::Worker(err) => err.classification(),
            Self::Timeout(_) => FailureClass::Transient,
        }
    }

    fn to_task_error(&self) -> TaskError {
        match self {
            Self::Worker(err) => err.to_task_error(),
            Self::Timeout(timeout_s) => TaskError {
                kind: ErrorKind::DeadlineExceeded,
                message: format!("task exceeded its {timeout_s}s timeout"),
                classification: FailureClass::Transient,
            },
        }
    }
}

impl std::fmt::Display for AttemptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Worker(err) => err.fmt(f),
            Self::Timeout(timeout_s) => write!(f, "timed out after {timeout_s}s"),
        }
    }
}

/// Execute a workflow's tasks to a terminal state. Returns whether
/// cancellation was requested before completion.
pub async fn execute(
    workflow: &Mutex<Workflow>,
    registry: &WorkerRegistry,
    config: &OrchestratorConfig,
    metrics: &MetricsCollector,
    cancel: &CancellationToken,
) -> bool {
    let (tx, mut rx) = mpsc::unbounded_channel::<TaskOutcome>();
    let mut in_flight = 0usize;
    let deadline = config
        .workflow_deadline_s
        .map(|secs| Instant::now() + Duration::from_secs(secs));

    loop {
        if cancel.is_cancelled() {
            drain_cancelled(workflow, config, &mut rx, &mut in_flight, metrics).await;
            return true;
        }

        // dispatch as many ready tasks as the cap allows
        let dispatches = prepare_dispatches(workflow, registry, config, in_flight, metrics);
        for dispatch in dispatches {
            in_flight += 1;
            spawn_unit(dispatch, config.retry.clone(), cancel.clone(), tx.clone());
        }

        {
            let wf = workflow.lock();
            if wf.tasks.iter().all(|t| t.status.is_terminal()) {
                return false;
            }
        }

        if in_flight == 0 {
            mark_stuck(workflow);
            return false;
        }

        let received = match deadline {
            Some(deadline) => tokio::select! {
                outcome = rx.recv() => outcome,
                _ = tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)) => {
                    warn!("workflow deadline exceeded, cancelling");
                    cancel.cancel();
                    continue;
                }
                _ = cancel.cancelled() => continue,
            },
            None => tokio::select! {
                outcome = rx.recv() => outcome,
                _ = cancel.cancelled() => continue,
            },
        };

        if let Some(outcome) = received {
            in_flight -= 1;
            apply_outcome(workflow, outcome, metrics);
        }
    }
}

/// Compute the ready set under the lock and mark the dispatched slice
/// running.
fn prepare_dispatches(
    workflow: &Mutex<Workflow>,
    registry: &WorkerRegistry,
    config: &OrchestratorConfig,
    in_flight: usize,
    metrics: &MetricsCollector,
) -> Vec<Dispatch> {
    let mut wf = workflow.lock();

    let completed: Vec<TaskId> = wf
        .tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Completed)
        .map(|t| t.id.clone())
        .collect();
    let upstream_content: HashMap<TaskId, UpstreamOutput> = wf
        .tasks
        .iter()
        .filter_map(|t| {
            t.result.as_ref().map(|r| {
                (t.id.clone(), UpstreamOutput {
                    worker: t.worker_id,
                    output_kind: r.output_kind,
                    content: r.content.clone(),
                })
            })
        })
        .collect();

    let mut ready: Vec<(TaskId, scriptorium_contracts::TaskPriority, chrono::DateTime<chrono::Utc>)> = wf
        .tasks
        .iter()
        .filter(|t| {
            t.status == TaskStatus::Pending
                && t.dependencies.iter().all(|d| completed.contains(d))
        })
        .map(|t| (t.id.clone(), t.priority, t.created_at))
        .collect();
    ready.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

    let slots = config.parallelism.saturating_sub(in_flight);
    let mut dispatches = Vec::new();
    for (task_id, _, _) in ready.into_iter().take(slots) {
        let Some(task) = wf.task_mut(&task_id) else { continue };
        let worker_id = task.worker_id;
        match registry.get(worker_id) {
            Some(worker) => {
                task.status = TaskStatus::Running;
                task.started_at = Some(chrono::Utc::now());
                task.attempts += 1;
                let mut input = task.input.clone();
                // dependency order is breakdown order, which downstream
                // workers rely on to find the current revision
                for dep in &task.dependencies {
                    if let Some(upstream) = upstream_content.get(dep) {
                        input.upstream.push(upstream.clone());
                    }
                }
                let timeout = Duration::from_secs(if worker.metadata().timeout_s > 0 {
                    worker.metadata().timeout_s
                } else {
                    config.task_timeout_s
                });
                debug!(task = %task_id, worker = %worker_id, "dispatching task");
                dispatches.push(Dispatch { task_id, worker, input, timeout });
            }
            None => {
                warn!(task = %task_id, worker = %worker_id, "worker unavailable");
                task.status = TaskStatus::Failed;
                task.completed_at = Some(chrono::Utc::now());
                task.error = Some(TaskError::permanent(
                    ErrorKind::WorkerUnavailable,
                    format!("worker {worker_id} is not registered"),
                ));
                metrics.task_finished(worker_id, false, 0.0);
                cascade_dependency_failure(&mut wf, &task_id);
            }
        }
    }
    dispatches
}

/// Run one task on its own execution unit, retrying transient failures
/// with backoff, and report the outcome over the completion channel.
fn spawn_unit(
    dispatch: Dispatch,
    retry: scriptorium_resilience::RetryConfig,
    cancel: CancellationToken,
    tx: mpsc::UnboundedSender<TaskOutcome>,
) {
    tokio::spawn(async move {
        let Dispatch { task_id, worker, input, timeout } = dispatch;
        let worker_id = worker.metadata().id;
        let started = Instant::now();

        let (result, retry_outcome) = retry_classified(
            &retry,
            AttemptError::classification,
            || {
                let worker = worker.clone();
                let input = input.clone();
                let cancel = cancel.clone();
                async move {
                    match tokio::time::timeout(timeout, worker.execute(&input, cancel)).await {
                        Ok(Ok(result)) => Ok(result),
                        Ok(Err(err)) => Err(AttemptError::Worker(err)),
                        Err(_) => Err(AttemptError::Timeout(timeout.as_secs())),
                    }
                }
            },
        )
        .await;

        let cancelled_by_worker = matches!(
            &result,
            Err(AttemptError::Worker(scriptorium_workers::WorkerError::Cancelled))
        );
        let outcome = TaskOutcome {
            task_id,
            worker_id,
            outcome: result.map_err(|err| err.to_task_error()),
            cancelled_by_worker,
            processing_time_s: started.elapsed().as_secs_f64(),
            attempts: retry_outcome.attempts,
        };
        // receiver gone means the scheduler already gave up on us
        let _ = tx.send(outcome);
    });
}

/// Record a terminated task and cascade permanent failures to dependents.
fn apply_outcome(workflow: &Mutex<Workflow>, outcome: TaskOutcome, metrics: &MetricsCollector) {
    let mut wf = workflow.lock();
    let TaskOutcome {
        task_id,
        worker_id,
        outcome,
        cancelled_by_worker,
        processing_time_s,
        attempts,
    } = outcome;
    let succeeded = outcome.is_ok();

    if let Some(task) = wf.task_mut(&task_id) {
        task.completed_at = Some(chrono::Utc::now());
        task.processing_time_s += processing_time_s;
        task.attempts = attempts;
        match outcome {
            Ok(result) => {
                task.status = TaskStatus::Completed;
                task.result = Some(result);
            }
            Err(_) if cancelled_by_worker => {
                // a clean cooperative cancel carries no error
                task.status = TaskStatus::Cancelled;
            }
            Err(error) => {
                task.status = TaskStatus::Failed;
                task.error = Some(error);
            }
        }
    }
    metrics.task_finished(worker_id, succeeded, processing_time_s);

    if !succeeded && !cancelled_by_worker {
        cascade_dependency_failure(&mut wf, &task_id);
    }
}

/// Mark every pending transitive dependent of `failed_id` cancelled.
fn cascade_dependency_failure(wf: &mut Workflow, failed_id: &TaskId) {
    let dependents = wf.transitive_dependents(failed_id);
    for id in dependents {
        if let Some(task) = wf.task_mut(&id) {
            if task.status == TaskStatus::Pending {
                task.status = TaskStatus::Cancelled;
                task.completed_at = Some(chrono::Utc::now());
                task.error = Some(TaskError::permanent(
                    ErrorKind::DependencyFailed,
                    format!("dependency {failed_id} failed"),
                ));
            }
        }
    }
}

/// Ready set empty, nothing running, work remaining: fail the workflow and
/// report the pending set as evidence.
fn mark_stuck(workflow: &Mutex<Workflow>) {
    let mut wf = workflow.lock();
    let pending: Vec<TaskId> = wf
        .tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Pending)
        .map(|t| t.id.clone())
        .collect();
    warn!(pending = ?pending, "workflow stuck, failing");
    for id in &pending {
        if let Some(task) = wf.task_mut(id) {
            task.status = TaskStatus::Cancelled;
            task.completed_at = Some(chrono::Utc::now());
            task.error = Some(TaskError::permanent(
                ErrorKind::DeadlockOrMissingDependency,
                "task never became ready",
            ));
        }
    }
    wf.failure = Some(WorkflowFailure {
        kind: ErrorKind::DeadlockOrMissingDependency,
        message: "no task became ready while work remained".to_string(),
        failing_task_id: None,
        evidence: pending.iter().map(|id| id.to_string()).collect(),
    });
}

/// After cancellation: stop dispatching, give running tasks a bounded
/// grace period, then force-abandon whatever did not return.
async fn drain_cancelled(
    workflow: &Mutex<Workflow>,
    config: &OrchestratorConfig,
    rx: &mut mpsc::UnboundedReceiver<TaskOutcome>,
    in_flight: &mut usize,
    metrics: &MetricsCollector,
) {
    let grace = Duration::from_secs(config.cancellation_grace_s);
    let grace_deadline = Instant::now() + grace;

    while *in_flight > 0 {
        let remaining = grace_deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        match tokio::time::timeout(remaining, rx.recv()).await {
            Ok(Some(outcome)) => {
                *in_flight -= 1;
                apply_outcome(workflow, outcome, metrics);
            }
            Ok(None) | Err(_) => break,
        }
    }

    let mut wf = workflow.lock();
    for task in wf.tasks.iter_mut() {
        match task.status {
            TaskStatus::Running => {
                task.status = TaskStatus::Cancelled;
                task.completed_at = Some(chrono::Utc::now());
                task.error = Some(TaskError::permanent(
                    ErrorKind::CancellationGraceExceeded,
                    format!("task did not return within the {}s grace period", grace.as_secs()),
                ));
            }
            TaskStatus::Pending => {
                task.status = TaskStatus::Cancelled;
                task.completed_at = Some(chrono::Utc::now());
            }
            _ => {}
        }
    }
}
