//! Orchestrator metrics.
//!
//! A single collector owned by the orchestrator; the scheduler reports
//! outcomes through it and readers take snapshot copies.

use std::collections::BTreeMap;

use parking_lot::RwLock;
use scriptorium_contracts::{TaskStatus, WorkerId, WorkflowId};
use serde::{Deserialize, Serialize};

/// Per-worker utilization counters.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct WorkerUtilization {
    pub total_tasks: u64,
    pub successful_tasks: u64,
    pub average_processing_time_s: f64,
}

impl WorkerUtilization {
    pub fn success_rate(&self) -> f64 {
        if self.total_tasks == 0 {
            return 1.0;
        }
        self.successful_tasks as f64 / self.total_tasks as f64
    }
}

/// Snapshot of global orchestrator metrics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalMetrics {
    pub total_workflows: u64,
    pub successful_workflows: u64,
    pub failed_workflows: u64,
    pub cancelled_workflows: u64,
    pub active_workflows: u64,
    pub average_workflow_time_s: f64,
    pub worker_utilization: BTreeMap<WorkerId, WorkerUtilization>,
}

impl GlobalMetrics {
    pub fn success_rate(&self) -> f64 {
        if self.total_workflows == 0 {
            return 1.0;
        }
        self.successful_workflows as f64 / self.total_workflows as f64
    }
}

#[derive(Debug, Default)]
struct MetricsState {
    metrics: GlobalMetrics,
    finished_workflow_times: u64,
}

/// Mutex-guarded metrics store. Only the orchestrator writes.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    state: RwLock<MetricsState>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn workflow_started(&self, _workflow_id: WorkflowId) {
        self.state.write().metrics.active_workflows += 1;
    }

    /// Record a workflow reaching a terminal status.
    pub fn workflow_finished(&self, status: TaskStatus, processing_time_s: f64) {
        let mut state = self.state.write();
        state.metrics.active_workflows = state.metrics.active_workflows.saturating_sub(1);
        state.metrics.total_workflows += 1;
        match status {
            TaskStatus::Completed => state.metrics.successful_workflows += 1,
            TaskStatus::Cancelled => state.metrics.cancelled_workflows += 1,
            _ => state.metrics.failed_workflows += 1,
        }
        state.finished_workflow_times += 1;
        let n = state.finished_workflow_times as f64;
        state.metrics.average_workflow_time_s +=
            (processing_time_s - state.metrics.average_workflow_time_s) / n;
    }

    /// Record one task outcome against its worker.
    pub fn task_finished(&self, worker: WorkerId, succeeded: bool, processing_time_s: f64) {
        let mut state = self.state.write();
        let entry = state.metrics.worker_utilization.entry(worker).or_default();
        entry.total_tasks += 1;
        if succeeded {
            entry.successful_tasks += 1;
        }
        let n = entry.total_tasks as f64;
        entry.average_processing_time_s +=
            (processing_time_s - entry.average_processing_time_s) / n;
    }

    pub fn snapshot(&self) -> GlobalMetrics {
        self.state.read().metrics.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workflow_outcomes_are_counted_by_status() {
        let collector = MetricsCollector::new();
        let id = WorkflowId::new();
        collector.workflow_started(id);
        collector.workflow_finished(TaskStatus::Completed, 2.0);
        collector.workflow_started(id);
        collector.workflow_finished(TaskStatus::Failed, 4.0);
        let metrics = collector.snapshot();
        assert_eq!(metrics.total_workflows, 2);
        assert_eq!(metrics.successful_workflows, 1);
        assert_eq!(metrics.failed_workflows, 1);
        assert_eq!(metrics.active_workflows, 0);
        assert!((metrics.average_workflow_time_s - 3.0).abs() < 1e-9);
        assert!((metrics.success_rate() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn per_worker_utilization_rolls_averages() {
        let collector = MetricsCollector::new();
        collector.task_finished(WorkerId::ContentWriter, true, 1.0);
        collector.task_finished(WorkerId::ContentWriter, false, 3.0);
        let metrics = collector.snapshot();
        let writer = metrics.worker_utilization[&WorkerId::ContentWriter];
        assert_eq!(writer.total_tasks, 2);
        assert_eq!(writer.successful_tasks, 1);
        assert!((writer.average_processing_time_s - 2.0).abs() < 1e-9);
        assert!((writer.success_rate() - 0.5).abs() < 1e-9);
    }
}
