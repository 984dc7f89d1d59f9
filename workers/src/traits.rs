//! The uniform worker contract.

use std::collections::HashMap;

use async_trait::async_trait;
use scriptorium_contracts::{TaskInput, TaskKind, TaskResult, WorkerId};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::WorkerError;

/// Static facts about a worker the router matches against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerMetadata {
    pub id: WorkerId,
    pub name: String,
    /// Keyword set used by the router's overlap scoring.
    pub keywords: Vec<String>,
    /// Empty means every task kind is accepted.
    pub supported_task_kinds: Vec<TaskKind>,
    pub max_input_chars: usize,
    /// Whether this worker may be picked as a supporting worker.
    pub delegable: bool,
    /// Per-task execution budget enforced by the scheduler.
    pub timeout_s: u64,
}

impl WorkerMetadata {
    pub fn supports(&self, kind: TaskKind) -> bool {
        self.supported_task_kinds.is_empty() || self.supported_task_kinds.contains(&kind)
    }
}

/// Informational capability sheet consumed by the router.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerCapabilities {
    pub confidence_by_kind: HashMap<TaskKind, f64>,
    pub audiences: Vec<String>,
    pub languages: Vec<String>,
    pub collaboration_ready: bool,
}

/// Worker health snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerHealth {
    pub healthy: bool,
    pub issues: Vec<String>,
    pub recent_success_rate: f64,
}

/// A typed processor for one kind of writing work.
///
/// Implementations never mutate their input and never touch another
/// worker's state; the only mutation is their own performance counters.
#[async_trait]
pub trait Worker: Send + Sync {
    fn metadata(&self) -> &WorkerMetadata;

    fn capabilities(&self) -> WorkerCapabilities;

    /// Execute one task. Blocking I/O happens only at backend calls, which
    /// double as cancellation points.
    async fn execute(
        &self,
        input: &TaskInput,
        cancel: CancellationToken,
    ) -> Result<TaskResult, WorkerError>;

    fn health(&self) -> WorkerHealth;

    /// Pre-flight validation of a task input against declared limits.
    fn can_handle(&self, input: &TaskInput) -> Result<(), WorkerError> {
        let meta = self.metadata();
        let size = input.request_content.len()
            + input.context.as_deref().map_or(0, str::len)
            + input.upstream.iter().map(|u| u.content.len()).sum::<usize>();
        if size > meta.max_input_chars {
            return Err(WorkerError::InputTooLarge { actual: size, limit: meta.max_input_chars });
        }
        if let Some(kind) = input.task_kind {
            if !meta.supports(kind) {
                return Err(WorkerError::UnsupportedTaskKind {
                    kind: format!("{kind:?}").to_lowercase(),
                });
            }
        }
        Ok(())
    }
}
