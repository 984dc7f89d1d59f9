//! Routing decisions produced by the router and consumed by the
//! orchestrator when it builds a workflow.

use serde::{Deserialize, Serialize};

use crate::request::PermissionLevel;
use crate::task::TaskPriority;
use crate::worker_id::WorkerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Low,
    Medium,
    High,
}

impl Complexity {
    /// Duration multiplier applied to the base estimate.
    pub fn duration_multiplier(&self) -> u64 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// One planned subtask inside a routing decision.
///
/// Dependencies reference other subtasks by their `id` within the same
/// breakdown; the orchestrator maps them to task ids at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtaskSpec {
    pub id: String,
    pub description: String,
    pub worker: WorkerId,
    pub priority: TaskPriority,
    pub depends_on: Vec<String>,
    pub estimated_duration_s: u64,
}

/// The router's verdict on how to execute a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub primary_worker: WorkerId,
    /// At most three, never containing the primary.
    pub supporting_workers: Vec<WorkerId>,
    pub task_breakdown: Vec<SubtaskSpec>,
    pub complexity: Complexity,
    pub risk: RiskLevel,
    pub required_permission: PermissionLevel,
    pub estimated_duration_s: u64,
    pub reasoning: String,
}

impl RoutingDecision {
    /// Every worker this decision touches, primary first.
    pub fn workers(&self) -> impl Iterator<Item = WorkerId> + '_ {
        std::iter::once(self.primary_worker).chain(self.supporting_workers.iter().copied())
    }
}
