//! Tasks: the unit of work a workflow schedules onto a worker.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, FailureClass};
use crate::ids::TaskId;
use crate::request::{ContentType, CorrectionLevel, TaskKind};
use crate::worker_id::WorkerId;

/// Task priority, 4 highest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low = 1,
    Normal = 2,
    High = 3,
    Critical = 4,
}

impl TaskPriority {
    pub fn value(&self) -> u8 {
        *self as u8
    }

    pub fn from_value(v: u8) -> Option<Self> {
        match v {
            1 => Some(Self::Low),
            2 => Some(Self::Normal),
            3 => Some(Self::High),
            4 => Some(Self::Critical),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// What a worker's output represents, used when folding results into the
/// final content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    /// A full replacement for the text produced so far.
    Revision,
    /// Supporting material (research notes, sources) attached as metadata.
    Notes,
    /// An assessment that does not alter the content.
    Report,
}

/// Output of a completed dependency task, handed downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamOutput {
    pub worker: WorkerId,
    pub output_kind: OutputKind,
    pub content: String,
}

/// Input payload handed to a worker.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskInput {
    /// What this subtask should accomplish.
    pub description: String,
    /// The original request text.
    pub request_content: String,
    pub context: Option<String>,
    pub task_kind: Option<TaskKind>,
    pub content_type: ContentType,
    pub audience: Option<String>,
    pub preserve_voice: bool,
    pub correction_level: CorrectionLevel,
    /// Outputs of completed dependency tasks, in dependency (breakdown)
    /// order. The order is what lets downstream workers agree with the
    /// final-content folding on which revision is current.
    #[serde(default)]
    pub upstream: Vec<UpstreamOutput>,
}

/// Successful result of a worker execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    pub content: String,
    pub output_kind: OutputKind,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    /// Worker self-confidence in [0, 1]; required on every success.
    pub confidence: f64,
    pub processing_time_s: f64,
}

/// Terminal failure of a worker execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskError {
    pub kind: ErrorKind,
    pub message: String,
    pub classification: FailureClass,
}

impl TaskError {
    pub fn permanent(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), classification: FailureClass::Permanent }
    }

    pub fn transient(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), classification: FailureClass::Transient }
    }
}

/// A single unit of work inside a workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub worker_id: WorkerId,
    pub input: TaskInput,
    pub dependencies: Vec<TaskId>,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub result: Option<TaskResult>,
    pub error: Option<TaskError>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Wall time spent executing, accumulated across retry attempts.
    pub processing_time_s: f64,
    pub attempts: u32,
}

impl Task {
    pub fn new(
        id: TaskId,
        worker_id: WorkerId,
        input: TaskInput,
        dependencies: Vec<TaskId>,
        priority: TaskPriority,
    ) -> Self {
        Self {
            id,
            worker_id,
            input,
            dependencies,
            priority,
            status: TaskStatus::Pending,
            result: None,
            error: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            processing_time_s: 0.0,
            attempts: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_round_trips_through_value() {
        for v in 1..=4 {
            assert_eq!(TaskPriority::from_value(v).unwrap().value(), v);
        }
        assert!(TaskPriority::from_value(0).is_none());
        assert!(TaskPriority::from_value(5).is_none());
    }

    #[test]
    fn terminal_statuses() {
        assert!(!TaskStatus::Pending.is_terminal());
        assert!(!TaskStatus::Running.is_terminal());
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
        assert!(TaskStatus::Cancelled.is_terminal());
    }
}
