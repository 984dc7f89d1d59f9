//! Shared data model for the Scriptorium writing platform.
//!
//! Everything that crosses a crate boundary lives here: requests and their
//! option enums, worker identities, tasks and their results, routing
//! decisions, and the boundary error taxonomy.

pub mod error;
pub mod ids;
pub mod request;
pub mod routing;
pub mod task;
pub mod worker_id;

pub use error::{ErrorKind, FailureClass};
pub use ids::{TaskId, WorkflowId};
pub use request::{
    ContentType, CorrectionLevel, PermissionLevel, Request, RequestOptions, TaskKind, Urgency,
    VerificationLevel,
};
pub use routing::{Complexity, RiskLevel, RoutingDecision, SubtaskSpec};
pub use task::{
    OutputKind, Task, TaskError, TaskInput, TaskPriority, TaskResult, TaskStatus,
    UpstreamOutput,
};
pub use worker_id::WorkerId;
