//! Request routing.
//!
//! The router turns an incoming [`Request`](scriptorium_contracts::Request)
//! into a [`RoutingDecision`](scriptorium_contracts::RoutingDecision):
//! primary worker, supporting workers, a dependency-aware task breakdown,
//! and a permission requirement. Analysis is keyword-driven and fully
//! deterministic; one optional generation-backend call can escalate the
//! keyword classification but its failure never surfaces to callers.

pub mod analysis;
pub mod breakdown;
pub mod history;
pub mod matching;
pub mod router;

pub use analysis::{analyze_text, TaskAnalysis};
pub use history::{OptimizationReport, RoutingStatistics};
pub use router::{Router, RouterError};
