//! Guardrails for produced content.
//!
//! Three cooperating checkers (hallucination detection, quality
//! assessment, and deviation monitoring) each emit one immutable report
//! per workflow. The pipeline runs them concurrently and derives the
//! acceptance flag the orchestrator gates on.

pub mod deviation;
pub mod error;
pub mod hallucination;
pub mod pipeline;
pub mod quality;
mod util;

pub use deviation::{DeviationMonitor, DeviationReport, ProjectObjective};
pub use error::GuardrailError;
pub use hallucination::{HallucinationChecker, HallucinationReport};
pub use pipeline::{GuardrailPipeline, GuardrailReports};
pub use quality::{QualityAssessor, QualityReport};
