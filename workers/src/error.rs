//! Worker failure taxonomy.

use scriptorium_backend::BackendError;
use scriptorium_contracts::{ErrorKind, FailureClass, TaskError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("input of {actual} chars exceeds worker limit of {limit}")]
    InputTooLarge { actual: usize, limit: usize },

    #[error("task kind not supported by this worker: {kind}")]
    UnsupportedTaskKind { kind: String },

    #[error("task input invalid: {0}")]
    InvalidInput(String),

    #[error("execution cancelled")]
    Cancelled,

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl WorkerError {
    pub fn classification(&self) -> FailureClass {
        match self {
            Self::Backend(err) => err.classification(),
            Self::InputTooLarge { .. }
            | Self::UnsupportedTaskKind { .. }
            | Self::InvalidInput(_)
            | Self::Cancelled => FailureClass::Permanent,
        }
    }

    pub fn error_kind(&self) -> ErrorKind {
        match self {
            Self::Backend(err) => err.error_kind(),
            Self::InputTooLarge { .. }
            | Self::UnsupportedTaskKind { .. }
            | Self::InvalidInput(_) => ErrorKind::InvalidRequest,
            Self::Cancelled => ErrorKind::CancellationGraceExceeded,
        }
    }

    pub fn to_task_error(&self) -> TaskError {
        TaskError {
            kind: self.error_kind(),
            message: self.to_string(),
            classification: self.classification(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_classification_passes_through() {
        let err = WorkerError::Backend(BackendError::RateLimited("busy".into()));
        assert_eq!(err.classification(), FailureClass::Transient);
        assert_eq!(err.error_kind(), ErrorKind::RateLimit);
    }

    #[test]
    fn input_errors_are_permanent() {
        let err = WorkerError::InputTooLarge { actual: 10, limit: 5 };
        assert_eq!(err.classification(), FailureClass::Permanent);
        assert_eq!(err.error_kind(), ErrorKind::InvalidRequest);
    }
}
