//! Backend failure taxonomy.

use scriptorium_contracts::{ErrorKind, FailureClass};
use thiserror::Error;

/// Failures a generation backend can surface. Callers classify these into
/// transient/permanent before deciding on retry.
#[derive(Error, Debug, Clone)]
pub enum BackendError {
    #[error("network failure: {0}")]
    Network(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("generation timed out after {timeout_s}s")]
    DeadlineExceeded { timeout_s: u64 },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),
}

impl BackendError {
    pub fn classification(&self) -> FailureClass {
        match self {
            Self::Network(_) | Self::RateLimited(_) | Self::DeadlineExceeded { .. } => {
                FailureClass::Transient
            }
            Self::InvalidRequest(_) | Self::PermissionDenied(_) => FailureClass::Permanent,
        }
    }

    /// The boundary error kind this failure maps to.
    pub fn error_kind(&self) -> ErrorKind {
        match self {
            Self::Network(_) => ErrorKind::BackendFailure,
            Self::RateLimited(_) => ErrorKind::RateLimit,
            Self::DeadlineExceeded { .. } => ErrorKind::DeadlineExceeded,
            Self::InvalidRequest(_) => ErrorKind::InvalidRequest,
            Self::PermissionDenied(_) => ErrorKind::PermissionOverreach,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_and_rate_limit_are_transient() {
        assert_eq!(
            BackendError::Network("reset".into()).classification(),
            FailureClass::Transient
        );
        assert_eq!(
            BackendError::RateLimited("429".into()).classification(),
            FailureClass::Transient
        );
        assert_eq!(
            BackendError::InvalidRequest("empty prompt".into()).classification(),
            FailureClass::Permanent
        );
    }
}
