//! Boundary error taxonomy shared across crates.

use serde::{Deserialize, Serialize};

/// Whether a failure is worth retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    /// Likely to succeed on retry (network, rate limit, timeout).
    Transient,
    /// Retrying cannot help (bad input, permission denied).
    Permanent,
}

/// Error kinds surfaced at the workflow boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidRequest,
    PermissionOverreach,
    CyclicDependency,
    DeadlockOrMissingDependency,
    WorkerUnavailable,
    DeadlineExceeded,
    RateLimit,
    BackendFailure,
    DependencyFailed,
    CancellationGraceExceeded,
    GuardrailBlocked,
}

impl ErrorKind {
    /// Default classification for this kind; workers may refine it.
    pub fn default_classification(&self) -> FailureClass {
        match self {
            Self::DeadlineExceeded | Self::RateLimit | Self::BackendFailure => {
                FailureClass::Transient
            }
            _ => FailureClass::Permanent,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::PermissionOverreach => "permission_overreach",
            Self::CyclicDependency => "cyclic_dependency",
            Self::DeadlockOrMissingDependency => "deadlock_or_missing_dependency",
            Self::WorkerUnavailable => "worker_unavailable",
            Self::DeadlineExceeded => "deadline_exceeded",
            Self::RateLimit => "rate_limit",
            Self::BackendFailure => "backend_failure",
            Self::DependencyFailed => "dependency_failed",
            Self::CancellationGraceExceeded => "cancellation_grace_exceeded",
            Self::GuardrailBlocked => "guardrail_blocked",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_kinds_are_the_retryable_ones() {
        assert_eq!(
            ErrorKind::RateLimit.default_classification(),
            FailureClass::Transient
        );
        assert_eq!(
            ErrorKind::DeadlineExceeded.default_classification(),
            FailureClass::Transient
        );
        assert_eq!(
            ErrorKind::InvalidRequest.default_classification(),
            FailureClass::Permanent
        );
        assert_eq!(
            ErrorKind::CyclicDependency.default_classification(),
            FailureClass::Permanent
        );
    }
}
