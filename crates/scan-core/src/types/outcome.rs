//! Service call outcomes and the failure taxonomy.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Payload;

/// Why a service contribution is missing from a ticker record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// No response within the per-call timeout
    Timeout,
    /// Connection could not be established, or a gateway reported the
    /// service unavailable
    Unreachable,
    /// Response body did not match the expected payload shape
    BadResponse,
    /// The service reported a business-level error, e.g. unknown ticker
    ServiceError,
    /// An upstream call this one consumes did not succeed
    DependencyFailed,
    /// The service was excluded from this run by the pre-flight check
    Skipped,
    /// The batch deadline expired before the ticker settled
    BatchTimeout,
    /// The batch was cancelled before the ticker settled
    Cancelled,
}

impl FailureKind {
    /// Transient failures may succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, FailureKind::Timeout | FailureKind::Unreachable)
    }

    /// Failures caused by the batch run rather than by any one service.
    pub fn is_batch_level(&self) -> bool {
        matches!(self, FailureKind::BatchTimeout | FailureKind::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Timeout => "timeout",
            FailureKind::Unreachable => "unreachable",
            FailureKind::BadResponse => "bad_response",
            FailureKind::ServiceError => "service_error",
            FailureKind::DependencyFailed => "dependency_failed",
            FailureKind::Skipped => "skipped",
            FailureKind::BatchTimeout => "batch_timeout",
            FailureKind::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed service contribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceFailure {
    pub kind: FailureKind,
    pub detail: String,
    /// Calls actually issued, zero when the service was never called
    pub attempts: u32,
}

impl ServiceFailure {
    pub fn new(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
            attempts: 0,
        }
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }
}

impl fmt::Display for ServiceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.detail)
    }
}

/// Result of one service call. Service clients never fail past this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ServiceOutcome {
    Success(Payload),
    Failure(ServiceFailure),
}

impl ServiceOutcome {
    /// Shorthand for a failed outcome.
    pub fn failure(kind: FailureKind, detail: impl Into<String>) -> Self {
        ServiceOutcome::Failure(ServiceFailure::new(kind, detail))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ServiceOutcome::Success(_))
    }

    pub fn payload(&self) -> Option<&Payload> {
        match self {
            ServiceOutcome::Success(p) => Some(p),
            ServiceOutcome::Failure(_) => None,
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            ServiceOutcome::Success(_) => None,
            ServiceOutcome::Failure(f) => Some(f.kind),
        }
    }

    /// Stamp the number of calls made on a failed outcome.
    pub fn with_attempts(self, attempts: u32) -> Self {
        match self {
            ServiceOutcome::Failure(f) => ServiceOutcome::Failure(f.with_attempts(attempts)),
            success => success,
        }
    }
}
