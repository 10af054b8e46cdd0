//! Order workflow errors.

use thiserror::Error;

use crate::orders::store::StoreError;
use crate::parts::DependencyFailure;

/// Every way creating an order can fail.
///
/// Display strings are the caller-facing messages.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Malformed request; the dependency was never contacted.
    #[error("{0}")]
    Validation(String),

    #[error("part does not exist")]
    PartNotFound,

    #[error("insufficient stock, available={available}")]
    InsufficientStock { available: u64 },

    /// The circuit breaker refused to call the parts service.
    #[error("dependency temporarily unavailable, retry later")]
    BreakerOpen,

    #[error("dependency unavailable")]
    DependencyUnavailable(#[source] DependencyFailure),

    /// The parts service answered but broke its contract.
    #[error("dependency returned invalid data")]
    BadUpstream(String),

    #[error("order store invariant violated: {0}")]
    Store(#[from] StoreError),
}

/// Caller-facing error classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidRequest,
    ServiceUnavailable,
    BadUpstream,
    Internal,
}

impl WorkflowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WorkflowError::Validation(_)
            | WorkflowError::PartNotFound
            | WorkflowError::InsufficientStock { .. } => ErrorKind::InvalidRequest,
            WorkflowError::BreakerOpen | WorkflowError::DependencyUnavailable(_) => {
                ErrorKind::ServiceUnavailable
            }
            WorkflowError::BadUpstream(_) => ErrorKind::BadUpstream,
            WorkflowError::Store(_) => ErrorKind::Internal,
        }
    }

    /// Short label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            WorkflowError::Validation(_) => "validation",
            WorkflowError::PartNotFound => "part_not_found",
            WorkflowError::InsufficientStock { .. } => "insufficient_stock",
            WorkflowError::BreakerOpen => "breaker_open",
            WorkflowError::DependencyUnavailable(_) => "dependency_unavailable",
            WorkflowError::BadUpstream(_) => "bad_upstream",
            WorkflowError::Store(_) => "store",
        }
    }
}
