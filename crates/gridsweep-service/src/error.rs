//! Error types for the gridsweep service
//!
//! Every failure a caller can see maps to exactly one [`FailureKind`]:
//! - Validation failures (caller's input)
//! - Exhausted concurrency retries (transient contention)
//! - Storage faults (never retried here)
//! - Internal consistency faults (defects)
//! - Cancellation

use gridsweep_core::{CoverageError, ValidationError};
use gridsweep_store::{ConflictDetail, PersistError, StoreError};
use serde::{Deserialize, Serialize};

/// Message shown when persistence lost every race
pub const CONFLICT_EXHAUSTED_MESSAGE: &str =
    "The execution could not be saved because of concurrent activity. Please retry later.";

/// Caller-facing failure classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    ValidationFailure,
    ConcurrencyConflictExhausted,
    StorageFault,
    InternalConsistencyFault,
    Cancelled,
}

/// Main service error type
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Request rejected before computation
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Persistence retried the full budget and still conflicted
    #[error("{}", CONFLICT_EXHAUSTED_MESSAGE)]
    ConflictExhausted {
        attempts: u32,
        last_conflict: ConflictDetail,
    },

    /// Store failed for a reason other than concurrency
    #[error("storage fault: {0}")]
    Storage(#[source] StoreError),

    /// A defect: a precondition broke after validation
    #[error("internal consistency fault: {0}")]
    InternalConsistency(String),

    /// Cancellation fired before the record was stored
    #[error("request cancelled")]
    Cancelled,
}

impl ServiceError {
    /// Classification used in responses
    #[inline]
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Validation(_) => FailureKind::ValidationFailure,
            Self::ConflictExhausted { .. } => FailureKind::ConcurrencyConflictExhausted,
            Self::Storage(_) => FailureKind::StorageFault,
            Self::InternalConsistency(_) => FailureKind::InternalConsistencyFault,
            Self::Cancelled => FailureKind::Cancelled,
        }
    }

    /// Message safe to return to the caller
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(e) => e.to_string(),
            Self::ConflictExhausted { .. } => CONFLICT_EXHAUSTED_MESSAGE.to_string(),
            Self::Storage(_) => "The execution could not be saved. Please try again.".to_string(),
            Self::InternalConsistency(_) => {
                "An internal error occurred while processing the request.".to_string()
            }
            Self::Cancelled => "The request was cancelled.".to_string(),
        }
    }
}

impl From<CoverageError> for ServiceError {
    fn from(error: CoverageError) -> Self {
        Self::InternalConsistency(error.to_string())
    }
}

impl From<PersistError> for ServiceError {
    fn from(error: PersistError) -> Self {
        match error {
            PersistError::ConflictExhausted {
                attempts,
                last_conflict,
            } => Self::ConflictExhausted {
                attempts,
                last_conflict,
            },
            PersistError::Store(e) => Self::Storage(e),
            PersistError::Cancelled { .. } => Self::Cancelled,
            PersistError::StateMachine(e) => Self::InternalConsistency(e.to_string()),
        }
    }
}
