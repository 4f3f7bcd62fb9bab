//! Error types for gridsweep storage
//!
//! Provides error handling for:
//! - Store round-trips (conflicts, connectivity, constraints, I/O)
//! - The retry loop of the conflict-safe persister
//! - Illegal persister state transitions

use crate::record::ConcurrencyStamp;
use crate::state_machine::PersistState;

/// Details of an optimistic-concurrency rejection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConflictDetail {
    /// Stamp the rejected write was based on
    pub expected: ConcurrencyStamp,
    /// Stamp the store was actually at, when the store reports it
    pub found: Option<ConcurrencyStamp>,
}

impl std::fmt::Display for ConflictDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.found {
            Some(found) => write!(f, "expected {}, found {found}", self.expected),
            None => write!(f, "expected {}, store moved on", self.expected),
        }
    }
}

/// Errors reported by an `ExecutionStore`
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Write rejected because the store changed underneath it
    #[error("version conflict: {0}")]
    Conflict(ConflictDetail),

    /// Store could not be reached
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Write violated a constraint unrelated to concurrency
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// Round-trip took too long
    #[error("store operation timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    /// Underlying file I/O failed
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// A stored row could not be encoded or decoded
    #[error("store serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Build a conflict error
    #[inline]
    #[must_use]
    pub fn conflict(expected: ConcurrencyStamp, found: Option<ConcurrencyStamp>) -> Self {
        Self::Conflict(ConflictDetail { expected, found })
    }

    /// Only conflicts are retried
    #[inline]
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

/// Persister state machine errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("illegal persist transition: {from:?} -> {to:?}")]
pub struct StateMachineError {
    pub from: PersistState,
    pub to: PersistState,
}

/// Rejected retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("max_retries must be at least 1")]
pub struct InvalidRetryPolicy;

/// Errors returned by the conflict-safe persister
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// Every attempt conflicted
    #[error("gave up after {attempts} conflicting attempts ({last_conflict})")]
    ConflictExhausted {
        /// Inserts attempted, equal to the policy's `max_retries`
        attempts: u32,
        /// Conflict seen on the final attempt
        last_conflict: ConflictDetail,
    },

    /// Non-conflict storage failure, never retried
    #[error(transparent)]
    Store(StoreError),

    /// Cancellation fired before the write completed
    #[error("persist cancelled after {attempts} attempts")]
    Cancelled { attempts: u32 },

    /// Retry loop reached a state it cannot leave
    #[error(transparent)]
    StateMachine(#[from] StateMachineError),
}

impl PersistError {
    /// Whether retries ran out
    #[inline]
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::ConflictExhausted { .. })
    }
}
