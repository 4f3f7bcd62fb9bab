//! Records as seen by the storage layer
//!
//! A record moves through three shapes:
//! - `NewExecution`: business content only (from core)
//! - `PendingExecution`: content plus the concurrency baseline the write depends on
//! - `StoredExecution`: content plus the server-assigned id and resulting stamp

use gridsweep_core::{ExecutionId, ExecutionResult, NewExecution};
use serde::{Deserialize, Serialize};

/// Version stamp of the execution table
///
/// Every successful insert advances it by one; a write whose baseline differs
/// from the current stamp is rejected as a conflict.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ConcurrencyStamp(pub u64);

impl ConcurrencyStamp {
    /// Stamp of an empty store
    pub const INITIAL: Self = Self(0);

    /// The stamp after one more write
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for ConcurrencyStamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// An execution waiting to be written
#[derive(Debug, Clone, PartialEq)]
pub struct PendingExecution {
    execution: NewExecution,
    baseline: ConcurrencyStamp,
}

impl PendingExecution {
    /// Pair content with the stamp it was prepared against
    #[inline]
    #[must_use]
    pub fn new(execution: NewExecution, baseline: ConcurrencyStamp) -> Self {
        Self {
            execution,
            baseline,
        }
    }

    /// Business content, identical across attempts
    #[inline]
    #[must_use]
    pub fn execution(&self) -> &NewExecution {
        &self.execution
    }

    /// Stamp the write expects the store to be at
    #[inline]
    #[must_use]
    pub fn baseline(&self) -> ConcurrencyStamp {
        self.baseline
    }

    /// Adopt the authoritative stamp read back from the store
    #[inline]
    pub fn reconcile(&mut self, current: ConcurrencyStamp) {
        self.baseline = current;
    }
}

/// An execution as persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredExecution {
    /// Server-assigned id
    pub id: ExecutionId,
    /// Table stamp produced by this write
    pub stamp: ConcurrencyStamp,
    #[serde(flatten)]
    pub execution: NewExecution,
}

impl From<StoredExecution> for ExecutionResult {
    fn from(stored: StoredExecution) -> Self {
        ExecutionResult::from_new(stored.id, stored.execution)
    }
}
