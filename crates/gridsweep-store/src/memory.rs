//! In-memory execution store
//!
//! Suitable for tests and single-process runs:
//! - Thread-safe with `Arc<RwLock<...>>`
//! - Optimistic locking on a table-wide version stamp
//! - Optional injected contention to exercise the conflict path

use crate::error::StoreError;
use crate::record::{ConcurrencyStamp, PendingExecution, StoredExecution};
use crate::store::ExecutionStore;
use gridsweep_core::ExecutionId;
use parking_lot::RwLock;
use std::sync::Arc;

#[derive(Debug, Default)]
struct Table {
    rows: Vec<StoredExecution>,
    stamp: ConcurrencyStamp,
    last_id: u64,
    /// Inserts that will lose a race against a simulated writer
    contention: u32,
}

/// In-memory implementation of `ExecutionStore`
#[derive(Debug, Clone, Default)]
pub struct InMemoryExecutionStore {
    table: Arc<RwLock<Table>>,
}

impl InMemoryExecutionStore {
    /// Create an empty store at `ConcurrencyStamp::INITIAL`
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store whose stamp already reads `stamp`
    #[must_use]
    pub fn with_stamp(stamp: ConcurrencyStamp) -> Self {
        let store = Self::new();
        store.table.write().stamp = stamp;
        store
    }

    /// Make the next `inserts` inserts conflict as if another writer got there first
    #[must_use]
    pub fn with_contention(self, inserts: u32) -> Self {
        self.table.write().contention = inserts;
        self
    }

    /// Number of stored rows
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.read().rows.len()
    }

    /// Whether no rows are stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.read().rows.is_empty()
    }
}

#[async_trait::async_trait]
impl ExecutionStore for InMemoryExecutionStore {
    async fn insert(&self, pending: &PendingExecution) -> Result<StoredExecution, StoreError> {
        let mut table = self.table.write();

        if table.contention > 0 {
            table.contention -= 1;
            table.stamp = table.stamp.next();
        }

        if pending.baseline() != table.stamp {
            return Err(StoreError::conflict(pending.baseline(), Some(table.stamp)));
        }

        table.last_id += 1;
        table.stamp = table.stamp.next();
        let stored = StoredExecution {
            id: ExecutionId(table.last_id),
            stamp: table.stamp,
            execution: pending.execution().clone(),
        };
        table.rows.push(stored.clone());
        Ok(stored)
    }

    async fn current_stamp(&self) -> Result<ConcurrencyStamp, StoreError> {
        Ok(self.table.read().stamp)
    }

    async fn list(&self) -> Result<Vec<StoredExecution>, StoreError> {
        Ok(self.table.read().rows.clone())
    }
}
