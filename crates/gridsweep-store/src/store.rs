//! Storage contract for execution records
//!
//! Implement [`ExecutionStore`] to plug a backend under the persister. The
//! contract is optimistic: an insert carries the stamp it was prepared against
//! and the store rejects it with [`StoreError::Conflict`] if the table has
//! moved on since.

use crate::error::StoreError;
use crate::record::{ConcurrencyStamp, PendingExecution, StoredExecution};

/// Durable execution storage
#[async_trait::async_trait]
pub trait ExecutionStore: Send + Sync {
    /// Insert one record, assigning its id
    ///
    /// # Errors
    /// `StoreError::Conflict` when `pending.baseline()` is not the current
    /// stamp; any other variant for failures unrelated to concurrency.
    async fn insert(&self, pending: &PendingExecution) -> Result<StoredExecution, StoreError>;

    /// Read the authoritative current stamp
    async fn current_stamp(&self) -> Result<ConcurrencyStamp, StoreError>;

    /// All stored records in insertion order
    async fn list(&self) -> Result<Vec<StoredExecution>, StoreError>;
}

#[async_trait::async_trait]
impl<S: ExecutionStore + ?Sized> ExecutionStore for std::sync::Arc<S> {
    async fn insert(&self, pending: &PendingExecution) -> Result<StoredExecution, StoreError> {
        (**self).insert(pending).await
    }

    async fn current_stamp(&self) -> Result<ConcurrencyStamp, StoreError> {
        (**self).current_stamp().await
    }

    async fn list(&self) -> Result<Vec<StoredExecution>, StoreError> {
        (**self).list().await
    }
}
