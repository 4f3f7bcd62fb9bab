//! gridsweep Store - durable execution records
//!
//! Storage side of a coverage run:
//! - The `ExecutionStore` contract with optimistic version stamps
//! - In-memory and JSON-lines stores
//! - The conflict-safe persister and its retry state machine
//!
//! # Example
//!
//! ```rust,ignore
//! use gridsweep_store::{ConflictSafePersister, InMemoryExecutionStore, RetryPolicy};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! let persister = ConflictSafePersister::new(
//!     Arc::new(InMemoryExecutionStore::new()),
//!     RetryPolicy::new(5)?,
//! );
//! let stored = persister.persist(execution, &CancellationToken::new()).await?;
//! println!("stored as {}", stored.id);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod error;
pub mod jsonl;
pub mod memory;
pub mod persister;
pub mod record;
pub mod state_machine;
pub mod store;

// Re-exports for convenience
pub use error::{
    ConflictDetail, InvalidRetryPolicy, PersistError, StateMachineError, StoreError,
};
pub use jsonl::JsonLinesExecutionStore;
pub use memory::InMemoryExecutionStore;
pub use persister::{persist_with_retry, ConflictSafePersister, RetryPolicy};
pub use record::{ConcurrencyStamp, PendingExecution, StoredExecution};
pub use state_machine::PersistState;
pub use store::ExecutionStore;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
