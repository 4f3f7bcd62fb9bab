//! Conflict-safe persister
//!
//! Writes one execution record and survives optimistic-concurrency races:
//! on a conflict it re-reads the authoritative stamp, reconciles the pending
//! record's baseline and tries again, up to `max_retries` inserts in total.
//!
//! # Loop
//!
//! ```text
//! Attempting --ok--------> Succeeded
//!     |
//!  conflict
//!     v
//! Conflicted --budget spent--> Exhausted
//!     |
//!  backoff
//!     v
//! Reconciling --stamp read--> Attempting
//! ```
//!
//! Any non-conflict store error leaves the loop immediately. Every await is
//! raced against the cancellation token; a fired token ends the loop with
//! [`PersistError::Cancelled`].

use crate::error::{InvalidRetryPolicy, PersistError, StateMachineError, StoreError};
use crate::record::{ConcurrencyStamp, PendingExecution, StoredExecution};
use crate::state_machine::{validate_transition, PersistState};
use crate::store::ExecutionStore;
use gridsweep_core::NewExecution;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Bounds for the retry loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    max_retries: u32,
    backoff: Duration,
}

impl RetryPolicy {
    /// Retry budget used when none is configured
    pub const DEFAULT_MAX_RETRIES: u32 = 5;

    /// Policy allowing `max_retries` inserts in total, without backoff
    ///
    /// # Errors
    /// `InvalidRetryPolicy` when `max_retries` is zero.
    pub fn new(max_retries: u32) -> Result<Self, InvalidRetryPolicy> {
        if max_retries == 0 {
            return Err(InvalidRetryPolicy);
        }
        Ok(Self {
            max_retries,
            backoff: Duration::ZERO,
        })
    }

    /// With a fixed pause before each reconciliation
    #[inline]
    #[must_use]
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    #[inline]
    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    #[inline]
    #[must_use]
    pub fn backoff(&self) -> Duration {
        self.backoff
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: Self::DEFAULT_MAX_RETRIES,
            backoff: Duration::ZERO,
        }
    }
}

/// Await `future` unless `cancel` fires first
async fn cancellable<F: Future>(cancel: &CancellationToken, future: F) -> Option<F::Output> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => None,
        output = future => Some(output),
    }
}

fn transition(state: &mut PersistState, to: PersistState) -> Result<(), PersistError> {
    validate_transition(*state, to)?;
    tracing::trace!(from = ?*state, to = ?to, "persist transition");
    *state = to;
    Ok(())
}

/// Write `record`, retrying on version conflicts
///
/// # Errors
/// - `PersistError::ConflictExhausted` after `policy.max_retries()` conflicting inserts
/// - `PersistError::Store` for any other store failure, including during reconciliation
/// - `PersistError::Cancelled` if `cancel` fires before the write completes
///
/// Cancellation drops the in-flight insert. A store that has already made the
/// record visible (a JSON-lines line appended but not yet synced) keeps it,
/// yet the caller still sees `Cancelled`. A cancelled outcome therefore means
/// "not confirmed", not "not stored".
pub async fn persist_with_retry<S>(
    store: &S,
    record: PendingExecution,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
) -> Result<StoredExecution, PersistError>
where
    S: ExecutionStore + ?Sized,
{
    let mut pending = record;
    let mut state = PersistState::Attempting;
    let mut attempts = 0u32;

    loop {
        match state {
            PersistState::Attempting => {
                let Some(result) = cancellable(cancel, store.insert(&pending)).await else {
                    transition(&mut state, PersistState::Cancelled)?;
                    return Err(PersistError::Cancelled { attempts });
                };
                attempts += 1;

                match result {
                    Ok(stored) => {
                        transition(&mut state, PersistState::Succeeded)?;
                        tracing::info!(id = %stored.id, attempts, "execution persisted");
                        return Ok(stored);
                    }
                    Err(StoreError::Conflict(detail)) => {
                        transition(&mut state, PersistState::Conflicted)?;
                        tracing::warn!(
                            attempt = attempts,
                            max_retries = policy.max_retries,
                            %detail,
                            "version conflict while persisting execution"
                        );
                        if attempts >= policy.max_retries {
                            transition(&mut state, PersistState::Exhausted)?;
                            tracing::error!(attempts, "persist retries exhausted");
                            return Err(PersistError::ConflictExhausted {
                                attempts,
                                last_conflict: detail,
                            });
                        }
                    }
                    Err(other) => {
                        tracing::error!(error = %other, attempt = attempts, "store failure while persisting");
                        return Err(PersistError::Store(other));
                    }
                }
            }
            PersistState::Conflicted => {
                if !policy.backoff.is_zero()
                    && cancellable(cancel, tokio::time::sleep(policy.backoff))
                        .await
                        .is_none()
                {
                    transition(&mut state, PersistState::Cancelled)?;
                    return Err(PersistError::Cancelled { attempts });
                }
                transition(&mut state, PersistState::Reconciling)?;
            }
            PersistState::Reconciling => {
                let Some(current) = cancellable(cancel, store.current_stamp()).await else {
                    transition(&mut state, PersistState::Cancelled)?;
                    return Err(PersistError::Cancelled { attempts });
                };
                let current = current.map_err(PersistError::Store)?;
                tracing::debug!(
                    stale = %pending.baseline(),
                    current = %current,
                    "reconciled baseline from store"
                );
                pending.reconcile(current);
                transition(&mut state, PersistState::Attempting)?;
            }
            terminal => {
                // Terminal states return above; reaching one here is a bug.
                return Err(StateMachineError {
                    from: terminal,
                    to: PersistState::Attempting,
                }
                .into());
            }
        }
    }
}

/// Persister bound to a store and policy
pub struct ConflictSafePersister<S: ?Sized> {
    store: Arc<S>,
    policy: RetryPolicy,
}

impl<S: ?Sized> Clone for ConflictSafePersister<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            policy: self.policy,
        }
    }
}

impl<S: ?Sized> std::fmt::Debug for ConflictSafePersister<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConflictSafePersister")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl<S: ExecutionStore + ?Sized> ConflictSafePersister<S> {
    /// Create a persister
    pub fn new(store: Arc<S>, policy: RetryPolicy) -> Self {
        Self { store, policy }
    }

    /// The underlying store
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// The retry policy in use
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Persist new content, taking the initial baseline from the store
    ///
    /// # Errors
    /// As [`persist_with_retry`]; a failed baseline read is a `PersistError::Store`.
    pub async fn persist(
        &self,
        execution: NewExecution,
        cancel: &CancellationToken,
    ) -> Result<StoredExecution, PersistError> {
        let baseline: ConcurrencyStamp = cancellable(cancel, self.store.current_stamp())
            .await
            .ok_or(PersistError::Cancelled { attempts: 0 })?
            .map_err(PersistError::Store)?;

        persist_with_retry(
            self.store.as_ref(),
            PendingExecution::new(execution, baseline),
            &self.policy,
            cancel,
        )
        .await
    }
}
