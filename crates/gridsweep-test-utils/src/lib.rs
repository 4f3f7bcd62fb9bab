//! Testing utilities for gridsweep workspace
//!
//! Shared fixtures and a scripted store whose insert outcomes are decided by
//! the test.

#![allow(missing_docs)]

use chrono::{TimeZone, Utc};
use gridsweep_core::{CommandRequest, Coordinate, CoverageRequest, ExecutionId, NewExecution};
use gridsweep_store::{
    ConcurrencyStamp, ExecutionStore, PendingExecution, StoreError, StoredExecution,
};
use parking_lot::Mutex;
use std::collections::VecDeque;

/// What the next insert does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Another writer lands first; the stamp advances and the insert conflicts
    Conflict,
    /// Insert succeeds
    Succeed,
    /// Store is unreachable
    Unavailable,
    /// Insert never completes
    Hang,
}

/// Calls observed by a `ScriptedStore`, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreCall {
    Insert { baseline: ConcurrencyStamp },
    ReadStamp,
    List,
}

#[derive(Debug)]
struct ScriptState {
    script: VecDeque<InsertOutcome>,
    fallback: InsertOutcome,
    stamp: ConcurrencyStamp,
    last_id: u64,
    rows: Vec<StoredExecution>,
    calls: Vec<StoreCall>,
}

/// Store whose insert outcomes follow a script
#[derive(Debug)]
pub struct ScriptedStore {
    state: Mutex<ScriptState>,
}

impl ScriptedStore {
    /// Follow `script`, then apply `fallback` to every later insert
    pub fn new(script: impl IntoIterator<Item = InsertOutcome>, fallback: InsertOutcome) -> Self {
        Self {
            state: Mutex::new(ScriptState {
                script: script.into_iter().collect(),
                fallback,
                stamp: ConcurrencyStamp::INITIAL,
                last_id: 0,
                rows: Vec::new(),
                calls: Vec::new(),
            }),
        }
    }

    /// Every insert conflicts
    pub fn always_conflicting() -> Self {
        Self::new([], InsertOutcome::Conflict)
    }

    /// First `conflicts` inserts conflict, later ones succeed
    pub fn conflicting_times(conflicts: usize) -> Self {
        Self::new(
            std::iter::repeat(InsertOutcome::Conflict).take(conflicts),
            InsertOutcome::Succeed,
        )
    }

    /// Start from a non-initial stamp
    #[must_use]
    pub fn at_stamp(self, stamp: ConcurrencyStamp) -> Self {
        self.state.lock().stamp = stamp;
        self
    }

    /// Calls received so far
    pub fn calls(&self) -> Vec<StoreCall> {
        self.state.lock().calls.clone()
    }

    /// Number of inserts received so far
    pub fn insert_count(&self) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| matches!(c, StoreCall::Insert { .. }))
            .count()
    }

    /// Current stamp as the store sees it
    pub fn stamp(&self) -> ConcurrencyStamp {
        self.state.lock().stamp
    }
}

#[async_trait::async_trait]
impl ExecutionStore for ScriptedStore {
    async fn insert(&self, pending: &PendingExecution) -> Result<StoredExecution, StoreError> {
        let outcome = {
            let mut state = self.state.lock();
            state.calls.push(StoreCall::Insert {
                baseline: pending.baseline(),
            });
            let fallback = state.fallback;
            let outcome = state.script.pop_front().unwrap_or(fallback);

            match outcome {
                InsertOutcome::Conflict => {
                    state.stamp = state.stamp.next();
                    return Err(StoreError::conflict(pending.baseline(), Some(state.stamp)));
                }
                InsertOutcome::Succeed if pending.baseline() != state.stamp => {
                    return Err(StoreError::conflict(pending.baseline(), Some(state.stamp)));
                }
                InsertOutcome::Succeed => {
                    state.last_id += 1;
                    state.stamp = state.stamp.next();
                    let stored = StoredExecution {
                        id: ExecutionId(state.last_id),
                        stamp: state.stamp,
                        execution: pending.execution().clone(),
                    };
                    state.rows.push(stored.clone());
                    return Ok(stored);
                }
                InsertOutcome::Unavailable => {
                    return Err(StoreError::Unavailable("connection refused".to_string()));
                }
                InsertOutcome::Hang => outcome,
            }
        };

        debug_assert_eq!(outcome, InsertOutcome::Hang);
        std::future::pending().await
    }

    async fn current_stamp(&self) -> Result<ConcurrencyStamp, StoreError> {
        let mut state = self.state.lock();
        state.calls.push(StoreCall::ReadStamp);
        Ok(state.stamp)
    }

    async fn list(&self) -> Result<Vec<StoredExecution>, StoreError> {
        let mut state = self.state.lock();
        state.calls.push(StoreCall::List);
        Ok(state.rows.clone())
    }
}

/// Fixed execution content
pub fn sample_execution() -> NewExecution {
    NewExecution {
        timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        command_count: 2,
        covered_cells: 6,
        duration_seconds: 0.000_012,
    }
}

/// Build a wire request from `(direction, steps)` pairs
pub fn request(start: (i64, i64), commands: &[(&str, i64)]) -> CoverageRequest {
    CoverageRequest::new(
        Coordinate::new(start.0, start.1),
        commands
            .iter()
            .map(|(direction, steps)| CommandRequest::new(*direction, *steps))
            .collect(),
    )
}
