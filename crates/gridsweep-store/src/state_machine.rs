use crate::error::StateMachineError;
use serde::{Deserialize, Serialize};

/// Phases of a single persist operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PersistState {
    /// An insert is in flight
    Attempting,
    /// The last insert was rejected as a version conflict
    Conflicted,
    /// Re-reading the authoritative stamp before the next attempt
    Reconciling,
    /// Retry budget spent
    Exhausted,
    /// Record written
    Succeeded,
    /// Cancellation observed
    Cancelled,
}

impl PersistState {
    /// No transitions leave a terminal state.
    pub fn is_terminal(self) -> bool {
        allowed_transitions(self).is_empty()
    }
}

/// Validates a persister state transition.
///
/// `Conflicted` only returns to `Attempting` through `Reconciling`, so every
/// retry is preceded by a fresh read of the store.
pub fn validate_transition(from: PersistState, to: PersistState) -> Result<(), StateMachineError> {
    if allowed(from, to) {
        Ok(())
    } else {
        Err(StateMachineError { from, to })
    }
}

pub fn allowed_transitions(from: PersistState) -> Vec<PersistState> {
    use PersistState::*;
    match from {
        Attempting => vec![Succeeded, Conflicted, Cancelled],
        Conflicted => vec![Reconciling, Exhausted, Cancelled],
        Reconciling => vec![Attempting, Cancelled],
        Exhausted => vec![],
        Succeeded => vec![],
        Cancelled => vec![],
    }
}

fn allowed(from: PersistState, to: PersistState) -> bool {
    allowed_transitions(from).into_iter().any(|s| s == to)
}
