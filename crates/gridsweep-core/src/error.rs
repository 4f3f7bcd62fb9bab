//! Error types for gridsweep core
//!
//! Two families live here:
//! - Validation failures, which are the caller's fault and carry every message found
//! - Coverage faults, which mean a precondition was broken after validation

use crate::types::Coordinate;

/// Request validation failure
///
/// Displays as all individual messages joined by a single space.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", .messages.join(" "))]
pub struct ValidationError {
    /// Individual human-readable messages, in discovery order
    pub messages: Vec<String>,
}

impl ValidationError {
    /// Build from collected messages
    #[inline]
    #[must_use]
    pub fn new(messages: Vec<String>) -> Self {
        Self { messages }
    }

    /// Build from one message
    #[inline]
    #[must_use]
    pub fn single(message: impl Into<String>) -> Self {
        Self {
            messages: vec![message.into()],
        }
    }
}

/// Faults raised by the coverage engine
///
/// Every variant is a defect: validation is contracted to exclude these inputs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoverageError {
    /// The engine was handed no commands
    #[error("internal consistency fault: coverage requested for an empty command list")]
    EmptyCommands,

    /// A command with zero steps reached the engine
    #[error("internal consistency fault: command {index} has zero steps")]
    ZeroSteps {
        /// Position of the offending command
        index: usize,
    },

    /// A position or the covered-cell count left the representable range
    #[error("coverage overflow at command {index} (last position {position})")]
    Overflow {
        /// Position of the command being applied
        index: usize,
        /// Last position that was representable
        position: Coordinate,
    },
}
