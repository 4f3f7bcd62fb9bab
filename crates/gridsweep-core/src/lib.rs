//! gridsweep Core - path model and coverage engine
//!
//! Turns a validated list of cardinal movement commands into the number of
//! grid cells covered by the path's bounding rectangle:
//! - Wire request types and validation with aggregated messages
//! - Typed commands, coordinates and bounding extents
//! - The O(n) / O(1)-memory coverage fold
//! - Execution records shared with the persistence layer
//!
//! # Example
//!
//! ```rust
//! use gridsweep_core::prelude::*;
//!
//! let request = CoverageRequest::new(
//!     Coordinate::origin(),
//!     vec![CommandRequest::new("east", 2), CommandRequest::new("north", 1)],
//! );
//! let validated = validate_request(&request, &ValidationLimits::default())?;
//! assert_eq!(validated.commands, vec![MovementCommand::east(2), MovementCommand::north(1)]);
//!
//! let coverage = compute_coverage(validated.start, &validated.commands)?;
//! assert_eq!(coverage.covered_cells, 6);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(unreachable_pub)]

pub mod coverage;
pub mod error;
pub mod request;
pub mod types;

// Re-exports for convenience
pub use coverage::{compute_coverage, Coverage};
pub use error::{CoverageError, ValidationError};
pub use request::{
    validate_request, CommandRequest, CoordinateRequest, CoverageRequest, ValidatedRequest,
    ValidationLimits,
};
pub use types::{
    BoundingExtent, Coordinate, Direction, ExecutionId, ExecutionResult, MovementCommand,
    NewExecution,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with gridsweep core
    pub use crate::{
        compute_coverage, validate_request, CommandRequest, Coordinate, CoverageRequest,
        Direction, ExecutionResult, MovementCommand, ValidationLimits,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
