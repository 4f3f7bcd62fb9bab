//! Path coverage engine
//!
//! Folds a command sequence into the bounding rectangle of every position the
//! agent reaches and counts the cells inside that rectangle.
//!
//! # Semantics
//!
//! The count is the number of cells in the axis-aligned bounding rectangle of
//! all visited positions, not the set of cells actually stepped on. Because the
//! path is made of axis-aligned segments between integer positions, the
//! rectangle is fully determined by the start and the endpoint of each command.
//! That keeps the engine at O(n) time and O(1) memory.
//!
//! Arithmetic is checked: a position leaving the `i64` range or a cell count
//! above `u64::MAX` yields [`CoverageError::Overflow`] instead of wrapping.

use crate::error::CoverageError;
use crate::types::{BoundingExtent, Coordinate, MovementCommand};
use serde::{Deserialize, Serialize};

/// Outcome of a coverage computation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coverage {
    /// Cells inside the final extent, at least 1
    pub covered_cells: u64,
    /// Bounding rectangle of every visited position
    pub final_extent: BoundingExtent,
    /// Where the agent ended up
    pub final_position: Coordinate,
}

/// Running state threaded through the fold
#[derive(Debug, Clone, Copy)]
struct Walk {
    position: Coordinate,
    extent: BoundingExtent,
}

/// Compute the covered-cell count for `commands` starting at `start`
///
/// # Errors
/// Returns `CoverageError` if:
/// - `commands` is empty
/// - a command has zero steps
/// - a position or the resulting cell count overflows
///
/// All three are excluded by request validation, so an error here is a defect.
pub fn compute_coverage(
    start: Coordinate,
    commands: &[MovementCommand],
) -> Result<Coverage, CoverageError> {
    if commands.is_empty() {
        return Err(CoverageError::EmptyCommands);
    }

    let initial = Walk {
        position: start,
        extent: BoundingExtent::at(start),
    };

    let walk = commands
        .iter()
        .enumerate()
        .try_fold(initial, |walk, (index, command)| step(walk, index, command))?;

    let covered_cells = walk
        .extent
        .cell_count()
        .ok_or(CoverageError::Overflow {
            index: commands.len() - 1,
            position: walk.position,
        })?;

    tracing::trace!(
        commands = commands.len(),
        covered_cells,
        "coverage computed"
    );

    Ok(Coverage {
        covered_cells,
        final_extent: walk.extent,
        final_position: walk.position,
    })
}

fn step(walk: Walk, index: usize, command: &MovementCommand) -> Result<Walk, CoverageError> {
    if command.steps == 0 {
        return Err(CoverageError::ZeroSteps { index });
    }

    let overflow = || CoverageError::Overflow {
        index,
        position: walk.position,
    };

    let (dx, dy) = command.direction.unit();
    let distance = i64::from(command.steps);
    let position = Coordinate {
        x: walk
            .position
            .x
            .checked_add(dx * distance)
            .ok_or_else(overflow)?,
        y: walk
            .position
            .y
            .checked_add(dy * distance)
            .ok_or_else(overflow)?,
    };

    Ok(Walk {
        position,
        extent: walk.extent.including(position),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MovementCommand as Cmd;
    use pretty_assertions::assert_eq;

    fn cells(commands: &[Cmd]) -> u64 {
        compute_coverage(Coordinate::origin(), commands)
            .unwrap()
            .covered_cells
    }

    #[test]
    fn east_then_north_covers_six() {
        assert_eq!(cells(&[Cmd::east(2), Cmd::north(1)]), 6);
    }

    #[test]
    fn closed_square_covers_four() {
        let coverage = compute_coverage(
            Coordinate::origin(),
            &[Cmd::east(1), Cmd::north(1), Cmd::west(1), Cmd::south(1)],
        )
        .unwrap();

        assert_eq!(
            coverage.final_extent,
            BoundingExtent {
                min_x: 0,
                max_x: 1,
                min_y: 0,
                max_y: 1,
            }
        );
        assert_eq!(coverage.covered_cells, 4);
        assert_eq!(coverage.final_position, Coordinate::origin());
    }

    #[test]
    fn single_east_step_covers_two() {
        assert_eq!(cells(&[Cmd::east(1)]), 2);
    }

    #[test]
    fn extent_keeps_extremes_after_return() {
        let coverage = compute_coverage(
            Coordinate::new(5, 5),
            &[Cmd::west(10), Cmd::east(20), Cmd::west(10)],
        )
        .unwrap();

        assert_eq!(coverage.final_position, Coordinate::new(5, 5));
        assert_eq!(coverage.final_extent.min_x, -5);
        assert_eq!(coverage.final_extent.max_x, 15);
        assert_eq!(coverage.covered_cells, 21);
    }

    #[test]
    fn empty_commands_is_a_fault() {
        assert_eq!(
            compute_coverage(Coordinate::origin(), &[]),
            Err(CoverageError::EmptyCommands)
        );
    }

    #[test]
    fn zero_steps_is_a_fault() {
        let result = compute_coverage(Coordinate::origin(), &[Cmd::east(1), Cmd::north(0)]);
        assert_eq!(result, Err(CoverageError::ZeroSteps { index: 1 }));
    }

    #[test]
    fn position_overflow_is_reported() {
        let start = Coordinate::new(i64::MAX - 1, 0);
        let result = compute_coverage(start, &[Cmd::east(1), Cmd::east(1)]);
        assert_eq!(
            result,
            Err(CoverageError::Overflow {
                index: 1,
                position: Coordinate::new(i64::MAX, 0),
            })
        );
    }

    #[test]
    fn cell_count_overflow_is_reported() {
        // 2^32 columns by 2^32 - 1 rows still fits in u64
        let result = compute_coverage(
            Coordinate::origin(),
            &[Cmd::east(u32::MAX), Cmd::north(u32::MAX - 1)],
        );
        assert_eq!(
            result.map(|c| c.covered_cells),
            Ok((1u64 << 32) * ((1u64 << 32) - 1))
        );

        let result = compute_coverage(
            Coordinate::origin(),
            &[Cmd::east(u32::MAX), Cmd::north(u32::MAX)],
        );
        assert!(matches!(result, Err(CoverageError::Overflow { index: 1, .. })));
    }
}
