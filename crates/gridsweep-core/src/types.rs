//! Core types for gridsweep
//!
//! Defines the fundamental values of a coverage run:
//! - Grid coordinates and cardinal directions
//! - Movement commands
//! - The bounding extent accumulated while walking a path
//! - Execution records produced by a run

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Position of the agent on the integer grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Coordinate {
    /// Horizontal position (east is positive)
    pub x: i64,
    /// Vertical position (north is positive)
    pub y: i64,
}

impl Coordinate {
    /// Create a coordinate
    #[inline]
    #[must_use]
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// The grid origin
    #[inline]
    #[must_use]
    pub const fn origin() -> Self {
        Self { x: 0, y: 0 }
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Cardinal direction of a movement command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Increases y
    North,
    /// Increases x
    East,
    /// Decreases y
    South,
    /// Decreases x
    West,
}

impl Direction {
    /// All four directions in clockwise order starting north
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Lowercase wire name
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::East => "east",
            Direction::South => "south",
            Direction::West => "west",
        }
    }

    /// Unit displacement `(dx, dy)` of a single step
    #[inline]
    #[must_use]
    pub const fn unit(&self) -> (i64, i64) {
        match self {
            Direction::North => (0, 1),
            Direction::East => (1, 0),
            Direction::South => (0, -1),
            Direction::West => (-1, 0),
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a direction name is not recognised
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown direction: {0}")]
pub struct UnknownDirection(pub String);

impl FromStr for Direction {
    type Err = UnknownDirection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Direction::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownDirection(s.to_string()))
    }
}

/// A single validated movement command
///
/// `steps` is always positive once a command has passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MovementCommand {
    /// Direction of travel
    pub direction: Direction,
    /// Number of cells to move
    pub steps: u32,
}

impl MovementCommand {
    /// Create a command
    #[inline]
    #[must_use]
    pub const fn new(direction: Direction, steps: u32) -> Self {
        Self { direction, steps }
    }

    /// Shorthand for a northward command
    #[inline]
    #[must_use]
    pub const fn north(steps: u32) -> Self {
        Self::new(Direction::North, steps)
    }

    /// Shorthand for an eastward command
    #[inline]
    #[must_use]
    pub const fn east(steps: u32) -> Self {
        Self::new(Direction::East, steps)
    }

    /// Shorthand for a southward command
    #[inline]
    #[must_use]
    pub const fn south(steps: u32) -> Self {
        Self::new(Direction::South, steps)
    }

    /// Shorthand for a westward command
    #[inline]
    #[must_use]
    pub const fn west(steps: u32) -> Self {
        Self::new(Direction::West, steps)
    }
}

/// Axis-aligned rectangle containing every visited position
///
/// Starts as the single start cell and is only ever widened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingExtent {
    /// Smallest x reached
    pub min_x: i64,
    /// Largest x reached
    pub max_x: i64,
    /// Smallest y reached
    pub min_y: i64,
    /// Largest y reached
    pub max_y: i64,
}

impl BoundingExtent {
    /// Extent covering only `start`
    #[inline]
    #[must_use]
    pub const fn at(start: Coordinate) -> Self {
        Self {
            min_x: start.x,
            max_x: start.x,
            min_y: start.y,
            max_y: start.y,
        }
    }

    /// Return the extent widened to include `position`
    #[inline]
    #[must_use]
    pub fn including(self, position: Coordinate) -> Self {
        Self {
            min_x: self.min_x.min(position.x),
            max_x: self.max_x.max(position.x),
            min_y: self.min_y.min(position.y),
            max_y: self.max_y.max(position.y),
        }
    }

    /// Whether `position` lies inside the extent
    #[inline]
    #[must_use]
    pub fn contains(&self, position: Coordinate) -> bool {
        (self.min_x..=self.max_x).contains(&position.x)
            && (self.min_y..=self.max_y).contains(&position.y)
    }

    /// Number of columns spanned, `None` if it does not fit in `u64`
    #[inline]
    #[must_use]
    pub fn width(&self) -> Option<u64> {
        span(self.min_x, self.max_x)
    }

    /// Number of rows spanned, `None` if it does not fit in `u64`
    #[inline]
    #[must_use]
    pub fn height(&self) -> Option<u64> {
        span(self.min_y, self.max_y)
    }

    /// Cells inside the rectangle, `None` on overflow
    #[inline]
    #[must_use]
    pub fn cell_count(&self) -> Option<u64> {
        self.width()?.checked_mul(self.height()?)
    }
}

fn span(min: i64, max: i64) -> Option<u64> {
    max.abs_diff(min).checked_add(1)
}

/// Server-assigned execution identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionId(pub u64);

impl std::fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Business content of an execution before it has been stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExecution {
    /// UTC instant the computation completed
    pub timestamp: DateTime<Utc>,
    /// Number of commands processed
    pub command_count: u64,
    /// Cells inside the bounding rectangle of the path
    pub covered_cells: u64,
    /// Wall-clock time of the coverage computation
    pub duration_seconds: f64,
}

/// The durable record of one run, as returned to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    /// Server-assigned identifier
    pub id: ExecutionId,
    /// UTC instant the computation completed
    pub timestamp: DateTime<Utc>,
    /// Number of commands processed
    pub command_count: u64,
    /// Cells inside the bounding rectangle of the path
    pub covered_cells: u64,
    /// Wall-clock time of the coverage computation
    pub duration_seconds: f64,
}

impl ExecutionResult {
    /// Attach a server-assigned id to new execution content
    #[inline]
    #[must_use]
    pub fn from_new(id: ExecutionId, execution: NewExecution) -> Self {
        Self {
            id,
            timestamp: execution.timestamp,
            command_count: execution.command_count,
            covered_cells: execution.covered_cells,
            duration_seconds: execution.duration_seconds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_parses_case_insensitively() {
        assert_eq!("North".parse::<Direction>().unwrap(), Direction::North);
        assert_eq!("EAST".parse::<Direction>().unwrap(), Direction::East);
        assert_eq!(" south ".parse::<Direction>().unwrap(), Direction::South);
        assert_eq!("west".parse::<Direction>().unwrap(), Direction::West);
        assert!("up".parse::<Direction>().is_err());
        assert!("".parse::<Direction>().is_err());
    }

    #[test]
    fn direction_units_are_opposite_pairs() {
        let (nx, ny) = Direction::North.unit();
        let (sx, sy) = Direction::South.unit();
        assert_eq!((nx + sx, ny + sy), (0, 0));

        let (ex, ey) = Direction::East.unit();
        let (wx, wy) = Direction::West.unit();
        assert_eq!((ex + wx, ey + wy), (0, 0));
    }

    #[test]
    fn extent_widens_but_never_narrows() {
        let extent = BoundingExtent::at(Coordinate::origin())
            .including(Coordinate::new(3, -2))
            .including(Coordinate::new(1, 1));

        assert_eq!(extent.min_x, 0);
        assert_eq!(extent.max_x, 3);
        assert_eq!(extent.min_y, -2);
        assert_eq!(extent.max_y, 1);
        assert_eq!(extent.cell_count(), Some(4 * 4));
    }

    #[test]
    fn single_cell_extent_counts_one() {
        let extent = BoundingExtent::at(Coordinate::new(-7, 9));
        assert_eq!(extent.cell_count(), Some(1));
        assert!(extent.contains(Coordinate::new(-7, 9)));
        assert!(!extent.contains(Coordinate::new(-6, 9)));
    }

    #[test]
    fn full_range_extent_overflows() {
        let extent = BoundingExtent::at(Coordinate::new(i64::MIN, 0))
            .including(Coordinate::new(i64::MAX, 0));
        assert_eq!(extent.width(), None);
        assert_eq!(extent.cell_count(), None);
    }
}
