//! Inbound request shape and validation
//!
//! Command fields arrive as untyped JSON values: a null direction, a missing
//! step count or a fractional step count all parse, and validation reports each
//! of them alongside every other problem in the request.

use crate::error::ValidationError;
use crate::types::{Coordinate, Direction, MovementCommand};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message used when the command list is absent or empty
pub const COMMANDS_REQUIRED: &str = "Movement commands are required.";

/// Message used when the start coordinate is absent
pub const START_REQUIRED: &str = "Start coordinate is required.";

/// Coordinate as received on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinateRequest {
    /// Column
    pub x: i64,
    /// Row
    pub y: i64,
}

/// Movement command as received on the wire
///
/// `None` means the field was absent or `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandRequest {
    /// Expected to be a direction name
    #[serde(default)]
    pub direction: Option<Value>,
    /// Expected to be a positive whole number
    #[serde(default)]
    pub steps: Option<Value>,
}

impl CommandRequest {
    /// Build a well-formed wire command
    pub fn new(direction: impl Into<String>, steps: i64) -> Self {
        Self {
            direction: Some(Value::String(direction.into())),
            steps: Some(Value::from(steps)),
        }
    }
}

/// Coverage request as received on the wire
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageRequest {
    /// Starting cell; `None` when absent or `null`
    #[serde(default)]
    pub start: Option<CoordinateRequest>,
    /// Ordered commands; `None` when absent or `null`
    #[serde(default)]
    pub commands: Option<Vec<CommandRequest>>,
}

impl CoverageRequest {
    /// Build a request from its parts
    #[must_use]
    pub fn new(start: Coordinate, commands: Vec<CommandRequest>) -> Self {
        Self {
            start: Some(CoordinateRequest {
                x: start.x,
                y: start.y,
            }),
            commands: Some(commands),
        }
    }
}

/// Bounds applied during validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationLimits {
    /// Maximum number of commands per request
    pub max_commands: usize,
    /// Maximum steps of a single command
    pub max_steps: u32,
    /// Start coordinates must satisfy `|x|, |y| <= coordinate_bound`
    pub coordinate_bound: i64,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            max_commands: 10_000,
            max_steps: 100_000,
            coordinate_bound: 100_000,
        }
    }
}

/// A request that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    /// In-bounds starting cell
    pub start: Coordinate,
    /// Non-empty, each with a known direction and positive steps
    pub commands: Vec<MovementCommand>,
}

/// Validate a wire request into typed commands
///
/// Every problem is collected; the error carries all of them.
///
/// # Errors
/// Returns `ValidationError` when the start is missing or out of bounds, the
/// command list is missing, empty or too long, or any command has a missing or
/// unknown direction or a missing, non-integer or out-of-range step count.
pub fn validate_request(
    request: &CoverageRequest,
    limits: &ValidationLimits,
) -> Result<ValidatedRequest, ValidationError> {
    let mut messages = Vec::new();

    let start = match request.start {
        None => {
            messages.push(START_REQUIRED.to_string());
            None
        }
        Some(c) if out_of_bounds(c, limits.coordinate_bound) => {
            messages.push(format!(
                "Start coordinate must lie within ±{} on both axes.",
                limits.coordinate_bound
            ));
            None
        }
        Some(c) => Some(Coordinate::new(c.x, c.y)),
    };

    let commands = match request.commands.as_deref() {
        None | Some([]) => {
            messages.push(COMMANDS_REQUIRED.to_string());
            Vec::new()
        }
        Some(raw) => {
            if raw.len() > limits.max_commands {
                messages.push(format!(
                    "At most {} movement commands are allowed.",
                    limits.max_commands
                ));
            }
            raw.iter()
                .enumerate()
                .filter_map(|(index, command)| {
                    validate_command(index, command, limits, &mut messages)
                })
                .collect()
        }
    };

    match start {
        Some(start) if messages.is_empty() => Ok(ValidatedRequest { start, commands }),
        _ => {
            tracing::debug!(problems = messages.len(), "request rejected");
            Err(ValidationError::new(messages))
        }
    }
}

fn out_of_bounds(c: CoordinateRequest, bound: i64) -> bool {
    let bound = bound.unsigned_abs();
    c.x.unsigned_abs() > bound || c.y.unsigned_abs() > bound
}

fn validate_command(
    index: usize,
    command: &CommandRequest,
    limits: &ValidationLimits,
    messages: &mut Vec<String>,
) -> Option<MovementCommand> {
    let direction = match &command.direction {
        None => {
            messages.push(format!("Command {index}: direction is required."));
            None
        }
        Some(value) => {
            let parsed = value.as_str().and_then(|name| name.parse::<Direction>().ok());
            if parsed.is_none() {
                let shown = value.as_str().map_or_else(|| value.to_string(), str::to_string);
                messages.push(format!(
                    "Command {index}: direction '{shown}' is not one of north, east, south, west."
                ));
            }
            parsed
        }
    };

    let steps = match command.steps.as_ref().map(step_count) {
        None => {
            messages.push(format!("Command {index}: steps are required."));
            None
        }
        Some(StepCount::NotWhole) => {
            messages.push(format!("Command {index}: steps must be a whole number."));
            None
        }
        Some(StepCount::Whole(n)) if n <= 0 => {
            messages.push(format!("Command {index}: steps must be positive."));
            None
        }
        Some(StepCount::Whole(n)) if n > i128::from(limits.max_steps) => {
            messages.push(format!(
                "Command {index}: steps must not exceed {}.",
                limits.max_steps
            ));
            None
        }
        Some(StepCount::Whole(n)) => u32::try_from(n).ok(),
    };

    Some(MovementCommand::new(direction?, steps?))
}

enum StepCount {
    Whole(i128),
    NotWhole,
}

fn step_count(value: &Value) -> StepCount {
    value
        .as_i64()
        .map(i128::from)
        .or_else(|| value.as_u64().map(i128::from))
        .map_or(StepCount::NotWhole, StepCount::Whole)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn limits() -> ValidationLimits {
        ValidationLimits::default()
    }

    #[test]
    fn valid_request_is_typed() {
        let request = CoverageRequest::new(
            Coordinate::new(10, 22),
            vec![CommandRequest::new("east", 2), CommandRequest::new("North", 1)],
        );

        let validated = validate_request(&request, &limits()).unwrap();
        assert_eq!(validated.start, Coordinate::new(10, 22));
        assert_eq!(
            validated.commands,
            vec![MovementCommand::east(2), MovementCommand::north(1)]
        );
    }

    #[test]
    fn empty_commands_rejected_with_required_message() {
        let request = CoverageRequest::new(Coordinate::origin(), vec![]);
        let error = validate_request(&request, &limits()).unwrap_err();
        assert_eq!(error.to_string(), "Movement commands are required.");
    }

    #[test]
    fn missing_commands_rejected_with_required_message() {
        let request = CoverageRequest {
            start: Some(CoordinateRequest { x: 0, y: 0 }),
            commands: None,
        };
        let error = validate_request(&request, &limits()).unwrap_err();
        assert_eq!(error.messages, vec![COMMANDS_REQUIRED.to_string()]);
    }

    #[test]
    fn all_problems_are_reported_together() {
        let request = CoverageRequest {
            start: None,
            commands: Some(vec![
                CommandRequest::new("up", 1),
                CommandRequest::new("west", 0),
                CommandRequest::new("south", 3),
            ]),
        };

        let error = validate_request(&request, &limits()).unwrap_err();
        assert_eq!(
            error.messages,
            vec![
                START_REQUIRED.to_string(),
                "Command 0: direction 'up' is not one of north, east, south, west.".to_string(),
                "Command 1: steps must be positive.".to_string(),
            ]
        );
        assert_eq!(
            error.to_string(),
            "Start coordinate is required. \
             Command 0: direction 'up' is not one of north, east, south, west. \
             Command 1: steps must be positive."
        );
    }

    #[test]
    fn limits_are_enforced() {
        let tight = ValidationLimits {
            max_commands: 2,
            max_steps: 10,
            coordinate_bound: 5,
        };
        let request = CoverageRequest::new(
            Coordinate::new(6, 0),
            vec![
                CommandRequest::new("east", 11),
                CommandRequest::new("east", 1),
                CommandRequest::new("east", 1),
            ],
        );

        let error = validate_request(&request, &tight).unwrap_err();
        assert_eq!(
            error.messages,
            vec![
                "Start coordinate must lie within ±5 on both axes.".to_string(),
                "At most 2 movement commands are allowed.".to_string(),
                "Command 0: steps must not exceed 10.".to_string(),
            ]
        );
    }

    #[test]
    fn wire_format_is_camel_case_json() {
        let json = r#"{"start":{"x":1,"y":-2},"commands":[{"direction":"west","steps":4}]}"#;
        let request: CoverageRequest = serde_json::from_str(json).unwrap();
        assert_eq!(
            request,
            CoverageRequest::new(Coordinate::new(1, -2), vec![CommandRequest::new("west", 4)])
        );

        let empty: CoverageRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, CoverageRequest::default());
    }

    #[test]
    fn malformed_command_fields_reach_validation() {
        let json = r#"{"start":{"x":0,"y":0},"commands":[
            {"direction":null,"steps":1},
            {"direction":"east"},
            {"direction":"north","steps":1.5},
            {"direction":7,"steps":"two"},
            {"direction":"west","steps":18446744073709551615}
        ]}"#;
        let request: CoverageRequest = serde_json::from_str(json).unwrap();

        let error = validate_request(&request, &limits()).unwrap_err();
        assert_eq!(
            error.messages,
            vec![
                "Command 0: direction is required.".to_string(),
                "Command 1: steps are required.".to_string(),
                "Command 2: steps must be a whole number.".to_string(),
                "Command 3: direction '7' is not one of north, east, south, west.".to_string(),
                "Command 3: steps must be a whole number.".to_string(),
                "Command 4: steps must not exceed 100000.".to_string(),
            ]
        );
    }

    #[test]
    fn null_start_and_commands_read_as_missing() {
        let request: CoverageRequest =
            serde_json::from_str(r#"{"start":null,"commands":null}"#).unwrap();

        let error = validate_request(&request, &limits()).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Start coordinate is required. Movement commands are required."
        );
    }
}
