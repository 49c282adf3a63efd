//! Error and advisory types.
//!
//! Nothing here is fatal. Placement problems and illegal pot sequences are
//! advisories: the session reports them and carries on with its state unchanged.

use serde::Serialize;
use thiserror::Error;

use crate::api::types::BallKind;

/// Failure to load a [`SessionConfig`](crate::SessionConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("config field `{field}` {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Why a ball could not be put on the table.
#[derive(Debug, Clone, Copy, PartialEq, Error, Serialize)]
pub enum PlacementError {
    #[error("({x:.1}, {y:.1}) is not inside the D")]
    NotInD { x: f32, y: f32 },
    #[error("({x:.1}, {y:.1}) is off the playing surface")]
    OutOfBounds { x: f32, y: f32 },
    #[error("({x:.1}, {y:.1}) is too close to another ball or a pocket")]
    Obstructed { x: f32, y: f32 },
    #[error("no free position for the {kind:?} ball after {attempts} attempts")]
    Exhausted { kind: BallKind, attempts: u32 },
}

/// A transient message for the player. Never rolls back game state.
#[derive(Debug, Clone, Copy, PartialEq, Error, Serialize)]
pub enum Advisory {
    #[error("cannot place ball: {0}")]
    Placement(#[from] PlacementError),
    #[error("two colors potted in a row ({previous:?} then {current:?})")]
    ConsecutiveColors { previous: BallKind, current: BallKind },
}
