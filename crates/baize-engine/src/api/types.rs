use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::components::spin::ShotType;
use crate::error::Advisory;

/// Index of a ball in the session roster. Stable for the whole session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct BallId(pub u32);

impl BallId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Identity of a snooker ball.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BallKind {
    Cue,
    Red,
    Yellow,
    Green,
    Brown,
    Blue,
    Pink,
    Black,
}

impl BallKind {
    /// The six colors in ascending value.
    pub const COLORS: [BallKind; 6] = [
        BallKind::Yellow,
        BallKind::Green,
        BallKind::Brown,
        BallKind::Blue,
        BallKind::Pink,
        BallKind::Black,
    ];

    pub fn value(self) -> u32 {
        match self {
            BallKind::Cue => 0,
            BallKind::Red => 1,
            BallKind::Yellow => 2,
            BallKind::Green => 3,
            BallKind::Brown => 4,
            BallKind::Blue => 5,
            BallKind::Pink => 6,
            BallKind::Black => 7,
        }
    }

    /// Colors get respawned on their spot; reds and the cue ball do not.
    pub fn is_color(self) -> bool {
        !matches!(self, BallKind::Cue | BallKind::Red)
    }

    /// Stable numeric code used on the wire and in body metadata.
    pub fn code(self) -> u8 {
        match self {
            BallKind::Cue => 0,
            BallKind::Red => 1,
            BallKind::Yellow => 2,
            BallKind::Green => 3,
            BallKind::Brown => 4,
            BallKind::Blue => 5,
            BallKind::Pink => 6,
            BallKind::Black => 7,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(BallKind::Cue),
            1 => Some(BallKind::Red),
            2 => Some(BallKind::Yellow),
            3 => Some(BallKind::Green),
            4 => Some(BallKind::Brown),
            5 => Some(BallKind::Blue),
            6 => Some(BallKind::Pink),
            7 => Some(BallKind::Black),
            _ => None,
        }
    }
}

/// What a rigid body represents. Carried in the body's `user_data` so
/// collision events can be matched without string labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyRole {
    Ball { id: BallId, kind: BallKind },
    Cushion,
}

const ROLE_CUSHION: u128 = 1;
const ROLE_BALL: u128 = 2;

impl BodyRole {
    pub(crate) fn to_user_data(self) -> u128 {
        match self {
            BodyRole::Cushion => ROLE_CUSHION,
            BodyRole::Ball { id, kind } => {
                ROLE_BALL | (kind.code() as u128) << 8 | (id.0 as u128) << 16
            }
        }
    }

    pub(crate) fn from_user_data(data: u128) -> Option<Self> {
        match data & 0xff {
            ROLE_CUSHION => Some(BodyRole::Cushion),
            ROLE_BALL => {
                let kind = BallKind::from_code(((data >> 8) & 0xff) as u8)?;
                let id = BallId((data >> 16) as u32);
                Some(BodyRole::Ball { id, kind })
            }
            _ => None,
        }
    }
}

/// Table setup mode, chosen by the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GameMode {
    #[default]
    Unset,
    /// Reds racked in the triangle, colors on their spots.
    Standard,
    /// Colors on their spots, reds scattered at random.
    RandomReds,
    /// Every object ball scattered at random.
    RandomAll,
}

impl GameMode {
    pub fn code(self) -> u32 {
        match self {
            GameMode::Unset => 0,
            GameMode::Standard => 1,
            GameMode::RandomReds => 2,
            GameMode::RandomAll => 3,
        }
    }

    /// Mode for one of the three select triggers. `0` and unknown codes are not selectable.
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(GameMode::Standard),
            2 => Some(GameMode::RandomReds),
            3 => Some(GameMode::RandomAll),
            _ => None,
        }
    }
}

/// Something that happened during a tick or an input, for the host to react to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum SessionEvent {
    ModeSelected(GameMode),
    CueBallPlaced { position: Vec2 },
    ShotFired { impulse: Vec2, shot_type: ShotType },
    BallPotted { ball: BallId, kind: BallKind, pocket: usize },
    BallRespawned { ball: BallId, kind: BallKind, position: Vec2 },
    /// Every ball on the table has come to rest after a shot.
    BallsAtRest,
    Advisory(Advisory),
}
