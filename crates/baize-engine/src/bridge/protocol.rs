/// Flat frame layout shared with the host renderer.
///
/// Layout (all values in f32 / 4 bytes):
/// ```text
/// [Header: 12 floats]
/// [Balls: max_balls × 8 floats]
/// [Pockets: 6 × 4 floats]
/// [Cue: 8 floats]
/// [Events: max_events × 4 floats]
/// ```
///
/// Capacities are written into the header every frame, so the host can
/// compute offsets without sharing constants.

use bytemuck::{Pod, Zeroable};

use crate::api::types::SessionEvent;
use crate::components::table::Table;
use crate::error::{Advisory, PlacementError};
use crate::systems::snapshot::{BallView, CueView, SessionSnapshot};

/// Number of floats in the header section.
pub const HEADER_FLOATS: usize = 12;

/// Header field indices.
pub const HEADER_PROTOCOL_VERSION: usize = 0;
pub const HEADER_TICK: usize = 1;
pub const HEADER_MODE: usize = 2;
pub const HEADER_FLAGS: usize = 3;
pub const HEADER_MAX_BALLS: usize = 4;
pub const HEADER_BALL_COUNT: usize = 5;
pub const HEADER_MAX_EVENTS: usize = 6;
pub const HEADER_EVENT_COUNT: usize = 7;
pub const HEADER_TABLE_WIDTH: usize = 8;
pub const HEADER_TABLE_LENGTH: usize = 9;
pub const HEADER_BALL_RADIUS: usize = 10;
pub const HEADER_DROPPED_EVENTS: usize = 11;

pub const PROTOCOL_VERSION: f32 = 1.0;

/// Header flag bits.
pub const FLAG_PLACING_CUE_BALL: u32 = 1;
pub const FLAG_CUE_BALL_PLACED: u32 = 1 << 1;
pub const FLAG_MOVING: u32 = 1 << 2;
pub const FLAG_CONSECUTIVE_COLORS: u32 = 1 << 3;

/// Ball flag bits.
pub const BALL_POCKETED: u32 = 1;
pub const BALL_ON_TABLE: u32 = 1 << 1;

pub const POCKET_COUNT: usize = 6;

/// Event kinds in the first float of each event record.
pub const EVENT_MODE_SELECTED: f32 = 1.0;
pub const EVENT_CUE_BALL_PLACED: f32 = 2.0;
pub const EVENT_SHOT_FIRED: f32 = 3.0;
pub const EVENT_BALL_POTTED: f32 = 4.0;
pub const EVENT_BALL_RESPAWNED: f32 = 5.0;
pub const EVENT_BALLS_AT_REST: f32 = 6.0;
pub const EVENT_ADVISORY: f32 = 7.0;

/// Advisory codes, second float of an advisory event.
pub const ADVISORY_NOT_IN_D: f32 = 1.0;
pub const ADVISORY_OUT_OF_BOUNDS: f32 = 2.0;
pub const ADVISORY_OBSTRUCTED: f32 = 3.0;
pub const ADVISORY_EXHAUSTED: f32 = 4.0;
pub const ADVISORY_CONSECUTIVE_COLORS: f32 = 5.0;

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct BallInstance {
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
    pub radius: f32,
    /// `BallKind::code()`.
    pub kind: f32,
    pub id: f32,
    /// `BALL_POCKETED | BALL_ON_TABLE` bits.
    pub flags: f32,
    pub value: f32,
}

impl BallInstance {
    pub const FLOATS: usize = 8;

    pub fn from_view(view: &BallView) -> Self {
        let mut flags = 0;
        if view.pocketed {
            flags |= BALL_POCKETED;
        }
        if view.on_table {
            flags |= BALL_ON_TABLE;
        }
        Self {
            x: view.position.x,
            y: view.position.y,
            rotation: view.rotation,
            radius: view.radius,
            kind: view.kind.code() as f32,
            id: view.id.0 as f32,
            flags: flags as f32,
            value: view.value as f32,
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct PocketInstance {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    /// 0 corner, 1 middle.
    pub kind: f32,
}

impl PocketInstance {
    pub const FLOATS: usize = 4;
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct CueInstance {
    pub visible: f32,
    pub aiming: f32,
    pub angle: f32,
    pub pullback: f32,
    pub power: f32,
    pub contact_x: f32,
    pub contact_y: f32,
    pub shot_type: f32,
}

impl CueInstance {
    pub const FLOATS: usize = 8;

    pub fn from_view(view: &CueView) -> Self {
        Self {
            visible: f32::from(u8::from(view.visible)),
            aiming: f32::from(u8::from(view.aiming)),
            angle: view.angle,
            pullback: view.pullback,
            power: view.power,
            contact_x: view.contact.x,
            contact_y: view.contact.y,
            shot_type: view.shot_type.code() as f32,
        }
    }
}

/// One event record: kind, then three payload floats.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct GameEvent {
    pub kind: f32,
    pub a: f32,
    pub b: f32,
    pub c: f32,
}

impl GameEvent {
    pub const FLOATS: usize = 4;

    fn new(kind: f32, a: f32, b: f32, c: f32) -> Self {
        Self { kind, a, b, c }
    }

    pub fn encode(event: &SessionEvent) -> Self {
        match *event {
            SessionEvent::ModeSelected(mode) => Self::new(EVENT_MODE_SELECTED, mode.code() as f32, 0.0, 0.0),
            SessionEvent::CueBallPlaced { position } => {
                Self::new(EVENT_CUE_BALL_PLACED, position.x, position.y, 0.0)
            }
            SessionEvent::ShotFired { impulse, shot_type } => {
                Self::new(EVENT_SHOT_FIRED, impulse.x, impulse.y, shot_type.code() as f32)
            }
            SessionEvent::BallPotted { ball, kind, pocket } => {
                Self::new(EVENT_BALL_POTTED, ball.0 as f32, kind.code() as f32, pocket as f32)
            }
            SessionEvent::BallRespawned { ball, position, .. } => {
                Self::new(EVENT_BALL_RESPAWNED, ball.0 as f32, position.x, position.y)
            }
            SessionEvent::BallsAtRest => Self::new(EVENT_BALLS_AT_REST, 0.0, 0.0, 0.0),
            SessionEvent::Advisory(advisory) => {
                let (code, a, b) = match advisory {
                    Advisory::Placement(PlacementError::NotInD { x, y }) => (ADVISORY_NOT_IN_D, x, y),
                    Advisory::Placement(PlacementError::OutOfBounds { x, y }) => (ADVISORY_OUT_OF_BOUNDS, x, y),
                    Advisory::Placement(PlacementError::Obstructed { x, y }) => (ADVISORY_OBSTRUCTED, x, y),
                    Advisory::Placement(PlacementError::Exhausted { kind, attempts }) => {
                        (ADVISORY_EXHAUSTED, kind.code() as f32, attempts as f32)
                    }
                    Advisory::ConsecutiveColors { previous, current } => {
                        (ADVISORY_CONSECUTIVE_COLORS, previous.code() as f32, current.code() as f32)
                    }
                };
                Self::new(EVENT_ADVISORY, code, a, b)
            }
        }
    }
}

/// Buffer layout computed from the capacities.
#[derive(Debug, Clone, PartialEq)]
pub struct ProtocolLayout {
    pub max_balls: usize,
    pub max_events: usize,

    pub ball_data_floats: usize,
    pub pocket_data_floats: usize,
    pub cue_data_floats: usize,
    pub event_data_floats: usize,

    /// Offset (in floats) where ball data begins.
    pub ball_data_offset: usize,
    pub pocket_data_offset: usize,
    pub cue_data_offset: usize,
    pub event_data_offset: usize,

    /// Total buffer size in floats.
    pub buffer_total_floats: usize,
    /// Total buffer size in bytes.
    pub buffer_total_bytes: usize,
}

/// What a written frame holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameCounts {
    pub balls: usize,
    pub events: usize,
    /// Events that did not fit and were left out.
    pub dropped_events: usize,
}

impl ProtocolLayout {
    pub fn new(max_balls: usize, max_events: usize) -> Self {
        let ball_data_floats = max_balls * BallInstance::FLOATS;
        let pocket_data_floats = POCKET_COUNT * PocketInstance::FLOATS;
        let cue_data_floats = CueInstance::FLOATS;
        let event_data_floats = max_events * GameEvent::FLOATS;

        let ball_data_offset = HEADER_FLOATS;
        let pocket_data_offset = ball_data_offset + ball_data_floats;
        let cue_data_offset = pocket_data_offset + pocket_data_floats;
        let event_data_offset = cue_data_offset + cue_data_floats;

        let buffer_total_floats = event_data_offset + event_data_floats;

        Self {
            max_balls,
            max_events,
            ball_data_floats,
            pocket_data_floats,
            cue_data_floats,
            event_data_floats,
            ball_data_offset,
            pocket_data_offset,
            cue_data_offset,
            event_data_offset,
            buffer_total_floats,
            buffer_total_bytes: buffer_total_floats * 4,
        }
    }

    /// A zeroed buffer of the right size.
    pub fn allocate(&self) -> Vec<f32> {
        vec![0.0; self.buffer_total_floats]
    }

    /// Write one frame into `out`, which must be at least `buffer_total_floats` long.
    /// Balls and events beyond capacity are cut off.
    pub fn write_frame(
        &self,
        snapshot: &SessionSnapshot,
        table: &Table,
        events: &[SessionEvent],
        out: &mut [f32],
    ) -> FrameCounts {
        if out.len() < self.buffer_total_floats {
            log::warn!(
                "frame buffer too small: {} floats, need {}",
                out.len(),
                self.buffer_total_floats
            );
            return FrameCounts { balls: 0, events: 0, dropped_events: events.len() };
        }
        out[..self.buffer_total_floats].fill(0.0);

        let balls: Vec<BallInstance> = snapshot
            .balls
            .iter()
            .take(self.max_balls)
            .map(BallInstance::from_view)
            .collect();
        let start = self.ball_data_offset;
        out[start..start + balls.len() * BallInstance::FLOATS].copy_from_slice(bytemuck::cast_slice(&balls));

        let pockets: Vec<PocketInstance> = table
            .pockets
            .iter()
            .map(|p| PocketInstance {
                x: p.position.x,
                y: p.position.y,
                radius: p.radius,
                kind: p.kind.code() as f32,
            })
            .collect();
        let start = self.pocket_data_offset;
        out[start..start + self.pocket_data_floats].copy_from_slice(bytemuck::cast_slice(&pockets));

        let cue = CueInstance::from_view(&snapshot.cue);
        let start = self.cue_data_offset;
        out[start..start + self.cue_data_floats].copy_from_slice(bytemuck::cast_slice(std::slice::from_ref(&cue)));

        let encoded: Vec<GameEvent> = events.iter().take(self.max_events).map(GameEvent::encode).collect();
        let start = self.event_data_offset;
        out[start..start + encoded.len() * GameEvent::FLOATS].copy_from_slice(bytemuck::cast_slice(&encoded));

        let mut flags = 0;
        if snapshot.placing_cue_ball {
            flags |= FLAG_PLACING_CUE_BALL;
        }
        if snapshot.cue_ball_placed {
            flags |= FLAG_CUE_BALL_PLACED;
        }
        if snapshot.moving {
            flags |= FLAG_MOVING;
        }
        if snapshot.consecutive_colors {
            flags |= FLAG_CONSECUTIVE_COLORS;
        }

        let counts = FrameCounts {
            balls: balls.len(),
            events: encoded.len(),
            dropped_events: events.len() - encoded.len(),
        };
        out[HEADER_PROTOCOL_VERSION] = PROTOCOL_VERSION;
        out[HEADER_TICK] = snapshot.tick as f32;
        out[HEADER_MODE] = snapshot.mode.code() as f32;
        out[HEADER_FLAGS] = flags as f32;
        out[HEADER_MAX_BALLS] = self.max_balls as f32;
        out[HEADER_BALL_COUNT] = counts.balls as f32;
        out[HEADER_MAX_EVENTS] = self.max_events as f32;
        out[HEADER_EVENT_COUNT] = counts.events as f32;
        out[HEADER_TABLE_WIDTH] = table.width;
        out[HEADER_TABLE_LENGTH] = table.length;
        out[HEADER_BALL_RADIUS] = table.ball_radius;
        out[HEADER_DROPPED_EVENTS] = counts.dropped_events as f32;
        counts
    }
}
