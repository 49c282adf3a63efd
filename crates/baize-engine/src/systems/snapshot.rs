//! Read-only view of a session for renderers and hosts.

use glam::Vec2;
use serde::Serialize;

use crate::api::session::GameState;
use crate::api::types::{BallId, BallKind, GameMode};
use crate::components::ball::Ball;
use crate::components::cue::Cue;
use crate::components::spin::ShotType;
use crate::core::physics::PhysicsWorld;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BallView {
    pub id: BallId,
    pub kind: BallKind,
    pub value: u32,
    /// Last known position; zero for a ball that is not on the table.
    pub position: Vec2,
    pub rotation: f32,
    pub radius: f32,
    pub pocketed: bool,
    pub on_table: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CueView {
    pub visible: bool,
    pub aiming: bool,
    pub angle: f32,
    pub pullback: f32,
    pub power: f32,
    pub contact: Vec2,
    pub shot_type: ShotType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub tick: u64,
    pub mode: GameMode,
    pub placing_cue_ball: bool,
    pub cue_ball_placed: bool,
    pub moving: bool,
    pub consecutive_colors: bool,
    /// Text of the latest advisory, for a message line.
    pub advisory: Option<String>,
    pub balls: Vec<BallView>,
    pub cue: CueView,
}

pub fn ball_view(world: &PhysicsWorld, ball: &Ball) -> BallView {
    BallView {
        id: ball.id,
        kind: ball.kind,
        value: ball.value(),
        position: ball.position(world).unwrap_or(Vec2::ZERO),
        rotation: ball.rotation(world),
        radius: ball.radius,
        pocketed: ball.is_pocketed(),
        on_table: ball.is_on_table(),
    }
}

pub fn cue_view(cue: &Cue) -> CueView {
    CueView {
        visible: cue.visible,
        aiming: cue.aiming,
        angle: cue.angle,
        pullback: cue.pullback,
        power: cue.power,
        contact: cue.contact,
        shot_type: cue.shot_type,
    }
}

pub fn build(
    world: &PhysicsWorld,
    balls: &[Ball],
    cue: &Cue,
    state: &GameState,
    moving: bool,
    tick: u64,
) -> SessionSnapshot {
    SessionSnapshot {
        tick,
        mode: state.mode,
        placing_cue_ball: state.placing_cue_ball,
        cue_ball_placed: state.cue_ball_placed,
        moving,
        consecutive_colors: state.consecutive_colors,
        advisory: state.last_advisory.map(|a| a.to_string()),
        balls: balls.iter().map(|b| ball_view(world, b)).collect(),
        cue: cue_view(cue),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BallPhysics, CueTuning};
    use crate::error::{Advisory, PlacementError};

    #[test]
    fn views_reflect_ball_and_cue_state() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        world.set_timestep(1.0 / 60.0, 1);
        let mut on = Ball::new(BallId(0), BallKind::Cue, 6.0);
        on.spawn(&mut world, Vec2::new(10.0, 20.0), &BallPhysics::default());
        let mut potted = Ball::new(BallId(1), BallKind::Blue, 6.0);
        potted.spawn(&mut world, Vec2::new(50.0, 50.0), &BallPhysics::default());
        potted.pocket(&mut world);

        let mut cue = Cue::new(&CueTuning::default());
        cue.visible = true;
        let state = GameState {
            mode: GameMode::Standard,
            cue_ball_placed: true,
            last_advisory: Some(Advisory::Placement(PlacementError::NotInD { x: 1.0, y: 2.0 })),
            ..GameState::default()
        };

        let snap = build(&world, &[on, potted], &cue, &state, false, 9);
        assert_eq!(snap.tick, 9);
        assert_eq!(snap.balls.len(), 2);
        assert_eq!(snap.balls[0].position, Vec2::new(10.0, 20.0));
        assert!(snap.balls[0].on_table && !snap.balls[0].pocketed);
        assert!(snap.balls[1].pocketed && !snap.balls[1].on_table);
        assert_eq!(snap.balls[1].value, 5);
        assert!(snap.cue.visible);
        assert_eq!(snap.cue.shot_type, ShotType::Stun);
        assert!(snap.advisory.unwrap_or_default().contains("not inside the D"));
    }
}
