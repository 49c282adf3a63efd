use glam::Vec2;
use serde::Serialize;

use crate::components::spin::{ShotType, SpinState};
use crate::config::CueTuning;

/// Lowest selectable power level.
pub const MIN_POWER: f32 = 0.1;
pub const MAX_POWER: f32 = 1.0;

/// Everything a released cue does to the cue ball.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shot {
    pub impulse: Vec2,
    pub angular_velocity: f32,
    pub spin: SpinState,
    /// Sideways push applied a few ticks after the strike, for side spin.
    pub curve: Option<Vec2>,
}

/// The cue controller. Not a physical body; it only turns input into a [`Shot`].
#[derive(Debug, Clone, Serialize)]
pub struct Cue {
    /// Shot direction in radians, from the pointer toward the cue ball.
    pub angle: f32,
    pub power: f32,
    pub pullback: f32,
    /// Strike offset in ball radii: x is side (right positive), y is height (top positive).
    pub contact: Vec2,
    pub shot_type: ShotType,
    pub aiming: bool,
    pub visible: bool,
    target: Vec2,
}

impl Cue {
    pub fn new(tuning: &CueTuning) -> Self {
        Self {
            angle: 0.0,
            power: tuning.default_power.clamp(MIN_POWER, MAX_POWER),
            pullback: 0.0,
            contact: Vec2::ZERO,
            shot_type: ShotType::classify(Vec2::ZERO),
            aiming: false,
            visible: false,
            target: Vec2::ZERO,
        }
    }

    pub fn direction(&self) -> Vec2 {
        Vec2::from_angle(self.angle)
    }

    pub fn target(&self) -> Vec2 {
        self.target
    }

    /// Point the cue so it strikes from `pointer` through the ball.
    pub fn aim_at(&mut self, ball: Vec2, pointer: Vec2) {
        self.target = pointer;
        let along = ball - pointer;
        if along.length_squared() > f32::EPSILON {
            self.angle = along.y.atan2(along.x);
        }
    }

    pub fn begin_aim(&mut self, ball: Vec2, pointer: Vec2) {
        self.aiming = true;
        self.pullback = 0.0;
        self.aim_at(ball, pointer);
    }

    /// Aim and pull back: the further the pointer from the ball, the harder the shot.
    pub fn drag(&mut self, ball: Vec2, pointer: Vec2, tuning: &CueTuning) {
        if !self.aiming {
            return;
        }
        self.aim_at(ball, pointer);
        self.pullback = (ball.distance(pointer) - tuning.pullback_offset).clamp(0.0, tuning.max_pullback);
    }

    pub fn set_contact(&mut self, contact: Vec2, tuning: &CueTuning) {
        self.contact = Vec2::new(
            contact.x.clamp(-tuning.english_limit, tuning.english_limit),
            contact.y.clamp(-tuning.follow_draw_limit, tuning.follow_draw_limit),
        );
        self.shot_type = ShotType::classify(self.contact);
    }

    /// Map a pointer position around the ball to a contact point. Pointer
    /// above the ball on screen means top spin.
    pub fn set_contact_from_pointer(&mut self, ball: Vec2, pointer: Vec2, ball_radius: f32, tuning: &CueTuning) {
        let reach = tuning.contact_reach * ball_radius;
        if reach <= 0.0 {
            return;
        }
        let offset = (pointer - ball) / reach;
        self.set_contact(Vec2::new(offset.x, -offset.y), tuning);
    }

    pub fn adjust_power(&mut self, delta: f32) {
        self.power = (self.power + delta).clamp(MIN_POWER, MAX_POWER);
    }

    /// Fraction of a full-strength shot the current pullback and power give.
    pub fn intensity(&self, tuning: &CueTuning) -> f32 {
        (self.pullback / tuning.max_pullback) * self.power
    }

    /// The shot the cue would play right now, or `None` if it is not pulled
    /// back far enough to strike.
    pub fn compute_shot(&self, now: u64, tuning: &CueTuning) -> Option<Shot> {
        if self.pullback <= tuning.min_pullback {
            return None;
        }
        let intensity = self.intensity(tuning);
        let magnitude = intensity * tuning.max_power;
        let direction = self.direction();
        let impulse = direction * magnitude;

        let transfer = tuning.transfer_efficiency;
        let angular_velocity = (self.contact.x * transfer + 0.6 * self.contact.y * transfer)
            * magnitude
            * tuning.angular_scale;

        let curve = (self.contact.x.abs() > tuning.curve_threshold)
            .then(|| direction.perp() * self.contact.x * tuning.curve_intensity * magnitude);

        Some(Shot {
            impulse,
            angular_velocity,
            spin: SpinState {
                english: self.contact.x,
                follow_draw: self.contact.y,
                intensity,
                shot_type: self.shot_type,
                applied_at: now,
            },
            curve,
        })
    }

    /// Back to idle after a shot or a cancelled aim. Power and contact persist.
    pub fn end_aim(&mut self) {
        self.aiming = false;
        self.pullback = 0.0;
    }

    /// Full reset for a new frame or a potted cue ball.
    pub fn reset(&mut self) {
        self.end_aim();
        self.contact = Vec2::ZERO;
        self.shot_type = ShotType::classify(Vec2::ZERO);
        self.visible = false;
    }
}
