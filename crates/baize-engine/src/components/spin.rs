use glam::Vec2;
use serde::Serialize;

use crate::config::SpinTuning;

/// Shot classification from the cue's contact point on the cue ball.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ShotType {
    Stun,
    Follow,
    Draw,
    English,
    #[default]
    Normal,
}

impl ShotType {
    /// `contact.x` is side (right positive), `contact.y` is height (top positive).
    pub fn classify(contact: Vec2) -> Self {
        if contact.x.abs() < 0.1 && contact.y.abs() < 0.1 {
            ShotType::Stun
        } else if contact.y.abs() > 0.6 {
            if contact.y > 0.0 {
                ShotType::Follow
            } else {
                ShotType::Draw
            }
        } else if contact.x.abs() > 0.5 {
            ShotType::English
        } else {
            ShotType::Normal
        }
    }

    pub fn code(self) -> u32 {
        match self {
            ShotType::Stun => 0,
            ShotType::Follow => 1,
            ShotType::Draw => 2,
            ShotType::English => 3,
            ShotType::Normal => 4,
        }
    }
}

/// Spin put on the cue ball by the last shot. A ball without spin holds `None`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpinState {
    /// Side spin, right positive.
    pub english: f32,
    /// Top spin positive, back spin negative.
    pub follow_draw: f32,
    /// Pullback fraction times power, in [0, 1].
    pub intensity: f32,
    pub shot_type: ShotType,
    /// Tick the shot was played.
    pub applied_at: u64,
}

impl SpinState {
    /// Fade the spin once the decay delay has passed. Returns `false` when the
    /// spin has run out and should be dropped.
    pub fn decay(&mut self, now: u64, tuning: &SpinTuning) -> bool {
        if now.saturating_sub(self.applied_at) < tuning.decay_delay_ticks {
            return true;
        }
        self.intensity *= tuning.decay_rate;
        self.english *= tuning.decay_rate;
        self.follow_draw *= tuning.decay_rate;
        self.intensity >= tuning.min_intensity
    }
}

/// Side spin carried out of a ball-ball contact. Bends cushion rebounds for a
/// while, weaker after every cushion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EnglishEffect {
    pub magnitude: f32,
    pub remaining_ticks: u64,
}

impl EnglishEffect {
    pub fn decay(&mut self, tuning: &SpinTuning) -> bool {
        self.magnitude *= tuning.english_effect_decay;
        self.remaining_ticks = self.remaining_ticks.saturating_sub(1);
        self.remaining_ticks > 0 && self.magnitude.abs() >= tuning.min_intensity
    }
}

/// Rotate a rebound velocity by the side-spin bias.
pub fn bias_rebound(velocity: Vec2, magnitude: f32, tuning: &SpinTuning) -> Vec2 {
    let angle = (magnitude * tuning.max_rebound_bias)
        .clamp(-tuning.max_rebound_bias, tuning.max_rebound_bias);
    Vec2::from_angle(angle).rotate(velocity)
}
