//! Session configuration and every tuning constant of the table.
//!
//! All structs are `#[serde(default)]`, so a JSON document only has to name
//! the values it overrides. Speeds are in table units per tick unless a field
//! says otherwise; engine velocities are units per second.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level configuration for a [`Session`](crate::Session).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Fixed timestep in seconds (default: 1/60).
    pub fixed_dt: f32,
    /// Rapier steps per tick. 4 substeps at 60Hz resolve at 240Hz.
    pub physics_substeps: u32,
    /// Constraint solver iterations per substep.
    pub solver_iterations: usize,
    /// Seed for the random placement modes.
    pub rng_seed: u64,
    pub table: TableConfig,
    pub ball: BallPhysics,
    pub cushion: CushionPhysics,
    pub rolling: RollingResistance,
    pub capture: CaptureTuning,
    pub spin: SpinTuning,
    pub cue: CueTuning,
    pub placement: PlacementTuning,
    pub rules: RulesConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            physics_substeps: 4,
            solver_iterations: 8,
            rng_seed: 0x5eed_ba12e,
            table: TableConfig::default(),
            ball: BallPhysics::default(),
            cushion: CushionPhysics::default(),
            rolling: RollingResistance::default(),
            capture: CaptureTuning::default(),
            spin: SpinTuning::default(),
            cue: CueTuning::default(),
            placement: PlacementTuning::default(),
            rules: RulesConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Parse a config from JSON and validate it.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.fixed_dt > 0.0) {
            return Err(ConfigError::Invalid { field: "fixed_dt", reason: "must be positive" });
        }
        if self.physics_substeps == 0 {
            return Err(ConfigError::Invalid { field: "physics_substeps", reason: "must be at least 1" });
        }
        if self.solver_iterations == 0 {
            return Err(ConfigError::Invalid { field: "solver_iterations", reason: "must be at least 1" });
        }
        if !(self.table.width > 0.0) {
            return Err(ConfigError::Invalid { field: "table.width", reason: "must be positive" });
        }
        if !self.table.center_x.is_finite() || !self.table.center_y.is_finite() {
            return Err(ConfigError::Invalid { field: "table.center", reason: "must be finite" });
        }
        if !(self.rolling.slow_speed > 0.0 && self.rolling.medium_speed > self.rolling.slow_speed) {
            return Err(ConfigError::Invalid {
                field: "rolling.medium_speed",
                reason: "must exceed a positive slow_speed",
            });
        }
        if !(self.ball.mass > 0.0) {
            return Err(ConfigError::Invalid { field: "ball.mass", reason: "must be positive" });
        }
        if !(0.0..1.0).contains(&self.ball.air_drag) {
            return Err(ConfigError::Invalid { field: "ball.air_drag", reason: "must be in [0, 1)" });
        }
        if !(self.cue.max_pullback > 0.0) {
            return Err(ConfigError::Invalid { field: "cue.max_pullback", reason: "must be positive" });
        }
        if !(0.1..=1.0).contains(&self.cue.default_power) {
            return Err(ConfigError::Invalid { field: "cue.default_power", reason: "must be in [0.1, 1.0]" });
        }
        if self.placement.max_attempts == 0 {
            return Err(ConfigError::Invalid { field: "placement.max_attempts", reason: "must be at least 1" });
        }
        Ok(())
    }
}

/// Where the table sits and how big it is. Length is always twice the width.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    pub center_x: f32,
    pub center_y: f32,
    /// Playing-surface width between cushion faces.
    pub width: f32,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            center_x: 300.0,
            center_y: 460.0,
            width: 400.0,
        }
    }
}

/// Tournament-calibrated ball constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BallPhysics {
    /// Ball-to-ball restitution.
    pub restitution: f32,
    /// Rolling friction, used as the collider friction coefficient.
    pub friction: f32,
    /// Fraction of velocity lost to air per tick.
    pub air_drag: f32,
    /// Static friction. Rapier has a single Coulomb coefficient, so this only
    /// raises the contact friction when it exceeds `friction`.
    pub static_friction: f32,
    pub mass: f32,
    pub angular_damping: f32,
}

impl Default for BallPhysics {
    fn default() -> Self {
        Self {
            restitution: 0.935,
            friction: 0.0085,
            air_drag: 0.008,
            static_friction: 0.0095,
            mass: 1.0,
            angular_damping: 0.5,
        }
    }
}

impl BallPhysics {
    /// Rapier linear damping equivalent to losing `air_drag` of the velocity
    /// every tick: rapier scales by `1 / (1 + dt * d)` per step.
    pub fn linear_damping(&self, tick_dt: f32) -> f32 {
        self.air_drag / ((1.0 - self.air_drag) * tick_dt)
    }

    /// Contact friction handed to the collider.
    pub fn contact_friction(&self) -> f32 {
        self.friction.max(self.static_friction)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CushionPhysics {
    pub restitution: f32,
    pub friction: f32,
    /// Above this speed a cushion hit also bleeds energy shortly after contact.
    pub high_speed: f32,
    pub high_speed_damping: f32,
    pub damping_delay_ticks: u64,
}

impl Default for CushionPhysics {
    fn default() -> Self {
        Self {
            restitution: 0.8,
            friction: 0.1,
            high_speed: 12.0,
            high_speed_damping: 0.92,
            damping_delay_ticks: 2,
        }
    }
}

/// Per-tick velocity scaling that models rolling resistance on the cloth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RollingResistance {
    /// Below this speed a ball is snapped to rest.
    pub rest_speed: f32,
    pub slow_speed: f32,
    pub medium_speed: f32,
    /// Factor applied just above rest.
    pub min_factor: f32,
    /// Factor applied at `slow_speed`.
    pub mid_factor: f32,
    /// Factor applied at and above `medium_speed`.
    pub max_factor: f32,
}

impl Default for RollingResistance {
    fn default() -> Self {
        Self {
            rest_speed: 0.05,
            slow_speed: 2.0,
            medium_speed: 5.0,
            min_factor: 0.988,
            mid_factor: 0.994,
            max_factor: 0.9985,
        }
    }
}

impl RollingResistance {
    /// Velocity scale for a ball moving at `speed` (units per tick).
    /// Monotonic: slower balls lose a larger share of their speed.
    pub fn factor(&self, speed: f32) -> f32 {
        if speed >= self.medium_speed {
            self.max_factor
        } else if speed >= self.slow_speed {
            let t = (speed - self.slow_speed) / (self.medium_speed - self.slow_speed);
            self.mid_factor + (self.max_factor - self.mid_factor) * t
        } else {
            let t = (speed / self.slow_speed).clamp(0.0, 1.0);
            self.min_factor + (self.mid_factor - self.min_factor) * t
        }
    }
}

/// Pocket capture thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureTuning {
    pub corner_fraction: f32,
    pub middle_fraction: f32,
    pub fast_speed: f32,
    pub very_fast_speed: f32,
    pub fast_scale: f32,
    pub very_fast_scale: f32,
    /// Velocity component toward the pocket below which a fast ball skims past.
    pub skim_dot: f32,
    pub skim_speed: f32,
    /// Depth past the cushion line, in ball radii, that counts as dropped.
    pub escape_depth: f32,
}

impl Default for CaptureTuning {
    fn default() -> Self {
        Self {
            corner_fraction: 0.65,
            middle_fraction: 0.70,
            fast_speed: 5.0,
            very_fast_speed: 10.0,
            fast_scale: 0.95,
            very_fast_scale: 0.85,
            skim_dot: -2.0,
            skim_speed: 5.0,
            escape_depth: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpinTuning {
    pub decay_delay_ticks: u64,
    pub decay_rate: f32,
    pub min_intensity: f32,
    pub follow_draw_threshold: f32,
    pub min_post_collision_speed: f32,
    pub follow_draw_strength: f32,
    pub post_collision_delay_ticks: u64,
    pub english_threshold: f32,
    pub english_effect_ticks: u64,
    pub english_effect_decay: f32,
    /// Largest rebound rotation in radians, reached at full english.
    pub max_rebound_bias: f32,
    pub rebound_bias_falloff: f32,
}

impl Default for SpinTuning {
    fn default() -> Self {
        Self {
            decay_delay_ticks: 30,
            decay_rate: 0.97,
            min_intensity: 0.01,
            follow_draw_threshold: 0.1,
            min_post_collision_speed: 0.2,
            follow_draw_strength: 0.5,
            post_collision_delay_ticks: 5,
            english_threshold: 0.1,
            english_effect_ticks: 180,
            english_effect_decay: 0.995,
            max_rebound_bias: 0.2,
            rebound_bias_falloff: 0.6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CueTuning {
    pub max_pullback: f32,
    pub pullback_offset: f32,
    /// Shots with this pullback or less are not fired.
    pub min_pullback: f32,
    /// Impulse at full pullback and full power.
    pub max_power: f32,
    pub default_power: f32,
    pub power_step: f32,
    pub transfer_efficiency: f32,
    pub angular_scale: f32,
    pub curve_intensity: f32,
    /// Side contact beyond this adds the delayed curve.
    pub curve_threshold: f32,
    pub spin_application_frames: u64,
    pub english_limit: f32,
    pub follow_draw_limit: f32,
    /// Pointer travel, in ball radii, that maps to a full contact offset.
    pub contact_reach: f32,
}

impl Default for CueTuning {
    fn default() -> Self {
        Self {
            max_pullback: 100.0,
            pullback_offset: 20.0,
            min_pullback: 10.0,
            max_power: 2100.0,
            default_power: 0.8,
            power_step: 0.1,
            transfer_efficiency: 0.85,
            angular_scale: 0.01,
            curve_intensity: 0.05,
            curve_threshold: 0.1,
            spin_application_frames: 8,
            english_limit: 0.8,
            follow_draw_limit: 0.9,
            contact_reach: 4.0,
        }
    }
}

/// Rejection-sampling limits and spacing, in ball radii.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementTuning {
    pub max_attempts: u32,
    pub ball_spacing: f32,
    pub pocket_clearance: f32,
}

impl Default for PlacementTuning {
    fn default() -> Self {
        Self {
            max_attempts: 100,
            ball_spacing: 2.5,
            pocket_clearance: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    pub respawn_delay_ticks: u64,
    /// A ball faster than this counts as moving and blocks the cue.
    pub moving_speed: f32,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            respawn_delay_ticks: 60,
            moving_speed: 0.05,
        }
    }
}
