use std::f32::consts::PI;

use glam::Vec2;

use crate::api::types::{BallId, BallKind, BodyRole};
use crate::components::spin::{bias_rebound, EnglishEffect, SpinState};
use crate::components::table::Pocket;
use crate::config::{BallPhysics, CaptureTuning, RollingResistance, SpinTuning};
use crate::core::physics::{BodyDesc, ColliderDesc, ColliderMaterial, PhysicsBody, PhysicsWorld};
use crate::systems::pockets::capture_test;

/// One snooker ball. The record lives for the whole session; its rigid body
/// comes and goes as the ball is spawned, pocketed and respawned.
///
/// A ball is in exactly one of three states:
/// - on the table: `body` is `Some`
/// - pocketed: `pocketed` is set, no body
/// - unplaced: neither, e.g. the cue ball before it is put in the D
#[derive(Debug, Clone)]
pub struct Ball {
    pub id: BallId,
    pub kind: BallKind,
    pub radius: f32,
    body: Option<PhysicsBody>,
    pocketed: bool,
    /// Bumped on every spawn so delayed work aimed at an earlier life can tell.
    generation: u32,
    pub spin: Option<SpinState>,
    pub english_effect: Option<EnglishEffect>,
    /// Velocity at the start of the current tick, before contacts resolve.
    prev_velocity: Vec2,
}

impl Ball {
    pub fn new(id: BallId, kind: BallKind, radius: f32) -> Self {
        Self {
            id,
            kind,
            radius,
            body: None,
            pocketed: false,
            generation: 0,
            spin: None,
            english_effect: None,
            prev_velocity: Vec2::ZERO,
        }
    }

    pub fn value(&self) -> u32 {
        self.kind.value()
    }

    pub fn is_pocketed(&self) -> bool {
        self.pocketed
    }

    pub fn is_on_table(&self) -> bool {
        self.body.is_some()
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn body(&self) -> Option<&PhysicsBody> {
        self.body.as_ref()
    }

    /// Put the ball on the table at `position`, at rest and without spin.
    /// Any previous body is replaced.
    pub fn spawn(&mut self, world: &mut PhysicsWorld, position: Vec2, physics: &BallPhysics) {
        if let Some(old) = self.body.take() {
            world.remove_body(&old);
        }
        let desc = BodyDesc::dynamic(ColliderDesc::Ball { radius: self.radius })
            .with_position(position)
            .with_ccd(true)
            .with_linear_damping(physics.linear_damping(world.tick_dt()))
            .with_angular_damping(physics.angular_damping);
        let material = ColliderMaterial {
            restitution: physics.restitution,
            friction: physics.contact_friction(),
            // Density chosen so the body's mass comes out at `physics.mass`.
            density: physics.mass / (PI * self.radius * self.radius),
        };
        let role = BodyRole::Ball { id: self.id, kind: self.kind };
        self.body = Some(world.create_body(role, &desc, material));
        self.pocketed = false;
        self.generation = self.generation.wrapping_add(1);
        self.spin = None;
        self.english_effect = None;
        self.prev_velocity = Vec2::ZERO;
    }

    /// Bring a pocketed ball back at `position`. Same identity, fresh body.
    pub fn respawn(&mut self, world: &mut PhysicsWorld, position: Vec2, physics: &BallPhysics) {
        self.spawn(world, position, physics);
    }

    /// Take the ball off the table as potted. Calling it again changes nothing.
    pub fn pocket(&mut self, world: &mut PhysicsWorld) {
        if self.pocketed {
            return;
        }
        if let Some(body) = self.body.take() {
            world.remove_body(&body);
        }
        self.pocketed = true;
        self.spin = None;
        self.english_effect = None;
        self.prev_velocity = Vec2::ZERO;
    }

    /// Take the ball off the table without potting it.
    pub fn despawn(&mut self, world: &mut PhysicsWorld) {
        if let Some(body) = self.body.take() {
            world.remove_body(&body);
        }
        self.pocketed = false;
        self.spin = None;
        self.english_effect = None;
        self.prev_velocity = Vec2::ZERO;
    }

    pub fn position(&self, world: &PhysicsWorld) -> Option<Vec2> {
        self.body.as_ref().map(|b| world.body_position(b).0)
    }

    pub fn rotation(&self, world: &PhysicsWorld) -> f32 {
        self.body.as_ref().map(|b| world.body_position(b).1).unwrap_or(0.0)
    }

    /// Velocity in units per second. Zero when off the table.
    pub fn velocity(&self, world: &PhysicsWorld) -> Vec2 {
        self.body.as_ref().map(|b| world.velocity(b)).unwrap_or(Vec2::ZERO)
    }

    /// Speed in units per tick, the unit every motion threshold uses.
    pub fn speed_per_tick(&self, world: &PhysicsWorld) -> f32 {
        self.velocity(world).length() * world.tick_dt()
    }

    pub fn is_moving(&self, world: &PhysicsWorld, threshold: f32) -> bool {
        self.is_on_table() && self.speed_per_tick(world) > threshold
    }

    pub fn apply_impulse(&self, world: &mut PhysicsWorld, impulse: Vec2) {
        if let Some(body) = &self.body {
            world.apply_impulse(body, impulse);
        }
    }

    pub fn set_angular_velocity(&self, world: &mut PhysicsWorld, angvel: f32) {
        if let Some(body) = &self.body {
            world.set_angular_velocity(body, angvel);
        }
    }

    pub fn scale_velocity(&self, world: &mut PhysicsWorld, factor: f32) {
        if let Some(body) = &self.body {
            let v = world.velocity(body);
            world.set_velocity(body, v * factor);
        }
    }

    /// Index of the pocket this ball drops into, if any.
    pub fn captured_by(
        &self,
        world: &PhysicsWorld,
        pockets: &[Pocket],
        tuning: &CaptureTuning,
    ) -> Option<usize> {
        let position = self.position(world)?;
        let velocity = self.velocity(world) * world.tick_dt();
        pockets
            .iter()
            .position(|pocket| capture_test(position, velocity, pocket, tuning))
    }

    pub fn check_capture(&self, world: &PhysicsWorld, pockets: &[Pocket], tuning: &CaptureTuning) -> bool {
        self.captured_by(world, pockets, tuning).is_some()
    }

    /// Cloth resistance for one tick. A ball that ends up slower than the
    /// rest speed is stopped dead, spin included.
    pub fn apply_rolling_deceleration(&self, world: &mut PhysicsWorld, rolling: &RollingResistance) {
        let Some(body) = &self.body else {
            return;
        };
        let dt = world.tick_dt();
        let velocity = world.velocity(body);
        if velocity == Vec2::ZERO && world.angular_velocity(body) == 0.0 {
            return;
        }
        let speed = velocity.length() * dt;

        if speed > rolling.rest_speed {
            let slowed = velocity * rolling.factor(speed);
            if slowed.length() * dt >= rolling.rest_speed {
                world.set_velocity(body, slowed);
                return;
            }
        }
        world.set_velocity(body, Vec2::ZERO);
        world.set_angular_velocity(body, 0.0);
    }

    pub fn apply_spin(&mut self, spin: SpinState) {
        self.spin = Some(spin);
    }

    /// Per-tick fade of the shot spin and of any english carried out of a contact.
    pub fn decay_spin(&mut self, now: u64, tuning: &SpinTuning) {
        if let Some(spin) = &mut self.spin {
            if !spin.decay(now, tuning) {
                self.spin = None;
            }
        }
        if let Some(effect) = &mut self.english_effect {
            if !effect.decay(tuning) {
                self.english_effect = None;
            }
        }
    }

    /// Remember this tick's starting velocity; contacts read it as the
    /// pre-collision travel direction.
    pub fn record_velocity(&mut self, world: &PhysicsWorld) {
        self.prev_velocity = self.velocity(world);
    }

    pub fn prev_velocity(&self) -> Vec2 {
        self.prev_velocity
    }

    /// Cue ball hit another ball. Arms the english effect from the live spin
    /// and returns the follow or draw impulse to apply after the delay, if any.
    pub fn apply_post_collision_spin(
        &mut self,
        world: &PhysicsWorld,
        other: BallKind,
        collision_normal: Vec2,
        tuning: &SpinTuning,
    ) -> Option<Vec2> {
        if self.kind != BallKind::Cue {
            return None;
        }
        let spin = self.spin?;

        if spin.english.abs() > tuning.english_threshold {
            self.english_effect = Some(EnglishEffect {
                magnitude: spin.english * spin.intensity,
                remaining_ticks: tuning.english_effect_ticks,
            });
            log::debug!("english effect armed after hitting {:?}: {:.3}", other, spin.english * spin.intensity);
        }

        if spin.follow_draw.abs() <= tuning.follow_draw_threshold {
            return None;
        }
        if self.speed_per_tick(world) <= tuning.min_post_collision_speed {
            return None;
        }

        let pre_speed = self.prev_velocity.length();
        let direction = if pre_speed > f32::EPSILON {
            self.prev_velocity / pre_speed
        } else {
            collision_normal
        };
        let impulse = direction
            * spin.follow_draw
            * spin.intensity
            * tuning.follow_draw_strength
            * pre_speed;
        log::debug!("{:?} spin after hitting {:?}: impulse {:?}", spin.shot_type, other, impulse);
        Some(impulse)
    }

    /// Bend a cushion rebound by side spin. Returns `true` if the velocity changed.
    pub fn apply_english_rebound(&mut self, world: &mut PhysicsWorld, tuning: &SpinTuning) -> bool {
        let magnitude = if let Some(effect) = &mut self.english_effect {
            let m = effect.magnitude;
            effect.magnitude *= tuning.rebound_bias_falloff;
            m
        } else if let Some(spin) = self.spin.as_mut().filter(|s| s.english.abs() > tuning.english_threshold) {
            let m = spin.english * spin.intensity;
            spin.english *= tuning.rebound_bias_falloff;
            m
        } else {
            return false;
        };

        let Some(body) = &self.body else {
            return false;
        };
        let velocity = world.velocity(body);
        world.set_velocity(body, bias_rebound(velocity, magnitude, tuning));
        true
    }
}
