//! The session: one table, one cue, the ball roster and the rules state,
//! advanced one fixed tick at a time.
//!
//! Everything runs on the caller's thread. Input handlers and [`Session::tick`]
//! never overlap, so every mutation of the world happens between ticks.
//! Delayed effects (follow and draw, the side-spin curve, cushion damping and
//! color respawns) go through a [`Scheduler`] keyed by the tick counter; each
//! task names a ball and the generation it was aimed at, and is dropped if the
//! ball has been pocketed or respawned since.

use std::collections::VecDeque;

use glam::Vec2;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::Serialize;

use crate::api::types::{BallId, BallKind, GameMode, SessionEvent};
use crate::components::ball::Ball;
use crate::components::cue::Cue;
use crate::components::table::Table;
use crate::config::SessionConfig;
use crate::core::physics::{CollisionPair, PhysicsBody, PhysicsWorld};
use crate::core::scheduler::Scheduler;
use crate::error::{Advisory, ConfigError, PlacementError};
use crate::input::queue::InputEvent;
use crate::systems::collisions::{self, Contact};
use crate::systems::snapshot::{self, SessionSnapshot};
use crate::systems::{placement, pockets};

/// The cue ball is always first in the roster.
pub const CUE_BALL: BallId = BallId(0);
pub const RED_COUNT: usize = 15;
const POT_HISTORY_LEN: usize = 2;

/// Rules-level state of the frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GameState {
    pub mode: GameMode,
    pub cue_ball_placed: bool,
    pub placing_cue_ball: bool,
    /// Last non-cue pots, oldest first.
    pub pot_history: VecDeque<BallKind>,
    /// The last two pots were both colors.
    pub consecutive_colors: bool,
    pub last_advisory: Option<Advisory>,
    /// A shot was played and the balls have not settled yet.
    pub shot_in_progress: bool,
}

impl GameState {
    fn record_pot(&mut self, kind: BallKind) -> Option<Advisory> {
        self.pot_history.push_back(kind);
        while self.pot_history.len() > POT_HISTORY_LEN {
            self.pot_history.pop_front();
        }
        self.consecutive_colors =
            self.pot_history.len() == POT_HISTORY_LEN && self.pot_history.iter().all(|k| k.is_color());
        if !self.consecutive_colors {
            return None;
        }
        Some(Advisory::ConsecutiveColors {
            previous: self.pot_history[0],
            current: self.pot_history[1],
        })
    }
}

/// Delayed work against one ball life.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum TimedTask {
    FollowDraw { ball: BallId, generation: u32, impulse: Vec2 },
    ShotCurve { ball: BallId, generation: u32, impulse: Vec2 },
    CushionDamping { ball: BallId, generation: u32, factor: f32 },
    Respawn { ball: BallId, generation: u32 },
}

impl TimedTask {
    fn target(&self) -> (BallId, u32) {
        match *self {
            TimedTask::FollowDraw { ball, generation, .. }
            | TimedTask::ShotCurve { ball, generation, .. }
            | TimedTask::CushionDamping { ball, generation, .. }
            | TimedTask::Respawn { ball, generation } => (ball, generation),
        }
    }
}

pub struct Session {
    config: SessionConfig,
    table: Table,
    world: PhysicsWorld,
    cushions: Vec<PhysicsBody>,
    balls: Vec<Ball>,
    cue: Cue,
    state: GameState,
    scheduler: Scheduler<TimedTask>,
    rng: SmallRng,
    tick: u64,
    collisions: Vec<CollisionPair>,
    events: Vec<SessionEvent>,
}

/// Cue ball, fifteen reds, then the colors in ascending value.
fn roster(radius: f32) -> Vec<Ball> {
    let kinds = std::iter::once(BallKind::Cue)
        .chain(std::iter::repeat(BallKind::Red).take(RED_COUNT))
        .chain(BallKind::COLORS);
    kinds
        .enumerate()
        .map(|(i, kind)| Ball::new(BallId(i as u32), kind, radius))
        .collect()
}

impl Session {
    /// Build a session with cushions in place and every ball off the table.
    /// Nothing is racked until a mode is selected.
    pub fn new(config: SessionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let table = Table::new(&config.table);

        let mut world = PhysicsWorld::new(Vec2::ZERO);
        world.set_timestep(config.fixed_dt, config.physics_substeps);
        world.set_solver_iterations(config.solver_iterations);
        let cushions = table.build_cushions(&mut world, &config.cushion);

        let balls = roster(table.ball_radius);
        log::info!(
            "session ready: {}x{} table, ball radius {:.2}, {} balls",
            table.width,
            table.length,
            table.ball_radius,
            balls.len()
        );

        Ok(Self {
            cue: Cue::new(&config.cue),
            rng: SmallRng::seed_from_u64(config.rng_seed),
            config,
            table,
            world,
            cushions,
            balls,
            state: GameState::default(),
            scheduler: Scheduler::new(),
            tick: 0,
            collisions: Vec::new(),
            events: Vec::new(),
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn cue(&self) -> &Cue {
        &self.cue
    }

    pub fn balls(&self) -> &[Ball] {
        &self.balls
    }

    pub fn ball(&self, id: BallId) -> Option<&Ball> {
        self.balls.get(id.index())
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn cushion_count(&self) -> usize {
        self.cushions.len()
    }

    pub fn ball_position(&self, id: BallId) -> Option<Vec2> {
        self.ball(id)?.position(&self.world)
    }

    pub fn cue_ball_position(&self) -> Option<Vec2> {
        self.ball_position(CUE_BALL)
    }

    /// Any ball on the table faster than the moving threshold.
    pub fn is_moving(&self) -> bool {
        let threshold = self.config.rules.moving_speed;
        self.balls.iter().any(|b| b.is_moving(&self.world, threshold))
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        snapshot::build(&self.world, &self.balls, &self.cue, &self.state, self.is_moving(), self.tick)
    }

    /// Events since the last drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    // -- input --

    pub fn handle_input(&mut self, event: InputEvent) {
        match event {
            InputEvent::SelectMode(mode) => self.select_mode(mode),
            InputEvent::PointerDown { x, y } => self.pointer_down(Vec2::new(x, y)),
            InputEvent::PointerMove { x, y, modifier } => self.pointer_move(Vec2::new(x, y), modifier),
            InputEvent::PointerDrag { x, y } => self.drag_aim(Vec2::new(x, y)),
            InputEvent::PointerUp { .. } => {
                self.release();
            }
            InputEvent::PowerUp => self.adjust_power(true),
            InputEvent::PowerDown => self.adjust_power(false),
        }
    }

    /// Clear the table and set it up for `mode`, then wait for the cue ball.
    /// `GameMode::Unset` is not selectable and is ignored.
    pub fn select_mode(&mut self, mode: GameMode) {
        if mode == GameMode::Unset {
            return;
        }
        self.scheduler.clear();
        self.cue.reset();
        for ball in &mut self.balls {
            ball.despawn(&mut self.world);
        }
        self.state = GameState {
            mode,
            placing_cue_ball: true,
            ..GameState::default()
        };

        let kinds: Vec<BallKind> = self.balls.iter().map(|b| b.kind).collect();
        let placements = placement::arrange(mode, &kinds, &self.table, &mut self.rng, &self.config.placement);
        for (index, result) in placements {
            match result {
                Ok(position) => self.balls[index].spawn(&mut self.world, position, &self.config.ball),
                Err(err) => {
                    log::warn!("ball {} left off the table: {}", index, err);
                    self.advise(err.into());
                }
            }
        }

        log::info!("mode {:?} selected, {} balls on the table", mode, self.on_table_count());
        self.events.push(SessionEvent::ModeSelected(mode));
    }

    /// Put the cue ball down in the D. `Ok(false)` means placement is not
    /// open right now; an `Err` is also reported as an advisory.
    pub fn place_cue_ball(&mut self, point: Vec2) -> Result<bool, PlacementError> {
        if !self.state.placing_cue_ball || self.is_moving() {
            return Ok(false);
        }
        if let Err(err) = self.check_cue_ball_spot(point) {
            log::debug!("cue ball placement refused: {}", err);
            self.advise(err.into());
            return Err(err);
        }

        let cue_ball = &mut self.balls[CUE_BALL.index()];
        cue_ball.spawn(&mut self.world, point, &self.config.ball);
        self.state.placing_cue_ball = false;
        self.state.cue_ball_placed = true;
        self.cue.visible = true;

        log::info!("cue ball placed at ({:.1}, {:.1})", point.x, point.y);
        self.events.push(SessionEvent::CueBallPlaced { position: point });
        Ok(true)
    }

    /// Place the cue ball if that is what the table is waiting for, else start aiming.
    pub fn pointer_down(&mut self, point: Vec2) {
        if self.state.placing_cue_ball {
            // A refused placement is already reported as an advisory.
            let _ = self.place_cue_ball(point);
        } else {
            self.begin_aim(point);
        }
    }

    pub fn begin_aim(&mut self, pointer: Vec2) -> bool {
        if !self.can_aim() {
            return false;
        }
        let Some(ball) = self.cue_ball_position() else {
            return false;
        };
        self.cue.begin_aim(ball, pointer);
        true
    }

    /// Track the pointer. While aiming with the modifier held, the pointer
    /// picks the contact point instead of the angle.
    pub fn pointer_move(&mut self, pointer: Vec2, modifier: bool) {
        let Some(ball) = self.cue_ball_position() else {
            return;
        };
        if self.cue.aiming && modifier {
            self.cue
                .set_contact_from_pointer(ball, pointer, self.table.ball_radius, &self.config.cue);
        } else if self.cue.aiming || self.cue.visible {
            self.cue.aim_at(ball, pointer);
        }
    }

    pub fn drag_aim(&mut self, pointer: Vec2) {
        if !self.cue.aiming {
            return;
        }
        if let Some(ball) = self.cue_ball_position() {
            self.cue.drag(ball, pointer, &self.config.cue);
        }
    }

    /// Let go of the cue. Returns `true` if a shot was played.
    pub fn release(&mut self) -> bool {
        if !self.cue.aiming {
            return false;
        }
        let shot = self.cue.compute_shot(self.tick, &self.config.cue);
        self.cue.end_aim();
        let Some(shot) = shot else {
            return false;
        };
        let cue_ball = &mut self.balls[CUE_BALL.index()];
        if !cue_ball.is_on_table() {
            return false;
        }

        cue_ball.apply_impulse(&mut self.world, shot.impulse);
        cue_ball.set_angular_velocity(&mut self.world, shot.angular_velocity);
        cue_ball.apply_spin(shot.spin);
        if let Some(impulse) = shot.curve {
            let task = TimedTask::ShotCurve {
                ball: CUE_BALL,
                generation: cue_ball.generation(),
                impulse,
            };
            self.scheduler
                .schedule(self.tick, self.config.cue.spin_application_frames, task);
        }

        self.state.shot_in_progress = true;
        self.cue.visible = false;
        log::info!(
            "{:?} shot: impulse {:.0} at {:.1} deg",
            shot.spin.shot_type,
            shot.impulse.length(),
            self.cue.angle.to_degrees()
        );
        self.events.push(SessionEvent::ShotFired {
            impulse: shot.impulse,
            shot_type: shot.spin.shot_type,
        });
        true
    }

    pub fn adjust_power(&mut self, up: bool) {
        let step = self.config.cue.power_step;
        self.cue.adjust_power(if up { step } else { -step });
    }

    // -- simulation --

    /// Advance one fixed tick: due tasks, cloth resistance and spin decay,
    /// the physics step, contact effects, pot checks, then cue and rest state.
    pub fn tick(&mut self) {
        self.tick += 1;
        let now = self.tick;

        self.run_due_tasks(now);

        for ball in self.balls.iter_mut().filter(|b| b.is_on_table()) {
            ball.apply_rolling_deceleration(&mut self.world, &self.config.rolling);
            ball.decay_spin(now, &self.config.spin);
            ball.record_velocity(&self.world);
        }

        let mut pairs = std::mem::take(&mut self.collisions);
        pairs.clear();
        self.world.step_into(&mut pairs);
        for contact in collisions::contacts(&pairs) {
            self.on_contact(contact, now);
        }
        self.collisions = pairs;

        for (id, pocket) in pockets::find_pots(&self.world, &self.balls, &self.table, &self.config.capture) {
            self.pot(id, pocket);
        }

        let moving = self.is_moving();
        let cue_ball_ready = self.balls[CUE_BALL.index()].is_on_table() && !self.state.placing_cue_ball;
        if self.cue.aiming && !cue_ball_ready {
            self.cue.end_aim();
        }
        self.cue.visible = cue_ball_ready && !moving;

        if self.state.shot_in_progress && !moving {
            self.state.shot_in_progress = false;
            log::debug!("balls at rest after tick {}", now);
            self.events.push(SessionEvent::BallsAtRest);
        }
    }

    fn can_aim(&self) -> bool {
        self.state.mode != GameMode::Unset
            && !self.state.placing_cue_ball
            && self.state.cue_ball_placed
            && self.balls[CUE_BALL.index()].is_on_table()
            && !self.is_moving()
    }

    fn on_table_count(&self) -> usize {
        self.balls.iter().filter(|b| b.is_on_table()).count()
    }

    fn advise(&mut self, advisory: Advisory) {
        self.state.last_advisory = Some(advisory);
        self.events.push(SessionEvent::Advisory(advisory));
    }

    fn check_cue_ball_spot(&self, point: Vec2) -> Result<(), PlacementError> {
        if !self.table.is_in_legal_placement_zone(point) {
            return Err(PlacementError::NotInD { x: point.x, y: point.y });
        }
        let occupied: Vec<Vec2> = self
            .balls
            .iter()
            .filter(|b| b.id != CUE_BALL)
            .filter_map(|b| b.position(&self.world))
            .collect();
        placement::check_position(&self.table, point, &occupied, &self.config.placement)
    }

    fn on_contact(&mut self, contact: Contact, now: u64) {
        match contact {
            Contact::BallBall { a, b, normal } => {
                for (me, other, n) in [(a, b, normal), (b, a, -normal)] {
                    if me.1 != BallKind::Cue {
                        continue;
                    }
                    let Some(ball) = self.balls.get_mut(me.0.index()) else {
                        continue;
                    };
                    if let Some(impulse) = ball.apply_post_collision_spin(&self.world, other.1, n, &self.config.spin) {
                        let task = TimedTask::FollowDraw {
                            ball: me.0,
                            generation: ball.generation(),
                            impulse,
                        };
                        self.scheduler
                            .schedule(now, self.config.spin.post_collision_delay_ticks, task);
                    }
                }
            }
            Contact::BallCushion { ball: (id, kind), .. } => {
                let Some(ball) = self.balls.get_mut(id.index()) else {
                    return;
                };
                if ball.apply_english_rebound(&mut self.world, &self.config.spin) {
                    log::debug!("side spin bent the {:?} ball's rebound", kind);
                }
                let impact = ball.prev_velocity().length() * self.world.tick_dt();
                if impact > self.config.cushion.high_speed {
                    let task = TimedTask::CushionDamping {
                        ball: id,
                        generation: ball.generation(),
                        factor: self.config.cushion.high_speed_damping,
                    };
                    self.scheduler
                        .schedule(now, self.config.cushion.damping_delay_ticks, task);
                }
            }
        }
    }

    fn pot(&mut self, id: BallId, pocket: usize) {
        let Some(ball) = self.balls.get_mut(id.index()) else {
            return;
        };
        if !ball.is_on_table() {
            return;
        }
        let kind = ball.kind;
        ball.pocket(&mut self.world);
        let generation = ball.generation();

        log::info!("{:?} ball {} potted in pocket {}", kind, id.0, pocket);
        self.events.push(SessionEvent::BallPotted { ball: id, kind, pocket });

        if kind == BallKind::Cue {
            self.state.placing_cue_ball = true;
            self.state.cue_ball_placed = false;
            self.cue.reset();
            return;
        }
        if kind.is_color() {
            self.scheduler.schedule(
                self.tick,
                self.config.rules.respawn_delay_ticks,
                TimedTask::Respawn { ball: id, generation },
            );
        }
        if let Some(advisory) = self.state.record_pot(kind) {
            log::info!("{}", advisory);
            self.advise(advisory);
        }
    }

    fn run_due_tasks(&mut self, now: u64) {
        for task in self.scheduler.drain_due(now) {
            let (id, generation) = task.target();
            let Some(ball) = self.balls.get(id.index()) else {
                continue;
            };
            let live = match task {
                TimedTask::Respawn { .. } => ball.is_pocketed(),
                _ => ball.is_on_table(),
            };
            if !live || ball.generation() != generation {
                log::debug!("skipping stale {:?}", task);
                continue;
            }

            match task {
                TimedTask::FollowDraw { impulse, .. } | TimedTask::ShotCurve { impulse, .. } => {
                    self.balls[id.index()].apply_impulse(&mut self.world, impulse);
                }
                TimedTask::CushionDamping { factor, .. } => {
                    self.balls[id.index()].scale_velocity(&mut self.world, factor);
                }
                TimedTask::Respawn { .. } => self.respawn(id),
            }
        }
    }

    fn respawn(&mut self, id: BallId) {
        let occupied: Vec<Vec2> = self
            .balls
            .iter()
            .filter(|b| b.id != id)
            .filter_map(|b| b.position(&self.world))
            .collect();
        let ball = &mut self.balls[id.index()];
        let Some(spot) = placement::respawn_spot(&self.table, ball.kind, &occupied) else {
            return;
        };
        ball.respawn(&mut self.world, spot, &self.config.ball);
        log::info!("{:?} respawned at ({:.1}, {:.1})", ball.kind, spot.x, spot.y);
        self.events.push(SessionEvent::BallRespawned {
            ball: id,
            kind: ball.kind,
            position: spot,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(SessionConfig::default()).expect("default config is valid")
    }

    fn standard_with_cue_ball() -> Session {
        standard_with_config(SessionConfig::default())
    }

    fn standard_with_config(config: SessionConfig) -> Session {
        let mut s = Session::new(config).expect("config is valid");
        s.select_mode(GameMode::Standard);
        let spot = legal_spot(&s);
        assert_eq!(s.place_cue_ball(spot), Ok(true));
        s.drain_events();
        s
    }

    /// Between brown and green in the D, clear of both.
    fn legal_spot(s: &Session) -> Vec2 {
        s.table.d_center() + Vec2::new(-0.5 * s.table.d_radius, 0.0)
    }

    fn id_of(s: &Session, kind: BallKind) -> BallId {
        s.balls.iter().find(|b| b.kind == kind).map(|b| b.id).unwrap_or(CUE_BALL)
    }

    fn first_red_on_table(s: &Session) -> BallId {
        s.balls
            .iter()
            .find(|b| b.kind == BallKind::Red && b.is_on_table())
            .map(|b| b.id)
            .expect("a red on the table")
    }

    /// Drop a ball at rest into the top-left pocket mouth and let the tick pot it.
    fn pot_by_physics(s: &mut Session, id: BallId) {
        let mouth = s.table.pockets[0].position + Vec2::new(3.0, 3.0);
        if let Some(body) = s.balls[id.index()].body().copied() {
            s.world.set_velocity(&body, Vec2::ZERO);
            s.world.set_position(&body, mouth);
        }
        for _ in 0..5 {
            s.tick();
            if s.balls[id.index()].is_pocketed() {
                return;
            }
        }
        panic!("ball {:?} was not potted", id);
    }

    /// Play a shot along `direction` with the given pointer pull and contact point.
    fn play(s: &mut Session, direction: Vec2, pull: f32, contact: Vec2) -> bool {
        let ball = s.cue_ball_position().unwrap_or_default();
        if !s.begin_aim(ball - direction * 30.0) {
            return false;
        }
        let tuning = s.config.cue.clone();
        s.cue.set_contact(contact, &tuning);
        s.drag_aim(ball - direction * pull);
        s.release()
    }

    /// Roll the cue ball straight into the balk cushion and tick until it comes back.
    fn rebound_off_balk_cushion(s: &mut Session, speed_per_tick: f32) {
        if let Some(body) = s.balls[CUE_BALL.index()].body().copied() {
            let velocity = Vec2::new(0.0, speed_per_tick / s.world.tick_dt());
            s.world.set_velocity(&body, velocity);
        }
        for _ in 0..200 {
            s.tick();
            if s.balls[CUE_BALL.index()].velocity(&s.world).y < 0.0 {
                return;
            }
        }
        panic!("cue ball never came off the cushion");
    }

    fn run_until_rest(s: &mut Session, max_ticks: usize) {
        for _ in 0..max_ticks {
            s.tick();
            if !s.is_moving() {
                return;
            }
        }
        panic!("balls still moving after {} ticks", max_ticks);
    }

    #[test]
    fn new_session_has_cushions_and_no_balls() {
        let s = session();
        assert_eq!(s.state.mode, GameMode::Unset);
        assert_eq!(s.balls.len(), 22);
        assert_eq!(s.balls.iter().filter(|b| b.kind == BallKind::Cue).count(), 1);
        assert_eq!(s.balls.iter().filter(|b| b.kind == BallKind::Red).count(), 15);
        assert_eq!(s.on_table_count(), 0);
        assert_eq!(s.world.body_count(), s.cushion_count());
    }

    #[test]
    fn invalid_config_is_refused() {
        let mut config = SessionConfig::default();
        config.fixed_dt = 0.0;
        assert!(Session::new(config).is_err());
    }

    #[test]
    fn standard_mode_racks_and_waits_for_the_cue_ball() {
        let mut s = session();
        s.select_mode(GameMode::Unset);
        assert!(s.drain_events().is_empty());

        s.select_mode(GameMode::Standard);
        assert_eq!(s.on_table_count(), 21);
        assert!(s.state.placing_cue_ball && !s.state.cue_ball_placed);
        assert!(!s.balls[CUE_BALL.index()].is_on_table());
        assert_eq!(s.drain_events(), vec![SessionEvent::ModeSelected(GameMode::Standard)]);

        let black = id_of(&s, BallKind::Black);
        assert_eq!(s.ball_position(black), s.table.spot_for(BallKind::Black));
    }

    #[test]
    fn random_modes_place_everything_and_reset_the_frame() {
        let mut s = standard_with_cue_ball();
        let red = first_red_on_table(&s);
        pot_by_physics(&mut s, red);

        s.select_mode(GameMode::RandomAll);
        assert_eq!(s.on_table_count(), 21);
        assert!(s.balls.iter().all(|b| !b.is_pocketed()));
        assert!(s.state.pot_history.is_empty());
        assert!(s.state.placing_cue_ball);

        s.select_mode(GameMode::RandomReds);
        assert_eq!(s.on_table_count(), 21);
        let pink = id_of(&s, BallKind::Pink);
        assert_eq!(s.ball_position(pink), s.table.spot_for(BallKind::Pink));
    }

    #[test]
    fn cue_ball_must_go_in_the_d_clear_of_other_balls() {
        let mut s = session();
        s.select_mode(GameMode::Standard);
        s.drain_events();

        let centre = s.table.center;
        assert!(matches!(s.place_cue_ball(centre), Err(PlacementError::NotInD { .. })));
        let brown = s.table.spot_for(BallKind::Brown).unwrap_or_default();
        assert!(matches!(s.place_cue_ball(brown), Err(PlacementError::Obstructed { .. })));
        assert!(s.state.placing_cue_ball);
        assert!(!s.balls[CUE_BALL.index()].is_on_table());

        let events = s.drain_events();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| matches!(e, SessionEvent::Advisory(Advisory::Placement(_)))));
        assert!(s.state.last_advisory.is_some());

        let spot = legal_spot(&s);
        assert_eq!(s.place_cue_ball(spot), Ok(true));
        assert!(s.state.cue_ball_placed && !s.state.placing_cue_ball);
        assert_eq!(s.cue_ball_position(), Some(spot));
        // Placement is closed now.
        assert_eq!(s.place_cue_ball(spot), Ok(false));
    }

    #[test]
    fn no_aiming_before_the_cue_ball_is_placed() {
        let mut s = session();
        assert!(!s.begin_aim(Vec2::ZERO));
        s.select_mode(GameMode::Standard);
        assert!(!s.begin_aim(Vec2::ZERO));
        assert!(!s.release());
    }

    #[test]
    fn a_shot_moves_the_cue_ball_and_settles() {
        let mut s = standard_with_cue_ball();
        s.tick();
        assert!(s.cue.visible);

        let ball = s.cue_ball_position().unwrap_or_default();
        // A soft shot into the baulk cushion behind the D.
        assert!(s.begin_aim(ball - Vec2::new(0.0, 30.0)));
        s.drag_aim(ball - Vec2::new(0.0, 35.0));
        assert!(s.release());
        assert!(!s.cue.aiming);

        let events = s.drain_events();
        assert!(matches!(events[0], SessionEvent::ShotFired { impulse, .. } if impulse.y > 0.0));

        s.tick();
        assert!(s.is_moving());
        assert!(!s.cue.visible);
        assert!(!s.begin_aim(ball), "cannot aim while balls move");

        run_until_rest(&mut s, 3000);
        s.tick();
        assert!(s.cue.visible);
        assert!(s.drain_events().contains(&SessionEvent::BallsAtRest));
    }

    #[test]
    fn side_contact_bends_the_path_after_the_strike() {
        let mut side = standard_with_cue_ball();
        let mut centre = standard_with_cue_ball();
        side.tick();
        centre.tick();
        let start = side.cue_ball_position().unwrap_or_default();

        // Up the table, clear of the colours on the centre line.
        assert!(play(&mut centre, Vec2::NEG_Y, 80.0, Vec2::ZERO));
        assert!(play(&mut side, Vec2::NEG_Y, 80.0, Vec2::new(0.8, 0.0)));
        assert_eq!(side.scheduler.len(), centre.scheduler.len() + 1, "the curve waits a few ticks");

        for _ in 1..side.config.cue.spin_application_frames {
            side.tick();
            centre.tick();
        }
        let early = side.cue_ball_position().unwrap_or_default();
        assert!((early.x - start.x).abs() < 1e-3, "no curve before the delay");

        for _ in 0..12 {
            side.tick();
            centre.tick();
        }
        let bent = side.cue_ball_position().unwrap_or_default();
        let straight = centre.cue_ball_position().unwrap_or_default();
        assert!((straight.x - start.x).abs() < 1e-3);
        // Aiming up the table, right-hand side contact curves toward +x.
        assert!(bent.x - straight.x > 2.0, "{:?} vs {:?}", bent, straight);
    }

    #[test]
    fn hard_cushion_hits_lose_extra_speed() {
        let mut config = SessionConfig::default();
        let mut damped = standard_with_config(config.clone());
        config.cushion.high_speed_damping = 1.0;
        let mut undamped = standard_with_config(config);
        let speed = damped.config.cushion.high_speed * 1.5;

        for s in [&mut damped, &mut undamped] {
            rebound_off_balk_cushion(s, speed);
            assert_eq!(s.scheduler.len(), 1, "a hard hit schedules damping");
            for _ in 0..=s.config.cushion.damping_delay_ticks {
                s.tick();
            }
            assert!(s.scheduler.is_empty());
        }

        let damped_speed = damped.balls[CUE_BALL.index()].velocity(&damped.world).length();
        let undamped_speed = undamped.balls[CUE_BALL.index()].velocity(&undamped.world).length();
        let ratio = damped_speed / undamped_speed;
        assert!(
            (ratio - damped.config.cushion.high_speed_damping).abs() < 0.01,
            "speed ratio {}",
            ratio
        );
    }

    #[test]
    fn soft_cushion_hits_are_not_damped() {
        let mut s = standard_with_cue_ball();
        let speed = s.config.cushion.high_speed * 0.5;
        rebound_off_balk_cushion(&mut s, speed);
        assert!(s.scheduler.is_empty());
    }

    #[test]
    fn follow_carries_the_cue_ball_through_the_object_ball() {
        let mut follow = standard_with_cue_ball();
        let mut stun = standard_with_cue_ball();
        for s in [&mut follow, &mut stun] {
            // Put a red straight up the table from the cue ball.
            let ball = s.cue_ball_position().unwrap_or_default();
            let red = first_red_on_table(s);
            if let Some(body) = s.balls[red.index()].body().copied() {
                s.world.set_velocity(&body, Vec2::ZERO);
                s.world.set_position(&body, ball + Vec2::new(0.0, -80.0));
            }
            s.tick();
        }

        assert!(play(&mut follow, Vec2::NEG_Y, 80.0, Vec2::new(0.0, 0.9)));
        assert!(play(&mut stun, Vec2::NEG_Y, 80.0, Vec2::ZERO));
        for _ in 0..25 {
            follow.tick();
            stun.tick();
        }

        let followed = follow.cue_ball_position().unwrap_or_default();
        let stopped = stun.cue_ball_position().unwrap_or_default();
        // Up the table is -y: the follow shot keeps rolling after the contact.
        assert!(stopped.y - followed.y > 20.0, "{:?} vs {:?}", followed, stopped);
        assert!(follow.balls[CUE_BALL.index()].velocity(&follow.world).y < -1.0);
    }

    #[test]
    fn short_pullback_plays_nothing() {
        let mut s = standard_with_cue_ball();
        let ball = s.cue_ball_position().unwrap_or_default();
        assert!(s.begin_aim(ball + Vec2::new(0.0, 25.0)));
        s.drag_aim(ball + Vec2::new(0.0, 28.0));
        assert!(!s.release());
        assert!(s.drain_events().is_empty());
    }

    #[test]
    fn potted_color_returns_to_its_spot() {
        let mut s = standard_with_cue_ball();
        let black = id_of(&s, BallKind::Black);
        pot_by_physics(&mut s, black);
        assert!(s.balls[black.index()].is_pocketed());

        let events = s.drain_events();
        assert!(events.contains(&SessionEvent::BallPotted { ball: black, kind: BallKind::Black, pocket: 0 }));

        for _ in 0..s.config.rules.respawn_delay_ticks {
            s.tick();
        }
        let ball = &s.balls[black.index()];
        assert!(!ball.is_pocketed());
        assert_eq!(s.ball_position(black), s.table.spot_for(BallKind::Black));
        assert!(s
            .drain_events()
            .iter()
            .any(|e| matches!(e, SessionEvent::BallRespawned { ball, .. } if *ball == black)));
    }

    #[test]
    fn reds_stay_down() {
        let mut s = standard_with_cue_ball();
        let red = first_red_on_table(&s);
        pot_by_physics(&mut s, red);
        for _ in 0..200 {
            s.tick();
        }
        assert!(s.balls[red.index()].is_pocketed());
        assert!(!s.balls[red.index()].is_on_table());
    }

    #[test]
    fn two_colors_in_a_row_raise_the_advisory() {
        let mut s = standard_with_cue_ball();
        let black = id_of(&s, BallKind::Black);
        let pink = id_of(&s, BallKind::Pink);
        pot_by_physics(&mut s, black);
        assert!(!s.state.consecutive_colors);
        pot_by_physics(&mut s, pink);
        assert!(s.state.consecutive_colors);
        assert_eq!(
            s.state.last_advisory,
            Some(Advisory::ConsecutiveColors { previous: BallKind::Black, current: BallKind::Pink })
        );
        assert!(s
            .drain_events()
            .iter()
            .any(|e| matches!(e, SessionEvent::Advisory(Advisory::ConsecutiveColors { .. }))));
    }

    #[test]
    fn a_red_between_colors_clears_the_advisory() {
        let mut s = standard_with_cue_ball();
        let black = id_of(&s, BallKind::Black);
        let pink = id_of(&s, BallKind::Pink);
        pot_by_physics(&mut s, black);
        let red = first_red_on_table(&s);
        pot_by_physics(&mut s, red);
        pot_by_physics(&mut s, pink);
        assert!(!s.state.consecutive_colors);
        assert_eq!(
            s.state.pot_history.iter().copied().collect::<Vec<_>>(),
            vec![BallKind::Red, BallKind::Pink]
        );
    }

    #[test]
    fn potted_cue_ball_reopens_placement() {
        let mut s = standard_with_cue_ball();
        let ball = s.cue_ball_position().unwrap_or_default();
        assert!(s.begin_aim(ball + Vec2::new(30.0, 0.0)));

        pot_by_physics(&mut s, CUE_BALL);
        assert!(s.state.placing_cue_ball);
        assert!(!s.state.cue_ball_placed);
        assert!(!s.cue.visible && !s.cue.aiming);
        assert!(!s.begin_aim(ball));
        assert!(!s.release());
        assert!(s.state.pot_history.is_empty(), "cue ball pots are not recorded");

        for _ in 0..200 {
            s.tick();
        }
        assert!(!s.balls[CUE_BALL.index()].is_on_table(), "the cue ball is never respawned by itself");

        s.handle_input(InputEvent::PointerDown { x: ball.x, y: ball.y });
        assert!(s.state.cue_ball_placed);
        assert_eq!(s.cue_ball_position(), Some(ball));
    }

    #[test]
    fn potting_twice_changes_nothing() {
        let mut s = standard_with_cue_ball();
        let black = id_of(&s, BallKind::Black);
        s.pot(black, 0);
        let state = s.state.clone();
        let events = s.events.len();
        let tasks = s.scheduler.len();
        s.pot(black, 0);
        assert_eq!(s.state, state);
        assert_eq!(s.events.len(), events);
        assert_eq!(s.scheduler.len(), tasks);
    }

    #[test]
    fn stale_tasks_are_skipped() {
        let mut s = standard_with_cue_ball();
        let spot = s.cue_ball_position().unwrap_or_default();
        let generation = s.balls[CUE_BALL.index()].generation();
        s.scheduler.schedule(
            s.tick,
            2,
            TimedTask::ShotCurve { ball: CUE_BALL, generation, impulse: Vec2::new(500.0, 0.0) },
        );

        // The cue ball goes down and comes back before the task fires.
        s.pot(CUE_BALL, 4);
        assert_eq!(s.place_cue_ball(spot), Ok(true));
        s.tick();
        s.tick();
        assert_eq!(s.balls[CUE_BALL.index()].velocity(&s.world), Vec2::ZERO);

        // A respawn aimed at a ball that is back on the table is dropped too.
        let black = id_of(&s, BallKind::Black);
        let black_gen = s.balls[black.index()].generation();
        s.scheduler.schedule(s.tick, 0, TimedTask::Respawn { ball: black, generation: black_gen });
        s.tick();
        assert_eq!(s.balls[black.index()].generation(), black_gen);
    }

    #[test]
    fn power_and_contact_follow_input() {
        let mut s = standard_with_cue_ball();
        s.tick();
        let start = s.cue.power;
        s.handle_input(InputEvent::PowerUp);
        assert!((s.cue.power - (start + 0.1).min(1.0)).abs() < 1e-5);
        s.handle_input(InputEvent::PowerDown);
        s.handle_input(InputEvent::PowerDown);
        assert!((s.cue.power - (start - 0.1)).abs() < 1e-5);

        let ball = s.cue_ball_position().unwrap_or_default();
        // Modifier moves before aiming only turn the cue.
        s.handle_input(InputEvent::PointerMove { x: ball.x, y: ball.y - 100.0, modifier: true });
        assert_eq!(s.cue.contact, Vec2::ZERO);

        s.handle_input(InputEvent::PointerDown { x: ball.x + 30.0, y: ball.y });
        assert!(s.cue.aiming);
        let r = s.table.ball_radius;
        s.handle_input(InputEvent::PointerMove { x: ball.x, y: ball.y + 3.0 * r, modifier: true });
        assert!((s.cue.contact.y + 0.75).abs() < 1e-4, "pointer below the ball is draw");
        assert_eq!(s.cue.shot_type, crate::components::spin::ShotType::Draw);
    }

    #[test]
    fn snapshot_mirrors_the_table() {
        let mut s = standard_with_cue_ball();
        s.tick();
        let snap = s.snapshot();
        assert_eq!(snap.mode, GameMode::Standard);
        assert_eq!(snap.balls.len(), 22);
        assert_eq!(snap.balls.iter().filter(|b| b.on_table).count(), 22);
        assert!(snap.cue.visible);
        assert!(!snap.moving);
        assert_eq!(snap.tick, s.tick_count());
    }

    #[test]
    fn break_off_eventually_pots_a_red() {
        let mut s = session();
        s.select_mode(GameMode::Standard);
        s.adjust_power(true);
        s.adjust_power(true);
        assert_eq!(s.cue.power, 1.0);

        let d = s.table.d_center();
        let r = s.table.d_radius;
        let candidates = [
            Vec2::new(-0.5 * r, 0.0),
            Vec2::new(0.5 * r, 0.0),
            Vec2::new(0.0, 0.5 * r),
            Vec2::new(-0.3 * r, 0.7 * r),
            Vec2::new(0.3 * r, 0.7 * r),
        ];

        let mut potted_red = false;
        'shots: for _ in 0..20 {
            run_until_rest(&mut s, 5000);
            if s.state.placing_cue_ball {
                let placed = candidates
                    .iter()
                    .any(|offset| s.place_cue_ball(d + *offset) == Ok(true));
                assert!(placed, "no free spot in the D");
            }
            s.tick();

            let Some(cue) = s.cue_ball_position() else {
                break;
            };
            let target = s
                .balls
                .iter()
                .filter(|b| b.kind == BallKind::Red)
                .filter_map(|b| b.position(&s.world))
                .min_by(|a, b| a.distance(cue).total_cmp(&b.distance(cue)));
            let Some(target) = target else {
                break;
            };

            let dir = (target - cue).normalize_or_zero();
            assert!(s.begin_aim(cue - dir * 30.0));
            s.drag_aim(cue - dir * 200.0);
            assert!(s.release());

            for _ in 0..900 {
                s.tick();
                if s.balls.iter().any(|b| b.kind == BallKind::Red && b.is_pocketed()) {
                    potted_red = true;
                    break 'shots;
                }
            }
        }
        assert!(potted_red, "no red went down in twenty full-power shots");
    }
}
