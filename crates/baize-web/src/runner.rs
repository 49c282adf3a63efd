use baize_engine::{
    ConfigError, FixedTimestep, InputEvent, InputQueue, ProtocolLayout, Session, SessionConfig, SessionEvent,
};

/// Default capacity for events carried in one frame.
pub const DEFAULT_MAX_EVENTS: usize = 64;
/// Ticks one frame may run; a longer stall is dropped.
pub const MAX_TICKS_PER_FRAME: u32 = 10;

/// Wires a [`Session`] to a host frame loop.
///
/// The host pushes input as it arrives and calls [`SessionRunner::tick`] once
/// per animation frame with the elapsed time. The runner turns that into
/// whole fixed ticks, then writes a flat frame the host reads through
/// [`SessionRunner::frame_ptr`].
pub struct SessionRunner {
    session: Session,
    input: InputQueue,
    timestep: FixedTimestep,
    layout: ProtocolLayout,
    frame: Vec<f32>,
    /// Events not yet written to a frame.
    pending: Vec<SessionEvent>,
}

impl SessionRunner {
    pub fn new(config: SessionConfig) -> Result<Self, ConfigError> {
        let timestep = FixedTimestep::new(config.fixed_dt).with_max_steps(MAX_TICKS_PER_FRAME);
        let session = Session::new(config)?;
        let layout = ProtocolLayout::new(session.balls().len(), DEFAULT_MAX_EVENTS);
        let frame = layout.allocate();
        let mut runner = Self {
            session,
            input: InputQueue::new(),
            timestep,
            layout,
            frame,
            pending: Vec::new(),
        };
        runner.write_frame();
        Ok(runner)
    }

    /// Build from a JSON config. Empty input means defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        if json.trim().is_empty() {
            return Self::new(SessionConfig::default());
        }
        Self::new(SessionConfig::from_json(json)?)
    }

    pub fn push_input(&mut self, event: InputEvent) {
        self.input.push(event);
    }

    pub fn push_key(&mut self, key_code: u32) {
        self.input.push_key(key_code);
    }

    /// Apply queued input, run the fixed ticks `dt` seconds are worth, and
    /// rewrite the frame.
    pub fn tick(&mut self, dt: f32) {
        for event in self.input.drain() {
            self.session.handle_input(event);
        }
        let steps = self.timestep.accumulate(dt);
        for _ in 0..steps {
            self.session.tick();
        }
        self.write_frame();
    }

    fn write_frame(&mut self) {
        self.pending.extend(self.session.drain_events());
        let snapshot = self.session.snapshot();
        let counts = self
            .layout
            .write_frame(&snapshot, self.session.table(), &self.pending, &mut self.frame);
        if counts.dropped_events > 0 {
            log::warn!("{} events did not fit in the frame", counts.dropped_events);
        }
        self.pending.clear();
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// JSON snapshot for hosts that prefer it over the flat frame.
    pub fn snapshot_json(&self) -> String {
        serde_json::to_string(&self.session.snapshot()).unwrap_or_default()
    }

    /// Interpolation factor between the last two ticks.
    pub fn alpha(&self) -> f32 {
        self.timestep.alpha()
    }

    // ---- Pointer accessors for direct memory reads ----

    pub fn frame(&self) -> &[f32] {
        &self.frame
    }

    pub fn frame_ptr(&self) -> *const f32 {
        self.frame.as_ptr()
    }

    pub fn frame_len(&self) -> u32 {
        self.frame.len() as u32
    }

    pub fn layout(&self) -> &ProtocolLayout {
        &self.layout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use baize_engine::bridge::protocol::{EVENT_MODE_SELECTED, HEADER_EVENT_COUNT, HEADER_MODE, HEADER_TICK};
    use baize_engine::GameMode;

    #[test]
    fn input_is_applied_before_ticking() {
        let mut runner = SessionRunner::new(SessionConfig::default()).expect("default config is valid");
        runner.push_input(InputEvent::SelectMode(GameMode::Standard));
        runner.tick(1.0 / 60.0);

        let frame = runner.frame();
        assert_eq!(frame[HEADER_MODE], 1.0);
        assert_eq!(frame[HEADER_TICK], 1.0);
        assert_eq!(frame[HEADER_EVENT_COUNT], 1.0);
        assert_eq!(frame[runner.layout().event_data_offset], EVENT_MODE_SELECTED);

        // Events are carried once.
        runner.tick(1.0 / 60.0);
        assert_eq!(runner.frame()[HEADER_EVENT_COUNT], 0.0);
    }

    #[test]
    fn frame_time_becomes_whole_ticks() {
        let mut runner = SessionRunner::new(SessionConfig::default()).expect("default config is valid");
        runner.tick(0.5 / 60.0);
        assert_eq!(runner.session().tick_count(), 0);
        runner.tick(2.6 / 60.0);
        assert_eq!(runner.session().tick_count(), 3);
        // A long stall is capped.
        runner.tick(5.0);
        let ran = runner.session().tick_count() - 3;
        assert!(ran > 0 && ran <= MAX_TICKS_PER_FRAME as u64);
    }

    #[test]
    fn json_config_is_optional() {
        assert!(SessionRunner::from_json("").is_ok());
        assert!(SessionRunner::from_json("{\"fixed_dt\": 0.01}").is_ok());
        assert!(SessionRunner::from_json("not json").is_err());
        let runner = SessionRunner::from_json("").expect("defaults");
        assert!(runner.snapshot_json().contains("\"mode\""));
    }
}
