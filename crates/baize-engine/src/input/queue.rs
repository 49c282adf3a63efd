use crate::api::types::GameMode;

/// Key codes the session reacts to.
pub const KEY_ARROW_UP: u32 = 38;
pub const KEY_ARROW_DOWN: u32 = 40;
pub const KEY_DIGIT_1: u32 = 49;

/// Input the session understands, in table coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    SelectMode(GameMode),
    /// Press: places the cue ball while placement is open, else starts aiming.
    PointerDown { x: f32, y: f32 },
    /// Hover. With `modifier` held while aiming it moves the contact point.
    PointerMove { x: f32, y: f32, modifier: bool },
    /// Move with the button held: sets angle and pullback.
    PointerDrag { x: f32, y: f32 },
    /// Release: fires the shot if the cue is pulled back far enough.
    PointerUp { x: f32, y: f32 },
    PowerUp,
    PowerDown,
}

impl InputEvent {
    /// Keyboard shortcuts: arrows for power, 1 to 3 for the modes.
    pub fn from_key(key_code: u32) -> Option<Self> {
        match key_code {
            KEY_ARROW_UP => Some(InputEvent::PowerUp),
            KEY_ARROW_DOWN => Some(InputEvent::PowerDown),
            code if code >= KEY_DIGIT_1 => {
                GameMode::from_code(code - KEY_DIGIT_1 + 1).map(InputEvent::SelectMode)
            }
            _ => None,
        }
    }
}

/// A queue of input events.
/// The host writes events into the queue; the runner drains it each frame.
pub struct InputQueue {
    events: Vec<InputEvent>,
}

impl InputQueue {
    pub fn new() -> Self {
        Self {
            events: Vec::with_capacity(32),
        }
    }

    pub fn push(&mut self, event: InputEvent) {
        self.events.push(event);
    }

    /// Push the event bound to `key_code`, if any. Returns whether one was queued.
    pub fn push_key(&mut self, key_code: u32) -> bool {
        match InputEvent::from_key(key_code) {
            Some(event) => {
                self.push(event);
                true
            }
            None => false,
        }
    }

    /// Drain all pending events. Returns a Vec and clears the queue.
    pub fn drain(&mut self) -> Vec<InputEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn iter(&self) -> impl Iterator<Item = &InputEvent> {
        self.events.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

impl Default for InputQueue {
    fn default() -> Self {
        Self::new()
    }
}
