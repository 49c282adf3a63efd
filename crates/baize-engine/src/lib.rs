pub mod api;
pub mod bridge;
pub mod components;
pub mod config;
pub mod core;
pub mod error;
pub mod input;
pub mod systems;

// Re-export key types at crate root for convenience
pub use api::session::{GameState, Session, CUE_BALL};
pub use api::types::{BallId, BallKind, GameMode, SessionEvent};
pub use bridge::protocol::{FrameCounts, ProtocolLayout};
pub use components::ball::Ball;
pub use components::cue::{Cue, Shot};
pub use components::spin::ShotType;
pub use components::table::{Pocket, PocketKind, Table};
pub use config::SessionConfig;
pub use core::physics::{
    BodyDesc, BodyType, ColliderDesc, ColliderMaterial, CollisionPair, PhysicsBody, PhysicsWorld,
};
pub use core::time::FixedTimestep;
pub use error::{Advisory, ConfigError, PlacementError};
pub use input::queue::{InputEvent, InputQueue};
pub use systems::snapshot::{BallView, CueView, SessionSnapshot};
