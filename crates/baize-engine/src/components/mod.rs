pub mod ball;
pub mod cue;
pub mod spin;
pub mod table;
