pub mod collisions;
pub mod placement;
pub mod pockets;
pub mod snapshot;
