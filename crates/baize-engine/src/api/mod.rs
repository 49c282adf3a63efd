pub mod session;
pub mod types;
