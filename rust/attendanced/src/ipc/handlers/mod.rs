pub mod attendance;
pub mod catalog;
pub mod core;
pub mod people;
pub mod setup;
pub mod unlocks;
