//! roster-core — wire contract, configuration and shared types.
//! All other roster crates depend on this one.

pub mod config;
pub mod instrument;
pub mod wire;

pub use config::{ConfigError, RosterConfig};
pub use instrument::Instrument;
pub use wire::{Announcement, DecodeError, RosterRecord};
