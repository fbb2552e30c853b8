//! Core entity types and environment traits shared by the fludmesh storage
//! and engine layers.
//!
//! This crate has no I/O of its own: `flud-storage` persists the entity
//! types defined here, and `flud-engine` drives the [`env::Environment`]
//! trait against real or simulated system resources.

pub mod cache;
pub mod channel_name;
pub mod entity;
pub mod env;
pub mod errors;
pub mod rssi;
mod util;

pub use cache::DupCache;
pub use channel_name::validate_channel_name;
pub use entity::{
    ChannelPersistent, ChannelVolatile, PeerPersistent, PeerVolatile, PERSISTENT_MAGIC,
    PERSISTENT_VERSION,
};
pub use env::{radio_send_error, Clock, Environment, Radio, Rng};
pub use errors::{CoreError, Result};
pub use rssi::rssi_to_percent;
