//! On-disk message log and directory store for a fludmesh node.
//!
//! Persisted layouts are part of the wire contract (spec §3, §6): this
//! crate talks to `std::fs` directly rather than through a swappable
//! storage trait, since the byte-for-byte on-disk format is specified, not
//! an implementation detail.

pub mod directory;
pub mod errors;
pub mod log;

pub use directory::{channel_log_path, peer_log_path, ChannelDirectory, PeerDirectory};
pub use errors::{Result, StorageError};
pub use log::{MessageStatus, StoredMessage, RECORD_LEN};
