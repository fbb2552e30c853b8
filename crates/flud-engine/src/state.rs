//! State serialized behind the engine mutex (spec §5): the volatile
//! peer/channel directories, the dup cache, the pending-ACK table, and the
//! internal sequence counter.

use std::path::PathBuf;

use flud_core::DupCache;
use flud_storage::{ChannelDirectory, PeerDirectory};

use crate::pending_ack::PendingAckTable;

/// Everything one node's engine, ingress handler, and public API share.
///
/// Production code wraps this in `Mutex<SharedState>` — the single
/// "engine mutex" spec §5 describes; this crate does not impose the lock
/// itself so `flud-harness` and unit tests can drive it unlocked.
pub struct SharedState {
    /// Root of the on-disk layout (spec §3).
    pub ctx: PathBuf,
    /// Peer persistent + volatile store (component C4).
    pub peers: PeerDirectory,
    /// Channel persistent + volatile store (component C4).
    pub channels: ChannelDirectory,
    /// Duplicate-suppression cache (component C2).
    pub cache: DupCache,
    /// Outbound frames awaiting acknowledgement (component C5).
    pub pending_ack: PendingAckTable,
    next_sequence: u32,
}

impl SharedState {
    /// Build state rooted at `ctx`, with the dup cache sized to
    /// `cache_capacity` and the sequence counter seeded from
    /// `initial_sequence` (spec §3 invariant 6: seeded from a random
    /// source at start-up).
    #[must_use]
    pub fn new(ctx: impl Into<PathBuf>, cache_capacity: usize, initial_sequence: u32) -> Self {
        let ctx = ctx.into();
        Self {
            peers: PeerDirectory::new(&ctx),
            channels: ChannelDirectory::new(&ctx),
            cache: DupCache::new(cache_capacity),
            pending_ack: PendingAckTable::new(),
            next_sequence: initial_sequence,
            ctx,
        }
    }

    /// Draw the next per-origin sequence number, wrapping on overflow
    /// (spec §3 invariant 6: wrap is harmless since identity is scoped by
    /// `(source_mac, sequence)`).
    pub fn next_sequence(&mut self) -> u32 {
        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.wrapping_add(1);
        sequence
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_counter_is_monotonic_and_wraps() {
        let mut state = SharedState::new("/tmp/does-not-need-to-exist", 4, u32::MAX - 1);
        assert_eq!(state.next_sequence(), u32::MAX - 1);
        assert_eq!(state.next_sequence(), u32::MAX);
        assert_eq!(state.next_sequence(), 0);
    }
}
