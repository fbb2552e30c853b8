//! Pending-ACK table (spec §4.5, component C5): tracks outbound frames
//! awaiting acknowledgement and drives bounded retry.

use bytes::Bytes;
use flud_proto::{Body, Frame, FrameFlags, MacAddr};

/// Per-frame ACK timeout (spec §4.5, §4.9).
pub const ACK_TIMEOUT_MS: u32 = 5_000;

/// Maximum retry attempts before a frame is given up on.
pub const MAX_TRIES: u8 = 3;

/// Which on-disk log a pending entry's eventual status update belongs to.
/// `None` for frame types that never update a log record (HELLO).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    /// No log record is associated with this frame.
    None,
    /// The sending peer's private message log, keyed by destination MAC.
    Peer(MacAddr),
    /// A channel's message log, keyed by channel name.
    Channel(String),
}

struct Entry {
    frame: Bytes,
    first_sent_ms: u32,
    try_count: u8,
    sequence: u32,
    dest_mac: MacAddr,
    log_target: LogTarget,
    message_id: u32,
}

/// A frame the sweep decided to retry, with its header already refreshed
/// (`RETRY` set, `hops=0`, `ttl=max_ttl`) and ready to re-enqueue onto C6.
pub type RetryFrame = Bytes;

/// A frame the sweep gave up on: the caller should flip the named log
/// record to `DELIVERY_FAILED`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedDelivery {
    /// Which log record to update.
    pub target: LogTarget,
    /// Index within that log.
    pub message_id: u32,
}

/// Result of `PendingAckTable::remove` matching an inbound ACK.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acknowledged {
    /// Which log record to update.
    pub target: LogTarget,
    /// Index within that log.
    pub message_id: u32,
}

/// Outbound frames awaiting acknowledgement.
///
/// A `Vec` stands in for the original firmware's singly-linked list; the
/// access pattern (linear scan, unlink on match) is unchanged.
#[derive(Default)]
pub struct PendingAckTable {
    entries: Vec<Entry>,
}

fn log_target_and_message_id(body: &Body) -> (LogTarget, u32) {
    match body {
        Body::Message(m) => (LogTarget::Channel(m.channel_name.clone()), m.message_id),
        Body::Private(p) => (LogTarget::None, p.message_id), // dest filled in by caller
        Body::Hello(_) | Body::Ack(_) => (LogTarget::None, 0),
    }
}

impl PendingAckTable {
    /// Build an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a just-sent frame for ACK tracking.
    ///
    /// Callers must only call this for frames whose header has
    /// `ACK_REQUIRED` set, `RETRY` not set, and whose type is not ACK
    /// (spec §4.5) — this method does not re-check those conditions.
    pub fn add(&mut self, frame_bytes: Bytes, now: u32) {
        let Ok(frame) = Frame::decode(&frame_bytes) else { return };
        let (mut log_target, message_id) = log_target_and_message_id(&frame.body);
        if matches!(frame.body, Body::Private(_)) {
            log_target = LogTarget::Peer(frame.header.dest_mac());
        }
        self.entries.push(Entry {
            frame: frame_bytes,
            first_sent_ms: now,
            try_count: 0,
            sequence: frame.header.sequence(),
            dest_mac: frame.header.dest_mac(),
            log_target,
            message_id,
        });
    }

    /// Match and remove the first entry keyed by `(sequence, dest_mac)`.
    ///
    /// `dest_mac` here is the ACK sender (`header.source_mac` of the
    /// inbound ACK), matched against the `dest_mac` the original frame was
    /// sent to — per spec §9.2, broadcast-addressed entries (HELLO,
    /// channel MESSAGE) match the first ACK quoting that sequence
    /// regardless of who sent it, since they were registered against
    /// `dest_mac = broadcast`.
    pub fn remove(&mut self, sequence: u32, dest_mac: MacAddr) -> Option<Acknowledged> {
        let pos = self.entries.iter().position(|e| {
            e.sequence == sequence && (e.dest_mac == dest_mac || e.dest_mac.is_broadcast())
        })?;
        let entry = self.entries.remove(pos);
        if matches!(entry.log_target, LogTarget::None) {
            return None;
        }
        Some(Acknowledged { target: entry.log_target, message_id: entry.message_id })
    }

    /// Number of entries currently tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no frames are pending acknowledgement.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Scan for timed-out entries, retrying those under `MAX_TRIES` and
    /// failing out the rest.
    ///
    /// Entries due for retry have their header refreshed in place
    /// (`RETRY` set, `hops` reset to 0, `ttl` reset to `max_ttl`) and are
    /// returned for the caller to re-enqueue onto the send queue.
    pub fn sweep(&mut self, now: u32, max_ttl: u8) -> (Vec<RetryFrame>, Vec<FailedDelivery>) {
        let mut retries = Vec::new();
        let mut failures = Vec::new();
        let mut i = 0;
        while i < self.entries.len() {
            let due = now.wrapping_sub(self.entries[i].first_sent_ms) >= ACK_TIMEOUT_MS;
            if !due {
                i += 1;
                continue;
            }
            if self.entries[i].try_count < MAX_TRIES {
                let entry = &mut self.entries[i];
                entry.try_count += 1;
                entry.first_sent_ms = now;
                if let Ok(mut frame) = Frame::decode(&entry.frame) {
                    frame.header.set_flags(frame.header.flags() | FrameFlags::RETRY);
                    frame.header.set_hops(0);
                    frame.header.set_ttl(max_ttl);
                    if let Ok(bytes) = frame.encode() {
                        entry.frame = bytes.clone();
                        retries.push(bytes);
                    }
                }
                i += 1;
            } else {
                let entry = self.entries.remove(i);
                if !matches!(entry.log_target, LogTarget::None) {
                    failures.push(FailedDelivery { target: entry.log_target, message_id: entry.message_id });
                }
            }
        }
        (retries, failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flud_proto::{ContentType, FrameHeader, FrameType, HelloBody, MessageBody, PrivateBody, Role};

    fn mac(n: u8) -> MacAddr {
        MacAddr::new([0, 0, 0, 0, 0, n])
    }

    fn private_frame(seq: u32, dest: MacAddr, message_id: u32) -> Bytes {
        let header = FrameHeader::new(FrameType::Private, FrameFlags::ACK_REQUIRED, 5, seq, mac(1), dest);
        Frame {
            header,
            body: Body::Private(PrivateBody {
                message_id,
                content_type: ContentType::TEXT,
                payload: Bytes::from_static(b"hi"),
            }),
        }
        .encode()
        .expect("encode")
    }

    #[test]
    fn add_then_remove_returns_message_id() {
        let mut table = PendingAckTable::new();
        table.add(private_frame(1, mac(2), 7), 0);
        let ack = table.remove(1, mac(2)).expect("should match");
        assert_eq!(ack.message_id, 7);
        assert_eq!(ack.target, LogTarget::Peer(mac(2)));
        assert!(table.is_empty());
    }

    #[test]
    fn remove_does_not_match_wrong_sequence() {
        let mut table = PendingAckTable::new();
        table.add(private_frame(1, mac(2), 7), 0);
        assert!(table.remove(2, mac(2)).is_none());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn broadcast_entry_matches_any_acker() {
        let header =
            FrameHeader::new(FrameType::Hello, FrameFlags::ACK_REQUIRED, 5, 9, mac(1), MacAddr::BROADCAST);
        let frame = Frame {
            header,
            body: Body::Hello(HelloBody {
                name: "A".to_string(),
                role: Role::Client,
                capabilities: flud_proto::Capabilities::empty(),
                battery: 50,
            }),
        }
        .encode()
        .expect("encode");
        let mut table = PendingAckTable::new();
        table.add(frame, 0);
        // HELLO has no log target, so remove returns None even on a match,
        // but the entry is still consumed.
        assert!(table.remove(9, mac(5)).is_none());
        assert!(table.is_empty());
    }

    #[test]
    fn sweep_retries_under_max_tries_then_fails() {
        let mut table = PendingAckTable::new();
        table.add(private_frame(1, mac(2), 3), 0);

        let (retries, failures) = table.sweep(ACK_TIMEOUT_MS, 5);
        assert_eq!(retries.len(), 1);
        assert!(failures.is_empty());
        let retried = Frame::decode(&retries[0]).expect("decode");
        assert!(retried.header.flags().contains(FrameFlags::RETRY));
        assert_eq!(retried.header.ttl(), 5);
        assert_eq!(retried.header.hops(), 0);

        let (retries, failures) = table.sweep(ACK_TIMEOUT_MS * 2, 5);
        assert_eq!(retries.len(), 1);
        assert!(failures.is_empty());

        let (retries, failures) = table.sweep(ACK_TIMEOUT_MS * 3, 5);
        assert_eq!(retries.len(), 1);
        assert!(failures.is_empty());

        let (retries, failures) = table.sweep(ACK_TIMEOUT_MS * 4, 5);
        assert!(retries.is_empty());
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].message_id, 3);
        assert!(table.is_empty());
    }

    #[test]
    fn channel_message_resolves_to_channel_log_target() {
        let header = FrameHeader::new(
            FrameType::Message,
            FrameFlags::ACK_REQUIRED,
            5,
            4,
            mac(1),
            MacAddr::BROADCAST,
        );
        let frame = Frame {
            header,
            body: Body::Message(MessageBody {
                message_id: 11,
                channel_name: "general".to_string(),
                content_type: ContentType::TEXT,
                payload: Bytes::from_static(b"hi all"),
            }),
        }
        .encode()
        .expect("encode");
        let mut table = PendingAckTable::new();
        table.add(frame, 0);
        let ack = table.remove(4, mac(9)).expect("broadcast entry matches any acker");
        assert_eq!(ack.target, LogTarget::Channel("general".to_string()));
        assert_eq!(ack.message_id, 11);
    }

    #[test]
    fn sweep_leaves_fresh_entries_alone() {
        let mut table = PendingAckTable::new();
        table.add(private_frame(1, mac(2), 3), 1_000);
        let (retries, failures) = table.sweep(1_500, 5);
        assert!(retries.is_empty());
        assert!(failures.is_empty());
        assert_eq!(table.len(), 1);
    }
}
