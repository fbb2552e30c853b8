//! Peer and channel entity records: the persistent (on-disk) and volatile
//! (in-RAM) halves of the directory store (spec §4.4).

use flud_proto::{Capabilities, MacAddr, Role};

use crate::errors::{CoreError, Result};

/// Magic shared by every persistent record shape (spec §3), the same
/// sentinel used on the wire.
pub const PERSISTENT_MAGIC: u32 = 0x464C_5544;

/// Current persistent record format version.
pub const PERSISTENT_VERSION: u8 = 1;

/// On-disk peer record: `magic(4) | version(1) | mac(6) | name(32) | role(1) | capabilities(1)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerPersistent {
    /// Primary key.
    pub mac: MacAddr,
    /// Device name, truncated to 32 bytes on encode.
    pub name: String,
    /// Forwarding-policy role.
    pub role: Role,
    /// Capability bitmask.
    pub capabilities: Capabilities,
}

impl PeerPersistent {
    /// Encoded size in bytes (spec's "40-byte" prose is a slip; the field
    /// table sums to 45, matching the original firmware's packed struct).
    pub const LEN: usize = 45;

    /// Serialize to the on-disk record.
    #[must_use]
    pub fn encode(&self) -> [u8; Self::LEN] {
        let mut out = [0u8; Self::LEN];
        out[0..4].copy_from_slice(&PERSISTENT_MAGIC.to_ne_bytes());
        out[4] = PERSISTENT_VERSION;
        out[5..11].copy_from_slice(self.mac.as_bytes());
        crate::util::write_fixed_str(&mut out[11..43], &self.name);
        out[43] = self.role.to_u8();
        out[44] = self.capabilities.to_byte();
        out
    }

    /// Parse a record previously written by [`Self::encode`].
    ///
    /// # Errors
    ///
    /// `Corrupt` if the buffer is short or the magic/version don't match —
    /// per spec invariant 2, treated by the caller as "entity absent".
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::LEN {
            return Err(CoreError::Corrupt("peer record shorter than 45 bytes"));
        }
        let magic = u32::from_ne_bytes(bytes[0..4].try_into().expect("4 bytes"));
        if magic != PERSISTENT_MAGIC {
            return Err(CoreError::Corrupt("peer record has bad magic"));
        }
        if bytes[4] != PERSISTENT_VERSION {
            return Err(CoreError::Corrupt("peer record has unsupported version"));
        }
        let mut mac = [0u8; 6];
        mac.copy_from_slice(&bytes[5..11]);
        let name = crate::util::read_fixed_str(&bytes[11..43]);
        let role = Role::from_u8(bytes[43]).unwrap_or(Role::Client);
        let capabilities = Capabilities::from_byte(bytes[44]);
        Ok(Self { mac: MacAddr::new(mac), name, role, capabilities })
    }
}

/// In-memory peer state, never persisted directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerVolatile {
    /// Last inbound frame timestamp, milliseconds since boot.
    pub last_seen_ms: u32,
    /// [`crate::rssi::rssi_to_percent`] of the most recently received frame.
    pub signal_strength: u8,
    /// Hop count of the most recently received frame.
    pub hops: u8,
    /// Battery percent, or [`flud_proto::BATTERY_UNKNOWN`].
    pub battery_level: u8,
    /// Unread message counter, reset by `mark_read`.
    pub unread_messages: u16,
}

impl Default for PeerVolatile {
    fn default() -> Self {
        Self {
            last_seen_ms: 0,
            signal_strength: 0,
            hops: 0,
            battery_level: flud_proto::BATTERY_UNKNOWN,
            unread_messages: 0,
        }
    }
}

/// On-disk channel record: `magic(4) | version(1) | name(32) | secret(128)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelPersistent {
    /// Primary key.
    pub name: String,
    /// Reserved secret field; always zero (spec Non-goals: no crypto).
    pub secret: [u8; 128],
}

impl ChannelPersistent {
    /// Encoded size in bytes.
    pub const LEN: usize = 165;

    /// Build a fresh record with a zeroed secret.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), secret: [0u8; 128] }
    }

    /// Serialize to the on-disk record.
    #[must_use]
    pub fn encode(&self) -> [u8; Self::LEN] {
        let mut out = [0u8; Self::LEN];
        out[0..4].copy_from_slice(&PERSISTENT_MAGIC.to_ne_bytes());
        out[4] = PERSISTENT_VERSION;
        crate::util::write_fixed_str(&mut out[5..37], &self.name);
        out[37..165].copy_from_slice(&self.secret);
        out
    }

    /// Parse a record previously written by [`Self::encode`].
    ///
    /// # Errors
    ///
    /// `Corrupt` if the buffer is short or the magic/version don't match.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::LEN {
            return Err(CoreError::Corrupt("channel record shorter than 165 bytes"));
        }
        let magic = u32::from_ne_bytes(bytes[0..4].try_into().expect("4 bytes"));
        if magic != PERSISTENT_MAGIC {
            return Err(CoreError::Corrupt("channel record has bad magic"));
        }
        if bytes[4] != PERSISTENT_VERSION {
            return Err(CoreError::Corrupt("channel record has unsupported version"));
        }
        let name = crate::util::read_fixed_str(&bytes[5..37]);
        let mut secret = [0u8; 128];
        secret.copy_from_slice(&bytes[37..165]);
        Ok(Self { name, secret })
    }
}

/// In-memory channel state, never persisted directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelVolatile {
    /// Last inbound message timestamp, milliseconds since boot.
    pub last_seen_ms: u32,
    /// Unread message counter, reset by `mark_read`.
    pub unread_messages: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peer_record_round_trips() {
        let record = PeerPersistent {
            mac: MacAddr::new([1, 2, 3, 4, 5, 6]),
            name: "Alpha".to_string(),
            role: Role::Router,
            capabilities: Capabilities::STORAGE,
        };
        let bytes = record.encode();
        assert_eq!(bytes.len(), PeerPersistent::LEN);
        assert_eq!(PeerPersistent::decode(&bytes).expect("decode"), record);
    }

    #[test]
    fn peer_record_rejects_bad_magic() {
        let mut bytes = PeerPersistent {
            mac: MacAddr::new([0; 6]),
            name: String::new(),
            role: Role::Client,
            capabilities: Capabilities::empty(),
        }
        .encode();
        bytes[0] = 0;
        assert!(PeerPersistent::decode(&bytes).is_err());
    }

    #[test]
    fn channel_record_round_trips() {
        let record = ChannelPersistent::new("general");
        let bytes = record.encode();
        assert_eq!(bytes.len(), ChannelPersistent::LEN);
        assert_eq!(ChannelPersistent::decode(&bytes).expect("decode"), record);
    }
}
