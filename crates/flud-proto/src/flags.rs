//! Frame header flag bits and the frame-type / role / capability byte enums.

use std::fmt;

/// Bitfield carried in the header's `flags` byte.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameFlags(u8);

impl FrameFlags {
    /// Addressed to the broadcast MAC.
    pub const BROADCAST: Self = Self(0x01);
    /// Payload is encrypted (reserved; unused by this core — see spec Non-goals).
    pub const ENCRYPTED: Self = Self(0x02);
    /// Sender wants an ACK frame back.
    pub const ACK_REQUIRED: Self = Self(0x04);
    /// This is a resend of a previously transmitted frame.
    pub const RETRY: Self = Self(0x08);
    /// This frame was rebroadcast by a node other than its originator.
    pub const FORWARDED: Self = Self(0x10);

    /// No bits set.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Reinterpret a raw byte as flags (all 256 bit patterns are valid).
    #[must_use]
    pub const fn from_byte(byte: u8) -> Self {
        Self(byte)
    }

    /// Raw byte form for encoding.
    #[must_use]
    pub const fn to_byte(self) -> u8 {
        self.0
    }

    /// True if every bit set in `other` is also set here.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Set the given bits.
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// Clear the given bits.
    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }
}

impl std::ops::BitOr for FrameFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Debug for FrameFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::new();
        if self.contains(Self::BROADCAST) {
            names.push("BROADCAST");
        }
        if self.contains(Self::ENCRYPTED) {
            names.push("ENCRYPTED");
        }
        if self.contains(Self::ACK_REQUIRED) {
            names.push("ACK_REQUIRED");
        }
        if self.contains(Self::RETRY) {
            names.push("RETRY");
        }
        if self.contains(Self::FORWARDED) {
            names.push("FORWARDED");
        }
        write!(f, "FrameFlags({})", names.join("|"))
    }
}

/// The four frame shapes this protocol carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FrameType {
    /// Presence beacon.
    Hello = 1,
    /// Channel (broadcast) chat message.
    Message = 2,
    /// Addressed private message.
    Private = 3,
    /// Acknowledgement of a prior sequence number.
    Ack = 4,
}

impl FrameType {
    /// Recover a `FrameType` from its wire byte, `None` if unrecognized.
    #[must_use]
    pub const fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(Self::Hello),
            2 => Some(Self::Message),
            3 => Some(Self::Private),
            4 => Some(Self::Ack),
            _ => None,
        }
    }

    /// Wire byte for this type.
    #[must_use]
    pub const fn to_u8(self) -> u8 {
        self as u8
    }
}

/// Forwarding-policy role tag carried in HELLO and in the peer directory.
///
/// The baseline engine forwards in every role (spec §4.8); `Role::Channel` is
/// never assigned to a peer — it exists only so the directory store's shared
/// persistence helpers can tag a record as channel-shaped when they need a
/// role byte (see `original_source` `FLOOD_DEVICE_ROLE_t`, which folds the
/// channel tag into the same enum as the peer forwarding roles).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Role {
    /// Channel persistent-record tag (not a forwarding policy).
    Channel = 0x00,
    /// End-user device; no special forwarding behaviour.
    Client = 0x01,
    /// Always-on infrastructure node.
    Router = 0x02,
    /// Relay-only node.
    Repeater = 0x03,
}

impl Role {
    /// Recover a `Role` from its wire byte, `None` if unrecognized.
    #[must_use]
    pub const fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Self::Channel),
            0x01 => Some(Self::Client),
            0x02 => Some(Self::Router),
            0x03 => Some(Self::Repeater),
            _ => None,
        }
    }

    /// Wire byte for this role.
    #[must_use]
    pub const fn to_u8(self) -> u8 {
        self as u8
    }

    /// Whether a node in this role rebroadcasts frames it isn't the
    /// destination of. The spec's baseline behaviour is "forward in all
    /// roles"; this hook exists so a future redesign can specialize it
    /// without touching call sites.
    #[must_use]
    pub const fn should_forward(self) -> bool {
        true
    }
}

/// Device capability bitmask carried in HELLO and the peer persistent record.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities(u8);

impl Capabilities {
    /// Device can enter power-save sleep between beacons.
    pub const POWER_SAVE: Self = Self(0x01);
    /// Device can sustain high message throughput.
    pub const HIGH_THROUGHPUT: Self = Self(0x02);
    /// Device has persistent storage (can hold a message log).
    pub const STORAGE: Self = Self(0x08);
    /// Device supports payload encryption (reserved; unused).
    pub const ENCRYPTION: Self = Self(0x10);

    /// No capability bits set.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Reinterpret a raw byte as capabilities.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Self {
        Self(byte)
    }

    /// Raw byte form for encoding.
    #[must_use]
    pub const fn to_byte(self) -> u8 {
        self.0
    }

    /// True if every bit set in `other` is also set here.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for Capabilities {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Capabilities({:#04x})", self.0)
    }
}

/// Opaque content-type tag for message bodies. The core never interprets it
/// beyond `TEXT`; applications are free to use the rest of the byte space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ContentType(pub u8);

impl ContentType {
    /// Plain UTF-8 text payload.
    pub const TEXT: Self = Self(0);

    /// Build from a raw wire byte.
    #[must_use]
    pub const fn from_u8(byte: u8) -> Self {
        Self(byte)
    }

    /// Raw wire byte.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self.0
    }
}

/// Battery level is 0-100, or this sentinel for "unknown / AC powered".
pub const BATTERY_UNKNOWN: u8 = 255;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_round_trip_every_bit() {
        let combined = FrameFlags::ACK_REQUIRED | FrameFlags::RETRY;
        assert!(combined.contains(FrameFlags::ACK_REQUIRED));
        assert!(combined.contains(FrameFlags::RETRY));
        assert!(!combined.contains(FrameFlags::FORWARDED));
        assert_eq!(FrameFlags::from_byte(combined.to_byte()), combined);
    }

    #[test]
    fn frame_type_unknown_byte_is_none() {
        assert_eq!(FrameType::from_u8(0xAA), None);
        assert_eq!(FrameType::from_u8(1), Some(FrameType::Hello));
    }

    #[test]
    fn role_forwards_in_every_role() {
        assert!(Role::Client.should_forward());
        assert!(Role::Router.should_forward());
        assert!(Role::Repeater.should_forward());
    }
}
