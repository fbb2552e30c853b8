//! The 25-byte frame header shared by every frame shape.
//!
//! All multi-byte scalars are **host-endian** — a deliberate choice, since
//! every node in this mesh shares one architecture. A cross-architecture
//! port should reinterpret every multi-byte scalar as little-endian at this
//! boundary and bump [`FrameHeader::VERSION`] (see spec §9, "Design Notes").

use crate::{
    errors::{ProtoError, Result},
    mac::MacAddr,
    flags::{FrameFlags, FrameType},
};

/// Fixed-size frame header, field order is wire order.
///
/// The distilled spec's prose calls this "20 bytes", but its own field table
/// (and the original firmware's packed `mesh_packet_header_t`) sums to 25.
/// `HEADER_LEN` follows the field table.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    magic: [u8; 4],
    version: u8,
    packet_type: u8,
    flags: u8,
    hops: u8,
    ttl: u8,
    sequence: [u8; 4],
    source_mac: [u8; 6],
    dest_mac: [u8; 6],
}

impl FrameHeader {
    /// Encoded size of the header in bytes.
    pub const LEN: usize = 25;

    /// Protocol sentinel, `"FLUD"` in ASCII.
    pub const MAGIC: u32 = 0x464C_5544;

    /// Current protocol version.
    pub const VERSION: u8 = 1;

    /// Build a new header for the given type, originator and sequence.
    ///
    /// `hops` starts at 0 and `ttl` is the caller-supplied max hop budget.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        packet_type: FrameType,
        flags: FrameFlags,
        ttl: u8,
        sequence: u32,
        source_mac: MacAddr,
        dest_mac: MacAddr,
    ) -> Self {
        Self {
            magic: Self::MAGIC.to_ne_bytes(),
            version: Self::VERSION,
            packet_type: packet_type.to_u8(),
            flags: flags.to_byte(),
            hops: 0,
            ttl,
            sequence: sequence.to_ne_bytes(),
            source_mac: *source_mac.as_bytes(),
            dest_mac: *dest_mac.as_bytes(),
        }
    }

    /// Parse a header from the front of `bytes`.
    ///
    /// # Errors
    ///
    /// `TooShort` if fewer than [`Self::LEN`] bytes are given, `BadMagic` or
    /// `BadVersion` if those fields don't match.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::LEN {
            return Err(ProtoError::TooShort { expected: Self::LEN, actual: bytes.len() });
        }

        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[0..4]);
        if u32::from_ne_bytes(magic) != Self::MAGIC {
            return Err(ProtoError::BadMagic);
        }

        let version = bytes[4];
        if version != Self::VERSION {
            return Err(ProtoError::BadVersion(version));
        }

        let mut sequence = [0u8; 4];
        sequence.copy_from_slice(&bytes[9..13]);

        let mut source_mac = [0u8; 6];
        source_mac.copy_from_slice(&bytes[13..19]);

        let mut dest_mac = [0u8; 6];
        dest_mac.copy_from_slice(&bytes[19..25]);

        Ok(Self {
            magic,
            version,
            packet_type: bytes[5],
            flags: bytes[6],
            hops: bytes[7],
            ttl: bytes[8],
            sequence,
            source_mac,
            dest_mac,
        })
    }

    /// Serialize this header to its wire bytes.
    #[must_use]
    pub fn encode(&self) -> [u8; Self::LEN] {
        let mut out = [0u8; Self::LEN];
        out[0..4].copy_from_slice(&self.magic);
        out[4] = self.version;
        out[5] = self.packet_type;
        out[6] = self.flags;
        out[7] = self.hops;
        out[8] = self.ttl;
        out[9..13].copy_from_slice(&self.sequence);
        out[13..19].copy_from_slice(&self.source_mac);
        out[19..25].copy_from_slice(&self.dest_mac);
        out
    }

    /// Raw magic value (already validated by `decode`).
    #[must_use]
    pub fn magic(&self) -> u32 {
        u32::from_ne_bytes(self.magic)
    }

    /// Protocol version byte.
    #[must_use]
    pub const fn version(&self) -> u8 {
        self.version
    }

    /// Frame type, `None` if the byte doesn't map to a known `FrameType`.
    #[must_use]
    pub const fn frame_type(&self) -> Option<FrameType> {
        FrameType::from_u8(self.packet_type)
    }

    /// Raw frame-type byte (use when you must accept unknown types, e.g. to
    /// drop them rather than panic).
    #[must_use]
    pub const fn frame_type_raw(&self) -> u8 {
        self.packet_type
    }

    /// Flag bitfield.
    #[must_use]
    pub const fn flags(&self) -> FrameFlags {
        FrameFlags::from_byte(self.flags)
    }

    /// Hops travelled so far.
    #[must_use]
    pub const fn hops(&self) -> u8 {
        self.hops
    }

    /// Remaining hop budget.
    #[must_use]
    pub const fn ttl(&self) -> u8 {
        self.ttl
    }

    /// Per-origin sequence number.
    #[must_use]
    pub fn sequence(&self) -> u32 {
        u32::from_ne_bytes(self.sequence)
    }

    /// Originator's MAC address.
    #[must_use]
    pub fn source_mac(&self) -> MacAddr {
        MacAddr::new(self.source_mac)
    }

    /// Destination MAC address (broadcast for HELLO / channel MESSAGE).
    #[must_use]
    pub fn dest_mac(&self) -> MacAddr {
        MacAddr::new(self.dest_mac)
    }

    /// Overwrite the flag bitfield (used when marking a retry).
    pub fn set_flags(&mut self, flags: FrameFlags) {
        self.flags = flags.to_byte();
    }

    /// Overwrite `hops` (used during forwarding and on retry-reset).
    pub fn set_hops(&mut self, hops: u8) {
        self.hops = hops;
    }

    /// Overwrite `ttl` (used during forwarding and on retry-reset).
    pub fn set_ttl(&mut self, ttl: u8) {
        self.ttl = ttl;
    }
}

impl std::fmt::Debug for FrameHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameHeader")
            .field("magic", &format!("{:#010x}", self.magic()))
            .field("version", &self.version)
            .field("frame_type", &self.frame_type())
            .field("flags", &self.flags())
            .field("hops", &self.hops)
            .field("ttl", &self.ttl)
            .field("sequence", &self.sequence())
            .field("source_mac", &self.source_mac())
            .field("dest_mac", &self.dest_mac())
            .finish()
    }
}
