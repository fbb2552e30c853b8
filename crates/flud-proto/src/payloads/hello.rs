//! HELLO body: presence beacon carrying the peer's persistent fields.

use super::{read_fixed_str, write_fixed_str};
use crate::errors::{ProtoError, Result};
use crate::flags::{Capabilities, Role};

/// Fixed-size HELLO body: `name(32) | role(1) | capabilities(1) | battery(1)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelloBody {
    /// Device name, truncated to 32 bytes on encode.
    pub name: String,
    /// Forwarding-policy role.
    pub role: Role,
    /// Capability bitmask.
    pub capabilities: Capabilities,
    /// Battery percent, or [`crate::flags::BATTERY_UNKNOWN`].
    pub battery: u8,
}

impl HelloBody {
    /// Encoded size in bytes.
    pub const LEN: usize = 35;

    /// Serialize to wire bytes.
    #[must_use]
    pub fn encode(&self) -> [u8; Self::LEN] {
        let mut out = [0u8; Self::LEN];
        write_fixed_str(&mut out[0..32], &self.name);
        out[32] = self.role.to_u8();
        out[33] = self.capabilities.to_byte();
        out[34] = self.battery;
        out
    }

    /// Parse from body bytes (header already stripped).
    ///
    /// # Errors
    ///
    /// `TruncatedBody` if fewer than [`Self::LEN`] bytes remain.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::LEN {
            return Err(ProtoError::TruncatedBody { expected: Self::LEN, actual: bytes.len() });
        }
        let name = read_fixed_str(&bytes[0..32]);
        let role = Role::from_u8(bytes[32]).unwrap_or(Role::Client);
        let capabilities = Capabilities::from_byte(bytes[33]);
        let battery = bytes[34];
        Ok(Self { name, role, capabilities, battery })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let body = HelloBody {
            name: "Alpha".to_string(),
            role: Role::Router,
            capabilities: Capabilities::POWER_SAVE | Capabilities::STORAGE,
            battery: 77,
        };
        let bytes = body.encode();
        assert_eq!(HelloBody::decode(&bytes).expect("decode"), body);
    }

    #[test]
    fn name_is_nul_padded_and_truncated() {
        let long_name = "x".repeat(64);
        let body = HelloBody {
            name: long_name,
            role: Role::Client,
            capabilities: Capabilities::empty(),
            battery: 255,
        };
        let bytes = body.encode();
        assert_eq!(&bytes[0..32], &[b'x'; 32][..]);
        let decoded = HelloBody::decode(&bytes).expect("decode");
        assert_eq!(decoded.name.len(), 32);
    }

    #[test]
    fn unknown_role_byte_falls_back_to_client() {
        let mut bytes = [0u8; HelloBody::LEN];
        bytes[32] = 0xEE;
        let decoded = HelloBody::decode(&bytes).expect("decode");
        assert_eq!(decoded.role, Role::Client);
    }

    #[test]
    fn rejects_truncated_body() {
        assert!(HelloBody::decode(&[0u8; 10]).is_err());
    }
}
