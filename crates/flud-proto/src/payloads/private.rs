//! PRIVATE body: addressed message between two peers.

use bytes::{Bytes, BytesMut};

use super::{check_payload_cap, PAYLOAD_CAP};
use crate::errors::{ProtoError, Result};
use crate::flags::ContentType;

/// Fixed prefix before the variable-length payload:
/// `message_id(4) | peer_secret(32) | content_type(1) | length(2)`.
const PREFIX_LEN: usize = 39;

/// Point-to-point addressed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivateBody {
    /// Local log index, transient on the wire (spec §3).
    pub message_id: u32,
    /// Application-defined content tag.
    pub content_type: ContentType,
    /// Message bytes, at most [`super::PAYLOAD_CAP`].
    pub payload: Bytes,
}

impl PrivateBody {
    /// Serialize to wire bytes.
    ///
    /// # Errors
    ///
    /// `PayloadTooLarge` if `payload` exceeds [`super::PAYLOAD_CAP`].
    pub fn encode(&self) -> Result<Bytes> {
        check_payload_cap(self.payload.len())?;
        let mut out = BytesMut::with_capacity(PREFIX_LEN + self.payload.len());
        out.extend_from_slice(&self.message_id.to_ne_bytes());
        out.extend_from_slice(&[0u8; 32]); // peer secret, reserved
        out.extend_from_slice(&[self.content_type.as_u8()]);
        #[allow(clippy::cast_possible_truncation)]
        out.extend_from_slice(&(self.payload.len() as u16).to_ne_bytes());
        out.extend_from_slice(&self.payload);
        Ok(out.freeze())
    }

    /// Parse from body bytes (header already stripped).
    ///
    /// # Errors
    ///
    /// `TruncatedBody` if the fixed prefix or declared payload is short.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < PREFIX_LEN {
            return Err(ProtoError::TruncatedBody { expected: PREFIX_LEN, actual: bytes.len() });
        }
        let message_id = u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let content_type = ContentType::from_u8(bytes[36]);
        let length = usize::from(u16::from_ne_bytes([bytes[37], bytes[38]]));
        if length > PAYLOAD_CAP {
            return Err(ProtoError::PayloadTooLarge { size: length, max: PAYLOAD_CAP });
        }
        let end = PREFIX_LEN + length;
        if bytes.len() < end {
            return Err(ProtoError::TruncatedBody { expected: end, actual: bytes.len() });
        }
        let payload = Bytes::copy_from_slice(&bytes[PREFIX_LEN..end]);
        Ok(Self { message_id, content_type, payload })
    }
}
