//! MESSAGE body: broadcast chat on a named channel.

use bytes::{Bytes, BytesMut};

use super::{check_payload_cap, read_fixed_str, write_fixed_str, PAYLOAD_CAP};
use crate::errors::{ProtoError, Result};
use crate::flags::ContentType;

/// Fixed prefix before the variable-length payload:
/// `message_id(4) | channel_name(32) | channel_secret(32) | content_type(1) | length(2)`.
const PREFIX_LEN: usize = 71;

/// Channel (broadcast) chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageBody {
    /// Local log index, transient on the wire (spec §3).
    pub message_id: u32,
    /// Channel name, truncated to 32 bytes on encode.
    pub channel_name: String,
    /// Application-defined content tag.
    pub content_type: ContentType,
    /// Message bytes, at most [`super::PAYLOAD_CAP`].
    pub payload: Bytes,
}

impl MessageBody {
    /// Serialize to wire bytes.
    ///
    /// # Errors
    ///
    /// `PayloadTooLarge` if `payload` exceeds [`super::PAYLOAD_CAP`].
    pub fn encode(&self) -> Result<Bytes> {
        check_payload_cap(self.payload.len())?;
        let mut out = BytesMut::with_capacity(PREFIX_LEN + self.payload.len());
        out.extend_from_slice(&self.message_id.to_ne_bytes());
        let mut channel_name = [0u8; 32];
        write_fixed_str(&mut channel_name, &self.channel_name);
        out.extend_from_slice(&channel_name);
        out.extend_from_slice(&[0u8; 32]); // channel secret, reserved
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
        let channel_name = read_fixed_str(&bytes[4..36]);
        let content_type = ContentType::from_u8(bytes[68]);
        let length = usize::from(u16::from_ne_bytes([bytes[69], bytes[70]]));
        if length > PAYLOAD_CAP {
            return Err(ProtoError::PayloadTooLarge { size: length, max: PAYLOAD_CAP });
        }
        let end = PREFIX_LEN + length;
        if bytes.len() < end {
            return Err(ProtoError::TruncatedBody { expected: end, actual: bytes.len() });
        }
        let payload = Bytes::copy_from_slice(&bytes[PREFIX_LEN..end]);
        Ok(Self { message_id, channel_name, content_type, payload })
    }
}
