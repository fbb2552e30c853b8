//! A complete frame: fixed header plus a type-tagged body.

use bytes::{Bytes, BytesMut};

use crate::errors::{ProtoError, Result};
use crate::flags::FrameType;
use crate::header::FrameHeader;
use crate::payloads::{AckBody, HelloBody, MessageBody, PrivateBody};

/// Radio MTU for the target hardware (spec §1, §4.1). One frame, header plus
/// body, must never exceed this on the wire.
pub const RADIO_MTU: usize = 250;

/// A decoded or not-yet-encoded body, tagged by frame type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    /// Presence beacon.
    Hello(HelloBody),
    /// Channel broadcast chat.
    Message(MessageBody),
    /// Addressed private message.
    Private(PrivateBody),
    /// Acknowledgement.
    Ack(AckBody),
}

impl Body {
    /// The [`FrameType`] this body shape corresponds to.
    #[must_use]
    pub const fn frame_type(&self) -> FrameType {
        match self {
            Self::Hello(_) => FrameType::Hello,
            Self::Message(_) => FrameType::Message,
            Self::Private(_) => FrameType::Private,
            Self::Ack(_) => FrameType::Ack,
        }
    }

    fn encode(&self) -> Result<Bytes> {
        match self {
            Self::Hello(body) => Ok(Bytes::copy_from_slice(&body.encode())),
            Self::Message(body) => body.encode(),
            Self::Private(body) => body.encode(),
            Self::Ack(body) => Ok(Bytes::copy_from_slice(&body.encode())),
        }
    }

    fn decode(frame_type: FrameType, bytes: &[u8]) -> Result<Self> {
        match frame_type {
            FrameType::Hello => HelloBody::decode(bytes).map(Self::Hello),
            FrameType::Message => MessageBody::decode(bytes).map(Self::Message),
            FrameType::Private => PrivateBody::decode(bytes).map(Self::Private),
            FrameType::Ack => AckBody::decode(bytes).map(Self::Ack),
        }
    }
}

/// A header paired with its typed body; the unit the codec round-trips.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Fixed wire header.
    pub header: FrameHeader,
    /// Type-tagged body.
    pub body: Body,
}

impl Frame {
    /// Encode to the exact bytes transmitted over the radio.
    ///
    /// # Errors
    ///
    /// `PayloadTooLarge` if the body's variable-length payload exceeds the
    /// declared 200-byte cap, or `FrameTooLarge` if header + body would
    /// exceed [`RADIO_MTU`].
    pub fn encode(&self) -> Result<Bytes> {
        let body_bytes = self.body.encode()?;
        let total = FrameHeader::LEN + body_bytes.len();
        if total > RADIO_MTU {
            return Err(ProtoError::FrameTooLarge { size: total, mtu: RADIO_MTU });
        }
        let mut out = BytesMut::with_capacity(total);
        out.extend_from_slice(&self.header.encode());
        out.extend_from_slice(&body_bytes);
        Ok(out.freeze())
    }

    /// Decode a complete wire frame: header, dispatch by type, then body.
    ///
    /// # Errors
    ///
    /// Any [`ProtoError`] raised by header or body decoding, or
    /// `UnknownFrameType` if the header's type byte is unrecognized.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let header = FrameHeader::decode(bytes)?;
        let frame_type = header
            .frame_type()
            .ok_or(ProtoError::UnknownFrameType(header.frame_type_raw()))?;
        let body = Body::decode(frame_type, &bytes[FrameHeader::LEN..])?;
        Ok(Self { header, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::{Capabilities, ContentType, FrameFlags, Role};
    use crate::mac::MacAddr;

    fn hello_frame() -> Frame {
        Frame {
            header: FrameHeader::new(
                FrameType::Hello,
                FrameFlags::ACK_REQUIRED | FrameFlags::BROADCAST,
                5,
                1,
                MacAddr::new([1, 2, 3, 4, 5, 6]),
                MacAddr::BROADCAST,
            ),
            body: Body::Hello(HelloBody {
                name: "Alpha".to_string(),
                role: Role::Client,
                capabilities: Capabilities::empty(),
                battery: 90,
            }),
        }
    }

    #[test]
    fn round_trip_hello() {
        let frame = hello_frame();
        let bytes = frame.encode().expect("encode");
        assert_eq!(Frame::decode(&bytes).expect("decode"), frame);
    }

    #[test]
    fn message_effective_cap_is_mtu_derived() {
        let header = FrameHeader::new(
            FrameType::Message,
            FrameFlags::empty(),
            5,
            2,
            MacAddr::new([1, 2, 3, 4, 5, 6]),
            MacAddr::BROADCAST,
        );

        let fits = Frame {
            header,
            body: Body::Message(MessageBody {
                message_id: 0,
                channel_name: "general".to_string(),
                content_type: ContentType::TEXT,
                payload: Bytes::from(vec![b'x'; 154]),
            }),
        };
        assert!(fits.encode().is_ok());

        let overflows = Frame {
            header,
            body: Body::Message(MessageBody {
                message_id: 0,
                channel_name: "general".to_string(),
                content_type: ContentType::TEXT,
                payload: Bytes::from(vec![b'x'; 155]),
            }),
        };
        assert_eq!(
            overflows.encode(),
            Err(ProtoError::FrameTooLarge { size: 251, mtu: RADIO_MTU })
        );
    }

    #[test]
    fn private_effective_cap_is_mtu_derived() {
        let header = FrameHeader::new(
            FrameType::Private,
            FrameFlags::empty(),
            5,
            3,
            MacAddr::new([1, 2, 3, 4, 5, 6]),
            MacAddr::new([9, 9, 9, 9, 9, 9]),
        );

        let fits = Frame {
            header,
            body: Body::Private(PrivateBody {
                message_id: 0,
                content_type: ContentType::TEXT,
                payload: Bytes::from(vec![b'x'; 186]),
            }),
        };
        assert!(fits.encode().is_ok());

        let overflows = Frame {
            header,
            body: Body::Private(PrivateBody {
                message_id: 0,
                content_type: ContentType::TEXT,
                payload: Bytes::from(vec![b'x'; 187]),
            }),
        };
        assert!(overflows.encode().is_err());
    }

    #[test]
    fn unknown_frame_type_is_rejected() {
        let mut bytes = hello_frame().encode().expect("encode").to_vec();
        bytes[5] = 0x7F;
        assert_eq!(Frame::decode(&bytes), Err(ProtoError::UnknownFrameType(0x7F)));
    }
}
