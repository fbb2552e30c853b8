//! Property tests: arbitrary well-formed frames survive encode/decode.

use bytes::Bytes;
use flud_proto::flags::{Capabilities, ContentType, FrameFlags, FrameType, Role};
use flud_proto::frame::{Body, Frame};
use flud_proto::header::FrameHeader;
use flud_proto::mac::MacAddr;
use flud_proto::payloads::{AckBody, AckStatus, HelloBody, MessageBody, PrivateBody};
use proptest::prelude::*;

fn mac() -> impl Strategy<Value = MacAddr> {
    any::<[u8; 6]>().prop_map(MacAddr::new)
}

fn header(frame_type: FrameType) -> impl Strategy<Value = FrameHeader> {
    (mac(), mac(), any::<u32>(), 0u8..=16).prop_map(move |(src, dst, seq, ttl)| {
        FrameHeader::new(frame_type, FrameFlags::empty(), ttl, seq, src, dst)
    })
}

proptest! {
    #[test]
    fn hello_round_trips(
        header in header(FrameType::Hello),
        name in "[a-zA-Z0-9 ]{0,31}",
        battery in any::<u8>(),
    ) {
        let frame = Frame {
            header,
            body: Body::Hello(HelloBody {
                name,
                role: Role::Client,
                capabilities: Capabilities::empty(),
                battery,
            }),
        };
        let bytes = frame.encode().expect("encode");
        prop_assert_eq!(Frame::decode(&bytes).expect("decode"), frame);
    }

    #[test]
    fn message_round_trips(
        header in header(FrameType::Message),
        channel_name in "[a-zA-Z0-9_-]{1,31}",
        payload in prop::collection::vec(any::<u8>(), 0..=154),
    ) {
        let frame = Frame {
            header,
            body: Body::Message(MessageBody {
                message_id: 0,
                channel_name,
                content_type: ContentType::TEXT,
                payload: Bytes::from(payload),
            }),
        };
        let bytes = frame.encode().expect("encode");
        prop_assert_eq!(Frame::decode(&bytes).expect("decode"), frame);
    }

    #[test]
    fn private_round_trips(
        header in header(FrameType::Private),
        payload in prop::collection::vec(any::<u8>(), 0..=186),
    ) {
        let frame = Frame {
            header,
            body: Body::Private(PrivateBody {
                message_id: 0,
                content_type: ContentType::TEXT,
                payload: Bytes::from(payload),
            }),
        };
        let bytes = frame.encode().expect("encode");
        prop_assert_eq!(Frame::decode(&bytes).expect("decode"), frame);
    }

    #[test]
    fn ack_round_trips(header in header(FrameType::Ack), ack_sequence in any::<u32>(), success in any::<bool>()) {
        let frame = Frame {
            header,
            body: Body::Ack(AckBody {
                ack_sequence,
                status: if success { AckStatus::Success } else { AckStatus::Failure },
            }),
        };
        let bytes = frame.encode().expect("encode");
        prop_assert_eq!(Frame::decode(&bytes).expect("decode"), frame);
    }

    #[test]
    fn decode_never_panics_on_arbitrary_bytes(bytes in prop::collection::vec(any::<u8>(), 0..300)) {
        let _ = Frame::decode(&bytes);
    }
}
