//! Wire codec for the fludmesh flood-routed mesh protocol.
//!
//! Everything here is pure encode/decode: no I/O, no clock, no radio. Higher
//! layers (`flud-core`, `flud-engine`) own the state machines that decide
//! *when* to build or forward a [`Frame`].

pub mod errors;
pub mod flags;
pub mod frame;
pub mod header;
pub mod mac;
pub mod payloads;

pub use errors::{ProtoError, Result};
pub use flags::{Capabilities, ContentType, FrameFlags, FrameType, Role, BATTERY_UNKNOWN};
pub use frame::{Body, Frame, RADIO_MTU};
pub use header::FrameHeader;
pub use mac::{MacAddr, ParseMacError};
pub use payloads::{AckBody, AckStatus, HelloBody, MessageBody, PrivateBody, PAYLOAD_CAP};
