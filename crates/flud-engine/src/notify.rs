//! Application-facing notifications (spec §4.9: callback registration for
//! message-received, message-status-change, device-added/updated,
//! packet-sent, packet-received).

use bytes::Bytes;
use flud_proto::{ContentType, FrameHeader, MacAddr};
use flud_storage::MessageStatus;

use crate::pending_ack::LogTarget;

/// One event the application may subscribe to.
#[derive(Debug, Clone)]
pub enum Notification {
    /// A frame was handed to the radio driver.
    PacketSent {
        /// Header of the frame that was sent.
        header: FrameHeader,
    },
    /// A frame arrived on the radio, before type-specific processing.
    PacketReceived {
        /// Header of the frame that was received.
        header: FrameHeader,
        /// Driver-reported originator (normally equal to `header.source_mac`).
        src_mac: MacAddr,
        /// Driver-reported signal strength, raw dBm.
        rssi: i8,
    },
    /// A channel or private message was delivered to this node.
    Message {
        /// Which log the message was appended to, if any.
        target: LogTarget,
        /// Originating peer.
        sender: MacAddr,
        /// Application content tag.
        content_type: ContentType,
        /// Message payload.
        payload: Bytes,
    },
    /// A previously sent message's log record changed status.
    StatusChange {
        /// Which log record changed.
        target: LogTarget,
        /// Index within that log.
        message_id: u32,
        /// New status.
        status: MessageStatus,
    },
    /// A peer was observed for the first time this session.
    DeviceAdded {
        /// The new peer's MAC address.
        mac: MacAddr,
    },
    /// A known peer's volatile state changed (HELLO re-seen).
    DeviceUpdated {
        /// The peer's MAC address.
        mac: MacAddr,
    },
}

/// Sink for engine/ingress notifications.
///
/// Blanket-implemented for any `Fn(Notification) + Send + Sync`, so callers
/// can register a plain closure instead of a named type.
pub trait NotificationSink: Send + Sync {
    /// Handle one notification.
    fn notify(&self, event: Notification);
}

impl<F> NotificationSink for F
where
    F: Fn(Notification) + Send + Sync,
{
    fn notify(&self, event: Notification) {
        self(event);
    }
}

/// A sink that discards every notification, for call sites that don't need
/// one (tests, headless tools).
pub struct NullSink;

impl NotificationSink for NullSink {
    fn notify(&self, _event: Notification) {}
}
