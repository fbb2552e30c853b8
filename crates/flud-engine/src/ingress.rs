//! Ingress handler (spec §4.8, component C8): processes one inbound frame
//! from the radio driver's receive callback. Runs on the driver's thread;
//! callers serialise access to [`SharedState`] with the engine mutex.

use flud_core::{rssi_to_percent, PeerPersistent};
use flud_proto::{AckBody, AckStatus, Body, Frame, FrameFlags, FrameHeader, FrameType, MacAddr};
use flud_storage::{self, log, MessageStatus, StoredMessage};

use crate::notify::{Notification, NotificationSink};
use crate::pending_ack::LogTarget;
use crate::send_queue::SendQueueHandle;
use crate::state::SharedState;

/// Process one inbound frame.
///
/// `bytes`/`src_mac`/`rssi` come straight from the radio driver callback;
/// `now` is the engine mutex holder's current `clock_ms()` reading.
#[allow(clippy::too_many_arguments)]
pub fn handle_frame(
    state: &mut SharedState,
    queue: &SendQueueHandle,
    notify: &dyn NotificationSink,
    our_mac: MacAddr,
    max_ttl: u8,
    bytes: &[u8],
    src_mac: MacAddr,
    rssi: i8,
    now: u32,
) {
    let Ok(frame) = Frame::decode(bytes) else { return };
    if frame.header.source_mac() == our_mac {
        return;
    }
    let sequence = frame.header.sequence();
    let source = frame.header.source_mac();
    if state.cache.contains(sequence, source) {
        return;
    }
    // Cache insert precedes dispatch (spec §3 invariant 5, §4.2 ordering rule).
    state.cache.insert(sequence, source, now);
    notify.notify(Notification::PacketReceived { header: frame.header, src_mac, rssi });

    match &frame.body {
        Body::Hello(hello) => {
            handle_hello(state, queue, notify, our_mac, max_ttl, &frame, hello, rssi, now);
        }
        Body::Message(message) => {
            handle_message(state, queue, notify, our_mac, max_ttl, &frame, message, now);
        }
        Body::Private(private) => {
            handle_private(state, queue, notify, our_mac, max_ttl, &frame, private, now);
        }
        Body::Ack(ack) => handle_ack(state, queue, notify, our_mac, &frame, ack),
    }
}

fn send_ack(
    state: &mut SharedState,
    queue: &SendQueueHandle,
    our_mac: MacAddr,
    dest: MacAddr,
    max_ttl: u8,
    ack_sequence: u32,
) {
    let sequence = state.next_sequence();
    let header = FrameHeader::new(FrameType::Ack, FrameFlags::empty(), max_ttl, sequence, our_mac, dest);
    let frame = Frame { header, body: Body::Ack(AckBody { ack_sequence, status: AckStatus::Success }) };
    if let Ok(bytes) = frame.encode() {
        let _ = queue.enqueue(bytes);
    }
}

/// Shared forwarding rule (spec §4.8): copy, decrement `ttl`, increment
/// `hops`, set `FORWARDED`, re-enqueue. Dropped silently if `ttl == 0`.
fn forward(queue: &SendQueueHandle, frame: &Frame) {
    if frame.header.ttl() == 0 {
        return;
    }
    let mut forwarded = frame.clone();
    forwarded.header.set_ttl(forwarded.header.ttl() - 1);
    forwarded.header.set_hops(forwarded.header.hops().saturating_add(1));
    forwarded.header.set_flags(forwarded.header.flags() | FrameFlags::FORWARDED);
    if let Ok(bytes) = forwarded.encode() {
        let _ = queue.enqueue(bytes);
    }
}

#[allow(clippy::too_many_arguments)]
fn handle_hello(
    state: &mut SharedState,
    queue: &SendQueueHandle,
    notify: &dyn NotificationSink,
    our_mac: MacAddr,
    max_ttl: u8,
    frame: &Frame,
    hello: &flud_proto::HelloBody,
    rssi: i8,
    now: u32,
) {
    let source = frame.header.source_mac();
    let first_observation = state.peers.read_persistent(source).is_none();
    let persistent = PeerPersistent {
        mac: source,
        name: hello.name.clone(),
        role: hello.role,
        capabilities: hello.capabilities,
    };
    if let Err(err) = state.peers.write_persistent(&persistent) {
        tracing::warn!(peer = %source, error = %err, "failed to persist peer metadata");
    }

    let mut volatile = state.peers.get_volatile(source).unwrap_or_default();
    volatile.last_seen_ms = now;
    volatile.signal_strength = rssi_to_percent(rssi);
    volatile.hops = frame.header.hops();
    volatile.battery_level = hello.battery;
    if first_observation {
        volatile.unread_messages = 0;
    }
    state.peers.update_volatile(source, volatile);

    notify.notify(if first_observation {
        Notification::DeviceAdded { mac: source }
    } else {
        Notification::DeviceUpdated { mac: source }
    });

    if frame.header.flags().contains(FrameFlags::ACK_REQUIRED) {
        send_ack(state, queue, our_mac, source, max_ttl, frame.header.sequence());
    }
    forward(queue, frame);
}

fn handle_message(
    state: &mut SharedState,
    queue: &SendQueueHandle,
    notify: &dyn NotificationSink,
    our_mac: MacAddr,
    max_ttl: u8,
    frame: &Frame,
    message: &flud_proto::MessageBody,
    now: u32,
) {
    let source = frame.header.source_mac();
    if let Some((_, mut volatile)) = state.channels.find(&message.channel_name) {
        volatile.last_seen_ms = now;
        volatile.unread_messages = volatile.unread_messages.saturating_add(1);
        state.channels.update_volatile(&message.channel_name, volatile);

        let path = flud_storage::channel_log_path(&state.ctx, &message.channel_name);
        let record = StoredMessage {
            sender_mac: source,
            sequence: frame.header.sequence(),
            timestamp_ms: now,
            status: MessageStatus::Received,
            content_type: message.content_type,
            payload: message.payload.to_vec(),
        };
        if let Err(err) = log::append(&path, &record) {
            tracing::warn!(channel = %message.channel_name, error = %err, "failed to append channel message");
        }
    }
    // Unknown channel: skip storage but still forward and notify (spec §4.8).

    notify.notify(Notification::Message {
        target: LogTarget::Channel(message.channel_name.clone()),
        sender: source,
        content_type: message.content_type,
        payload: message.payload.clone(),
    });
    if frame.header.flags().contains(FrameFlags::ACK_REQUIRED) {
        send_ack(state, queue, our_mac, source, max_ttl, frame.header.sequence());
    }
    forward(queue, frame);
}

fn handle_private(
    state: &mut SharedState,
    queue: &SendQueueHandle,
    notify: &dyn NotificationSink,
    our_mac: MacAddr,
    max_ttl: u8,
    frame: &Frame,
    private: &flud_proto::PrivateBody,
    now: u32,
) {
    let source = frame.header.source_mac();
    // ACK fires unconditionally on request, regardless of whether we are
    // the final destination (spec §4.8).
    if frame.header.flags().contains(FrameFlags::ACK_REQUIRED) {
        send_ack(state, queue, our_mac, source, max_ttl, frame.header.sequence());
    }

    if frame.header.dest_mac() != our_mac {
        forward(queue, frame);
        return;
    }

    let mut volatile = state.peers.get_volatile(source).unwrap_or_default();
    volatile.unread_messages = volatile.unread_messages.saturating_add(1);
    state.peers.update_volatile(source, volatile);

    let path = flud_storage::peer_log_path(&state.ctx, source);
    let record = StoredMessage {
        sender_mac: source,
        sequence: frame.header.sequence(),
        timestamp_ms: now,
        status: MessageStatus::Received,
        content_type: private.content_type,
        payload: private.payload.to_vec(),
    };
    if let Err(err) = log::append(&path, &record) {
        tracing::warn!(peer = %source, error = %err, "failed to append private message");
    }

    notify.notify(Notification::Message {
        target: LogTarget::Peer(source),
        sender: source,
        content_type: private.content_type,
        payload: private.payload.clone(),
    });
}

fn handle_ack(
    state: &mut SharedState,
    queue: &SendQueueHandle,
    notify: &dyn NotificationSink,
    our_mac: MacAddr,
    frame: &Frame,
    ack: &AckBody,
) {
    if frame.header.dest_mac() != our_mac {
        forward(queue, frame);
        return;
    }

    let source = frame.header.source_mac();
    let Some(acknowledged) = state.pending_ack.remove(ack.ack_sequence, source) else { return };

    let status = match ack.status {
        AckStatus::Success => MessageStatus::Delivered,
        AckStatus::Failure => MessageStatus::DeliveryFailed,
    };
    let path = match &acknowledged.target {
        LogTarget::Peer(mac) => Some(flud_storage::peer_log_path(&state.ctx, *mac)),
        LogTarget::Channel(name) => Some(flud_storage::channel_log_path(&state.ctx, name)),
        LogTarget::None => None,
    };
    if let Some(path) = path {
        if let Err(err) = log::set_status(&path, u64::from(acknowledged.message_id), status) {
            tracing::warn!(error = %err, "failed to update message status on ack");
        }
    }
    notify.notify(Notification::StatusChange {
        target: acknowledged.target,
        message_id: acknowledged.message_id,
        status,
    });
}
