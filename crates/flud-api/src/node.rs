//! The public, thread-safe node handle (spec §4.9, component C9).
#![allow(clippy::expect_used, reason = "Mutex poisoning should cause a panic")]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;

use bytes::Bytes;
use flud_core::{validate_channel_name, ChannelPersistent, Environment, PeerPersistent};
use flud_proto::{
    AckBody, AckStatus, Body, Capabilities, ContentType, Frame, FrameFlags, FrameHeader, FrameType,
    HelloBody, MacAddr, MessageBody, PrivateBody, Role,
};
use flud_storage::{log, MessageStatus, StoredMessage};

use flud_engine::{engine, ingress, EngineConfig, Notification, NotificationSink, SendQueue, SendQueueHandle, SharedState};

use crate::callbacks::CallbackRegistry;
use crate::config::NodeConfig;
use crate::errors::{ApiError, Result};

/// Thread-safe handle to one fludmesh node.
///
/// Owns the engine mutex (spec §5), the bounded send queue's producer, and
/// — until [`Self::start`] takes it — its consumer half. `E` is the
/// environment the caller's radio driver, clock and RNG are wired through.
pub struct Node<E: Environment> {
    env: E,
    our_mac: MacAddr,
    config: NodeConfig,
    state: Arc<Mutex<SharedState>>,
    queue_handle: SendQueueHandle,
    queue: Mutex<Option<SendQueue>>,
    notify: Arc<CallbackRegistry>,
    engine_handle: Mutex<Option<JoinHandle<()>>>,
    stop_flag: Arc<AtomicBool>,
    running: AtomicBool,
}

impl<E: Environment> Node<E> {
    /// Bring a node up: validate `config`, lay out the on-disk directories,
    /// and seed the sequence counter from `env`'s RNG (spec §4.9 `init`).
    ///
    /// `our_mac` is this node's own hardware address. This core's `Radio`
    /// trait has no method to query it from the driver, so the caller
    /// supplies it directly rather than `init` reading it itself.
    ///
    /// # Errors
    ///
    /// `InvalidArg` if any range-constrained field of `config` is out of
    /// bounds, `Io` if the on-disk layout cannot be created.
    pub fn init(env: E, our_mac: MacAddr, config: NodeConfig) -> Result<Self> {
        config.validate()?;
        std::fs::create_dir_all(config.context_path.join("devices"))?;
        std::fs::create_dir_all(config.context_path.join("channels"))?;

        let initial_sequence = env.random_u32();
        let state = SharedState::new(&config.context_path, config.cache_capacity, initial_sequence);
        let (queue_handle, queue) = SendQueue::bounded(config.queue_depth);
        env.add_broadcast_peer(&config.channel.to_string())?;

        Ok(Self {
            env,
            our_mac,
            config,
            state: Arc::new(Mutex::new(state)),
            queue_handle,
            queue: Mutex::new(Some(queue)),
            notify: Arc::new(CallbackRegistry::new()),
            engine_handle: Mutex::new(None),
            stop_flag: Arc::new(AtomicBool::new(false)),
            running: AtomicBool::new(false),
        })
    }

    /// Spawn the engine task on a dedicated OS thread (spec §4.9 `start`).
    ///
    /// # Errors
    ///
    /// `InvalidState` if the node is already running, or was started and
    /// stopped once already — the send queue's consumer half is moved into
    /// the engine thread and cannot be reclaimed, so only one start/stop
    /// cycle is supported per `init`.
    pub fn start(&self) -> Result<()> {
        if self.running.swap(true, Ordering::AcqRel) {
            return Err(ApiError::InvalidState("node is already running"));
        }
        let Some(queue) = self.queue.lock().expect("engine mutex poisoned").take() else {
            self.running.store(false, Ordering::Release);
            return Err(ApiError::InvalidState("engine already consumed its send queue"));
        };

        self.stop_flag.store(false, Ordering::Release);
        let engine_config = EngineConfig {
            our_name: self.config.name.clone(),
            our_role: self.config.role,
            our_capabilities: self.config.capabilities,
            battery: self.config.battery,
            hello_interval_ms: self.config.hello_interval_secs.saturating_mul(1000),
            max_ttl: self.config.max_ttl,
        };

        let env = self.env.clone();
        let state = self.state.clone();
        let queue_handle = self.queue_handle.clone();
        let notify: Arc<dyn NotificationSink> = self.notify.clone();
        let our_mac = self.our_mac;
        let stop = self.stop_flag.clone();

        let handle = std::thread::spawn(move || {
            engine::run(&env, state, queue, queue_handle, notify, our_mac, engine_config, stop);
        });
        *self.engine_handle.lock().expect("engine mutex poisoned") = Some(handle);
        Ok(())
    }

    /// Signal the engine task to stop and wait for it to exit (spec §4.9
    /// `stop`).
    ///
    /// # Errors
    ///
    /// `InvalidState` if the node is not currently running.
    pub fn stop(&self) -> Result<()> {
        if !self.running.swap(false, Ordering::AcqRel) {
            return Err(ApiError::InvalidState("node is not running"));
        }
        self.stop_flag.store(true, Ordering::Release);
        if let Some(handle) = self.engine_handle.lock().expect("engine mutex poisoned").take() {
            let _ = handle.join();
        }
        Ok(())
    }

    /// Tear a node down: `stop` first if still running, then release the
    /// environment's driver resources (spec §4.9 `deinit`).
    pub fn deinit(self) {
        if self.running.load(Ordering::Acquire) {
            let _ = self.stop();
        }
        self.env.deinit();
    }

    fn lock_state(&self) -> MutexGuard<'_, SharedState> {
        self.state.lock().expect("engine mutex poisoned")
    }

    fn enqueue_frame(&self, frame: Frame) -> Result<()> {
        let bytes = frame.encode()?;
        self.queue_handle.enqueue(bytes)?;
        Ok(())
    }

    /// Register a callback, invoked for every subsequent notification
    /// (spec §4.9: message-received, message-status-change,
    /// device-added/updated, packet-sent, packet-received).
    pub fn register_callback(&self, callback: impl Fn(Notification) + Send + Sync + 'static) {
        self.notify.register(callback);
    }

    /// Bridge for the radio driver's receive callback (spec §6, "Radio
    /// driver contract"). Runs synchronously on the driver's thread.
    pub fn on_receive(&self, bytes: &[u8], src_mac: MacAddr, rssi: i8) {
        let now = self.env.now_ms();
        let mut state = self.lock_state();
        ingress::handle_frame(
            &mut state,
            &self.queue_handle,
            self.notify.as_ref(),
            self.our_mac,
            self.config.max_ttl,
            bytes,
            src_mac,
            rssi,
            now,
        );
    }

    /// Broadcast an unsolicited HELLO (spec §4.9).
    ///
    /// # Errors
    ///
    /// `NoMemory` if the send queue is full.
    pub fn send_hello(&self) -> Result<()> {
        let sequence = self.lock_state().next_sequence();
        let header = FrameHeader::new(
            FrameType::Hello,
            FrameFlags::ACK_REQUIRED | FrameFlags::BROADCAST,
            self.config.max_ttl,
            sequence,
            self.our_mac,
            MacAddr::BROADCAST,
        );
        let frame = Frame {
            header,
            body: Body::Hello(HelloBody {
                name: self.config.name.clone(),
                role: self.config.role,
                capabilities: self.config.capabilities,
                battery: self.config.battery,
            }),
        };
        self.enqueue_frame(frame)
    }

    /// Send an addressed message to `dest`, appending it to that peer's
    /// message log with status `Sent` before handing it to the send queue
    /// (spec §4.9: "encode PRIVATE with `ACK_REQUIRED`").
    ///
    /// # Errors
    ///
    /// `InvalidSize` if `payload` exceeds [`flud_proto::PAYLOAD_CAP`], `Io`
    /// on a log-append failure, `NoMemory` if the send queue is full.
    pub fn send_private_message(&self, dest: MacAddr, payload: &[u8], content_type: ContentType) -> Result<u32> {
        if payload.len() > flud_proto::PAYLOAD_CAP {
            return Err(ApiError::InvalidSize { size: payload.len(), max: flud_proto::PAYLOAD_CAP });
        }
        let now = self.env.now_ms();
        let mut state = self.lock_state();
        let sequence = state.next_sequence();
        let path = flud_storage::peer_log_path(&state.ctx, dest);
        let message_id = log::append(
            &path,
            &StoredMessage {
                sender_mac: self.our_mac,
                sequence,
                timestamp_ms: now,
                status: MessageStatus::Sent,
                content_type,
                payload: payload.to_vec(),
            },
        )?;
        drop(state);

        let header = FrameHeader::new(FrameType::Private, FrameFlags::ACK_REQUIRED, self.config.max_ttl, sequence, self.our_mac, dest);
        let frame = Frame {
            header,
            body: Body::Private(PrivateBody {
                message_id: message_id as u32,
                content_type,
                payload: Bytes::copy_from_slice(payload),
            }),
        };
        self.enqueue_frame(frame)?;
        Ok(message_id as u32)
    }

    /// Send a broadcast message on `channel`, appending it to that
    /// channel's message log with status `Sent` (spec §4.9).
    ///
    /// # Errors
    ///
    /// `InvalidSize` if `payload` exceeds the payload cap, `Io` on a
    /// log-append failure, `NoMemory` if the send queue is full.
    pub fn send_channel_message(&self, channel: &str, payload: &[u8], content_type: ContentType) -> Result<u32> {
        if payload.len() > flud_proto::PAYLOAD_CAP {
            return Err(ApiError::InvalidSize { size: payload.len(), max: flud_proto::PAYLOAD_CAP });
        }
        let now = self.env.now_ms();
        let mut state = self.lock_state();
        let sequence = state.next_sequence();
        let path = flud_storage::channel_log_path(&state.ctx, channel);
        let message_id = log::append(
            &path,
            &StoredMessage {
                sender_mac: self.our_mac,
                sequence,
                timestamp_ms: now,
                status: MessageStatus::Sent,
                content_type,
                payload: payload.to_vec(),
            },
        )?;
        drop(state);

        let header = FrameHeader::new(
            FrameType::Message,
            FrameFlags::ACK_REQUIRED | FrameFlags::BROADCAST,
            self.config.max_ttl,
            sequence,
            self.our_mac,
            MacAddr::BROADCAST,
        );
        let frame = Frame {
            header,
            body: Body::Message(MessageBody {
                message_id: message_id as u32,
                channel_name: channel.to_string(),
                content_type,
                payload: Bytes::copy_from_slice(payload),
            }),
        };
        self.enqueue_frame(frame)?;
        Ok(message_id as u32)
    }

    /// Acknowledge a previously received frame. Unlike every other frame
    /// shape this node originates, an ACK never carries `ACK_REQUIRED`
    /// (spec §4.9).
    ///
    /// # Errors
    ///
    /// `NoMemory` if the send queue is full.
    pub fn send_ack(&self, dest: MacAddr, ack_sequence: u32, status: AckStatus) -> Result<()> {
        let sequence = self.lock_state().next_sequence();
        let header = FrameHeader::new(FrameType::Ack, FrameFlags::empty(), self.config.max_ttl, sequence, self.our_mac, dest);
        let frame = Frame { header, body: Body::Ack(AckBody { ack_sequence, status }) };
        self.enqueue_frame(frame)
    }

    /// Register (or overwrite) a peer's persistent metadata by hand,
    /// rather than waiting for a HELLO (spec §4.9 `add_device`).
    ///
    /// # Errors
    ///
    /// `Io` on any filesystem failure.
    pub fn add_device(&self, mac: MacAddr, name: impl Into<String>, role: Role, capabilities: Capabilities) -> Result<()> {
        let record = PeerPersistent { mac, name: name.into(), role, capabilities };
        self.lock_state().peers.write_persistent(&record)?;
        Ok(())
    }

    /// Forget a peer (spec §4.9 `remove_device`).
    ///
    /// # Errors
    ///
    /// `Io` on any filesystem failure.
    pub fn remove_device(&self, mac: MacAddr) -> Result<()> {
        self.lock_state().peers.remove(mac)?;
        Ok(())
    }

    /// Walk every known peer, calling `visit` with `(mac, persistent)`
    /// until it returns `false` (spec §4.9 `enum_devices`).
    ///
    /// # Errors
    ///
    /// `Io` if the devices directory exists but cannot be read.
    pub fn enum_devices(&self, visit: impl FnMut(MacAddr, &PeerPersistent) -> bool) -> Result<()> {
        self.lock_state().peers.enumerate(visit)?;
        Ok(())
    }

    /// Declare a new channel. Rejects an invalid name (`/`, `..`, more than
    /// 31 characters) before it ever touches the filesystem (spec §4.9,
    /// §8 boundary behaviour).
    ///
    /// # Errors
    ///
    /// `InvalidArg` if `name` is invalid, `Io` on any filesystem failure.
    pub fn add_channel(&self, name: &str) -> Result<()> {
        validate_channel_name(name)?;
        self.lock_state().channels.write_persistent(&ChannelPersistent::new(name))?;
        Ok(())
    }

    /// Forget a channel (spec §4.9 `remove_channel`).
    ///
    /// # Errors
    ///
    /// `Io` on any filesystem failure.
    pub fn remove_channel(&self, name: &str) -> Result<()> {
        self.lock_state().channels.remove(name)?;
        Ok(())
    }

    /// Walk every known channel, calling `visit` until it returns `false`
    /// (spec §4.9 `enum_channels`).
    ///
    /// # Errors
    ///
    /// `Io` if the channels directory exists but cannot be read.
    pub fn enum_channels(&self, visit: impl FnMut(&ChannelPersistent) -> bool) -> Result<()> {
        self.lock_state().channels.enumerate(visit)?;
        Ok(())
    }

    /// Number of stored records in a peer's message log (spec §4.9
    /// `get_message_count`, peer variant).
    ///
    /// # Errors
    ///
    /// `Io` on any filesystem failure.
    pub fn get_peer_message_count(&self, mac: MacAddr) -> Result<u64> {
        let state = self.lock_state();
        let path = flud_storage::peer_log_path(&state.ctx, mac);
        Ok(log::count(&path)?)
    }

    /// Number of stored records in a channel's message log (spec §4.9
    /// `get_message_count`, channel variant).
    ///
    /// # Errors
    ///
    /// `Io` on any filesystem failure.
    pub fn get_channel_message_count(&self, channel: &str) -> Result<u64> {
        let state = self.lock_state();
        let path = flud_storage::channel_log_path(&state.ctx, channel);
        Ok(log::count(&path)?)
    }

    /// Load up to `count` records starting at `start` from a peer's
    /// message log (spec §4.9 `load_messages`, peer variant).
    ///
    /// # Errors
    ///
    /// `Io` on any filesystem failure.
    pub fn load_peer_messages(&self, mac: MacAddr, start: u64, count: u64) -> Result<Vec<StoredMessage>> {
        let state = self.lock_state();
        let path = flud_storage::peer_log_path(&state.ctx, mac);
        Ok(log::load_page(&path, start, count)?)
    }

    /// Load up to `count` records starting at `start` from a channel's
    /// message log (spec §4.9 `load_messages`, channel variant).
    ///
    /// # Errors
    ///
    /// `Io` on any filesystem failure.
    pub fn load_channel_messages(&self, channel: &str, start: u64, count: u64) -> Result<Vec<StoredMessage>> {
        let state = self.lock_state();
        let path = flud_storage::channel_log_path(&state.ctx, channel);
        Ok(log::load_page(&path, start, count)?)
    }

    /// Overwrite the status of one record in a peer's message log (spec
    /// §4.9 `update_message_status`, peer variant).
    ///
    /// # Errors
    ///
    /// `NotFound` if `index` is out of range, `Io` on any other
    /// filesystem failure.
    pub fn update_peer_message_status(&self, mac: MacAddr, index: u64, status: MessageStatus) -> Result<()> {
        let state = self.lock_state();
        let path = flud_storage::peer_log_path(&state.ctx, mac);
        Ok(log::set_status(&path, index, status)?)
    }

    /// Overwrite the status of one record in a channel's message log (spec
    /// §4.9 `update_message_status`, channel variant).
    ///
    /// # Errors
    ///
    /// `NotFound` if `index` is out of range, `Io` on any other
    /// filesystem failure.
    pub fn update_channel_message_status(&self, channel: &str, index: u64, status: MessageStatus) -> Result<()> {
        let state = self.lock_state();
        let path = flud_storage::channel_log_path(&state.ctx, channel);
        Ok(log::set_status(&path, index, status)?)
    }

    /// Delete a peer's entire message log (spec §4.9 `clear_chat`, peer
    /// variant).
    ///
    /// # Errors
    ///
    /// `Io` on any filesystem failure.
    pub fn clear_peer_chat(&self, mac: MacAddr) -> Result<()> {
        let state = self.lock_state();
        let path = flud_storage::peer_log_path(&state.ctx, mac);
        Ok(log::clear(&path)?)
    }

    /// Delete a channel's entire message log (spec §4.9 `clear_chat`,
    /// channel variant).
    ///
    /// # Errors
    ///
    /// `Io` on any filesystem failure.
    pub fn clear_channel_chat(&self, channel: &str) -> Result<()> {
        let state = self.lock_state();
        let path = flud_storage::channel_log_path(&state.ctx, channel);
        Ok(log::clear(&path)?)
    }

    /// Reset a peer's unread-message counter (spec §4.9 `mark_read`, peer
    /// variant).
    ///
    /// # Errors
    ///
    /// `NotFound` if the peer has never been observed this session.
    pub fn mark_peer_read(&self, mac: MacAddr) -> Result<()> {
        let mut state = self.lock_state();
        let mut volatile = state.peers.get_volatile(mac).ok_or(ApiError::NotFound)?;
        volatile.unread_messages = 0;
        state.peers.update_volatile(mac, volatile);
        Ok(())
    }

    /// Reset a channel's unread-message counter (spec §4.9 `mark_read`,
    /// channel variant). The channel side lazily creates its volatile row,
    /// so unlike the peer variant this cannot fail.
    pub fn mark_channel_read(&self, channel: &str) {
        let mut state = self.lock_state();
        let mut volatile = state.channels.get_volatile(channel);
        volatile.unread_messages = 0;
        state.channels.update_volatile(channel, volatile);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicU32;

    use flud_core::{Clock, Radio, Rng};

    use super::*;

    #[derive(Clone)]
    struct FakeEnv {
        now: Arc<AtomicU32>,
        sent: Arc<Mutex<Vec<Bytes>>>,
    }

    impl FakeEnv {
        fn new() -> Self {
            Self { now: Arc::new(AtomicU32::new(1000)), sent: Arc::new(Mutex::new(Vec::new())) }
        }
    }

    impl Clock for FakeEnv {
        fn now_ms(&self) -> u32 {
            self.now.load(Ordering::Relaxed)
        }
    }
    impl Rng for FakeEnv {
        fn random_u32(&self) -> u32 {
            42
        }
    }
    impl Radio for FakeEnv {
        fn send_broadcast(&self, bytes: &[u8]) -> flud_core::Result<()> {
            self.sent.lock().expect("sent mutex poisoned").push(Bytes::copy_from_slice(bytes));
            Ok(())
        }
    }

    fn test_node(dir: &std::path::Path) -> Node<FakeEnv> {
        let config = NodeConfig::new("Alpha", dir);
        Node::init(FakeEnv::new(), MacAddr::new([1, 0, 0, 0, 0, 0]), config).expect("init")
    }

    #[test]
    fn init_rejects_invalid_config() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = NodeConfig::new("Alpha", dir.path());
        config.channel = 99;
        assert!(matches!(Node::init(FakeEnv::new(), MacAddr::new([1; 6]), config), Err(ApiError::InvalidArg(_))));
    }

    #[test]
    fn double_start_is_invalid_state() {
        let dir = tempfile::tempdir().expect("tempdir");
        let node = test_node(dir.path());
        node.start().expect("first start");
        assert!(matches!(node.start(), Err(ApiError::InvalidState(_))));
        node.stop().expect("stop");
    }

    #[test]
    fn stop_without_start_is_invalid_state() {
        let dir = tempfile::tempdir().expect("tempdir");
        let node = test_node(dir.path());
        assert!(matches!(node.stop(), Err(ApiError::InvalidState(_))));
    }

    #[test]
    fn send_private_message_appends_sent_record_and_enqueues_frame() {
        let dir = tempfile::tempdir().expect("tempdir");
        let node = test_node(dir.path());
        let dest = MacAddr::new([2, 0, 0, 0, 0, 0]);

        let message_id = node.send_private_message(dest, b"hi", ContentType::TEXT).expect("send");

        let records = node.load_peer_messages(dest, 0, 10).expect("load");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, MessageStatus::Sent);
        assert_eq!(records[0].payload, b"hi");

        let queued = node.queue.lock().expect("queue mutex poisoned");
        let bytes = queued.as_ref().expect("queue not yet taken").dequeue().expect("frame queued");
        let frame = Frame::decode(&bytes).expect("decode");
        let Body::Private(private) = frame.body else { panic!("expected PRIVATE body") };
        assert_eq!(private.message_id, message_id);
        assert_eq!(frame.header.dest_mac(), dest);
    }

    #[test]
    fn send_private_message_rejects_oversized_payload() {
        let dir = tempfile::tempdir().expect("tempdir");
        let node = test_node(dir.path());
        let payload = vec![0u8; flud_proto::PAYLOAD_CAP + 1];
        assert!(matches!(
            node.send_private_message(MacAddr::new([2; 6]), &payload, ContentType::TEXT),
            Err(ApiError::InvalidSize { .. })
        ));
    }

    #[test]
    fn add_channel_rejects_invalid_name_without_touching_filesystem() {
        let dir = tempfile::tempdir().expect("tempdir");
        let node = test_node(dir.path());
        assert!(matches!(node.add_channel("a/b"), Err(ApiError::InvalidArg(_))));
        assert!(!dir.path().join("channels").join("a/b").exists());
    }

    #[test]
    fn add_channel_then_enum_channels_sees_it() {
        let dir = tempfile::tempdir().expect("tempdir");
        let node = test_node(dir.path());
        node.add_channel("general").expect("add_channel");

        let mut seen = Vec::new();
        node.enum_channels(|record| {
            seen.push(record.name.clone());
            true
        })
        .expect("enum_channels");
        assert_eq!(seen, vec!["general".to_string()]);
    }

    #[test]
    fn register_callback_fires_on_first_hello_from_a_peer() {
        let dir = tempfile::tempdir().expect("tempdir");
        let node = test_node(dir.path());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen2 = seen.clone();
        node.register_callback(move |event| {
            if let Notification::DeviceAdded { mac } = event {
                seen2.lock().expect("seen mutex poisoned").push(mac);
            }
        });

        let peer = MacAddr::new([9, 9, 9, 9, 9, 9]);
        let header = FrameHeader::new(FrameType::Hello, FrameFlags::BROADCAST, 5, 0, peer, MacAddr::BROADCAST);
        let frame = Frame {
            header,
            body: Body::Hello(HelloBody {
                name: "Peer".to_string(),
                role: Role::Client,
                capabilities: Capabilities::empty(),
                battery: 50,
            }),
        };
        let bytes = frame.encode().expect("encode");
        node.on_receive(&bytes, peer, -40);

        assert_eq!(seen.lock().expect("seen mutex poisoned").as_slice(), &[peer]);
    }

    #[test]
    fn mark_peer_read_requires_a_previously_observed_peer() {
        let dir = tempfile::tempdir().expect("tempdir");
        let node = test_node(dir.path());
        assert!(matches!(node.mark_peer_read(MacAddr::new([3; 6])), Err(ApiError::NotFound)));
    }
}
