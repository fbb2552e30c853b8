//! Engine task (spec §4.7, component C7): the single cooperative loop that
//! owns outbound transmission, periodic HELLO beaconing, dup-cache GC, and
//! the pending-ACK sweep.
#![allow(clippy::expect_used, reason = "Mutex poisoning should cause a panic")]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use flud_core::{Clock, Environment, Radio};
use flud_proto::{
    Body, Capabilities, Frame, FrameFlags, FrameHeader, FrameType, HelloBody, MacAddr, Role,
};
use flud_storage::{log, MessageStatus};

use crate::notify::{Notification, NotificationSink};
use crate::pending_ack::{FailedDelivery, LogTarget};
use crate::send_queue::{SendQueue, SendQueueHandle};
use crate::state::SharedState;

/// Dup-cache GC cadence (spec §4.7).
pub const CACHE_GC_INTERVAL_MS: u32 = 5 * 60 * 1000;

/// Pending-ACK sweep cadence (spec §4.7: "at most once per second").
pub const ACK_SCAN_INTERVAL_MS: u32 = 1000;

/// Static identity and timing knobs the engine task needs to build its own
/// HELLO beacons (spec §4.7, §4.9 `init`).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Our own device name, carried in every HELLO.
    pub our_name: String,
    /// Our own forwarding role.
    pub our_role: Role,
    /// Our own capability bitmask.
    pub our_capabilities: Capabilities,
    /// Battery percent, or [`flud_proto::BATTERY_UNKNOWN`].
    pub battery: u8,
    /// How often to emit an unsolicited HELLO, in milliseconds.
    pub hello_interval_ms: u32,
    /// Max hop budget stamped on frames this node originates.
    pub max_ttl: u8,
}

fn build_hello_frame(our_mac: MacAddr, sequence: u32, config: &EngineConfig) -> Frame {
    let header = FrameHeader::new(
        FrameType::Hello,
        FrameFlags::ACK_REQUIRED | FrameFlags::BROADCAST,
        config.max_ttl,
        sequence,
        our_mac,
        MacAddr::BROADCAST,
    );
    Frame {
        header,
        body: Body::Hello(HelloBody {
            name: config.our_name.clone(),
            role: config.our_role,
            capabilities: config.our_capabilities,
            battery: config.battery,
        }),
    }
}

fn enqueue_hello(state: &Mutex<SharedState>, queue_handle: &SendQueueHandle, our_mac: MacAddr, config: &EngineConfig) {
    let sequence = state.lock().expect("engine mutex poisoned").next_sequence();
    if let Ok(bytes) = build_hello_frame(our_mac, sequence, config).encode() {
        let _ = queue_handle.enqueue(bytes);
    }
}

fn log_path_for(state: &SharedState, target: &LogTarget) -> Option<std::path::PathBuf> {
    match target {
        LogTarget::Peer(mac) => Some(flud_storage::peer_log_path(&state.ctx, *mac)),
        LogTarget::Channel(name) => Some(flud_storage::channel_log_path(&state.ctx, name)),
        LogTarget::None => None,
    }
}

fn apply_failed_delivery(state: &Mutex<SharedState>, failed: &FailedDelivery) {
    let guard = state.lock().expect("engine mutex poisoned");
    let path = log_path_for(&guard, &failed.target);
    drop(guard);
    let Some(path) = path else { return };
    if let Err(err) = log::set_status(&path, u64::from(failed.message_id), MessageStatus::DeliveryFailed) {
        tracing::warn!(error = %err, "failed to flip delivery-failed status");
    }
}

/// Run the engine task's cooperative loop until `stop` is set.
///
/// Blocks this thread; callers spawn it on a dedicated OS thread (spec
/// §4.9 `start`/`stop`). On exit, drains the send queue and drops the
/// pending-ACK table, abandoning in-flight entries at whatever status they
/// last had (spec §5, "Cancellation and timeouts").
#[allow(clippy::too_many_arguments)]
pub fn run<E: Environment>(
    env: &E,
    state: Arc<Mutex<SharedState>>,
    queue: SendQueue,
    queue_handle: SendQueueHandle,
    notify: Arc<dyn NotificationSink>,
    our_mac: MacAddr,
    config: EngineConfig,
    stop: Arc<AtomicBool>,
) {
    enqueue_hello(&state, &queue_handle, our_mac, &config);

    let mut last_beacon = env.now_ms();
    let mut last_gc = 0u32;
    let mut last_ack_scan = 0u32;

    while !stop.load(Ordering::Relaxed) {
        if let Some(item) = queue.dequeue() {
            match env.send_broadcast(&item) {
                Ok(()) => {
                    if let Ok(frame) = Frame::decode(&item) {
                        let needs_tracking = frame.header.frame_type() != Some(FrameType::Ack)
                            && frame.header.flags().contains(FrameFlags::ACK_REQUIRED)
                            && !frame.header.flags().contains(FrameFlags::RETRY);
                        if needs_tracking {
                            state.lock().expect("engine mutex poisoned").pending_ack.add(item.clone(), env.now_ms());
                        }
                        notify.notify(Notification::PacketSent { header: frame.header });
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, "radio send failed; frame dropped, not requeued");
                }
            }
        }

        let now = env.now_ms();
        if now.wrapping_sub(last_beacon) >= config.hello_interval_ms {
            enqueue_hello(&state, &queue_handle, our_mac, &config);
            last_beacon = now;
        }
        if now.wrapping_sub(last_gc) >= CACHE_GC_INTERVAL_MS {
            state.lock().expect("engine mutex poisoned").cache.sweep(now);
            last_gc = now;
        }
        if now.wrapping_sub(last_ack_scan) >= ACK_SCAN_INTERVAL_MS {
            let (retries, failures) = state.lock().expect("engine mutex poisoned").pending_ack.sweep(now, config.max_ttl);
            for retry in retries {
                let _ = queue_handle.enqueue(retry);
            }
            for failed in &failures {
                apply_failed_delivery(&state, failed);
                notify.notify(Notification::StatusChange {
                    target: failed.target.clone(),
                    message_id: failed.message_id,
                    status: MessageStatus::DeliveryFailed,
                });
            }
            last_ack_scan = now;
        }
    }

    queue.drain();
    state.lock().expect("engine mutex poisoned").pending_ack = crate::pending_ack::PendingAckTable::new();
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicU32;

    use flud_core::Rng;

    use super::*;
    use crate::notify::NullSink;

    #[derive(Clone)]
    struct FakeEnv {
        now: Arc<AtomicU32>,
        sent: Arc<Mutex<Vec<bytes::Bytes>>>,
    }

    impl Clock for FakeEnv {
        fn now_ms(&self) -> u32 {
            self.now.load(Ordering::Relaxed)
        }
    }
    impl Rng for FakeEnv {
        fn random_u32(&self) -> u32 {
            7
        }
    }
    impl flud_core::Radio for FakeEnv {
        fn send_broadcast(&self, bytes: &[u8]) -> flud_core::Result<()> {
            self.sent.lock().unwrap().push(bytes::Bytes::copy_from_slice(bytes));
            Ok(())
        }
    }

    fn config() -> EngineConfig {
        EngineConfig {
            our_name: "Node".to_string(),
            our_role: Role::Client,
            our_capabilities: Capabilities::empty(),
            battery: 80,
            hello_interval_ms: 60_000,
            max_ttl: 5,
        }
    }

    #[test]
    fn startup_sends_initial_hello_and_tracks_it_for_ack() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = Arc::new(Mutex::new(SharedState::new(dir.path(), 8, 0)));
        let (queue_handle, queue) = SendQueue::bounded(8);
        let env = FakeEnv { now: Arc::new(AtomicU32::new(0)), sent: Arc::new(Mutex::new(Vec::new())) };
        let stop = Arc::new(AtomicBool::new(false));

        // Run one iteration's worth of work manually by stopping right away;
        // the loop condition is checked before blocking on dequeue, so flip
        // `stop` from a second thread once the initial HELLO has gone out.
        let stop_clone = stop.clone();
        let env_clone = env.clone();
        let state_clone = state.clone();
        let handle = std::thread::spawn(move || {
            run(&env_clone, state_clone, queue, queue_handle, Arc::new(NullSink), MacAddr::new([1, 0, 0, 0, 0, 0]), config(), stop_clone);
        });
        std::thread::sleep(std::time::Duration::from_millis(50));
        stop.store(true, Ordering::Relaxed);
        handle.join().expect("engine thread should not panic");

        assert_eq!(env.sent.lock().unwrap().len(), 1);
        assert!(state.lock().unwrap().pending_ack.is_empty());
    }

    #[test]
    fn log_path_for_none_target_is_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = SharedState::new(dir.path(), 8, 0);
        assert!(log_path_for(&state, &LogTarget::None).is_none());
        assert!(log_path_for(&state, &LogTarget::Peer(MacAddr::new([1; 6]))).is_some());
    }
}
