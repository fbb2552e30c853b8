//! Engine task, ingress handler, send queue, and pending-ACK table for a
//! fludmesh node (spec §4.5-§4.8, components C5-C8).
//!
//! This crate has no notion of "the public API" (component C9, `flud-api`)
//! or of process lifetime; it exposes the state machines and expects a
//! caller to own the engine mutex, spawn the engine task on a thread, and
//! wire the radio driver's receive callback to [`ingress::handle_frame`].

pub mod engine;
pub mod ingress;
pub mod notify;
pub mod pending_ack;
pub mod send_queue;
pub mod state;

pub use engine::{EngineConfig, ACK_SCAN_INTERVAL_MS, CACHE_GC_INTERVAL_MS};
pub use notify::{Notification, NotificationSink, NullSink};
pub use pending_ack::{Acknowledged, FailedDelivery, LogTarget, PendingAckTable, ACK_TIMEOUT_MS, MAX_TRIES};
pub use send_queue::{QueueFull, SendQueue, SendQueueHandle, DEFAULT_DEPTH, DEQUEUE_TIMEOUT};
pub use state::SharedState;
