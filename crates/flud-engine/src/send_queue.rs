//! Bounded send queue (spec §4.6, component C6).
//!
//! Backed by `std::sync::mpsc::sync_channel`, which already gives the exact
//! shape the spec asks for: a bounded FIFO with non-blocking enqueue
//! (`try_send`) and a receiver the engine task can block on with a timeout.
//! It has its own internal synchronization and does not take the engine
//! mutex (spec §5).

use std::sync::mpsc::{self, Receiver, Sender, TrySendError};
use std::time::Duration;

use bytes::Bytes;
use thiserror::Error;

/// Typical configured depth (spec §4.6).
pub const DEFAULT_DEPTH: usize = 32;

/// How long `dequeue` blocks before returning `None`, letting the engine
/// task's scheduled work (beacons, GC, ACK sweep) run under starvation.
pub const DEQUEUE_TIMEOUT: Duration = Duration::from_secs(1);

/// Error returned by a full (or torn-down) queue.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("send queue is full")]
pub struct QueueFull;

/// Producer handle; cheap to clone, shared by the ingress handler and the
/// public API.
#[derive(Clone)]
pub struct SendQueueHandle {
    tx: Sender<Bytes>,
}

impl SendQueueHandle {
    /// Enqueue a frame. Never blocks; drops and returns `QueueFull` if the
    /// queue is at capacity or the engine task has shut down.
    ///
    /// # Errors
    ///
    /// `QueueFull` if the queue is at capacity.
    pub fn enqueue(&self, frame: Bytes) -> Result<(), QueueFull> {
        match self.tx.try_send(frame) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_) | TrySendError::Disconnected(_)) => Err(QueueFull),
        }
    }
}

/// Consumer half, owned exclusively by the engine task.
pub struct SendQueue {
    rx: Receiver<Bytes>,
}

impl SendQueue {
    /// Build a bounded queue of the given depth and its producer handle.
    #[must_use]
    pub fn bounded(depth: usize) -> (SendQueueHandle, Self) {
        let (tx, rx) = mpsc::sync_channel(depth);
        (SendQueueHandle { tx }, Self { rx })
    }

    /// Block for up to [`DEQUEUE_TIMEOUT`] waiting for a frame.
    #[must_use]
    pub fn dequeue(&self) -> Option<Bytes> {
        self.rx.recv_timeout(DEQUEUE_TIMEOUT).ok()
    }

    /// Drain every frame currently queued without blocking (spec §4.7:
    /// shutdown drains the queue before the engine task exits).
    pub fn drain(&self) -> Vec<Bytes> {
        self.rx.try_iter().collect()
    }
}
