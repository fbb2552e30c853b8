//! Environment traits that decouple the engine from its external
//! collaborators (spec §1, §6): the radio driver, the monotonic clock, and
//! the random-number source. The filesystem is the fourth named collaborator
//! but is consumed directly by `flud-storage` via `std::fs`, since the spec
//! treats it as a plain POSIX surface rather than one this crate mediates.
//!
//! Splitting the teacher's single `Environment` trait into `Clock` + `Rng` +
//! `Radio` mirrors the spec's own framing of these as three narrow,
//! independently-replaceable interfaces; `Environment` remains as the
//! combined bound the engine actually takes a type parameter over.

use crate::errors::{CoreError, Result};

/// Monotonic millisecond clock (spec §6: `now_ms() -> u32`, wrap tolerated).
pub trait Clock: Send + Sync {
    /// Milliseconds since some fixed but arbitrary epoch (usually boot).
    ///
    /// # Invariants
    ///
    /// Must never decrease within a single boot. Wrap-around across a boot
    /// boundary is tolerated; at most it produces one spurious early retry.
    fn now_ms(&self) -> u32;
}

/// Random-number source, used to seed the engine's sequence counter on
/// start-up and nowhere else.
pub trait Rng: Send + Sync {
    /// A fresh random `u32`, suitable as an initial sequence number.
    fn random_u32(&self) -> u32;
}

/// Radio driver contract (spec §6). Only the engine task may call
/// `send_broadcast`; the driver calls back into the ingress handler on its
/// own thread outside of this trait.
pub trait Radio: Send + Sync {
    /// Transmit `bytes` to the broadcast address on the configured channel.
    ///
    /// # Errors
    ///
    /// `RadioSend` if the underlying driver reports a transmit failure. The
    /// frame is not re-queued by the caller; ACK machinery retries it if
    /// the frame required one.
    fn send_broadcast(&self, bytes: &[u8]) -> Result<()>;

    /// Join the broadcast group for `channel`, if the driver models channel
    /// membership explicitly. A no-op for drivers that don't.
    fn add_broadcast_peer(&self, channel: &str) -> Result<()> {
        let _ = channel;
        Ok(())
    }

    /// Release driver resources. Called once, from `stop`.
    fn deinit(&self) {}
}

/// The combined bound the engine task takes a type parameter over.
///
/// Production code implements this over real system resources; tests and
/// `flud-harness` implement it over a virtual clock, seeded RNG, and an
/// in-memory radio medium, so engine logic never special-cases simulation.
pub trait Environment: Clock + Rng + Radio + Clone + Send + Sync + 'static {}

impl<T> Environment for T where T: Clock + Rng + Radio + Clone + Send + Sync + 'static {}

/// Radio send failure helper, used by `Radio` implementations to build a
/// [`CoreError::RadioSend`] from a driver-specific error message.
#[must_use]
pub fn radio_send_error(message: impl Into<String>) -> CoreError {
    CoreError::RadioSend(message.into())
}
