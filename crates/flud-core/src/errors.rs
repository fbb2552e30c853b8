//! Error types shared across the core, storage, and engine layers.

use thiserror::Error;

/// Errors surfaced by entity codecs, the directory store, and the
/// environment traits. Storage and engine crates wrap this in their own
/// error enums rather than re-exposing it directly to the public API.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A persistent record failed to parse; per spec invariant 2 this is
    /// treated as "entity absent", not a hard failure.
    #[error("corrupt record: {0}")]
    Corrupt(&'static str),

    /// A channel name violated the naming rules in spec §3.
    #[error("invalid channel name {name:?}: {reason}")]
    InvalidChannelName {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// The radio driver reported a transmit failure.
    #[error("radio send failed: {0}")]
    RadioSend(String),
}

/// Convenience alias used throughout the core, storage, and engine crates.
pub type Result<T> = std::result::Result<T, CoreError>;
