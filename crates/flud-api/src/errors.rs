//! Public error type for the fludmesh node API (spec §4.9, §6, §7).

use thiserror::Error;

use flud_core::CoreError;
use flud_engine::QueueFull;
use flud_proto::ProtoError;
use flud_storage::StorageError;

/// The language-neutral error kinds spec §6 calls for, collapsing every
/// lower-layer error enum at this one boundary.
#[derive(Error, Debug)]
pub enum ApiError {
    /// A caller-supplied argument was out of range or otherwise malformed.
    #[error("invalid argument: {0}")]
    InvalidArg(String),

    /// The node is not in the right lifecycle state for this call (not
    /// initialised, already running, not running).
    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    /// A caller-supplied buffer exceeded a protocol-defined size limit.
    #[error("invalid size: {size} exceeds limit of {max}")]
    InvalidSize {
        /// Size the caller asked for.
        size: usize,
        /// Declared maximum.
        max: usize,
    },

    /// The bounded send queue is at capacity.
    #[error("no memory: send queue is full")]
    NoMemory,

    /// Reserved for operations with a deadline; this core has none today.
    #[error("operation timed out")]
    Timeout,

    /// No matching record exists.
    #[error("not found")]
    NotFound,

    /// Underlying filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Corrupt(_) => Self::NotFound,
            CoreError::InvalidChannelName { name, reason } => {
                Self::InvalidArg(format!("invalid channel name {name:?}: {reason}"))
            }
            CoreError::RadioSend(message) => Self::Io(std::io::Error::other(message)),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Io(e) => Self::Io(e),
            StorageError::IndexOutOfRange { .. } => Self::NotFound,
        }
    }
}

impl From<ProtoError> for ApiError {
    fn from(err: ProtoError) -> Self {
        match err {
            ProtoError::PayloadTooLarge { size, max } | ProtoError::FrameTooLarge { size, mtu: max } => {
                Self::InvalidSize { size, max }
            }
            other => Self::InvalidArg(other.to_string()),
        }
    }
}

impl From<QueueFull> for ApiError {
    fn from(_: QueueFull) -> Self {
        Self::NoMemory
    }
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, ApiError>;
