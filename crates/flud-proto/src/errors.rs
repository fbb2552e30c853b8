//! Wire-format error types.

use thiserror::Error;

/// Errors that can occur while decoding or encoding a frame.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtoError {
    /// Buffer shorter than the fixed header.
    #[error("frame too short: expected at least {expected} bytes, got {actual}")]
    TooShort {
        /// Minimum required length.
        expected: usize,
        /// Actual buffer length.
        actual: usize,
    },

    /// Magic sentinel did not match `FrameHeader::MAGIC`.
    #[error("bad magic number")]
    BadMagic,

    /// Version byte is not a version this codec understands.
    #[error("unsupported protocol version: {0}")]
    BadVersion(u8),

    /// Declared body length exceeds the per-body payload cap (200 bytes).
    #[error("payload too large: {size} bytes exceeds cap of {max}")]
    PayloadTooLarge {
        /// Size the caller asked to encode.
        size: usize,
        /// Maximum allowed size.
        max: usize,
    },

    /// Encoded frame would exceed the radio MTU.
    #[error("encoded frame of {size} bytes exceeds radio MTU of {mtu}")]
    FrameTooLarge {
        /// Size the encoded frame would occupy.
        size: usize,
        /// Radio MTU.
        mtu: usize,
    },

    /// Body bytes ran out before every fixed field could be read.
    #[error("truncated body: expected {expected} bytes, got {actual}")]
    TruncatedBody {
        /// Bytes required for this body shape.
        expected: usize,
        /// Bytes actually available.
        actual: usize,
    },

    /// Frame type byte did not match any known variant.
    #[error("unknown frame type: {0:#04x}")]
    UnknownFrameType(u8),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ProtoError>;
