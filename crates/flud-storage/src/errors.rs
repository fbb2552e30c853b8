//! Storage-layer error type.

use thiserror::Error;

/// Errors surfaced by the message log and directory store.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Underlying filesystem operation failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// `set_status` or `load_page` addressed a record past `count(path)`.
    #[error("record index {index} out of range (log has {count} records)")]
    IndexOutOfRange {
        /// Requested index.
        index: u64,
        /// Current record count.
        count: u64,
    },
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, StorageError>;
