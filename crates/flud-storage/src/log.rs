//! Append-only fixed-record message log (spec §4.3, component C3).
//!
//! One file per peer or channel; the only difference between a private
//! message log and a channel message log is the path it lives at.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use flud_proto::{ContentType, MacAddr};

use crate::errors::{Result, StorageError};

/// Size of one stored record, in bytes.
///
/// The distilled spec's prose says "fixed 256 bytes" but its own field
/// table (`sender_mac(6) | sequence(4) | timestamp(4) | status(1) | type(1)
/// | length(2) | payload(200) | reserved(9)`) sums to 227. Unlike the
/// header-size slip, this spec's own invariants hardcode the literal `256`
/// in offset arithmetic (`i*256+256 <= file_size`, `file_size/256`), so 256
/// is load-bearing here; `reserved` is widened from 9 to 38 bytes to make
/// the field table match.
pub const RECORD_LEN: u64 = 256;

const RESERVED_LEN: usize = 38;
const PAYLOAD_FIELD_LEN: usize = 200;

// sender_mac(6) + sequence(4) + timestamp(4) + status(1) + type(1) + length(2) + payload(200) + reserved(38)
const _: () = assert!(6 + 4 + 4 + 1 + 1 + 2 + PAYLOAD_FIELD_LEN + RESERVED_LEN == RECORD_LEN as usize);

/// Delivery state of a stored message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageStatus {
    /// Outbound, not yet acknowledged.
    Sent = 1,
    /// Inbound, stored by the ingress handler.
    Received = 2,
    /// Outbound, acknowledged by the recipient.
    Delivered = 3,
    /// Outbound, retries exhausted with no ACK.
    DeliveryFailed = 4,
}

impl MessageStatus {
    #[must_use]
    const fn from_u8(byte: u8) -> Self {
        match byte {
            1 => Self::Sent,
            3 => Self::Delivered,
            4 => Self::DeliveryFailed,
            _ => Self::Received,
        }
    }
}

/// One 256-byte log record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMessage {
    /// Originator of the message (spec §4.8: `header.source_mac`).
    pub sender_mac: MacAddr,
    /// Frame sequence number, carried through from the wire header.
    pub sequence: u32,
    /// Milliseconds since boot when this record was written.
    pub timestamp_ms: u32,
    /// Delivery state; the only field ever rewritten in place.
    pub status: MessageStatus,
    /// Application content tag.
    pub content_type: ContentType,
    /// Payload bytes, at most 200.
    pub payload: Vec<u8>,
}

impl StoredMessage {
    fn encode(&self) -> [u8; RECORD_LEN as usize] {
        let mut out = [0u8; RECORD_LEN as usize];
        out[0..6].copy_from_slice(self.sender_mac.as_bytes());
        out[6..10].copy_from_slice(&self.sequence.to_ne_bytes());
        out[10..14].copy_from_slice(&self.timestamp_ms.to_ne_bytes());
        out[14] = self.status as u8;
        out[15] = self.content_type.as_u8();
        let len = self.payload.len().min(PAYLOAD_FIELD_LEN);
        #[allow(clippy::cast_possible_truncation)]
        out[16..18].copy_from_slice(&(len as u16).to_ne_bytes());
        out[18..18 + len].copy_from_slice(&self.payload[..len]);
        // out[18+len..256-RESERVED_LEN-(200-len)]... remaining payload slack and the
        // reserved tail are already zero.
        out
    }

    fn decode(bytes: &[u8; RECORD_LEN as usize]) -> Self {
        let mut mac = [0u8; 6];
        mac.copy_from_slice(&bytes[0..6]);
        let sequence = u32::from_ne_bytes(bytes[6..10].try_into().expect("4 bytes"));
        let timestamp_ms = u32::from_ne_bytes(bytes[10..14].try_into().expect("4 bytes"));
        let status = MessageStatus::from_u8(bytes[14]);
        let content_type = ContentType::from_u8(bytes[15]);
        let len = (u16::from_ne_bytes(bytes[16..18].try_into().expect("2 bytes")) as usize)
            .min(PAYLOAD_FIELD_LEN);
        let payload = bytes[18..18 + len].to_vec();
        Self { sender_mac: MacAddr::new(mac), sequence, timestamp_ms, status, content_type, payload }
    }
}

fn open_append(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Current record count: `file size / 256`. A missing file has count 0.
///
/// # Errors
///
/// Propagates any `stat` failure other than "file does not exist".
pub fn count(path: &Path) -> Result<u64> {
    match std::fs::metadata(path) {
        Ok(meta) => Ok(meta.len() / RECORD_LEN),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
        Err(e) => Err(StorageError::Io(e)),
    }
}

/// Append one record, returning the index it was written at (`count`
/// before the write). Creates parent directories as needed.
///
/// # Errors
///
/// `Io` on any filesystem failure, including a short write — callers must
/// treat that as "record not stored" (spec §4.3).
pub fn append(path: &Path, record: &StoredMessage) -> Result<u64> {
    let index = count(path)?;
    let mut file = open_append(path)?;
    let bytes = record.encode();
    file.write_all(&bytes)?;
    Ok(index)
}

/// Read up to `n` records starting at `start`. Returns fewer than `n` at
/// end of file; `start` past the end returns an empty vec without error.
///
/// # Errors
///
/// `Io` on any filesystem failure other than "file does not exist" (which
/// is treated as an empty log).
pub fn load_page(path: &Path, start: u64, n: u64) -> Result<Vec<StoredMessage>> {
    let total = count(path)?;
    if start >= total || n == 0 {
        return Ok(Vec::new());
    }
    let mut file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(StorageError::Io(e)),
    };
    file.seek(SeekFrom::Start(start * RECORD_LEN))?;
    let to_read = n.min(total - start);
    let mut out = Vec::with_capacity(to_read as usize);
    let mut buf = [0u8; RECORD_LEN as usize];
    for _ in 0..to_read {
        file.read_exact(&mut buf)?;
        out.push(StoredMessage::decode(&buf));
    }
    Ok(out)
}

/// Overwrite the status byte of the record at `index`.
///
/// # Errors
///
/// `IndexOutOfRange` if `index >= count(path)`, `Io` on any other
/// filesystem failure.
pub fn set_status(path: &Path, index: u64, status: MessageStatus) -> Result<()> {
    let total = count(path)?;
    if index >= total {
        return Err(StorageError::IndexOutOfRange { index, count: total });
    }
    let mut file = OpenOptions::new().read(true).write(true).open(path)?;
    let offset = index * RECORD_LEN;
    file.seek(SeekFrom::Start(offset))?;
    let mut buf = [0u8; RECORD_LEN as usize];
    file.read_exact(&mut buf)?;
    buf[14] = status as u8;
    file.seek(SeekFrom::Start(offset))?;
    file.write_all(&buf)?;
    Ok(())
}

/// Delete the log file. Absence is success.
///
/// # Errors
///
/// `Io` on any filesystem failure other than "file does not exist".
pub fn clear(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StorageError::Io(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(sequence: u32, payload: &[u8]) -> StoredMessage {
        StoredMessage {
            sender_mac: MacAddr::new([1, 2, 3, 4, 5, 6]),
            sequence,
            timestamp_ms: 1000,
            status: MessageStatus::Sent,
            content_type: ContentType::TEXT,
            payload: payload.to_vec(),
        }
    }

    #[test]
    fn count_of_missing_file_is_zero() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert_eq!(count(&dir.path().join("messages.bin")).expect("count"), 0);
    }

    #[test]
    fn append_returns_increasing_indices_and_creates_parent_dirs() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("devices/AABBCC/messages.bin");
        assert_eq!(append(&path, &sample(1, b"a")).expect("append"), 0);
        assert_eq!(append(&path, &sample(2, b"b")).expect("append"), 1);
        assert_eq!(count(&path).expect("count"), 2);
    }

    #[test]
    fn load_page_round_trips_payload() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("messages.bin");
        let record = sample(42, b"hello mesh");
        append(&path, &record).expect("append");
        let page = load_page(&path, 0, 1).expect("load_page");
        assert_eq!(page.len(), 1);
        assert_eq!(page[0], record);
    }

    #[test]
    fn load_page_past_end_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("messages.bin");
        append(&path, &sample(1, b"a")).expect("append");
        assert!(load_page(&path, 5, 1).expect("load_page").is_empty());
    }

    #[test]
    fn set_status_updates_only_the_status_byte() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("messages.bin");
        let record = sample(1, b"hi");
        append(&path, &record).expect("append");
        set_status(&path, 0, MessageStatus::Delivered).expect("set_status");
        let page = load_page(&path, 0, 1).expect("load_page");
        assert_eq!(page[0].status, MessageStatus::Delivered);
        assert_eq!(page[0].payload, record.payload);
        assert_eq!(page[0].sequence, record.sequence);
    }

    #[test]
    fn set_status_out_of_range_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("messages.bin");
        append(&path, &sample(1, b"a")).expect("append");
        assert!(matches!(
            set_status(&path, 1, MessageStatus::Delivered),
            Err(StorageError::IndexOutOfRange { index: 1, count: 1 })
        ));
    }

    #[test]
    fn clear_of_missing_file_succeeds() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(clear(&dir.path().join("messages.bin")).is_ok());
    }

    #[test]
    fn clear_then_count_is_zero() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("messages.bin");
        append(&path, &sample(1, b"a")).expect("append");
        clear(&path).expect("clear");
        assert_eq!(count(&path).expect("count"), 0);
    }
}
