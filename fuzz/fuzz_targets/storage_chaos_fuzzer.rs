//! Fuzz target for the on-disk message log under corrupted bytes.
//!
//! Writes arbitrary bytes to a log file (instead of well-formed 256-byte
//! records) and drives it through the same entry points a node's restart
//! path uses: `count`, `load_page`, `set_status`. Storage here is plain
//! `std::fs`, not an injectable trait, so "chaos" means a truncated or
//! garbage file on disk rather than injected I/O failures.
//!
//! # Invariants
//!
//! - None of these calls ever panic on a file that isn't a clean multiple
//!   of `RECORD_LEN`, or whose bytes are not valid records.
//! - Every decoded record's payload is at most 200 bytes, regardless of
//!   what length field the corrupted bytes carry.

#![no_main]

use std::io::Write;

use flud_storage::log::{count, load_page, set_status};
use flud_storage::{MessageStatus, RECORD_LEN};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("messages.bin");

    {
        let mut file = std::fs::File::create(&path).expect("create");
        file.write_all(data).expect("write");
    }

    let Ok(total) = count(&path) else { return };
    assert_eq!(total, data.len() as u64 / RECORD_LEN);

    if let Ok(records) = load_page(&path, 0, total.saturating_add(5)) {
        for record in &records {
            assert!(record.payload.len() <= 200);
        }
    }

    let _ = set_status(&path, total / 2, MessageStatus::DeliveryFailed);
});
