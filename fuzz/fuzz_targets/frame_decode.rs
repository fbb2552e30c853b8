//! Fuzz target for `Frame::decode`.
//!
//! Feeds arbitrary byte sequences straight into the wire codec's entry
//! point to look for:
//! - parser crashes or panics
//! - integer overflows in length/offset arithmetic
//! - buffer over-reads past `FrameHeader::LEN`
//! - malformed headers that bypass the magic/version check
//!
//! This should never panic. All invalid inputs must return `Err`.

#![no_main]

use flud_proto::Frame;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = Frame::decode(data);
});
