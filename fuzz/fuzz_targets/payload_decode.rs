//! Fuzz target for the four body decoders.
//!
//! Each body shape (`HelloBody`, `MessageBody`, `PrivateBody`, `AckBody`)
//! decodes its own fixed-prefix-plus-variable-tail layout independently of
//! the frame header. Feed the same arbitrary bytes to all four to look for
//! type-confusion bugs (bytes valid for one shape misparsed as another) and
//! oversized declared lengths that should be rejected rather than over-read.

#![no_main]

use flud_proto::{AckBody, HelloBody, MessageBody, PrivateBody};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = HelloBody::decode(data);
    let _ = MessageBody::decode(data);
    let _ = PrivateBody::decode(data);
    let _ = AckBody::decode(data);
});
