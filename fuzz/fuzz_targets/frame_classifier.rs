//! Fuzz target for frame classification
//!
//! Tests that header parsing and frame classification handle arbitrary input without panicking.

#![no_main]

use kitscan_core::{Frame, ReservedHeader};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(header) = ReservedHeader::parse(data) {
        let _ = header.version();
        let _ = header.to_bytes();
    }

    let _ = Frame::from_bytes(data);
});
