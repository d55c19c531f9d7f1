//! Fuzz target for armored key extraction
//!
//! Tests that extraction from an arbitrary verified body never panics and
//! never returns text outside the body.

#![no_main]

use kitscan_core::transfer::extract_armored_key;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(key) = extract_armored_key(data) {
        assert!(key.len() <= data.len());
    }
});
