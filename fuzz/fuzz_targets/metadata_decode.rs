//! Fuzz target for ShareMetadata::from_bytes
//!
//! Stored records are CBOR. Truncated, oversized or type-confused input
//! must come back as an error, never a panic, and anything that decodes
//! must re-encode to a record that decodes to the same value.

#![no_main]

use dropseal_core::ShareMetadata;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(metadata) = ShareMetadata::from_bytes(data) {
        let Ok(bytes) = metadata.to_bytes() else {
            return;
        };
        assert_eq!(ShareMetadata::from_bytes(&bytes).ok(), Some(metadata));
    }
});
