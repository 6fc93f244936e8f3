//! Fuzz target for ShareCode::parse
//!
//! The parser should NEVER panic. Anything it accepts must be exactly the
//! canonical 36-character form once displayed, and must survive a
//! storage-key round trip.

#![no_main]

use dropseal_core::ShareCode;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(code) = ShareCode::parse(input) {
        let canonical = code.to_string();
        assert_eq!(canonical.len(), 36);
        assert_eq!(canonical, input.to_ascii_lowercase());
        assert_eq!(ShareCode::from_storage_key(&code.storage_key()), Some(code));
    }
});
