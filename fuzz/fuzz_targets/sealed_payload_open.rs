//! Fuzz target for SealedPayload decoding and authentication
//!
//! Arbitrary bytes and base64 strings must either be rejected or fail
//! authentication. A payload sealed with one key never opens under
//! another, and flipping any byte of a sealed payload breaks it.

#![no_main]

use arbitrary::Arbitrary;
use dropseal_crypto::{SealedPayload, SecretKey, open, seal};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    key: [u8; 32],
    other_key: [u8; 32],
    nonce: [u8; 24],
    plaintext: Vec<u8>,
    raw: Vec<u8>,
    encoded: String,
    flip_at: usize,
}

fuzz_target!(|input: Input| {
    let key = SecretKey::from_bytes(input.key);

    if let Ok(payload) = SealedPayload::from_bytes(input.raw) {
        let _ = open(&payload, &key);
    }
    if let Ok(payload) = SealedPayload::from_base64(&input.encoded) {
        let _ = open(&payload, &key);
    }

    let sealed = seal(&input.plaintext, &key, input.nonce);
    assert_eq!(open(&sealed, &key).ok(), Some(input.plaintext.clone()));

    if input.other_key != input.key {
        assert!(open(&sealed, &SecretKey::from_bytes(input.other_key)).is_err());
    }

    let mut tampered = sealed.as_bytes().to_vec();
    let at = input.flip_at % tampered.len();
    tampered[at] ^= 0x01;
    if let Ok(payload) = SealedPayload::from_bytes(tampered) {
        assert!(open(&payload, &key).is_err());
    }
});
