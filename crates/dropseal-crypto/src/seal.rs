//! File payload sealing using `XChaCha20-Poly1305`
//!
//! All functions are pure - the nonce must be provided by the caller.
//!
//! A sealed payload is one opaque byte string:
//!
//! ```text
//! ┌──────────────┬──────────────────────────┬─────────────┐
//! │ nonce (24 B) │ ciphertext (len(plain))  │ tag (16 B)  │
//! └──────────────┴──────────────────────────┴─────────────┘
//! ```
//!
//! It travels as standard base64 text in share metadata and on the wire.

use std::fmt;

use base64::{Engine, engine::general_purpose::STANDARD};
use chacha20poly1305::{
    XChaCha20Poly1305, XNonce,
    aead::{Aead, KeyInit},
};

use crate::{CryptoError, key::SecretKey};

/// `XChaCha20` nonce size (24 bytes)
pub const NONCE_SIZE: usize = 24;

/// Poly1305 tag size (16 bytes)
pub const TAG_SIZE: usize = 16;

/// Nonce-prefixed ciphertext of one file.
#[derive(Clone, PartialEq, Eq)]
pub struct SealedPayload {
    bytes: Vec<u8>,
}

impl SealedPayload {
    /// Wrap raw payload bytes.
    ///
    /// # Errors
    ///
    /// - `MalformedPayload`: shorter than a nonce plus a tag
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, CryptoError> {
        if bytes.len() < NONCE_SIZE + TAG_SIZE {
            return Err(CryptoError::MalformedPayload {
                reason: format!(
                    "{} bytes is shorter than the {} byte minimum",
                    bytes.len(),
                    NONCE_SIZE + TAG_SIZE
                ),
            });
        }
        Ok(Self { bytes })
    }

    /// Decode a payload from its base64 transport form.
    pub fn from_base64(encoded: &str) -> Result<Self, CryptoError> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| CryptoError::MalformedPayload { reason: e.to_string() })?;
        Self::from_bytes(bytes)
    }

    /// Encode the payload for transport.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    /// Raw payload bytes (nonce, ciphertext, tag).
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Nonce prefix.
    pub fn nonce(&self) -> &[u8] {
        &self.bytes[..NONCE_SIZE]
    }

    /// Plaintext length (payload minus nonce and tag).
    pub fn plaintext_len(&self) -> usize {
        self.bytes.len().saturating_sub(NONCE_SIZE + TAG_SIZE)
    }
}

impl fmt::Debug for SealedPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SealedPayload").field("len", &self.bytes.len()).finish()
    }
}

/// Seal plaintext under `key`.
///
/// # Security
///
/// - Caller MUST provide a fresh random nonce per payload in production
/// - Authenticated encryption prevents tampering
pub fn seal(plaintext: &[u8], key: &SecretKey, nonce: [u8; NONCE_SIZE]) -> SealedPayload {
    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());

    let Ok(ciphertext) = cipher.encrypt(XNonce::from_slice(&nonce), plaintext) else {
        unreachable!("XChaCha20-Poly1305 encryption cannot fail with valid inputs");
    };

    let mut bytes = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    bytes.extend_from_slice(&nonce);
    bytes.extend_from_slice(&ciphertext);

    SealedPayload { bytes }
}

/// Open a sealed payload with `key`.
///
/// # Errors
///
/// - `DecryptionFailed`: wrong key or tampered payload
pub fn open(payload: &SealedPayload, key: &SecretKey) -> Result<Vec<u8>, CryptoError> {
    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());
    let (nonce, ciphertext) = payload.bytes.split_at(NONCE_SIZE);

    cipher
        .decrypt(XNonce::from_slice(nonce), ciphertext)
        .map_err(|_| CryptoError::DecryptionFailed { reason: "authentication failed".to_string() })
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::key::KEY_SIZE;

    fn test_key(fill: u8) -> SecretKey {
        SecretKey::from_bytes([fill; KEY_SIZE])
    }

    #[test]
    fn seal_open_roundtrip() {
        let key = test_key(1);
        let plaintext = b"ten bytes!";

        let payload = seal(plaintext, &key, [0xAB; NONCE_SIZE]);
        let opened = open(&payload, &key).unwrap();

        assert_eq!(opened, plaintext);
    }

    #[test]
    fn seal_open_empty_file() {
        let key = test_key(2);

        let payload = seal(b"", &key, [0x00; NONCE_SIZE]);
        assert_eq!(payload.as_bytes().len(), NONCE_SIZE + TAG_SIZE);
        assert_eq!(open(&payload, &key).unwrap(), b"");
    }

    #[test]
    fn payload_layout() {
        let key = test_key(3);
        let plaintext = b"layout check";
        let nonce = [0x42; NONCE_SIZE];

        let payload = seal(plaintext, &key, nonce);

        assert_eq!(payload.nonce(), &nonce);
        assert_eq!(payload.as_bytes().len(), NONCE_SIZE + plaintext.len() + TAG_SIZE);
        assert_eq!(payload.plaintext_len(), plaintext.len());
    }

    #[test]
    fn wrong_key_fails_open() {
        let payload = seal(b"secret file", &test_key(4), [0x00; NONCE_SIZE]);

        let result = open(&payload, &test_key(5));
        assert!(matches!(
            result,
            Err(CryptoError::DecryptionFailed { reason }) if reason.contains("authentication")
        ));
    }

    #[test]
    fn tampered_payload_fails_open() {
        let key = test_key(6);
        let payload = seal(b"original contents", &key, [0x00; NONCE_SIZE]);

        let mut bytes = payload.as_bytes().to_vec();
        bytes[NONCE_SIZE] ^= 0xFF;
        let tampered = SealedPayload::from_bytes(bytes).unwrap();

        assert!(open(&tampered, &key).is_err());
    }

    #[test]
    fn different_nonces_produce_different_payloads() {
        let key = test_key(7);

        let a = seal(b"same", &key, [0x00; NONCE_SIZE]);
        let b = seal(b"same", &key, [0xFF; NONCE_SIZE]);

        assert_ne!(a.as_bytes()[NONCE_SIZE..], b.as_bytes()[NONCE_SIZE..]);
    }

    #[test]
    fn base64_roundtrip_preserves_payload() {
        let key = test_key(8);
        let payload = seal(b"transport", &key, [0x11; NONCE_SIZE]);

        let decoded = SealedPayload::from_base64(&payload.to_base64()).unwrap();
        assert_eq!(decoded, payload);
        assert_eq!(open(&decoded, &key).unwrap(), b"transport");
    }

    #[test]
    fn short_payload_is_malformed() {
        let result = SealedPayload::from_bytes(vec![0u8; NONCE_SIZE + TAG_SIZE - 1]);
        assert!(matches!(result, Err(CryptoError::MalformedPayload { .. })));
    }

    #[test]
    fn invalid_base64_is_malformed() {
        let result = SealedPayload::from_base64("not base64 at all!");
        assert!(matches!(result, Err(CryptoError::MalformedPayload { .. })));
    }

    #[test]
    fn debug_does_not_print_contents() {
        let payload = seal(b"hidden", &test_key(9), [0x00; NONCE_SIZE]);
        assert_eq!(format!("{payload:?}"), format!("SealedPayload {{ len: {} }}", 6 + 40));
    }

    proptest! {
        #[test]
        fn prop_open_inverts_seal(
            plaintext in prop::collection::vec(any::<u8>(), 0..4096),
            key in any::<[u8; KEY_SIZE]>(),
            nonce in any::<[u8; NONCE_SIZE]>(),
        ) {
            let key = SecretKey::from_bytes(key);
            let payload = seal(&plaintext, &key, nonce);
            prop_assert_eq!(open(&payload, &key).unwrap(), plaintext);
        }
    }
}
