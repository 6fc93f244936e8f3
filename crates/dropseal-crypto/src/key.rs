//! Key material types.
//!
//! [`SecretKey`] wraps 32 bytes of symmetric key material and zeroizes them
//! on drop. [`Salt`] and [`VerifierHash`] are the two values the credential
//! store persists; neither reveals the password.

use std::fmt;

use zeroize::Zeroize;

use crate::{CryptoError, kdf::digests_match};

/// Symmetric key size in bytes (256-bit key for XChaCha20-Poly1305)
pub const KEY_SIZE: usize = 32;

/// Account salt size in bytes
pub const SALT_SIZE: usize = 16;

/// 256-bit symmetric key.
///
/// Used both for the password-derived account key and for per-share keys.
/// The bytes are overwritten when the key is dropped, and `Debug` never
/// prints them.
#[derive(Clone)]
pub struct SecretKey {
    bytes: [u8; KEY_SIZE],
}

impl SecretKey {
    /// Wrap raw key bytes.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    /// Parse key bytes from a slice of exactly [`KEY_SIZE`] bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let bytes: [u8; KEY_SIZE] = bytes.try_into().map_err(|_| CryptoError::InvalidKeyLength {
            expected: KEY_SIZE,
            actual: bytes.len(),
        })?;
        Ok(Self { bytes })
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for SecretKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(<redacted>)")
    }
}

/// Per-account PBKDF2 salt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Salt([u8; SALT_SIZE]);

impl Salt {
    /// Wrap salt bytes. Callers supply cryptographically random bytes.
    pub fn from_bytes(bytes: [u8; SALT_SIZE]) -> Self {
        Self(bytes)
    }

    /// Salt bytes.
    pub fn as_bytes(&self) -> &[u8; SALT_SIZE] {
        &self.0
    }
}

/// SHA-256 digest of a derived key, stored in place of the password.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifierHash([u8; 32]);

impl VerifierHash {
    /// Wrap digest bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Compare against a stored verifier in constant time.
    ///
    /// A stored value of the wrong length never matches.
    pub fn matches(&self, stored: &[u8]) -> bool {
        digests_match(&self.0, stored)
    }
}
