//! Password-based key derivation using PBKDF2-HMAC-SHA256

use pbkdf2::pbkdf2_hmac;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::key::{KEY_SIZE, SecretKey, VerifierHash};

/// Minimum PBKDF2 iteration count. Lower requests are raised to this floor.
pub const PBKDF2_MIN_ROUNDS: u32 = 100_000;

/// Derive a 256-bit key from a password and salt.
///
/// # Security
///
/// - Deterministic: same `(password, salt, rounds)` always yields the same key
/// - One-way: the key does not reveal the password
/// - At least [`PBKDF2_MIN_ROUNDS`] iterations regardless of `rounds`
pub fn derive_key(password: &str, salt: &[u8], rounds: u32) -> SecretKey {
    let rounds = rounds.max(PBKDF2_MIN_ROUNDS);

    let mut output = [0u8; KEY_SIZE];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, rounds, &mut output);

    let key = SecretKey::from_bytes(output);
    output.zeroize();
    key
}

/// Digest a key into a storable verifier.
pub fn hash_key(key: &SecretKey) -> VerifierHash {
    let digest = Sha256::digest(key.as_bytes());

    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&digest);
    VerifierHash::from_bytes(bytes)
}

/// Compare two digests without early exit.
///
/// Different lengths never match. Equal lengths are scanned in full.
pub fn digests_match(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SALT: [u8; 16] = [0x5A; 16];

    #[test]
    fn derive_is_deterministic() {
        let key1 = derive_key("correct-horse", &SALT, PBKDF2_MIN_ROUNDS);
        let key2 = derive_key("correct-horse", &SALT, PBKDF2_MIN_ROUNDS);

        assert_eq!(key1.as_bytes(), key2.as_bytes(), "same inputs must produce same key");
    }

    #[test]
    fn different_passwords_produce_different_keys() {
        let key1 = derive_key("correct-horse", &SALT, PBKDF2_MIN_ROUNDS);
        let key2 = derive_key("battery-staple", &SALT, PBKDF2_MIN_ROUNDS);

        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn different_salts_produce_different_keys() {
        let key1 = derive_key("correct-horse", &[0u8; 16], PBKDF2_MIN_ROUNDS);
        let key2 = derive_key("correct-horse", &[1u8; 16], PBKDF2_MIN_ROUNDS);

        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn rounds_below_floor_are_raised() {
        let weak = derive_key("correct-horse", &SALT, 1);
        let floor = derive_key("correct-horse", &SALT, PBKDF2_MIN_ROUNDS);

        assert_eq!(weak.as_bytes(), floor.as_bytes());
    }

    #[test]
    fn empty_password_still_derives() {
        let key = derive_key("", &SALT, PBKDF2_MIN_ROUNDS);
        assert_ne!(key.as_bytes(), &[0u8; KEY_SIZE]);
    }

    #[test]
    fn hash_is_stable_for_same_key() {
        let key = SecretKey::from_bytes([9u8; KEY_SIZE]);
        assert_eq!(hash_key(&key), hash_key(&key.clone()));
    }

    #[test]
    fn hash_differs_from_key() {
        let key = SecretKey::from_bytes([9u8; KEY_SIZE]);
        assert_ne!(hash_key(&key).as_bytes(), key.as_bytes());
    }

    #[test]
    fn digests_match_requires_equal_length() {
        assert!(digests_match(&[1, 2, 3], &[1, 2, 3]));
        assert!(!digests_match(&[1, 2, 3], &[1, 2, 4]));
        assert!(!digests_match(&[1, 2, 3], &[1, 2]));
        assert!(digests_match(&[], &[]));
    }
}
