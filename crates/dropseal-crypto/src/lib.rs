//! dropseal Cryptographic Primitives
//!
//! Cryptographic building blocks for dropseal. Pure functions with
//! deterministic outputs. Callers provide random bytes (salts, nonces) so
//! tests can run with seeded randomness.
//!
//! # Key Lifecycle
//!
//! Two kinds of key exist. The account key is derived from the user's
//! password and never leaves the credential check; only its digest is
//! stored. Share keys are fresh random keys, one per shared file.
//!
//! ```text
//! password + salt ──PBKDF2-HMAC-SHA256──▶ account key ──SHA-256──▶ verifier (stored)
//!
//! random share key ──XChaCha20-Poly1305──▶ nonce ‖ ciphertext ‖ tag ──base64──▶ payload
//! ```
//!
//! # Security
//!
//! - Passwords and keys are never compared directly; only digests, in
//!   constant time
//! - Key material is zeroized on drop
//! - Authenticated encryption: a wrong key or a flipped bit fails to open

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod error;
mod kdf;
mod key;
mod seal;

pub use error::CryptoError;
pub use kdf::{PBKDF2_MIN_ROUNDS, derive_key, digests_match, hash_key};
pub use key::{KEY_SIZE, SALT_SIZE, Salt, SecretKey, VerifierHash};
pub use seal::{NONCE_SIZE, SealedPayload, TAG_SIZE, open, seal};
