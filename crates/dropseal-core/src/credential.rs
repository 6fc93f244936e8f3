//! Account password management.
//!
//! The password never touches the store. Setup persists a random salt and
//! the SHA-256 of the PBKDF2-derived key; verification re-derives and
//! compares digests in constant time.
//!
//! ```text
//! setup:   password ─┬─ PBKDF2(salt) ──▶ key ──SHA-256──▶ auth.hash
//!          salt ─────┴──────────────────────────────────▶ auth.salt
//!
//! verify:  password + auth.salt ──▶ key ──SHA-256──▶ ct_eq(auth.hash)
//! ```

use dropseal_crypto::{Salt, SecretKey, VerifierHash};
use dropseal_store::Storage;

use crate::{config::CredentialConfig, env::Environment, error::CredentialError};

/// Store key of the account salt.
pub const SALT_KEY: &str = "auth.salt";

/// Store key of the verifier hash.
pub const HASH_KEY: &str = "auth.hash";

/// Derives and verifies the account unlock key.
///
/// Holds a session flag that is set by a successful setup or verification
/// and cleared by [`lock`](Self::lock).
pub struct CredentialManager<S: Storage, E: Environment> {
    storage: S,
    env: E,
    config: CredentialConfig,
    authenticated: bool,
}

impl<S: Storage, E: Environment> CredentialManager<S, E> {
    /// Manager over `storage`, starting locked.
    pub fn new(storage: S, env: E, config: CredentialConfig) -> Self {
        Self { storage, env, config, authenticated: false }
    }

    /// Fresh random salt. Touches nothing.
    pub fn generate_salt(&self) -> Salt {
        Salt::from_bytes(self.env.random_array())
    }

    /// PBKDF2-HMAC-SHA256 of `password` under `salt`.
    pub fn derive_key(&self, password: &str, salt: &[u8]) -> SecretKey {
        dropseal_crypto::derive_key(password, salt, self.config.kdf_rounds)
    }

    /// One-way verifier for `key`.
    pub fn hash_key(&self, key: &SecretKey) -> VerifierHash {
        dropseal_crypto::hash_key(key)
    }

    /// Set (or change) the account password.
    ///
    /// An existing salt is kept; only the verifier changes.
    ///
    /// # Errors
    ///
    /// - `CredentialError::StoreUnavailable` if the store fails
    pub fn setup_password(&mut self, password: &str) -> Result<(), CredentialError> {
        let salt = match self.storage.get(SALT_KEY)? {
            Some(salt) => salt,
            None => self.generate_salt().as_bytes().to_vec(),
        };

        let verifier = self.hash_key(&self.derive_key(password, &salt));

        self.storage.set(SALT_KEY, &salt)?;
        self.storage.set(HASH_KEY, verifier.as_bytes())?;
        self.storage.flush()?;

        tracing::info!("account password set");
        self.authenticated = true;
        Ok(())
    }

    /// Check `password` against the stored verifier.
    ///
    /// Returns `Ok(false)` when no password has been set up.
    ///
    /// # Errors
    ///
    /// - `CredentialError::StoreUnavailable` if the store fails
    pub fn verify_password(&mut self, password: &str) -> Result<bool, CredentialError> {
        let Some(salt) = self.storage.get(SALT_KEY)? else {
            tracing::debug!("no salt stored");
            return Ok(false);
        };
        let Some(stored) = self.storage.get(HASH_KEY)? else {
            tracing::debug!("no verifier stored");
            return Ok(false);
        };

        let matches = self.hash_key(&self.derive_key(password, &salt)).matches(&stored);
        if matches {
            self.authenticated = true;
        }

        tracing::debug!(matches, "password verification");
        Ok(matches)
    }

    /// Whether both salt and verifier are stored.
    ///
    /// # Errors
    ///
    /// - `CredentialError::StoreUnavailable` if the store fails
    pub fn is_initialized(&self) -> Result<bool, CredentialError> {
        Ok(self.storage.get(SALT_KEY)?.is_some() && self.storage.get(HASH_KEY)?.is_some())
    }

    /// Whether this session has been unlocked.
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// End the session.
    pub fn lock(&mut self) {
        self.authenticated = false;
    }
}
