//! Share lifecycle state machine.
//!
//! Each share code moves through
//!
//! ```text
//! Created ──▶ Published ──▶ Redeemed | Expired | Exhausted
//! ```
//!
//! and never leaves a terminal state. The manager guarantees at most one
//! successful redemption per locally stored record: the check of expiry and
//! use count and the reservation happen inside one [`Storage::update`], so
//! concurrent redeemers serialize on the store and only one sees
//! `use_count == 0`.
//!
//! Metadata fetched from a peer is never written locally. The serving peer
//! enforces single use itself via [`ShareManager::claim_for_peer`].

mod resolve;

use std::{
    io,
    path::{Path, PathBuf},
};

use dropseal_crypto::{SealedPayload, SecretKey, open, seal};
use dropseal_store::{Mutation, Storage};
pub use resolve::{MetadataSource, Resolution};
use resolve::ClaimMode;

use crate::{
    code::{SHARE_KEY_PREFIX, ShareCode},
    collaborator::{CodeSink, FileSystem, Operator},
    config::ShareConfig,
    env::Environment,
    error::ShareError,
    metadata::ShareMetadata,
    resolver::MetadataResolver,
};

/// A freshly sealed share, not yet published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedShare {
    /// New share code
    pub code: ShareCode,
    /// Sealed file contents, standard base64
    pub encrypted: String,
    /// Base name of the source file
    pub original_file_name: String,
}

/// A completed redemption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedeemOutcome {
    /// Redeemed code
    pub code: ShareCode,
    /// Where the metadata came from
    pub source: MetadataSource,
    /// Where the plaintext was written
    pub destination: PathBuf,
    /// Plaintext size in bytes
    pub bytes_written: usize,
}

/// Creates, publishes and redeems shares.
pub struct ShareManager<S, E, R>
where
    S: Storage,
    E: Environment,
    R: MetadataResolver,
{
    storage: S,
    env: E,
    resolver: R,
    config: ShareConfig,
}

impl<S, E, R> ShareManager<S, E, R>
where
    S: Storage,
    E: Environment,
    R: MetadataResolver,
{
    /// Manager over `storage`, looking up peers through `resolver`.
    pub fn new(storage: S, env: E, resolver: R, config: ShareConfig) -> Self {
        Self { storage, env, resolver, config }
    }

    /// Active configuration.
    pub fn config(&self) -> &ShareConfig {
        &self.config
    }

    /// Fresh random per-file key.
    pub fn generate_share_key(&self) -> SecretKey {
        SecretKey::from_bytes(self.env.random_array())
    }

    /// Seal the file at `file` under `key` and mint a code for it.
    ///
    /// Nothing is persisted; see [`publish_share`](Self::publish_share).
    ///
    /// # Errors
    ///
    /// - `ShareError::NoFileSelected` if `file` is `None`
    /// - `ShareError::FileAccess` if the file cannot be read
    pub fn create_share(
        &self,
        file: Option<&Path>,
        key: &SecretKey,
        fs: &impl FileSystem,
    ) -> Result<CreatedShare, ShareError> {
        let Some(path) = file else {
            return Err(ShareError::NoFileSelected);
        };

        let original_file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| ShareError::FileAccess {
                path: path.display().to_string(),
                reason: "path has no file name".to_string(),
            })?;

        let plaintext = fs.read(path).map_err(|err| file_access(path, &err))?;
        let payload = seal(&plaintext, key, self.env.random_array());
        let code = ShareCode::generate(&self.env);

        tracing::debug!(%code, size = plaintext.len(), "share created");

        Ok(CreatedShare { code, encrypted: payload.to_base64(), original_file_name })
    }

    /// Persist metadata for `code` and hand the code to `sink`.
    ///
    /// A code can be published once. Publishing claims a permanent marker
    /// for it before the record is written, so a code that was published
    /// before is refused even after its share was redeemed, burned or
    /// purged.
    ///
    /// The record is flushed before the sink sees the code. A failing sink
    /// is logged and otherwise ignored; the share is already published.
    ///
    /// # Errors
    ///
    /// - `ShareError::CodeAlreadyIssued` if `code` was published before
    /// - `ShareError::StoreUnavailable` if the store fails. If only the flush
    ///   fails the record is removed again, and the code stays issued.
    pub fn publish_share(
        &self,
        encrypted: &str,
        code: &ShareCode,
        original_file_name: &str,
        sink: &impl CodeSink,
    ) -> Result<ShareMetadata, ShareError> {
        let now = self.env.wall_clock_secs();
        let metadata =
            ShareMetadata::new(encrypted, original_file_name, now, self.config.share_ttl);
        let record = metadata.to_bytes()?;

        let fresh = self.storage.update(&code.issued_key(), |current| match current {
            Some(_) => (Mutation::Keep, false),
            None => (Mutation::Put(now.to_be_bytes().to_vec()), true),
        })?;
        if !fresh {
            tracing::warn!(%code, "refusing to republish share code");
            return Err(ShareError::CodeAlreadyIssued);
        }

        let key = code.storage_key();
        self.storage.set(&key, &record)?;
        if let Err(err) = self.storage.flush() {
            if let Err(undo) = self.storage.delete(&key) {
                tracing::error!(%code, error = %undo, "could not withdraw unflushed share");
            }
            return Err(err.into());
        }

        tracing::info!(%code, expires_at = metadata.expires_at, "share published");

        if let Err(err) = sink.offer(code) {
            tracing::warn!(%code, error = %err, "could not hand off share code");
        }

        Ok(metadata)
    }

    /// Redeem `code` with `key` and write the plaintext where the operator
    /// chooses.
    ///
    /// # Errors
    ///
    /// - `ShareError::InvalidCodeFormat` before any store or network access
    /// - `ShareError::MetadataNotFound` if neither the peer nor the store
    ///   knows the code
    /// - `ShareError::Expired` / `AlreadyUsed` for spent shares
    /// - `ShareError::DecryptionFailed` for a wrong key or corrupted payload
    /// - `ShareError::SaveCancelled` if the operator declines to save
    /// - `ShareError::FileAccess` if writing the destination fails
    /// - `ShareError::StoreUnavailable` / `CorruptRecord` on store faults
    pub async fn redeem_share(
        &self,
        code: &str,
        key: &SecretKey,
        operator: &impl Operator,
        fs: &impl FileSystem,
    ) -> Result<RedeemOutcome, ShareError> {
        let code = ShareCode::parse(code)?;
        let peer = operator.peer_address();

        let Resolution::Resolved { source, metadata } =
            self.resolve(&code, peer.as_deref()).await?
        else {
            tracing::info!(%code, "share not found");
            return Err(ShareError::MetadataNotFound);
        };

        if source == MetadataSource::Network
            && metadata.is_expired(self.env.wall_clock_secs())
        {
            return Err(ShareError::Expired);
        }

        let Some(plaintext) = decrypt(&metadata, key) else {
            tracing::info!(%code, %source, "share did not decrypt");
            self.settle_failed_attempt(
                &code,
                source,
                self.config.consume_policy.burn_on_decrypt_failure,
            )?;
            return Err(ShareError::DecryptionFailed);
        };

        let Some(destination) = operator.save_destination(&metadata.original_file_name) else {
            tracing::info!(%code, "save cancelled");
            let burn = self.config.consume_policy.burn_on_save_cancel;
            self.settle_failed_attempt(&code, source, burn)?;
            return Err(ShareError::SaveCancelled);
        };

        if source == MetadataSource::Local {
            self.storage.delete(&code.storage_key())?;
        }

        fs.write(&destination, &plaintext).map_err(|err| file_access(&destination, &err))?;

        tracing::info!(%code, %source, size = plaintext.len(), "share redeemed");

        Ok(RedeemOutcome { code, source, destination, bytes_written: plaintext.len() })
    }

    /// Claim a local share on behalf of a requesting peer.
    ///
    /// Runs the same checks as a local redemption and deletes the record
    /// when they pass, so each share is served at most once.
    ///
    /// # Errors
    ///
    /// - `ShareError::MetadataNotFound` if there is no record
    /// - `ShareError::Expired` / `AlreadyUsed` for spent shares
    /// - `ShareError::StoreUnavailable` / `CorruptRecord` on store faults
    pub fn claim_for_peer(&self, code: &ShareCode) -> Result<ShareMetadata, ShareError> {
        let metadata =
            self.claim_local(code, ClaimMode::Consume)?.ok_or(ShareError::MetadataNotFound)?;
        tracing::info!(%code, "share served to peer");
        Ok(metadata)
    }

    /// Delete every expired share record. Returns how many were removed.
    ///
    /// Undecodable records are left alone.
    ///
    /// # Errors
    ///
    /// - `ShareError::StoreUnavailable` if the store fails
    pub fn purge_expired(&self) -> Result<usize, ShareError> {
        let now = self.env.wall_clock_secs();
        let mut purged = 0;

        for key in self.storage.keys_with_prefix(SHARE_KEY_PREFIX)? {
            let removed = self.storage.update(&key, |current| {
                let expired = current
                    .and_then(|bytes| ShareMetadata::from_bytes(bytes).ok())
                    .is_some_and(|metadata| metadata.is_expired(now));
                if expired { (Mutation::Delete, true) } else { (Mutation::Keep, false) }
            })?;
            if removed {
                purged += 1;
            }
        }

        tracing::info!(purged, "expired shares purged");
        Ok(purged)
    }

    /// Local record for `code`, without claiming it.
    ///
    /// # Errors
    ///
    /// - `ShareError::StoreUnavailable` / `CorruptRecord` on store faults
    pub fn share_status(&self, code: &ShareCode) -> Result<Option<ShareMetadata>, ShareError> {
        self.storage
            .get(&code.storage_key())?
            .map(|bytes| ShareMetadata::from_bytes(&bytes))
            .transpose()
    }

    /// Burn or release a reservation after a failed redemption.
    fn settle_failed_attempt(
        &self,
        code: &ShareCode,
        source: MetadataSource,
        burn: bool,
    ) -> Result<(), ShareError> {
        if source != MetadataSource::Local {
            return Ok(());
        }

        let key = code.storage_key();
        if burn {
            self.storage.delete(&key)?;
            tracing::info!(%code, "share burned");
            return Ok(());
        }

        self.storage.update(&key, |current| {
            let Some(bytes) = current else {
                return (Mutation::Keep, Ok(()));
            };
            let released = ShareMetadata::from_bytes(bytes).and_then(|mut metadata| {
                metadata.use_count = 0;
                metadata.to_bytes()
            });
            match released {
                Ok(bytes) => (Mutation::Put(bytes), Ok(())),
                Err(err) => (Mutation::Keep, Err(err)),
            }
        })??;

        tracing::info!(%code, "share reservation released");
        Ok(())
    }
}

fn decrypt(metadata: &ShareMetadata, key: &SecretKey) -> Option<Vec<u8>> {
    let payload = SealedPayload::from_base64(&metadata.encrypted).ok()?;
    open(&payload, key).ok()
}

fn file_access(path: &Path, err: &io::Error) -> ShareError {
    ShareError::FileAccess { path: path.display().to_string(), reason: err.to_string() }
}
