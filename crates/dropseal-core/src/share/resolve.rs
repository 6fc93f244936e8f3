//! Two-stage metadata resolution.
//!
//! Stage one asks the peer, bounded by `network_timeout`. Any failure there
//! is logged and dropped. Stage two claims the record in the local store in a
//! single atomic transaction.

use std::fmt;

use dropseal_store::{Mutation, Storage};

use super::ShareManager;
use crate::{
    code::ShareCode,
    env::Environment,
    error::{NetworkError, ShareError},
    metadata::ShareMetadata,
    resolver::MetadataResolver,
};

/// Where resolved metadata came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataSource {
    /// Fetched from the sending peer. Ephemeral, never written locally.
    Network,
    /// Reserved in the local store.
    Local,
}

impl fmt::Display for MetadataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network => f.write_str("peer"),
            Self::Local => f.write_str("local store"),
        }
    }
}

/// Outcome of [`ShareManager::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Metadata found.
    ///
    /// For a local source the record is now reserved (`use_count` was
    /// incremented) and must be consumed or released.
    Resolved {
        /// Which stage produced the metadata
        source: MetadataSource,
        /// The share record
        metadata: ShareMetadata,
    },
    /// Neither stage knows the code.
    Unresolved,
}

/// What a successful local claim does to the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ClaimMode {
    /// Increment `use_count` and keep the record (redemption continues).
    Reserve,
    /// Delete the record (serving it to a peer is the redemption).
    Consume,
}

enum Claim {
    Missing,
    Expired,
    Used,
    Claimed(ShareMetadata),
    Corrupt(ShareError),
}

/// Check-and-claim, run inside the store's atomic update.
fn claim_transaction(current: Option<&[u8]>, now: u64, mode: ClaimMode) -> (Mutation, Claim) {
    let Some(bytes) = current else {
        return (Mutation::Keep, Claim::Missing);
    };

    let mut metadata = match ShareMetadata::from_bytes(bytes) {
        Ok(metadata) => metadata,
        Err(err) => return (Mutation::Keep, Claim::Corrupt(err)),
    };

    if metadata.is_expired(now) {
        return (Mutation::Delete, Claim::Expired);
    }
    if metadata.use_count >= 1 {
        return (Mutation::Keep, Claim::Used);
    }

    metadata.use_count += 1;
    match mode {
        ClaimMode::Consume => (Mutation::Delete, Claim::Claimed(metadata)),
        ClaimMode::Reserve => match metadata.to_bytes() {
            Ok(bytes) => (Mutation::Put(bytes), Claim::Claimed(metadata)),
            Err(err) => (Mutation::Keep, Claim::Corrupt(err)),
        },
    }
}

impl<S, E, R> ShareManager<S, E, R>
where
    S: Storage,
    E: Environment,
    R: MetadataResolver,
{
    /// Resolve `code`, peer first when `peer` is given, then the local store.
    ///
    /// A local hit reserves the record.
    ///
    /// # Errors
    ///
    /// - `ShareError::Expired` if the local record has expired (it is deleted)
    /// - `ShareError::AlreadyUsed` if the local record is reserved or used
    /// - `ShareError::StoreUnavailable` / `CorruptRecord` on store faults
    pub async fn resolve(
        &self,
        code: &ShareCode,
        peer: Option<&str>,
    ) -> Result<Resolution, ShareError> {
        if let Some(peer) = peer {
            match self.fetch_remote(peer, code).await {
                Ok(metadata) => {
                    tracing::debug!(%code, peer, "share resolved from peer");
                    return Ok(Resolution::Resolved { source: MetadataSource::Network, metadata });
                },
                Err(err) => {
                    tracing::warn!(
                        %code,
                        peer,
                        error = %err,
                        "peer lookup failed, falling back to local store"
                    );
                },
            }
        }

        Ok(match self.claim_local(code, ClaimMode::Reserve)? {
            Some(metadata) => Resolution::Resolved { source: MetadataSource::Local, metadata },
            None => Resolution::Unresolved,
        })
    }

    async fn fetch_remote(
        &self,
        peer: &str,
        code: &ShareCode,
    ) -> Result<ShareMetadata, NetworkError> {
        let timeout = self.config.network_timeout;
        let remote = tokio::time::timeout(timeout, self.resolver.fetch(peer, code))
            .await
            .map_err(|_| NetworkError::Timeout(timeout))??;

        ShareMetadata::from_remote(remote, self.env.wall_clock_secs(), self.config.network_ttl)
    }

    /// Atomically claim the local record for `code`.
    ///
    /// Returns `None` if there is no record.
    pub(super) fn claim_local(
        &self,
        code: &ShareCode,
        mode: ClaimMode,
    ) -> Result<Option<ShareMetadata>, ShareError> {
        let now = self.env.wall_clock_secs();
        let claim = self
            .storage
            .update(&code.storage_key(), |current| claim_transaction(current, now, mode))?;

        match claim {
            Claim::Missing => Ok(None),
            Claim::Claimed(metadata) => Ok(Some(metadata)),
            Claim::Expired => {
                tracing::info!(%code, "expired share deleted");
                Err(ShareError::Expired)
            },
            Claim::Used => {
                tracing::info!(%code, "share already used");
                Err(ShareError::AlreadyUsed)
            },
            Claim::Corrupt(err) => {
                tracing::error!(%code, error = %err, "undecodable share record");
                Err(err)
            },
        }
    }
}
