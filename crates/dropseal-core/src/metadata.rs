//! Share metadata records.
//!
//! [`ShareMetadata`] is what the local store holds for each published share,
//! encoded as CBOR. [`RemoteShare`] is the smaller JSON shape a peer answers
//! with; it carries no expiry or use count because the receiving side never
//! trusts either from the network.

use std::{fmt, time::Duration};

use dropseal_crypto::SealedPayload;
use serde::{Deserialize, Serialize};

use crate::error::{NetworkError, ShareError};

/// Persisted state of one share.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareMetadata {
    /// Sealed file contents, standard base64.
    pub encrypted: String,
    /// Absolute expiry, seconds since the Unix epoch.
    pub expires_at: u64,
    /// Redemptions started against this record.
    pub use_count: u32,
    /// Base name of the shared file, suggested as the save name.
    pub original_file_name: String,
}

impl ShareMetadata {
    /// Fresh record expiring `ttl` after `now_secs`.
    pub fn new(
        encrypted: impl Into<String>,
        original_file_name: impl Into<String>,
        now_secs: u64,
        ttl: Duration,
    ) -> Self {
        Self {
            encrypted: encrypted.into(),
            expires_at: now_secs.saturating_add(ttl.as_secs()),
            use_count: 0,
            original_file_name: original_file_name.into(),
        }
    }

    /// Ephemeral record for metadata fetched from a peer.
    ///
    /// # Errors
    ///
    /// - `NetworkError::Malformed` if the payload is not a decodable sealed
    ///   payload. The caller treats this like any other network miss.
    pub fn from_remote(
        remote: RemoteShare,
        now_secs: u64,
        ttl: Duration,
    ) -> Result<Self, NetworkError> {
        SealedPayload::from_base64(&remote.encrypted)
            .map_err(|e| NetworkError::Malformed(e.to_string()))?;
        Ok(Self::new(remote.encrypted, remote.original_filename, now_secs, ttl))
    }

    /// Whether the record is past its expiry. The expiry second itself is
    /// still valid.
    pub fn is_expired(&self, now_secs: u64) -> bool {
        now_secs > self.expires_at
    }

    /// Seconds left before expiry, zero once expired.
    pub fn remaining_secs(&self, now_secs: u64) -> u64 {
        self.expires_at.saturating_sub(now_secs)
    }

    /// Wire form served to peers.
    pub fn to_remote(&self) -> RemoteShare {
        RemoteShare {
            encrypted: self.encrypted.clone(),
            original_filename: self.original_file_name.clone(),
        }
    }

    /// Encode for the store.
    ///
    /// # Errors
    ///
    /// - `ShareError::CorruptRecord` if CBOR encoding fails
    pub fn to_bytes(&self) -> Result<Vec<u8>, ShareError> {
        let mut bytes = Vec::new();
        ciborium::ser::into_writer(self, &mut bytes)
            .map_err(|e| ShareError::CorruptRecord { reason: e.to_string() })?;
        Ok(bytes)
    }

    /// Decode a stored record.
    ///
    /// # Errors
    ///
    /// - `ShareError::CorruptRecord` if the bytes are not a valid record
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ShareError> {
        ciborium::de::from_reader(bytes)
            .map_err(|e| ShareError::CorruptRecord { reason: e.to_string() })
    }
}

impl fmt::Debug for ShareMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShareMetadata")
            .field("encrypted_len", &self.encrypted.len())
            .field("expires_at", &self.expires_at)
            .field("use_count", &self.use_count)
            .field("original_file_name", &self.original_file_name)
            .finish()
    }
}

/// Share metadata as exchanged with a peer over HTTP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteShare {
    /// Sealed file contents, standard base64.
    pub encrypted: String,
    /// Base name of the shared file.
    pub original_filename: String,
}
