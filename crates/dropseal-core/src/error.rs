//! Error types for credential and share operations.
//!
//! Share errors are a closed set of kinds, each surfaced to the user as a
//! distinct message. Network errors never reach the user directly: any
//! failure of the peer lookup downgrades to the local store.

use std::time::Duration;

use dropseal_store::StorageError;
use thiserror::Error;

/// Errors from [`CredentialManager`](crate::CredentialManager).
///
/// A wrong password is not an error; verification returns `Ok(false)`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// The credential store could not be read or written.
    #[error("credential store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<StorageError> for CredentialError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Io(reason) => Self::StoreUnavailable(reason),
        }
    }
}

/// Errors from share creation, publication and redemption.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShareError {
    /// The operator dismissed the file chooser.
    #[error("no file selected")]
    NoFileSelected,

    /// Input is not a canonical hyphenated UUID.
    #[error("invalid share code format")]
    InvalidCodeFormat,

    /// Neither the peer nor the local store knows this code.
    #[error("share code not found")]
    MetadataNotFound,

    /// The share's expiry has passed. The record has been deleted.
    #[error("share has expired")]
    Expired,

    /// The share has already been redeemed or is being redeemed right now.
    #[error("share has already been used")]
    AlreadyUsed,

    /// Wrong key or corrupted payload.
    #[error("could not decrypt share")]
    DecryptionFailed,

    /// The operator dismissed the save dialog.
    #[error("save cancelled")]
    SaveCancelled,

    /// The code was published before. Codes are never reissued, even after
    /// the earlier share was redeemed or expired.
    #[error("share code already issued")]
    CodeAlreadyIssued,

    /// The local share store could not be read or written.
    #[error("share store unavailable: {0}")]
    StoreUnavailable(String),

    /// Reading the source file or writing the destination failed.
    #[error("file access failed for {path}: {reason}")]
    FileAccess {
        /// Path that was being read or written
        path: String,
        /// Underlying I/O error
        reason: String,
    },

    /// A stored record could not be decoded.
    #[error("corrupt share record: {reason}")]
    CorruptRecord {
        /// Decoder error
        reason: String,
    },
}

impl ShareError {
    /// Whether this error settles the share for good.
    ///
    /// Retrying the same code after a terminal error cannot succeed.
    /// Non-terminal errors (store outage, file access, a cancelled dialog
    /// under a non-burning policy) may succeed on retry.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::InvalidCodeFormat
                | Self::MetadataNotFound
                | Self::Expired
                | Self::AlreadyUsed
                | Self::DecryptionFailed
                | Self::CodeAlreadyIssued
        )
    }
}

impl From<StorageError> for ShareError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Io(reason) => Self::StoreUnavailable(reason),
        }
    }
}

/// Failures of the best-effort peer lookup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    /// Network lookup is switched off.
    #[error("network lookup disabled")]
    Disabled,

    /// The peer address could not be parsed.
    #[error("invalid peer address: {0}")]
    InvalidAddress(String),

    /// Connection could not be established.
    #[error("peer unreachable: {0}")]
    Unreachable(String),

    /// Lookup did not complete in time.
    #[error("peer lookup timed out after {0:?}")]
    Timeout(Duration),

    /// Peer answered with a non-success status.
    #[error("peer answered with status {0}")]
    Status(u16),

    /// Peer answered with a body we could not use.
    #[error("malformed peer response: {0}")]
    Malformed(String),
}
