//! Node error types.

use dropseal_core::{CredentialError, ShareError};
use dropseal_store::StorageError;
use thiserror::Error;

/// Errors surfaced by the `dropseal` binary.
#[derive(Error, Debug)]
pub enum NodeError {
    /// No password has been set up in this store.
    #[error("account not initialized, run `dropseal init` first")]
    NotInitialized,

    /// The password did not verify.
    #[error("wrong password")]
    WrongPassword,

    /// No password was supplied.
    #[error("password required (pass --password or set DROPSEAL_PASSWORD)")]
    PasswordRequired,

    /// The share key is not 64 hex characters.
    #[error("invalid share key: {0}")]
    InvalidKey(String),

    /// Credential manager failure.
    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// Share lifecycle failure.
    #[error(transparent)]
    Share(#[from] ShareError),

    /// Opening the store failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Peer server could not bind its address.
    #[error("failed to bind {address}: {reason}")]
    Bind {
        /// Requested bind address
        address: String,
        /// Underlying error
        reason: String,
    },

    /// Peer server stopped with an error.
    #[error("peer server failed: {0}")]
    Server(String),

    /// HTTP client could not be built.
    #[error("http client setup failed: {0}")]
    HttpClient(String),

    /// A blocking worker panicked or was cancelled.
    #[error("background task failed: {0}")]
    Task(String),
}
