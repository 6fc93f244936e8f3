//! Network lookup of share metadata.

use async_trait::async_trait;

use crate::{code::ShareCode, error::NetworkError, metadata::RemoteShare};

/// Fetches share metadata from the sending peer.
///
/// Any error makes the caller fall back to its local store, so
/// implementations should not retry internally.
#[async_trait]
pub trait MetadataResolver: Send + Sync {
    /// Look up `code` on the peer at `peer`.
    async fn fetch(&self, peer: &str, code: &ShareCode) -> Result<RemoteShare, NetworkError>;
}

/// Resolver for offline use. Every lookup misses.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoNetwork;

#[async_trait]
impl MetadataResolver for NoNetwork {
    async fn fetch(&self, _peer: &str, _code: &ShareCode) -> Result<RemoteShare, NetworkError> {
        Err(NetworkError::Disabled)
    }
}
