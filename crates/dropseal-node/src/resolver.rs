//! HTTP peer lookups.

use std::{
    net::{IpAddr, SocketAddr},
    time::Duration,
};

use async_trait::async_trait;
use dropseal_core::{MetadataResolver, NetworkError, RemoteShare, ShareCode};
use reqwest::Client;

use crate::error::NodeError;

/// Port a peer listens on when the address does not name one.
pub const DEFAULT_PEER_PORT: u16 = 7420;

/// Fetches share metadata with `GET {peer}/share/{code}`.
#[derive(Debug, Clone)]
pub struct HttpResolver {
    client: Client,
    timeout: Duration,
}

impl HttpResolver {
    /// Resolver whose requests give up after `timeout`.
    ///
    /// # Errors
    ///
    /// - `NodeError::HttpClient` if the client cannot be built
    pub fn new(timeout: Duration) -> Result<Self, NodeError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| NodeError::HttpClient(e.to_string()))?;

        Ok(Self { client, timeout })
    }

    /// Base URL for a peer given as `host`, `host:port` or `http://…`.
    ///
    /// Peers speak plain HTTP; the client is built without TLS support.
    ///
    /// # Errors
    ///
    /// - `NetworkError::InvalidAddress` for `https://` URLs and anything else
    pub fn base_url(peer: &str) -> Result<String, NetworkError> {
        let peer = peer.trim();
        let invalid = || NetworkError::InvalidAddress(peer.to_string());

        if peer.is_empty() {
            return Err(invalid());
        }
        if peer.starts_with("http://") {
            return Ok(peer.trim_end_matches('/').to_string());
        }
        if peer.contains("://") {
            return Err(invalid());
        }
        if peer.contains(['/', '?', '#', '@', ' ']) {
            return Err(invalid());
        }

        if let Ok(addr) = peer.parse::<SocketAddr>() {
            return Ok(format!("http://{addr}"));
        }
        if let Ok(ip) = peer.parse::<IpAddr>() {
            return Ok(format!("http://{}", SocketAddr::new(ip, DEFAULT_PEER_PORT)));
        }

        match peer.rsplit_once(':') {
            Some((host, port)) if !host.is_empty() && !host.contains(':') => {
                port.parse::<u16>().map_err(|_| invalid())?;
                Ok(format!("http://{peer}"))
            },
            Some(_) => Err(invalid()),
            None => Ok(format!("http://{peer}:{DEFAULT_PEER_PORT}")),
        }
    }
}

#[async_trait]
impl MetadataResolver for HttpResolver {
    async fn fetch(&self, peer: &str, code: &ShareCode) -> Result<RemoteShare, NetworkError> {
        let url = format!("{}/share/{code}", Self::base_url(peer)?);
        tracing::debug!(%url, "querying peer");

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                NetworkError::Timeout(self.timeout)
            } else {
                NetworkError::Unreachable(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(NetworkError::Status(status.as_u16()));
        }

        response.json::<RemoteShare>().await.map_err(|e| {
            if e.is_timeout() {
                NetworkError::Timeout(self.timeout)
            } else {
                NetworkError::Malformed(e.to_string())
            }
        })
    }
}
