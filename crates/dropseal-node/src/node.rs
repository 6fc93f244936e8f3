//! Command implementations behind the `dropseal` binary.
//!
//! A [`Node`] owns one store handle and hands clones of it to short-lived
//! credential and share managers, one per command.

use std::{path::Path, sync::Arc};

use dropseal_core::{
    CodeSink, CredentialConfig, CredentialError, CredentialManager, Environment, NoNetwork,
    Operator, RedeemOutcome, ShareCode, ShareConfig, ShareManager, ShareMetadata,
};
use dropseal_crypto::SecretKey;
use dropseal_store::Storage;
use zeroize::Zeroizing;

use crate::{
    error::NodeError,
    fs::LocalFs,
    resolver::HttpResolver,
    server::{PeerServer, PeerServerConfig},
};

/// A share published by [`Node::send`].
#[derive(Debug)]
pub struct SentShare {
    /// Code to hand to the receiver
    pub code: ShareCode,
    /// Per-file key the receiver needs alongside the code
    pub key: SecretKey,
    /// Stored record
    pub metadata: ShareMetadata,
}

impl SentShare {
    /// Key as 64 lowercase hex characters.
    pub fn key_hex(&self) -> String {
        hex::encode(self.key.as_bytes())
    }
}

/// One local dropseal installation.
pub struct Node<S: Storage, E: Environment> {
    storage: S,
    env: E,
    share_config: ShareConfig,
    credential_config: CredentialConfig,
}

impl<S: Storage, E: Environment> Node<S, E> {
    /// Node over an opened store.
    pub fn new(
        storage: S,
        env: E,
        share_config: ShareConfig,
        credential_config: CredentialConfig,
    ) -> Self {
        Self { storage, env, share_config, credential_config }
    }

    /// Current wall-clock time as the node sees it.
    pub fn now_secs(&self) -> u64 {
        self.env.wall_clock_secs()
    }

    fn credentials(&self) -> CredentialManager<S, E> {
        CredentialManager::new(self.storage.clone(), self.env.clone(), self.credential_config)
    }

    fn local_shares(&self) -> ShareManager<S, E, NoNetwork> {
        ShareManager::new(self.storage.clone(), self.env.clone(), NoNetwork, self.share_config)
    }

    /// Set or change the account password.
    ///
    /// # Errors
    ///
    /// - `NodeError::Credential` if the store fails
    pub async fn init(&self, password: Zeroizing<String>) -> Result<(), NodeError> {
        let mut creds = self.credentials();
        tokio::task::spawn_blocking(move || creds.setup_password(&password))
            .await
            .map_err(|e| NodeError::Task(e.to_string()))??;
        Ok(())
    }

    /// Verify the account password.
    ///
    /// # Errors
    ///
    /// - `NodeError::NotInitialized` if no password was ever set
    /// - `NodeError::WrongPassword` if it does not verify
    /// - `NodeError::Credential` if the store fails
    pub async fn unlock(&self, password: Zeroizing<String>) -> Result<(), NodeError> {
        let mut creds = self.credentials();
        let check = move || -> Result<Option<bool>, CredentialError> {
            if !creds.is_initialized()? {
                return Ok(None);
            }
            creds.verify_password(&password).map(Some)
        };
        let verified = tokio::task::spawn_blocking(check)
            .await
            .map_err(|e| NodeError::Task(e.to_string()))??;

        match verified {
            None => Err(NodeError::NotInitialized),
            Some(false) => Err(NodeError::WrongPassword),
            Some(true) => Ok(()),
        }
    }

    /// Seal `file` under a fresh key and publish it.
    ///
    /// # Errors
    ///
    /// - `NodeError::Share` if the file cannot be read or the store fails
    pub fn send(&self, file: &Path, sink: &impl CodeSink) -> Result<SentShare, NodeError> {
        let shares = self.local_shares();
        let key = shares.generate_share_key();

        let created = shares.create_share(Some(file), &key, &LocalFs::new())?;
        let metadata = shares.publish_share(
            &created.encrypted,
            &created.code,
            &created.original_file_name,
            sink,
        )?;

        Ok(SentShare { code: created.code, key, metadata })
    }

    /// Redeem `code`, asking the operator's peer first.
    ///
    /// # Errors
    ///
    /// - `NodeError::InvalidKey` if `key_hex` is not a 32-byte hex key
    /// - `NodeError::Share` for every redemption failure
    pub async fn receive(
        &self,
        code: &str,
        key_hex: &str,
        operator: &impl Operator,
        overwrite: bool,
    ) -> Result<RedeemOutcome, NodeError> {
        let key = parse_share_key(key_hex)?;
        let resolver = HttpResolver::new(self.share_config.network_timeout)?;
        let shares =
            ShareManager::new(self.storage.clone(), self.env.clone(), resolver, self.share_config);
        let fs = if overwrite { LocalFs::overwriting() } else { LocalFs::new() };

        Ok(shares.redeem_share(code, &key, operator, &fs).await?)
    }

    /// Bind a peer server over this node's store.
    ///
    /// # Errors
    ///
    /// - `NodeError::Bind` if the address is unusable
    pub async fn peer_server(&self, config: &PeerServerConfig) -> Result<PeerServer, NodeError> {
        PeerServer::bind(config, Arc::new(self.local_shares())).await
    }

    /// Delete expired shares.
    ///
    /// # Errors
    ///
    /// - `NodeError::Share` if the store fails
    pub fn purge(&self) -> Result<usize, NodeError> {
        Ok(self.local_shares().purge_expired()?)
    }

    /// Local record for `code`.
    ///
    /// # Errors
    ///
    /// - `NodeError::Share` for a malformed code or a store failure
    pub fn status(&self, code: &str) -> Result<Option<ShareMetadata>, NodeError> {
        let code = ShareCode::parse(code.trim())?;
        Ok(self.local_shares().share_status(&code)?)
    }
}

/// Parse a hex-encoded per-file key.
///
/// # Errors
///
/// - `NodeError::InvalidKey` unless `hex` decodes to exactly 32 bytes
pub fn parse_share_key(hex: &str) -> Result<SecretKey, NodeError> {
    let bytes =
        Zeroizing::new(hex::decode(hex.trim()).map_err(|e| NodeError::InvalidKey(e.to_string()))?);
    SecretKey::from_slice(&bytes).map_err(|e| NodeError::InvalidKey(e.to_string()))
}
