//! Manager configuration.

use std::time::Duration;

use dropseal_crypto::PBKDF2_MIN_ROUNDS;

/// How long a published share stays redeemable.
pub const DEFAULT_SHARE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Expiry assigned to metadata fetched from a peer.
pub const DEFAULT_NETWORK_TTL: Duration = Duration::from_secs(5 * 60);

/// Upper bound on a peer lookup before falling back to the local store.
pub const DEFAULT_NETWORK_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for [`CredentialManager`](crate::CredentialManager).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CredentialConfig {
    /// PBKDF2 iteration count. Raised to [`PBKDF2_MIN_ROUNDS`] if lower.
    pub kdf_rounds: u32,
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self { kdf_rounds: PBKDF2_MIN_ROUNDS }
    }
}

/// What happens to a locally reserved share when redemption fails after the
/// reservation.
///
/// A burned share is deleted. An unburned share is written back with
/// `use_count = 0` and can be redeemed again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsumePolicy {
    /// Burn when the key does not open the payload.
    pub burn_on_decrypt_failure: bool,
    /// Burn when the operator cancels the save dialog.
    pub burn_on_save_cancel: bool,
}

impl ConsumePolicy {
    /// Every started redemption consumes the share.
    pub const BURN: Self = Self { burn_on_decrypt_failure: true, burn_on_save_cancel: true };

    /// Only a completed redemption consumes the share.
    pub const RELEASE: Self = Self { burn_on_decrypt_failure: false, burn_on_save_cancel: false };
}

impl Default for ConsumePolicy {
    fn default() -> Self {
        Self::BURN
    }
}

/// Configuration for [`ShareManager`](crate::ShareManager).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShareConfig {
    /// Lifetime of a published share.
    pub share_ttl: Duration,
    /// Lifetime assigned to network-sourced metadata.
    pub network_ttl: Duration,
    /// Peer lookup deadline.
    pub network_timeout: Duration,
    /// Failure handling after a local reservation.
    pub consume_policy: ConsumePolicy,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            share_ttl: DEFAULT_SHARE_TTL,
            network_ttl: DEFAULT_NETWORK_TTL,
            network_timeout: DEFAULT_NETWORK_TIMEOUT,
            consume_policy: ConsumePolicy::default(),
        }
    }
}
