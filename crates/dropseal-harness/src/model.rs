//! Reference model of the share lifecycle.
//!
//! Tracks, per published share, only whether its record is still stored and
//! when it expires. Assumes the default burning consume policy and a store
//! that never fails.

use std::time::Duration;

use dropseal_core::ShareError;

/// Operations applied to both the model and the real manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareOp {
    /// Create and publish a new share. Shares are numbered by publish order.
    Publish,
    /// Redeem share `slot`. Slots past the last published share name a code
    /// that was never published.
    Redeem {
        /// Share to redeem
        slot: u8,
        /// Whether the redeemer holds the right key
        right_key: bool,
        /// Whether the operator accepts the save dialog
        save: bool,
    },
    /// Advance the wall clock.
    Advance {
        /// Whole hours to advance
        hours: u8,
    },
    /// Delete expired records.
    Purge,
}

/// Observable outcome of a [`ShareOp`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelOutcome {
    /// Publish succeeded.
    Published,
    /// Redemption wrote the plaintext.
    Redeemed,
    /// Clock advanced.
    Advanced,
    /// Purge removed this many records.
    Purged(usize),
    /// Operation failed.
    Failed(ShareError),
}

/// Reference share lifecycle.
#[derive(Debug, Clone)]
pub struct ShareModel {
    now_secs: u64,
    ttl_secs: u64,
    /// Expiry of each published share while its record is stored
    slots: Vec<Option<u64>>,
}

impl ShareModel {
    /// Model starting at `now_secs` with shares living `ttl`.
    pub fn new(now_secs: u64, ttl: Duration) -> Self {
        Self { now_secs, ttl_secs: ttl.as_secs(), slots: Vec::new() }
    }

    /// Number of records the store should hold.
    pub fn stored(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Apply `op`, returning what the real system must observe.
    pub fn apply(&mut self, op: &ShareOp) -> ModelOutcome {
        match *op {
            ShareOp::Publish => {
                self.slots.push(Some(self.now_secs + self.ttl_secs));
                ModelOutcome::Published
            },
            ShareOp::Redeem { slot, right_key, save } => self.redeem(slot, right_key, save),
            ShareOp::Advance { hours } => {
                self.now_secs += u64::from(hours) * 3_600;
                ModelOutcome::Advanced
            },
            ShareOp::Purge => {
                let now = self.now_secs;
                let mut purged = 0;
                for slot in &mut self.slots {
                    if slot.is_some_and(|expires_at| now > expires_at) {
                        *slot = None;
                        purged += 1;
                    }
                }
                ModelOutcome::Purged(purged)
            },
        }
    }

    fn redeem(&mut self, slot: u8, right_key: bool, save: bool) -> ModelOutcome {
        let Some(entry) = self.slots.get_mut(usize::from(slot)) else {
            return ModelOutcome::Failed(ShareError::MetadataNotFound);
        };
        // Every path below removes the record
        let Some(expires_at) = entry.take() else {
            return ModelOutcome::Failed(ShareError::MetadataNotFound);
        };

        if self.now_secs > expires_at {
            ModelOutcome::Failed(ShareError::Expired)
        } else if !right_key {
            ModelOutcome::Failed(ShareError::DecryptionFailed)
        } else if !save {
            ModelOutcome::Failed(ShareError::SaveCancelled)
        } else {
            ModelOutcome::Redeemed
        }
    }
}
