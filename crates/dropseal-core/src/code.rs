//! Share codes.
//!
//! A share code is a UUID v4 in canonical hyphenated form. Parsing accepts
//! either letter case; storage and display always use lowercase, so `ABCD…`
//! and `abcd…` name the same share.

use std::{fmt, str::FromStr};

use uuid::Uuid;

use crate::{env::Environment, error::ShareError};

/// Length of the canonical `8-4-4-4-12` textual form.
pub const SHARE_CODE_LEN: usize = 36;

/// Store key prefix for share records.
pub const SHARE_KEY_PREFIX: &str = "share:";

/// Store key prefix for the permanent marker left by publishing a code.
pub const ISSUED_KEY_PREFIX: &str = "issued:";

/// Opaque identifier for one share transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShareCode(Uuid);

impl ShareCode {
    /// Fresh random v4 code.
    pub fn generate(env: &impl Environment) -> Self {
        let bytes: [u8; 16] = env.random_array();
        Self(uuid::Builder::from_random_bytes(bytes).into_uuid())
    }

    /// Parse the canonical hyphenated form, case-insensitive.
    ///
    /// Only the `8-4-4-4-12` grouping is accepted. Braced, URN and
    /// unhyphenated forms are rejected even though they name a valid UUID.
    ///
    /// # Errors
    ///
    /// - `ShareError::InvalidCodeFormat` for anything else.
    pub fn parse(input: &str) -> Result<Self, ShareError> {
        // uuid's parser only accepts the hyphenated grouping at this length
        if input.len() != SHARE_CODE_LEN {
            return Err(ShareError::InvalidCodeFormat);
        }
        Uuid::try_parse(input).map(Self).map_err(|_| ShareError::InvalidCodeFormat)
    }

    /// Key of this share's record in the store.
    pub fn storage_key(&self) -> String {
        format!("{SHARE_KEY_PREFIX}{self}")
    }

    /// Key of the marker that reserves this code for good once published.
    pub fn issued_key(&self) -> String {
        format!("{ISSUED_KEY_PREFIX}{self}")
    }

    /// Inverse of [`storage_key`](Self::storage_key).
    pub fn from_storage_key(key: &str) -> Option<Self> {
        key.strip_prefix(SHARE_KEY_PREFIX).and_then(|code| Self::parse(code).ok())
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ShareCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.hyphenated(), f)
    }
}

impl FromStr for ShareCode {
    type Err = ShareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
