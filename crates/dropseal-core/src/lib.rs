//! Core state machines for dropseal.
//!
//! Two managers sit on top of the crypto and storage layers:
//!
//! - [`CredentialManager`]: sets up and verifies the account password. Only a
//!   salt and a one-way verifier are ever persisted.
//! - [`ShareManager`]: creates, publishes and redeems share codes. Enforces
//!   expiry and single use, and resolves codes network-first with a local
//!   fallback.
//!
//! # Architecture
//!
//! Nothing here touches the outside world directly. Time and randomness come
//! from an [`Environment`], records from a [`Storage`], and the human-facing
//! pieces (file chooser, save dialog, clipboard, peer lookup) from the
//! collaborator traits in [`collaborator`] and [`resolver`]. Production
//! implementations live in `dropseal-node`; deterministic ones in
//! `dropseal-harness`.
//!
//! # Share lifecycle
//!
//! ```text
//! Created ──publish──▶ Published ──redeem──▶ Redeemed
//!                          │
//!                          ├──now > expiry──▶ Expired   (record deleted)
//!                          └──use_count ≥ 1──▶ Exhausted
//! ```
//!
//! Terminal states are never left; codes are never reused.
//!
//! [`Storage`]: dropseal_store::Storage

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod code;
pub mod collaborator;
pub mod config;
pub mod credential;
pub mod env;
pub mod error;
pub mod metadata;
pub mod resolver;
pub mod share;

#[cfg(test)]
pub(crate) mod testing;

pub use code::ShareCode;
pub use collaborator::{CodeSink, FileSystem, Operator};
pub use config::{ConsumePolicy, CredentialConfig, ShareConfig};
pub use credential::CredentialManager;
pub use env::Environment;
pub use error::{CredentialError, NetworkError, ShareError};
pub use metadata::{RemoteShare, ShareMetadata};
pub use resolver::{MetadataResolver, NoNetwork};
pub use share::{CreatedShare, MetadataSource, RedeemOutcome, Resolution, ShareManager};
