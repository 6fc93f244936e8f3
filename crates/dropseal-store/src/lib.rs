//! Storage abstraction for dropseal records
//!
//! Trait-based abstraction for persisting credential and share records. The
//! trait is synchronous (no async): every backend call is a short local
//! transaction, and callers that need an async boundary wrap it themselves.
//!
//! Keys are UTF-8 strings (`auth.salt`, `share:<code>`), values are opaque
//! bytes. Callers own the encoding.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod chaotic;
mod error;
mod memory;
mod redb;

pub use chaotic::ChaoticStorage;
pub use error::StorageError;
pub use memory::MemoryStorage;

pub use self::redb::RedbStorage;

/// Outcome of an [`Storage::update`] closure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Leave the record as it was
    Keep,
    /// Replace (or create) the record with these bytes
    Put(Vec<u8>),
    /// Remove the record
    Delete,
}

/// Storage abstraction for keyed records
///
/// Must be Clone (one handle is shared by the credential and share managers),
/// Send + Sync (thread-safe), and synchronous. Implementations share internal
/// state via Arc, so clones access the same underlying storage.
///
/// # Durability
///
/// A successful `set`, `delete` or `update` is durable when it returns.
/// `flush` exists for backends that buffer; for the shipped backends it is a
/// no-op that still reports store failures.
pub trait Storage: Clone + Send + Sync + 'static {
    /// Load the record stored under `key`.
    ///
    /// Returns `None` if no record exists.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Store `value` under `key`, overwriting any existing record.
    fn set(&self, key: &str, value: &[u8]) -> Result<(), StorageError>;

    /// Remove the record under `key`.
    ///
    /// Returns `true` if a record was removed.
    fn delete(&self, key: &str) -> Result<bool, StorageError>;

    /// Atomic read-modify-write of one record.
    ///
    /// `f` receives the current value and decides the mutation. No other
    /// writer can observe or change the record between the read and the
    /// write.
    ///
    /// # Invariants
    ///
    /// - Post: if this returns `Err`, the record is unchanged
    /// - Post: `f` is called at most once
    fn update<T, F>(&self, key: &str, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(Option<&[u8]>) -> (Mutation, T);

    /// All keys starting with `prefix`, in ascending order.
    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

    /// Make every completed write durable.
    fn flush(&self) -> Result<(), StorageError>;
}
