#![allow(clippy::disallowed_types, reason = "Synchronous in-memory operations only")]

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard},
};

use super::{Mutation, Storage, StorageError};

/// In-memory storage implementation for testing and simulation
///
/// Uses a `BTreeMap` so prefix scans come back ordered. All state is wrapped
/// in Arc<Mutex<>> to allow Clone and concurrent access. `update` holds the
/// lock for the whole read-modify-write, which is what makes it atomic. A
/// poisoned mutex is reported as `StorageError::Io` rather than a panic.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<Mutex<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryStorage {
    /// Create a new empty `MemoryStorage`
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    ///
    /// Useful for debugging and testing.
    pub fn len(&self) -> usize {
        self.lock().map(|records| records.len()).unwrap_or(0)
    }

    /// True if no records are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, Vec<u8>>>, StorageError> {
        self.inner.lock().map_err(|_| StorageError::Io("memory store mutex poisoned".to_string()))
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        self.lock()?.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.lock()?.remove(key).is_some())
    }

    fn update<T, F>(&self, key: &str, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(Option<&[u8]>) -> (Mutation, T),
    {
        let mut records = self.lock()?;

        let (mutation, outcome) = f(records.get(key).map(Vec::as_slice));
        match mutation {
            Mutation::Keep => {},
            Mutation::Put(bytes) => {
                records.insert(key.to_string(), bytes);
            },
            Mutation::Delete => {
                records.remove(key);
            },
        }

        Ok(outcome)
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let records = self.lock()?;
        Ok(records
            .range(prefix.to_string()..)
            .map(|(key, _)| key)
            .take_while(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }

    fn flush(&self) -> Result<(), StorageError> {
        self.lock().map(|_| ())
    }
}
