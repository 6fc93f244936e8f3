//! Redb-backed durable storage implementation.
//!
//! Uses Redb's ACID transactions with Copy-on-Write for crash safety. Every
//! write commits with immediate durability, so records survive restarts as
//! soon as the call returns.

use std::{fmt::Display, path::Path, sync::Arc};

use redb::{Database, ReadableTable, TableDefinition};

use super::{Mutation, Storage, StorageError};

/// Table: records
/// Key: record key (`auth.salt`, `share:<code>`, ...)
/// Value: opaque record bytes
const RECORDS: TableDefinition<&str, &[u8]> = TableDefinition::new("records");

/// Durable storage backed by Redb.
///
/// Thread-safe through Redb's internal locking. Clone is cheap (Arc). Redb
/// admits a single writer at a time, so [`Storage::update`] runs its read and
/// write inside one write transaction and is atomic across threads.
#[derive(Clone)]
pub struct RedbStorage {
    db: Arc<Database>,
}

fn io_error(err: impl Display) -> StorageError {
    StorageError::Io(err.to_string())
}

impl RedbStorage {
    /// Open or create a Redb database at the given path.
    ///
    /// Creates the RECORDS table if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the database cannot be opened or created,
    /// including when another process already holds it open.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let db = Database::create(path.as_ref()).map_err(io_error)?;

        let txn = db.begin_write().map_err(io_error)?;
        {
            let _ = txn.open_table(RECORDS).map_err(io_error)?;
        }
        txn.commit().map_err(io_error)?;

        tracing::debug!(path = %path.as_ref().display(), "opened record store");

        Ok(Self { db: Arc::new(db) })
    }
}

impl Storage for RedbStorage {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let txn = self.db.begin_read().map_err(io_error)?;
        let table = txn.open_table(RECORDS).map_err(io_error)?;

        Ok(table.get(key).map_err(io_error)?.map(|value| value.value().to_vec()))
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        let txn = self.db.begin_write().map_err(io_error)?;
        {
            let mut table = txn.open_table(RECORDS).map_err(io_error)?;
            table.insert(key, value).map_err(io_error)?;
        }
        txn.commit().map_err(io_error)?;

        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool, StorageError> {
        let txn = self.db.begin_write().map_err(io_error)?;
        let removed = {
            let mut table = txn.open_table(RECORDS).map_err(io_error)?;
            table.remove(key).map_err(io_error)?.is_some()
        };
        txn.commit().map_err(io_error)?;

        Ok(removed)
    }

    fn update<T, F>(&self, key: &str, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(Option<&[u8]>) -> (Mutation, T),
    {
        let txn = self.db.begin_write().map_err(io_error)?;
        let outcome = {
            let mut table = txn.open_table(RECORDS).map_err(io_error)?;

            let current = table.get(key).map_err(io_error)?.map(|value| value.value().to_vec());
            let (mutation, outcome) = f(current.as_deref());

            match mutation {
                Mutation::Keep => {},
                Mutation::Put(bytes) => {
                    table.insert(key, bytes.as_slice()).map_err(io_error)?;
                },
                Mutation::Delete => {
                    table.remove(key).map_err(io_error)?;
                },
            }

            outcome
        };
        txn.commit().map_err(io_error)?;

        Ok(outcome)
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let txn = self.db.begin_read().map_err(io_error)?;
        let table = txn.open_table(RECORDS).map_err(io_error)?;

        let mut keys = Vec::new();
        for entry in table.range(prefix..).map_err(io_error)? {
            let (key, _) = entry.map_err(io_error)?;
            let key = key.value();
            if !key.starts_with(prefix) {
                break;
            }
            keys.push(key.to_string());
        }

        Ok(keys)
    }

    fn flush(&self) -> Result<(), StorageError> {
        // Commits use immediate durability; a read transaction still proves
        // the database is reachable.
        let _ = self.db.begin_read().map_err(io_error)?;
        Ok(())
    }
}
