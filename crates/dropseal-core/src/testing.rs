//! In-crate test doubles.
//!
//! Unit tests cannot use `dropseal-harness` (it depends on this crate), so
//! they get a minimal environment and in-memory collaborators here.

use std::{
    collections::HashMap,
    io,
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, Ordering},
    },
};

use async_trait::async_trait;
use dropseal_store::{MemoryStorage, Mutation, Storage, StorageError};

use crate::{
    code::ShareCode,
    collaborator::{CodeSink, FileSystem, Operator},
    env::Environment,
    error::NetworkError,
    metadata::RemoteShare,
    resolver::MetadataResolver,
};

/// Manual clock plus a splitmix64 byte stream.
#[derive(Clone)]
pub(crate) struct TestEnv {
    now: Arc<AtomicU64>,
    state: Arc<Mutex<u64>>,
}

impl TestEnv {
    pub(crate) fn new(seed: u64) -> Self {
        Self { now: Arc::new(AtomicU64::new(1_700_000_000)), state: Arc::new(Mutex::new(seed)) }
    }

    pub(crate) fn advance_secs(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Environment for TestEnv {
    fn wall_clock_secs(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        let mut state = self.state.lock().unwrap();
        for chunk in buffer.chunks_mut(8) {
            *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
            let mut z = *state;
            z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
            z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
            z ^= z >> 31;
            chunk.copy_from_slice(&z.to_le_bytes()[..chunk.len()]);
        }
    }
}

#[derive(Default)]
pub(crate) struct MapFs {
    files: Mutex<HashMap<PathBuf, Vec<u8>>>,
}

impl MapFs {
    pub(crate) fn with_file(path: &str, contents: &[u8]) -> Self {
        let fs = Self::default();
        fs.files.lock().unwrap().insert(PathBuf::from(path), contents.to_vec());
        fs
    }

    pub(crate) fn contents(&self, path: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(Path::new(path)).cloned()
    }
}

impl FileSystem for MapFs {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file"))
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        self.files.lock().unwrap().insert(path.to_path_buf(), contents.to_vec());
        Ok(())
    }
}

pub(crate) struct FixedOperator {
    pub(crate) peer: Option<String>,
    pub(crate) destination: Option<PathBuf>,
}

impl FixedOperator {
    pub(crate) fn saving_to(path: &str) -> Self {
        Self { peer: None, destination: Some(PathBuf::from(path)) }
    }

    pub(crate) fn cancelling() -> Self {
        Self { peer: None, destination: None }
    }
}

impl Operator for FixedOperator {
    fn peer_address(&self) -> Option<String> {
        self.peer.clone()
    }

    fn save_destination(&self, _suggested_name: &str) -> Option<PathBuf> {
        self.destination.clone()
    }
}

#[derive(Default)]
pub(crate) struct VecSink {
    pub(crate) codes: Mutex<Vec<ShareCode>>,
}

impl CodeSink for VecSink {
    fn offer(&self, code: &ShareCode) -> io::Result<()> {
        self.codes.lock().unwrap().push(*code);
        Ok(())
    }
}

/// Resolver answering every lookup with the same result.
pub(crate) struct FixedResolver(pub(crate) Result<RemoteShare, NetworkError>);

#[async_trait]
impl MetadataResolver for FixedResolver {
    async fn fetch(&self, _peer: &str, _code: &ShareCode) -> Result<RemoteShare, NetworkError> {
        self.0.clone()
    }
}

/// Memory store whose `flush` always fails.
#[derive(Clone, Default)]
pub(crate) struct FlushFails(pub(crate) MemoryStorage);

impl Storage for FlushFails {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        self.0.get(key)
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        self.0.set(key, value)
    }

    fn delete(&self, key: &str) -> Result<bool, StorageError> {
        self.0.delete(key)
    }

    fn update<T, F>(&self, key: &str, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(Option<&[u8]>) -> (Mutation, T),
    {
        self.0.update(key, f)
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        self.0.keys_with_prefix(prefix)
    }

    fn flush(&self) -> Result<(), StorageError> {
        Err(StorageError::Io("flush failed".to_string()))
    }
}
