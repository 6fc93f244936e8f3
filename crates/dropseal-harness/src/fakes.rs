//! In-memory collaborators.
//!
//! Each fake records what the core asked of it so tests can assert on the
//! interaction as well as the result.

use std::{
    collections::BTreeMap,
    io,
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use dropseal_core::{
    CodeSink, FileSystem, MetadataResolver, NetworkError, Operator, RemoteShare, ShareCode,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// File system held in a map.
#[derive(Clone, Default)]
pub struct MemoryFs {
    files: Arc<Mutex<BTreeMap<PathBuf, Vec<u8>>>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryFs {
    /// Empty file system.
    pub fn new() -> Self {
        Self::default()
    }

    /// File system holding one file.
    pub fn with_file(path: impl Into<PathBuf>, contents: &[u8]) -> Self {
        let fs = Self::new();
        fs.insert(path, contents);
        fs
    }

    /// Create or replace a file.
    pub fn insert(&self, path: impl Into<PathBuf>, contents: &[u8]) {
        lock(&self.files).insert(path.into(), contents.to_vec());
    }

    /// Contents of a file, if it exists.
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        lock(&self.files).get(path.as_ref()).cloned()
    }

    /// Number of files.
    pub fn len(&self) -> usize {
        lock(&self.files).len()
    }

    /// Whether there are no files.
    pub fn is_empty(&self) -> bool {
        lock(&self.files).is_empty()
    }

    /// Make every subsequent write fail.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl FileSystem for MemoryFs {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        lock(&self.files)
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file"))
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"));
        }
        lock(&self.files).insert(path.to_path_buf(), contents.to_vec());
        Ok(())
    }
}

/// Operator answering dialogs from a script.
#[derive(Debug, Default)]
pub struct ScriptedOperator {
    peer: Option<String>,
    destination: Option<PathBuf>,
    suggestions: Mutex<Vec<String>>,
    peer_prompts: AtomicUsize,
}

impl ScriptedOperator {
    /// Operator with no peer that cancels every save.
    pub fn cancelling() -> Self {
        Self::default()
    }

    /// Operator with no peer that saves to `path`.
    pub fn saving_to(path: impl Into<PathBuf>) -> Self {
        Self { destination: Some(path.into()), ..Self::default() }
    }

    /// Also name `peer` when asked for a peer address.
    #[must_use]
    pub fn with_peer(mut self, peer: impl Into<String>) -> Self {
        self.peer = Some(peer.into());
        self
    }

    /// Save names the core suggested, in order.
    pub fn suggested_names(&self) -> Vec<String> {
        lock(&self.suggestions).clone()
    }

    /// How often the core asked for a peer address.
    pub fn peer_prompts(&self) -> usize {
        self.peer_prompts.load(Ordering::SeqCst)
    }
}

impl Operator for ScriptedOperator {
    fn peer_address(&self) -> Option<String> {
        self.peer_prompts.fetch_add(1, Ordering::SeqCst);
        self.peer.clone()
    }

    fn save_destination(&self, suggested_name: &str) -> Option<PathBuf> {
        lock(&self.suggestions).push(suggested_name.to_string());
        self.destination.clone()
    }
}

/// Sink remembering every code it was offered.
#[derive(Debug, Default)]
pub struct RecordingSink {
    codes: Mutex<Vec<ShareCode>>,
    fail: bool,
}

impl RecordingSink {
    /// Sink that accepts codes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink that records codes but reports failure, like a missing
    /// clipboard.
    pub fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }

    /// Codes offered so far.
    pub fn codes(&self) -> Vec<ShareCode> {
        lock(&self.codes).clone()
    }
}

impl CodeSink for RecordingSink {
    fn offer(&self, code: &ShareCode) -> io::Result<()> {
        lock(&self.codes).push(*code);
        if self.fail {
            return Err(io::Error::other("clipboard unavailable"));
        }
        Ok(())
    }
}

/// How a [`StubResolver`] answers.
#[derive(Debug, Clone)]
pub enum StubBehavior {
    /// Answer immediately.
    Respond(RemoteShare),
    /// Fail immediately.
    Fail(NetworkError),
    /// Answer after a delay.
    Delayed(Duration, RemoteShare),
    /// Never answer.
    Hang,
}

/// Resolver with a fixed behavior and a call counter.
#[derive(Debug, Clone)]
pub struct StubResolver {
    behavior: StubBehavior,
    calls: Arc<AtomicUsize>,
    peers: Arc<Mutex<Vec<String>>>,
}

impl StubResolver {
    /// Resolver with `behavior`.
    pub fn new(behavior: StubBehavior) -> Self {
        Self { behavior, calls: Arc::new(AtomicUsize::new(0)), peers: Arc::default() }
    }

    /// Number of lookups made, across clones.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Peer addresses looked up, in order.
    pub fn peers(&self) -> Vec<String> {
        lock(&self.peers).clone()
    }
}

#[async_trait]
impl MetadataResolver for StubResolver {
    async fn fetch(&self, peer: &str, _code: &ShareCode) -> Result<RemoteShare, NetworkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.peers).push(peer.to_string());

        match &self.behavior {
            StubBehavior::Respond(share) => Ok(share.clone()),
            StubBehavior::Fail(err) => Err(err.clone()),
            StubBehavior::Delayed(delay, share) => {
                tokio::time::sleep(*delay).await;
                Ok(share.clone())
            },
            StubBehavior::Hang => std::future::pending().await,
        }
    }
}
