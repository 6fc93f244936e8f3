//! Simulated environment.
//!
//! Time only moves when a test moves it. Randomness comes from a seeded
//! `ChaCha8Rng` shared by all clones, so two runs with the same seed mint the
//! same codes, salts and nonces in the same order.

use std::{
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use dropseal_core::Environment;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Deterministic [`Environment`] for tests.
#[derive(Clone)]
pub struct SimEnv {
    now_secs: Arc<AtomicU64>,
    rng: Arc<Mutex<ChaCha8Rng>>,
}

impl SimEnv {
    /// Wall-clock time a fresh environment starts at (2023-11-14).
    pub const START_SECS: u64 = 1_700_000_000;

    /// Environment with seed 0.
    pub fn new() -> Self {
        Self::with_seed(0)
    }

    /// Environment whose RNG is seeded with `seed`.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            now_secs: Arc::new(AtomicU64::new(Self::START_SECS)),
            rng: Arc::new(Mutex::new(ChaCha8Rng::seed_from_u64(seed))),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        self.now_secs.fetch_add(by.as_secs(), Ordering::SeqCst);
    }

    /// Set the clock to an absolute Unix time.
    pub fn set_time(&self, secs: u64) {
        self.now_secs.store(secs, Ordering::SeqCst);
    }
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for SimEnv {
    fn wall_clock_secs(&self) -> u64 {
        self.now_secs.load(Ordering::SeqCst)
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner).fill_bytes(buffer);
    }
}
