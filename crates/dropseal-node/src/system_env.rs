//! Production Environment implementation using system time and RNG.
//!
//! Share expiry and every salt, nonce, per-file key and share code in a real
//! deployment come from here, so randomness is OS-grade and time is the wall
//! clock.

use dropseal_core::Environment;

/// Production environment using the system clock and getrandom.
///
/// # Panics
///
/// Panics if the OS RNG fails. Without working randomness no salt, key or
/// share code can be minted safely, and there is no meaningful fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    #[allow(clippy::disallowed_methods)]
    #[allow(clippy::expect_used)]
    fn wall_clock_secs(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("invariant: system clock is after Unix epoch (1970-01-01)")
            .as_secs()
    }

    #[allow(clippy::expect_used)]
    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer)
            .expect("invariant: OS RNG failure is unrecoverable - cannot mint keys securely");
    }
}
