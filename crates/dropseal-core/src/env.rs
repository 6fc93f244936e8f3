//! Environment abstraction for deterministic testing.
//!
//! Decouples share and credential logic from system resources (wall-clock
//! time, randomness). Enables deterministic tests with a manual clock and a
//! seeded RNG, and production use with real system resources.

/// Abstract environment providing time and randomness.
///
/// # Safety
///
/// Implementations MUST guarantee:
///
/// - `random_bytes()` uses cryptographically secure entropy in production
///   (salts, nonces, share keys and share codes all come from here)
/// - Methods are infallible except in exceptional circumstances (e.g., OS
///   entropy exhaustion)
pub trait Environment: Clone + Send + Sync + 'static {
    /// Current wall-clock time as seconds since the Unix epoch.
    ///
    /// Share expiry is an absolute timestamp, so this must be wall-clock
    /// time rather than a monotonic instant.
    fn wall_clock_secs(&self) -> u64;

    /// Fills the provided buffer with random bytes.
    ///
    /// # Invariants
    ///
    /// - Given the same RNG seed, this produces the same sequence of bytes
    /// - Uses cryptographically secure RNG
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Random fixed-size array.
    ///
    /// Convenience for salts, nonces and keys.
    fn random_array<const N: usize>(&self) -> [u8; N] {
        let mut bytes = [0u8; N];
        self.random_bytes(&mut bytes);
        bytes
    }
}
