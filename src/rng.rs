//! Seedable pseudo-random source shared by palette clustering and the
//! animation timers.
//!
//! A fixed seed replays the exact same wink timings, sleep cycles, outline
//! jitter and k-means initialization, which keeps renders reproducible.

use std::time::{SystemTime, UNIX_EPOCH};

/// Seed used when nothing else is configured.
pub const DEFAULT_SEED: u64 = 42;

/// A simple deterministic PRNG (xorshift64).
#[derive(Debug, Clone)]
pub struct Rng {
    state: u64,
}

impl Rng {
    pub fn new(seed: u64) -> Self {
        // Ensure non-zero state
        Self { state: if seed == 0 { 0x12345678_9ABCDEF0 } else { seed } }
    }

    /// Seed from the system clock, for callers that want run-to-run variety.
    pub fn from_entropy() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(DEFAULT_SEED);
        Self::new(nanos ^ 0x9E37_79B9_7F4A_7C15)
    }

    /// Generate next u64 value.
    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Generate a random f64 in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Generate a random f64 in [min, max).
    pub fn range(&mut self, min: f64, max: f64) -> f64 {
        min + (max - min) * self.next_f64()
    }

    /// Generate a random index in [0, len). Returns 0 for an empty range.
    pub fn index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        (self.next_u64() % len as u64) as usize
    }

    /// One of -1, 0 or 1 with equal probability.
    pub fn jitter(&mut self) -> i32 {
        self.index(3) as i32 - 1
    }
}

impl Default for Rng {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}
