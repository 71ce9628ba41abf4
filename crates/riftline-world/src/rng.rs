//! The session PRNG.
//!
//! Every random choice the core makes (critical hits, jungle AI tiebreaks,
//! separation of co-located bodies) goes through a [`SessionRng`] seeded at
//! session start. Nothing in the core may touch OS entropy or thread-local
//! RNGs: two sessions constructed with the same seed and fed the same inputs
//! must make identical choices.
//!
//! The generator is PCG32 (`rand_pcg::Pcg32`): small, fast, and with a
//! documented stream-selection mechanism used by
//! [`SessionRng::derive_stream`] to hand decorrelated generators to
//! subsystems (e.g. the deterministic bush-layout derivation shares the
//! algorithm but runs on its own stream so map generation does not perturb
//! combat rolls).

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::math::Vec2;

// ---------------------------------------------------------------------------
// SessionRng
// ---------------------------------------------------------------------------

/// The single randomness source for a session.
#[derive(Debug, Clone)]
pub struct SessionRng {
    rng: Pcg32,
    seed: u64,
}

impl SessionRng {
    /// Create a session generator from the match seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            seed,
        }
    }

    /// The seed this generator was constructed with.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// A uniformly random `f64` in `[0, 1)`.
    #[inline]
    pub fn next_f64(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    /// A uniformly random value in `[lo, hi)`.
    #[inline]
    pub fn range_f64(&mut self, lo: f64, hi: f64) -> f64 {
        self.rng.gen_range(lo..hi)
    }

    /// A uniformly random index in `[0, len)`. `len` must be non-zero.
    #[inline]
    pub fn index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }

    /// Bernoulli trial with probability `p` (clamped to `[0, 1]`).
    #[inline]
    pub fn chance(&mut self, p: f64) -> bool {
        self.rng.gen_bool(p.clamp(0.0, 1.0))
    }

    /// A uniformly random unit direction. Used to separate co-located bodies.
    #[inline]
    pub fn unit_dir(&mut self) -> Vec2 {
        let angle = self.range_f64(0.0, std::f64::consts::TAU);
        Vec2::from_angle(angle)
    }

    /// Derive a decorrelated PCG32 stream for a named subsystem.
    ///
    /// The stream is a pure function of `(seed, label)`: both sides of a
    /// connection (and both runs of a determinism test) derive the same
    /// sequence. Drawing from a derived stream does not advance the session
    /// generator.
    pub fn derive_stream(&self, label: &str) -> Pcg32 {
        derive_stream(self.seed, label)
    }
}

/// Stream derivation shared with consumers that only hold the raw seed.
///
/// The label folds into the seed with an FNV-1a pass, then seeds a fresh
/// PCG32. Documented so clients can mirror the derivation exactly.
pub fn derive_stream(seed: u64, label: &str) -> Pcg32 {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;
    let mut h = FNV_OFFSET ^ seed;
    for byte in label.as_bytes() {
        h ^= *byte as u64;
        h = h.wrapping_mul(FNV_PRIME);
    }
    Pcg32::seed_from_u64(h)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
