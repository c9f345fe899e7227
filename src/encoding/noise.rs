//! Training-time noise.
//!
//! Noise is drawn per encoded column from its own seeded generator, row by
//! row, so a training transform is reproducible for a given seed.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Default amplitude of training-time noise.
pub const DEFAULT_NOISE_LEVEL: f64 = 0.01;

const COLUMN_SEED_MIX: u64 = 0x9E37_79B9_7F4A_7C15;

/// Reproducible uniform noise in `[-level, level)` for one encoded column.
///
/// The generator is seeded from the caller's seed mixed with the column
/// position, so each column draws an independent but repeatable sequence.
#[derive(Debug)]
pub struct NoiseGenerator {
    rng: StdRng,
    level: f64,
}

impl NoiseGenerator {
    pub fn new(seed: u64, column_index: usize, level: f64) -> Self {
        let mixed = seed ^ (column_index as u64).wrapping_add(1).wrapping_mul(COLUMN_SEED_MIX);
        Self {
            rng: StdRng::seed_from_u64(mixed),
            level,
        }
    }

    /// Next noise sample. Always `0.0` when the level is zero.
    pub fn next_noise(&mut self) -> f64 {
        if self.level == 0.0 {
            return 0.0;
        }
        self.rng.gen::<f64>() * 2.0 * self.level - self.level
    }
}
