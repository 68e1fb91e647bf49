//! Count-Min sketch: a depth-3 counter matrix used as every other sketch's
//! flow-size estimator.
//!
//! Every sketch in this crate treats a flow's size as "how much memory does
//! it deserve", and that question is answered by this matrix rather than by
//! each sketch tracking its own per-flow counters. `query` never
//! underestimates the true count; it is the ceiling every heavy-hitter
//! decision is compared against.

use crate::common::hash::hash_u32;
use crate::common::keys::generate_seeds_with_rng;
use crate::common::validation::{require_nonzero, validate_memory_kb};
use crate::common::{Result, SketchError};
use rand::rngs::SmallRng;
use rand::SeedableRng;

/// Fixed depth of the counter matrix; three independent hash rows, matching
/// the original sketch's construction.
const DEPTH: usize = 3;

/// A d=3, w-derived Count-Min sketch over `u32` flow labels.
#[derive(Debug, Clone)]
pub struct CountMin {
    width: usize,
    seeds: [u32; DEPTH],
    table: Vec<u32>,
}

impl CountMin {
    /// Builds a sketch sized from `memory_kb`, with randomly generated row
    /// seeds.
    pub fn new(memory_kb: f32) -> Result<Self> {
        let mut rng = SmallRng::from_os_rng();
        Self::build(memory_kb, &mut rng)
    }

    /// Builds a sketch with row seeds drawn from a seeded RNG, for
    /// reproducible tests and benchmarks.
    pub fn with_seed(memory_kb: f32, seed: u64) -> Result<Self> {
        let mut rng = SmallRng::seed_from_u64(seed);
        Self::build(memory_kb, &mut rng)
    }

    fn build(memory_kb: f32, rng: &mut SmallRng) -> Result<Self> {
        validate_memory_kb(memory_kb)?;

        let total_bits = memory_kb as f64 * 1024.0 * 8.0;
        let width = (total_bits / (DEPTH as f64 * 32.0)).floor() as usize;
        require_nonzero(width, "width")?;

        let generated = generate_seeds_with_rng(DEPTH, rng);
        let mut seeds = [0u32; DEPTH];
        seeds.copy_from_slice(&generated);

        Ok(Self {
            width,
            seeds,
            table: vec![0u32; DEPTH * width],
        })
    }

    /// Row-major index of row `row`, column derived from hashing `x` with
    /// that row's seed.
    fn cell(&self, row: usize, x: u32) -> usize {
        let col = (hash_u32(x, self.seeds[row]) as usize) % self.width;
        row * self.width + col
    }

    /// Adds `weight` to every row's cell for `x`. Counters are monotone
    /// non-decreasing; overflow is not expected in practice and saturates
    /// rather than wrapping, since a wrapped counter would corrupt every
    /// downstream heavy-hitter decision that reads it.
    pub fn update(&mut self, x: u32, weight: u32) {
        for row in 0..DEPTH {
            let idx = self.cell(row, x);
            self.table[idx] = self.table[idx].saturating_add(weight);
        }
    }

    /// Estimated frequency of `x`: the minimum across all rows, never less
    /// than the true count.
    pub fn query(&self, x: u32) -> u32 {
        (0..DEPTH).map(|row| self.table[self.cell(row, x)]).min().unwrap_or(0)
    }

    /// Matrix width (columns per row), derived once at construction.
    pub fn width(&self) -> usize {
        self.width
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_memory() {
        assert!(matches!(
            CountMin::with_seed(0.0, 1),
            Err(SketchError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn rejects_memory_too_small_for_one_column() {
        // 3 rows * 32 bits = 96 bits minimum per column; a few bytes can't
        // produce even one column.
        assert!(matches!(
            CountMin::with_seed(0.0001, 1),
            Err(SketchError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn query_never_underestimates_true_count() {
        let mut cm = CountMin::with_seed(4.0, 42).unwrap();
        for _ in 0..37 {
            cm.update(7, 1);
        }
        assert!(cm.query(7) >= 37);
    }

    #[test]
    fn unseen_key_is_bounded_by_noise_from_collisions() {
        let cm = CountMin::with_seed(4.0, 1).unwrap();
        assert_eq!(cm.query(999), 0);
    }

    #[test]
    fn update_is_additive() {
        let mut cm = CountMin::with_seed(8.0, 2).unwrap();
        cm.update(5, 3);
        cm.update(5, 4);
        assert!(cm.query(5) >= 7);
    }

    #[test]
    fn same_seed_is_reproducible() {
        let a = CountMin::with_seed(4.0, 99).unwrap();
        let b = CountMin::with_seed(4.0, 99).unwrap();
        assert_eq!(a.width(), b.width());
        assert_eq!(a.seeds, b.seeds);
    }
}
