//! GlobalHH: a [`CountMin`] flow-size estimator paired with one global
//! Space-Saving table over combined `(x, y)` keys.
//!
//! Unlike [`crate::dual_sketch::DualSketch`] and [`crate::duet::Duet`],
//! GlobalHH makes no attempt to cluster an element with its owning flow —
//! every observed pair competes for the same pool of Space-Saving slots, and
//! a flow's size is always read straight from CountMin rather than
//! accumulated locally.

use crate::common::indexed_space_saving::IndexedSpaceSaving;
use crate::common::keys::{combine_xy, split_xy};
use crate::common::validation::{require_nonzero, validate_memory_kb};
use crate::common::Result;
use crate::countmin::CountMin;
use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};
use std::collections::BTreeMap;

/// Fraction of the memory budget given to the CountMin flow-size estimator;
/// the remainder backs the Space-Saving table.
const CM_MEMORY_FRACTION: f64 = 0.40;

/// A GlobalHH instance.
#[derive(Debug, Clone)]
pub struct GlobalHh {
    count_min: CountMin,
    space_saving: IndexedSpaceSaving<u64>,
}

impl GlobalHh {
    /// Builds a sketch sized from `memory_kb`, with a randomly generated
    /// CountMin seed.
    pub fn new(memory_kb: f32) -> Result<Self> {
        let mut rng = SmallRng::from_os_rng();
        Self::build(memory_kb, &mut rng)
    }

    /// Builds a sketch with a deterministic CountMin seed, for reproducible
    /// tests and benchmarks.
    pub fn with_seed(memory_kb: f32, seed: u64) -> Result<Self> {
        let mut rng = SmallRng::seed_from_u64(seed);
        Self::build(memory_kb, &mut rng)
    }

    fn build(memory_kb: f32, rng: &mut SmallRng) -> Result<Self> {
        validate_memory_kb(memory_kb)?;

        let cm_memo_kb = memory_kb * CM_MEMORY_FRACTION as f32;
        let count_min = CountMin::with_seed(cm_memo_kb, rng.next_u64())?;

        let ss_memo_kb = memory_kb - cm_memo_kb;
        let ss_bits = ss_memo_kb as f64 * 1024.0 * 8.0;
        // 64-bit combined key + 32-bit counter per entry.
        let max_num = (ss_bits / 96.0) as usize;
        require_nonzero(max_num, "space_saving_capacity")?;

        Ok(Self {
            count_min,
            space_saving: IndexedSpaceSaving::new(max_num),
        })
    }

    /// Diagnostic count of index-map repairs performed by the underlying
    /// Space-Saving table; always zero in ordinary operation.
    pub fn index_repairs(&self) -> u64 {
        self.space_saving.repairs()
    }

    /// Records one occurrence of `(x, y)`.
    pub fn update(&mut self, x: u32, y: u32) {
        self.count_min.update(x, 1);
        self.space_saving.update(combine_xy(x, y));
    }

    /// Returns heavy flows at or above `heavy_hitter_threshold` (estimated
    /// via CountMin), and every tracked combined key whose Space-Saving
    /// count is at or above `phi` times its flow's CountMin estimate.
    pub fn query(
        &self,
        heavy_hitter_threshold: u32,
        phi: f32,
    ) -> (BTreeMap<u32, u32>, BTreeMap<u32, BTreeMap<u32, u32>>) {
        let mut heavy_hitters = BTreeMap::new();
        let mut quad_elements: BTreeMap<u32, BTreeMap<u32, u32>> = BTreeMap::new();

        for (combined_xy, xy_count) in self.space_saving.iter() {
            let (x, y) = split_xy(combined_xy);
            let cm_es = self.count_min.query(x);

            if cm_es >= heavy_hitter_threshold {
                heavy_hitters.insert(x, cm_es);
                if xy_count as f32 >= cm_es as f32 * phi {
                    quad_elements.entry(x).or_default().insert(y, xy_count);
                }
            }
        }

        (heavy_hitters, quad_elements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_memory() {
        assert!(GlobalHh::with_seed(0.0, 1).is_err());
    }

    #[test]
    fn single_heavy_flow_is_detected() {
        let mut g = GlobalHh::with_seed(32.0, 1).unwrap();
        for _ in 0..100 {
            g.update(5, 50);
        }
        let (heavy, elements) = g.query(10, 0.1);
        assert!(heavy.contains_key(&5));
        assert!(elements[&5].contains_key(&50));
    }

    #[test]
    fn below_threshold_flow_is_not_reported() {
        let mut g = GlobalHh::with_seed(32.0, 1).unwrap();
        for _ in 0..3 {
            g.update(6, 60);
        }
        let (heavy, _) = g.query(50, 0.1);
        assert!(!heavy.contains_key(&6));
    }

    #[test]
    fn element_below_phi_fraction_is_excluded() {
        let mut g = GlobalHh::with_seed(32.0, 4).unwrap();
        for _ in 0..100 {
            g.update(9, 900); // dominant element
        }
        g.update(9, 901); // rare element, single occurrence
        let (_, elements) = g.query(10, 0.5);
        assert!(!elements[&9].contains_key(&901));
    }

    #[test]
    fn no_index_repairs_in_ordinary_operation() {
        let mut g = GlobalHh::with_seed(16.0, 5).unwrap();
        for i in 0..500u32 {
            g.update(i % 10, i);
        }
        assert_eq!(g.index_repairs(), 0);
    }
}
