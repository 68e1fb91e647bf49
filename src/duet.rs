//! DUET: a Count-Min flow-size gate feeding a small Misra-Gries `Filter`,
//! which promotes flows into a weighted Misra-Gries `STable` once they look
//! like heavy hitters.
//!
//! Below the promotion threshold `Nth`, a flow's (x, y) pairs are tracked
//! cheaply in `Filter`'s decrement-all-on-miss discipline. The moment
//! [`CountMin`] reports a flow has crossed `Nth`, every row of `Filter` that
//! still owns one of that flow's cells is drained into `STable`, which uses
//! the weighted Space-Saving-style replace-minimum discipline instead
//! (see [`DESIGN.md`](../../DESIGN.md) on why these two disciplines are kept
//! as separate types rather than unified).

use crate::common::hash::hash_u32;
use crate::common::keys::{combine_xy, generate_seeds_with_rng, split_xy};
use crate::common::validation::validate_memory_kb;
use crate::common::Result;
use crate::countmin::CountMin;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::collections::BTreeMap;

/// CountMin estimate at or above which a flow is promoted from `Filter` to
/// `STable`.
const NTH: u32 = 1000;

const CM_MEMORY_FRACTION: f64 = 0.35;
const FILTER_MEMORY_FRACTION: f64 = 0.35;
const STABLE_MEMORY_FRACTION: f64 = 0.30;

/// Rows in `Filter`.
const D_FILTER: usize = 4;
/// Rows in `STable`; fixed regardless of memory budget, matching the
/// structural choice of the two-level design.
const L_STABLE: usize = 200;

/// Hash seed distinguishing an element `y`'s row in `Filter` from the
/// per-row seed used to place the owning flow `x` within that row. Fixed
/// structural parameters of the two-level design, not per-instance random
/// seeds (see `DESIGN.md`).
const FILTER_Y_SEED: u32 = 799_957_137;
/// Hash seed used to place a flow `x`'s row in `STable`.
const STABLE_X_SEED: u32 = 17_157_137;

#[derive(Debug, Clone, Copy, Default)]
struct Bucket {
    element: u64,
    count: u32,
}

/// A DUET instance.
#[derive(Debug, Clone)]
pub struct Duet {
    count_min: CountMin,
    filter: Vec<Vec<Bucket>>,
    w_filter: usize,
    stable: Vec<Vec<Bucket>>,
    r_stable: usize,
    rand_seeds: Vec<u32>,
}

impl Duet {
    /// Builds a sketch sized from `memory_kb`, with randomly generated hash
    /// seeds.
    pub fn new(memory_kb: f32) -> Result<Self> {
        let mut rng = SmallRng::from_os_rng();
        Self::build(memory_kb, &mut rng)
    }

    /// Builds a sketch with deterministic hash seeds, for reproducible
    /// tests and benchmarks.
    pub fn with_seed(memory_kb: f32, seed: u64) -> Result<Self> {
        let mut rng = SmallRng::seed_from_u64(seed);
        Self::build(memory_kb, &mut rng)
    }

    fn build(memory_kb: f32, rng: &mut SmallRng) -> Result<Self> {
        validate_memory_kb(memory_kb)?;

        let total_bits = memory_kb as f64 * 1024.0 * 8.0;

        let cm_bits = total_bits * CM_MEMORY_FRACTION;
        let count_min = CountMin::with_seed((cm_bits / 1024.0 / 8.0) as f32, rng_seed(rng))?;

        let filter_bits = total_bits * FILTER_MEMORY_FRACTION;
        let w_filter = ((filter_bits / (D_FILTER as f64 * 96.0)) as usize).max(1);
        let filter = vec![vec![Bucket::default(); w_filter]; D_FILTER];

        let stable_bits = total_bits * STABLE_MEMORY_FRACTION;
        let r_stable = ((stable_bits / (L_STABLE as f64 * 96.0)) as usize).max(1);
        let stable = vec![vec![Bucket::default(); r_stable]; L_STABLE];

        let rand_seeds = generate_seeds_with_rng(D_FILTER, rng);

        Ok(Self {
            count_min,
            filter,
            w_filter,
            stable,
            r_stable,
            rand_seeds,
        })
    }

    fn insert_to_filter(&mut self, x: u32, y: u32) {
        let row = (hash_u32(y, FILTER_Y_SEED) as usize) % D_FILTER;
        let col = (hash_u32(x, self.rand_seeds[row]) as usize) % self.w_filter;
        let combined_xy = combine_xy(x, y);

        let cell = &mut self.filter[row][col];
        if cell.element == 0 {
            *cell = Bucket {
                element: combined_xy,
                count: 1,
            };
        } else if cell.element == combined_xy {
            cell.count += 1;
        } else {
            cell.count -= 1;
            if cell.count == 0 {
                *cell = Bucket {
                    element: combined_xy,
                    count: 1,
                };
            }
        }
    }

    fn insert_to_table(&mut self, x: u32, y: u32, cnt: u32) {
        let combined_xy = combine_xy(x, y);
        let i = (hash_u32(x, STABLE_X_SEED) as usize) % L_STABLE;
        let row = &mut self.stable[i];

        let mut empty_j: Option<usize> = None;
        let mut min_j: Option<usize> = None;
        let mut min_count = u32::MAX;

        for (j, cell) in row.iter().enumerate() {
            if cell.element == combined_xy {
                row[j].count += cnt;
                return;
            }
            if cell.element == 0 && empty_j.is_none() {
                empty_j = Some(j);
            }
            if cell.element != 0 && cell.count < min_count {
                min_count = cell.count;
                min_j = Some(j);
            }
        }

        if let Some(j) = empty_j {
            row[j] = Bucket {
                element: combined_xy,
                count: cnt,
            };
            return;
        }

        let min_j = min_j.expect("row is full of occupied cells when no empty cell was found");
        if row[min_j].count > cnt {
            row[min_j].count -= cnt;
        } else {
            let remaining = cnt - row[min_j].count;
            row[min_j] = Bucket {
                element: combined_xy,
                count: remaining,
            };
        }
    }

    /// Records one occurrence of `(x, y)`.
    pub fn update(&mut self, x: u32, y: u32) {
        let cm_es = self.count_min.query(x);
        self.count_min.update(x, 1);

        if cm_es < NTH {
            self.insert_to_filter(x, y);

            if cm_es + 1 == NTH {
                self.promote(x);
            }
        } else {
            self.insert_to_table(x, y, 1);
        }
    }

    /// Drains every Filter row's cell for `x` into STable, once `x` has
    /// crossed the promotion threshold.
    fn promote(&mut self, x: u32) {
        for row in 0..D_FILTER {
            let col = (hash_u32(x, self.rand_seeds[row]) as usize) % self.w_filter;
            let cell = self.filter[row][col];
            if cell.element == 0 {
                continue;
            }
            let (label, y) = split_xy(cell.element);
            if label == x {
                self.insert_to_table(x, y, cell.count);
                self.filter[row][col] = Bucket::default();
            }
        }
    }

    /// Returns heavy flows at or above `heavy_hitter_threshold`, and every
    /// STable cell whose owning flow is heavy and whose count is at or
    /// above `phi` times that flow's estimate, keyed by combined `(x, y)`.
    pub fn query(&self, heavy_hitter_threshold: u32, phi: f32) -> (BTreeMap<u32, u32>, BTreeMap<u64, u32>) {
        let mut heavy_hitters = BTreeMap::new();
        let mut hot_quadratic_elements = BTreeMap::new();

        for row in &self.stable {
            for cell in row {
                if cell.element == 0 {
                    continue;
                }
                let (x, _y) = split_xy(cell.element);
                let cm_es = self.count_min.query(x);

                if cm_es >= heavy_hitter_threshold {
                    heavy_hitters.insert(x, cm_es);
                    if cell.count as f32 >= cm_es as f32 * phi {
                        hot_quadratic_elements.insert(cell.element, cell.count);
                    }
                }
            }
        }

        (heavy_hitters, hot_quadratic_elements)
    }

    /// [`Duet::query`] regrouped by flow: heavy flows mapped to their
    /// estimated frequency, and each heavy flow's hot elements mapped to
    /// their frequency.
    pub fn get_hh_and_hot_quad_ele(
        &self,
        heavy_hitter_threshold: u32,
        phi: f32,
    ) -> (BTreeMap<u32, u32>, BTreeMap<u32, BTreeMap<u32, u32>>) {
        let (heavy_hitters, hot_quadratic_elements) = self.query(heavy_hitter_threshold, phi);

        let mut hot_quad_elements: BTreeMap<u32, BTreeMap<u32, u32>> = BTreeMap::new();
        for (combined_xy, frequency) in hot_quadratic_elements {
            let (x, y) = split_xy(combined_xy);
            hot_quad_elements.entry(x).or_default().insert(y, frequency);
        }

        (heavy_hitters, hot_quad_elements)
    }
}

fn rng_seed(rng: &mut SmallRng) -> u64 {
    use rand::RngCore;
    rng.next_u64()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_memory() {
        assert!(Duet::with_seed(0.0, 1).is_err());
    }

    #[test]
    fn below_promotion_threshold_flow_not_reported() {
        let mut duet = Duet::with_seed(64.0, 1).unwrap();
        for _ in 0..5 {
            duet.update(1, 10);
        }
        let (heavy, _) = duet.get_hh_and_hot_quad_ele(1, 0.1);
        assert!(!heavy.contains_key(&1));
    }

    #[test]
    fn promoted_flow_is_tracked_in_stable() {
        let mut duet = Duet::with_seed(256.0, 2).unwrap();
        for _ in 0..(NTH + 50) {
            duet.update(7, 77);
        }
        let (heavy, elements) = duet.get_hh_and_hot_quad_ele(NTH, 0.5);
        assert!(heavy.contains_key(&7));
        assert!(elements[&7].contains_key(&77));
    }

    #[test]
    fn distinct_flows_do_not_interfere() {
        let mut duet = Duet::with_seed(256.0, 3).unwrap();
        for _ in 0..(NTH + 20) {
            duet.update(1, 10);
        }
        for _ in 0..10 {
            duet.update(2, 20);
        }
        let (heavy, _) = duet.get_hh_and_hot_quad_ele(NTH, 0.5);
        assert!(heavy.contains_key(&1));
        assert!(!heavy.contains_key(&2));
    }
}
