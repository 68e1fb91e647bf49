//! CSSCHH: cascading Space-Saving over flows (SS1) and over combined `(x,
//! y)` keys (SS2), per Zhao et al., "Fast and accurate mining of correlated
//! heavy hitters" (<https://doi.org/10.1007/s10618-017-0526-x>).
//!
//! Unlike [`crate::duet::Duet`], there is no separate CountMin gate here —
//! SS1 itself is the flow-size estimator, and its Space-Saving discipline
//! (not Misra-Gries) is what SS2's hot-element test is calibrated against:
//! `xy_count >= phi * (flow_freq - N / k1)`, where `N` is the total stream
//! length seen so far and `k1` is SS1's capacity. This crate tracks `N`
//! internally, incrementing it on every `update` (see `DESIGN.md`'s Open
//! Question decision), rather than requiring the caller to supply it.

use crate::common::indexed_space_saving::IndexedSpaceSaving;
use crate::common::keys::{combine_xy, split_xy};
use crate::common::validation::{require_nonzero, validate_memory_kb};
use crate::common::Result;
use std::collections::BTreeMap;

/// Fraction of the memory budget given to SS1 (the flow table); the
/// remainder backs SS2 (the combined-key table).
const SS1_MEMORY_FRACTION: f64 = 0.40;

/// A CSSCHH instance.
#[derive(Debug, Clone)]
pub struct CssChh {
    ss1: IndexedSpaceSaving<u32>,
    ss2: IndexedSpaceSaving<u64>,
    k1: u32,
    n: u64,
}

impl CssChh {
    /// Builds a sketch sized from `memory_kb`.
    pub fn new(memory_kb: f32) -> Result<Self> {
        validate_memory_kb(memory_kb)?;

        let ss1_memo_kb = memory_kb as f64 * SS1_MEMORY_FRACTION;
        let ss2_memo_kb = memory_kb as f64 - ss1_memo_kb;

        // 32-bit key + 32-bit counter per SS1 entry.
        let max_num_ss1 = (ss1_memo_kb * 1024.0 * 8.0 / 64.0) as usize;
        // 64-bit key + 32-bit counter per SS2 entry.
        let max_num_ss2 = (ss2_memo_kb * 1024.0 * 8.0 / 96.0) as usize;

        require_nonzero(max_num_ss1, "ss1_capacity")?;
        require_nonzero(max_num_ss2, "ss2_capacity")?;

        Ok(Self {
            ss1: IndexedSpaceSaving::new(max_num_ss1),
            ss2: IndexedSpaceSaving::new(max_num_ss2),
            k1: max_num_ss1 as u32,
            n: 0,
        })
    }

    /// Diagnostic count of index-map repairs performed by either underlying
    /// Space-Saving table; always zero in ordinary operation.
    pub fn index_repairs(&self) -> u64 {
        self.ss1.repairs() + self.ss2.repairs()
    }

    /// Total number of `(x, y)` pairs observed so far.
    pub fn total_count(&self) -> u64 {
        self.n
    }

    /// Records one occurrence of `(x, y)`.
    pub fn update(&mut self, x: u32, y: u32) {
        self.n += 1;
        self.ss1.update(x);
        self.ss2.update(combine_xy(x, y));
    }

    /// Returns heavy flows at or above `heavy_hitter_threshold`, and every
    /// tracked combined key whose SS2 count is at or above
    /// `phi * (flow_freq - N / k1)`.
    pub fn query(
        &self,
        heavy_hitter_threshold: u32,
        phi: f32,
    ) -> (BTreeMap<u32, u32>, BTreeMap<u32, BTreeMap<u32, u32>>) {
        let mut heavy_hitters = BTreeMap::new();
        for (label, freq) in self.ss1.iter() {
            if freq >= heavy_hitter_threshold {
                heavy_hitters.insert(label, freq);
            }
        }

        let mut quad_elements: BTreeMap<u32, BTreeMap<u32, u32>> = BTreeMap::new();
        let correction = (self.n / self.k1.max(1) as u64) as u32;

        for (combined_xy, xy_count) in self.ss2.iter() {
            let (x, y) = split_xy(combined_xy);
            if let Some(&freq) = heavy_hitters.get(&x) {
                if xy_count as f32 >= hot_threshold(freq, correction, phi) {
                    quad_elements.entry(x).or_default().insert(y, xy_count);
                }
            }
        }

        (heavy_hitters, quad_elements)
    }
}

/// `phi * (freq - correction)`, in the original's `uint32_t` arithmetic: the
/// subtraction wraps in unsigned 32-bit space rather than going negative, so
/// once `correction` (`N / k1`) exceeds `freq` the wrapped value is huge and
/// the caller's `xy_count >= threshold` test is always false for that flow.
fn hot_threshold(freq: u32, correction: u32, phi: f32) -> f32 {
    phi * freq.wrapping_sub(correction) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_memory() {
        assert!(CssChh::new(0.0).is_err());
    }

    #[test]
    fn single_heavy_flow_is_detected() {
        let mut c = CssChh::new(32.0).unwrap();
        for _ in 0..100 {
            c.update(1, 10);
        }
        let (heavy, elements) = c.query(10, 0.1);
        assert!(heavy.contains_key(&1));
        assert!(elements[&1].contains_key(&10));
    }

    #[test]
    fn below_threshold_flow_not_reported() {
        let mut c = CssChh::new(32.0).unwrap();
        for _ in 0..3 {
            c.update(2, 20);
        }
        let (heavy, _) = c.query(50, 0.1);
        assert!(!heavy.contains_key(&2));
    }

    #[test]
    fn n_tracks_total_updates() {
        let mut c = CssChh::new(16.0).unwrap();
        for i in 0..37u32 {
            c.update(i % 3, i);
        }
        assert_eq!(c.total_count(), 37);
    }

    #[test]
    fn no_index_repairs_in_ordinary_operation() {
        let mut c = CssChh::new(16.0).unwrap();
        for i in 0..500u32 {
            c.update(i % 10, i);
        }
        assert_eq!(c.index_repairs(), 0);
    }

    #[test]
    fn hot_threshold_wraps_instead_of_going_negative_when_correction_exceeds_freq() {
        // freq=5, correction=10: the original's uint32_t subtraction wraps
        // to a huge value here rather than producing -5, so the threshold
        // is astronomically large and no xy_count could ever clear it.
        let wrapped = hot_threshold(5, 10, 1.0);
        assert!(wrapped > 1_000_000.0);
    }

    #[test]
    fn hot_threshold_matches_plain_subtraction_when_freq_exceeds_correction() {
        assert_eq!(hot_threshold(100, 10, 0.5), 45.0);
    }
}
