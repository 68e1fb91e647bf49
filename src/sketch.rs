//! A uniform trait over all five correlated heavy hitter sketches, and an
//! enum for dispatching over whichever one a caller picked at runtime.
//!
//! Each sketch's native `query` differs slightly in shape — DualSketch's
//! takes no `phi` at all, for example — so the blanket impls here adapt
//! each one to the common `(threshold, phi) -> (flows, elements)` shape
//! rather than forcing every sketch's own API to match it exactly.

use crate::csschh::CssChh;
use crate::dual_sketch::DualSketch;
use crate::duet::Duet;
use crate::global_hh::GlobalHh;
use crate::two_d_misra_gries::TwoDMisraGries;
use std::collections::BTreeMap;

/// Common capability every correlated heavy hitter sketch in this crate
/// provides: record one `(x, y)` occurrence, and query for heavy flows and
/// their hot correlated elements.
pub trait CorrelatedHeavyHitterSketch {
    /// Records one occurrence of `(x, y)`.
    fn update(&mut self, x: u32, y: u32);

    /// Returns heavy flows at or above `heavy_hitter_threshold`, and for
    /// each, the elements whose count is at or above `phi` times the flow's
    /// estimated size.
    fn query(
        &self,
        heavy_hitter_threshold: u32,
        phi: f32,
    ) -> (BTreeMap<u32, u32>, BTreeMap<u32, BTreeMap<u32, u32>>);
}

impl CorrelatedHeavyHitterSketch for DualSketch {
    fn update(&mut self, x: u32, y: u32) {
        DualSketch::update(self, x, y);
    }

    fn query(
        &self,
        heavy_hitter_threshold: u32,
        phi: f32,
    ) -> (BTreeMap<u32, u32>, BTreeMap<u32, BTreeMap<u32, u32>>) {
        let (heavy_hitters, elements) = DualSketch::query(self, heavy_hitter_threshold);
        let filtered = elements
            .into_iter()
            .map(|(x, inner)| {
                let flow_size = heavy_hitters[&x] as f32;
                let hot = inner
                    .into_iter()
                    .filter(|&(_, count)| count as f32 >= phi * flow_size)
                    .collect();
                (x, hot)
            })
            .collect();
        (heavy_hitters, filtered)
    }
}

impl CorrelatedHeavyHitterSketch for Duet {
    fn update(&mut self, x: u32, y: u32) {
        Duet::update(self, x, y);
    }

    fn query(
        &self,
        heavy_hitter_threshold: u32,
        phi: f32,
    ) -> (BTreeMap<u32, u32>, BTreeMap<u32, BTreeMap<u32, u32>>) {
        Duet::get_hh_and_hot_quad_ele(self, heavy_hitter_threshold, phi)
    }
}

impl CorrelatedHeavyHitterSketch for GlobalHh {
    fn update(&mut self, x: u32, y: u32) {
        GlobalHh::update(self, x, y);
    }

    fn query(
        &self,
        heavy_hitter_threshold: u32,
        phi: f32,
    ) -> (BTreeMap<u32, u32>, BTreeMap<u32, BTreeMap<u32, u32>>) {
        GlobalHh::query(self, heavy_hitter_threshold, phi)
    }
}

impl CorrelatedHeavyHitterSketch for TwoDMisraGries {
    fn update(&mut self, x: u32, y: u32) {
        TwoDMisraGries::update(self, x, y);
    }

    fn query(
        &self,
        heavy_hitter_threshold: u32,
        phi: f32,
    ) -> (BTreeMap<u32, u32>, BTreeMap<u32, BTreeMap<u32, u32>>) {
        TwoDMisraGries::query(self, heavy_hitter_threshold, phi)
    }
}

impl CorrelatedHeavyHitterSketch for CssChh {
    fn update(&mut self, x: u32, y: u32) {
        CssChh::update(self, x, y);
    }

    fn query(
        &self,
        heavy_hitter_threshold: u32,
        phi: f32,
    ) -> (BTreeMap<u32, u32>, BTreeMap<u32, BTreeMap<u32, u32>>) {
        CssChh::query(self, heavy_hitter_threshold, phi)
    }
}

/// A tagged union over all five sketches, for callers (the out-of-scope
/// sweep/evaluation driver, in particular) that want to pick one at
/// runtime and dispatch through a single type.
#[derive(Debug, Clone)]
pub enum AnySketch {
    /// See [`DualSketch`].
    DualSketch(DualSketch),
    /// See [`Duet`].
    Duet(Duet),
    /// See [`GlobalHh`].
    GlobalHh(GlobalHh),
    /// See [`TwoDMisraGries`].
    TwoDMisraGries(TwoDMisraGries),
    /// See [`CssChh`].
    CssChh(CssChh),
}

impl CorrelatedHeavyHitterSketch for AnySketch {
    fn update(&mut self, x: u32, y: u32) {
        match self {
            AnySketch::DualSketch(s) => s.update(x, y),
            AnySketch::Duet(s) => s.update(x, y),
            AnySketch::GlobalHh(s) => s.update(x, y),
            AnySketch::TwoDMisraGries(s) => s.update(x, y),
            AnySketch::CssChh(s) => s.update(x, y),
        }
    }

    fn query(
        &self,
        heavy_hitter_threshold: u32,
        phi: f32,
    ) -> (BTreeMap<u32, u32>, BTreeMap<u32, BTreeMap<u32, u32>>) {
        match self {
            AnySketch::DualSketch(s) => {
                <DualSketch as CorrelatedHeavyHitterSketch>::query(s, heavy_hitter_threshold, phi)
            }
            AnySketch::Duet(s) => s.get_hh_and_hot_quad_ele(heavy_hitter_threshold, phi),
            AnySketch::GlobalHh(s) => s.query(heavy_hitter_threshold, phi),
            AnySketch::TwoDMisraGries(s) => s.query(heavy_hitter_threshold, phi),
            AnySketch::CssChh(s) => s.query(heavy_hitter_threshold, phi),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_sketch_dispatches_to_the_wrapped_sketch() {
        let mut sketch = AnySketch::GlobalHh(GlobalHh::with_seed(16.0, 1).unwrap());
        for _ in 0..50 {
            sketch.update(1, 2);
        }
        let (heavy, _) = sketch.query(10, 0.1);
        assert!(heavy.contains_key(&1));
    }

    #[test]
    fn dual_sketch_trait_impl_filters_by_phi() {
        let mut ds = DualSketch::with_seed(16.0, 1).unwrap();
        for _ in 0..10 {
            ds.update(1, 100);
        }
        ds.update(1, 200); // one rare element
        let (_, elements) = CorrelatedHeavyHitterSketch::query(&ds, 1, 0.5);
        assert!(!elements[&1].contains_key(&200));
    }
}
