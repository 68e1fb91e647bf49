//! Memory-bounded streaming sketches for correlated heavy hitter detection.
//!
//! A correlated heavy hitter is a flow `x` that is itself frequent, paired
//! with an element `y` that is frequent *within that flow* — e.g. a source
//! IP sending a disproportionate share of its traffic to one destination
//! port. This crate implements five independent sketches for tracking such
//! pairs in bounded memory, each trading off accuracy, memory layout and
//! update cost differently:
//!
//! - [`dual_sketch::DualSketch`] — a clustered kick-out sketch pairing a
//!   per-flow table with a per-element table.
//! - [`duet::Duet`] — a CountMin gate feeding a cascading Misra-Gries filter
//!   and promotion table.
//! - [`global_hh::GlobalHh`] — CountMin paired with one global Space-Saving
//!   table over combined keys.
//! - [`two_d_misra_gries::TwoDMisraGries`] — nested Misra-Gries, one outer
//!   table over flows and one inner table per flow over elements.
//! - [`csschh::CssChh`] — cascading Space-Saving over flows and over
//!   combined keys.
//!
//! All five implement [`sketch::CorrelatedHeavyHitterSketch`], so callers
//! that don't care which algorithm they're using can depend on that trait
//! (or the [`sketch::AnySketch`] enum) instead of a concrete type.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod common;
pub mod countmin;
pub mod csschh;
pub mod dual_sketch;
pub mod duet;
pub mod global_hh;
pub mod sketch;
pub mod two_d_misra_gries;

pub use common::{Result, SketchError};
pub use countmin::CountMin;
pub use csschh::CssChh;
pub use dual_sketch::{DualSketch, EstimateMethod};
pub use duet::Duet;
pub use global_hh::GlobalHh;
pub use sketch::{AnySketch, CorrelatedHeavyHitterSketch};
pub use two_d_misra_gries::TwoDMisraGries;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_sketch_can_be_constructed_from_a_memory_budget() {
        assert!(DualSketch::new(64.0).is_ok());
        assert!(Duet::new(64.0).is_ok());
        assert!(GlobalHh::new(64.0).is_ok());
        assert!(TwoDMisraGries::new(64.0).is_ok());
        assert!(CssChh::new(64.0).is_ok());
    }
}
