//! 2D-MG: a nested Misra-Gries sketch — an outer Misra-Gries table over flow
//! labels `x`, where each surviving flow owns its own small inner
//! Misra-Gries list over elements `y`.
//!
//! The outer table is a `HashMap` rather than a list, so that looking up an
//! existing flow on update doesn't require a linear scan. When the outer
//! table is full and a new flow arrives, every surviving outer entry is
//! decremented by one, and a uniformly random entry from its inner list is
//! also decremented — both removed if they reach zero. A single RNG, owned
//! by the sketch and seeded once at construction, drives that random
//! choice, rather than a fresh generator per eviction round (see
//! `DESIGN.md`).

use crate::common::validation::require_nonzero;
use crate::common::validation::validate_memory_kb;
use crate::common::Result;
use rand::rngs::SmallRng;
use rand::Rng;
use rand::SeedableRng;
use std::collections::BTreeMap;
use std::collections::HashMap;

/// Capacity of each flow's inner Misra-Gries list over elements.
const INNER_CAPACITY: usize = 8;

/// Bits per outer entry: flow label plus its frequency counter, 32 bits
/// each, counted in full even though the label itself is the `HashMap`
/// key rather than a stored field — matching the sizing convention used
/// to derive outer capacity in the original design this was ported from.
const OUTER_BITS: f64 = 32.0 + 32.0;
/// Bits per inner list slot: key + frequency.
const INNER_BITS: f64 = 32.0 + 32.0;

#[derive(Debug, Clone, Copy)]
struct InnerEntry {
    key: u32,
    freq: u32,
}

#[derive(Debug, Clone)]
struct OuterEntry {
    freq_outer: u32,
    inner: Vec<InnerEntry>,
}

/// A 2D-MG instance.
#[derive(Debug, Clone)]
pub struct TwoDMisraGries {
    outer: HashMap<u32, OuterEntry>,
    s1: usize,
    rng: SmallRng,
}

impl TwoDMisraGries {
    /// Builds a sketch sized from `memory_kb`, with an OS-seeded RNG for the
    /// eviction round's random inner-entry choice.
    pub fn new(memory_kb: f32) -> Result<Self> {
        Self::build(memory_kb, SmallRng::from_os_rng())
    }

    /// Builds a sketch with a deterministic RNG seed, for reproducible tests
    /// and benchmarks.
    pub fn with_seed(memory_kb: f32, seed: u64) -> Result<Self> {
        Self::build(memory_kb, SmallRng::seed_from_u64(seed))
    }

    fn build(memory_kb: f32, rng: SmallRng) -> Result<Self> {
        validate_memory_kb(memory_kb)?;

        let bits_per_outer_cell = OUTER_BITS + INNER_CAPACITY as f64 * INNER_BITS;
        let s1 = (memory_kb as f64 * 1024.0 * 8.0 / bits_per_outer_cell).round() as usize;
        require_nonzero(s1, "outer_capacity")?;

        Ok(Self {
            outer: HashMap::with_capacity(s1),
            s1,
            rng,
        })
    }

    fn update_inner_list(list: &mut Vec<InnerEntry>, y: u32) {
        for entry in list.iter_mut() {
            if entry.key == y {
                entry.freq += 1;
                return;
            }
        }

        if list.len() < INNER_CAPACITY {
            list.push(InnerEntry { key: y, freq: 1 });
            return;
        }

        let mut to_remove = Vec::new();
        for (i, entry) in list.iter_mut().enumerate() {
            entry.freq -= 1;
            if entry.freq == 0 {
                to_remove.push(i);
            }
        }
        for &i in to_remove.iter().rev() {
            list.remove(i);
        }
    }

    /// Records one occurrence of `(x, y)`.
    pub fn update(&mut self, x: u32, y: u32) {
        if let Some(entry) = self.outer.get_mut(&x) {
            entry.freq_outer += 1;
            Self::update_inner_list(&mut entry.inner, y);
            return;
        }

        if self.outer.len() < self.s1 {
            self.outer.insert(
                x,
                OuterEntry {
                    freq_outer: 1,
                    inner: vec![InnerEntry { key: y, freq: 1 }],
                },
            );
            return;
        }

        let mut to_remove = Vec::new();
        for (&key, entry) in self.outer.iter_mut() {
            entry.freq_outer -= 1;
            if entry.freq_outer == 0 {
                to_remove.push(key);
            } else if !entry.inner.is_empty() {
                let idx = self.rng.random_range(0..entry.inner.len());
                entry.inner[idx].freq -= 1;
                if entry.inner[idx].freq == 0 {
                    entry.inner.remove(idx);
                }
            }
        }
        for key in to_remove {
            self.outer.remove(&key);
        }
    }

    /// Returns heavy flows at or above `heavy_hitter_threshold`, and every
    /// element in a heavy flow's inner list whose frequency is at or above
    /// `phi` times the flow's frequency.
    pub fn query(
        &self,
        heavy_hitter_threshold: u32,
        phi: f32,
    ) -> (BTreeMap<u32, u32>, BTreeMap<u32, BTreeMap<u32, u32>>) {
        let mut heavy_hitters = BTreeMap::new();
        let mut quad_elements = BTreeMap::new();

        for (&x, entry) in &self.outer {
            if entry.freq_outer < heavy_hitter_threshold {
                continue;
            }
            heavy_hitters.insert(x, entry.freq_outer);

            let mut elements = BTreeMap::new();
            for inner in &entry.inner {
                if inner.freq as f32 >= entry.freq_outer as f32 * phi {
                    elements.insert(inner.key, inner.freq);
                }
            }
            quad_elements.insert(x, elements);
        }

        (heavy_hitters, quad_elements)
    }
}
