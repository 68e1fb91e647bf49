//! DualSketch: a two-table kick-out sketch pairing a per-flow HeavyTable
//! (HT) with a clustered per-element QuadTable (QT).
//!
//! Each flow occupies exactly one HT bucket, hashed from its label. Each QT
//! cell lives in one of `m2 - k + 1` possible windows of `k` contiguous
//! cells, also hashed from the owning flow's label, so that all of one
//! flow's tracked elements sit close together. The two tables are kept
//! mutually consistent: evicting a flow from HT clears its QT window, and
//! evicting the last QT cell a flow owns clears that flow's HT bucket. See
//! [`DualSketch::update`] for the full discipline.

use crate::common::hash::hash_u32;
use crate::common::keys::generate_seeds_with_rng;
use crate::common::validation::{require_nonzero, validate_memory_kb};
use crate::common::Result;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::collections::BTreeMap;

/// Fraction of the memory budget given to the HeavyTable; the remainder
/// goes to the QuadTable.
const HT_MEMORY_FRACTION: f64 = 0.55;

/// Width, in cells, of each flow's contiguous window in the QuadTable.
const CLUSTER_WIDTH: u32 = 32;

/// Bits per HeavyTable bucket: five `u32` fields (F, U, C, V, D).
const HT_BUCKET_BITS: f64 = 32.0 * 5.0;

/// Bits per QuadTable cell: three `u32` fields (E, R, P).
const QT_CELL_BITS: f64 = 32.0 * 3.0;

/// Which combination of a flow's lower/upper frequency bounds `query` reports
/// as its point estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EstimateMethod {
    /// `C + V`: never overestimates.
    Lower,
    /// `U + C + V`: never underestimates.
    Upper,
    /// `(lower + upper) / 2`.
    #[default]
    Mean,
    /// Harmonic mean of lower and upper, `2 * l * u / (l + u)`.
    Harmonic,
}

#[derive(Debug, Clone, Copy, Default)]
struct HtBucket {
    f: u32,
    u: u32,
    c: u32,
    v: u32,
    d: u32,
}

#[derive(Debug, Clone, Copy, Default)]
struct QtCell {
    e: u32,
    r: u32,
    p: u32,
}

/// A DualSketch instance.
#[derive(Debug, Clone)]
pub struct DualSketch {
    heavy_table: Vec<HtBucket>,
    quad_table: Vec<QtCell>,
    m1: u32,
    m2: u32,
    method: EstimateMethod,
    rand_seed: u32,
}

impl DualSketch {
    /// Builds a sketch sized from `memory_kb`, using the arithmetic-mean
    /// estimator and a randomly generated hash seed.
    pub fn new(memory_kb: f32) -> Result<Self> {
        let mut rng = SmallRng::from_os_rng();
        Self::build(memory_kb, EstimateMethod::default(), &mut rng)
    }

    /// Builds a sketch with a deterministic hash seed, for reproducible
    /// tests and benchmarks.
    pub fn with_seed(memory_kb: f32, seed: u64) -> Result<Self> {
        let mut rng = SmallRng::seed_from_u64(seed);
        Self::build(memory_kb, EstimateMethod::default(), &mut rng)
    }

    /// Builds a sketch with an explicit estimate method and deterministic
    /// hash seed.
    pub fn with_seed_and_method(
        memory_kb: f32,
        method: EstimateMethod,
        seed: u64,
    ) -> Result<Self> {
        let mut rng = SmallRng::seed_from_u64(seed);
        Self::build(memory_kb, method, &mut rng)
    }

    fn build(memory_kb: f32, method: EstimateMethod, rng: &mut SmallRng) -> Result<Self> {
        validate_memory_kb(memory_kb)?;

        let memo_kb_ht = memory_kb as f64 * HT_MEMORY_FRACTION;
        let memo_kb_qt = memory_kb as f64 - memo_kb_ht;

        let m1 = (memo_kb_ht * 1024.0 * 8.0 / HT_BUCKET_BITS).round() as u32;
        let m2 = (memo_kb_qt * 1024.0 * 8.0 / QT_CELL_BITS).round() as u32;

        require_nonzero(m1 as usize, "heavy_table_size")?;
        require_nonzero(m2 as usize, "quad_table_size")?;
        if m2 < CLUSTER_WIDTH {
            return Err(crate::common::SketchError::InvalidParameter {
                param: "quad_table_size".to_string(),
                value: m2.to_string(),
                constraint: format!("must be at least {CLUSTER_WIDTH} (the cluster width)"),
            });
        }

        let rand_seed = generate_seeds_with_rng(1, rng)[0];

        Ok(Self {
            heavy_table: vec![HtBucket::default(); m1 as usize],
            quad_table: vec![QtCell::default(); m2 as usize],
            m1,
            m2,
            method,
            rand_seed,
        })
    }

    fn cluster_start(&self, hash_val: u32) -> u32 {
        hash_val % (self.m2 - CLUSTER_WIDTH + 1)
    }

    /// Checks whether flow `x_clear` still owns any cell in its own
    /// cluster; if not, kicks it out of HT (mirroring the original's
    /// consistency check after stealing one of its QT cells).
    fn kick_out_if_clusterless(&mut self, x_clear: u32) {
        let hash_val_tmp = hash_u32(x_clear, self.rand_seed);
        let j_tmp = self.cluster_start(hash_val_tmp);
        for j in j_tmp..(j_tmp + CLUSTER_WIDTH) {
            if self.quad_table[j as usize].p == x_clear {
                return;
            }
        }

        let idx_clear = (hash_val_tmp % self.m1) as usize;
        let bucket = &mut self.heavy_table[idx_clear];
        bucket.d += bucket.c + bucket.v;
        bucket.f = 0;
        bucket.u = 0;
        bucket.c = 0;
        bucket.v = 0;
    }

    /// Records one occurrence of `(x, y)`.
    pub fn update(&mut self, x: u32, y: u32) {
        let hash_val = hash_u32(x, self.rand_seed);
        let i = (hash_val % self.m1) as usize;
        let j_start = self.cluster_start(hash_val);

        if self.heavy_table[i].f == 0 {
            self.update_empty_bucket(i, j_start, x, y);
            return;
        }

        if self.heavy_table[i].f == x {
            self.update_matching_bucket(i, j_start, x, y);
        } else {
            self.update_colliding_bucket(i);
        }
    }

    fn update_empty_bucket(&mut self, i: usize, j_start: u32, x: u32, y: u32) {
        let mut min_r = u32::MAX;
        let mut min_j: Option<u32> = None;

        for j in j_start..(j_start + CLUSTER_WIDTH) {
            if self.quad_table[j as usize].e == 0 {
                self.quad_table[j as usize] = QtCell { e: y, r: 1, p: x };
                self.heavy_table[i] = HtBucket {
                    f: x,
                    u: self.heavy_table[i].d,
                    c: 1,
                    v: 0,
                    d: self.heavy_table[i].d,
                };
                return;
            } else if self.quad_table[j as usize].r < min_r {
                min_r = self.quad_table[j as usize].r;
                min_j = Some(j);
            }
        }

        let min_j = min_j.expect("cluster has at least one occupied cell when no empty cell was found");
        self.quad_table[min_j as usize].r -= 1;
        if self.quad_table[min_j as usize].r > 0 {
            self.heavy_table[i].d += 1;
            return;
        }

        let x_clear = self.quad_table[min_j as usize].p;
        let prior_d = self.heavy_table[i].d;
        self.quad_table[min_j as usize] = QtCell { e: y, r: 1, p: x };
        self.heavy_table[i] = HtBucket {
            f: x,
            u: prior_d,
            c: 1,
            v: 0,
            d: prior_d,
        };

        if x_clear == x {
            return;
        }
        self.kick_out_if_clusterless(x_clear);
    }

    fn update_matching_bucket(&mut self, i: usize, j_start: u32, x: u32, y: u32) {
        self.heavy_table[i].c += 1;

        let mut empty_j: Option<u32> = None;
        let mut min_j: Option<u32> = None;
        let mut min_r = u32::MAX;

        for j in j_start..(j_start + CLUSTER_WIDTH) {
            let cell = self.quad_table[j as usize];
            if cell.e == y && cell.p == x {
                self.quad_table[j as usize].r += 1;
                return;
            }
            if cell.e == 0 && empty_j.is_none() {
                empty_j = Some(j);
            }
            if cell.e != 0 && cell.r < min_r {
                min_r = cell.r;
                min_j = Some(j);
            }
        }

        if let Some(j) = empty_j {
            self.quad_table[j as usize] = QtCell { e: y, r: 1, p: x };
            return;
        }

        let min_j = min_j.expect("cluster is full of occupied cells when no empty cell was found");
        self.quad_table[min_j as usize].r -= 1;
        if self.quad_table[min_j as usize].r > 0 {
            return;
        }

        let x_clear = self.quad_table[min_j as usize].p;
        self.quad_table[min_j as usize] = QtCell { e: y, r: 1, p: x };

        if x_clear == x {
            return;
        }
        self.kick_out_if_clusterless(x_clear);
    }

    fn update_colliding_bucket(&mut self, i: usize) {
        self.heavy_table[i].c -= 1;
        self.heavy_table[i].v += 1;

        if self.heavy_table[i].c > 0 {
            self.heavy_table[i].d += 1;
            return;
        }

        let x_clear = self.heavy_table[i].f;
        let v = self.heavy_table[i].v;
        self.heavy_table[i] = HtBucket {
            f: 0,
            u: 0,
            c: 0,
            v: 0,
            d: self.heavy_table[i].d + v,
        };

        self.clear_cluster_of(x_clear);
        self.heavy_table[i].d += 1;
    }

    fn clear_cluster_of(&mut self, x_clear: u32) {
        let hash_val_clear = hash_u32(x_clear, self.rand_seed);
        let j_clear = self.cluster_start(hash_val_clear);
        for j in j_clear..(j_clear + CLUSTER_WIDTH) {
            if self.quad_table[j as usize].p == x_clear {
                self.quad_table[j as usize] = QtCell::default();
            }
        }
    }

    fn estimate(&self, lower: u32, upper: u32) -> u32 {
        match self.method {
            EstimateMethod::Lower => lower,
            EstimateMethod::Upper => upper,
            EstimateMethod::Mean => (lower + upper) / 2,
            EstimateMethod::Harmonic => {
                if lower + upper == 0 {
                    0
                } else {
                    ((2u64 * lower as u64 * upper as u64) / (lower as u64 + upper as u64)) as u32
                }
            }
        }
    }

    /// Returns heavy flows at or above `heavy_hitter_threshold`, and every
    /// element tracked in each heavy flow's cluster together with its raw
    /// repetition count. Filtering those elements by `phi` is the caller's
    /// job (see [`crate::sketch::CorrelatedHeavyHitterSketch`]'s blanket
    /// impl for this sketch).
    pub fn query(
        &self,
        heavy_hitter_threshold: u32,
    ) -> (BTreeMap<u32, u32>, BTreeMap<u32, BTreeMap<u32, u32>>) {
        let mut heavy_hitters = BTreeMap::new();
        let mut quad_elements = BTreeMap::new();

        for bucket in &self.heavy_table {
            if bucket.f == 0 {
                continue;
            }
            let x = bucket.f;
            let lower = bucket.c + bucket.v;
            let upper = bucket.u + bucket.c + bucket.v;
            let size = self.estimate(lower, upper);

            if size >= heavy_hitter_threshold {
                heavy_hitters.insert(x, size);

                let hash_val = hash_u32(x, self.rand_seed);
                let j_start = self.cluster_start(hash_val);
                let mut elements = BTreeMap::new();
                for j in j_start..(j_start + CLUSTER_WIDTH) {
                    let cell = self.quad_table[j as usize];
                    if cell.e != 0 && cell.p == x {
                        elements.insert(cell.e, cell.r);
                    }
                }
                quad_elements.insert(x, elements);
            }
        }

        (heavy_hitters, quad_elements)
    }
}
