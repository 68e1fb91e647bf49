//! Key packing and hash-seed generation shared across the sketches.

use rand::Rng;

/// Packs a flow key `x` and an element key `y` into one `u64`, `x` in the
/// high 32 bits and `y` in the low 32 bits.
///
/// # Examples
/// ```
/// use chh_sketches::common::keys::{combine_xy, split_xy};
///
/// let combined = combine_xy(7, 42);
/// assert_eq!(split_xy(combined), (7, 42));
/// ```
pub fn combine_xy(x: u32, y: u32) -> u64 {
    ((x as u64) << 32) | (y as u64)
}

/// Inverse of [`combine_xy`]: splits a packed key back into `(x, y)`.
pub fn split_xy(combined: u64) -> (u32, u32) {
    ((combined >> 32) as u32, combined as u32)
}

/// Lower bound of the seed range used by [`generate_seeds`].
///
/// Seeds below this avoid poor mixing in the early rounds of MurmurHash3;
/// the original implementation draws seeds from `[1 << 24, u32::MAX]` for
/// the same reason.
const SEED_LOWER_BOUND: u32 = 1 << 24;

/// Draws `count` independent hash seeds from the OS entropy source.
pub fn generate_seeds(count: usize) -> Vec<u32> {
    let mut rng = rand::rng();
    generate_seeds_with_rng(count, &mut rng)
}

/// Draws `count` independent hash seeds from the given RNG, for
/// reproducible construction (`with_seed` constructors and tests).
pub fn generate_seeds_with_rng(count: usize, rng: &mut impl Rng) -> Vec<u32> {
    (0..count)
        .map(|_| rng.random_range(SEED_LOWER_BOUND..=u32::MAX))
        .collect()
}
