//! Seeded randomness.
//!
//! Games are keyed by a seed string. The string is folded into a `u64` with
//! FNV-1a so the same seed gives the same game on every platform, then used
//! to seed a ChaCha8 stream.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// FNV-1a over the bytes of `s`
pub fn fold_seed(s: &str) -> u64 {
    s.bytes().fold(FNV_OFFSET, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
    })
}

/// A fresh seed string for games created without one
pub fn random_seed() -> String {
    let n: u64 = rand::thread_rng().gen();
    format!("{n:016x}")
}

/// Deterministic RNG for setup and upkeep
#[derive(Clone, Debug)]
pub struct GameRng {
    inner: ChaCha8Rng,
    seed: u64,
}

impl GameRng {
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    pub fn from_seed_str(seed: &str) -> Self {
        Self::new(fold_seed(seed))
    }

    /// Independent stream for one use of randomness.
    ///
    /// The same `(seed, context, index)` always yields the same stream.
    pub fn for_context(&self, context: &str, index: usize) -> Self {
        let mut hash = self.seed ^ fold_seed(context);
        hash = (hash ^ index as u64).wrapping_mul(FNV_PRIME);
        Self::new(hash.wrapping_add(0x9E37_79B9_7F4A_7C15))
    }

    pub fn gen_range_usize(&mut self, range: std::ops::Range<usize>) -> usize {
        self.inner.gen_range(range)
    }

    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        use rand::seq::SliceRandom;
        slice.shuffle(&mut self.inner);
    }

    /// Index of a random element of a collection of `len` items
    pub fn choose_index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            None
        } else {
            Some(self.gen_range_usize(0..len))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_seed_is_fnv1a() {
        assert_eq!(fold_seed(""), FNV_OFFSET);
        // Published FNV-1a 64-bit test vector
        assert_eq!(fold_seed("a"), 0xaf63_dc4c_8601_ec8c);
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = GameRng::from_seed_str("test");
        let mut b = GameRng::from_seed_str("test");
        let xs: Vec<_> = (0..10).map(|_| a.gen_range_usize(0..1000)).collect();
        let ys: Vec<_> = (0..10).map(|_| b.gen_range_usize(0..1000)).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn test_context_streams_are_stable() {
        let base = GameRng::from_seed_str("seed");
        let mut a = base.for_context("upkeep", 7);
        let mut b = base.for_context("upkeep", 7);
        assert_eq!(a.gen_range_usize(0..1_000_000), b.gen_range_usize(0..1_000_000));
    }

    #[test]
    fn test_choose_index_empty() {
        let mut rng = GameRng::new(1);
        assert_eq!(rng.choose_index(0), None);
        assert!(rng.choose_index(3).unwrap() < 3);
    }

    #[test]
    fn test_random_seed_format() {
        let seed = random_seed();
        assert_eq!(seed.len(), 16);
        assert!(seed.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
