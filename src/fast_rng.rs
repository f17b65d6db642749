// Reproducible PCG-LCG random stream
//
// Collision sampling draws from this stream in a fixed order, so a history
// replayed with the same seed makes exactly the same choices. Independent
// histories get disjoint streams through LCG skip-ahead.

use rand::{RngCore, SeedableRng};

const PRN_MULT: u64 = 6364136223846793005;
const PRN_ADD: u64 = 1442695040888963407;
/// Number of draws reserved for each particle history
pub const PRN_STRIDE: u64 = 152917;

/// PCG random stream with an LCG base and RXS-M-XS output permutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FastRng {
    seed: u64,
}

impl FastRng {
    #[inline]
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Stream for history `history` of a run seeded with `master_seed`
    pub fn for_history(master_seed: u64, history: u64) -> Self {
        let mut rng = Self::new(master_seed);
        rng.skip_ahead(history.wrapping_mul(PRN_STRIDE));
        rng
    }

    /// Uniform draw in [0, 1)
    #[inline(always)]
    pub fn random(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Advance the underlying LCG by `steps` in O(log steps)
    pub fn skip_ahead(&mut self, mut steps: u64) {
        let mut g = PRN_MULT;
        let mut c = PRN_ADD;
        let mut g_new = 1u64;
        let mut c_new = 0u64;
        while steps > 0 {
            if steps & 1 == 1 {
                g_new = g_new.wrapping_mul(g);
                c_new = c_new.wrapping_mul(g).wrapping_add(c);
            }
            c = c.wrapping_mul(g.wrapping_add(1));
            g = g.wrapping_mul(g);
            steps >>= 1;
        }
        self.seed = g_new.wrapping_mul(self.seed).wrapping_add(c_new);
    }

    pub fn reseed(&mut self, seed: u64) {
        self.seed = seed;
    }
}

impl SeedableRng for FastRng {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        Self {
            seed: u64::from_le_bytes(seed),
        }
    }
}

impl RngCore for FastRng {
    #[inline(always)]
    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    #[inline(always)]
    fn next_u64(&mut self) -> u64 {
        self.seed = PRN_MULT.wrapping_mul(self.seed).wrapping_add(PRN_ADD);
        let word = ((self.seed >> ((self.seed >> 59) + 5)) ^ self.seed)
            .wrapping_mul(12605985483714917081);
        (word >> 43) ^ word
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        let mut chunks = dest.chunks_exact_mut(8);
        for chunk in &mut chunks {
            chunk.copy_from_slice(&self.next_u64().to_le_bytes());
        }
        let remainder = chunks.into_remainder();
        if !remainder.is_empty() {
            let bytes = self.next_u64().to_le_bytes();
            remainder.copy_from_slice(&bytes[..remainder.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_fast_rng_deterministic() {
        let mut rng1 = FastRng::new(12345);
        let mut rng2 = FastRng::new(12345);
        for _ in 0..100 {
            assert_eq!(rng1.random(), rng2.random());
        }
    }

    #[test]
    fn test_fast_rng_range() {
        let mut rng = FastRng::new(42);
        for _ in 0..10000 {
            let val = rng.random();
            assert!((0.0..1.0).contains(&val), "value {} out of range [0, 1)", val);
        }
    }

    #[test]
    fn test_skip_ahead_matches_stepping() {
        let mut stepped = FastRng::new(7);
        for _ in 0..1000 {
            stepped.next_u64();
        }
        let mut jumped = FastRng::new(7);
        jumped.skip_ahead(1000);
        assert_eq!(stepped, jumped);
        assert_eq!(stepped.next_u64(), jumped.next_u64());
    }

    #[test]
    fn test_history_streams_are_disjoint_offsets() {
        let mut first = FastRng::for_history(1, 0);
        first.skip_ahead(PRN_STRIDE);
        let second = FastRng::for_history(1, 1);
        assert_eq!(first, second);
    }

    #[test]
    fn test_fast_rng_as_rand_rng() {
        let mut rng = FastRng::new(12345);
        let x: f64 = rng.gen();
        assert!((0.0..1.0).contains(&x));
        let _: bool = rng.gen();
    }
}
