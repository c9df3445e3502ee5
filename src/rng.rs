//! Tiny deterministic PRNG for effect set-up.

/// Integer hash (Knuth multiplicative + xorshift finaliser).
const fn hash_u32(mut x: u32) -> u32 {
    x = x.wrapping_mul(2_654_435_761);
    x ^= x >> 16;
    x = x.wrapping_mul(0x045d_9f3b);
    x ^= x >> 16;
    x
}

/// Counter-based generator: each draw hashes an incrementing counter.
#[derive(Debug, Clone)]
pub struct Rng {
    state: u32,
}

impl Rng {
    pub const fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(0x9e37_79b9);
        hash_u32(self.state)
    }

    /// Uniform value in `min..=max`. `min` must not exceed `max`.
    pub fn range(&mut self, min: i32, max: i32) -> i32 {
        let span = max.abs_diff(min) as u64 + 1;
        let offset = u64::from(self.next_u32()) % span;
        min.wrapping_add(offset as i32)
    }
}
