//! Deterministic hashing and a small sequential RNG for problem generation.
//! Same seed, same problem, on every platform.

#[inline]
pub fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

#[inline]
fn mix32(mut z: u32) -> u32 {
    z = (z ^ (z >> 16)).wrapping_mul(0x7FEB352D);
    z = (z ^ (z >> 15)).wrapping_mul(0x846CA68B);
    z ^ (z >> 16)
}

/// Hash a lattice point. Used by the noise functions, never stateful.
#[inline]
pub fn lattice_hash(ix: i32, iy: i32, seed: u32) -> u32 {
    let h = mix32(seed ^ (ix as u32).wrapping_mul(0x85EBCA6B));
    mix32(h ^ (iy as u32).wrapping_mul(0xC2B2AE35))
}

/// Derive an independent 32-bit stream seed from a problem seed.
#[inline]
pub fn sub_seed(seed: u64, salt: u64) -> u32 {
    splitmix64(seed ^ salt) as u32
}

pub struct Rng {
    state: u64,
}

impl Rng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = splitmix64(self.state);
        self.state
    }

    /// Uniform in [0, 1).
    pub fn next_f32(&mut self) -> f32 {
        ((self.next_u64() >> 40) as u32) as f32 / 16777216.0
    }

    /// Uniform in [0, n). `n` must be non-zero.
    pub fn below(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }
}
