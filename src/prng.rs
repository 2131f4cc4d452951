//! PCG32 pseudorandom number generator (PCG-XSH-RR).
//!
//! Drives party colour selection. A seeded generator keeps colour
//! assignment reproducible across runs with the same `LayoutParams::seed`.

const MULTIPLIER: u64 = 6_364_136_223_846_793_005;

/// Stream used when a caller only supplies a seed.
const DEFAULT_STREAM: u64 = 0x0da3_e39c_b94b_95bd;

#[derive(Debug, Clone)]
pub struct Pcg32 {
    state: u64,
    inc: u64,
}

impl Pcg32 {
    pub fn new(seed: u64, seq: u64) -> Self {
        let mut rng = Pcg32 {
            state: 0,
            inc: (seq << 1) | 1,
        };
        rng.advance();
        rng.state = rng.state.wrapping_add(seed);
        rng.advance();
        rng
    }

    pub fn from_seed(seed: u64) -> Self {
        Pcg32::new(seed, DEFAULT_STREAM)
    }

    fn advance(&mut self) {
        self.state = self.state.wrapping_mul(MULTIPLIER).wrapping_add(self.inc);
    }

    pub fn next_u32(&mut self) -> u32 {
        let old = self.state;
        self.advance();
        let xorshifted = (((old >> 18) ^ old) >> 27) as u32;
        let rot = (old >> 59) as u32;
        xorshifted.rotate_right(rot)
    }

    /// Uniform float in `[0, 1)`.
    pub fn next_float(&mut self) -> f64 {
        self.next_u32() as f64 / (u32::MAX as f64 + 1.0)
    }

    /// Uniform integer in `[0, bound)`; returns 0 for a zero bound.
    pub fn next_below(&mut self, bound: u32) -> u32 {
        if bound == 0 {
            return 0;
        }
        (self.next_float() * bound as f64) as u32
    }
}
