//! Party colour allocation.
//!
//! Each table keeps its own party → colour map. A new colour is sampled
//! until its hue is at least `hue_min_separation_deg` (on the colour
//! wheel) from every hue already used at that table, giving up after
//! `hue_attempts` draws and taking an unconstrained hue instead.
//! Distinctness is best-effort only.

use std::fmt;

use crate::prng::Pcg32;
use crate::types::LayoutParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PartyColor {
    pub hue: u16,
    pub saturation: u8,
    pub lightness: u8,
}

impl fmt::Display for PartyColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hsl({},{}%,{}%)", self.hue, self.saturation, self.lightness)
    }
}

/// Circular distance between two hues in degrees.
pub fn hue_distance(a: u16, b: u16) -> u16 {
    let d = a.abs_diff(b) % 360;
    d.min(360 - d)
}

#[derive(Debug, Clone)]
pub struct Palette {
    rng: Pcg32,
    min_separation: u16,
    attempts: u32,
    saturation: u8,
    lightness: u8,
}

impl Palette {
    pub fn new(params: &LayoutParams) -> Self {
        Palette {
            rng: Pcg32::from_seed(params.seed),
            min_separation: params.hue_min_separation_deg,
            attempts: params.hue_attempts,
            saturation: params.saturation_pct,
            lightness: params.lightness_pct,
        }
    }

    fn random_hue(&mut self) -> u16 {
        self.rng.next_below(360) as u16
    }

    /// Pick a colour whose hue keeps its distance from `existing`.
    pub fn pick<'a, I>(&mut self, existing: I) -> PartyColor
    where
        I: IntoIterator<Item = &'a PartyColor>,
    {
        let used: Vec<u16> = existing.into_iter().map(|c| c.hue).collect();
        let mut chosen = None;
        for _ in 0..self.attempts {
            let h = self.random_hue();
            if used.iter().all(|&u| hue_distance(h, u) >= self.min_separation) {
                chosen = Some(h);
                break;
            }
        }
        let hue = match chosen {
            Some(h) => h,
            None => self.random_hue(),
        };
        PartyColor {
            hue,
            saturation: self.saturation,
            lightness: self.lightness,
        }
    }
}
