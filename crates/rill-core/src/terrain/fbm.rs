//! Fractional Brownian Motion over Perlin noise.
//!
//! fBm: sum of octaves with amplitude = gain^i and frequency = lacunarity^i,
//! gain = lacunarity^(−H). The sum is divided by the total amplitude and
//! mapped from ±1 into [0, 1] so seeded bedrock starts non-negative.
use noise::{NoiseFn, Perlin};

use super::NoiseSource;

pub struct Fbm {
    pub h: f64,
    pub lacunarity: f64,
    noise: Perlin,
}

impl Fbm {
    /// Construct an fBm with the given seed and Hurst exponent.
    /// `lacunarity` is fixed at 2.0; gain is derived from H.
    pub fn new(seed: u32, h: f64) -> Self {
        Self { h, lacunarity: 2.0, noise: Perlin::new(seed) }
    }

    /// Per-octave amplitude decay: gain = lacunarity^(−H).
    #[inline]
    fn gain(&self) -> f64 {
        self.lacunarity.powf(-self.h)
    }
}

impl Default for Fbm {
    /// H = 1 gives the classic persistence of 0.5.
    fn default() -> Self {
        Self::new(0, 1.0)
    }
}

impl NoiseSource for Fbm {
    fn reseed(&mut self, seed: u32) {
        self.noise = Perlin::new(seed);
    }

    fn fbm(&self, x: f64, y: f64, octaves: u32, frequency: f64) -> f64 {
        let gain = self.gain();
        let mut value = 0.0f64;
        let mut amp = 1.0f64;
        let mut total_amp = 0.0f64;
        let mut freq = frequency;
        for _ in 0..octaves {
            value += amp * self.noise.get([x * freq, y * freq]);
            total_amp += amp;
            amp *= gain;
            freq *= self.lacunarity;
        }
        if total_amp <= 0.0 {
            return 0.5;
        }
        (0.5 + 0.5 * value / total_amp).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tile(noise: &Fbm, n: usize, frequency: f64) -> Vec<f64> {
        (0..n * n)
            .map(|i| noise.fbm((i % n) as f64, (i / n) as f64, 8, frequency))
            .collect()
    }

    #[test]
    fn output_lies_in_unit_interval() {
        let noise = Fbm::new(7, 1.0);
        for v in tile(&noise, 64, 0.05) {
            assert!((0.0..=1.0).contains(&v), "fbm value {v} outside [0, 1]");
        }
    }

    #[test]
    fn fbm_produces_non_constant_output() {
        let noise = Fbm::new(42, 1.0);
        let t = tile(&noise, 64, 0.05);
        let lo = t.iter().cloned().fold(f64::INFINITY, f64::min);
        let hi = t.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        assert!(hi - lo > 0.05, "range {:.4} too small", hi - lo);
    }

    #[test]
    fn same_seed_same_values_after_reseed() {
        let mut a = Fbm::new(1, 1.0);
        let b = Fbm::new(9, 1.0);
        a.reseed(9);
        assert_eq!(tile(&a, 16, 0.1), tile(&b, 16, 0.1));
    }

    #[test]
    fn different_seeds_differ() {
        let a = Fbm::new(1, 1.0);
        let b = Fbm::new(2, 1.0);
        assert_ne!(tile(&a, 16, 0.1), tile(&b, 16, 0.1));
    }
}
