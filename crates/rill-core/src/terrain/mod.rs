//! Terrain initialization: fBm bedrock, random source points, initial mass
//! normalization.

pub mod fbm;

use rand::rngs::StdRng;
use rand::Rng;

use crate::coords::Cell;
use crate::field::Field;
use crate::hydraulic::mass::normalize_mass;
use crate::params::ErosionParams;
use crate::state::SimulationState;

pub use fbm::Fbm;

/// The fractal noise collaborator used to seed bedrock.
pub trait NoiseSource {
    /// Re-initialise the generator; identical seeds give identical output.
    fn reseed(&mut self, seed: u32);

    /// Fractal noise at grid position `(x, y)`.
    fn fbm(&self, x: f64, y: f64, octaves: u32, frequency: f64) -> f64;
}

/// Noise seed derived from the 64-bit simulation seed. The high half is
/// folded in so seeds differing only above bit 31 still get distinct bedrock.
#[inline]
pub fn noise_seed(seed: u64) -> u32 {
    (seed ^ (seed >> 32)) as u32
}

/// Build a fresh state: bedrock from `noise`, sources drawn from `rng`, then
/// normalized so the mean of `b + s` is 0.5. Water, sediment, flux and
/// velocity start at zero; `initial_bedrock` is the normalized bedrock.
pub fn generate_terrain<N: NoiseSource + ?Sized>(
    params: &ErosionParams,
    noise: &N,
    rng: &mut StdRng,
) -> SimulationState {
    let (w, h) = (params.width, params.height);
    let mut state = SimulationState::empty(w, h);

    state.bedrock = Field::from_fn(w, h, |x, y| {
        noise.fbm(x as f64, y as f64, params.noise_octaves, params.noise_frequency)
    });

    for y in 0..h {
        for x in 0..w {
            if rng.gen::<f64>() < params.num_sources {
                state.sources.push(Cell::new(x, y));
            }
        }
    }

    let factor = normalize_mass(&mut state);
    state.initial_bedrock = state.bedrock.clone();

    log::debug!(
        "terrain {w}×{h}: {} sources, normalization factor {:?}",
        state.sources.len(),
        factor
    );
    state
}
