//! Mass normalization: rescale bedrock and sediment so their grid mean is
//! `TARGET_MEAN_MASS`.
//!
//! Erosion, deposition and semi-Lagrangian advection are not exactly
//! volume-conserving in floating point; without this pass the mean elevation
//! drifts over thousands of ticks.
use crate::params::TARGET_MEAN_MASS;
use crate::state::SimulationState;

/// Divide every `b` and `s` cell by `Σ(b + s) / (TARGET_MEAN_MASS · W · H)`.
///
/// Returns the factor applied, or `None` when the total is not a positive
/// finite number (e.g. perfectly flat zero terrain), in which case the grids
/// are left untouched.
pub fn normalize_mass(state: &mut SimulationState) -> Option<f64> {
    let target = TARGET_MEAN_MASS * state.cell_count() as f64;
    let factor = state.solid_mass() / target;
    if !(factor.is_finite() && factor > 0.0) {
        log::warn!("mass normalization skipped: total solid mass {:.3e}", factor * target);
        return None;
    }

    for v in state.bedrock.data.iter_mut() {
        *v /= factor;
    }
    for v in state.sediment.data.iter_mut() {
        *v /= factor;
    }
    Some(factor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Field;

    #[test]
    fn normalized_mean_is_half() {
        let mut state = SimulationState::empty(8, 4);
        state.bedrock = Field::from_fn(8, 4, |x, y| 1.0 + x as f64 * 0.3 + y as f64);
        state.sediment = Field::new(8, 4, 0.01);
        let factor = normalize_mass(&mut state).unwrap();
        assert!(factor > 1.0);
        let ratio = state.solid_mass() / (0.5 * 32.0);
        assert!((ratio - 1.0).abs() < 1e-12, "Σ(b+s)/(0.5·W·H) = {ratio}");
    }

    #[test]
    fn relative_shape_is_preserved() {
        let mut state = SimulationState::empty(4, 4);
        state.bedrock = Field::from_fn(4, 4, |x, _| (x + 1) as f64);
        normalize_mass(&mut state).unwrap();
        let r = state.bedrock.get(3, 0) / state.bedrock.get(0, 0);
        assert!((r - 4.0).abs() < 1e-12);
    }

    #[test]
    fn zero_mass_is_left_alone() {
        let mut state = SimulationState::empty(4, 4);
        assert_eq!(normalize_mass(&mut state), None);
        assert!(state.bedrock.data.iter().all(|&v| v == 0.0));
    }
}
