//! Talus-angle thermal relaxation.
//!
//! For every cell and each of its four neighbours, the part of the bedrock
//! height difference beyond the talus threshold `α = tan(repose) / z_scale`
//! is moved downhill at rate Δt. A neighbour pair exchanges equal and opposite
//! amounts, so with a uniform `α` the pass conserves bedrock volume.
use crate::coords::neighbor_differences;
use crate::field::fill_rows;
use crate::params::ErosionParams;
use crate::state::SimulationState;

/// Portion of `dh` beyond `±alpha`, keeping the sign of `dh`; zero inside the band.
#[inline]
pub fn talus_excess(dh: f64, alpha: f64) -> f64 {
    if dh > alpha {
        dh - alpha
    } else if dh < -alpha {
        dh + alpha
    } else {
        0.0
    }
}

/// Apply one thermal relaxation pass to `state.bedrock`.
///
/// With `submerged_thermal`, `α` is damped by `exp(−d)` using the current
/// water depth: flooded slopes slump at a lower threshold.
pub fn step_thermal(state: &mut SimulationState, params: &ErosionParams) {
    let (w, h) = (state.width, state.height);
    let dt = params.dt;
    let talus = params.talus();

    let mut next = vec![0.0; w * h];
    {
        let b = &state.bedrock.data;
        let d = &state.water.data;
        let submerged = params.submerged_thermal;
        fill_rows(&mut next, w, |y, row| {
            for (x, v) in row.iter_mut().enumerate() {
                let i = y * w + x;
                let alpha = if submerged { talus * (-d[i]).exp() } else { talus };
                let dh = neighbor_differences(b, x, y, w, h);
                let moved: f64 = dh.iter().map(|&dh| talus_excess(dh, alpha)).sum();
                *v = b[i] - dt * moved;
            }
        });
    }
    state.bedrock.data = next;
}
