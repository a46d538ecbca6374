//! Capacity-limited sediment transport.
//!
//! Consumes the flow pass:
//!   1. Tilt angle from the water-surface head differences.
//!   2. Capacity C = Kc · sin(tilt) · |v|, optionally saturated in shallow
//!      water and attenuated in deep water.
//!   3. C > s dissolves bedrock into suspension (and into the water column);
//!      otherwise suspended sediment settles back onto the bed.
//!   4. Backward semi-Lagrangian advection of `s` along the velocity field.
//!   5. Evaporation finalizes the tick's water depth.
use crate::coords::neighbor_differences;
use crate::field::{fill_rows, Field};
use crate::params::ErosionParams;
use crate::state::SimulationState;

use super::flow::FlowPass;

/// Run erosion/deposition, advection and evaporation. Writes `state.bedrock`,
/// `state.sediment` and the final `state.water`.
pub fn step_sediment(state: &mut SimulationState, params: &ErosionParams, mut pass: FlowPass) {
    let tilt = tilt_angles(state, params);
    erode_and_deposit(state, params, &tilt, &mut pass.d2);
    state.sediment = advect(&state.sediment, &state.velocity_x, &state.velocity_y, params.dt);
    evaporate(state, params, pass.d2);
}

/// Tilt angle from `[L, R, T, B]` head differences:
/// `offset + atan(z_scale · |∇h|)` with a central-difference gradient.
#[inline]
pub fn tilt_angle(dh: [f64; 4], z_scale: f64, offset: f64) -> f64 {
    let gx = (dh[0] - dh[1]) * 0.5;
    let gy = (dh[3] - dh[2]) * 0.5;
    offset + (z_scale * gx.hypot(gy)).atan()
}

/// Per-cell tilt angle of the water surface at the start of the tick.
pub fn tilt_angles(state: &SimulationState, params: &ErosionParams) -> Vec<f64> {
    let (w, h) = (state.width, state.height);
    let surface = state.water_surface();
    let mut out = vec![0.0; w * h];
    {
        let surface = &surface;
        fill_rows(&mut out, w, |y, row| {
            for (x, v) in row.iter_mut().enumerate() {
                let dh = neighbor_differences(surface, x, y, w, h);
                *v = tilt_angle(dh, params.z_scale, params.tilt_offset);
            }
        });
    }
    out
}

/// Sediment the flow at a cell can hold.
///
/// `depth` is the water depth the modulation terms look at.
#[inline]
pub fn transport_capacity(params: &ErosionParams, tilt: f64, speed: f64, depth: f64) -> f64 {
    let mut c = params.sediment_capacity * tilt.sin() * speed;
    if let Some(gain) = params.depth_saturation {
        c *= (gain * depth).clamp(0.0, 1.0);
    }
    if let Some(rate) = params.depth_attenuation {
        c *= (-rate * depth).exp();
    }
    c.max(0.0)
}

/// Exchange material between bedrock and suspension, cell by cell.
///
/// Only reads and writes the cell itself, so it runs in place. Dissolved
/// volume is added to `d2`; deposited volume is removed from it (clamped at 0).
pub fn erode_and_deposit(state: &mut SimulationState, params: &ErosionParams, tilt: &[f64], d2: &mut [f64]) {
    let dissolve_rate = params.dt * params.dissolving;
    let deposit_rate = params.dt * params.deposition;

    for i in 0..state.cell_count() {
        let capacity = transport_capacity(params, tilt[i], state.speed(i), state.water.data[i]);
        let s = state.sediment.data[i];
        if capacity > s {
            let amount = dissolve_rate * (capacity - s);
            state.bedrock.data[i] -= amount;
            state.sediment.data[i] += amount;
            d2[i] += amount;
        } else {
            let amount = (deposit_rate * (s - capacity)).min(s);
            state.bedrock.data[i] += amount;
            state.sediment.data[i] = (s - amount).max(0.0);
            d2[i] = (d2[i] - amount).max(0.0);
        }
    }
}

/// Backward semi-Lagrangian advection: each cell takes the value found at
/// `(x, y) − v · Δt`, bilinearly interpolated and clamped to the interior.
///
/// The result is a convex combination of input samples, so it never leaves
/// the input's [min, max] range.
pub fn advect(field: &Field, vx: &Field, vy: &Field, dt: f64) -> Field {
    let (w, h) = (field.width, field.height);
    let mut out = Field::zeros(w, h);
    fill_rows(&mut out.data, w, |y, row| {
        for (x, v) in row.iter_mut().enumerate() {
            let i = y * w + x;
            let fx = x as f64 - vx.data[i] * dt;
            let fy = y as f64 - vy.data[i] * dt;
            *v = field.sample_clamped(fx, fy);
        }
    });
    out
}

/// Commit `d2` as the tick's water depth after evaporation; optionally decay flux.
pub fn evaporate(state: &mut SimulationState, params: &ErosionParams, d2: Vec<f64>) {
    let keep = params.evaporation_factor();
    state.water.data = d2;
    for d in state.water.data.iter_mut() {
        *d *= keep;
    }
    if params.flux_evaporation {
        for f in state.flux.iter_mut() {
            *f = f.map(|v| v * keep);
        }
    }
}
