//! Pipe-model shallow water flow.
//!
//! Each cell owns four virtual outflow pipes. Per tick:
//!   1. Rain, raindrops and sources produce the intermediate depth `d1`.
//!   2. Each pipe's flux is accelerated by the water-surface head difference
//!      and clipped at zero (outflow only).
//!   3. All four pipes are scaled by K = min(1, d1 / (Σf · Δt)) so a cell never
//!      ships more water than it holds.
//!   4. `d2 = d1 + Δt · (inflow − outflow)`.
//!   5. Velocity from the flux imbalance through the cell.
use rand::rngs::StdRng;
use rand::Rng;

use crate::coords::{neighbor_differences, Direction};
use crate::field::fill_rows;
use crate::params::ErosionParams;
use crate::state::{Flux, SimulationState};

/// Intermediate depths produced by the flow phase and consumed by sediment
/// transport. Both are row-major and never negative.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowPass {
    /// Depth after rainfall and sources, before flow.
    pub d1: Vec<f64>,
    /// Depth after flow.
    pub d2: Vec<f64>,
}

impl FlowPass {
    /// A pass with no rain and no movement: both depths equal the current water.
    pub fn still(state: &SimulationState) -> Self {
        Self { d1: state.water.data.clone(), d2: state.water.data.clone() }
    }
}

/// Run the flow phase. Updates `state.flux`, `state.velocity_x` and
/// `state.velocity_y`; `state.water` is left as the previous tick's depth.
pub fn step_flow(
    state: &mut SimulationState,
    params: &ErosionParams,
    rng: &mut StdRng,
    rain_multiplier: f64,
) -> FlowPass {
    let (w, h) = (state.width, state.height);
    let dt = params.dt;
    let rain_multiplier = rain_multiplier.max(0.0);

    let d1 = rainfall(state, params, rng, rain_multiplier);

    // ── Flux ──────────────────────────────────────────────────────────────────
    let surface = state.water_surface();
    let mut flux = vec![[0.0; 4]; w * h];
    {
        let old = &state.flux;
        let d1 = &d1;
        let surface = &surface;
        fill_rows(&mut flux, w, |y, row| {
            for (x, out) in row.iter_mut().enumerate() {
                let i = y * w + x;
                let dh = neighbor_differences(surface, x, y, w, h);
                let mut f = [0.0; 4];
                for dir in Direction::ALL {
                    let k = dir.slot();
                    if dir.neighbor(x, y, w, h).is_some() {
                        f[k] = (old[i][k] + dt * params.pipe_area * dh[k]).max(0.0);
                    }
                }
                *out = limit_outflow(f, d1[i], dt, params.flux_epsilon);
            }
        });
    }
    state.flux = flux;

    // ── Depth + velocity ──────────────────────────────────────────────────────
    let mut cells = vec![[0.0; 3]; w * h];
    {
        let flux = &state.flux;
        let d1 = &d1;
        let eps = params.velocity_epsilon;
        fill_rows(&mut cells, w, |y, row| {
            for (x, out) in row.iter_mut().enumerate() {
                let i = y * w + x;
                let f = flux[i];
                let inn = inflow(flux, x, y, w, h);
                let flow_in: f64 = inn.iter().sum();
                let flow_out: f64 = f.iter().sum();
                let d2 = (d1[i] + dt * (flow_in - flow_out)).max(0.0);

                let avg_depth = 0.5 * (d1[i] + d2);
                let (l, r, t, b) = (
                    Direction::Left.slot(),
                    Direction::Right.slot(),
                    Direction::Top.slot(),
                    Direction::Bottom.slot(),
                );
                let dwx = (inn[l] - f[l] + f[r] - inn[r]) * 0.5;
                let dwy = (inn[b] - f[b] + f[t] - inn[t]) * 0.5;
                *out = [d2, dwx / (avg_depth + eps), dwy / (avg_depth + eps)];
            }
        });
    }

    let mut d2 = Vec::with_capacity(w * h);
    for (i, [depth, vx, vy]) in cells.into_iter().enumerate() {
        d2.push(depth);
        state.velocity_x.data[i] = vx;
        state.velocity_y.data[i] = vy;
    }

    FlowPass { d1, d2 }
}

/// Intermediate depth `d1`: uniform rain, stochastic raindrops, sources.
fn rainfall(state: &SimulationState, params: &ErosionParams, rng: &mut StdRng, rain_multiplier: f64) -> Vec<f64> {
    let dt = params.dt;
    let rain = dt * params.rain * rain_multiplier;
    let mut d1: Vec<f64> = state.water.data.iter().map(|&d| d + rain).collect();

    if params.drop_strength > 0.0 && params.num_drops > 0.0 {
        let p_drop = (params.num_drops * dt * rain_multiplier).min(1.0);
        for v in d1.iter_mut() {
            if rng.gen::<f64>() < p_drop {
                *v += params.drop_strength;
            }
        }
    }

    let source = dt * params.source_strength * rain_multiplier;
    for c in &state.sources {
        d1[c.y * state.width + c.x] += source;
    }
    d1
}

/// Scale all four pipes so `Σf · Δt ≤ available`.
#[inline]
pub(crate) fn limit_outflow(f: Flux, available: f64, dt: f64, eps: f64) -> Flux {
    let total: f64 = f.iter().sum();
    let k = (available / (total.max(eps) * dt)).min(1.0);
    f.map(|v| v * k)
}

/// Flux entering `(x, y)` from each side, in `[L, R, T, B]` order of the
/// side it arrives from. Missing neighbours contribute exactly 0.
#[inline]
pub(crate) fn inflow(flux: &[Flux], x: usize, y: usize, w: usize, h: usize) -> [f64; 4] {
    let mut out = [0.0; 4];
    for dir in Direction::ALL {
        if let Some(j) = dir.neighbor_index(x, y, w, h) {
            out[dir.slot()] = flux[j][dir.opposite().slot()];
        }
    }
    out
}
