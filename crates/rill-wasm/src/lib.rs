//! Browser bridge: a renderer drives `reset`/`tick` and pulls grids as
//! `Float32Array`s each frame.

use js_sys::Float32Array;
use serde::Serialize;
use wasm_bindgen::prelude::*;

use rill_core::snapshot::to_f32;
use rill_core::{ErosionParams, RainSchedule, Simulator};

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Grid totals in the shape the page expects.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsReport {
    step: u64,
    bedrock: f64,
    sediment: f64,
    water: f64,
    max_speed: f64,
    normalized: bool,
}

#[wasm_bindgen]
pub struct WasmSimulator {
    inner: Simulator,
    schedule: Option<RainSchedule>,
}

#[wasm_bindgen]
impl WasmSimulator {
    /// `params_json` may be empty for defaults. Seeds arrive as `f64` from JS.
    #[wasm_bindgen(constructor)]
    pub fn new(params_json: &str, seed: f64) -> Result<WasmSimulator, JsValue> {
        let params = if params_json.trim().is_empty() {
            ErosionParams::default()
        } else {
            ErosionParams::from_json(params_json).map_err(js_err)?
        };
        let inner = Simulator::new(params, seed as u64).map_err(js_err)?;
        Ok(Self { inner, schedule: None })
    }

    pub fn reset(&mut self, seed: f64) -> Result<(), JsValue> {
        self.inner.reset(seed as u64).map_err(js_err)
    }

    /// Reset with a fresh seed; returns it so the page can show or replay it.
    pub fn regenerate(&mut self) -> Result<f64, JsValue> {
        self.inner.regenerate().map(|s| s as f64).map_err(js_err)
    }

    #[wasm_bindgen(js_name = setParams)]
    pub fn set_params(&mut self, params_json: &str) -> Result<(), JsValue> {
        let params = ErosionParams::from_json(params_json).map_err(js_err)?;
        self.inner.set_params(params).map_err(js_err)
    }

    /// Switch between constant rain (`false`) and the storm cycle (`true`).
    #[wasm_bindgen(js_name = setPulsedRain)]
    pub fn set_pulsed_rain(&mut self, pulsed: bool) {
        self.schedule = pulsed.then(RainSchedule::storms);
    }

    /// Run `steps` ticks. `rain_multiplier` is ignored while pulsed rain is on.
    pub fn tick(&mut self, steps: u32, rain_multiplier: f64) -> Result<JsValue, JsValue> {
        let r = match &self.schedule {
            Some(schedule) => self.inner.tick_scheduled(steps, schedule),
            None => self.inner.tick(steps, rain_multiplier),
        };
        let report = JsReport {
            step: r.step,
            bedrock: r.bedrock,
            sediment: r.sediment,
            water: r.water,
            max_speed: r.max_speed,
            normalized: r.normalization.is_some(),
        };
        serde_wasm_bindgen::to_value(&report).map_err(js_err)
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> usize {
        self.inner.params().width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> usize {
        self.inner.params().height
    }

    pub fn bedrock(&self) -> Float32Array {
        Float32Array::from(to_f32(&self.inner.state().bedrock.data).as_slice())
    }

    #[wasm_bindgen(js_name = waterDepth)]
    pub fn water_depth(&self) -> Float32Array {
        Float32Array::from(to_f32(&self.inner.state().water.data).as_slice())
    }

    #[wasm_bindgen(js_name = waterSurface)]
    pub fn water_surface(&self) -> Float32Array {
        Float32Array::from(to_f32(&self.inner.state().water_surface()).as_slice())
    }

    pub fn sediment(&self) -> Float32Array {
        Float32Array::from(to_f32(&self.inner.state().sediment.data).as_slice())
    }

    /// Full snapshot as a plain JS object (slower; for export and debugging).
    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.inner.snapshot()).map_err(js_err)
    }

    /// Current parameters as JSON, for round-tripping through UI controls.
    #[wasm_bindgen(js_name = paramsJson)]
    pub fn params_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.inner.params()).map_err(js_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> String {
        serde_json::to_string(&ErosionParams { width: 16, height: 12, ..ErosionParams::default() }).unwrap()
    }

    #[test]
    fn params_round_trip_through_json() {
        let sim = WasmSimulator::new(&small(), 3.0).unwrap();
        assert_eq!(sim.width(), 16);
        assert_eq!(sim.height(), 12);
        let back = ErosionParams::from_json(&sim.params_json().unwrap()).unwrap();
        assert_eq!(&back, sim.inner.params());
    }

    #[test]
    fn empty_params_use_defaults() {
        let sim = WasmSimulator::new("  ", 1.0).unwrap();
        assert_eq!(sim.inner.params(), &ErosionParams::default());
    }

    #[test]
    fn regenerated_seed_replays_the_same_terrain() {
        let mut sim = WasmSimulator::new(&small(), 9.0).unwrap();
        let seed = sim.regenerate().unwrap();
        assert_eq!(seed.fract(), 0.0);
        let generated = sim.inner.state().clone();
        sim.reset(seed).unwrap();
        assert_eq!(sim.inner.seed() as f64, seed);
        assert_eq!(&generated, sim.inner.state(), "replaying seed {seed} gave different terrain");
    }

    #[test]
    fn pulsed_rain_toggles_schedule() {
        let mut sim = WasmSimulator::new(&small(), 1.0).unwrap();
        sim.set_pulsed_rain(true);
        assert_eq!(sim.schedule, Some(RainSchedule::storms()));
        sim.set_pulsed_rain(false);
        assert!(sim.schedule.is_none());
    }
}
