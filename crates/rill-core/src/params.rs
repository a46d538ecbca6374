//! Simulation parameters and rain schedules.
//!
//! Every knob is a plain number or flag. The optional terms (depth
//! saturation, depth attenuation, submerged thermal damping, flux evaporation,
//! periodic renormalization) select between the conservative and the
//! free-running variants of the same erosion model.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Reference grid size.
pub const DEFAULT_WIDTH: usize = 256;
pub const DEFAULT_HEIGHT: usize = 256;

/// Mean bedrock+sediment value per cell after mass normalization.
pub const TARGET_MEAN_MASS: f64 = 0.5;

/// Largest grid accepted by `validate` (64M cells, ~4.5 GiB of state).
pub const MAX_CELLS: usize = 1 << 26;

/// All tunable constants of the erosion model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErosionParams {
    pub width: usize,
    pub height: usize,
    /// Simulation time step.
    pub dt: f64,
    /// Uniform rainfall per unit time.
    pub rain: f64,
    /// Per-cell probability of becoming a persistent source at reset.
    pub num_sources: f64,
    /// Water added per unit time at each source point.
    pub source_strength: f64,
    /// Per-cell raindrop rate; the drop probability per tick is `num_drops · dt`.
    pub num_drops: f64,
    /// Depth added by a single raindrop. Zero disables raindrops.
    pub drop_strength: f64,
    /// Virtual pipe cross-section (gravity and pipe length folded in).
    pub pipe_area: f64,
    pub sediment_capacity: f64,
    /// Dissolving rate applied when capacity exceeds suspended sediment.
    pub dissolving: f64,
    /// Deposition rate applied when suspended sediment exceeds capacity.
    pub deposition: f64,
    pub evaporation: f64,
    /// Vertical exaggeration between height units and cell spacing.
    pub z_scale: f64,
    /// Minimum tilt angle (radians) so flat ground still transports.
    pub tilt_offset: f64,
    /// Talus angle (radians) for thermal relaxation.
    pub repose_angle: f64,
    pub velocity_epsilon: f64,
    pub flux_epsilon: f64,
    pub noise_octaves: u32,
    pub noise_frequency: f64,
    /// Gain `g` of the low-depth saturation term `min(g·d, 1)`.
    pub depth_saturation: Option<f64>,
    /// Rate `k` of the deep-water attenuation term `exp(−k·d)`.
    pub depth_attenuation: Option<f64>,
    /// Damp the talus threshold by `exp(−d)` under standing water.
    pub submerged_thermal: bool,
    /// Decay flux by the evaporation factor along with depth.
    pub flux_evaporation: bool,
    /// Renormalize mass every N ticks; 0 disables.
    pub renormalize_every: u32,
}

impl Default for ErosionParams {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            dt: 0.05,
            rain: 1e-4,
            num_sources: 0.01,
            source_strength: 0.1,
            num_drops: 0.01,
            drop_strength: 0.0,
            pipe_area: 5.0,
            sediment_capacity: 0.005,
            dissolving: 0.1,
            deposition: 0.1,
            evaporation: 0.01,
            z_scale: 100.0,
            tilt_offset: 0.1,
            repose_angle: std::f64::consts::FRAC_PI_3,
            velocity_epsilon: 1e-5,
            flux_epsilon: 1e-6,
            noise_octaves: 8,
            noise_frequency: 0.002,
            depth_saturation: Some(100.0),
            depth_attenuation: Some(1.0),
            submerged_thermal: true,
            flux_evaporation: true,
            renormalize_every: 1,
        }
    }
}

impl ErosionParams {
    /// Parameters with the optional modulation terms switched off: no depth
    /// saturation/attenuation, undamped talus, no flux decay, no renormalization.
    pub fn plain() -> Self {
        Self {
            depth_saturation: None,
            depth_attenuation: None,
            submerged_thermal: false,
            flux_evaporation: false,
            renormalize_every: 0,
            ..Self::default()
        }
    }

    /// Parse a (possibly partial) JSON object; missing keys take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let params: Self = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }

    /// Talus threshold on bedrock height difference, before any damping.
    #[inline]
    pub fn talus(&self) -> f64 {
        self.repose_angle.tan() / self.z_scale
    }

    /// Multiplicative decay applied to depth (and optionally flux) each tick.
    #[inline]
    pub fn evaporation_factor(&self) -> f64 {
        (1.0 - self.evaporation * self.dt).max(0.0)
    }

    /// Reject configurations that would feed NaNs or infinities into the grids.
    pub fn validate(&self) -> Result<()> {
        let cells = self.width.checked_mul(self.height);
        if self.width < 2 || self.height < 2 || cells.map_or(true, |n| n > MAX_CELLS) {
            return Err(ConfigError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }

        let floats = [
            ("dt", self.dt),
            ("rain", self.rain),
            ("num_sources", self.num_sources),
            ("source_strength", self.source_strength),
            ("num_drops", self.num_drops),
            ("drop_strength", self.drop_strength),
            ("pipe_area", self.pipe_area),
            ("sediment_capacity", self.sediment_capacity),
            ("dissolving", self.dissolving),
            ("deposition", self.deposition),
            ("evaporation", self.evaporation),
            ("z_scale", self.z_scale),
            ("tilt_offset", self.tilt_offset),
            ("repose_angle", self.repose_angle),
            ("velocity_epsilon", self.velocity_epsilon),
            ("flux_epsilon", self.flux_epsilon),
            ("noise_frequency", self.noise_frequency),
            ("depth_saturation", self.depth_saturation.unwrap_or(0.0)),
            ("depth_attenuation", self.depth_attenuation.unwrap_or(0.0)),
        ];
        for (name, value) in floats {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { name, value });
            }
            if value < 0.0 {
                return Err(ConfigError::OutOfRange { name, value, expected: "[0, ∞)" });
            }
        }

        for (name, value) in [("dt", self.dt), ("z_scale", self.z_scale)] {
            if value <= 0.0 {
                return Err(ConfigError::OutOfRange { name, value, expected: "(0, ∞)" });
            }
        }
        for (name, value) in [
            ("velocity_epsilon", self.velocity_epsilon),
            ("flux_epsilon", self.flux_epsilon),
        ] {
            if value <= 0.0 {
                return Err(ConfigError::OutOfRange { name, value, expected: "(0, ∞)" });
            }
        }
        for (name, value) in [("num_sources", self.num_sources), ("num_drops", self.num_drops)] {
            if value > 1.0 {
                return Err(ConfigError::OutOfRange { name, value, expected: "[0, 1]" });
            }
        }
        if self.repose_angle >= std::f64::consts::FRAC_PI_2 {
            return Err(ConfigError::OutOfRange {
                name: "repose_angle",
                value: self.repose_angle,
                expected: "[0, π/2)",
            });
        }
        if self.noise_octaves == 0 {
            return Err(ConfigError::OutOfRange {
                name: "noise_octaves",
                value: 0.0,
                expected: "[1, ∞)",
            });
        }
        Ok(())
    }
}

// ── Rain schedules ────────────────────────────────────────────────────────────

/// Per-tick rain multiplier supplied to `Simulator::tick`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RainSchedule {
    Constant { multiplier: f64 },
    /// `base · (1 + sin(step / period))^exponent`: long dry spells broken by storms.
    Pulsed { base: f64, period: f64, exponent: i32 },
}

impl Default for RainSchedule {
    fn default() -> Self {
        RainSchedule::Constant { multiplier: 1.0 }
    }
}

impl RainSchedule {
    /// The usual storm cycle: 0.2 · (1 + sin(step / 100))³.
    pub fn storms() -> Self {
        RainSchedule::Pulsed { base: 0.2, period: 100.0, exponent: 3 }
    }

    pub fn multiplier(&self, step: u64) -> f64 {
        match *self {
            RainSchedule::Constant { multiplier } => multiplier,
            RainSchedule::Pulsed { base, period, exponent } => {
                let phase = step as f64 / period.max(f64::EPSILON);
                base * (1.0 + phase.sin()).powi(exponent)
            }
        }
    }
}
