//! Per-cell simulation fields, bundled into one owned value.

use crate::coords::Cell;
use crate::error::{ConfigError, Result};
use crate::field::Field;

/// Outflow record in `[Left, Right, Top, Bottom]` order; every slot ≥ 0.
pub type Flux = [f64; 4];

/// Every grid the simulator evolves, plus the reset-time snapshot and sources.
///
/// All fields share `width × height` and are row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationState {
    pub width: usize,
    pub height: usize,
    /// Bedrock height `b`.
    pub bedrock: Field,
    /// Bedrock at the last reset; only read for elevation-change views.
    pub initial_bedrock: Field,
    /// Water depth `d`, never negative.
    pub water: Field,
    /// Suspended sediment `s`, never negative.
    pub sediment: Field,
    pub flux: Vec<Flux>,
    pub velocity_x: Field,
    pub velocity_y: Field,
    /// Constant water sources chosen at reset.
    pub sources: Vec<Cell>,
}

impl SimulationState {
    /// All-zero state of the given size with no sources.
    pub fn empty(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            bedrock: Field::zeros(width, height),
            initial_bedrock: Field::zeros(width, height),
            water: Field::zeros(width, height),
            sediment: Field::zeros(width, height),
            flux: vec![[0.0; 4]; width * height],
            velocity_x: Field::zeros(width, height),
            velocity_y: Field::zeros(width, height),
            sources: Vec::new(),
        }
    }

    /// Dry state over caller-supplied bedrock (row-major) and source cells.
    ///
    /// The bedrock doubles as the initial-bedrock snapshot. No normalization
    /// is applied.
    pub fn from_bedrock(width: usize, height: usize, bedrock: Vec<f64>, sources: Vec<Cell>) -> Result<Self> {
        if width < 2 || height < 2 {
            return Err(ConfigError::InvalidDimensions { width, height });
        }
        if bedrock.len() != width * height {
            return Err(ConfigError::GridMismatch {
                name: "bedrock",
                expected: width * height,
                actual: bedrock.len(),
            });
        }
        if let Some(&value) = bedrock.iter().find(|v| !v.is_finite()) {
            return Err(ConfigError::NonFinite { name: "bedrock", value });
        }
        if let Some(c) = sources.iter().find(|c| c.x >= width || c.y >= height) {
            return Err(ConfigError::OutOfRange {
                name: "source",
                value: (c.y * width + c.x) as f64,
                expected: "a cell inside the grid",
            });
        }

        let mut state = Self::empty(width, height);
        state.bedrock.data = bedrock;
        state.initial_bedrock = state.bedrock.clone();
        state.sources = sources;
        Ok(state)
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }

    /// Water surface height `b + d` per cell.
    pub fn water_surface(&self) -> Vec<f64> {
        self.bedrock.data.iter().zip(&self.water.data).map(|(b, d)| b + d).collect()
    }

    /// `Σ (b + s)`, the quantity held constant by mass normalization.
    pub fn solid_mass(&self) -> f64 {
        self.bedrock.sum() + self.sediment.sum()
    }

    #[inline]
    pub fn speed(&self, i: usize) -> f64 {
        self.velocity_x.data[i].hypot(self.velocity_y.data[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_bedrock_snapshots_initial_height() {
        let s = SimulationState::from_bedrock(2, 2, vec![1.0, 2.0, 3.0, 4.0], vec![Cell::new(1, 1)]).unwrap();
        assert_eq!(s.initial_bedrock, s.bedrock);
        assert_eq!(s.water.sum(), 0.0);
        assert_eq!(s.sources, vec![Cell::new(1, 1)]);
        assert_eq!(s.water_surface(), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn from_bedrock_rejects_wrong_length() {
        let err = SimulationState::from_bedrock(3, 3, vec![0.0; 8], vec![]).unwrap_err();
        assert_eq!(err, ConfigError::GridMismatch { name: "bedrock", expected: 9, actual: 8 });
    }

    #[test]
    fn from_bedrock_rejects_source_outside_grid() {
        let err = SimulationState::from_bedrock(3, 3, vec![0.0; 9], vec![Cell::new(3, 0)]);
        assert!(matches!(err, Err(ConfigError::OutOfRange { name: "source", .. })));
    }

    #[test]
    fn from_bedrock_rejects_nan() {
        let mut b = vec![0.0; 4];
        b[2] = f64::NAN;
        assert!(matches!(
            SimulationState::from_bedrock(2, 2, b, vec![]),
            Err(ConfigError::NonFinite { name: "bedrock", .. })
        ));
    }
}
