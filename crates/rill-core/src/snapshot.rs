//! Read-only grid copies handed to renderers.

use serde::{Deserialize, Serialize};

use crate::state::SimulationState;

/// Row-major copies of the fields a renderer needs, `width × height` each.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub width: usize,
    pub height: usize,
    pub bedrock: Vec<f64>,
    /// `b − bInit`: elevation change since the last reset.
    pub bedrock_delta: Vec<f64>,
    pub water_depth: Vec<f64>,
    pub sediment: Vec<f64>,
    pub velocity_x: Vec<f64>,
    pub velocity_y: Vec<f64>,
    /// `b + d`.
    pub water_surface: Vec<f64>,
}

impl Snapshot {
    pub fn capture(state: &SimulationState) -> Self {
        let bedrock_delta = state
            .bedrock
            .data
            .iter()
            .zip(&state.initial_bedrock.data)
            .map(|(b, b0)| b - b0)
            .collect();
        Self {
            width: state.width,
            height: state.height,
            bedrock: state.bedrock.data.clone(),
            bedrock_delta,
            water_depth: state.water.data.clone(),
            sediment: state.sediment.data.clone(),
            velocity_x: state.velocity_x.data.clone(),
            velocity_y: state.velocity_y.data.clone(),
            water_surface: state.water_surface(),
        }
    }

    /// Flow speed `|v|` per cell.
    pub fn speed(&self) -> Vec<f64> {
        self.velocity_x.iter().zip(&self.velocity_y).map(|(vx, vy)| vx.hypot(*vy)).collect()
    }
}

/// Narrow a grid to f32 for GPU/JS upload.
pub fn to_f32(values: &[f64]) -> Vec<f32> {
    values.iter().map(|&v| v as f32).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Field;

    #[test]
    fn delta_is_change_since_reset() {
        let mut s = SimulationState::from_bedrock(2, 2, vec![1.0, 1.0, 2.0, 2.0], vec![]).unwrap();
        s.bedrock = Field::from_fn(2, 2, |x, y| (x + y) as f64 + 0.5);
        s.water = Field::new(2, 2, 0.25);
        let snap = Snapshot::capture(&s);
        assert_eq!(snap.bedrock_delta, vec![-0.5, 0.5, -0.5, 0.5]);
        assert_eq!(snap.water_surface, vec![0.75, 1.75, 1.75, 2.75]);
    }

    #[test]
    fn speed_is_velocity_magnitude() {
        let mut s = SimulationState::empty(2, 2);
        s.velocity_x = Field::new(2, 2, 3.0);
        s.velocity_y = Field::new(2, 2, -4.0);
        assert_eq!(Snapshot::capture(&s).speed(), vec![5.0; 4]);
    }
}
