//! Real-time hydraulic and thermal erosion over a fixed-size heightfield.
//!
//! The [`Simulator`] owns every grid and advances them one tick at a time:
//! pipe-model water flow, capacity-limited sediment transport with
//! semi-Lagrangian advection, talus-angle thermal relaxation, and periodic
//! mass normalization. Renderers read [`Snapshot`]s.

pub mod coords;
pub mod error;
pub mod field;
pub mod hydraulic;
pub mod params;
pub mod simulator;
pub mod snapshot;
pub mod state;
pub mod terrain;
pub mod util;

pub use coords::{Cell, Direction};
pub use error::{ConfigError, Result};
pub use field::Field;
pub use params::{ErosionParams, RainSchedule};
pub use simulator::{Simulator, TickReport};
pub use snapshot::Snapshot;
pub use state::SimulationState;
pub use terrain::{Fbm, NoiseSource};
