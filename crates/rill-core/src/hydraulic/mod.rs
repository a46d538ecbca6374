//! Erosion phases, in tick order: flow → sediment → thermal → mass.
//!
//! Every neighbour-reading pass computes its successor grid in full before it
//! replaces the canonical one; only cell-local updates run in place.
pub mod flow;
pub mod mass;
pub mod sediment;
pub mod thermal;

pub use flow::{step_flow, FlowPass};
pub use mass::normalize_mass;
pub use sediment::step_sediment;
pub use thermal::step_thermal;
