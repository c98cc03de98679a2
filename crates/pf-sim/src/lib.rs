//! pf-sim: explicit time stepping of a single tank.
//!
//! - `model`: TransientModel trait
//! - `integrator`: fixed-step integrators (forward Euler)
//! - `control`: on/off level control with hysteresis
//! - `tank`: tank configuration, validation and the per-step update
//! - `sim`: run loop, time series and summary

pub mod control;
pub mod integrator;
pub mod model;
pub mod sim;
pub mod tank;

pub use control::OnOffControl;
pub use integrator::{ForwardEuler, Integrator};
pub use model::TransientModel;
pub use sim::{TankSimulation, TankSummary, run_tank_simulation};
pub use tank::{
    DEFAULT_MAX_STEPS, InflowModel, LevelState, OutflowModel, TankConfig, TankModel, TankState,
    TankStep,
};
