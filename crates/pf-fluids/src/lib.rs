//! pf-fluids: fluid-flow correlations for pumpflow.
//!
//! Provides:
//! - Reynolds number, Churchill friction factor, Darcy-Weisbach pressure drop
//! - Andrade viscosity-temperature relation
//! - An injectable, bounded LRU cache for Reynolds/friction-factor results
//! - Pipe pressure drop and the inverse flow-rate calculation
//!
//! Non-physical inputs (zero viscosity, negative diameter, ...) produce NaN or
//! infinite sentinels instead of errors, so batch callers can keep going.
//!
//! # Example
//!
//! ```
//! use pf_fluids::{PipeFlow, pressure_drop};
//!
//! let flow = PipeFlow::new(0.01, 0.1, 100.0, 1000.0, 0.001).with_roughness(1e-4);
//! let result = pressure_drop(&flow, None);
//! assert!((result.pressure_drop - 17_731.0).abs() < 20.0);
//! ```

pub mod cache;
pub mod correlations;
pub mod pipe;

pub use cache::{CacheStats, CorrelationCache};
pub use correlations::{
    FlowRegime, andrade_viscosity, darcy_pressure_drop, friction_factor, head_from_pressure,
    mean_velocity, reynolds,
};
pub use pipe::{
    DEFAULT_ROUGHNESS, FlowRateResult, FluidProperties, PipeFlow, PipeSegment, PressureDropResult,
    flow_rate_from_pressure_drop, pressure_drop, pressure_drop_batch,
};
