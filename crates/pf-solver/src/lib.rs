//! pf-solver: pump hydraulics for pumpflow.
//!
//! Provides:
//! - Pump curves with affinity-law scaling, best efficiency point and power
//! - System curves (constant, quadratic, polynomial, caller-named)
//! - Single / parallel / series curve combination
//! - Operating-point solver (bisection on pump head − system head)
//! - NPSH check
//! - Pressure drop with temperature-dependent viscosity (fixed point)
//!
//! Every solver is a pure function of its request. Non-convergence is
//! reported in the returned [`pf_core::ConvergenceRecord`], not as an error.

pub mod arrangement;
pub mod npsh;
pub mod operating_point;
pub mod pump;
pub mod system;
pub mod viscous_drop;

pub use arrangement::{Arrangement, combine};
pub use npsh::{NpshResult, SuctionConditions, check_npsh};
pub use operating_point::{
    OperatingPoint, OperatingPointRequest, OperatingPointSolution, PumpDuty, solve_operating_point,
};
pub use pump::{PumpCurve, PumpPoint, PumpPowerResult, pump_power};
pub use system::{ResolvedSystemCurve, SystemCurve};
pub use viscous_drop::{
    AndradeModel, DropIteration, FixedPointConfig, ViscousDropRequest, ViscousDropResult,
    solve_viscosity_adjusted_drop,
};
