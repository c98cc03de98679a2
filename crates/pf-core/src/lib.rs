//! pf-core: stable foundation for pumpflow.
//!
//! Contains:
//! - error (shared structural error kinds)
//! - numeric (tolerances + float helpers)
//! - units (uom SI types + constructors)
//! - curve (ordered point sets, interpolation, monotonic validation)
//! - roots (bracketed bisection shared by the solvers)
//! - convergence (solver convergence records)
//! - advisory (non-fatal engineering warnings)
//! - functions (caller-resolved named scalar functions)

pub mod advisory;
pub mod convergence;
pub mod curve;
pub mod error;
pub mod functions;
pub mod numeric;
pub mod roots;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use advisory::Advisory;
pub use convergence::{ConvergenceRecord, SolveMethod};
pub use curve::{Curve, Monotonicity, Point2D, interpolate, sort_by_x, validate_monotonic};
pub use error::{CalcError, CalcResult};
pub use functions::{FunctionRegistry, ScalarFn};
pub use numeric::*;
pub use roots::{BisectionConfig, BisectionOutcome, bisect};
