use serde::{Deserialize, Serialize};

/// Iterative method that produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveMethod {
    Bisection,
    FixedPoint,
}

/// Convergence diagnostics attached to every iterative result.
///
/// `converged = false` is an ordinary outcome, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceRecord {
    pub iterations: usize,
    pub residual: f64,
    pub converged: bool,
    pub method: SolveMethod,
}

impl ConvergenceRecord {
    pub fn bisection(iterations: usize, residual: f64, converged: bool) -> Self {
        Self {
            iterations,
            residual,
            converged,
            method: SolveMethod::Bisection,
        }
    }

    pub fn fixed_point(iterations: usize, residual: f64, converged: bool) -> Self {
        Self {
            iterations,
            residual,
            converged,
            method: SolveMethod::FixedPoint,
        }
    }
}
