//! Bracketed bisection root finder.

use crate::convergence::ConvergenceRecord;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Bisection configuration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BisectionConfig {
    /// Absolute tolerance on |residual|
    pub tolerance: f64,
    /// Maximum number of interval halvings
    pub max_iterations: usize,
}

impl Default for BisectionConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            max_iterations: 100,
        }
    }
}

/// Result of a bisection run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BisectionOutcome {
    /// Root estimate; the best point seen when not converged
    pub root: f64,
    /// Residual at `root`
    pub residual: f64,
    pub iterations: usize,
    pub converged: bool,
    /// Whether the initial interval contained a sign change
    pub bracketed: bool,
}

impl BisectionOutcome {
    pub fn record(&self) -> ConvergenceRecord {
        ConvergenceRecord::bisection(self.iterations, self.residual, self.converged)
    }
}

/// Find a root of `f` in `[lo, hi]` by repeated halving.
///
/// Stops when |f| <= tolerance, the iteration cap is reached, or the interval
/// collapses to floating point resolution. Without a sign change across the
/// interval the endpoint with the smaller |f| is returned and
/// `bracketed = false`.
pub fn bisect<F>(mut f: F, lo: f64, hi: f64, config: &BisectionConfig) -> BisectionOutcome
where
    F: FnMut(f64) -> f64,
{
    let (mut lo, mut hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
    let mut f_lo = f(lo);
    let f_hi = f(hi);
    let tol = config.tolerance;

    let closer = |a: (f64, f64), b: (f64, f64)| {
        if a.1.abs() <= b.1.abs() { a } else { b }
    };
    let mut best = closer((hi, f_hi), (lo, f_lo));

    let finish = |best: (f64, f64), iterations: usize, converged: bool, bracketed: bool| {
        BisectionOutcome {
            root: best.0,
            residual: best.1,
            iterations,
            converged,
            bracketed,
        }
    };

    if best.1.abs() <= tol {
        return finish(best, 0, true, true);
    }
    if !(f_lo.is_finite() && f_hi.is_finite()) || f_lo.signum() == f_hi.signum() {
        return finish(best, 0, false, false);
    }

    let mut iterations = 0;
    while iterations < config.max_iterations {
        iterations += 1;
        let mid = 0.5 * (lo + hi);
        let f_mid = f(mid);
        trace!(
            iteration = iterations,
            x = mid,
            residual = f_mid,
            "bisection step"
        );

        if !f_mid.is_finite() {
            return finish(best, iterations, false, true);
        }
        best = closer((mid, f_mid), best);
        if f_mid.abs() <= tol {
            return finish((mid, f_mid), iterations, true, true);
        }

        if f_mid.signum() == f_lo.signum() {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }

        if hi - lo <= f64::EPSILON * lo.abs().max(hi.abs()).max(1.0) {
            break;
        }
    }

    finish(best, iterations, best.1.abs() <= tol, true)
}
