//! Least-squares polynomial fitting.

use crate::linalg::solve_gaussian;
use nalgebra::{DMatrix, DVector};
use pf_core::{CalcError, CalcResult, Point2D, eval_polynomial, sort_by_x};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolynomialDegree {
    Quadratic,
    Cubic,
}

impl PolynomialDegree {
    pub fn degree(self) -> usize {
        match self {
            PolynomialDegree::Quadratic => 2,
            PolynomialDegree::Cubic => 3,
        }
    }

    /// Number of fitted coefficients.
    pub fn parameter_count(self) -> usize {
        self.degree() + 1
    }

    /// Minimum number of points for a determined fit.
    pub fn min_points(self) -> usize {
        self.parameter_count()
    }
}

impl FromStr for PolynomialDegree {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quadratic" => Ok(PolynomialDegree::Quadratic),
            "cubic" => Ok(PolynomialDegree::Cubic),
            other => Err(CalcError::config(format!(
                "unknown polynomial degree '{other}' (expected quadratic or cubic)"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveFitResult {
    pub degree: PolynomialDegree,
    /// Lowest degree first
    pub coefficients: Vec<f64>,
    pub r_squared: f64,
    pub adjusted_r_squared: f64,
    pub standard_error: f64,
    /// actual − predicted, in input order
    pub residuals: Vec<f64>,
    /// In input order
    pub predicted: Vec<f64>,
}

impl CurveFitResult {
    pub fn evaluate(&self, x: f64) -> f64 {
        eval_polynomial(&self.coefficients, x)
    }
}

/// Fit `points` with a polynomial of the given degree.
///
/// The design matrix columns are scaled to unit max-norm before the normal
/// equations are formed, and the coefficients are unscaled afterwards.
pub fn fit_polynomial(points: &[Point2D], degree: PolynomialDegree) -> CalcResult<CurveFitResult> {
    let n = points.len();
    let p = degree.parameter_count();
    if n < degree.min_points() {
        return Err(CalcError::InsufficientCurveData {
            what: "polynomial fit",
            required: degree.min_points(),
            actual: n,
        });
    }
    // Validates finiteness and unique x; the fit itself keeps input order
    sort_by_x(points)?;

    let mut design = DMatrix::from_fn(n, p, |i, j| points[i].x.powi(j as i32));
    let mut scales = vec![1.0; p];
    for (j, scale) in scales.iter_mut().enumerate() {
        let max = design.column(j).amax();
        if max > 0.0 {
            *scale = max;
            design.column_mut(j).unscale_mut(max);
        }
    }
    let y = DVector::from_iterator(n, points.iter().map(|pt| pt.y));

    let normal = design.transpose() * &design;
    let rhs = design.transpose() * &y;
    let scaled = solve_gaussian(normal, rhs)?;

    let coefficients: Vec<f64> = scaled.iter().zip(&scales).map(|(c, s)| c / s).collect();
    let predicted: Vec<f64> = points
        .iter()
        .map(|pt| eval_polynomial(&coefficients, pt.x))
        .collect();
    let residuals: Vec<f64> = points
        .iter()
        .zip(&predicted)
        .map(|(pt, yhat)| pt.y - yhat)
        .collect();

    let mean = y.mean();
    let ss_tot: f64 = points.iter().map(|pt| (pt.y - mean).powi(2)).sum();
    let ss_res: f64 = residuals.iter().map(|r| r * r).sum();

    let r_squared = if ss_tot > 0.0 {
        (1.0 - ss_res / ss_tot).clamp(0.0, 1.0)
    } else if ss_res <= f64::EPSILON * n as f64 {
        1.0
    } else {
        0.0
    };

    let dof = n as i64 - p as i64 - 1;
    let (adjusted_r_squared, standard_error) = if dof > 0 {
        let dof = dof as f64;
        (
            1.0 - (1.0 - r_squared) * (n as f64 - 1.0) / dof,
            (ss_res / dof).sqrt(),
        )
    } else {
        (0.0, 0.0)
    };

    debug!(
        points = n,
        degree = degree.degree(),
        r_squared,
        "polynomial fit complete"
    );

    Ok(CurveFitResult {
        degree,
        coefficients,
        r_squared,
        adjusted_r_squared,
        standard_error,
        residuals,
        predicted,
    })
}
