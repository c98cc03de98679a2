//! pf-fit: least-squares polynomial fitting of pump and system curves.
//!
//! Quadratic and cubic fits through the normal equations, solved with
//! partially pivoted Gaussian elimination on `nalgebra` matrices.

pub mod fit;
pub mod linalg;

pub use fit::{CurveFitResult, PolynomialDegree, fit_polynomial};
pub use linalg::solve_gaussian;
