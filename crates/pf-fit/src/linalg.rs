//! Dense linear solve for small normal-equation systems.

use nalgebra::{DMatrix, DVector};
use pf_core::{CalcError, CalcResult};

/// Pivots smaller than this fraction of the largest matrix entry are treated
/// as zero.
pub const PIVOT_THRESHOLD: f64 = 1e-12;

/// Solve `a · x = b` by Gaussian elimination with partial pivoting.
///
/// Fails with `SingularMatrix` when a pivot falls below
/// [`PIVOT_THRESHOLD`] relative to the largest absolute entry of `a`.
pub fn solve_gaussian(mut a: DMatrix<f64>, mut b: DVector<f64>) -> CalcResult<DVector<f64>> {
    let n = a.nrows();
    if a.ncols() != n || b.len() != n {
        return Err(CalcError::config(format!(
            "linear system shape mismatch: {}x{} matrix, {} rhs",
            a.nrows(),
            a.ncols(),
            b.len()
        )));
    }

    let scale = a.amax();
    if !(scale > 0.0) || !scale.is_finite() {
        return Err(CalcError::SingularMatrix {
            what: "normal matrix is zero or non-finite",
        });
    }
    let threshold = PIVOT_THRESHOLD * scale;

    for col in 0..n {
        let (offset, pivot) = a
            .view((col, col), (n - col, 1))
            .iter()
            .enumerate()
            .fold((0, 0.0_f64), |best, (i, v)| {
                if v.abs() > best.1 { (i, v.abs()) } else { best }
            });
        if pivot < threshold {
            return Err(CalcError::SingularMatrix {
                what: "pivot below threshold; inputs are (nearly) collinear",
            });
        }

        let pivot_row = col + offset;
        if pivot_row != col {
            a.swap_rows(col, pivot_row);
            b.swap_rows(col, pivot_row);
        }

        for row in (col + 1)..n {
            let factor = a[(row, col)] / a[(col, col)];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[(row, k)] -= factor * a[(col, k)];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = DVector::zeros(n);
    for row in (0..n).rev() {
        let tail: f64 = ((row + 1)..n).map(|k| a[(row, k)] * x[k]).sum();
        x[row] = (b[row] - tail) / a[(row, row)];
    }
    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solves_small_system() {
        // 2x + y = 5, x + 3y = 10 → x = 1, y = 3
        let a = DMatrix::from_row_slice(2, 2, &[2.0, 1.0, 1.0, 3.0]);
        let b = DVector::from_vec(vec![5.0, 10.0]);
        let x = solve_gaussian(a, b).unwrap();
        assert!((x[0] - 1.0).abs() < 1e-12);
        assert!((x[1] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn pivots_past_zero_diagonal() {
        let a = DMatrix::from_row_slice(2, 2, &[0.0, 1.0, 1.0, 0.0]);
        let b = DVector::from_vec(vec![2.0, 3.0]);
        let x = solve_gaussian(a, b).unwrap();
        assert_eq!(x.as_slice(), &[3.0, 2.0]);
    }

    #[test]
    fn rejects_singular_matrix() {
        let a = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 4.0]);
        let b = DVector::from_vec(vec![1.0, 2.0]);
        let err = solve_gaussian(a, b).unwrap_err();
        assert!(matches!(err, CalcError::SingularMatrix { .. }));
    }

    #[test]
    fn rejects_shape_mismatch() {
        let a = DMatrix::zeros(2, 3);
        let b = DVector::zeros(2);
        assert!(matches!(
            solve_gaussian(a, b),
            Err(CalcError::InvalidModelConfig { .. })
        ));
    }
}
