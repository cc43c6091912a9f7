//! Sparse direct solves via `faer`.
//!
//! The operator is factorized once with sparse LU and every column of the
//! right-hand side is solved against that single factorization.

use std::panic::{self, AssertUnwindSafe};

use faer::complex_native::c64;
use faer::linalg::solvers::SpSolver;
use faer::Mat;
use log::debug;

use super::SolverError;
use crate::sparse::{self, SparseOperator};

/// Default bound on the normwise backward error of a solve.
pub const DEFAULT_RESIDUAL_TOLERANCE: f64 = 1e-8;

/// Solve $A X = B$ for a sparse square $A$ and dense multi-column $B$.
///
/// # Arguments
/// * `matrix` - Square sparse operator $A$.
/// * `rhs` - Dense right-hand side $B$ with `matrix.nrows()` rows.
/// * `tolerance` - Maximum accepted backward error
///   $\|AX - B\|_F / (\|A\|_F \|X\|_F + \|B\|_F)$.
///
/// # Errors
/// [`SolverError::SolverFailure`] if the factorization fails or meets a zero
/// pivot, the solution is not finite, or the backward error exceeds `tolerance`.
pub fn solve_sparse(
    matrix: &SparseOperator,
    rhs: &Mat<c64>,
    tolerance: f64,
) -> Result<Mat<c64>, SolverError> {
    let dim = matrix.nrows();
    assert_eq!(dim, matrix.ncols(), "Matrix must be square");
    assert_eq!(dim, rhs.nrows(), "RHS rows must match matrix dimension");
    let ncols = rhs.ncols();

    if dim == 0 || ncols == 0 {
        return Ok(Mat::zeros(dim, ncols));
    }

    // faer's simplicial LU panics on an exact zero pivot
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        let lu = matrix.as_ref().sp_lu().map_err(|e| format!("{e:?}"))?;
        debug!(
            "factorized {dim}x{dim} operator ({} non-zeros), solving {ncols} columns",
            sparse::nnz(matrix)
        );
        let mut solution = rhs.clone();
        lu.solve_in_place(solution.as_mut());
        Ok::<_, String>(solution)
    }));

    let solution = match outcome {
        Ok(Ok(solution)) => solution,
        Ok(Err(e)) => {
            return Err(SolverError::SolverFailure(format!(
                "sparse LU factorization failed: {e}"
            )))
        }
        Err(_) => {
            return Err(SolverError::SolverFailure(
                "sparse LU factorization hit a zero pivot (singular matrix)".into(),
            ))
        }
    };

    let finite = (0..ncols).all(|j| {
        (0..dim).all(|i| {
            let v = solution.read(i, j);
            v.re.is_finite() && v.im.is_finite()
        })
    });
    if !finite {
        return Err(SolverError::SolverFailure(
            "solution contains non-finite entries (singular matrix)".into(),
        ));
    }

    let backward_error = backward_error(matrix, &solution, rhs);
    if !(backward_error <= tolerance) {
        return Err(SolverError::SolverFailure(format!(
            "backward error {backward_error:.2e} exceeds tolerance {tolerance:.2e}"
        )));
    }

    Ok(solution)
}

/// Normwise backward error $\|AX - B\|_F / (\|A\|_F \|X\|_F + \|B\|_F)$.
pub fn backward_error(matrix: &SparseOperator, x: &Mat<c64>, rhs: &Mat<c64>) -> f64 {
    let ax = sparse::mul_dense(matrix, x.as_ref());
    let residual = &ax - rhs;
    let denominator = sparse::frobenius_norm(matrix) * x.norm_l2() + rhs.norm_l2();
    if denominator == 0.0 {
        return 0.0;
    }
    residual.norm_l2() / denominator
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sparse::{from_array, from_triplets, to_c64, to_complex};
    use ndarray::{array, Array2};
    use num_complex::Complex64;

    fn c(re: f64, im: f64) -> c64 {
        c64::new(re, im)
    }

    fn identity(n: usize) -> SparseOperator {
        let diagonal: Vec<_> = (0..n).map(|i| (i, i, c(1.0, 0.0))).collect();
        from_triplets(n, n, &diagonal).unwrap()
    }

    #[test]
    fn test_solve_identity_system() {
        let dim = 6;
        let rhs = Mat::<c64>::from_fn(dim, 2, |i, j| c(i as f64, j as f64));

        let sol = solve_sparse(&identity(dim), &rhs, DEFAULT_RESIDUAL_TOLERANCE).unwrap();
        for j in 0..2 {
            for i in 0..dim {
                assert!((to_complex(sol.read(i, j)) - to_complex(rhs.read(i, j))).norm() < 1e-12);
            }
        }
    }

    #[test]
    fn test_solve_complex_system() {
        let dense = array![
            [Complex64::new(1.0, 1.0), Complex64::new(2.0, 0.0)],
            [Complex64::new(0.0, 1.0), Complex64::new(3.0, -1.0)]
        ];
        let matrix = from_array(&dense).unwrap();
        let b = array![[Complex64::new(5.0, 1.0)], [Complex64::new(4.0, 2.0)]];
        let rhs = Mat::<c64>::from_fn(2, 1, |i, j| to_c64(b[[i, j]]));

        let sol = solve_sparse(&matrix, &rhs, DEFAULT_RESIDUAL_TOLERANCE).unwrap();

        // Verify: A * sol should equal rhs
        let x = array![[to_complex(sol.read(0, 0))], [to_complex(sol.read(1, 0))]];
        let check = dense.dot(&x);
        for i in 0..2 {
            assert!(
                (check[[i, 0]] - b[[i, 0]]).norm() < 1e-10,
                "Mismatch at {}: got {:?}, expected {:?}",
                i,
                check[[i, 0]],
                b[[i, 0]]
            );
        }
    }

    #[test]
    fn test_empty_system_short_circuits() {
        let matrix = from_triplets(0, 0, &[]).unwrap();
        let rhs = Mat::<c64>::zeros(0, 3);
        let sol = solve_sparse(&matrix, &rhs, DEFAULT_RESIDUAL_TOLERANCE).unwrap();
        assert_eq!((sol.nrows(), sol.ncols()), (0, 3));
    }

    #[test]
    fn test_zero_row_is_reported() {
        let one = c(1.0, 0.0);
        let matrix = from_triplets(3, 3, &[(0, 0, one), (0, 1, one), (2, 2, one), (2, 0, one)]).unwrap();
        let rhs = Mat::<c64>::from_fn(3, 1, |_, _| one);
        let err = solve_sparse(&matrix, &rhs, DEFAULT_RESIDUAL_TOLERANCE).unwrap_err();
        assert!(matches!(err, SolverError::SolverFailure(_)));
    }

    #[test]
    fn test_rank_deficient_matrix_is_reported() {
        // Structurally full, numerically rank one
        let matrix = from_triplets(
            2,
            2,
            &[(0, 0, c(1.0, 0.0)), (0, 1, c(2.0, 0.0)), (1, 0, c(2.0, 0.0)), (1, 1, c(4.0, 0.0))],
        )
        .unwrap();
        let rhs = Mat::<c64>::from_fn(2, 1, |i, _| c(1.0 + i as f64, 0.0));
        let err = solve_sparse(&matrix, &rhs, DEFAULT_RESIDUAL_TOLERANCE).unwrap_err();
        assert!(matches!(err, SolverError::SolverFailure(_)), "got {err}");
    }

    #[test]
    fn test_tolerance_below_rounding_is_reported() {
        let n = 12;
        let dense = Array2::from_shape_fn((n, n), |(i, j)| {
            if i == j {
                Complex64::new(6.0 + 0.1 * i as f64, 0.7)
            } else {
                Complex64::new(((i * 7 + j * 3) % 5) as f64 / 3.0, ((i + j) % 4) as f64 / 7.0)
            }
        });
        let matrix = from_array(&dense).unwrap();
        let rhs = Mat::<c64>::from_fn(n, 1, |i, _| c(1.0 / (1.0 + i as f64), 0.3));

        assert!(solve_sparse(&matrix, &rhs, DEFAULT_RESIDUAL_TOLERANCE).is_ok());
        let err = solve_sparse(&matrix, &rhs, 1e-300).unwrap_err();
        assert!(matches!(err, SolverError::SolverFailure(_)));
    }
}
