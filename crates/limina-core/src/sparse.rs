//! Sparse operators stored as `faer` compressed-column matrices.
//!
//! Products and sums go through `faer`'s sparse arithmetic; the helpers here
//! only cover what the FDFD assembly and block slicing need on top of that:
//! triplet round trips, diagonal shifts, norms and conversion to
//! `ndarray` at the API boundary.

use faer::complex_native::c64;
use faer::sparse::SparseColMat;
use faer::{Mat, MatRef};
use ndarray::Array2;
use num_complex::Complex64;

use crate::solver::SolverError;

/// Complex sparse operator, `usize`-indexed.
pub type SparseOperator = SparseColMat<usize, c64>;

pub fn to_c64(z: Complex64) -> c64 {
    c64::new(z.re, z.im)
}

pub fn to_complex(z: c64) -> Complex64 {
    Complex64::new(z.re, z.im)
}

/// Build from `(row, col, value)` triplets; duplicates are summed.
pub fn from_triplets(
    nrows: usize,
    ncols: usize,
    triplets: &[(usize, usize, c64)],
) -> Result<SparseOperator, SolverError> {
    SparseColMat::try_new_from_triplets(nrows, ncols, triplets)
        .map_err(|e| SolverError::Assembly(format!("{e:?}")))
}

/// Sparse copy of a dense matrix, keeping only the non-zero entries.
pub fn from_array(dense: &Array2<Complex64>) -> Result<SparseOperator, SolverError> {
    let (nrows, ncols) = dense.dim();
    let triplets: Vec<(usize, usize, c64)> = dense
        .indexed_iter()
        .filter(|(_, v)| **v != Complex64::new(0.0, 0.0))
        .map(|((i, j), v)| (i, j, to_c64(*v)))
        .collect();
    from_triplets(nrows, ncols, &triplets)
}

/// Every stored entry as `(row, col, value)`, column by column.
pub fn triplets(matrix: &SparseOperator) -> Vec<(usize, usize, c64)> {
    let m = matrix.as_ref();
    let mut out = Vec::new();
    for col in 0..m.ncols() {
        for (row, value) in m.row_indices_of_col(col).zip(m.values_of_col(col)) {
            out.push((row, col, *value));
        }
    }
    out
}

/// Number of stored entries.
pub fn nnz(matrix: &SparseOperator) -> usize {
    matrix.symbolic().compute_nnz()
}

/// `matrix + diag(diagonal)`.
///
/// # Panics
/// Panics if the matrix is not square or the diagonal length differs.
pub fn add_diagonal(matrix: &SparseOperator, diagonal: &[c64]) -> Result<SparseOperator, SolverError> {
    let n = matrix.nrows();
    assert_eq!(n, matrix.ncols(), "Matrix must be square");
    assert_eq!(diagonal.len(), n, "Diagonal length must match dimension");
    let mut entries = triplets(matrix);
    entries.extend(diagonal.iter().enumerate().map(|(i, &d)| (i, i, d)));
    from_triplets(n, n, &entries)
}

/// Dense product `matrix * rhs`.
pub fn mul_dense(matrix: &SparseOperator, rhs: MatRef<'_, c64>) -> Mat<c64> {
    matrix.as_ref() * rhs
}

/// Frobenius norm of the stored entries.
pub fn frobenius_norm(matrix: &SparseOperator) -> f64 {
    triplets(matrix)
        .iter()
        .map(|(_, _, v)| v.re * v.re + v.im * v.im)
        .sum::<f64>()
        .sqrt()
}

/// Dense `faer` copy.
pub fn to_mat(matrix: &SparseOperator) -> Mat<c64> {
    let mut dense = Mat::<c64>::zeros(matrix.nrows(), matrix.ncols());
    for (i, j, v) in triplets(matrix) {
        dense.write(i, j, v);
    }
    dense
}

/// Dense `ndarray` copy.
pub fn to_array(matrix: &SparseOperator) -> Array2<Complex64> {
    let mut dense = Array2::<Complex64>::zeros((matrix.nrows(), matrix.ncols()));
    for (i, j, v) in triplets(matrix) {
        dense[[i, j]] = to_complex(v);
    }
    dense
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn c(re: f64, im: f64) -> Complex64 {
        Complex64::new(re, im)
    }

    #[test]
    fn test_duplicates_are_summed() {
        let one = c64::new(1.0, 0.0);
        let m = from_triplets(2, 2, &[(0, 1, one), (0, 1, c64::new(2.0, 1.0)), (1, 0, one)]).unwrap();
        assert_eq!(nnz(&m), 2);
        assert_eq!(to_array(&m), array![[c(0.0, 0.0), c(3.0, 1.0)], [c(1.0, 0.0), c(0.0, 0.0)]]);
    }

    #[test]
    fn test_add_diagonal() {
        let m = from_array(&array![[c(0.0, 0.0), c(1.0, 0.0)], [c(0.0, 0.0), c(0.0, 0.0)]]).unwrap();
        let shifted = add_diagonal(&m, &[c64::new(2.0, 0.0), c64::new(0.0, 5.0)]).unwrap();
        assert_eq!(
            to_array(&shifted),
            array![[c(2.0, 0.0), c(1.0, 0.0)], [c(0.0, 0.0), c(0.0, 5.0)]]
        );
    }

    #[test]
    fn test_mul_dense_matches_ndarray() {
        let dense = array![[c(1.0, 1.0), c(0.0, 0.0)], [c(2.0, 0.0), c(0.0, -1.0)]];
        let m = from_array(&dense).unwrap();
        let x = array![[c(1.0, 0.0)], [c(0.0, 1.0)]];
        let x_mat = Mat::<c64>::from_fn(2, 1, |i, j| to_c64(x[[i, j]]));
        let y = mul_dense(&m, x_mat.as_ref());
        let expected = dense.dot(&x);
        for i in 0..2 {
            assert!((to_complex(y.read(i, 0)) - expected[[i, 0]]).norm() < 1e-14);
        }
    }

    #[test]
    fn test_frobenius_norm() {
        let m = from_array(&array![[c(3.0, 0.0), c(0.0, 0.0)], [c(0.0, 4.0), c(0.0, 0.0)]]).unwrap();
        assert!((frobenius_norm(&m) - 5.0).abs() < 1e-14);
    }
}
