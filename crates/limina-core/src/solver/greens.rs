//! Inverse Green's function restricted to the design region.
//!
//! With the operator blocked as in [`crate::partition`], eliminating the
//! background unknowns gives the Schur complement
//!
//! $$
//! G_{AA}^{-1} = \frac{\mu_0}{k^2} \left( D_{dd} - C_{db} A_{bb}^{-1} B_{bd} \right)
//! $$
//!
//! which equals the inverse of the design-design block of $M^{-1}$, scaled by
//! the prefactor. Only $A_{bb}$ is factorized; the design region never is.

use log::debug;
use ndarray::Array2;
use num_complex::Complex64;

use super::direct::solve_sparse;
use super::SolverError;
use crate::partition::{BlockPartition, DesignPartition};
use crate::sparse::{self, to_complex, SparseOperator};

/// Compute $\text{prefactor} \cdot (D_{dd} - C_{db} A_{bb}^{-1} B_{bd})$.
///
/// # Arguments
/// * `operator` - Full square operator indexed like the partition.
/// * `partition` - Design/background split of the flattened grid.
/// * `prefactor` - Scale applied to the whole difference ($\mu_0/k^2$ for a Maxwell operator).
/// * `tolerance` - Backward-error bound passed to the background solve.
///
/// # Returns
/// A dense `(|A|, |A|)` matrix; `(0, 0)` for an empty design region.
pub fn restricted_greens_inverse(
    operator: &SparseOperator,
    partition: &DesignPartition,
    prefactor: f64,
    tolerance: f64,
) -> Result<Array2<Complex64>, SolverError> {
    let n_design = partition.num_design();
    if n_design == 0 {
        return Ok(Array2::zeros((0, 0)));
    }

    let blocks = BlockPartition::extract(operator, partition)?;
    let d_dd = sparse::to_mat(&blocks.d_dd);

    let schur = if partition.num_background() > 0 {
        debug!(
            "eliminating {} background cells against {} design cells",
            partition.num_background(),
            n_design
        );
        // X = A_bb^{-1} B_bd, one column per design cell
        let x = solve_sparse(&blocks.a_bb, &sparse::to_mat(&blocks.b_bd), tolerance)?;
        let correction = sparse::mul_dense(&blocks.c_db, x.as_ref());
        &d_dd - &correction
    } else {
        d_dd
    };

    Ok(Array2::from_shape_fn((n_design, n_design), |(i, j)| {
        to_complex(schur.read(i, j)) * prefactor
    }))
}
