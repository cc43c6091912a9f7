//! Staggered finite-difference derivative operators on the 2D grid.
//!
//! Forward differences couple cell $i$ to $i + 1$ and backward differences
//! couple $i$ to $i - 1$. The last cell wraps to the first with the Bloch
//! phase $e^{i\phi}$ (forward) or $-e^{-i\phi}$ (backward), which makes the
//! backward operator the negative adjoint of the forward one. Rows are
//! divided by the PML stretch factor of the cell they belong to.

use num_complex::Complex64;

use super::pml::{stretch_factors, Difference};
use crate::solver::SolverError;
use crate::sparse::{self, to_c64, SparseOperator};
use crate::types::GridConfig;

/// Grid axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// Build the PML-stretched derivative along `axis` as an `(N, N)` operator,
/// `N = nx * ny`, on the row-major flattened grid.
pub fn derivative(
    config: &GridConfig,
    axis: Axis,
    difference: Difference,
) -> Result<SparseOperator, SolverError> {
    let (n_axis, npml, bloch) = match axis {
        Axis::X => (config.nx, config.npml_x, config.bloch_x),
        Axis::Y => (config.ny, config.npml_y, config.bloch_y),
    };
    let stretch = stretch_factors(config.omega, config.dl, n_axis, npml, difference);
    let phasor = Complex64::new(0.0, bloch).exp();
    let inv_dl = 1.0 / config.dl;

    let index = |ix: usize, iy: usize| ix * config.ny + iy;
    let mut triplets = Vec::with_capacity(2 * config.num_cells());

    for ix in 0..config.nx {
        for iy in 0..config.ny {
            let (pos, row) = match axis {
                Axis::X => (ix, index(ix, iy)),
                Axis::Y => (iy, index(ix, iy)),
            };
            let scale = inv_dl / stretch[pos];
            let neighbour = |p: usize| match axis {
                Axis::X => index(p, iy),
                Axis::Y => index(ix, p),
            };

            match difference {
                Difference::Forward => {
                    triplets.push((row, row, to_c64(-scale)));
                    if pos + 1 < n_axis {
                        triplets.push((row, neighbour(pos + 1), to_c64(scale)));
                    } else {
                        triplets.push((row, neighbour(0), to_c64(scale * phasor)));
                    }
                }
                Difference::Backward => {
                    triplets.push((row, row, to_c64(scale)));
                    if pos > 0 {
                        triplets.push((row, neighbour(pos - 1), to_c64(-scale)));
                    } else {
                        triplets.push((row, neighbour(n_axis - 1), to_c64(-scale * phasor.conj())));
                    }
                }
            }
        }
    }

    let n = config.num_cells();
    sparse::from_triplets(n, n, &triplets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use faer::complex_native::c64;
    use faer::Mat;

    fn config(bloch_x: f64, bloch_y: f64) -> GridConfig {
        GridConfig {
            omega: 1.0,
            nx: 4,
            ny: 3,
            npml_x: 0,
            npml_y: 0,
            dl: 0.5,
            bloch_x,
            bloch_y,
        }
    }

    #[test]
    fn test_forward_wraps_with_bloch_phase() {
        let cfg = config(0.7, 0.0);
        let dxf = sparse::to_array(&derivative(&cfg, Axis::X, Difference::Forward).unwrap());
        // Last x-row of column iy = 1 wraps to the first x-row
        let row = 3 * cfg.ny + 1;
        let expected = Complex64::new(0.0, 0.7).exp() / cfg.dl;
        assert!((dxf[[row, 1]] - expected).norm() < 1e-14);
        assert!((dxf[[row, row]] + 1.0 / cfg.dl).norm() < 1e-14);
    }

    #[test]
    fn test_backward_is_negative_adjoint_without_pml() {
        let cfg = config(0.4, -1.1);
        for axis in [Axis::X, Axis::Y] {
            let f = sparse::to_array(&derivative(&cfg, axis, Difference::Forward).unwrap());
            let b = sparse::to_array(&derivative(&cfg, axis, Difference::Backward).unwrap());
            for ((i, j), v) in b.indexed_iter() {
                assert!((v + f[[j, i]].conj()).norm() < 1e-14);
            }
        }
    }

    #[test]
    fn test_periodic_derivative_annihilates_constants() {
        let cfg = config(0.0, 0.0);
        let dyf = derivative(&cfg, Axis::Y, Difference::Forward).unwrap();
        let ones = Mat::<c64>::from_fn(cfg.num_cells(), 1, |_, _| c64::new(1.0, 0.0));
        let product = sparse::mul_dense(&dyf, ones.as_ref());
        for i in 0..cfg.num_cells() {
            let v = product.read(i, 0);
            assert!(v.re.abs() < 1e-14 && v.im.abs() < 1e-14);
        }
    }
}
