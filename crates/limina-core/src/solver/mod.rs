//! Maxwell solver abstraction and implementations.
//!
//! The [`EmSolver`] trait is the substitution boundary between inverse-design
//! code and the electromagnetic discretization. A conforming solver only has
//! to own a grid configuration and assemble its Maxwell operator; the
//! restricted Green's-function inverse and the full-grid field solve are
//! provided on top of [`EmSolver::assemble_operator`] and may be overridden.
//!
//! The finite-difference TM solver ([`fdfd::TmFdfdSolver`]) is the bundled
//! implementation.

pub mod direct;
pub mod fdfd;
pub mod greens;

use faer::complex_native::c64;
use faer::Mat;
use ndarray::Array2;
use num_complex::Complex64;
use thiserror::Error;

use crate::partition::DesignPartition;
use crate::sparse::{to_c64, to_complex, SparseOperator};
use crate::types::{BoolGrid, ComplexGrid, DesignOperators, GridConfig, GridConfigPatch};

/// Errors that can occur while configuring a solver or solving with it.
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("Missing grid configuration: {}", fields.join(", "))]
    MissingConfiguration { fields: Vec<&'static str> },

    #[error("Invalid grid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Shape mismatch for {what}: expected {expected:?}, got {found:?}")]
    ShapeMismatch {
        what: &'static str,
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("No current source supplied and the solver has no default current")]
    MissingCurrent,

    #[error("Operator assembly failed: {0}")]
    Assembly(String),

    #[error("Sparse solve failed: {0}")]
    SolverFailure(String),
}

/// Check that a grid-shaped input matches the configured grid.
pub fn check_shape(
    what: &'static str,
    found: (usize, usize),
    expected: (usize, usize),
) -> Result<(), SolverError> {
    if found == expected {
        Ok(())
    } else {
        Err(SolverError::ShapeMismatch {
            what,
            expected,
            found,
        })
    }
}

/// The capability set every Maxwell solver must provide.
///
/// Implementations are single-threaded and deterministic: identical inputs on
/// an unchanged configuration give identical outputs. Any caching is internal.
pub trait EmSolver {
    /// Merge the fields present in `patch` into the stored configuration.
    ///
    /// Invalid values are rejected and leave the previous configuration in
    /// place. An incomplete configuration is accepted; operations that need it
    /// fail with [`SolverError::MissingConfiguration`] until it is completed.
    fn configure(&mut self, patch: &GridConfigPatch) -> Result<(), SolverError>;

    /// The complete grid configuration.
    fn config(&self) -> Result<GridConfig, SolverError>;

    /// Assemble $M = M_0 + \mathrm{diag}(\omega^2 \chi)$, or $M_0$ when
    /// `chi_background` is `None`.
    fn assemble_operator(&self, chi_background: Option<&ComplexGrid>) -> Result<SparseOperator, SolverError>;

    /// Current used by [`EmSolver::compute_field`] when none is passed.
    fn default_current(&self) -> Option<&ComplexGrid> {
        None
    }

    /// Backward-error threshold above which a sparse solve is reported as failed.
    fn residual_tolerance(&self) -> f64 {
        direct::DEFAULT_RESIDUAL_TOLERANCE
    }

    /// Scaling constant $\mu_0 / k^2$ applied to the restricted inverse.
    fn greens_prefactor(&self) -> Result<f64, SolverError> {
        Ok(self.config()?.greens_prefactor())
    }

    /// Compute the inverse Green's function restricted to the design cells,
    /// together with the full assembled operator.
    fn compute_gaa_inverse(
        &self,
        design_mask: &BoolGrid,
        chi_background: Option<&ComplexGrid>,
    ) -> Result<DesignOperators, SolverError> {
        let config = self.config()?;
        check_shape("design mask", design_mask.dim(), config.shape())?;

        let operator = self.assemble_operator(chi_background)?;
        let n = config.num_cells();
        check_shape("operator", (operator.nrows(), operator.ncols()), (n, n))?;
        let partition = DesignPartition::from_mask(design_mask);
        let gaa_inv = greens::restricted_greens_inverse(
            &operator,
            &partition,
            config.greens_prefactor(),
            self.residual_tolerance(),
        )?;

        Ok(DesignOperators { gaa_inv, operator })
    }

    /// Solve the full-grid system $M E = -i \omega J$ for the field $E$.
    fn compute_field(
        &self,
        current: Option<&ComplexGrid>,
        chi_background: Option<&ComplexGrid>,
    ) -> Result<ComplexGrid, SolverError> {
        let config = self.config()?;
        let current = match current {
            Some(j) => j,
            None => self.default_current().ok_or(SolverError::MissingCurrent)?,
        };
        check_shape("current", current.dim(), config.shape())?;

        let operator = self.assemble_operator(chi_background)?;
        let n = config.num_cells();
        check_shape("operator", (operator.nrows(), operator.ncols()), (n, n))?;

        let ny = config.ny;
        let factor = Complex64::new(0.0, -config.omega);
        let source = Mat::<c64>::from_fn(n, 1, |i, _| to_c64(factor * current[[i / ny, i % ny]]));

        let solution = direct::solve_sparse(&operator, &source, self.residual_tolerance())?;
        Ok(Array2::from_shape_fn(config.shape(), |(ix, iy)| {
            to_complex(solution.read(ix * ny + iy, 0))
        }))
    }

    /// Human-readable name of the solver.
    fn method_name(&self) -> &str;
}
