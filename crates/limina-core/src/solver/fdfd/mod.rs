//! Finite-difference frequency-domain (FDFD) solver for TM fields.
//!
//! The out-of-plane electric field $E_z$ on an `nx` by `ny` grid satisfies
//!
//! $$
//! \left[ \frac{1}{\mu_0}\left(D_x^f D_x^b + D_y^f D_y^b\right)
//! + \omega^2 \epsilon_0 (1 + \chi) \right] E_z = -i \omega J_z
//! $$
//!
//! with stretched-coordinate PMLs ([`pml`]) and Bloch-periodic wrap-around
//! ([`derivatives`]). The material-free part $M_0$ depends only on the grid
//! configuration and is cached; susceptibility enters as a diagonal shift.

pub mod derivatives;
pub mod pml;

use faer::complex_native::c64;
use log::info;

use super::{check_shape, EmSolver, SolverError};
use crate::constants::{EPSILON_0, MU_0};
use crate::sparse::{self, to_c64, SparseOperator};
use crate::types::{flatten_grid, ComplexGrid, GridConfig, GridConfigPatch};
use derivatives::{derivative, Axis};
use pml::Difference;

/// Assemble the material-free operator
/// $M_0 = (D_x^f D_x^b + D_y^f D_y^b)/\mu_0 + \omega^2 \epsilon_0 I$.
pub fn background_operator(config: &GridConfig) -> Result<SparseOperator, SolverError> {
    let dxf = derivative(config, Axis::X, Difference::Forward)?;
    let dxb = derivative(config, Axis::X, Difference::Backward)?;
    let dyf = derivative(config, Axis::Y, Difference::Forward)?;
    let dyb = derivative(config, Axis::Y, Difference::Backward)?;

    let dxx: SparseOperator = dxf.as_ref() * dxb.as_ref();
    let dyy: SparseOperator = dyf.as_ref() * dyb.as_ref();
    let laplacian: SparseOperator = dxx.as_ref() + dyy.as_ref();

    let n = config.num_cells();
    let shift = c64::new(config.omega * config.omega * EPSILON_0, 0.0);
    let mut entries: Vec<(usize, usize, c64)> = sparse::triplets(&laplacian)
        .into_iter()
        .map(|(i, j, v)| (i, j, c64::new(v.re / MU_0, v.im / MU_0)))
        .collect();
    entries.extend((0..n).map(|i| (i, i, shift)));
    sparse::from_triplets(n, n, &entries)
}

/// Diagonal perturbation $\omega^2 \chi$ in flattened order.
pub fn susceptibility_diagonal(config: &GridConfig, chi: &ComplexGrid) -> Vec<c64> {
    let omega_sq = config.omega * config.omega;
    flatten_grid(chi).into_iter().map(|x| to_c64(omega_sq * x)).collect()
}

struct Background {
    config: GridConfig,
    m0: SparseOperator,
}

/// TM FDFD solver with a cached material-free operator.
pub struct TmFdfdSolver {
    settings: GridConfigPatch,
    background: Option<Background>,
    default_current: Option<ComplexGrid>,
    residual_tolerance: f64,
}

impl Default for TmFdfdSolver {
    fn default() -> Self {
        Self {
            settings: GridConfigPatch::default(),
            background: None,
            default_current: None,
            residual_tolerance: super::direct::DEFAULT_RESIDUAL_TOLERANCE,
        }
    }
}

impl TmFdfdSolver {
    /// Create a fully configured solver.
    pub fn new(config: GridConfig) -> Result<Self, SolverError> {
        let mut solver = Self::default();
        solver.configure(&GridConfigPatch::full(&config))?;
        Ok(solver)
    }

    /// Set the current used when [`EmSolver::compute_field`] receives `None`.
    pub fn with_default_current(mut self, current: ComplexGrid) -> Self {
        self.default_current = Some(current);
        self
    }

    /// Override the backward-error bound on sparse solves.
    pub fn with_residual_tolerance(mut self, tolerance: f64) -> Self {
        self.residual_tolerance = tolerance;
        self
    }

    pub fn set_default_current(&mut self, current: Option<ComplexGrid>) {
        self.default_current = current;
    }

    /// The parameters set so far, complete or not.
    pub fn settings(&self) -> &GridConfigPatch {
        &self.settings
    }

    /// Cached $M_0$, if the configuration is complete.
    pub fn background_operator(&self) -> Option<&SparseOperator> {
        self.background.as_ref().map(|b| &b.m0)
    }

    fn require_background(&self) -> Result<&Background, SolverError> {
        self.background.as_ref().ok_or_else(|| SolverError::MissingConfiguration {
            fields: self.settings.missing_fields(),
        })
    }
}

impl EmSolver for TmFdfdSolver {
    fn configure(&mut self, patch: &GridConfigPatch) -> Result<(), SolverError> {
        let mut merged = self.settings;
        merged.merge(patch);

        match merged.resolve() {
            Ok(config) => {
                let unchanged = self.background.as_ref().is_some_and(|b| b.config == config);
                if !unchanged {
                    info!(
                        "building TM operator: {}x{} cells, omega={}, pml=({}, {})",
                        config.nx, config.ny, config.omega, config.npml_x, config.npml_y
                    );
                    self.background = Some(Background {
                        config,
                        m0: background_operator(&config)?,
                    });
                }
                self.settings = merged;
                Ok(())
            }
            Err(SolverError::MissingConfiguration { .. }) => {
                self.settings = merged;
                self.background = None;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn config(&self) -> Result<GridConfig, SolverError> {
        Ok(self.require_background()?.config)
    }

    fn assemble_operator(&self, chi_background: Option<&ComplexGrid>) -> Result<SparseOperator, SolverError> {
        let background = self.require_background()?;
        match chi_background {
            None => Ok(background.m0.clone()),
            Some(chi) => {
                check_shape("background susceptibility", chi.dim(), background.config.shape())?;
                let diagonal = susceptibility_diagonal(&background.config, chi);
                sparse::add_diagonal(&background.m0, &diagonal)
            }
        }
    }

    fn default_current(&self) -> Option<&ComplexGrid> {
        self.default_current.as_ref()
    }

    fn residual_tolerance(&self) -> f64 {
        self.residual_tolerance
    }

    fn method_name(&self) -> &str {
        "Finite-Difference Frequency-Domain (TM)"
    }
}
