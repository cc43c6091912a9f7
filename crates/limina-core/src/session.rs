//! Photonics session: the consumer side of the [`EmSolver`] boundary.
//!
//! A session owns a solver together with the problem data that downstream
//! optimization needs: the design mask, the background susceptibility, an
//! optional current source and an optional incident field. It asks the solver
//! for the restricted inverse Green's function and caches the result until
//! the problem data changes.

use log::debug;
use ndarray::{Array2, Zip};
use num_complex::Complex64;
use thiserror::Error;

use crate::partition::DesignPartition;
use crate::solver::{check_shape, EmSolver, SolverError};
use crate::sparse::SparseOperator;
use crate::types::{BoolGrid, ComplexGrid, DesignOperators, GridConfigPatch};

/// Errors raised by a [`PhotonicsSession`].
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("No design mask has been set")]
    MissingMask,

    #[error("No design-material susceptibility has been set")]
    MissingDesignSusceptibility,

    #[error("Unsupported configuration: {0}")]
    UnsupportedConfiguration(String),

    #[error(transparent)]
    Solver(#[from] SolverError),
}

/// Which QCQP formulation the operators are prepared for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QcqpFormulation {
    /// Sparse formulation built on `GaaInv` and `M`.
    #[default]
    Sparse,
    /// Dense formulation; not implemented.
    Dense,
}

#[derive(Debug, Clone)]
enum IncidentField {
    /// Set by the caller; never replaced by a solve.
    Explicit(ComplexGrid),
    /// Memoized solver output; dropped when the problem changes.
    Cached(ComplexGrid),
}

impl IncidentField {
    fn field(&self) -> &ComplexGrid {
        match self {
            IncidentField::Explicit(f) | IncidentField::Cached(f) => f,
        }
    }
}

/// Problem state for inverse design against a swappable Maxwell solver.
pub struct PhotonicsSession<S: EmSolver> {
    solver: S,
    formulation: QcqpFormulation,
    design_mask: Option<BoolGrid>,
    chi_background: Option<ComplexGrid>,
    chi_design: Option<Complex64>,
    current: Option<ComplexGrid>,
    incident: Option<IncidentField>,
    operators: Option<DesignOperators>,
}

impl<S: EmSolver> PhotonicsSession<S> {
    /// Create a session around `solver` using the sparse formulation.
    pub fn new(solver: S) -> Self {
        Self {
            solver,
            formulation: QcqpFormulation::Sparse,
            design_mask: None,
            chi_background: None,
            chi_design: None,
            current: None,
            incident: None,
            operators: None,
        }
    }

    pub fn with_formulation(mut self, formulation: QcqpFormulation) -> Self {
        self.formulation = formulation;
        self
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }

    /// Mutable access to the solver, e.g. to change its default current or
    /// tolerance. Cached operators and any memoized field are dropped.
    pub fn solver_mut(&mut self) -> &mut S {
        self.invalidate();
        &mut self.solver
    }

    pub fn formulation(&self) -> QcqpFormulation {
        self.formulation
    }

    /// Forward a partial grid configuration to the solver.
    pub fn configure(&mut self, patch: &GridConfigPatch) -> Result<(), SessionError> {
        self.solver.configure(patch)?;
        self.invalidate();
        Ok(())
    }

    /// Set the design region. Checked against the grid when it is configured.
    pub fn set_design_mask(&mut self, mask: BoolGrid) -> Result<(), SessionError> {
        self.check_grid_shape("design mask", mask.dim())?;
        self.design_mask = Some(mask);
        self.invalidate();
        Ok(())
    }

    /// Set (or clear) the background susceptibility $\chi_b$.
    pub fn set_background_susceptibility(&mut self, chi: Option<ComplexGrid>) -> Result<(), SessionError> {
        if let Some(chi) = &chi {
            self.check_grid_shape("background susceptibility", chi.dim())?;
        }
        self.chi_background = chi;
        self.invalidate();
        Ok(())
    }

    /// Set (or clear) the susceptibility of the design material.
    pub fn set_design_susceptibility(&mut self, chi: Option<Complex64>) {
        self.chi_design = chi;
    }

    /// Set (or clear) the stored current source.
    pub fn set_current(&mut self, current: Option<ComplexGrid>) -> Result<(), SessionError> {
        if let Some(j) = &current {
            self.check_grid_shape("current", j.dim())?;
        }
        self.current = current;
        self.drop_cached_field();
        Ok(())
    }

    pub fn design_mask(&self) -> Option<&BoolGrid> {
        self.design_mask.as_ref()
    }

    pub fn background_susceptibility(&self) -> Option<&ComplexGrid> {
        self.chi_background.as_ref()
    }

    pub fn design_susceptibility(&self) -> Option<Complex64> {
        self.chi_design
    }

    pub fn current(&self) -> Option<&ComplexGrid> {
        self.current.as_ref()
    }

    /// Design/background split of the current mask.
    pub fn design_partition(&self) -> Option<DesignPartition> {
        self.design_mask.as_ref().map(DesignPartition::from_mask)
    }

    /// Compute and store `(GaaInv, M)` for the current mask and background.
    pub fn build_operators(&mut self) -> Result<&DesignOperators, SessionError> {
        if self.formulation == QcqpFormulation::Dense {
            return Err(SessionError::UnsupportedConfiguration(
                "dense QCQP formulation is not implemented; use the sparse formulation".into(),
            ));
        }
        let mask = self.design_mask.as_ref().ok_or(SessionError::MissingMask)?;

        debug!("building design operators with {}", self.solver.method_name());
        let operators = self
            .solver
            .compute_gaa_inverse(mask, self.chi_background.as_ref())?;
        Ok(&*self.operators.insert(operators))
    }

    pub fn operators(&self) -> Option<&DesignOperators> {
        self.operators.as_ref()
    }

    /// Cached restricted inverse Green's function.
    pub fn gaa_inverse(&self) -> Option<&Array2<Complex64>> {
        self.operators.as_ref().map(|ops| &ops.gaa_inv)
    }

    /// Cached full Maxwell operator.
    pub fn operator(&self) -> Option<&SparseOperator> {
        self.operators.as_ref().map(|ops| &ops.operator)
    }

    /// The incident field.
    ///
    /// An explicitly set field is returned unchanged. Otherwise a memoized
    /// field is returned if present, else the solver computes one from
    /// `current`, falling back to the stored current and then the solver's
    /// default. With `cache` the computed field is memoized.
    pub fn get_incident_field(
        &mut self,
        current: Option<&ComplexGrid>,
        cache: bool,
    ) -> Result<ComplexGrid, SessionError> {
        if let Some(incident) = &self.incident {
            return Ok(incident.field().clone());
        }

        let current = current.or(self.current.as_ref());
        let field = self
            .solver
            .compute_field(current, self.chi_background.as_ref())?;
        if cache {
            self.incident = Some(IncidentField::Cached(field.clone()));
        }
        Ok(field)
    }

    /// Override the incident field; it persists until [`Self::clear_incident_field`].
    pub fn set_field(&mut self, field: ComplexGrid) -> Result<(), SessionError> {
        self.check_grid_shape("incident field", field.dim())?;
        self.incident = Some(IncidentField::Explicit(field));
        Ok(())
    }

    /// Forget any explicit or memoized incident field.
    pub fn clear_incident_field(&mut self) {
        self.incident = None;
    }

    /// Whether an incident field is held (explicit or memoized).
    pub fn has_incident_field(&self) -> bool {
        self.incident.is_some()
    }

    /// Total field of a structure with design density `density`.
    ///
    /// Design cells get susceptibility $\chi_b + \rho \chi$; background cells
    /// keep $\chi_b$. Solved with the stored current or the solver default.
    pub fn structure_field(&self, density: &Array2<f64>) -> Result<ComplexGrid, SessionError> {
        let mask = self.design_mask.as_ref().ok_or(SessionError::MissingMask)?;
        let chi = self.chi_design.ok_or(SessionError::MissingDesignSusceptibility)?;
        check_shape("design density", density.dim(), mask.dim())?;

        let mut chi_total = self
            .chi_background
            .clone()
            .unwrap_or_else(|| Array2::zeros(mask.dim()));
        Zip::from(&mut chi_total)
            .and(mask)
            .and(density)
            .for_each(|total, &is_design, &rho| {
                if is_design {
                    *total += rho * chi;
                }
            });

        Ok(self.solver.compute_field(self.current.as_ref(), Some(&chi_total))?)
    }

    fn check_grid_shape(&self, what: &'static str, found: (usize, usize)) -> Result<(), SessionError> {
        if let Ok(config) = self.solver.config() {
            check_shape(what, found, config.shape())?;
        }
        Ok(())
    }

    fn drop_cached_field(&mut self) {
        if matches!(self.incident, Some(IncidentField::Cached(_))) {
            self.incident = None;
        }
    }

    fn invalidate(&mut self) {
        self.operators = None;
        self.drop_cached_field();
    }
}
