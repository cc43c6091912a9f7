//! Core types shared across the Limina framework.
//!
//! Grids are stored as `(nx, ny)` arrays and flattened row-major, so the cell
//! `(ix, iy)` maps to the linear index `ix * ny + iy`. Every operator, mask,
//! susceptibility map, current and field in the crate uses this ordering.

use ndarray::Array2;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::constants::{C_0, MU_0};
use crate::solver::SolverError;
use crate::sparse::SparseOperator;

/// Complex-valued quantity sampled on the grid (susceptibility, current, field).
pub type ComplexGrid = Array2<Complex64>;

/// Boolean mask over the grid.
pub type BoolGrid = Array2<bool>;

/// Names of the grid parameters, in the order they are reported when missing.
pub const GRID_FIELDS: [&str; 8] = [
    "omega", "nx", "ny", "npml_x", "npml_y", "dl", "bloch_x", "bloch_y",
];

/// A complete, validated grid configuration.
///
/// Fully determines the unperturbed Maxwell operator of a solver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    /// Angular frequency.
    pub omega: f64,
    /// Number of cells along x.
    pub nx: usize,
    /// Number of cells along y.
    pub ny: usize,
    /// PML depth (cells) at each x boundary.
    pub npml_x: usize,
    /// PML depth (cells) at each y boundary.
    pub npml_y: usize,
    /// Grid spacing.
    pub dl: f64,
    /// Bloch phase accumulated across the x period (radians).
    pub bloch_x: f64,
    /// Bloch phase accumulated across the y period (radians).
    pub bloch_y: f64,
}

impl GridConfig {
    /// Grid shape `(nx, ny)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.nx, self.ny)
    }

    /// Number of unknowns, one per cell.
    pub fn num_cells(&self) -> usize {
        self.nx * self.ny
    }

    /// Vacuum wavenumber $k = \omega / c_0$.
    pub fn wavenumber(&self) -> f64 {
        self.omega / C_0
    }

    /// Prefactor $\mu_0 / k^2$ applied to the restricted inverse.
    pub fn greens_prefactor(&self) -> f64 {
        let k = self.wavenumber();
        MU_0 / (k * k)
    }

    fn validate(&self) -> Result<(), SolverError> {
        if !(self.omega.is_finite() && self.omega > 0.0) {
            return Err(SolverError::InvalidConfiguration(format!(
                "omega must be positive and finite, got {}",
                self.omega
            )));
        }
        if self.nx == 0 || self.ny == 0 {
            return Err(SolverError::InvalidConfiguration(format!(
                "grid must have at least one cell per axis, got {}x{}",
                self.nx, self.ny
            )));
        }
        if !(self.dl.is_finite() && self.dl > 0.0) {
            return Err(SolverError::InvalidConfiguration(format!(
                "dl must be positive and finite, got {}",
                self.dl
            )));
        }
        if !(self.bloch_x.is_finite() && self.bloch_y.is_finite()) {
            return Err(SolverError::InvalidConfiguration(
                "Bloch phases must be finite".into(),
            ));
        }
        for (axis, npml, n) in [("x", self.npml_x, self.nx), ("y", self.npml_y, self.ny)] {
            if npml > 0 && 2 * npml >= n {
                return Err(SolverError::InvalidConfiguration(format!(
                    "PML depth {npml} along {axis} leaves no interior in {n} cells"
                )));
            }
        }
        Ok(())
    }
}

/// Partial grid configuration: only the `Some` fields are applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GridConfigPatch {
    pub omega: Option<f64>,
    pub nx: Option<usize>,
    pub ny: Option<usize>,
    pub npml_x: Option<usize>,
    pub npml_y: Option<usize>,
    pub dl: Option<f64>,
    pub bloch_x: Option<f64>,
    pub bloch_y: Option<f64>,
}

impl GridConfigPatch {
    /// A patch that sets every field.
    pub fn full(config: &GridConfig) -> Self {
        Self {
            omega: Some(config.omega),
            nx: Some(config.nx),
            ny: Some(config.ny),
            npml_x: Some(config.npml_x),
            npml_y: Some(config.npml_y),
            dl: Some(config.dl),
            bloch_x: Some(config.bloch_x),
            bloch_y: Some(config.bloch_y),
        }
    }

    /// Overwrite the fields of `self` with those present in `other`.
    pub fn merge(&mut self, other: &GridConfigPatch) {
        self.omega = other.omega.or(self.omega);
        self.nx = other.nx.or(self.nx);
        self.ny = other.ny.or(self.ny);
        self.npml_x = other.npml_x.or(self.npml_x);
        self.npml_y = other.npml_y.or(self.npml_y);
        self.dl = other.dl.or(self.dl);
        self.bloch_x = other.bloch_x.or(self.bloch_x);
        self.bloch_y = other.bloch_y.or(self.bloch_y);
    }

    /// Names of the fields that are still unset, in canonical order.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let present = [
            self.omega.is_some(),
            self.nx.is_some(),
            self.ny.is_some(),
            self.npml_x.is_some(),
            self.npml_y.is_some(),
            self.dl.is_some(),
            self.bloch_x.is_some(),
            self.bloch_y.is_some(),
        ];
        GRID_FIELDS
            .iter()
            .zip(present)
            .filter(|(_, set)| !set)
            .map(|(name, _)| *name)
            .collect()
    }

    /// Resolve into a complete configuration.
    ///
    /// Fails with [`SolverError::MissingConfiguration`] naming every absent
    /// field, or [`SolverError::InvalidConfiguration`] if a value is out of range.
    pub fn resolve(&self) -> Result<GridConfig, SolverError> {
        match (
            self.omega,
            self.nx,
            self.ny,
            self.npml_x,
            self.npml_y,
            self.dl,
            self.bloch_x,
            self.bloch_y,
        ) {
            (
                Some(omega),
                Some(nx),
                Some(ny),
                Some(npml_x),
                Some(npml_y),
                Some(dl),
                Some(bloch_x),
                Some(bloch_y),
            ) => {
                let config = GridConfig {
                    omega,
                    nx,
                    ny,
                    npml_x,
                    npml_y,
                    dl,
                    bloch_x,
                    bloch_y,
                };
                config.validate()?;
                Ok(config)
            }
            _ => Err(SolverError::MissingConfiguration {
                fields: self.missing_fields(),
            }),
        }
    }
}

impl From<GridConfig> for GridConfigPatch {
    fn from(config: GridConfig) -> Self {
        Self::full(&config)
    }
}

/// The operators a solver produces for one design mask and background.
#[derive(Debug, Clone)]
pub struct DesignOperators {
    /// Inverse Green's function restricted to the design cells, shape `(|A|, |A|)`.
    pub gaa_inv: Array2<Complex64>,
    /// The full assembled Maxwell operator, shape `(nx * ny, nx * ny)`.
    pub operator: SparseOperator,
}

/// Flatten a grid row-major into a vector of linear-index order.
pub fn flatten_grid<T: Clone>(grid: &Array2<T>) -> Vec<T> {
    grid.iter().cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> GridConfig {
        GridConfig {
            omega: 2.0 * std::f64::consts::PI,
            nx: 20,
            ny: 10,
            npml_x: 4,
            npml_y: 0,
            dl: 0.05,
            bloch_x: 0.0,
            bloch_y: 0.3,
        }
    }

    #[test]
    fn test_empty_patch_lists_every_field() {
        let err = GridConfigPatch::default().resolve().unwrap_err();
        match err {
            SolverError::MissingConfiguration { fields } => assert_eq!(fields, GRID_FIELDS.to_vec()),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_merge_keeps_unspecified_fields() {
        let mut patch = GridConfigPatch::full(&sample());
        patch.merge(&GridConfigPatch {
            nx: Some(30),
            ..Default::default()
        });
        let config = patch.resolve().unwrap();
        assert_eq!(config.nx, 30);
        assert_eq!(config.ny, 10);
        assert_eq!(config.bloch_y, 0.3);
    }

    #[test]
    fn test_partial_patch_reports_only_missing() {
        let patch = GridConfigPatch {
            omega: Some(1.0),
            nx: Some(4),
            ny: Some(4),
            dl: Some(0.1),
            ..Default::default()
        };
        match patch.resolve() {
            Err(SolverError::MissingConfiguration { fields }) => {
                assert_eq!(fields, vec!["npml_x", "npml_y", "bloch_x", "bloch_y"]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_oversized_pml_rejected() {
        let mut config = sample();
        config.npml_y = 5;
        let err = GridConfigPatch::full(&config).resolve().unwrap_err();
        assert!(matches!(err, SolverError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_greens_prefactor() {
        let config = sample();
        let k = config.omega;
        assert!((config.greens_prefactor() - 1.0 / (k * k)).abs() < 1e-15);
    }

    #[test]
    fn test_flatten_is_row_major() {
        let grid = Array2::from_shape_fn((2, 3), |(i, j)| 10 * i + j);
        assert_eq!(flatten_grid(&grid), vec![0, 1, 2, 10, 11, 12]);
    }
}
