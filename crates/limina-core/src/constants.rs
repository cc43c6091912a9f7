//! Physical constants in the natural unit system used throughout Limina.
//!
//! Lengths are measured in units of the grid spacing's physical unit and
//! frequencies in units of `C_0 / length`, so the vacuum constants are unity.

/// Speed of light in vacuum.
pub const C_0: f64 = 1.0;

/// Vacuum permittivity.
pub const EPSILON_0: f64 = 1.0;

/// Vacuum permeability.
pub const MU_0: f64 = 1.0;

/// Impedance of free space, $\eta_0 = \sqrt{\mu_0 / \epsilon_0}$.
pub const ETA_0: f64 = 1.0;
