//! # Limina Core
//!
//! Restricted inverse Green's functions for 2D frequency-domain Maxwell
//! solvers, the operator that design-limit and inverse-design formulations
//! are built on.
//!
//! ## Architecture
//!
//! Solvers implement the [`solver::EmSolver`] trait: they own a grid
//! configuration and assemble the Maxwell operator $M$. On top of that the
//! trait provides the design-restricted inverse
//! $G_{AA}^{-1} = \frac{\mu_0}{k^2}(D_{dd} - C_{db} A_{bb}^{-1} B_{bd})$ and
//! full-grid field solves. A [`session::PhotonicsSession`] is generic over the
//! solver, so any conforming implementation can be dropped in.
//!
//! ## Modules
//!
//! - [`types`]: Grid configuration, partial updates, and result containers.
//! - [`sparse`]: Complex sparse operators on top of `faer`.
//! - [`partition`]: Design/background index split and block slicing.
//! - [`solver`]: Solver trait, sparse direct solves, Schur complement, TM FDFD.
//! - [`session`]: Problem state and operator caching.
//! - [`constants`]: Vacuum constants (natural units).

pub mod constants;
pub mod partition;
pub mod session;
pub mod solver;
pub mod sparse;
pub mod types;

pub use session::{PhotonicsSession, QcqpFormulation, SessionError};
pub use solver::fdfd::TmFdfdSolver;
pub use solver::{EmSolver, SolverError};
pub use types::{BoolGrid, ComplexGrid, DesignOperators, GridConfig, GridConfigPatch};
