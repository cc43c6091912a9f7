//! # Limina Geometry
//!
//! Geometry handling for Limina grids. This crate provides:
//!
//! - **Parametric primitives** ([`primitives`]): Rectangles, disks, and
//!   ellipses in the plane of the simulation grid.
//! - **Rasterisation** ([`rasterise`]): Converts shapes into boolean design
//!   masks and complex-valued maps (susceptibility, current sources) on an
//!   `nx` by `ny` grid of spacing `dl`.

pub mod primitives;
pub mod rasterise;

pub use primitives::Shape2d;
pub use rasterise::{cell_centre, paint_grid, rasterise_mask, Layer};
