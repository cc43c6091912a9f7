//! Stretched-coordinate perfectly matched layers.
//!
//! Inside a PML of thickness $d_w$ the coordinate along the absorbing axis is
//! stretched by
//!
//! $$
//! s(l) = 1 - \frac{i \sigma(l)}{\omega \epsilon_0}, \qquad
//! \sigma(l) = \sigma_{\max} \left(\frac{l}{d_w}\right)^m, \qquad
//! \sigma_{\max} = -\frac{(m + 1) \ln R}{2 \eta_0 d_w}
//! $$
//!
//! where $l$ is the depth into the layer. Forward and backward differences
//! sample $l$ on grids staggered by half a cell.

use num_complex::Complex64;

use crate::constants::{EPSILON_0, ETA_0};

/// Polynomial grading order of the conductivity profile.
pub const GRADING_ORDER: i32 = 3;

/// Target log-reflectance at normal incidence.
pub const LN_REFLECTANCE: f64 = -30.0;

/// Which staggered difference the stretch factors apply to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difference {
    Forward,
    Backward,
}

fn conductivity(depth: f64, thickness: f64) -> f64 {
    let sigma_max = -f64::from(GRADING_ORDER + 1) * LN_REFLECTANCE / (2.0 * ETA_0 * thickness);
    sigma_max * (depth / thickness).powi(GRADING_ORDER)
}

fn stretch(depth: f64, thickness: f64, omega: f64) -> Complex64 {
    Complex64::new(1.0, -conductivity(depth, thickness) / (omega * EPSILON_0))
}

/// Stretch factors $s_i$ for the `n` cells along one axis.
///
/// Cells outside both layers (and every cell when `npml == 0`) get $s = 1$.
pub fn stretch_factors(
    omega: f64,
    dl: f64,
    n: usize,
    npml: usize,
    difference: Difference,
) -> Vec<Complex64> {
    let mut factors = vec![Complex64::new(1.0, 0.0); n];
    if npml == 0 {
        return factors;
    }

    let thickness = npml as f64 * dl;
    let offset = match difference {
        Difference::Forward => 0.5,
        Difference::Backward => 1.0,
    };

    for (i, s) in factors.iter_mut().enumerate() {
        if i <= npml {
            let depth = dl * (npml as f64 - i as f64 + offset);
            *s = stretch(depth, thickness, omega);
        } else if i > n - npml {
            let depth = dl * ((i - (n - npml)) as f64 - offset);
            *s = stretch(depth, thickness, omega);
        }
    }

    factors
}
