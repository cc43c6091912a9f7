//! Rasterisation of shapes onto the simulation grid.
//!
//! Cell `(ix, iy)` is sampled at its centre `((ix + 0.5) dl, (iy + 0.5) dl)`;
//! a cell belongs to a shape when its centre does.

use ndarray::Array2;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::primitives::Shape2d;

/// A shape carrying a complex value, painted onto a grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub shape: Shape2d,
    pub value: Complex64,
}

/// Physical position of the centre of cell `(ix, iy)`.
pub fn cell_centre(ix: usize, iy: usize, dl: f64) -> [f64; 2] {
    [(ix as f64 + 0.5) * dl, (iy as f64 + 0.5) * dl]
}

/// Range of cell indices whose centres may fall in `[min, max]`.
fn cell_range(min: f64, max: f64, n: usize, dl: f64) -> std::ops::Range<usize> {
    let lo = ((min / dl - 0.5).floor().max(0.0)) as usize;
    let hi = ((max / dl - 0.5).ceil() + 1.0).clamp(0.0, n as f64) as usize;
    lo.min(n)..hi
}

fn for_each_cell_in(shape: &Shape2d, nx: usize, ny: usize, dl: f64, mut f: impl FnMut(usize, usize)) {
    let (min, max) = shape.bounding_box();
    for ix in cell_range(min[0], max[0], nx, dl) {
        for iy in cell_range(min[1], max[1], ny, dl) {
            if shape.contains(&cell_centre(ix, iy, dl)) {
                f(ix, iy);
            }
        }
    }
}

/// Union of `shapes` as a boolean `(nx, ny)` mask.
///
/// # Panics
/// Panics if `dl` is not positive.
pub fn rasterise_mask(shapes: &[Shape2d], nx: usize, ny: usize, dl: f64) -> Array2<bool> {
    assert!(dl > 0.0, "Grid spacing must be positive");
    let mut mask = Array2::from_elem((nx, ny), false);
    for shape in shapes {
        for_each_cell_in(shape, nx, ny, dl, |ix, iy| mask[[ix, iy]] = true);
    }
    mask
}

/// Paint `layers` in order onto a zero `(nx, ny)` grid; later layers overwrite earlier ones.
///
/// # Panics
/// Panics if `dl` is not positive.
pub fn paint_grid(layers: &[Layer], nx: usize, ny: usize, dl: f64) -> Array2<Complex64> {
    assert!(dl > 0.0, "Grid spacing must be positive");
    let mut grid = Array2::<Complex64>::zeros((nx, ny));
    for layer in layers {
        for_each_cell_in(&layer.shape, nx, ny, dl, |ix, iy| grid[[ix, iy]] = layer.value);
    }
    grid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{Disk, Rectangle};
    use approx::assert_relative_eq;

    #[test]
    fn test_cell_centre() {
        let [x, y] = cell_centre(3, 7, 0.2);
        assert_relative_eq!(x, 0.7, epsilon = 1e-12);
        assert_relative_eq!(y, 1.5, epsilon = 1e-12);
    }

    #[test]
    fn test_rectangle_cell_count() {
        let rect = Shape2d::Rectangle(Rectangle {
            centre: [1.0, 0.5],
            half_extents: [0.3, 0.2],
        });
        let mask = rasterise_mask(&[rect], 20, 10, 0.1);
        // Centres at 0.75..=1.25 along x (6 cells) and 0.35..=0.65 along y (4 cells)
        assert_eq!(mask.iter().filter(|&&m| m).count(), 24);
        assert!(mask[[7, 3]]);
        assert!(!mask[[6, 3]]);
    }

    #[test]
    fn test_all_cells_inside_disk() {
        let disk = Shape2d::Disk(Disk {
            centre: [0.8, 0.8],
            radius: 0.45,
        });
        let mask = rasterise_mask(&[disk.clone()], 16, 16, 0.1);
        let mut count = 0;
        for ((ix, iy), &inside) in mask.indexed_iter() {
            assert_eq!(inside, disk.contains(&cell_centre(ix, iy, 0.1)));
            count += usize::from(inside);
        }
        // Area pi r^2 / dl^2 ~ 64 cells
        assert!((50..80).contains(&count), "unexpected cell count {count}");
    }

    #[test]
    fn test_shapes_clipped_to_grid() {
        let rect = Shape2d::Rectangle(Rectangle {
            centre: [0.0, 0.0],
            half_extents: [5.0, 5.0],
        });
        let mask = rasterise_mask(&[rect], 4, 3, 1.0);
        assert!(mask.iter().all(|&m| m));
    }

    #[test]
    fn test_later_layers_overwrite() {
        let big = Layer {
            shape: Shape2d::Rectangle(Rectangle {
                centre: [0.5, 0.5],
                half_extents: [0.5, 0.5],
            }),
            value: Complex64::new(1.0, 0.0),
        };
        let small = Layer {
            shape: Shape2d::Disk(Disk {
                centre: [0.55, 0.55],
                radius: 0.01,
            }),
            value: Complex64::new(0.0, 2.0),
        };
        let grid = paint_grid(&[big, small], 10, 10, 0.1);
        assert_eq!(grid[[5, 5]], Complex64::new(0.0, 2.0));
        assert_eq!(grid[[0, 9]], Complex64::new(1.0, 0.0));
    }
}
