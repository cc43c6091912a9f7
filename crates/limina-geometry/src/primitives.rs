//! Parametric 2D primitives.
//!
//! Coordinates are physical lengths measured from the grid corner, in the
//! same unit as the grid spacing. Primitives deserialise from tagged TOML
//! tables, e.g. `{ type = "Disk", centre = [0.5, 0.5], radius = 0.2 }`.

use serde::{Deserialize, Serialize};

/// A closed region of the grid plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Shape2d {
    Rectangle(Rectangle),
    Disk(Disk),
    Ellipse(Ellipse),
}

/// An axis-aligned rectangle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    pub centre: [f64; 2],
    /// Half-widths along x and y.
    pub half_extents: [f64; 2],
}

/// A disk defined by its centre and radius.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disk {
    pub centre: [f64; 2],
    pub radius: f64,
}

/// An axis-aligned ellipse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ellipse {
    pub centre: [f64; 2],
    /// Semi-axis lengths along x and y.
    pub semi_axes: [f64; 2],
}

impl Shape2d {
    /// Check whether a point lies inside (or on the boundary of) this shape.
    pub fn contains(&self, point: &[f64; 2]) -> bool {
        match self {
            Shape2d::Rectangle(r) => {
                (point[0] - r.centre[0]).abs() <= r.half_extents[0]
                    && (point[1] - r.centre[1]).abs() <= r.half_extents[1]
            }
            Shape2d::Disk(d) => {
                let dx = point[0] - d.centre[0];
                let dy = point[1] - d.centre[1];
                dx * dx + dy * dy <= d.radius * d.radius
            }
            Shape2d::Ellipse(e) => {
                let dx = (point[0] - e.centre[0]) / e.semi_axes[0];
                let dy = (point[1] - e.centre[1]) / e.semi_axes[1];
                dx * dx + dy * dy <= 1.0
            }
        }
    }

    /// Axis-aligned bounding box: returns (min_corner, max_corner).
    pub fn bounding_box(&self) -> ([f64; 2], [f64; 2]) {
        let (centre, half) = match self {
            Shape2d::Rectangle(r) => (r.centre, r.half_extents),
            Shape2d::Disk(d) => (d.centre, [d.radius, d.radius]),
            Shape2d::Ellipse(e) => (e.centre, e.semi_axes),
        };
        (
            [centre[0] - half[0], centre[1] - half[1]],
            [centre[0] + half[0], centre[1] + half[1]],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disk_containment() {
        let disk = Shape2d::Disk(Disk {
            centre: [1.0, 1.0],
            radius: 0.5,
        });
        assert!(disk.contains(&[1.0, 1.4]));
        assert!(!disk.contains(&[1.4, 1.4]));
    }

    #[test]
    fn test_ellipse_bounding_box() {
        let ellipse = Shape2d::Ellipse(Ellipse {
            centre: [2.0, 1.0],
            semi_axes: [0.5, 0.25],
        });
        assert_eq!(ellipse.bounding_box(), ([1.5, 0.75], [2.5, 1.25]));
    }

    #[test]
    fn test_tagged_deserialisation() {
        let shape: Shape2d =
            toml::from_str("type = \"Rectangle\"\ncentre = [0.5, 0.5]\nhalf_extents = [0.1, 0.2]").unwrap();
        assert_eq!(
            shape,
            Shape2d::Rectangle(Rectangle {
                centre: [0.5, 0.5],
                half_extents: [0.1, 0.2],
            })
        );
    }
}
