//! Planar geometry primitives.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A point in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// A quadrilateral given by exactly four corners.
///
/// The corner order is whatever the producer emitted until the quad has been
/// canonicalized to (top-left, bottom-left, bottom-right, top-right).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Quad {
    pub corners: [Point; 4],
}

impl Quad {
    pub fn new(corners: [Point; 4]) -> Self {
        Self { corners }
    }

    /// Build a quad from four `(x, y)` tuples.
    pub fn from_tuples(pts: [(f64, f64); 4]) -> Self {
        Self {
            corners: pts.map(|(x, y)| Point::new(x, y)),
        }
    }

    /// Axis-aligned rectangle with top-left `(x, y)` listed clockwise.
    pub fn rect(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::from_tuples([
            (x, y),
            (x + width, y),
            (x + width, y + height),
            (x, y + height),
        ])
    }

    /// Signed shoelace area. Positive for counter-clockwise order in a
    /// y-up frame, which is clockwise on screen.
    pub fn signed_area(&self) -> f64 {
        let c = &self.corners;
        let mut acc = 0.0;
        for i in 0..4 {
            let j = (i + 1) % 4;
            acc += c[i].x * c[j].y - c[j].x * c[i].y;
        }
        acc / 2.0
    }

    /// Unsigned enclosed area.
    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    /// Corner coordinates flattened as `[x1, y1, ..., x4, y4]`.
    pub fn to_flat(&self) -> [f64; 8] {
        let c = &self.corners;
        [
            c[0].x, c[0].y, c[1].x, c[1].y, c[2].x, c[2].y, c[3].x, c[3].y,
        ]
    }

    /// Inverse of [`Quad::to_flat`].
    pub fn from_flat(v: [f64; 8]) -> Self {
        Self::from_tuples([(v[0], v[1]), (v[2], v[3]), (v[4], v[5]), (v[6], v[7])])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_area() {
        let q = Quad::rect(10.0, 20.0, 30.0, 40.0);
        assert!((q.area() - 1200.0).abs() < 1e-9);
    }

    #[test]
    fn test_flat_conversion() {
        let q = Quad::rect(1.0, 2.0, 3.0, 4.0);
        assert_eq!(Quad::from_flat(q.to_flat()), q);
    }

    #[test]
    fn test_degenerate_area_is_zero() {
        let q = Quad::from_tuples([(0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (3.0, 3.0)]);
        assert_eq!(q.area(), 0.0);
    }
}
