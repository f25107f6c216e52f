//! Polygon helpers shared by detection and tracking.

use adsurf_models::{Point, Quad};

use crate::error::{MediaError, MediaResult};

/// Whether a closed polygon is convex. Collinear vertices are tolerated.
pub fn is_convex(points: &[Point]) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }
    let mut sign = 0.0f64;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        let c = points[(i + 2) % n];
        let cross = (b.x - a.x) * (c.y - b.y) - (b.y - a.y) * (c.x - b.x);
        if cross.abs() < 1e-12 {
            continue;
        }
        if sign == 0.0 {
            sign = cross.signum();
        } else if cross.signum() != sign {
            return false;
        }
    }
    sign != 0.0
}

/// Centroid from polygon area moments (`m10 / m00`, `m01 / m00`).
pub fn centroid(quad: &Quad) -> MediaResult<Point> {
    let c = &quad.corners;
    let mut m00 = 0.0;
    let mut m10 = 0.0;
    let mut m01 = 0.0;
    for i in 0..4 {
        let p = c[i];
        let q = c[(i + 1) % 4];
        let cross = p.x * q.y - q.x * p.y;
        m00 += cross;
        m10 += (p.x + q.x) * cross;
        m01 += (p.y + q.y) * cross;
    }
    m00 /= 2.0;
    if m00.abs() < f64::EPSILON {
        return Err(MediaError::degenerate(
            "contour centroid undefined for zero-area polygon",
        ));
    }
    Ok(Point::new(m10 / (6.0 * m00), m01 / (6.0 * m00)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_is_convex() {
        assert!(is_convex(&Quad::rect(0.0, 0.0, 6.0, 3.0).corners));
    }

    #[test]
    fn test_concave_detected() {
        let arrow = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 5.0),
            Point::new(0.0, 10.0),
            Point::new(3.0, 5.0),
        ];
        assert!(!is_convex(&arrow));
    }

    #[test]
    fn test_centroid_of_rect() {
        let c = centroid(&Quad::rect(10.0, 20.0, 4.0, 8.0)).unwrap();
        assert!((c.x - 12.0).abs() < 1e-9);
        assert!((c.y - 24.0).abs() < 1e-9);
    }

    #[test]
    fn test_centroid_zero_area_is_degenerate() {
        let flat = Quad::from_tuples([(0.0, 0.0), (5.0, 0.0), (10.0, 0.0), (2.0, 0.0)]);
        assert!(matches!(centroid(&flat), Err(MediaError::Degenerate(_))));
    }
}
