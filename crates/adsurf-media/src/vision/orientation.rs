//! Canonical corner ordering: top-left, bottom-left, bottom-right, top-right.

use adsurf_models::{DetectionRecord, Point, Quad, StableContour};

fn by_x_then_y(a: &Point, b: &Point) -> std::cmp::Ordering {
    a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y))
}

/// Reorder the corners of `quad` into (TL, BL, BR, TR).
///
/// The two smallest-x corners form the left pair, the rest the right pair;
/// within a pair the smaller y is on top.
pub fn canonicalize(quad: &Quad) -> Quad {
    let mut pts = quad.corners;
    pts.sort_by(by_x_then_y);

    let (tl, bl) = if pts[0].y <= pts[1].y {
        (pts[0], pts[1])
    } else {
        (pts[1], pts[0])
    };
    let (tr, br) = if pts[2].y <= pts[3].y {
        (pts[2], pts[3])
    } else {
        (pts[3], pts[2])
    };

    Quad::new([tl, bl, br, tr])
}

/// Canonicalize every record of every contour in place.
pub fn normalize_contours(contours: &mut [StableContour]) {
    for contour in contours {
        for DetectionRecord { quad, .. } in contour.records.iter_mut() {
            *quad = canonicalize(quad);
        }
    }
}
