//! Single-frame quadrilateral surface detection.
//!
//! grayscale → Gaussian blur → Otsu threshold → external contours →
//! area filter → Douglas–Peucker → convex + vertex-count filter.

use adsurf_models::{Point, Quad, TuningConfig};
use image::{GrayImage, RgbImage};
use imageproc::contours::{find_contours, BorderType};
use imageproc::contrast::{otsu_level, threshold, ThresholdType};
use imageproc::filter::gaussian_blur_f32;
use imageproc::geometry::{approximate_polygon_dp, arc_length, contour_area};
use tracing::trace;

use super::geometry::is_convex;

/// Thresholds used by [`SurfaceDetector`].
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorParams {
    pub kernel: u32,
    pub min_area: f64,
    pub max_area: f64,
    pub corners_count: usize,
    pub perimeter_threshold: f64,
}

impl From<&TuningConfig> for DetectorParams {
    fn from(cfg: &TuningConfig) -> Self {
        Self {
            kernel: cfg.kernel,
            min_area: cfg.min_area_threshold,
            max_area: cfg.max_area_threshold,
            corners_count: cfg.corners_count,
            perimeter_threshold: cfg.perimeter_threshold,
        }
    }
}

/// Gaussian sigma implied by a kernel size when no sigma is given.
pub fn sigma_for_kernel(kernel: u32) -> f32 {
    0.3 * ((kernel as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

#[derive(Debug, Clone)]
pub struct SurfaceDetector {
    params: DetectorParams,
}

impl SurfaceDetector {
    pub fn new(params: DetectorParams) -> Self {
        Self { params }
    }

    pub fn from_tuning(cfg: &TuningConfig) -> Self {
        Self::new(DetectorParams::from(cfg))
    }

    /// Quadrilateral candidates of one frame, largest area first.
    pub fn detect(&self, frame: &RgbImage) -> Vec<Quad> {
        let gray = image::imageops::grayscale(frame);
        self.detect_gray(&gray)
    }

    pub fn detect_gray(&self, gray: &GrayImage) -> Vec<Quad> {
        let p = &self.params;
        let blurred = gaussian_blur_f32(gray, sigma_for_kernel(p.kernel).max(0.1));
        let level = otsu_level(&blurred);
        let binary = threshold(&blurred, level, ThresholdType::Binary);

        let mut candidates: Vec<(f64, Quad)> = find_contours::<i32>(&binary)
            .into_iter()
            .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
            .filter_map(|contour| {
                let outline = &contour.points;
                if outline.len() < 3 {
                    return None;
                }

                let area = contour_area(outline);
                if area < p.min_area || area > p.max_area {
                    return None;
                }

                let epsilon = p.perimeter_threshold * arc_length(outline, true);
                if epsilon <= 0.0 {
                    return None;
                }
                let poly: Vec<Point> = approximate_polygon_dp(outline, epsilon, true)
                    .into_iter()
                    .map(|pt| Point::new(pt.x as f64, pt.y as f64))
                    .collect();
                if poly.len() != p.corners_count || poly.len() != 4 || !is_convex(&poly) {
                    return None;
                }

                let quad = Quad::new([poly[0], poly[1], poly[2], poly[3]]);
                let quad_area = quad.area();
                (quad_area >= p.min_area && quad_area <= p.max_area).then_some((quad_area, quad))
            })
            .collect();

        candidates.sort_by(|a, b| b.0.total_cmp(&a.0));
        trace!(level, candidates = candidates.len(), "Frame scanned");
        candidates.into_iter().map(|(_, q)| q).collect()
    }
}
