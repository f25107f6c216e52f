//! Pipeline metrics.
//!
//! Recorded through the `metrics` facade; the API binary installs the
//! Prometheus recorder, the CLI leaves them as no-ops.

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const FRAMES_SCANNED_TOTAL: &str = "adsurf_frames_scanned_total";
    pub const DETECTIONS_TOTAL: &str = "adsurf_detections_total";
    pub const STABLE_CONTOURS_TOTAL: &str = "adsurf_stable_contours_total";
    pub const FRAMES_COMPOSITED_TOTAL: &str = "adsurf_frames_composited_total";
    pub const PHASE_DURATION_SECONDS: &str = "adsurf_phase_duration_seconds";
    pub const PHASE_FAILURES_TOTAL: &str = "adsurf_phase_failures_total";
}

pub fn record_frame_scanned(detections: usize) {
    counter!(names::FRAMES_SCANNED_TOTAL).increment(1);
    counter!(names::DETECTIONS_TOTAL).increment(detections as u64);
}

pub fn record_stable_contours(count: usize) {
    counter!(names::STABLE_CONTOURS_TOTAL).increment(count as u64);
}

pub fn record_frame_composited() {
    counter!(names::FRAMES_COMPOSITED_TOTAL).increment(1);
}

/// Record the wall time of one phase with its outcome.
pub fn record_phase_duration(phase: &str, status: &str, duration_secs: f64) {
    let labels = [("phase", phase.to_string()), ("status", status.to_string())];
    histogram!(names::PHASE_DURATION_SECONDS, &labels).record(duration_secs);
}

pub fn record_phase_failure(phase: &str) {
    let labels = [("phase", phase.to_string())];
    counter!(names::PHASE_FAILURES_TOTAL, &labels).increment(1);
}
