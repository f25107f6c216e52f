//! Temporal stability tracking over a detection log.

use adsurf_models::{
    DetectionLog, DetectionRecord, Field, Point, Quad, StableContour, TuningConfig,
};
use rayon::prelude::*;
use tracing::debug;

use super::geometry::centroid;
use crate::error::MediaResult;

#[derive(Debug, Clone, PartialEq)]
pub struct TrackerParams {
    /// Gaps longer than this many frames split fields
    pub field_threshold: u64,
    /// Minimum contour duration in seconds
    pub contour_threshold: f64,
    /// Maximum centroid step between consecutive frames, in pixels
    pub dst_threshold: f64,
}

impl From<&TuningConfig> for TrackerParams {
    fn from(cfg: &TuningConfig) -> Self {
        Self {
            field_threshold: cfg.field_threshold,
            contour_threshold: cfg.contour_threshold,
            dst_threshold: cfg.dst_threshold,
        }
    }
}

/// Split the detected frames into fields separated by gaps longer than
/// `field_threshold`.
pub fn segment_fields(log: &DetectionLog, field_threshold: u64) -> Vec<Field> {
    let frames = log.detected_frames();
    let Some((&first, rest)) = frames.split_first() else {
        return Vec::new();
    };

    let mut fields = Vec::new();
    let mut start = first;
    let mut prev = first;
    for &frame in rest {
        let gap = frame - prev - 1;
        if gap > field_threshold {
            fields.push(Field::new(start, prev));
            start = frame;
        }
        prev = frame;
    }
    fields.push(Field::new(start, prev));
    fields
}

/// Moments centroid truncated to whole pixels.
fn pixel_centroid(quad: &Quad) -> MediaResult<Point> {
    let c = centroid(quad)?;
    Ok(Point::new(c.x.trunc(), c.y.trunc()))
}

/// Chain records whose pixel centroid stays within `dst_threshold` of the previous
/// accepted record on the immediately following frame.
///
/// A rejected record does not move the anchor, so later frames can no longer
/// satisfy the `anchor + 1` rule and the run ends there.
pub fn chain_field(records: &[DetectionRecord], dst_threshold: f64) -> MediaResult<Vec<DetectionRecord>> {
    let Some((&seed, rest)) = records.split_first() else {
        return Ok(Vec::new());
    };

    let mut anchor = seed;
    let mut anchor_centroid = pixel_centroid(&anchor.quad)?;
    let mut accepted = vec![seed];

    for rec in rest {
        if rec.frame_index != anchor.frame_index + 1 {
            continue;
        }
        let c = pixel_centroid(&rec.quad)?;
        if c.distance(&anchor_centroid) < dst_threshold {
            accepted.push(*rec);
            anchor = *rec;
            anchor_centroid = c;
        }
    }
    Ok(accepted)
}

#[derive(Debug, Clone)]
pub struct StabilityTracker {
    params: TrackerParams,
}

impl StabilityTracker {
    pub fn new(params: TrackerParams) -> Self {
        Self { params }
    }

    pub fn from_tuning(cfg: &TuningConfig) -> Self {
        Self::new(TrackerParams::from(cfg))
    }

    /// Stable contours of `log`, one at most per field, in field order.
    pub fn track(&self, log: &DetectionLog, fps: f64) -> MediaResult<Vec<StableContour>> {
        let fields = segment_fields(log, self.params.field_threshold);
        let min_len = fps * self.params.contour_threshold;
        let dst = self.params.dst_threshold;

        let per_field: Vec<Option<StableContour>> = fields
            .par_iter()
            .map(|field| -> MediaResult<Option<StableContour>> {
                let records: Vec<DetectionRecord> = log
                    .records_in(field.start_frame, field.end_frame)
                    .copied()
                    .collect();
                let accepted = chain_field(&records, dst)?;
                let keep = accepted.len() as f64 >= min_len;
                debug!(
                    start = field.start_frame,
                    end = field.end_frame,
                    accepted = accepted.len(),
                    keep,
                    "Field chained"
                );
                Ok(keep.then(|| StableContour::new(*field, accepted)))
            })
            .collect::<MediaResult<_>>()?;

        Ok(per_field.into_iter().flatten().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MediaError;

    fn params() -> TrackerParams {
        TrackerParams {
            field_threshold: 5,
            contour_threshold: 1.0,
            dst_threshold: 5.0,
        }
    }

    fn log_with(frames_count: u64, detections: impl Fn(u64) -> Vec<Quad>) -> DetectionLog {
        let mut log = DetectionLog::new();
        for i in 0..frames_count {
            log.push_frame(i, detections(i));
        }
        log
    }

    #[test]
    fn test_fixed_quad_yields_single_contour() {
        let quad = Quad::rect(100.0, 100.0, 60.0, 40.0);
        let log = log_with(100, |i| if (10..=90).contains(&i) { vec![quad] } else { vec![] });

        let contours = StabilityTracker::new(params()).track(&log, 30.0).unwrap();
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].first_frame(), Some(10));
        assert_eq!(contours[0].last_frame(), Some(90));
        assert_eq!(contours[0].len(), 81);
    }

    #[test]
    fn test_centroid_jump_truncates_contour() {
        let log = log_with(100, |i| {
            if !(10..=90).contains(&i) {
                return vec![];
            }
            let x = if i >= 50 { 140.0 } else { 100.0 };
            vec![Quad::rect(x, 100.0, 60.0, 40.0)]
        });

        let contours = StabilityTracker::new(params()).track(&log, 30.0).unwrap();
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].last_frame(), Some(49));
    }

    #[test]
    fn test_step_is_measured_between_whole_pixel_centroids() {
        // Exact centroids 12.9 -> 17.0 are 4.1 apart; truncated 12 -> 17 are 5.
        let records = [
            DetectionRecord::new(0, Quad::rect(10.9, 0.0, 4.0, 4.0)),
            DetectionRecord::new(1, Quad::rect(15.0, 0.0, 4.0, 4.0)),
        ];
        assert_eq!(chain_field(&records, 5.0).unwrap().len(), 1);

        // Exact 12.0 -> 16.9 is 4.9 apart; truncated 12 -> 16 is 4.
        let records = [
            DetectionRecord::new(0, Quad::rect(10.0, 0.0, 4.0, 4.0)),
            DetectionRecord::new(1, Quad::rect(14.9, 0.0, 4.0, 4.0)),
        ];
        assert_eq!(chain_field(&records, 5.0).unwrap().len(), 2);
    }

    #[test]
    fn test_empty_log_yields_no_contours() {
        let log = log_with(100, |_| vec![]);
        assert!(segment_fields(&log, 5).is_empty());
        assert!(StabilityTracker::new(params()).track(&log, 30.0).unwrap().is_empty());
    }

    #[test]
    fn test_field_segmentation_absorbs_short_gaps() {
        // detections 0..=9, gap of 5 (absorbed), 15..=19, gap of 6 (split), 26..=30
        let log = log_with(40, |i| {
            let on = i <= 9 || (15..=19).contains(&i) || (26..=30).contains(&i);
            if on { vec![Quad::rect(0.0, 0.0, 10.0, 10.0)] } else { vec![] }
        });
        let fields = segment_fields(&log, 5);
        assert_eq!(fields, vec![Field::new(0, 19), Field::new(26, 30)]);
        for pair in fields.windows(2) {
            assert!(pair[0].end_frame < pair[1].start_frame);
        }
    }

    #[test]
    fn test_short_field_rejected() {
        let quad = Quad::rect(0.0, 0.0, 10.0, 10.0);
        let log = log_with(50, |i| if i < 20 { vec![quad] } else { vec![] });
        assert!(StabilityTracker::new(params()).track(&log, 30.0).unwrap().is_empty());
    }

    #[test]
    fn test_accepted_length_meets_minimum() {
        let quad = Quad::rect(0.0, 0.0, 10.0, 10.0);
        let log = log_with(200, |i| {
            if i < 40 || (60..150).contains(&i) { vec![quad] } else { vec![] }
        });
        let contours = StabilityTracker::new(params()).track(&log, 25.0).unwrap();
        assert_eq!(contours.len(), 2);
        for c in &contours {
            assert!(c.len() as f64 >= 25.0);
            assert!(c.records.windows(2).all(|w| w[0].frame_index < w[1].frame_index));
        }
    }

    #[test]
    fn test_zero_area_record_is_fatal() {
        let flat = Quad::from_tuples([(0.0, 0.0), (5.0, 0.0), (10.0, 0.0), (2.0, 0.0)]);
        let log = log_with(5, |_| vec![flat]);
        let err = StabilityTracker::new(params()).track(&log, 1.0).unwrap_err();
        assert!(matches!(err, MediaError::Degenerate(_)));
    }
}
