//! Per-frame detection records and the detection log of a full pass.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::geometry::Quad;

/// Flattened 9-column row: `frame_index, x1, y1, x2, y2, x3, y3, x4, y4`.
pub type DetectionRow = [f64; 9];

/// One accepted quadrilateral candidate in one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DetectionRecord {
    /// 0-based frame index within the pass
    pub frame_index: u64,
    /// Corner geometry
    pub quad: Quad,
}

impl DetectionRecord {
    pub fn new(frame_index: u64, quad: Quad) -> Self {
        Self { frame_index, quad }
    }

    /// Flatten into a table row.
    pub fn to_row(&self) -> DetectionRow {
        let flat = self.quad.to_flat();
        let mut row = [0.0; 9];
        row[0] = self.frame_index as f64;
        row[1..].copy_from_slice(&flat);
        row
    }

    /// Rebuild from a table row. Returns `None` for a negative or
    /// non-integral frame index.
    pub fn from_row(row: &DetectionRow) -> Option<Self> {
        let idx = row[0];
        if !idx.is_finite() || idx < 0.0 || idx.fract() != 0.0 {
            return None;
        }
        let mut flat = [0.0; 8];
        flat.copy_from_slice(&row[1..]);
        Some(Self {
            frame_index: idx as u64,
            quad: Quad::from_flat(flat),
        })
    }
}

/// Append-only, frame-ordered record of every candidate found in one pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionLog {
    /// Number of frames actually read during the pass
    pub frames_count: u64,
    /// Records in frame order; several records may share a frame index
    pub records: Vec<DetectionRecord>,
}

impl DetectionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append all candidates of one frame and mark that frame as scanned.
    ///
    /// Frames must be appended in increasing order.
    pub fn push_frame(&mut self, frame_index: u64, quads: impl IntoIterator<Item = Quad>) {
        self.records
            .extend(quads.into_iter().map(|q| DetectionRecord::new(frame_index, q)));
        self.frames_count = self.frames_count.max(frame_index + 1);
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Sorted, de-duplicated frame indices that carry at least one record.
    pub fn detected_frames(&self) -> Vec<u64> {
        let mut frames: Vec<u64> = self.records.iter().map(|r| r.frame_index).collect();
        frames.dedup();
        frames
    }

    /// Records with `start <= frame_index <= end`, in log order.
    pub fn records_in(&self, start: u64, end: u64) -> impl Iterator<Item = &DetectionRecord> {
        self.records
            .iter()
            .filter(move |r| r.frame_index >= start && r.frame_index <= end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_layout() {
        let rec = DetectionRecord::new(7, Quad::rect(1.0, 2.0, 3.0, 4.0));
        let row = rec.to_row();
        assert_eq!(row[0], 7.0);
        assert_eq!(&row[1..3], &[1.0, 2.0]);
        assert_eq!(DetectionRecord::from_row(&row), Some(rec));
    }

    #[test]
    fn test_from_row_rejects_bad_index() {
        let mut row = DetectionRecord::new(3, Quad::rect(0.0, 0.0, 1.0, 1.0)).to_row();
        row[0] = -1.0;
        assert!(DetectionRecord::from_row(&row).is_none());
        row[0] = 2.5;
        assert!(DetectionRecord::from_row(&row).is_none());
    }

    #[test]
    fn test_push_frame_tracks_count() {
        let mut log = DetectionLog::new();
        log.push_frame(0, []);
        log.push_frame(1, [Quad::rect(0.0, 0.0, 5.0, 5.0), Quad::rect(10.0, 0.0, 5.0, 5.0)]);
        log.push_frame(2, []);
        assert_eq!(log.frames_count, 3);
        assert_eq!(log.len(), 2);
        assert_eq!(log.detected_frames(), vec![1]);
    }
}
