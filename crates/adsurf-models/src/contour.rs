//! Temporal fields, stable contours, instances and operator confirmation.

use std::collections::BTreeSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::detection::DetectionRecord;
use crate::geometry::Quad;

/// A maximal interval of frames where a surface is (mostly) visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Field {
    /// First frame with a detection
    pub start_frame: u64,
    /// Last frame with a detection (inclusive)
    pub end_frame: u64,
}

impl Field {
    pub fn new(start_frame: u64, end_frame: u64) -> Self {
        Self {
            start_frame,
            end_frame,
        }
    }

    pub fn contains(&self, frame_index: u64) -> bool {
        frame_index >= self.start_frame && frame_index <= self.end_frame
    }

    /// Number of frames spanned, inclusive of both ends.
    pub fn len(&self) -> u64 {
        self.end_frame - self.start_frame + 1
    }
}

/// The temporally consistent run of quadrilaterals surviving within a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StableContour {
    /// The field this contour was extracted from
    pub field: Field,
    /// Accepted records, strictly increasing by frame index
    pub records: Vec<DetectionRecord>,
}

impl StableContour {
    pub fn new(field: Field, records: Vec<DetectionRecord>) -> Self {
        Self { field, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first_frame(&self) -> Option<u64> {
        self.records.first().map(|r| r.frame_index)
    }

    pub fn last_frame(&self) -> Option<u64> {
        self.records.last().map(|r| r.frame_index)
    }

    /// Whether `frame_index` falls within the accepted frame range.
    pub fn covers(&self, frame_index: u64) -> bool {
        match (self.first_frame(), self.last_frame()) {
            (Some(first), Some(last)) => frame_index >= first && frame_index <= last,
            _ => false,
        }
    }

    /// Quad stored for exactly `frame_index`.
    pub fn quad_at(&self, frame_index: u64) -> Option<&Quad> {
        self.records
            .binary_search_by_key(&frame_index, |r| r.frame_index)
            .ok()
            .map(|i| &self.records[i].quad)
    }
}

/// Reviewable representative of a stable contour: its first smoothed record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Instance {
    /// 0-based discovery order
    pub index: usize,
    pub record: DetectionRecord,
}

/// Instance indices the operator kept after review.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ConfirmedSubset(pub BTreeSet<usize>);

impl ConfirmedSubset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every instance in `0..count` confirmed.
    pub fn all(count: usize) -> Self {
        Self((0..count).collect())
    }

    pub fn contains(&self, index: usize) -> bool {
        self.0.contains(&index)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl FromIterator<usize> for ConfirmedSubset {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contour(frames: &[u64]) -> StableContour {
        let records = frames
            .iter()
            .map(|&f| DetectionRecord::new(f, Quad::rect(f as f64, 0.0, 10.0, 10.0)))
            .collect();
        StableContour::new(Field::new(frames[0], *frames.last().unwrap()), records)
    }

    #[test]
    fn test_quad_at_exact_lookup() {
        let c = contour(&[4, 5, 6, 9]);
        assert_eq!(c.quad_at(6).unwrap().corners[0].x, 6.0);
        assert!(c.quad_at(7).is_none());
        assert!(c.covers(7));
        assert!(!c.covers(10));
    }

    #[test]
    fn test_field_len() {
        assert_eq!(Field::new(10, 90).len(), 81);
        assert!(Field::new(10, 90).contains(90));
    }

    #[test]
    fn test_confirmed_subset() {
        let s: ConfirmedSubset = [2, 0].into_iter().collect();
        assert!(s.contains(0));
        assert!(!s.contains(1));
        assert_eq!(ConfirmedSubset::all(3).len(), 3);
    }
}
