//! Versioned intermediate artifacts persisted between pipeline phases.
//!
//! Both artifacts store corner geometry as 9-column rows
//! (`frame_index, x1, y1, ..., x4, y4`) next to the metadata of the pass that
//! produced them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::contour::{Field, StableContour};
use crate::detection::{DetectionLog, DetectionRecord, DetectionRow};
use crate::video::VideoMetadata;

/// Current on-disk schema version.
pub const ARTIFACT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Unsupported artifact schema version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("Malformed row {row}: {reason}")]
    MalformedRow { row: usize, reason: &'static str },
}

fn check_version(found: u32) -> Result<(), ArtifactError> {
    if found != ARTIFACT_SCHEMA_VERSION {
        return Err(ArtifactError::UnsupportedVersion {
            found,
            expected: ARTIFACT_SCHEMA_VERSION,
        });
    }
    Ok(())
}

fn rows_to_records(rows: &[DetectionRow]) -> Result<Vec<DetectionRecord>, ArtifactError> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            DetectionRecord::from_row(row).ok_or(ArtifactError::MalformedRow {
                row: i,
                reason: "frame index must be a non-negative integer",
            })
        })
        .collect()
}

/// Persisted form of the [`DetectionLog`] written by the scan phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionLogArtifact {
    pub schema_version: u32,
    pub metadata: VideoMetadata,
    pub frames_count: u64,
    pub rows: Vec<DetectionRow>,
}

impl DetectionLogArtifact {
    pub fn new(log: &DetectionLog, metadata: VideoMetadata) -> Self {
        Self {
            schema_version: ARTIFACT_SCHEMA_VERSION,
            metadata,
            frames_count: log.frames_count,
            rows: log.records.iter().map(DetectionRecord::to_row).collect(),
        }
    }

    /// Rebuild the log, rejecting unknown versions and out-of-order rows.
    pub fn into_log(self) -> Result<(DetectionLog, VideoMetadata), ArtifactError> {
        check_version(self.schema_version)?;
        let records = rows_to_records(&self.rows)?;
        if let Some(i) = records
            .windows(2)
            .position(|w| w[1].frame_index < w[0].frame_index)
        {
            return Err(ArtifactError::MalformedRow {
                row: i + 1,
                reason: "rows must be ordered by frame index",
            });
        }
        let log = DetectionLog {
            frames_count: self.frames_count,
            records,
        };
        Ok((log, self.metadata))
    }
}

/// Rows of one smoothed stable contour together with its field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContourTable {
    pub field: Field,
    pub rows: Vec<DetectionRow>,
}

/// Persisted smoothed trajectories written by the detect phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmoothedContoursArtifact {
    pub schema_version: u32,
    pub metadata: VideoMetadata,
    pub contours: Vec<ContourTable>,
}

impl SmoothedContoursArtifact {
    pub fn new(contours: &[StableContour], metadata: VideoMetadata) -> Self {
        Self {
            schema_version: ARTIFACT_SCHEMA_VERSION,
            metadata,
            contours: contours
                .iter()
                .map(|c| ContourTable {
                    field: c.field,
                    rows: c.records.iter().map(DetectionRecord::to_row).collect(),
                })
                .collect(),
        }
    }

    pub fn into_contours(self) -> Result<(Vec<StableContour>, VideoMetadata), ArtifactError> {
        check_version(self.schema_version)?;
        let mut contours = Vec::with_capacity(self.contours.len());
        for table in self.contours {
            let records = rows_to_records(&table.rows)?;
            if let Some(i) = records
                .windows(2)
                .position(|w| w[1].frame_index <= w[0].frame_index)
            {
                return Err(ArtifactError::MalformedRow {
                    row: i + 1,
                    reason: "contour frame indices must be strictly increasing",
                });
            }
            contours.push(StableContour::new(table.field, records));
        }
        Ok((contours, self.metadata))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Quad;

    fn meta() -> VideoMetadata {
        VideoMetadata {
            fps: 25.0,
            width: 64,
            height: 48,
            frames_count: 3,
            logo_aspect_ratio: 0.5,
            video_name: "clip".into(),
            has_audio: true,
        }
    }

    #[test]
    fn test_detection_log_artifact_json_shape() {
        let mut log = DetectionLog::new();
        log.push_frame(0, [Quad::rect(1.0, 1.0, 4.0, 4.0)]);
        log.push_frame(2, []);

        let artifact = DetectionLogArtifact::new(&log, meta());
        let json = serde_json::to_value(&artifact).unwrap();
        assert_eq!(json["schema_version"], 1);
        assert_eq!(json["rows"][0].as_array().unwrap().len(), 9);

        let (restored, m) = artifact.into_log().unwrap();
        assert_eq!(restored, log);
        assert_eq!(m.video_name, "clip");
    }

    #[test]
    fn test_unknown_version_rejected() {
        let mut artifact = DetectionLogArtifact::new(&DetectionLog::new(), meta());
        artifact.schema_version = 7;
        assert!(matches!(
            artifact.into_log(),
            Err(ArtifactError::UnsupportedVersion { found: 7, .. })
        ));
    }

    #[test]
    fn test_contour_rows_must_increase() {
        let artifact = SmoothedContoursArtifact {
            schema_version: ARTIFACT_SCHEMA_VERSION,
            metadata: meta(),
            contours: vec![ContourTable {
                field: Field::new(0, 1),
                rows: vec![
                    DetectionRecord::new(1, Quad::rect(0.0, 0.0, 2.0, 2.0)).to_row(),
                    DetectionRecord::new(1, Quad::rect(0.0, 0.0, 2.0, 2.0)).to_row(),
                ],
            }],
        };
        assert!(matches!(
            artifact.into_contours(),
            Err(ArtifactError::MalformedRow { row: 1, .. })
        ));
    }
}
